use std::collections::BTreeMap;

use actix_cors::Cors;
use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};

use serde::{Deserialize, Serialize};
use langprofile_core::config::LanguageConfig;
use langprofile_core::{Profile, ProfileError, merge_language};

/// Body of the `/v1/merge` endpoint
#[derive(Deserialize)]
struct MergeRequest {
	name: String,
	sources: Vec<Profile>
}

/// Exact frequencies returned by `/v1/normalize`, fractions written as `"n/d"`
#[derive(Serialize)]
struct NormalizeResponse {
	name: String,
	freq: BTreeMap<String, String>,
	n_words: Vec<String>
}

struct SharedData {
	config: LanguageConfig
}

/// Maps a core error to an HTTP response.
///
/// Arithmetic failures are a property of the submitted data (422),
/// everything else is a malformed request (400).
fn error_response(e: ProfileError) -> HttpResponse {
	match e {
		ProfileError::Overflow(_) | ProfileError::InconsistentMerge(_) => {
			HttpResponse::UnprocessableEntity().body(e.to_string())
		}
		_ => HttpResponse::BadRequest().body(e.to_string()),
	}
}

/// POST /v1/normalize
///
/// Returns the exact frequencies of a profile, ignoring its declared totals.
#[post("/v1/normalize")]
async fn post_normalize(profile: web::Json<Profile>) -> impl Responder {
	let table = match profile.normalize() {
		Ok(t) => t,
		Err(e) => return error_response(e),
	};

	HttpResponse::Ok().json(NormalizeResponse {
		name: profile.name.clone(),
		freq: table.iter().map(|(gram, freq)| (gram.clone(), freq.to_string())).collect(),
		n_words: table.totals().iter().map(u128::to_string).collect(),
	})
}

/// POST /v1/merge
///
/// Averages the submitted source profiles of one language.
#[post("/v1/merge")]
async fn post_merge(data: web::Data<SharedData>, request: web::Json<MergeRequest>) -> impl Responder {
	let request = request.into_inner();
	let name = match data.config.resolve(&request.name) {
		Some(code) => code.to_owned(),
		None => return HttpResponse::BadRequest().body(format!("Unsupported language '{}'", request.name)),
	};

	// Sources may be submitted under an alias of the language
	let sources: Vec<Profile> = request
		.sources
		.into_iter()
		.map(|mut p| {
			if data.config.resolve(&p.name) == Some(name.as_str()) {
				p.name = name.clone();
			}
			p
		})
		.collect();

	match web::block(move || merge_language(&name, &sources)).await {
		Ok(Ok(profile)) => HttpResponse::Ok().json(profile),
		Ok(Err(e)) => error_response(e),
		Err(_) => HttpResponse::InternalServerError().body("Merge task failed"),
	}
}

#[get("/v1/languages")]
async fn get_languages(data: web::Data<SharedData>) -> impl Responder {
	HttpResponse::Ok().json(&data.config.languages)
}

/// Main entry point for the server.
///
/// Loads the language configuration (`LANGPROFILE_CONFIG`, defaults otherwise)
/// and starts an Actix-web HTTP server.
///
/// # Notes
/// - The server binds to 127.0.0.1:5000 unless `LANGPROFILE_ADDR` is set.
/// - Merges run on the blocking thread pool; requests share no mutable state.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
	env_logger::init();

	let config = match std::env::var("LANGPROFILE_CONFIG") {
		Ok(path) => LanguageConfig::load(&path).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?,
		Err(_) => LanguageConfig::default(),
	};
	let addr = std::env::var("LANGPROFILE_ADDR").unwrap_or_else(|_| "127.0.0.1:5000".to_owned());
	log::info!("Serving {} languages on {}", config.languages.len(), addr);

	let shared_data = web::Data::new(SharedData { config });

	HttpServer::new(move || {
		App::new()
			.wrap(Cors::permissive())
			.app_data(shared_data.clone())
			.app_data(web::JsonConfig::default().limit(64 * 1024 * 1024))
			.service(post_normalize)
			.service(post_merge)
			.service(get_languages)
	})
		.bind(addr)?
		.run()
		.await
}

#[cfg(test)]
mod tests {
	use super::*;
	use actix_web::{http::StatusCode, test};

	fn app_data() -> web::Data<SharedData> {
		web::Data::new(SharedData { config: LanguageConfig::default() })
	}

	#[actix_web::test]
	async fn test_merge_endpoint_averages_sources() {
		let app = test::init_service(App::new().app_data(app_data()).service(post_merge)).await;
		let body = serde_json::json!({
			"name": "nb",
			"sources": [
				{ "name": "no", "freq": { "a": 1, "b": 3 }, "n_words": [4, 0, 0] },
				{ "name": "nb", "freq": { "a": 1, "b": 1 } }
			]
		});

		let req = test::TestRequest::post().uri("/v1/merge").set_json(&body).to_request();
		let profile: Profile = test::call_and_read_body_json(&app, req).await;

		assert_eq!(profile.name, "no");
		assert_eq!(profile.freq.get("a"), Some(&3));
		assert_eq!(profile.n_words, vec![8, 0, 0]);
	}

	#[actix_web::test]
	async fn test_merge_endpoint_rejects_unknown_language() {
		let app = test::init_service(App::new().app_data(app_data()).service(post_merge)).await;
		let body = serde_json::json!({ "name": "tlh", "sources": [] });

		let req = test::TestRequest::post().uri("/v1/merge").set_json(&body).to_request();
		let resp = test::call_service(&app, req).await;

		assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
	}

	#[actix_web::test]
	async fn test_merge_endpoint_reports_inconsistent_merge() {
		let app = test::init_service(App::new().app_data(app_data()).service(post_merge)).await;
		let body = serde_json::json!({
			"name": "en",
			"sources": [
				{ "name": "en", "freq": { "a": 1, "ab": 1 } },
				{ "name": "en", "freq": { "a": 1 } }
			]
		});

		let req = test::TestRequest::post().uri("/v1/merge").set_json(&body).to_request();
		let resp = test::call_service(&app, req).await;

		assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
	}

	#[actix_web::test]
	async fn test_normalize_endpoint() {
		let app = test::init_service(App::new().service(post_normalize)).await;
		let body = serde_json::json!({ "name": "en", "freq": { "a": 1, "b": 3, "ab": 2 }, "n_words": [9, 9, 9] });

		let req = test::TestRequest::post().uri("/v1/normalize").set_json(&body).to_request();
		let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;

		assert_eq!(resp["freq"]["a"], "1/4");
		assert_eq!(resp["freq"]["ab"], "1/1");
		assert_eq!(resp["n_words"], serde_json::json!(["4", "2"]));
	}
}
