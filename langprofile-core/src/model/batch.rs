use std::sync::mpsc;
use std::thread;

use crate::error::Result;
use super::merger::merge_language;
use super::profile::Profile;

/// Every source profile collected for one language.
#[derive(Clone, Debug)]
pub struct LanguageJob {
	pub name: String,
	pub sources: Vec<Profile>,
}

/// Result of merging one language. Failures stay local to their language.
#[derive(Debug)]
pub struct LanguageOutcome {
	pub name: String,
	pub result: Result<Profile>,
}

/// Merges every language independently, spread over the available CPUs.
///
/// # Behavior
/// - Splits the jobs into at most `num_cpus` chunks.
/// - Spawns one thread per chunk; each thread runs `merge_language` for
///   each of its jobs and sends the outcome back.
/// - Collects all outcomes and sorts them by language code.
///
/// # Notes
/// - Languages share nothing, so no locking is involved.
/// - Uses an MPSC channel to collect outcomes from threads.
pub fn merge_all(jobs: Vec<LanguageJob>) -> Vec<LanguageOutcome> {
	if jobs.is_empty() {
		return Vec::new();
	}
	let workers = num_cpus::get().clamp(1, jobs.len());
	let chunk_size = jobs.len().div_ceil(workers);
	log::debug!("Merging {} languages on {} threads", jobs.len(), workers);

	let (tx, rx) = mpsc::channel();
	let mut pending = jobs.into_iter();
	loop {
		let chunk: Vec<LanguageJob> = pending.by_ref().take(chunk_size).collect();
		if chunk.is_empty() {
			break;
		}
		let tx = tx.clone();

		thread::spawn(move || {
			for job in chunk {
				let result = merge_language(&job.name, &job.sources);
				match &result {
					Ok(profile) => log::info!("Merged '{}' ({} n-grams)", job.name, profile.freq.len()),
					Err(e) => log::error!("Failed to merge '{}': {}", job.name, e),
				}
				// The receiver only disappears if the caller is gone
				if tx.send(LanguageOutcome { name: job.name, result }).is_err() {
					return;
				}
			}
		});
	}
	drop(tx);

	let mut outcomes: Vec<LanguageOutcome> = rx.iter().collect();
	outcomes.sort_by(|a, b| a.name.cmp(&b.name));
	outcomes
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ProfileError;

	fn profile(name: &str, grams: &[(&str, u64)]) -> Profile {
		let mut p = Profile::new(name);
		for (gram, count) in grams {
			p.freq.insert(gram.to_string(), *count);
		}
		p.n_words = p.recomputed_totals();
		p
	}

	#[test]
	fn test_merge_all_keeps_failures_local() {
		let jobs = vec![
			LanguageJob {
				name: "fr".into(),
				sources: vec![profile("fr", &[("a", 1), ("b", 3)]), profile("fr", &[("a", 1), ("b", 1)])],
			},
			LanguageJob { name: "en".into(), sources: vec![profile("en", &[("a", 0)])] },
			LanguageJob { name: "de".into(), sources: vec![profile("de", &[("x", 2)])] },
		];

		let outcomes = merge_all(jobs);
		let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
		assert_eq!(names, vec!["de", "en", "fr"]);

		let de = outcomes[0].result.as_ref().unwrap();
		assert_eq!(de.freq.get("x"), Some(&1));
		assert_eq!(de.n_words, vec![1, 0, 0]);

		assert!(matches!(outcomes[1].result, Err(ProfileError::InvalidProfile(_))));

		let fr = outcomes[2].result.as_ref().unwrap();
		assert_eq!(fr.n_words, vec![8, 0, 0]);
	}

	#[test]
	fn test_merge_all_many_languages() {
		let jobs: Vec<LanguageJob> = (0..40)
			.map(|i| {
				let name = format!("l{i:02}");
				LanguageJob { sources: vec![profile(&name, &[("a", i + 1), ("b", 1)])], name }
			})
			.collect();

		let outcomes = merge_all(jobs);
		assert_eq!(outcomes.len(), 40);
		assert!(outcomes.iter().all(|o| o.result.is_ok()));
		assert_eq!(outcomes[3].result.as_ref().unwrap().n_words[0], 5);
	}

	#[test]
	fn test_merge_all_empty() {
		assert!(merge_all(Vec::new()).is_empty());
	}
}
