use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::env;

use crate::config::LanguageConfig;
use crate::error::Result;
use crate::model::profile::Profile;

/// Reads a langdetect JSON profile.
pub fn read_profile<P: AsRef<Path>>(path: P) -> Result<Profile> {
	let reader = BufReader::new(File::open(path)?);
	Ok(serde_json::from_reader(reader)?)
}

/// Writes a profile as compact JSON.
///
/// Non-ASCII n-grams are written verbatim, not escaped.
pub fn write_profile<P: AsRef<Path>>(path: P, profile: &Profile) -> Result<()> {
	let mut writer = BufWriter::new(File::create(path)?);
	serde_json::to_writer(&mut writer, profile)?;
	writer.flush()?;
	Ok(())
}

/// Writes a profile in the compact `postcard` binary form.
pub fn write_profile_binary<P: AsRef<Path>>(path: P, profile: &Profile) -> Result<()> {
	let bytes = postcard::to_stdvec(profile)?;
	fs::write(path, bytes)?;
	Ok(())
}

/// Reads a profile written by [`write_profile_binary`].
pub fn read_profile_binary<P: AsRef<Path>>(path: P) -> Result<Profile> {
	let bytes = fs::read(path)?;
	Ok(postcard::from_bytes(&bytes)?)
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `merged/zh-cn` + `"bin"` → `merged/zh-cn.bin`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_name = input_path
		.file_name()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	// Language codes contain no extension, so append rather than replace
	let mut name = file_name.to_os_string();
	name.push(".");
	name.push(output_extension);

	Ok(parent.join(name))
}

/// Removes `dir` if it exists and creates it again, empty.
pub fn prepare_output_dir<P: AsRef<Path>>(dir: P) -> Result<()> {
	let dir = dir.as_ref();
	match fs::remove_dir_all(dir) {
		Ok(()) => log::debug!("Removed previous output {}", dir.display()),
		Err(e) if e.kind() == io::ErrorKind::NotFound => (),
		Err(e) => return Err(e.into()),
	}
	fs::create_dir_all(dir)?;
	Ok(())
}

/// Existing source profile files of `lang`, in the order of the configured profile sets.
pub fn source_paths<P: AsRef<Path>>(root: P, config: &LanguageConfig, lang: &str) -> Vec<PathBuf> {
	config
		.profile_sets
		.iter()
		.map(|set| root.as_ref().join(&set.dir).join(lang))
		.filter(|path| path.is_file())
		.collect()
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists the profile files of a directory.
///
/// Profiles are named after their language code and carry no extension,
/// so files with an extension are skipped. Returns file names only (no paths).
pub fn list_profiles<P: AsRef<Path>>(dir: P) -> io::Result<Vec<String>> {
	let mut files = Vec::new();

	for entry in fs::read_dir(dir)? {
		let path = entry?.path();

		if path.is_file() && path.extension().is_none() {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sample() -> Profile {
		let mut p = Profile::new("ja");
		p.freq.insert("日".into(), 1);
		p.freq.insert("日本".into(), 1);
		p.freq.insert("a".into(), 1);
		p.n_words = p.recomputed_totals();
		p
	}

	#[test]
	fn test_json_round_trip_keeps_unicode() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("ja");

		write_profile(&path, &sample()).unwrap();
		let text = fs::read_to_string(&path).unwrap();
		assert!(text.contains("日本"));
		assert!(!text.contains(' '));

		assert_eq!(read_profile(&path).unwrap(), sample());
	}

	#[test]
	fn test_binary_cache() {
		let dir = tempfile::tempdir().unwrap();
		let path = build_output_path(dir.path().join("zh-cn"), "bin").unwrap();
		assert_eq!(path.file_name().unwrap(), "zh-cn.bin");

		write_profile_binary(&path, &sample()).unwrap();
		assert_eq!(read_profile_binary(&path).unwrap(), sample());
	}

	#[test]
	fn test_prepare_output_dir_clears_previous_content() {
		let dir = tempfile::tempdir().unwrap();
		let out = dir.path().join("merged-average");
		fs::create_dir(&out).unwrap();
		fs::write(out.join("stale"), "x").unwrap();

		prepare_output_dir(&out).unwrap();

		assert!(out.is_dir());
		assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
	}

	#[test]
	fn test_source_paths_follow_profile_sets() {
		let dir = tempfile::tempdir().unwrap();
		fs::create_dir(dir.path().join("short-text")).unwrap();
		fs::write(dir.path().join("en"), "{}").unwrap();
		fs::write(dir.path().join("short-text").join("en"), "{}").unwrap();
		fs::write(dir.path().join("short-text").join("si"), "{}").unwrap();

		let config = LanguageConfig::default();
		assert_eq!(
			source_paths(dir.path(), &config, "en"),
			vec![dir.path().join("en"), dir.path().join("short-text").join("en")]
		);
		assert_eq!(source_paths(dir.path(), &config, "si"), vec![dir.path().join("short-text").join("si")]);
		assert!(source_paths(dir.path(), &config, "ca").is_empty());
	}

	#[test]
	fn test_list_profiles_skips_extensions() {
		let dir = tempfile::tempdir().unwrap();
		fs::write(dir.path().join("fr"), "{}").unwrap();
		fs::write(dir.path().join("de"), "{}").unwrap();
		fs::write(dir.path().join("fr.bin"), "").unwrap();
		fs::create_dir(dir.path().join("short-text")).unwrap();

		assert_eq!(list_profiles(dir.path()).unwrap(), vec!["de", "fr"]);
	}
}
