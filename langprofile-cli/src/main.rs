use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use langprofile_core::config::LanguageConfig;
use langprofile_core::io;
use langprofile_core::{LanguageJob, LanguageOutcome, Profile, merge_all};

/// Builds merged langdetect profiles from the default and short-text profiles.
#[derive(Parser)]
#[command(name = "langprofile", version)]
struct Cli {
	/// TOML file overriding the supported languages and profile locations
	#[arg(long, global = true)]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Average every language's source profiles into a merged profile set
	Merge {
		/// Directory holding the profile sets
		#[arg(long, default_value = ".")]
		resources: String,

		/// Output directory name under the resources directory (cleared first)
		#[arg(long)]
		output: Option<String>,

		/// Also write a `<lang>.bin` binary copy of each merged profile
		#[arg(long)]
		binary: bool,

		/// Drop rare n-grams (and Latin noise in other scripts) from each source first
		#[arg(long)]
		prune: bool,
	},
	/// List the supported language codes
	Languages,
	/// Compare a profile's declared totals with its actual counts
	Check {
		profile: PathBuf,
	},
}

/// Options of the `merge` command once defaults are applied.
struct MergeOptions {
	output: String,
	binary: bool,
	prune: bool,
}

/// Languages written and languages that failed, sorted by code.
#[derive(Debug, Default)]
struct MergeReport {
	merged: Vec<String>,
	failed: Vec<String>,
}

fn main() -> anyhow::Result<ExitCode> {
	env_logger::init();
	let cli = Cli::parse();

	let config = match &cli.config {
		Some(path) => LanguageConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))?,
		None => LanguageConfig::default(),
	};

	match cli.command {
		Command::Merge { resources, output, binary, prune } => {
			let root = io::normalize_folder(&resources);
			let options = MergeOptions {
				output: output.unwrap_or_else(|| config.output_dir.clone()),
				binary,
				prune,
			};
			let report = merge_profiles(&config, &root, &options)?;
			if !report.failed.is_empty() {
				eprintln!("{} language(s) failed: {}", report.failed.len(), report.failed.join(", "));
				return Ok(ExitCode::FAILURE);
			}
			Ok(ExitCode::SUCCESS)
		}
		Command::Languages => {
			for code in config.codes() {
				println!("{}\t{}", code, config.languages[code]);
			}
			Ok(ExitCode::SUCCESS)
		}
		Command::Check { profile } => check_profile(&profile),
	}
}

/// Reads every configured language's sources, merges them in parallel and
/// writes the results.
///
/// # Errors
/// Fails before touching anything if `root` is not a directory or if the
/// output directory would overlap a profile set. A language whose sources
/// cannot be read or merged is reported in `MergeReport::failed` and does
/// not stop the others.
fn merge_profiles(config: &LanguageConfig, root: &Path, options: &MergeOptions) -> anyhow::Result<MergeReport> {
	if !root.is_dir() {
		bail!("Expected a directory, got: {}", root.display());
	}
	config.check_output_dir(&options.output)?;
	warn_unsupported(config, root);

	let mut jobs = Vec::new();
	let mut outcomes = Vec::new();
	for lang in config.codes() {
		let paths = io::source_paths(root, config, lang);
		if paths.is_empty() {
			log::warn!("No source profile for '{}', skipping", lang);
			continue;
		}
		match read_sources(&paths, options.prune) {
			Ok(sources) => {
				log::debug!("'{}': {} source(s)", lang, sources.len());
				jobs.push(LanguageJob { name: lang.to_owned(), sources });
			}
			Err(e) => outcomes.push(LanguageOutcome { name: lang.to_owned(), result: Err(e) }),
		}
	}

	let merged_dir = root.join(&options.output);
	io::prepare_output_dir(&merged_dir)?;

	outcomes.extend(merge_all(jobs));
	outcomes.sort_by(|a, b| a.name.cmp(&b.name));

	let mut report = MergeReport::default();
	for outcome in outcomes {
		let profile = match outcome.result {
			Ok(profile) => profile,
			Err(e) => {
				eprintln!("{}: {}", outcome.name, e);
				report.failed.push(outcome.name);
				continue;
			}
		};
		let path = merged_dir.join(&outcome.name);
		io::write_profile(&path, &profile)?;
		if options.binary {
			io::write_profile_binary(io::build_output_path(&path, "bin")?, &profile)?;
		}
		println!("{}: {:?}", outcome.name, profile.n_words);
		report.merged.push(outcome.name);
	}

	Ok(report)
}

fn read_sources(paths: &[PathBuf], prune: bool) -> langprofile_core::Result<Vec<Profile>> {
	let mut sources = Vec::with_capacity(paths.len());
	for path in paths {
		let mut profile = io::read_profile(path).inspect_err(|e| {
			log::error!("Failed to read {}: {}", path.display(), e);
		})?;
		if prune {
			profile.omit_less_freq();
		}
		sources.push(profile);
	}
	Ok(sources)
}

fn warn_unsupported(config: &LanguageConfig, root: &Path) {
	for (path, alias_of) in unmerged_profiles(config, root) {
		match alias_of {
			Some(code) => log::warn!(
				"Ignoring profile {}: it is named by an alias, rename it to '{}' to merge it",
				path.display(),
				code
			),
			None => log::warn!("Ignoring unsupported profile {}", path.display()),
		}
	}
}

/// Profile files of the profile sets that will not be merged, with the
/// supported code they stand for when named by an alias.
fn unmerged_profiles(config: &LanguageConfig, root: &Path) -> Vec<(PathBuf, Option<String>)> {
	let mut unmerged = Vec::new();
	for set in &config.profile_sets {
		let dir = root.join(&set.dir);
		let Ok(files) = io::list_profiles(&dir) else {
			continue;
		};
		for file in files {
			match config.resolve(&file) {
				Some(code) if code == file => (),
				resolved => unmerged.push((dir.join(&file), resolved.map(str::to_owned))),
			}
		}
	}
	unmerged
}

fn check_profile(path: &Path) -> anyhow::Result<ExitCode> {
	let profile = io::read_profile(path).with_context(|| format!("Failed to read {}", path.display()))?;
	let recomputed = profile.recomputed_totals();

	println!("{}: declared {:?}, actual {:?}", profile.name, profile.n_words, recomputed);
	if profile.totals_consistent() {
		println!("totals are consistent");
		Ok(ExitCode::SUCCESS)
	} else {
		println!("totals are wrong and will be recomputed when merging");
		Ok(ExitCode::FAILURE)
	}
}
