use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};

/// Languages supported by langdetect, as `(code, display name)`.
const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
	("af", "Afrikaans"),
	("ar", "Arabic"),
	("bg", "Bulgarian"),
	("bn", "Bengali"),
	("ca", "Catalan"),
	("cs", "Czech"),
	("da", "Danish"),
	("de", "German"),
	("el", "Greek"),
	("en", "English"),
	("es", "Spanish"),
	("et", "Estonian"),
	("fa", "Persian"),
	("fi", "Finnish"),
	("fr", "French"),
	("gu", "Gujarati"),
	("he", "Hebrew"),
	("hi", "Hindi"),
	("hr", "Croatian"),
	("hu", "Hungarian"),
	("id", "Indonesian"),
	("it", "Italian"),
	("ja", "Japanese"),
	("kn", "Kannada"),
	("ko", "Korean"),
	("lt", "Lithuanian"),
	("lv", "Latvian"),
	("mk", "Macedonian"),
	("ml", "Malayalam"),
	("mr", "Marathi"),
	("ne", "Nepali"),
	("nl", "Dutch"),
	("no", "Norwegian"),
	("pa", "Punjabi"),
	("pl", "Polish"),
	("pt", "Portuguese"),
	("ro", "Romanian"),
	("ru", "Russian"),
	("si", "Sinhalese"),
	("sk", "Slovak"),
	("sl", "Slovene"),
	("so", "Somali"),
	("sq", "Albanian"),
	("sv", "Swedish"),
	("sw", "Swahili"),
	("ta", "Tamil"),
	("te", "Telugu"),
	("th", "Thai"),
	("tl", "Tagalog"),
	("tr", "Turkish"),
	("uk", "Ukrainian"),
	("ur", "Urdu"),
	("vi", "Vietnamese"),
	("zh-cn", "SimplifiedChinese"),
	("zh-tw", "TraditionalChinese"),
];

/// BCP47 codes whose supported counterpart differs.
const CODE_ALIASES: &[(&str, &str)] = &[
	("el-monoton", "el"),
	("de-1996", "de"),
	("nb", "no"),
	("pt-PT", "pt"),
	("zh-Hans", "zh-cn"),
	("zh-Hant", "zh-tw"),
];

/// A family of source profiles stored in one directory, one file per language.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProfileSet {
	pub name: String,
	/// Directory relative to the resources root (empty for the root itself)
	pub dir: String,
}

/// Language set and profile locations used by the merge tools.
///
/// Every field is optional in the TOML file and falls back to the
/// langdetect defaults:
///
/// ```toml
/// output_dir = "merged-average"
///
/// [languages]
/// en = "English"
///
/// [aliases]
/// nb = "no"
///
/// [[profile_sets]]
/// name = "short"
/// dir = "short-text"
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct LanguageConfig {
	pub languages: BTreeMap<String, String>,
	pub aliases: BTreeMap<String, String>,
	pub profile_sets: Vec<ProfileSet>,
	pub output_dir: String,
}

impl Default for LanguageConfig {
	fn default() -> Self {
		Self {
			languages: SUPPORTED_LANGUAGES.iter().map(|(c, n)| (c.to_string(), n.to_string())).collect(),
			aliases: CODE_ALIASES.iter().map(|(a, c)| (a.to_string(), c.to_string())).collect(),
			profile_sets: vec![
				ProfileSet { name: "default".to_owned(), dir: String::new() },
				ProfileSet { name: "short".to_owned(), dir: "short-text".to_owned() },
			],
			output_dir: "merged-average".to_owned(),
		}
	}
}

impl LanguageConfig {
	/// Reads a TOML configuration file.
	///
	/// # Errors
	/// Returns an error if the file cannot be read, is not valid TOML,
	/// or fails [`LanguageConfig::validate`].
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let contents = fs::read_to_string(path)?;
		Self::from_toml(&contents)
	}

	/// Parses a TOML configuration string.
	pub fn from_toml(contents: &str) -> Result<Self> {
		let config: Self = toml::from_str(contents)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks that the configuration can drive a merge.
	///
	/// # Errors
	/// Returns `Config` if there is no language or profile set, if an alias
	/// points to an unsupported language, or if `output_dir` fails
	/// [`LanguageConfig::check_output_dir`].
	pub fn validate(&self) -> Result<()> {
		if self.languages.is_empty() {
			return Err(ProfileError::Config("no language configured".to_owned()));
		}
		if self.profile_sets.is_empty() {
			return Err(ProfileError::Config("no profile set configured".to_owned()));
		}
		if let Some((alias, code)) = self.aliases.iter().find(|(_, code)| !self.languages.contains_key(*code)) {
			return Err(ProfileError::Config(format!("alias '{alias}' points to unsupported language '{code}'")));
		}
		self.check_output_dir(&self.output_dir)
	}

	/// Checks that `output` can be wiped and rewritten without touching any source.
	///
	/// The output directory must be a non-empty relative path made of plain names
	/// (no `.`, `..` or root), and must not be, or contain, a profile set directory.
	///
	/// # Errors
	/// Returns `Config` describing the offending directory.
	pub fn check_output_dir(&self, output: &str) -> Result<()> {
		let out = Path::new(output);
		let plain = out.components().all(|c| matches!(c, Component::Normal(_)));
		if !plain || out.components().next().is_none() {
			return Err(ProfileError::Config(format!(
				"output directory '{output}' must be a plain relative path below the resources directory"
			)));
		}
		if let Some(set) = self.profile_sets.iter().find(|set| Path::new(&set.dir).starts_with(out)) {
			return Err(ProfileError::Config(format!(
				"output directory '{output}' would overwrite profile set '{}' ({})",
				set.name, set.dir
			)));
		}
		Ok(())
	}

	/// Maps an external language code to a supported one.
	///
	/// Aliases are applied first; returns `None` if the result is not supported.
	pub fn resolve<'a>(&'a self, code: &'a str) -> Option<&'a str> {
		let code = self.aliases.get(code).map(String::as_str).unwrap_or(code);
		self.languages.get_key_value(code).map(|(k, _)| k.as_str())
	}

	/// Supported language codes, sorted.
	pub fn codes(&self) -> impl Iterator<Item = &str> {
		self.languages.keys().map(String::as_str)
	}
}
