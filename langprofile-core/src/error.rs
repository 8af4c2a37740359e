use thiserror::Error;

/// Errors raised while normalizing, merging or persisting profiles.
///
/// The three arithmetic variants (`InvalidProfile`, `Overflow`,
/// `InconsistentMerge`) are deterministic: retrying the same input always
/// fails the same way.
#[derive(Error, Debug)]
pub enum ProfileError {
	/// The input table contradicts itself (zero total for a length that has n-grams,
	/// an empty n-gram key, a zero denominator...).
	#[error("Invalid profile: {0}")]
	InvalidProfile(String),

	/// A unified denominator reached `2^63`, or an intermediate value left `u128`.
	#[error("Overflow: {0}")]
	Overflow(String),

	/// Emitted counts are not exact or do not add up to their total.
	#[error("Inconsistent merge: {0}")]
	InconsistentMerge(String),

	#[error("Language mismatch: expected '{expected}', got '{found}'")]
	LanguageMismatch { expected: String, found: String },

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	#[error("Binary encoding error: {0}")]
	Binary(#[from] postcard::Error),

	#[error("Invalid configuration: {0}")]
	Config(String),
}

pub type Result<T> = std::result::Result<T, ProfileError>;

impl From<toml::de::Error> for ProfileError {
	fn from(e: toml::de::Error) -> Self {
		ProfileError::Config(e.to_string())
	}
}
