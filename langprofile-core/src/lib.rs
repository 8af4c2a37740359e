//! Language-identification profile merging library.
//!
//! This crate builds merged langdetect profiles: per-language tables of
//! character n-gram counts whose frequencies are the exact average of
//! several source profiles (typically a long-text and a short-text one).
//!
//! It provides:
//! - Exact normalization of source tables
//! - Rational averaging and least-common-denominator conversion
//! - Language set configuration
//! - Profile file I/O helpers used by the binaries

/// Profile model, normalizer and merger.
pub mod model;

/// Supported languages, code aliases and profile locations.
pub mod config;

/// Profile files (JSON and binary cache) and directory helpers.
pub mod io;

/// Error type shared by the whole crate.
pub mod error;

pub use error::{ProfileError, Result};
pub use model::batch::{LanguageJob, LanguageOutcome, merge_all};
pub use model::merger::{MergedProfile, merge, merge_language};
pub use model::normalizer::{RationalTable, normalize};
pub use model::profile::{FreqTable, NGRAM_MAX, Profile};
pub use model::rational::{Ratio, Weight};
