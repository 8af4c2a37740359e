//! Profile model and the merging engine.
//!
//! This module provides:
//! - The langdetect profile layout (`Profile`)
//! - Exact fractions (`Ratio`) used for every frequency computation
//! - The normalizer (`normalize`) turning counts into exact frequencies
//! - The merger (`merge`, `merge_language`) averaging normalized sources
//! - A parallel per-language driver (`merge_all`)

/// Exact non-negative fractions with gcd reduction and checked arithmetic.
pub mod rational;

/// Per-language n-gram count table with per-length totals.
///
/// Supports building from n-grams, pruning rare n-grams,
/// and checking declared totals.
pub mod profile;

/// Recomputes per-length totals and exposes exact frequencies.
pub mod normalizer;

/// Averages normalized tables and converts them back to integers
/// over the smallest exact denominator of each length.
pub mod merger;

/// Runs one independent merge per language on a thread pool.
pub mod batch;
