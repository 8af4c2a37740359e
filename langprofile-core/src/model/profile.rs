use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use super::normalizer::{self, RationalTable};

/// Default number of n-gram lengths tracked by a profile (uni-, bi- and trigrams).
pub const NGRAM_MAX: usize = 3;

/// Counts at or below this value are always pruned by `omit_less_freq`.
const MINIMUM_FREQ: u64 = 2;

/// Pruning threshold is `n_words[0] / LESS_FREQ_RATIO` when that exceeds `MINIMUM_FREQ`.
const LESS_FREQ_RATIO: u64 = 100_000;

/// N-gram to occurrence count. Ordered so serialized profiles are reproducible.
pub type FreqTable = BTreeMap<String, u64>;

/// Per-language n-gram profile in the langdetect layout.
///
/// # Invariants
/// - `n_words[L - 1]` is the sum of the counts of every n-gram of length `L`
///
/// Source files are known to break this invariant, so readers must treat
/// `n_words` as advisory and go through `normalize`, which recomputes it.
/// Profiles produced by the merger always satisfy it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct Profile {
	/// Language code (`en`, `zh-cn`...)
	pub name: String,

	/// Occurrence count of each n-gram
	pub freq: FreqTable,

	/// Declared totals indexed by n-gram length minus one
	#[serde(default)]
	pub n_words: Vec<u64>,
}

/// Length of an n-gram in characters.
pub fn ngram_len(gram: &str) -> usize {
	gram.chars().count()
}

impl Profile {
	/// Creates an empty profile for the language `name`.
	pub fn new(name: &str) -> Self {
		Self {
			name: name.to_owned(),
			freq: FreqTable::new(),
			n_words: vec![0; NGRAM_MAX],
		}
	}

	/// Drops rare n-grams from the profile.
	///
	/// - Every gram seen at most `max(n_words[0] / 100000, 2)` times is removed.
	/// - If single Latin letters then account for less than a third of all
	///   unigrams, the language is written in another script and every gram
	///   containing a Latin letter is removed as noise.
	///
	/// Declared totals are replaced by the recomputed ones before the threshold
	/// is taken, then decreased by the removed counts.
	pub fn omit_less_freq(&mut self) {
		self.n_words = self.recomputed_totals();
		let unigrams = self.n_words.first().copied().unwrap_or(0);
		let threshold = (unigrams / LESS_FREQ_RATIO).max(MINIMUM_FREQ);

		let mut roman = 0;
		let mut removed = Vec::new();
		for (gram, count) in &self.freq {
			if *count <= threshold {
				removed.push(gram.clone());
			} else if is_single_latin_letter(gram) {
				roman += count;
			}
		}
		self.remove_all(removed);

		let unigrams = self.n_words.first().copied().unwrap_or(0);
		if roman < unigrams / 3 {
			let latin: Vec<String> = self
				.freq
				.keys()
				.filter(|gram| gram.chars().any(|c| c.is_ascii_alphabetic()))
				.cloned()
				.collect();
			self.remove_all(latin);
		}
	}

	/// Totals recomputed from `freq`, `max(NGRAM_MAX, longest gram)` entries wide.
	pub fn recomputed_totals(&self) -> Vec<u64> {
		let longest = self.freq.keys().map(|g| ngram_len(g)).max().unwrap_or(0);
		let mut totals = vec![0u64; longest.max(NGRAM_MAX)];
		for (gram, count) in &self.freq {
			let len = ngram_len(gram);
			if len > 0 {
				totals[len - 1] = totals[len - 1].saturating_add(*count);
			}
		}
		totals
	}

	/// Returns `true` if the declared `n_words` match the counts in `freq`.
	///
	/// Trailing zero entries are not significant.
	pub fn totals_consistent(&self) -> bool {
		let recomputed = self.recomputed_totals();
		let width = recomputed.len().max(self.n_words.len());
		(0..width).all(|i| {
			recomputed.get(i).copied().unwrap_or(0) == self.n_words.get(i).copied().unwrap_or(0)
		})
	}

	/// Exact frequencies of this profile, ignoring the declared `n_words`.
	///
	/// # Errors
	/// See [`normalizer::normalize`].
	pub fn normalize(&self) -> Result<RationalTable> {
		normalizer::normalize(&self.freq)
	}

	fn remove_all(&mut self, grams: Vec<String>) {
		for gram in grams {
			if let Some(count) = self.freq.remove(&gram) {
				let len = ngram_len(&gram);
				if let Some(total) = self.n_words.get_mut(len.wrapping_sub(1)) {
					*total = total.saturating_sub(count);
				}
			}
		}
	}
}

fn is_single_latin_letter(gram: &str) -> bool {
	let mut chars = gram.chars();
	matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphabetic())
}
