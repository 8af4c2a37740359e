use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ProfileError, Result};
use super::normalizer::RationalTable;
use super::profile::{FreqTable, NGRAM_MAX, Profile, ngram_len};
use super::rational::{Ratio, Weight, lcm};

/// Exclusive upper bound of any merged total (largest signed 64-bit value plus one).
pub const TOTAL_LIMIT: u128 = 1 << 63;

/// Integer table produced by [`merge`].
///
/// # Invariants
/// - `n_words[L - 1]` equals the sum of the counts of length `L` exactly
/// - every total is `< 2^63`
/// - `n_words[L - 1]` is the least common multiple of the denominators of the
///   merged frequencies of length `L` (0 when no gram has that length)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct MergedProfile {
	pub freq: FreqTable,
	pub n_words: Vec<u64>,
}

impl MergedProfile {
	/// Attaches a language code, producing a regular `Profile`.
	pub fn into_profile(self, name: &str) -> Profile {
		Profile { name: name.to_owned(), freq: self.freq, n_words: self.n_words }
	}
}

/// Averages normalized tables into a single integer table.
///
/// Steps, in order:
/// 1. Every gram's merged frequency is the sum of `weight * frequency` over the
///    sources containing it, kept as an exact fraction.
/// 2. For each length, the unified denominator is the lcm of the denominators
///    of the merged frequencies of that length.
/// 3. Each gram's count is its frequency scaled by the unified denominator of
///    its length, which becomes that length's total.
///
/// # Errors
/// - `Overflow` if a unified denominator reaches `2^63`, or if an intermediate
///   fraction does not fit in 128 bits
/// - `InconsistentMerge` if a scaled count is not a whole number, or if the
///   counts of a length do not add up to its total (which also happens when the
///   weighted frequencies of a length do not sum to one)
///
/// No partial result is returned on failure.
pub fn merge(sources: &[(&RationalTable, Weight)]) -> Result<MergedProfile> {
	let mut merged: BTreeMap<&str, Ratio> = BTreeMap::new();
	for (table, weight) in sources {
		for (gram, freq) in table.iter() {
			let contribution = freq.checked_mul(*weight)?;
			let slot = merged.entry(gram.as_str()).or_insert_with(Ratio::zero);
			*slot = slot.checked_add(contribution)?;
		}
	}

	let width = sources
		.iter()
		.map(|(table, _)| table.longest())
		.max()
		.unwrap_or(0)
		.max(NGRAM_MAX);

	// Unified denominator per length; `None` while no gram of that length was seen
	let mut denominators: Vec<Option<u128>> = vec![None; width];
	for (gram, freq) in &merged {
		let slot = &mut denominators[ngram_len(gram) - 1];
		let unified = lcm(slot.unwrap_or(1), freq.denom())?;
		if unified >= TOTAL_LIMIT {
			return Err(ProfileError::Overflow(format!(
				"unified denominator for length {} reaches 2^63",
				ngram_len(gram)
			)));
		}
		*slot = Some(unified);
	}
	let totals: Vec<u128> = denominators.iter().map(|d| d.unwrap_or(0)).collect();
	log::debug!("Unified denominators for {} grams: {:?}", merged.len(), totals);

	let mut counts: Vec<(&str, u128)> = Vec::with_capacity(merged.len());
	let mut sums = vec![0u128; width];
	for (gram, freq) in &merged {
		let index = ngram_len(gram) - 1;
		let count = freq.scaled_exact(totals[index]).ok_or_else(|| {
			ProfileError::InconsistentMerge(format!(
				"count of '{gram}' ({freq} * {}) is not a whole number",
				totals[index]
			))
		})?;
		sums[index] = sums[index]
			.checked_add(count)
			.ok_or_else(|| ProfileError::InconsistentMerge(format!("counts of length {} overflow", index + 1)))?;
		counts.push((*gram, count));
	}

	for (index, (total, sum)) in totals.iter().zip(&sums).enumerate() {
		if total != sum {
			return Err(ProfileError::InconsistentMerge(format!(
				"counts of length {} sum to {sum}, expected {total}",
				index + 1
			)));
		}
	}

	let mut freq = FreqTable::new();
	for (gram, count) in counts {
		freq.insert(gram.to_owned(), to_u64(count)?);
	}
	let n_words = totals.into_iter().map(to_u64).collect::<Result<Vec<_>>>()?;

	Ok(MergedProfile { freq, n_words })
}

/// Merges every available source profile of one language with equal weights.
///
/// Declared `n_words` of the sources are ignored and recomputed. A single
/// source is passed through (weight 1); no source yields an empty profile.
///
/// # Errors
/// - `LanguageMismatch` if a source belongs to another language
/// - any error of [`normalize`](super::normalizer::normalize) or [`merge`]
pub fn merge_language(name: &str, sources: &[Profile]) -> Result<Profile> {
	let mut tables = Vec::with_capacity(sources.len());
	for source in sources {
		if source.name != name {
			return Err(ProfileError::LanguageMismatch { expected: name.to_owned(), found: source.name.clone() });
		}
		if !source.totals_consistent() {
			log::warn!("Declared totals of '{}' disagree with its counts, recomputing", name);
		}
		tables.push(source.normalize()?);
	}

	if tables.is_empty() {
		return Ok(merge(&[])?.into_profile(name));
	}

	let weight = Ratio::equal_share(tables.len())?;
	let weighted: Vec<(&RationalTable, Weight)> = tables.iter().map(|t| (t, weight)).collect();
	Ok(merge(&weighted)?.into_profile(name))
}

fn to_u64(value: u128) -> Result<u64> {
	u64::try_from(value).map_err(|_| ProfileError::Overflow(format!("{value} does not fit in 64 bits")))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::normalizer::normalize;

	fn table(entries: &[(&str, u64)]) -> RationalTable {
		let raw: FreqTable = entries.iter().map(|(g, c)| (g.to_string(), *c)).collect();
		normalize(&raw).unwrap()
	}

	fn half() -> Weight {
		Ratio::equal_share(2).unwrap()
	}

	#[test]
	fn test_average_of_two_sources() {
		// a: (1/4 + 1/2) / 2 = 3/8, b: (3/4 + 1/2) / 2 = 5/8
		let long = table(&[("a", 1), ("b", 3)]);
		let short = table(&[("a", 1), ("b", 1)]);

		let merged = merge(&[(&long, half()), (&short, half())]).unwrap();

		assert_eq!(merged.freq.get("a"), Some(&3));
		assert_eq!(merged.freq.get("b"), Some(&5));
		assert_eq!(merged.n_words, vec![8, 0, 0]);
	}

	#[test]
	fn test_gram_missing_from_one_source_contributes_zero() {
		let long = table(&[("a", 1), ("b", 1)]);
		let short = table(&[("a", 1)]);

		let merged = merge(&[(&long, half()), (&short, half())]).unwrap();

		// a: (1/2 + 1) / 2 = 3/4, b: 1/4
		assert_eq!(merged.freq.get("a"), Some(&3));
		assert_eq!(merged.freq.get("b"), Some(&1));
		assert_eq!(merged.n_words, vec![4, 0, 0]);
	}

	#[test]
	fn test_totals_widen_past_ngram_max() {
		let source = table(&[("abcd", 2), ("bcde", 2)]);
		let merged = merge(&[(&source, Ratio::one())]).unwrap();
		assert_eq!(merged.n_words, vec![0, 0, 0, 2]);
		assert_eq!(merged.freq.get("abcd"), Some(&1));
	}

	#[test]
	fn test_length_missing_from_one_source_is_inconsistent() {
		let long = table(&[("a", 1), ("ab", 1)]);
		let short = table(&[("a", 1)]);

		let err = merge(&[(&long, half()), (&short, half())]).unwrap_err();
		assert!(matches!(err, ProfileError::InconsistentMerge(_)));
	}

	#[test]
	fn test_weights_not_summing_to_one_are_inconsistent() {
		let source = table(&[("a", 1), ("b", 1)]);
		let err = merge(&[(&source, half())]).unwrap_err();
		assert!(matches!(err, ProfileError::InconsistentMerge(_)));
	}

	#[test]
	fn test_merge_language_checks_names() {
		let mut en = Profile::new("en");
		en.freq.insert("a".into(), 1);
		let mut fr = Profile::new("fr");
		fr.freq.insert("a".into(), 1);

		let err = merge_language("en", &[en, fr]).unwrap_err();
		assert!(matches!(err, ProfileError::LanguageMismatch { .. }));
	}

	#[test]
	fn test_merge_language_ignores_declared_totals() {
		let mut long = Profile::new("en");
		long.freq.insert("a".into(), 1);
		long.freq.insert("b".into(), 3);
		long.n_words = vec![1000, 7, 7];
		let mut short = Profile::new("en");
		short.freq.insert("a".into(), 2);
		short.freq.insert("b".into(), 2);

		let merged = merge_language("en", &[long, short]).unwrap();

		assert_eq!(merged.name, "en");
		assert_eq!(merged.freq.get("a"), Some(&3));
		assert_eq!(merged.freq.get("b"), Some(&5));
		assert_eq!(merged.n_words, vec![8, 0, 0]);
		assert!(merged.totals_consistent());
	}

	#[test]
	fn test_merge_language_without_sources() {
		let merged = merge_language("ca", &[]).unwrap();
		assert!(merged.freq.is_empty());
		assert_eq!(merged.n_words, vec![0; NGRAM_MAX]);
	}
}
