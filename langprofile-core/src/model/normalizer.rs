use std::collections::BTreeMap;
use std::collections::btree_map;

use crate::error::{ProfileError, Result};
use super::profile::{FreqTable, ngram_len};
use super::rational::Ratio;

/// Exact frequency of every n-gram of one source profile.
///
/// Each frequency is `count / total`, where `total` is the recomputed sum of
/// the counts of all n-grams of the same length. Only lives for the duration
/// of a merge and is never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct RationalTable {
	freqs: BTreeMap<String, Ratio>,
	totals: Vec<u128>,
}

impl RationalTable {
	/// Frequency of `gram`, if the source contained it.
	pub fn get(&self, gram: &str) -> Option<&Ratio> {
		self.freqs.get(gram)
	}

	/// Recomputed totals indexed by n-gram length minus one, up to the longest gram.
	pub fn totals(&self) -> &[u128] {
		&self.totals
	}

	/// Length of the longest n-gram in the table (0 when empty).
	pub fn longest(&self) -> usize {
		self.totals.len()
	}

	pub fn len(&self) -> usize {
		self.freqs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.freqs.is_empty()
	}

	pub fn iter(&self) -> btree_map::Iter<'_, String, Ratio> {
		self.freqs.iter()
	}
}

impl<'a> IntoIterator for &'a RationalTable {
	type Item = (&'a String, &'a Ratio);
	type IntoIter = btree_map::Iter<'a, String, Ratio>;

	fn into_iter(self) -> Self::IntoIter {
		self.freqs.iter()
	}
}

/// Turns a raw count table into exact per-length frequencies.
///
/// Declared totals are never consulted: the total of each length is summed
/// from the counts themselves, for every length from 1 to the longest gram.
///
/// # Errors
/// Returns `InvalidProfile` if a key is the empty string, or if every gram of
/// some length has a count of zero (the length total would be zero while
/// grams of that length exist).
pub fn normalize(raw: &FreqTable) -> Result<RationalTable> {
	let mut totals: Vec<u128> = Vec::new();
	for (gram, count) in raw {
		let len = ngram_len(gram);
		if len == 0 {
			return Err(ProfileError::InvalidProfile("empty n-gram".to_owned()));
		}
		if totals.len() < len {
			totals.resize(len, 0);
		}
		totals[len - 1] += u128::from(*count);
	}

	let mut freqs = BTreeMap::new();
	for (gram, count) in raw {
		let len = ngram_len(gram);
		let total = totals[len - 1];
		if total == 0 {
			return Err(ProfileError::InvalidProfile(format!(
				"n-grams of length {len} are present but their counts sum to zero"
			)));
		}
		freqs.insert(gram.clone(), Ratio::new(u128::from(*count), total)?);
	}

	log::debug!("Normalized {} n-grams, totals {:?}", freqs.len(), totals);
	Ok(RationalTable { freqs, totals })
}

#[cfg(test)]
mod tests {
	use super::*;

	fn table(entries: &[(&str, u64)]) -> FreqTable {
		entries.iter().map(|(g, c)| (g.to_string(), *c)).collect()
	}

	#[test]
	fn test_frequencies_are_per_length() {
		let t = normalize(&table(&[("a", 1), ("b", 3), ("ab", 2), ("bc", 2)])).unwrap();

		assert_eq!(t.totals(), &[4, 4]);
		assert_eq!(t.get("a"), Some(&Ratio::new(1, 4).unwrap()));
		assert_eq!(t.get("b"), Some(&Ratio::new(3, 4).unwrap()));
		assert_eq!(t.get("ab").map(|r| r.to_string()), Some("1/2".to_owned()));
		assert_eq!(t.get("zz"), None);
	}

	#[test]
	fn test_missing_lengths_get_zero_totals() {
		let t = normalize(&table(&[("a", 2), ("abc", 5)])).unwrap();
		assert_eq!(t.totals(), &[2, 0, 5]);
		assert_eq!(t.longest(), 3);
		assert_eq!(t.get("abc"), Some(&Ratio::one()));
	}

	#[test]
	fn test_empty_table_is_not_an_error() {
		let t = normalize(&FreqTable::new()).unwrap();
		assert!(t.is_empty());
		assert!(t.totals().is_empty());
	}

	#[test]
	fn test_zero_total_with_grams_is_invalid() {
		let err = normalize(&table(&[("a", 1), ("bc", 0)])).unwrap_err();
		assert!(matches!(err, ProfileError::InvalidProfile(_)));
	}

	#[test]
	fn test_zero_count_among_positive_counts_is_valid() {
		let t = normalize(&table(&[("a", 0), ("b", 2)])).unwrap();
		assert_eq!(t.get("a"), Some(&Ratio::zero()));
		assert_eq!(t.get("b"), Some(&Ratio::one()));
	}

	#[test]
	fn test_empty_key_is_invalid() {
		assert!(matches!(normalize(&table(&[("", 1)])), Err(ProfileError::InvalidProfile(_))));
	}
}
