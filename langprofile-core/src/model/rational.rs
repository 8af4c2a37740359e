use std::fmt;

use crate::error::{ProfileError, Result};

/// Exact non-negative fraction backed by `u128`.
///
/// # Invariants
/// - `denom > 0`
/// - `gcd(numer, denom) == 1` (zero is stored as `0/1`)
///
/// Every constructor and operation reduces its result, so two equal values
/// always have the same representation and derived equality is exact.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ratio {
	numer: u128,
	denom: u128,
}

/// Contribution of one source to a merge (`1/2` for each of two sources).
pub type Weight = Ratio;

/// Greatest common divisor (Euclid). `gcd(0, 0) == 0`.
pub fn gcd(mut a: u128, mut b: u128) -> u128 {
	while b != 0 {
		(a, b) = (b, a % b);
	}
	a
}

/// Least common multiple computed as `a / gcd(a, b) * b`.
///
/// # Errors
/// Returns `Overflow` if the result does not fit in `u128`.
pub fn lcm(a: u128, b: u128) -> Result<u128> {
	if a == 0 || b == 0 {
		return Ok(0);
	}
	(a / gcd(a, b))
		.checked_mul(b)
		.ok_or_else(|| ProfileError::Overflow(format!("lcm({a}, {b}) exceeds 128 bits")))
}

impl Ratio {
	/// Builds `numer / denom` in lowest terms.
	///
	/// # Errors
	/// Returns `InvalidProfile` if `denom == 0`.
	pub fn new(numer: u128, denom: u128) -> Result<Self> {
		if denom == 0 {
			return Err(ProfileError::InvalidProfile(format!("zero denominator for numerator {numer}")));
		}
		Ok(Self::reduced(numer, denom))
	}

	pub fn zero() -> Self {
		Self { numer: 0, denom: 1 }
	}

	pub fn one() -> Self {
		Self { numer: 1, denom: 1 }
	}

	/// Weight giving each of `sources` inputs the same share (`1/sources`).
	///
	/// # Errors
	/// Returns `InvalidProfile` when `sources == 0`.
	pub fn equal_share(sources: usize) -> Result<Self> {
		Self::new(1, sources as u128)
	}

	pub fn numer(&self) -> u128 {
		self.numer
	}

	pub fn denom(&self) -> u128 {
		self.denom
	}

	pub fn is_zero(&self) -> bool {
		self.numer == 0
	}

	/// Exact sum, reduced.
	///
	/// # Errors
	/// Returns `Overflow` if an intermediate product leaves `u128`.
	pub fn checked_add(self, other: Self) -> Result<Self> {
		// Scale both sides to lcm(b, d) rather than b * d to keep intermediates small
		let g = gcd(self.denom, other.denom);
		let overflow = || ProfileError::Overflow(format!("{self} + {other} exceeds 128 bits"));

		let left = self.numer.checked_mul(other.denom / g).ok_or_else(overflow)?;
		let right = other.numer.checked_mul(self.denom / g).ok_or_else(overflow)?;
		let numer = left.checked_add(right).ok_or_else(overflow)?;
		let denom = (self.denom / g).checked_mul(other.denom).ok_or_else(overflow)?;

		Ok(Self::reduced(numer, denom))
	}

	/// Exact product, reduced.
	///
	/// # Errors
	/// Returns `Overflow` if the reduced product leaves `u128`.
	pub fn checked_mul(self, other: Self) -> Result<Self> {
		if self.is_zero() || other.is_zero() {
			return Ok(Self::zero());
		}
		// Cross-cancel first so the products are already in lowest terms
		let g1 = gcd(self.numer, other.denom);
		let g2 = gcd(other.numer, self.denom);
		let overflow = || ProfileError::Overflow(format!("{self} * {other} exceeds 128 bits"));

		let numer = (self.numer / g1).checked_mul(other.numer / g2).ok_or_else(overflow)?;
		let denom = (self.denom / g2).checked_mul(other.denom / g1).ok_or_else(overflow)?;

		Ok(Self { numer, denom })
	}

	/// Scales the fraction by `factor` and returns the result only if it is a whole number.
	pub fn scaled_exact(&self, factor: u128) -> Option<u128> {
		if factor % self.denom != 0 {
			return None;
		}
		(factor / self.denom).checked_mul(self.numer)
	}

	fn reduced(numer: u128, denom: u128) -> Self {
		if numer == 0 {
			return Self::zero();
		}
		let g = gcd(numer, denom);
		Self { numer: numer / g, denom: denom / g }
	}
}

impl fmt::Display for Ratio {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.numer, self.denom)
	}
}
