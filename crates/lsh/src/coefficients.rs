//! Seeded hash-function families for MinHash signatures.
//!
//! A family is generated once from `(signature_length, seed)` and is
//! immutable afterwards. Signatures are only comparable when they were
//! produced with the same family, so callers build one family per run and
//! share it by reference (it is `Send + Sync`).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ConfigError;

/// Universal hash family `h_i(x) = ((a_i * x + b_i) >> 32) mod 2^32`.
///
/// `a_i` is drawn uniformly from `[1, 2^64)` and `b_i` from `[0, 2^32)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientFamily {
    a: Vec<u64>,
    b: Vec<u32>,
    seed: u64,
}

impl CoefficientFamily {
    /// Generate `signature_length` coefficient pairs from `seed`.
    ///
    /// Identical inputs always yield identical coefficients.
    pub fn generate(signature_length: usize, seed: u64) -> Result<Self, ConfigError> {
        if signature_length == 0 {
            return Err(ConfigError::ZeroSignatureLength);
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut a = Vec::with_capacity(signature_length);
        let mut b = Vec::with_capacity(signature_length);
        // Pairs are drawn interleaved so a prefix of a longer family equals
        // the shorter family for the same seed.
        for _ in 0..signature_length {
            a.push(rng.random_range(1..=u64::MAX));
            b.push(rng.random::<u32>());
        }

        Ok(Self { a, b, seed })
    }

    /// Number of hash functions in the family.
    pub fn len(&self) -> usize {
        self.a.len()
    }

    /// Always `false` for a generated family.
    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// Seed the family was generated from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Coefficient pair `(a_i, b_i)`.
    pub fn coefficients(&self, index: usize) -> Option<(u64, u32)> {
        Some((*self.a.get(index)?, *self.b.get(index)?))
    }

    /// Evaluate hash function `index` on `x`.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    #[inline]
    pub fn hash(&self, index: usize, x: u64) -> u32 {
        universal_hash(self.a[index], self.b[index], x)
    }

    /// Iterate all coefficient pairs in hash-function order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u32)> + '_ {
        self.a.iter().copied().zip(self.b.iter().copied())
    }
}

#[inline]
pub(crate) fn universal_hash(a: u64, b: u32, x: u64) -> u32 {
    (a.wrapping_mul(x).wrapping_add(u64::from(b)) >> 32) as u32
}

/// XOR hash family `h_i(x) = fold32(x) ^ m_i`.
///
/// The masks come from their own seeded stream, so switching variants never
/// perturbs the universal family for the same seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XorFamily {
    masks: Vec<u32>,
    seed: u64,
}

impl XorFamily {
    /// Generate `signature_length` random masks from `seed`.
    pub fn generate(signature_length: usize, seed: u64) -> Result<Self, ConfigError> {
        if signature_length == 0 {
            return Err(ConfigError::ZeroSignatureLength);
        }

        let mut rng = StdRng::seed_from_u64(splitmix64(seed));
        let masks = (0..signature_length).map(|_| rng.random::<u32>()).collect();
        Ok(Self { masks, seed })
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Evaluate mask `index` on `x`.
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    #[inline]
    pub fn hash(&self, index: usize, x: u64) -> u32 {
        fold32(x) ^ self.masks[index]
    }
}

/// Folds a 64-bit hash into 32 bits without discarding the high half.
#[inline]
pub(crate) fn fold32(x: u64) -> u32 {
    (x ^ (x >> 32)) as u32
}

/// SplitMix64 finalizer, used to derive independent sub-seeds.
#[inline]
pub(crate) fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
