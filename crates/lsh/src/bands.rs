//! LSH banding: reduce a signature to one 32-bit hash per band.
//!
//! A band is a contiguous run of `r = signature_length / band_count`
//! signature values. Each band is hashed with `xxh32` over the fixed-width
//! little-endian encoding of its values, in order, under
//! [`BAND_HASH_SEED`]. The fixed width keeps the encoding unambiguous:
//! `[12, 3]` and `[1, 23]` serialize to different byte strings.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh32::Xxh32;

use crate::config::{validate_shape, ConfigError};
use crate::minhash::Signature;

/// Seed used for every band hash in every run.
pub const BAND_HASH_SEED: u32 = 0;

/// One hash per band, in band order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BandedSignature(Vec<u32>);

impl BandedSignature {
    pub fn from_values(values: Vec<u32>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Index of the first band where both signatures agree.
    pub fn first_shared_band(&self, other: &Self) -> Option<usize> {
        self.0
            .iter()
            .zip(other.0.iter())
            .position(|(left, right)| left == right)
    }
}

/// Hash one band's values in order.
#[inline]
pub fn band_hash(values: &[u32]) -> u32 {
    let mut hasher = Xxh32::new(BAND_HASH_SEED);
    for value in values {
        hasher.update(&value.to_le_bytes());
    }
    hasher.digest()
}

/// Split `signature` into `band_count` bands and hash each one.
///
/// Fails when `band_count` is zero or does not divide the signature length.
pub fn bands(signature: &Signature, band_count: usize) -> Result<BandedSignature, ConfigError> {
    validate_shape(signature.len(), band_count)?;
    let rows = signature.len() / band_count;
    let hashes = signature.values().chunks_exact(rows).map(band_hash).collect();
    Ok(BandedSignature(hashes))
}
