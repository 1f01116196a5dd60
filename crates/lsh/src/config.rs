//! Configuration and error types for MinHash/LSH similarity detection.
//!
//! The configuration is a plain value with no I/O or environment lookups, so
//! every stage of the pipeline is a pure function of `(tokens, config)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hash family used to build MinHash signatures.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HashVariant {
    /// Universal hashing `h_i(x) = ((a_i * x + b_i) >> 32) mod 2^32`.
    #[default]
    Universal,
    /// Cheaper family `h_i(x) = fold32(x) ^ m_i` with random 32-bit masks.
    Xor,
}

/// Run configuration for signing, banding and candidate detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LshConfig {
    /// Number of independent hash functions, i.e. the signature length.
    pub signature_length: usize,
    /// Number of LSH bands. Must divide `signature_length` evenly.
    pub band_count: usize,
    /// Word n-gram width used by the tokenizer feeding the core.
    ///
    /// Opaque to the core; carried so that runs are self-describing.
    pub ngram_len: usize,
    /// Seed controlling coefficient generation and token hashing.
    ///
    /// Two runs with equal seeds and equal parameters produce bit-identical
    /// signatures for the same token sets.
    pub seed: u64,
    /// Hash family for signatures.
    pub variant: HashVariant,
    /// Sign documents and score pairs on the rayon thread pool.
    pub use_parallel: bool,
    /// Retain token sets after signing so exact Jaccard can be computed.
    pub keep_tokens: bool,
    /// Leave documents with an empty token set out of banding.
    pub exclude_degenerate: bool,
}

impl LshConfig {
    /// Create a new configuration with the default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signature length. Longer signatures estimate Jaccard more
    /// precisely at a linear cost per document.
    pub fn with_signature_length(mut self, signature_length: usize) -> Self {
        self.signature_length = signature_length;
        self
    }

    /// Set the number of bands. More bands lower the similarity threshold at
    /// which pairs become candidates.
    pub fn with_band_count(mut self, band_count: usize) -> Self {
        self.band_count = band_count;
        self
    }

    /// Set the n-gram width recorded for the run.
    pub fn with_ngram_len(mut self, ngram_len: usize) -> Self {
        self.ngram_len = ngram_len;
        self
    }

    /// Set the seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Select the signature hash family.
    pub fn with_variant(mut self, variant: HashVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, use_parallel: bool) -> Self {
        self.use_parallel = use_parallel;
        self
    }

    /// Keep or drop token sets after signing.
    pub fn with_keep_tokens(mut self, keep_tokens: bool) -> Self {
        self.keep_tokens = keep_tokens;
        self
    }

    /// Include or exclude empty documents from banding.
    pub fn with_exclude_degenerate(mut self, exclude_degenerate: bool) -> Self {
        self.exclude_degenerate = exclude_degenerate;
        self
    }

    /// Rows per band (`r = signature_length / band_count`).
    ///
    /// Only meaningful on a validated configuration.
    pub fn rows_per_band(&self) -> usize {
        if self.band_count == 0 {
            0
        } else {
            self.signature_length / self.band_count
        }
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_shape(self.signature_length, self.band_count)
    }
}

impl Default for LshConfig {
    fn default() -> Self {
        Self {
            signature_length: 240,
            band_count: 80,
            ngram_len: 1,
            seed: 0,
            variant: HashVariant::Universal,
            use_parallel: false,
            keep_tokens: true,
            exclude_degenerate: true,
        }
    }
}

/// Checks the `(signature_length, band_count)` pair used by banding.
pub(crate) fn validate_shape(signature_length: usize, band_count: usize) -> Result<(), ConfigError> {
    if signature_length == 0 {
        return Err(ConfigError::ZeroSignatureLength);
    }
    if band_count == 0 {
        return Err(ConfigError::ZeroBandCount);
    }
    if signature_length % band_count != 0 {
        return Err(ConfigError::IndivisibleBands {
            signature_length,
            band_count,
        });
    }
    Ok(())
}

/// Invalid run parameters. Fatal before any document is processed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid config: signature_length must be >= 1")]
    ZeroSignatureLength,

    #[error("invalid config: band_count must be >= 1")]
    ZeroBandCount,

    #[error(
        "invalid config: band_count={band_count} does not divide signature_length={signature_length}"
    )]
    IndivisibleBands {
        signature_length: usize,
        band_count: usize,
    },
}

/// Errors returned by the LSH pipeline operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LshError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unknown document id {id:?}")]
    MissingDocument { id: String },

    #[error("document id {id:?} was already inserted")]
    DuplicateDocument { id: String },

    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}
