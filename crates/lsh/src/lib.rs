//! # MinHash / LSH near-duplicate detection
//!
//! This crate estimates pairwise Jaccard similarity across a corpus of
//! documents without scoring all `n²` pairs. Each document arrives as a set
//! of string tokens (typically word n-grams) chosen by the caller; the crate
//! never reads files or tokenizes text.
//!
//! ## Pipeline
//!
//! 1.  **Signing**: a token set is reduced to a fixed-length MinHash
//!     [`Signature`] using a seeded hash family that is generated once per
//!     run ([`CoefficientFamily`]) and shared read-only afterwards.
//!
//! 2.  **Banding**: the signature is cut into `band_count` contiguous bands
//!     of `r` values and each band is hashed to 32 bits
//!     ([`BandedSignature`]).
//!
//! 3.  **Candidate detection**: two documents become a [`CandidatePair`] when
//!     they agree on at least one band hash at the same band index.
//!
//! 4.  **Scoring**: candidates are scored either by signature agreement or
//!     by exact Jaccard over the retained token sets.
//!
//! [`candidate_probability`] gives the probability that a pair of a given
//! similarity becomes a candidate, which is what `signature_length` and
//! `band_count` are tuned against.
//!
//! Invariant: for the same token sets and the same [`LshConfig`], every
//! stage produces bit-identical output, sequential or parallel.
//!
//! ## Example Usage
//!
//! ```
//! use lsh::{Corpus, LshConfig, TokenSet};
//!
//! let config = LshConfig::new().with_signature_length(120).with_band_count(40);
//! let mut corpus = Corpus::new(config).unwrap();
//!
//! let doc = |words: &[&str]| words.iter().map(|w| w.to_string()).collect::<TokenSet>();
//! corpus.insert("a", doc(&["the quick", "quick brown", "brown fox", "fox jumps"])).unwrap();
//! corpus.insert("b", doc(&["the quick", "quick brown", "brown fox", "fox jumps"])).unwrap();
//! corpus.insert("c", doc(&["lorem ipsum", "ipsum dolor"])).unwrap();
//!
//! let report = corpus.run().unwrap();
//! assert_eq!(report.candidates.len(), 1);
//! assert_eq!(report.exact.unwrap()[0].score, 1.0);
//! ```
//!
pub mod bands;
pub mod candidates;
pub mod coefficients;
pub mod config;
pub mod corpus;
pub mod minhash;
pub mod probability;
pub mod similarity;

pub use crate::bands::{band_hash, bands, BandedSignature, BAND_HASH_SEED};
pub use crate::candidates::{
    find_candidates, find_candidates_indexed, find_candidates_parallel, CandidatePair,
};
pub use crate::coefficients::{CoefficientFamily, XorFamily};
pub use crate::config::{ConfigError, HashVariant, LshConfig, LshError};
pub use crate::corpus::{Corpus, RunReport};
pub use crate::minhash::{MinHasher, Signature, TokenSet, SENTINEL};
pub use crate::probability::{
    candidate_probability, probability_curve, s_curve_threshold, suggest_band_count,
};
pub use crate::similarity::{
    exact_jaccard, exact_similarities, minhash_similarities, signature_agreement, ScoredPair,
};
