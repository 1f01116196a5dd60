//! Similarity estimators for candidate pairs.
//!
//! Both estimators only run over pairs already selected by candidate
//! detection; scoring every pair of the corpus would defeat the banding.
//!
//! - [`signature_agreement`] is the fraction of signature positions where
//!   two signatures hold the same value. It is a positional statistic and
//!   approximates Jaccard only for long enough signatures.
//! - [`exact_jaccard`] computes `|A ∩ B| / |A ∪ B|` over retained token
//!   sets and serves as ground truth for calibrating the approximation.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::candidates::CandidatePair;
use crate::config::{ConfigError, LshError};
use crate::minhash::{Signature, TokenSet};

/// Similarity score for one candidate pair, in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPair {
    pub first: String,
    pub second: String,
    pub score: f64,
}

/// Fraction of positions `i` with `left[i] == right[i]`.
pub fn signature_agreement(left: &Signature, right: &Signature) -> Result<f64, LshError> {
    if left.len() != right.len() {
        return Err(LshError::LengthMismatch {
            expected: left.len(),
            actual: right.len(),
        });
    }
    if left.is_empty() {
        return Err(ConfigError::ZeroSignatureLength.into());
    }

    let common = left
        .values()
        .iter()
        .zip(right.values())
        .filter(|(l, r)| l == r)
        .count();
    Ok(common as f64 / left.len() as f64)
}

/// Exact Jaccard similarity of two token sets.
///
/// Two empty sets score `0.0`: they share no evidence of similarity.
pub fn exact_jaccard(left: &TokenSet, right: &TokenSet) -> f64 {
    let intersection = left.intersection(right).count();
    let union = left.len() + right.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Score candidate pairs with [`signature_agreement`].
///
/// Output is aligned with `pairs`. Fails on the first pair whose document is
/// missing from `signatures`.
pub fn minhash_similarities(
    signatures: &BTreeMap<String, Signature>,
    pairs: &[CandidatePair],
    parallel: bool,
) -> Result<Vec<ScoredPair>, LshError> {
    score_pairs(pairs, parallel, |pair| {
        let left = lookup(signatures, &pair.first)?;
        let right = lookup(signatures, &pair.second)?;
        signature_agreement(left, right)
    })
}

/// Score candidate pairs with [`exact_jaccard`].
///
/// Output is aligned with `pairs`. Fails on the first pair whose document is
/// missing from `token_sets`.
pub fn exact_similarities(
    token_sets: &BTreeMap<String, TokenSet>,
    pairs: &[CandidatePair],
    parallel: bool,
) -> Result<Vec<ScoredPair>, LshError> {
    score_pairs(pairs, parallel, |pair| {
        let left = lookup(token_sets, &pair.first)?;
        let right = lookup(token_sets, &pair.second)?;
        Ok(exact_jaccard(left, right))
    })
}

fn score_pairs<F>(pairs: &[CandidatePair], parallel: bool, score: F) -> Result<Vec<ScoredPair>, LshError>
where
    F: Fn(&CandidatePair) -> Result<f64, LshError> + Sync,
{
    let scored = |pair: &CandidatePair| {
        score(pair).map(|score| ScoredPair {
            first: pair.first.clone(),
            second: pair.second.clone(),
            score,
        })
    };

    if parallel {
        pairs.par_iter().map(scored).collect()
    } else {
        pairs.iter().map(scored).collect()
    }
}

fn lookup<'a, T>(map: &'a BTreeMap<String, T>, id: &str) -> Result<&'a T, LshError> {
    map.get(id)
        .ok_or_else(|| LshError::MissingDocument { id: id.to_string() })
}
