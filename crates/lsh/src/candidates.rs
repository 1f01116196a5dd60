//! Candidate pair detection over banded signatures.
//!
//! A pair of distinct documents is a candidate when their banded signatures
//! agree at one or more band indices. Three strategies are provided and all
//! of them return the same pairs in the same order:
//!
//! - [`find_candidates`]: exhaustive scan of all `n * (n - 1) / 2` pairs,
//!   short-circuiting on the first shared band.
//! - [`find_candidates_indexed`]: inverted index from `(band, hash)` to
//!   documents; only documents sharing a bucket are paired.
//! - [`find_candidates_parallel`]: the inverted index with bucket pairing
//!   sharded across the rayon pool.
//!
//! Documents are visited in ascending id order, and every pair is reported
//! once with `first < second`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bands::BandedSignature;
use crate::config::LshError;

/// Unordered pair of document ids, stored with `first < second`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidatePair {
    pub first: String,
    pub second: String,
}

impl CandidatePair {
    /// Build a pair in canonical order. Returns `None` when both ids are
    /// equal.
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Option<Self> {
        let (a, b) = (a.into(), b.into());
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { first: a, second: b }),
            std::cmp::Ordering::Greater => Some(Self { first: b, second: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.first == id || self.second == id
    }
}

/// Exhaustive candidate detection, `O(n^2 * band_count)` worst case.
pub fn find_candidates(
    banded: &BTreeMap<String, BandedSignature>,
) -> Result<Vec<CandidatePair>, LshError> {
    let entries = checked_entries(banded)?;
    let mut pairs = Vec::new();
    for (i, (left_id, left)) in entries.iter().enumerate() {
        for (right_id, right) in &entries[i + 1..] {
            if left.first_shared_band(right).is_some() {
                pairs.push(pair(left_id, right_id));
            }
        }
    }
    Ok(pairs)
}

/// Inverted-index detection with bucket pairing spread across rayon
/// workers.
///
/// Buckets are built sequentially; each worker expands whole buckets into
/// document index pairs. The pairs are then sorted and deduplicated, so the
/// result matches [`find_candidates`].
pub fn find_candidates_parallel(
    banded: &BTreeMap<String, BandedSignature>,
) -> Result<Vec<CandidatePair>, LshError> {
    let entries = checked_entries(banded)?;
    let buckets = bucket_index(&entries);

    let mut matched: Vec<(usize, usize)> = buckets
        .par_iter()
        .filter(|(_, docs)| docs.len() > 1)
        .flat_map_iter(|(_, docs)| bucket_pairs(docs))
        .collect();
    matched.par_sort_unstable();
    matched.dedup();

    Ok(matched
        .into_iter()
        .map(|(i, j)| pair(entries[i].0, entries[j].0))
        .collect())
}

/// Candidate detection through an inverted index of band buckets.
///
/// Near-linear when buckets stay small; degrades to the exhaustive bound
/// when many documents share a bucket.
pub fn find_candidates_indexed(
    banded: &BTreeMap<String, BandedSignature>,
) -> Result<Vec<CandidatePair>, LshError> {
    let entries = checked_entries(banded)?;
    let buckets = bucket_index(&entries);

    let matched: BTreeSet<(usize, usize)> = buckets
        .values()
        .filter(|docs| docs.len() > 1)
        .flat_map(|docs| bucket_pairs(docs))
        .collect();

    Ok(matched
        .into_iter()
        .map(|(i, j)| pair(entries[i].0, entries[j].0))
        .collect())
}

/// Maps `(band index, band hash)` to the documents holding it, in entry order.
fn bucket_index(entries: &[(&String, &BandedSignature)]) -> HashMap<(usize, u32), Vec<usize>> {
    let mut buckets: HashMap<(usize, u32), Vec<usize>> = HashMap::new();
    for (doc, (_, signature)) in entries.iter().enumerate() {
        for (band, &hash) in signature.values().iter().enumerate() {
            buckets.entry((band, hash)).or_default().push(doc);
        }
    }
    buckets
}

/// All `(i, j)` with `i < j` inside one bucket.
fn bucket_pairs(docs: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    // Documents were pushed in ascending order, so i < j holds.
    docs.iter()
        .enumerate()
        .flat_map(move |(offset, &i)| docs[offset + 1..].iter().map(move |&j| (i, j)))
}

/// Collects map entries and checks every banded signature has one length.
fn checked_entries(
    banded: &BTreeMap<String, BandedSignature>,
) -> Result<Vec<(&String, &BandedSignature)>, LshError> {
    let entries: Vec<_> = banded.iter().collect();
    if let Some((_, first)) = entries.first() {
        let expected = first.len();
        if let Some((_, bad)) = entries.iter().find(|(_, b)| b.len() != expected) {
            return Err(LshError::LengthMismatch {
                expected,
                actual: bad.len(),
            });
        }
    }
    Ok(entries)
}

#[inline]
fn pair(first: &str, second: &str) -> CandidatePair {
    CandidatePair {
        first: first.to_string(),
        second: second.to_string(),
    }
}
