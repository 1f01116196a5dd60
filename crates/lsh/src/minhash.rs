//! MinHash signature computation.
//!
//! Each token is hashed once to a 64-bit base value with `xxh64` under the
//! run seed, then pushed through every function of the hash family; each
//! signature slot keeps the minimum value seen. Slots start at
//! [`SENTINEL`], which is also the output for an empty token set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use crate::coefficients::{CoefficientFamily, XorFamily};
use crate::config::{ConfigError, HashVariant, LshConfig};

/// Unique tokens (e.g. word n-grams) representing one document.
pub type TokenSet = BTreeSet<String>;

/// Initial slot value; a signature made only of sentinels carries no signal.
pub const SENTINEL: u32 = u32::MAX;

/// Fixed-length MinHash signature, one value per hash function.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature(Vec<u32>);

impl Signature {
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

    /// `true` when every slot still holds [`SENTINEL`], i.e. the document
    /// had no tokens. Such signatures must not back similarity claims.
    pub fn is_degenerate(&self) -> bool {
        self.0.iter().all(|&v| v == SENTINEL)
    }

    pub fn into_values(self) -> Vec<u32> {
        self.0
    }
}

impl AsRef<[u32]> for Signature {
    fn as_ref(&self) -> &[u32] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Family {
    Universal(CoefficientFamily),
    Xor(XorFamily),
}

/// Signs token sets with one frozen hash family.
///
/// The family is generated when the hasher is built and never regenerated,
/// so every signature produced by one hasher is comparable with every other.
/// The hasher is read-only after construction and can be shared across
/// threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinHasher {
    family: Family,
    seed: u64,
}

impl MinHasher {
    /// Build a hasher for `signature_length` slots with the given variant.
    pub fn new(signature_length: usize, seed: u64, variant: HashVariant) -> Result<Self, ConfigError> {
        let family = match variant {
            HashVariant::Universal => {
                Family::Universal(CoefficientFamily::generate(signature_length, seed)?)
            }
            HashVariant::Xor => Family::Xor(XorFamily::generate(signature_length, seed)?),
        };
        Ok(Self { family, seed })
    }

    /// Build a hasher from a full run configuration, validating it first.
    pub fn from_config(cfg: &LshConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        Self::new(cfg.signature_length, cfg.seed, cfg.variant)
    }

    /// Build a universal hasher around an already generated family.
    pub fn with_family(family: CoefficientFamily) -> Self {
        let seed = family.seed();
        Self {
            family: Family::Universal(family),
            seed,
        }
    }

    pub fn signature_length(&self) -> usize {
        match &self.family {
            Family::Universal(f) => f.len(),
            Family::Xor(f) => f.len(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn variant(&self) -> HashVariant {
        match self.family {
            Family::Universal(_) => HashVariant::Universal,
            Family::Xor(_) => HashVariant::Xor,
        }
    }

    /// The universal coefficient family, if this hasher uses one.
    pub fn coefficients(&self) -> Option<&CoefficientFamily> {
        match &self.family {
            Family::Universal(f) => Some(f),
            Family::Xor(_) => None,
        }
    }

    /// 64-bit base hash of one token under the run seed.
    #[inline]
    pub fn token_hash(&self, token: &str) -> u64 {
        xxh64(token.as_bytes(), self.seed)
    }

    /// Compute the signature of a token set.
    ///
    /// Duplicate tokens do not change the result. Runs in
    /// `O(|tokens| * signature_length)`.
    pub fn sign<I, S>(&self, tokens: I) -> Signature
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut slots = vec![SENTINEL; self.signature_length()];
        for token in tokens {
            let base = self.token_hash(token.as_ref());
            match &self.family {
                Family::Universal(family) => {
                    for ((a, b), slot) in family.iter().zip(slots.iter_mut()) {
                        let h = crate::coefficients::universal_hash(a, b, base);
                        if h < *slot {
                            *slot = h;
                        }
                    }
                }
                Family::Xor(family) => {
                    for (index, slot) in slots.iter_mut().enumerate() {
                        let h = family.hash(index, base);
                        if h < *slot {
                            *slot = h;
                        }
                    }
                }
            }
        }
        Signature(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> TokenSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn positional_agreement(left: &Signature, right: &Signature) -> f64 {
        let same = left
            .values()
            .iter()
            .zip(right.values())
            .filter(|(l, r)| l == r)
            .count();
        same as f64 / left.len() as f64
    }

    #[test]
    fn signature_has_configured_length() {
        for len in [1, 8, 64, 240] {
            let hasher = MinHasher::new(len, 0, HashVariant::Universal).unwrap();
            let sig = hasher.sign(&tokens(&["a", "b", "c"]));
            assert_eq!(sig.len(), len);
        }
    }

    #[test]
    fn empty_token_set_yields_sentinels() {
        let hasher = MinHasher::new(16, 0, HashVariant::Universal).unwrap();
        let sig = hasher.sign(&TokenSet::new());
        assert_eq!(sig.values(), vec![SENTINEL; 16].as_slice());
        assert!(sig.is_degenerate());
    }

    #[test]
    fn non_empty_signature_is_not_degenerate() {
        let hasher = MinHasher::new(16, 0, HashVariant::Universal).unwrap();
        assert!(!hasher.sign(&tokens(&["hello"])).is_degenerate());
    }

    #[test]
    fn signing_is_deterministic_across_hashers() {
        let set = tokens(&["the quick", "quick brown", "brown fox"]);
        let first = MinHasher::new(32, 17, HashVariant::Universal).unwrap();
        let second = MinHasher::new(32, 17, HashVariant::Universal).unwrap();
        assert_eq!(first.sign(&set), second.sign(&set));
    }

    #[test]
    fn different_seeds_produce_different_signatures() {
        let set = tokens(&["a", "b", "c", "d"]);
        let first = MinHasher::new(32, 1, HashVariant::Universal).unwrap();
        let second = MinHasher::new(32, 2, HashVariant::Universal).unwrap();
        assert_ne!(first.sign(&set), second.sign(&set));
    }

    #[test]
    fn duplicates_and_order_do_not_matter() {
        let hasher = MinHasher::new(32, 3, HashVariant::Universal).unwrap();
        let ordered = hasher.sign(["x", "y", "z"]);
        let shuffled = hasher.sign(["z", "x", "y", "x"]);
        assert_eq!(ordered, shuffled);
    }

    #[test]
    fn slot_is_minimum_over_tokens() {
        let hasher = MinHasher::new(8, 5, HashVariant::Universal).unwrap();
        let family = hasher.coefficients().unwrap();
        let words = ["alpha", "beta", "gamma"];
        let sig = hasher.sign(words);
        for (index, &value) in sig.values().iter().enumerate() {
            let expected = words
                .iter()
                .map(|w| family.hash(index, hasher.token_hash(w)))
                .min()
                .unwrap();
            assert_eq!(value, expected);
        }
    }

    #[test]
    fn with_family_matches_generated_hasher() {
        let family = CoefficientFamily::generate(24, 8).unwrap();
        let from_family = MinHasher::with_family(family);
        let generated = MinHasher::new(24, 8, HashVariant::Universal).unwrap();
        let set = tokens(&["one", "two"]);
        assert_eq!(from_family.sign(&set), generated.sign(&set));
        assert_eq!(from_family.seed(), 8);
    }

    #[test]
    fn from_config_validates() {
        let bad = LshConfig::new().with_signature_length(10).with_band_count(3);
        assert!(MinHasher::from_config(&bad).is_err());
        let good = LshConfig::new().with_variant(HashVariant::Xor);
        let hasher = MinHasher::from_config(&good).unwrap();
        assert_eq!(hasher.variant(), HashVariant::Xor);
        assert!(hasher.coefficients().is_none());
        assert_eq!(hasher.signature_length(), 240);
    }

    #[test]
    fn similar_sets_agree_more_than_disjoint_sets() {
        let hasher = MinHasher::new(256, 0, HashVariant::Universal).unwrap();
        let base: TokenSet = (0..200).map(|i| format!("tok{i}")).collect();
        let near: TokenSet = (10..210).map(|i| format!("tok{i}")).collect();
        let far: TokenSet = (1_000..1_200).map(|i| format!("tok{i}")).collect();

        let s_base = hasher.sign(&base);
        let near_score = positional_agreement(&s_base, &hasher.sign(&near));
        let far_score = positional_agreement(&s_base, &hasher.sign(&far));

        // exact Jaccard for `near` is 190 / 210 ~= 0.905
        assert!(near_score > 0.75, "near={near_score}");
        assert!(far_score < 0.1, "far={far_score}");
    }

    #[test]
    fn xor_variant_keeps_similarity_ordering() {
        let hasher = MinHasher::new(256, 0, HashVariant::Xor).unwrap();
        let base: TokenSet = (0..200).map(|i| format!("tok{i}")).collect();
        let near: TokenSet = (10..210).map(|i| format!("tok{i}")).collect();
        let far: TokenSet = (1_000..1_200).map(|i| format!("tok{i}")).collect();

        let s_base = hasher.sign(&base);
        let near_score = positional_agreement(&s_base, &hasher.sign(&near));
        let far_score = positional_agreement(&s_base, &hasher.sign(&far));
        assert!(near_score > far_score);
    }

    #[test]
    fn signature_serializes_as_plain_array() {
        let sig = Signature::from_values(vec![1, 2, 3]);
        assert_eq!(serde_json::to_string(&sig).unwrap(), "[1,2,3]");
        let back: Signature = serde_json::from_str("[1,2,3]").unwrap();
        assert_eq!(back, sig);
    }
}
