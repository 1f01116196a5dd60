//! Stateful run over one corpus: sign, band, detect candidates, score.
//!
//! A [`Corpus`] owns the frozen [`MinHasher`] for the run plus every
//! per-document artifact keyed by document id. Stages are explicit calls so
//! callers can stop after any of them. Inserting a document clears the
//! derived bands and candidates; the scorers recompute them on demand.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn, Level};

use crate::bands::{bands, BandedSignature};
use crate::candidates::{find_candidates_indexed, find_candidates_parallel, CandidatePair};
use crate::config::{ConfigError, LshConfig, LshError};
use crate::minhash::{MinHasher, Signature, TokenSet};
use crate::similarity::{
    exact_jaccard, exact_similarities, minhash_similarities, signature_agreement, ScoredPair,
};

/// Output of [`Corpus::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub candidates: Vec<CandidatePair>,
    /// Signature-agreement scores, aligned with `candidates`.
    pub minhash: Vec<ScoredPair>,
    /// Exact Jaccard scores, aligned with `candidates`; `None` when token
    /// sets were not retained.
    pub exact: Option<Vec<ScoredPair>>,
}

#[derive(Debug, Clone)]
pub struct Corpus {
    config: LshConfig,
    hasher: MinHasher,
    signatures: BTreeMap<String, Signature>,
    token_sets: BTreeMap<String, TokenSet>,
    degenerate: BTreeSet<String>,
    bands: BTreeMap<String, BandedSignature>,
    candidates: Vec<CandidatePair>,
    /// Signatures changed since the last banding.
    stale: bool,
    /// Bands changed since the last candidate detection.
    candidates_stale: bool,
}

impl Corpus {
    /// Validate `config` and generate the hash family for the run.
    pub fn new(config: LshConfig) -> Result<Self, ConfigError> {
        let hasher = MinHasher::from_config(&config)?;
        Ok(Self {
            config,
            hasher,
            signatures: BTreeMap::new(),
            token_sets: BTreeMap::new(),
            degenerate: BTreeSet::new(),
            bands: BTreeMap::new(),
            candidates: Vec::new(),
            stale: false,
            candidates_stale: false,
        })
    }

    pub fn config(&self) -> &LshConfig {
        &self.config
    }

    pub fn hasher(&self) -> &MinHasher {
        &self.hasher
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.signatures.contains_key(id)
    }

    /// Sign one document and store its signature.
    pub fn insert(&mut self, id: impl Into<String>, tokens: TokenSet) -> Result<&Signature, LshError> {
        let id = id.into();
        if self.signatures.contains_key(&id) {
            return Err(LshError::DuplicateDocument { id });
        }
        let signature = self.hasher.sign(&tokens);
        self.store(id.clone(), tokens, signature);
        Ok(&self.signatures[&id])
    }

    /// Sign a batch of documents, on the rayon pool when `use_parallel` is
    /// set. Ids are checked before anything is signed, so a duplicate leaves
    /// the corpus untouched.
    pub fn insert_all<I>(&mut self, documents: I) -> Result<usize, LshError>
    where
        I: IntoIterator<Item = (String, TokenSet)>,
    {
        let documents: Vec<(String, TokenSet)> = documents.into_iter().collect();
        let mut seen = BTreeSet::new();
        for (id, _) in &documents {
            if self.signatures.contains_key(id) || !seen.insert(id.as_str()) {
                return Err(LshError::DuplicateDocument { id: id.clone() });
            }
        }

        let span = tracing::span!(Level::INFO, "lsh.sign_corpus", documents = documents.len());
        let _guard = span.enter();
        let start = Instant::now();

        let signatures: Vec<Signature> = if self.config.use_parallel {
            documents
                .par_iter()
                .map(|(_, tokens)| self.hasher.sign(tokens))
                .collect()
        } else {
            documents
                .iter()
                .map(|(_, tokens)| self.hasher.sign(tokens))
                .collect()
        };

        let count = documents.len();
        for ((id, tokens), signature) in documents.into_iter().zip(signatures) {
            self.store(id, tokens, signature);
        }

        info!(
            documents = count,
            total = self.signatures.len(),
            degenerate = self.degenerate.len(),
            elapsed_micros = start.elapsed().as_micros(),
            "sign_success"
        );
        Ok(count)
    }

    fn store(&mut self, id: String, tokens: TokenSet, signature: Signature) {
        if signature.is_degenerate() {
            warn!(doc_id = %id, "degenerate_document");
            self.degenerate.insert(id.clone());
        }
        if self.config.keep_tokens {
            self.token_sets.insert(id.clone(), tokens);
        }
        self.signatures.insert(id, signature);
        self.bands.clear();
        self.candidates.clear();
        self.stale = true;
        self.candidates_stale = true;
    }

    pub fn signature(&self, id: &str) -> Result<&Signature, LshError> {
        self.signatures
            .get(id)
            .ok_or_else(|| LshError::MissingDocument { id: id.to_string() })
    }

    pub fn signatures(&self) -> &BTreeMap<String, Signature> {
        &self.signatures
    }

    /// Retained token sets; empty when `keep_tokens` is off.
    pub fn token_sets(&self) -> &BTreeMap<String, TokenSet> {
        &self.token_sets
    }

    /// Documents whose token set was empty.
    pub fn degenerate_ids(&self) -> &BTreeSet<String> {
        &self.degenerate
    }

    /// Banded signatures from the last [`Corpus::compute_bands`] call.
    ///
    /// Empty again after any insert.
    pub fn bands(&self) -> &BTreeMap<String, BandedSignature> {
        &self.bands
    }

    /// Candidates from the last [`Corpus::compute_candidates`] call.
    ///
    /// Empty again after any insert.
    pub fn candidates(&self) -> &[CandidatePair] {
        &self.candidates
    }

    /// Band the signature of one document.
    pub fn band_signature(&self, id: &str) -> Result<BandedSignature, LshError> {
        Ok(bands(self.signature(id)?, self.config.band_count)?)
    }

    /// Band every stored signature.
    ///
    /// Degenerate documents are skipped when `exclude_degenerate` is set.
    pub fn compute_bands(&mut self) -> Result<&BTreeMap<String, BandedSignature>, LshError> {
        let span = tracing::span!(Level::INFO, "lsh.bands", band_count = self.config.band_count);
        let _guard = span.enter();
        let start = Instant::now();

        let band_count = self.config.band_count;
        let exclude = self.config.exclude_degenerate;
        let selected: Vec<(&String, &Signature)> = self
            .signatures
            .iter()
            .filter(|(id, _)| !(exclude && self.degenerate.contains(*id)))
            .collect();

        let banded: Result<Vec<(String, BandedSignature)>, ConfigError> = if self.config.use_parallel {
            selected
                .par_iter()
                .map(|(id, sig)| bands(sig, band_count).map(|b| ((*id).clone(), b)))
                .collect()
        } else {
            selected
                .iter()
                .map(|(id, sig)| bands(sig, band_count).map(|b| ((*id).clone(), b)))
                .collect()
        };

        self.bands = banded?.into_iter().collect();
        self.candidates.clear();
        self.stale = false;
        self.candidates_stale = true;

        info!(
            documents = self.bands.len(),
            skipped = self.signatures.len() - self.bands.len(),
            elapsed_micros = start.elapsed().as_micros(),
            "bands_success"
        );
        Ok(&self.bands)
    }

    /// Detect candidate pairs, banding first if signatures changed since the
    /// last banding.
    pub fn compute_candidates(&mut self) -> Result<&[CandidatePair], LshError> {
        if self.stale || self.bands.len() != self.banded_population() {
            self.compute_bands()?;
        }

        let span = tracing::span!(Level::INFO, "lsh.candidates", documents = self.bands.len());
        let _guard = span.enter();
        let start = Instant::now();

        self.candidates = if self.config.use_parallel {
            find_candidates_parallel(&self.bands)?
        } else {
            find_candidates_indexed(&self.bands)?
        };
        self.candidates_stale = false;

        info!(
            candidates = self.candidates.len(),
            elapsed_micros = start.elapsed().as_micros(),
            "candidates_success"
        );
        Ok(&self.candidates)
    }

    fn banded_population(&self) -> usize {
        if self.config.exclude_degenerate {
            self.signatures.len() - self.degenerate.len()
        } else {
            self.signatures.len()
        }
    }

    /// Signature-agreement scores for the current candidates.
    ///
    /// Candidates are recomputed first if documents or bands changed since
    /// the last detection.
    pub fn minhash_similarities(&mut self) -> Result<Vec<ScoredPair>, LshError> {
        self.refresh_candidates()?;
        let span = tracing::span!(Level::INFO, "lsh.score", estimator = "minhash");
        let _guard = span.enter();
        minhash_similarities(&self.signatures, &self.candidates, self.config.use_parallel)
    }

    /// Exact Jaccard scores for the current candidates.
    ///
    /// Requires `keep_tokens`; otherwise fails with
    /// [`LshError::MissingDocument`] on the first candidate. Refreshes
    /// candidates like [`Corpus::minhash_similarities`].
    pub fn exact_similarities(&mut self) -> Result<Vec<ScoredPair>, LshError> {
        self.refresh_candidates()?;
        let span = tracing::span!(Level::INFO, "lsh.score", estimator = "exact");
        let _guard = span.enter();
        exact_similarities(&self.token_sets, &self.candidates, self.config.use_parallel)
    }

    fn refresh_candidates(&mut self) -> Result<(), LshError> {
        if self.stale || self.candidates_stale {
            self.compute_candidates()?;
        }
        Ok(())
    }

    /// Signature agreement between two stored documents.
    pub fn similarity(&self, a: &str, b: &str) -> Result<f64, LshError> {
        signature_agreement(self.signature(a)?, self.signature(b)?)
    }

    /// Exact Jaccard between two stored documents.
    pub fn exact_similarity(&self, a: &str, b: &str) -> Result<f64, LshError> {
        let lookup = |id: &str| {
            self.token_sets
                .get(id)
                .ok_or_else(|| LshError::MissingDocument { id: id.to_string() })
        };
        Ok(exact_jaccard(lookup(a)?, lookup(b)?))
    }

    /// Band, detect candidates, and score them with both estimators.
    pub fn run(&mut self) -> Result<RunReport, LshError> {
        self.compute_bands()?;
        let candidates = self.compute_candidates()?.to_vec();
        let minhash = self.minhash_similarities()?;
        let exact = if self.config.keep_tokens {
            Some(self.exact_similarities()?)
        } else {
            None
        };
        Ok(RunReport {
            candidates,
            minhash,
            exact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> TokenSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn range_tokens(start: usize, end: usize) -> TokenSet {
        (start..end).map(|i| format!("w{i}")).collect()
    }

    fn small_config() -> LshConfig {
        LshConfig::new().with_signature_length(64).with_band_count(16)
    }

    #[test]
    fn new_rejects_invalid_config() {
        let cfg = LshConfig::new().with_signature_length(10).with_band_count(3);
        assert!(matches!(
            Corpus::new(cfg),
            Err(ConfigError::IndivisibleBands { .. })
        ));
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let mut corpus = Corpus::new(small_config()).unwrap();
        corpus.insert("a", tokens(&["x"])).unwrap();
        assert_eq!(
            corpus.insert("a", tokens(&["y"])).unwrap_err(),
            LshError::DuplicateDocument { id: "a".into() }
        );
        assert_eq!(corpus.len(), 1);
    }

    #[test]
    fn insert_all_checks_duplicates_before_signing() {
        let mut corpus = Corpus::new(small_config()).unwrap();
        let docs = vec![
            ("a".to_string(), tokens(&["x"])),
            ("b".to_string(), tokens(&["y"])),
            ("a".to_string(), tokens(&["z"])),
        ];
        assert!(corpus.insert_all(docs).is_err());
        assert!(corpus.is_empty());
    }

    #[test]
    fn degenerate_documents_are_tracked_and_excluded() {
        let mut corpus = Corpus::new(small_config()).unwrap();
        corpus.insert("empty-1", TokenSet::new()).unwrap();
        corpus.insert("empty-2", TokenSet::new()).unwrap();
        corpus.insert("full", tokens(&["a", "b"])).unwrap();

        assert_eq!(corpus.degenerate_ids().len(), 2);
        corpus.compute_bands().unwrap();
        assert_eq!(corpus.bands().len(), 1);
        assert!(corpus.compute_candidates().unwrap().is_empty());
    }

    #[test]
    fn degenerate_documents_collide_when_included() {
        let cfg = small_config().with_exclude_degenerate(false);
        let mut corpus = Corpus::new(cfg).unwrap();
        corpus.insert("empty-1", TokenSet::new()).unwrap();
        corpus.insert("empty-2", TokenSet::new()).unwrap();

        let candidates = corpus.compute_candidates().unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(corpus.similarity("empty-1", "empty-2").unwrap(), 1.0);
    }

    #[test]
    fn near_duplicates_become_candidates() {
        let mut corpus = Corpus::new(LshConfig::default()).unwrap();
        corpus.insert("base", range_tokens(0, 300)).unwrap();
        corpus.insert("near", range_tokens(5, 305)).unwrap();
        corpus.insert("far", range_tokens(10_000, 10_300)).unwrap();

        let report = corpus.run().unwrap();
        assert_eq!(
            report.candidates,
            vec![CandidatePair::new("base", "near").unwrap()]
        );
        assert!(report.minhash[0].score > 0.8);
        let exact = report.exact.unwrap();
        assert!((exact[0].score - 295.0 / 305.0).abs() < 1e-12);
    }

    #[test]
    fn exact_scores_need_retained_tokens() {
        let cfg = small_config().with_keep_tokens(false);
        let mut corpus = Corpus::new(cfg).unwrap();
        corpus.insert("a", range_tokens(0, 50)).unwrap();
        corpus.insert("b", range_tokens(0, 50)).unwrap();

        let report = corpus.run().unwrap();
        assert_eq!(report.candidates.len(), 1);
        assert!(report.exact.is_none());
        assert!(matches!(
            corpus.exact_similarities(),
            Err(LshError::MissingDocument { .. })
        ));
        assert!(corpus.token_sets().is_empty());
    }

    #[test]
    fn lookups_report_missing_documents() {
        let mut corpus = Corpus::new(small_config()).unwrap();
        corpus.insert("a", tokens(&["x"])).unwrap();
        let missing = LshError::MissingDocument { id: "nope".into() };
        assert_eq!(corpus.similarity("a", "nope").unwrap_err(), missing);
        assert_eq!(corpus.exact_similarity("nope", "a").unwrap_err(), missing);
        assert_eq!(corpus.band_signature("nope").unwrap_err(), missing);
        assert_eq!(corpus.band_signature("a").unwrap().len(), 16);
    }

    #[test]
    fn insert_after_banding_refreshes_candidates() {
        let mut corpus = Corpus::new(small_config()).unwrap();
        corpus.insert("a", range_tokens(0, 40)).unwrap();
        assert!(corpus.compute_candidates().unwrap().is_empty());

        corpus.insert("b", range_tokens(0, 40)).unwrap();
        let candidates = corpus.compute_candidates().unwrap();
        assert_eq!(candidates, &[CandidatePair::new("a", "b").unwrap()]);
    }

    #[test]
    fn insert_clears_derived_artifacts() {
        let mut corpus = Corpus::new(small_config()).unwrap();
        corpus.insert("a", range_tokens(0, 40)).unwrap();
        corpus.insert("b", range_tokens(0, 40)).unwrap();
        assert_eq!(corpus.compute_candidates().unwrap().len(), 1);
        assert_eq!(corpus.bands().len(), 2);

        corpus.insert("c", range_tokens(0, 40)).unwrap();
        assert!(corpus.bands().is_empty());
        assert!(corpus.candidates().is_empty());
    }

    #[test]
    fn scoring_after_insert_sees_new_documents() {
        let mut corpus = Corpus::new(small_config()).unwrap();
        corpus.insert("a", range_tokens(0, 40)).unwrap();
        corpus.insert("b", range_tokens(0, 40)).unwrap();
        corpus.compute_candidates().unwrap();
        corpus.insert("c", range_tokens(0, 40)).unwrap();

        let minhash = corpus.minhash_similarities().unwrap();
        assert_eq!(minhash.len(), 3);
        assert!(minhash.iter().all(|p| p.score == 1.0));
        assert_eq!(corpus.candidates().len(), 3);

        corpus.insert("d", range_tokens(0, 40)).unwrap();
        let exact = corpus.exact_similarities().unwrap();
        assert_eq!(exact.len(), 6);
    }

    #[test]
    fn scoring_after_rebanding_recomputes_candidates() {
        let mut corpus = Corpus::new(small_config()).unwrap();
        corpus.insert("a", range_tokens(0, 40)).unwrap();
        corpus.insert("b", range_tokens(0, 40)).unwrap();
        corpus.compute_bands().unwrap();
        assert!(corpus.candidates().is_empty());
        assert_eq!(corpus.minhash_similarities().unwrap().len(), 1);
    }

    #[test]
    fn parallel_run_matches_sequential() {
        let docs: Vec<(String, TokenSet)> = (0..40)
            .map(|i| (format!("doc-{i:02}"), range_tokens(i * 10, i * 10 + 60)))
            .collect();

        let mut sequential = Corpus::new(small_config()).unwrap();
        sequential.insert_all(docs.clone()).unwrap();
        let mut parallel = Corpus::new(small_config().with_parallel(true)).unwrap();
        parallel.insert_all(docs).unwrap();

        assert_eq!(sequential.signatures(), parallel.signatures());
        assert_eq!(sequential.run().unwrap(), parallel.run().unwrap());
    }
}
