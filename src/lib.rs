//! Near-duplicate detection over a directory of text files.
//!
//! This crate wires the `lsh` core to the file system: word n-gram loading,
//! corpus directory scanning, YAML configuration and CSV output. The
//! similarity machinery itself lives in the `lsh` crate and is re-exported
//! here so callers need a single dependency.

pub mod config;
pub mod ngrams;
pub mod output;
pub mod scan;

pub use lsh::{
    BandedSignature, CandidatePair, CoefficientFamily, ConfigError, Corpus, HashVariant,
    LshConfig, LshError, MinHasher, RunReport, SENTINEL, ScoredPair, Signature, TokenSet,
    XorFamily, band_hash, bands, candidate_probability, exact_jaccard, exact_similarities,
    find_candidates, find_candidates_indexed, find_candidates_parallel, minhash_similarities,
    probability_curve, s_curve_threshold, signature_agreement, suggest_band_count,
};

pub use crate::config::{ConfigLoadError, DocsimConfig, LshYamlConfig, OutputYamlConfig};
pub use crate::ngrams::{load_ngrams, ngrams_from_reader};
pub use crate::output::{WrittenFiles, write_report, write_scores, write_signatures};
pub use crate::scan::{LoadedDocument, ingest_directory, list_documents, scan_directory};

use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while running the pipeline over a corpus directory.
#[derive(Debug)]
pub enum PipelineError {
    Io { path: PathBuf, source: io::Error },
    NotADirectory(PathBuf),
    Config(ConfigLoadError),
    Lsh(LshError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Io { path, source } => {
                write!(f, "i/o failure on {}: {source}", path.display())
            }
            PipelineError::NotADirectory(path) => {
                write!(f, "corpus path is not a directory: {}", path.display())
            }
            PipelineError::Config(err) => write!(f, "configuration failure: {err}"),
            PipelineError::Lsh(err) => write!(f, "similarity pipeline failure: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Io { source, .. } => Some(source),
            PipelineError::Config(err) => Some(err),
            PipelineError::Lsh(err) => Some(err),
            PipelineError::NotADirectory(_) => None,
        }
    }
}

impl From<ConfigLoadError> for PipelineError {
    fn from(value: ConfigLoadError) -> Self {
        PipelineError::Config(value)
    }
}

impl From<LshError> for PipelineError {
    fn from(value: LshError) -> Self {
        PipelineError::Lsh(value)
    }
}

impl From<ConfigError> for PipelineError {
    fn from(value: ConfigError) -> Self {
        PipelineError::Lsh(LshError::Config(value))
    }
}

/// Scan `dir`, sign every file and run banding, candidate detection and
/// scoring with the parameters from `config`.
///
/// Returns the populated corpus alongside the report so callers can reach
/// signatures and token sets afterwards.
pub fn run_directory(
    dir: &Path,
    config: &DocsimConfig,
) -> Result<(Corpus, RunReport), PipelineError> {
    config.validate()?;
    let mut corpus = Corpus::new(config.lsh.to_lsh_config())?;
    ingest_directory(dir, &mut corpus)?;
    let report = corpus.run()?;
    Ok((corpus, report))
}
