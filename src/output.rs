//! CSV writers for signatures and pair scores.
//!
//! Formats:
//! - signatures: one line per document, `id, v1, v2, ...`
//! - scores: one line per candidate pair, `a,b,score`
//!
//! Rows follow document id order, which is also candidate order.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use lsh::{Corpus, RunReport, ScoredPair, Signature};
use tracing::info;

use crate::PipelineError;
use crate::config::OutputYamlConfig;

/// Write one signature row per document.
pub fn write_signatures<W: Write>(
    mut writer: W,
    signatures: &BTreeMap<String, Signature>,
) -> io::Result<()> {
    for (id, signature) in signatures {
        write!(writer, "{id}")?;
        for value in signature.values() {
            write!(writer, ", {value}")?;
        }
        writeln!(writer)?;
    }
    writer.flush()
}

/// Write one `a,b,score` row per scored pair.
pub fn write_scores<W: Write>(mut writer: W, scores: &[ScoredPair]) -> io::Result<()> {
    for pair in scores {
        writeln!(writer, "{},{},{}", pair.first, pair.second, pair.score)?;
    }
    writer.flush()
}

/// Paths written by [`write_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub signatures: PathBuf,
    pub minhash_similarities: PathBuf,
    /// `None` when the run kept no token sets.
    pub ngram_similarities: Option<PathBuf>,
}

/// Write all CSV outputs of a finished run under `output.dir`.
pub fn write_report(
    output: &OutputYamlConfig,
    corpus: &Corpus,
    report: &RunReport,
) -> Result<WrittenFiles, PipelineError> {
    fs::create_dir_all(&output.dir).map_err(|source| PipelineError::Io {
        path: output.dir.clone(),
        source,
    })?;

    let signatures = output.signatures_path();
    write_to(&signatures, |w| write_signatures(w, corpus.signatures()))?;

    let minhash_similarities = output.minhash_similarities_path();
    write_to(&minhash_similarities, |w| write_scores(w, &report.minhash))?;

    let ngram_similarities = match &report.exact {
        Some(exact) => {
            let path = output.ngram_similarities_path();
            write_to(&path, |w| write_scores(w, exact))?;
            Some(path)
        }
        None => None,
    };

    info!(
        dir = %output.dir.display(),
        documents = corpus.len(),
        pairs = report.candidates.len(),
        "outputs_written"
    );
    Ok(WrittenFiles {
        signatures,
        minhash_similarities,
        ngram_similarities,
    })
}

fn write_to<F>(path: &Path, body: F) -> Result<(), PipelineError>
where
    F: FnOnce(BufWriter<File>) -> io::Result<()>,
{
    File::create(path)
        .and_then(|file| body(BufWriter::new(file)))
        .map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsh::{LshConfig, TokenSet};
    use tempfile::tempdir;

    fn tokens(items: &[&str]) -> TokenSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn signature_rows() {
        let mut sigs = BTreeMap::new();
        sigs.insert("b".to_string(), Signature::from_values(vec![3, 4]));
        sigs.insert("a".to_string(), Signature::from_values(vec![1, 2]));

        let mut buf = Vec::new();
        write_signatures(&mut buf, &sigs).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a, 1, 2\nb, 3, 4\n");
    }

    #[test]
    fn score_rows() {
        let scores = vec![
            ScoredPair {
                first: "a".into(),
                second: "b".into(),
                score: 0.5,
            },
            ScoredPair {
                first: "a".into(),
                second: "c".into(),
                score: 1.0,
            },
        ];
        let mut buf = Vec::new();
        write_scores(&mut buf, &scores).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a,b,0.5\na,c,1\n");
    }

    #[test]
    fn report_writes_three_files() {
        let dir = tempdir().unwrap();
        let output = OutputYamlConfig {
            dir: dir.path().join("out"),
            ..OutputYamlConfig::default()
        };

        let config = LshConfig::new().with_signature_length(8).with_band_count(4);
        let mut corpus = Corpus::new(config).unwrap();
        corpus.insert("x", tokens(&["p", "q"])).unwrap();
        corpus.insert("y", tokens(&["p", "q"])).unwrap();
        let report = corpus.run().unwrap();

        let written = write_report(&output, &corpus, &report).unwrap();
        let sims = fs::read_to_string(&written.minhash_similarities).unwrap();
        assert_eq!(sims, "x,y,1\n");
        let ngram = fs::read_to_string(written.ngram_similarities.unwrap()).unwrap();
        assert_eq!(ngram, "x,y,1\n");
        let sigs = fs::read_to_string(&written.signatures).unwrap();
        assert_eq!(sigs.lines().count(), 2);
        assert!(sigs.starts_with("x, "));
    }

    #[test]
    fn report_skips_exact_scores_without_tokens() {
        let dir = tempdir().unwrap();
        let output = OutputYamlConfig {
            dir: dir.path().to_path_buf(),
            ..OutputYamlConfig::default()
        };

        let config = LshConfig::new()
            .with_signature_length(8)
            .with_band_count(4)
            .with_keep_tokens(false);
        let mut corpus = Corpus::new(config).unwrap();
        corpus.insert("x", tokens(&["p"])).unwrap();
        let report = corpus.run().unwrap();

        let written = write_report(&output, &corpus, &report).unwrap();
        assert!(written.ngram_similarities.is_none());
        assert!(!output.ngram_similarities_path().exists());
    }
}
