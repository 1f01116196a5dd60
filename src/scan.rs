//! Corpus directory scanning.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use lsh::{Corpus, TokenSet};
use tracing::{debug, info, Level};

use crate::PipelineError;
use crate::ngrams::load_ngrams;

/// A document loaded from disk, keyed by its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    pub id: String,
    pub path: PathBuf,
    pub tokens: TokenSet,
}

/// Regular files directly inside `dir`, sorted by file name.
///
/// Subdirectories are not descended into. Files whose names are not valid
/// UTF-8 are skipped.
pub fn list_documents(dir: &Path) -> Result<Vec<(String, PathBuf)>, PipelineError> {
    if !dir.is_dir() {
        return Err(PipelineError::NotADirectory(dir.to_path_buf()));
    }

    let io_err = |source| PipelineError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let file_type = entry.file_type().map_err(io_err)?;
        if !file_type.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => files.push((name, entry.path())),
            Err(name) => debug!(file = ?name, "skipping_non_utf8_name"),
        }
    }
    files.sort();
    Ok(files)
}

/// Load the word n-grams of every document in `dir`.
pub fn scan_directory(dir: &Path, ngram_len: usize) -> Result<Vec<LoadedDocument>, PipelineError> {
    let span = tracing::span!(Level::INFO, "docsim.scan", dir = %dir.display(), ngram_len);
    let _guard = span.enter();
    let start = Instant::now();

    let mut documents = Vec::new();
    for (id, path) in list_documents(dir)? {
        let tokens = load_ngrams(&path, ngram_len).map_err(|source| PipelineError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(doc_id = %id, ngrams = tokens.len(), "document_loaded");
        documents.push(LoadedDocument { id, path, tokens });
    }

    info!(
        documents = documents.len(),
        elapsed_micros = start.elapsed().as_micros(),
        "scan_success"
    );
    Ok(documents)
}

/// Scan `dir` with the corpus' n-gram width and sign every document into it.
pub fn ingest_directory(dir: &Path, corpus: &mut Corpus) -> Result<usize, PipelineError> {
    let documents = scan_directory(dir, corpus.config().ngram_len)?;
    let inserted = corpus.insert_all(documents.into_iter().map(|doc| (doc.id, doc.tokens)))?;
    Ok(inserted)
}
