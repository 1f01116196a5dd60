//! YAML configuration file support for docsim runs.
//!
//! A single file describes the LSH parameters and where the CSV outputs go.
//! Every field has a default, so an empty `version: "1.0"` document is a
//! valid configuration.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "news-dedup"
//!
//! lsh:
//!   signature_length: 240
//!   band_count: 80
//!   ngram_len: 3
//!   seed: 0
//!   variant: "universal"
//!   use_parallel: true
//!   keep_tokens: true
//!   exclude_degenerate: true
//!
//! output:
//!   dir: "out"
//!   signatures_file: "minhash_sigs.csv"
//!   minhash_similarities_file: "minhash_sim.csv"
//!   ngram_similarities_file: "ngram_sim.csv"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use lsh::{HashVariant, LshConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsimConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    /// MinHash / LSH parameters
    #[serde(default)]
    pub lsh: LshYamlConfig,

    /// CSV output locations
    #[serde(default)]
    pub output: OutputYamlConfig,
}

impl DocsimConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: DocsimConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to YAML
    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the configuration.
    ///
    /// Callers that patch fields after loading (e.g. from CLI flags) should
    /// call this again before starting a run.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.lsh.validate()?;
        self.output.validate()?;
        Ok(())
    }
}

impl Default for DocsimConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            lsh: LshYamlConfig::default(),
            output: OutputYamlConfig::default(),
        }
    }
}

/// LSH section of the YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LshYamlConfig {
    #[serde(default = "default_signature_length")]
    pub signature_length: usize,

    #[serde(default = "default_band_count")]
    pub band_count: usize,

    #[serde(default = "default_ngram_len")]
    pub ngram_len: usize,

    #[serde(default)]
    pub seed: u64,

    #[serde(default)]
    pub variant: HashVariant,

    #[serde(default)]
    pub use_parallel: bool,

    #[serde(default = "true_value")]
    pub keep_tokens: bool,

    #[serde(default = "true_value")]
    pub exclude_degenerate: bool,
}

impl LshYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.ngram_len == 0 {
            return Err(ConfigLoadError::Validation(
                "lsh.ngram_len must be >= 1".to_string(),
            ));
        }
        self.to_lsh_config()
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("lsh: {err}")))
    }

    /// Core configuration for these parameters
    pub fn to_lsh_config(&self) -> LshConfig {
        LshConfig::new()
            .with_signature_length(self.signature_length)
            .with_band_count(self.band_count)
            .with_ngram_len(self.ngram_len)
            .with_seed(self.seed)
            .with_variant(self.variant)
            .with_parallel(self.use_parallel)
            .with_keep_tokens(self.keep_tokens)
            .with_exclude_degenerate(self.exclude_degenerate)
    }
}

impl Default for LshYamlConfig {
    fn default() -> Self {
        let defaults = LshConfig::default();
        Self {
            signature_length: defaults.signature_length,
            band_count: defaults.band_count,
            ngram_len: defaults.ngram_len,
            seed: defaults.seed,
            variant: defaults.variant,
            use_parallel: defaults.use_parallel,
            keep_tokens: defaults.keep_tokens,
            exclude_degenerate: defaults.exclude_degenerate,
        }
    }
}

/// Output section of the YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputYamlConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_signatures_file")]
    pub signatures_file: String,

    #[serde(default = "default_minhash_similarities_file")]
    pub minhash_similarities_file: String,

    #[serde(default = "default_ngram_similarities_file")]
    pub ngram_similarities_file: String,
}

impl OutputYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        let files = [
            ("output.signatures_file", &self.signatures_file),
            (
                "output.minhash_similarities_file",
                &self.minhash_similarities_file,
            ),
            (
                "output.ngram_similarities_file",
                &self.ngram_similarities_file,
            ),
        ];
        for (field, value) in files {
            if value.trim().is_empty() {
                return Err(ConfigLoadError::Validation(format!(
                    "{field} must not be empty"
                )));
            }
        }
        Ok(())
    }

    pub fn signatures_path(&self) -> PathBuf {
        self.dir.join(&self.signatures_file)
    }

    pub fn minhash_similarities_path(&self) -> PathBuf {
        self.dir.join(&self.minhash_similarities_file)
    }

    pub fn ngram_similarities_path(&self) -> PathBuf {
        self.dir.join(&self.ngram_similarities_file)
    }
}

impl Default for OutputYamlConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            signatures_file: default_signatures_file(),
            minhash_similarities_file: default_minhash_similarities_file(),
            ngram_similarities_file: default_ngram_similarities_file(),
        }
    }
}

fn default_signature_length() -> usize {
    240
}
fn default_band_count() -> usize {
    80
}
fn default_ngram_len() -> usize {
    1
}
fn true_value() -> bool {
    true
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_signatures_file() -> String {
    "minhash_sigs.csv".to_string()
}
fn default_minhash_similarities_file() -> String {
    "minhash_sim.csv".to_string()
}
fn default_ngram_similarities_file() -> String {
    "ngram_sim.csv".to_string()
}
