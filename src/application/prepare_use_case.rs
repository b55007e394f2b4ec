// ============================================================
// Layer 2 - PrepareUseCase
// ============================================================
// Produces a ready-to-iterate Corpus for a data directory:
//
//   Step 1: Resolve the data-directory layout     (Layer 4 - data)
//   Step 2: Pick the cache and its policy         (Layer 6 - infra)
//   Step 3: Load the cached corpus or build it    (Layer 6 → Layer 4)
//
// The other use cases start from the same corpus, so they all go
// through PrepareUseCase::load_corpus.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::corpus::{Corpus, CorpusConfig, CorpusSummary};
use crate::data::loader::CorpusFiles;
use crate::infra::corpus_cache::{CorpusCache, InvalidationPolicy};

// ─── Prepare Configuration ───────────────────────────────────────────────────
// Serialisable so a whole run can be described in one JSON file:
//
//   {
//     "data_dir": "data/imdb",
//     "corpus":   { "align_len": 400, "vocab": { "lower_case": true } },
//     "policy":   "source_fingerprint"
//   }
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepareConfig {
    pub data_dir: PathBuf,
    pub corpus: CorpusConfig,
    pub policy: InvalidationPolicy,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            corpus: CorpusConfig::default(),
            policy: InvalidationPolicy::default(),
        }
    }
}

impl PrepareConfig {
    /// Read a config from JSON. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid config JSON in '{}'", path.display()))
    }
}

// ─── PrepareUseCase ───────────────────────────────────────────────────────────
pub struct PrepareUseCase {
    config: PrepareConfig,
}

impl PrepareUseCase {
    pub fn new(config: PrepareConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PrepareConfig {
        &self.config
    }

    /// Load or build the corpus described by the config.
    pub fn load_corpus(&self) -> Result<Corpus> {
        let cfg = &self.config;
        let files = CorpusFiles::new(&cfg.data_dir);
        let cache = CorpusCache::in_dir(&files, cfg.policy);

        tracing::info!(
            "Preparing corpus in '{}' (align_len={}, policy={:?})",
            cfg.data_dir.display(),
            cfg.corpus.align_len,
            cfg.policy
        );

        cache
            .load_or_build(&files, &cfg.corpus)
            .with_context(|| format!("Cannot prepare corpus in '{}'", cfg.data_dir.display()))
    }

    /// Load or build, then report the corpus sizes.
    pub fn execute(&self) -> Result<CorpusSummary> {
        let corpus = self.load_corpus()?;
        Ok(corpus.summary())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::corpus::tests::write_corpus;

    fn config_for(dir: &Path) -> PrepareConfig {
        PrepareConfig {
            data_dir: dir.to_path_buf(),
            corpus: write_corpus(dir),
            policy: InvalidationPolicy::SourceFingerprint,
        }
    }

    #[test]
    fn test_execute_reports_summary_and_writes_cache() {
        let dir = tempfile::tempdir().unwrap();
        let summary = PrepareUseCase::new(config_for(dir.path())).execute().unwrap();

        assert_eq!(summary.vocab_size, 8);
        assert_eq!(summary.align_len, 6);
        assert_eq!(summary.train_samples, 5);
        assert_eq!(summary.valid_samples, 3);
        assert!(dir.path().join("cache.pt").exists());
    }

    #[test]
    fn test_missing_data_dir_has_context() {
        let dir = tempfile::tempdir().unwrap();
        let config = PrepareConfig {
            data_dir: dir.path().join("nowhere"),
            ..PrepareConfig::default()
        };

        let err = PrepareUseCase::new(config).execute().unwrap_err();
        assert!(format!("{err:#}").contains("Cannot prepare corpus"));
    }

    #[test]
    fn test_config_from_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prepare.json");
        std::fs::write(
            &path,
            r#"{ "data_dir": "corpus", "corpus": { "align_len": 40 }, "policy": "never" }"#,
        )
        .unwrap();

        let config = PrepareConfig::from_json_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("corpus"));
        assert_eq!(config.corpus.align_len, 40);
        assert_eq!(config.corpus.vocab.special_tokens.len(), 4);
        assert_eq!(config.policy, InvalidationPolicy::Never);
    }

    #[test]
    fn test_bad_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prepare.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(PrepareConfig::from_json_file(&path).is_err());
    }
}
