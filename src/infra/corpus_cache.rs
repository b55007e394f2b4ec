// ============================================================
// Layer 6 - Corpus Cache
// ============================================================
// Load-or-build memoization of an encoded Corpus.
//
//   cache.pt exists and is fresh  → deserialize and return it
//   otherwise                     → Corpus::build, persist, return
//
// On-disk layout (bincode):
//
//   format_version : u32          first 4 bytes, checked first
//   fingerprint    : Option<u64>  see infra/fingerprint.rs
//   corpus         : Corpus
//
// Freshness depends on the InvalidationPolicy:
//   Never              → any readable artifact of the current
//                        format version is reused, even if the
//                        source files changed since
//   SourceFingerprint  → the stored fingerprint must match the
//                        current source files and config
//
// Writes go to "<path>.tmp" and are renamed into place, so a
// crash mid-write never leaves a truncated cache.pt behind.
//
// There is no eviction. A corrupt artifact is an error, not a
// rebuild trigger.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::data::corpus::{Corpus, CorpusConfig};
use crate::data::loader::CorpusFiles;
use crate::domain::error::{CorpusError, Result};
use crate::infra::fingerprint::source_fingerprint;

/// Bumped whenever the serialised Corpus layout changes.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// When a cached corpus counts as stale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationPolicy {
    /// Reuse whatever is on disk
    Never,
    /// Rebuild when the source files or config change
    #[default]
    SourceFingerprint,
}

#[derive(Serialize)]
struct CacheEnvelopeRef<'a> {
    format_version: u32,
    fingerprint: Option<u64>,
    corpus: &'a Corpus,
}

#[derive(Deserialize)]
struct CacheEnvelope {
    format_version: u32,
    fingerprint: Option<u64>,
    corpus: Corpus,
}

pub struct CorpusCache {
    path: PathBuf,
    policy: InvalidationPolicy,
}

impl CorpusCache {
    pub fn new(path: impl Into<PathBuf>, policy: InvalidationPolicy) -> Self {
        Self { path: path.into(), policy }
    }

    /// Cache at the standard location inside the data directory.
    pub fn in_dir(files: &CorpusFiles, policy: InvalidationPolicy) -> Self {
        Self::new(files.cache(), policy)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> InvalidationPolicy {
        self.policy
    }

    /// Return the cached corpus if it is fresh, otherwise build,
    /// persist and return a new one.
    pub fn load_or_build(&self, files: &CorpusFiles, config: &CorpusConfig) -> Result<Corpus> {
        let fingerprint = match self.policy {
            InvalidationPolicy::Never => None,
            InvalidationPolicy::SourceFingerprint => Some(source_fingerprint(files, config)?),
        };

        if self.path.exists() {
            if let Some(corpus) = self.read_fresh(fingerprint)? {
                tracing::info!("Loading cached dataset from '{}'", self.path.display());
                return Ok(corpus);
            }
            tracing::warn!("Cached dataset '{}' is stale, rebuilding", self.path.display());
        }

        let corpus = Corpus::build(files, config)?;
        self.save(&corpus, fingerprint)?;
        Ok(corpus)
    }

    /// Load the cached corpus without any freshness check.
    pub fn load(&self) -> Result<Corpus> {
        let bytes = self.read_bytes()?;
        self.check_version(&bytes)?
            .then_some(())
            .ok_or_else(|| CorpusError::cache(&self.path, "unsupported cache format version"))?;
        Ok(self.decode(&bytes)?.corpus)
    }

    /// Serialise `corpus` to the cache path.
    pub fn save(&self, corpus: &Corpus, fingerprint: Option<u64>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CorpusError::io(parent, "cannot create cache directory", e))?;
        }

        let envelope = CacheEnvelopeRef {
            format_version: CACHE_FORMAT_VERSION,
            fingerprint,
            corpus,
        };
        let bytes = bincode::serialize(&envelope).map_err(|e| {
            CorpusError::cache_with_source(&self.path, "cannot serialize corpus", e)
        })?;

        let tmp = self.tmp_path();
        fs::write(&tmp, &bytes).map_err(|e| CorpusError::io(&tmp, "cannot write cache", e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| CorpusError::io(&self.path, "cannot move cache into place", e))?;

        tracing::info!(
            "Saved dataset cache '{}' ({} bytes)",
            self.path.display(),
            bytes.len()
        );
        Ok(())
    }

    /// Delete the artifact. Returns false if there was none.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CorpusError::io(&self.path, "cannot remove cache", e)),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|e| CorpusError::io(&self.path, "cannot read cache", e))
    }

    /// True when the leading format version matches ours.
    fn check_version(&self, bytes: &[u8]) -> Result<bool> {
        let version: u32 = bincode::deserialize(bytes).map_err(|e| {
            CorpusError::cache_with_source(&self.path, "cannot read cache header", e)
        })?;
        Ok(version == CACHE_FORMAT_VERSION)
    }

    fn decode(&self, bytes: &[u8]) -> Result<CacheEnvelope> {
        let envelope: CacheEnvelope = bincode::deserialize(bytes).map_err(|e| {
            CorpusError::cache_with_source(&self.path, "cannot deserialize cached corpus", e)
        })?;
        envelope.corpus.check_buffers().map_err(|e| {
            CorpusError::cache_with_source(&self.path, "cached corpus has inconsistent buffers", e)
        })?;
        Ok(envelope)
    }

    fn read_fresh(&self, fingerprint: Option<u64>) -> Result<Option<Corpus>> {
        let bytes = self.read_bytes()?;
        if !self.check_version(&bytes)? {
            return Ok(None);
        }

        let envelope = self.decode(&bytes)?;
        debug_assert_eq!(envelope.format_version, CACHE_FORMAT_VERSION);

        let fresh = match self.policy {
            InvalidationPolicy::Never => true,
            InvalidationPolicy::SourceFingerprint => envelope.fingerprint == fingerprint,
        };
        Ok(fresh.then_some(envelope.corpus))
    }
}
