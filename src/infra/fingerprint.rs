// ============================================================
// Layer 6 - Source Fingerprint
// ============================================================
// A single xxHash64 value that changes whenever anything that
// went into a Corpus changes:
//
//   - the bytes of train.txt, train.label, valid.txt, valid.label
//   - the bytes of the vocab file, if one is configured
//   - the corpus configuration (JSON encoded)
//
// The corpus cache stores this value next to the serialised
// corpus and rebuilds when the two disagree.

use std::{
    fs::File,
    hash::Hasher,
    io::{BufReader, Read},
    path::Path,
};

use twox_hash::XxHash64;

use crate::data::corpus::CorpusConfig;
use crate::data::loader::CorpusFiles;
use crate::domain::error::{CorpusError, Result};

const READ_CHUNK: usize = 64 * 1024;

/// Fingerprint of every input of `Corpus::build`.
pub fn source_fingerprint(files: &CorpusFiles, config: &CorpusConfig) -> Result<u64> {
    let mut sources = files.sources();
    if let Some(vocab_file) = &config.vocab.vocab_file {
        sources.push(vocab_file.clone());
    }

    let mut hasher = XxHash64::with_seed(0);
    for path in &sources {
        hasher.write_u64(file_checksum(path)?);
    }

    let config_bytes = serde_json::to_vec(config).map_err(|e| {
        CorpusError::cache_with_source(files.cache(), "cannot encode corpus config", e)
    })?;
    hasher.write(&config_bytes);

    Ok(hasher.finish())
}

/// xxHash64 of a file's contents, read in chunks.
pub fn file_checksum(path: &Path) -> Result<u64> {
    let file = File::open(path).map_err(|e| CorpusError::io(path, "cannot open file", e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = XxHash64::with_seed(0);
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| CorpusError::io(path, "read failed", e))?;
        if n == 0 {
            break;
        }
        hasher.write(&buf[..n]);
    }

    Ok(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::corpus::tests::write_corpus;
    use std::fs;

    #[test]
    fn test_fingerprint_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_corpus(dir.path());
        let files = CorpusFiles::new(dir.path());

        let a = source_fingerprint(&files, &config).unwrap();
        let b = source_fingerprint(&files, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_tracks_sources() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_corpus(dir.path());
        let files = CorpusFiles::new(dir.path());
        let before = source_fingerprint(&files, &config).unwrap();

        fs::write(dir.path().join("valid.label"), "1\n1\n0\n").unwrap();
        assert_ne!(before, source_fingerprint(&files, &config).unwrap());
    }

    #[test]
    fn test_fingerprint_tracks_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_corpus(dir.path());
        let files = CorpusFiles::new(dir.path());
        let before = source_fingerprint(&files, &config).unwrap();

        let lowered = CorpusConfig {
            vocab: crate::data::vocabulary::VocabConfig {
                lower_case: true,
                ..config.vocab.clone()
            },
            ..config
        };
        assert_ne!(before, source_fingerprint(&files, &lowered).unwrap());
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_corpus(dir.path());
        fs::remove_file(dir.path().join("train.txt")).unwrap();

        let err = source_fingerprint(&CorpusFiles::new(dir.path()), &config).unwrap_err();
        assert!(matches!(err, CorpusError::Io { .. }));
    }
}
