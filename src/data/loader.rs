// ============================================================
// Layer 4 - Corpus File Loader
// ============================================================
// Knows where a corpus lives on disk and reads its files.
//
// Expected data directory layout:
//
//   <data_dir>/
//     train.txt     one sample per line
//     train.label   one integer label per line
//     valid.txt
//     valid.label
//     cache.pt      written by infra::corpus_cache
//
// Lines are returned in file order. A trailing newline does
// not produce an extra empty line.

use std::{
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::domain::error::{CorpusError, Result};
use crate::domain::split::Split;

/// File name of the serialised corpus inside the data directory.
pub const CACHE_FILE: &str = "cache.pt";

/// Paths of every file that makes up one corpus.
#[derive(Debug, Clone)]
pub struct CorpusFiles {
    data_dir: PathBuf,
}

impl CorpusFiles {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn text(&self, split: Split) -> PathBuf {
        self.data_dir.join(split.text_file())
    }

    pub fn labels(&self, split: Split) -> PathBuf {
        self.data_dir.join(split.label_file())
    }

    pub fn cache(&self) -> PathBuf {
        self.data_dir.join(CACHE_FILE)
    }

    /// The four source files in a fixed order: train text, train
    /// labels, valid text, valid labels.
    pub fn sources(&self) -> Vec<PathBuf> {
        Split::ALL
            .iter()
            .flat_map(|&s| [self.text(s), self.labels(s)])
            .collect()
    }
}

/// Read every line of a UTF-8 text file.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = fs::File::open(path)
        .map_err(|e| CorpusError::io(path, "cannot open file", e))?;

    let mut lines = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                CorpusError::malformed(path, idx + 1, "line is not valid UTF-8")
            } else {
                CorpusError::io(path, format!("read failed at line {}", idx + 1), e)
            }
        })?;
        lines.push(line);
    }

    tracing::debug!("Read {} lines from '{}'", lines.len(), path.display());
    Ok(lines)
}
