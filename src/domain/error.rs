// ============================================================
// Layer 3 - Corpus Errors
// ============================================================
// Typed failures raised by the data and infrastructure layers.
//
//   Shape        - a buffer does not have the dims an iterator expects
//   UnknownSplit - a split name other than "train" / "valid"
//   Config       - any other invalid setting (batch size 0, bad std, ...)
//   Io           - a file could not be opened or read
//   Malformed    - a file was readable but a line could not be encoded
//   Cache        - the on-disk corpus artifact could not be (de)serialised
//   Tokenizer    - the tokenizer pipeline rejected its setup or input
//
// Nothing here is retried. The application layer wraps these in
// anyhow::Error with context and the process exits with a diagnostic.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("shape mismatch in {context}: expected {expected}, found {found}")]
    Shape {
        context: String,
        expected: String,
        found: String,
    },

    #[error("configuration error: unsupported split '{name}' (expected 'train' or 'valid')")]
    UnknownSplit { name: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("I/O error at '{}': {message}", .path.display())]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed input at {}:{line}: {message}", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("cache error at '{}': {message}", .path.display())]
    Cache {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("tokenizer error: {message}")]
    Tokenizer {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type Result<T> = std::result::Result<T, CorpusError>;

impl CorpusError {
    pub fn shape(
        context: impl Into<String>,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Self::Shape {
            context: context.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn cache(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Cache {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn cache_with_source(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Cache {
            path: path.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// True for caller misconfiguration (bad split name, bad settings).
    /// Wrap an error from the tokenizer pipeline.
    pub fn tokenizer(
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Tokenizer {
            message: message.into(),
            source,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Self::UnknownSplit { .. } | Self::Config { .. })
    }
}
