// ============================================================
// Layer 3 - Data Splits
// ============================================================
// A corpus has exactly two named partitions. Each one is a
// pair of files in the data directory:
//
//   train  ->  train.txt  + train.label
//   valid  ->  valid.txt  + valid.label
//
// Parsing any other name fails with a configuration error.

use serde::{Deserialize, Serialize};

use crate::domain::error::CorpusError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Valid,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Valid];

    pub fn name(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Valid => "valid",
        }
    }

    /// File holding one text sample per line.
    pub fn text_file(self) -> String {
        format!("{}.txt", self.name())
    }

    /// File holding one integer label per line.
    pub fn label_file(self) -> String {
        format!("{}.label", self.name())
    }
}

impl std::str::FromStr for Split {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "train" => Ok(Self::Train),
            "valid" => Ok(Self::Valid),
            other => Err(CorpusError::UnknownSplit { name: other.to_string() }),
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
