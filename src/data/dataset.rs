use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

use crate::domain::buffer::IdBuffer;
use crate::domain::error::{CorpusError, Result};

/// One encoded sample and its class label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSample {
    pub tokens: Vec<i32>,
    pub label: i32,
}

impl LabeledSample {
    /// Number of non-padding ids, given the padding id.
    pub fn content_len(&self, pad_idx: i32) -> usize {
        self.tokens.iter().filter(|&&id| id != pad_idx).count()
    }
}

/// A whole split exposed through burn's Dataset trait, so it can
/// feed a burn DataLoader. Unlike FixedBatchIterator it serves
/// every row, the last one included.
pub struct SplitDataset {
    data: IdBuffer,
    labels: IdBuffer,
}

impl SplitDataset {
    pub fn new(data: IdBuffer, labels: IdBuffer) -> Result<Self> {
        if data.rows() != labels.rows() {
            return Err(CorpusError::shape("dataset label count", data.rows(), labels.rows()));
        }
        Ok(Self { data, labels })
    }

    pub fn sample_count(&self) -> usize {
        self.data.rows()
    }
}

impl Dataset<LabeledSample> for SplitDataset {
    fn get(&self, index: usize) -> Option<LabeledSample> {
        let tokens = self.data.row(index)?.to_vec();
        let label = *self.labels.as_slice().get(index)?;
        Some(LabeledSample { tokens, label })
    }

    fn len(&self) -> usize {
        self.data.rows()
    }
}
