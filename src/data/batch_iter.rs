// ============================================================
// Layer 4 - Fixed Batch Iterator
// ============================================================
// Serves an encoded split as contiguous labelled mini-batches.
//
//   data    [N, L]   one padded sample per row
//   labels  [N]      one label per row
//
// Batch k starts at row k * B and holds
//
//   len = min(B, N - 1 - start)
//
// rows, so the last row of the split (row N - 1) is never part
// of a batch. Iteration stops once start >= N - 1.
//
// Example with N = 10, B = 3:
//   start 0 -> rows 0..3   len 3
//   start 3 -> rows 3..6   len 3
//   start 6 -> rows 6..9   len 3
//   (row 9 is not served; get_batch(9) returns len 0)

use crate::domain::buffer::{IdBuffer, Location};
use crate::domain::error::{CorpusError, Result};

/// One mini-batch: rows of samples, their labels, and the row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledBatch {
    /// `[len, L]` sample rows
    pub data: IdBuffer,
    /// `[len]` labels, index-aligned with `data`
    pub labels: IdBuffer,
    /// Number of rows in this batch
    pub len: usize,
}

#[derive(Debug, Clone)]
pub struct FixedBatchIterator {
    data: IdBuffer,
    labels: IdBuffer,
    batch_size: usize,
    n_batch: usize,
}

impl FixedBatchIterator {
    /// Validate shapes and move both buffers to `location`.
    ///
    /// Fails with `CorpusError::Shape` when the rows are not
    /// `align_len` wide or the label count differs from the row
    /// count, and with `CorpusError::Config` for a zero batch size.
    pub fn new(
        data: IdBuffer,
        labels: IdBuffer,
        batch_size: usize,
        align_len: usize,
        location: Location,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(CorpusError::config("batch size must be at least 1"));
        }
        if data.rank() != 2 {
            return Err(CorpusError::shape("sample matrix rank", 2, data.rank()));
        }
        if data.row_len() != align_len {
            return Err(CorpusError::shape("sample row length", align_len, data.row_len()));
        }
        if labels.rank() != 1 {
            return Err(CorpusError::shape("label vector rank", 1, labels.rank()));
        }
        if data.rows() != labels.rows() {
            return Err(CorpusError::shape("label count", data.rows(), labels.rows()));
        }

        let num_example = data.rows();
        let n_batch = num_example.div_ceil(batch_size);
        tracing::debug!(
            "Fixed batch iterator: data {:?}, batch_size={}, location={}",
            data.dims(),
            batch_size,
            location,
        );

        Ok(Self {
            data: data.to(location),
            labels: labels.to(location),
            batch_size,
            n_batch,
        })
    }

    pub fn num_examples(&self) -> usize {
        self.data.rows()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// `ceil(N / B)`, the nominal number of mini-batches.
    pub fn n_batch(&self) -> usize {
        self.n_batch
    }

    pub fn location(&self) -> Location {
        self.data.location()
    }

    /// Slice the batch starting at row `start`. `batch_size`
    /// overrides the configured size for this one call.
    pub fn get_batch(&self, start: usize, batch_size: Option<usize>) -> LabeledBatch {
        let bsz = batch_size.unwrap_or(self.batch_size);
        let remaining = self.num_examples().saturating_sub(1).saturating_sub(start);
        let len = bsz.min(remaining);

        LabeledBatch {
            data: self.data.narrow(start, len),
            labels: self.labels.narrow(start, len),
            len,
        }
    }

    /// Batches from row 0.
    pub fn iter(&self) -> FixedBatches<'_> {
        self.iter_from(0)
    }

    /// Batches from row `start`.
    pub fn iter_from(&self, start: usize) -> FixedBatches<'_> {
        FixedBatches { source: self, next: start }
    }
}

impl<'a> IntoIterator for &'a FixedBatchIterator {
    type Item = LabeledBatch;
    type IntoIter = FixedBatches<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy pass over a FixedBatchIterator.
pub struct FixedBatches<'a> {
    source: &'a FixedBatchIterator,
    next: usize,
}

impl Iterator for FixedBatches<'_> {
    type Item = LabeledBatch;

    fn next(&mut self) -> Option<LabeledBatch> {
        if self.next >= self.source.num_examples().saturating_sub(1) {
            return None;
        }
        let batch = self.source.get_batch(self.next, None);
        self.next = self.next.saturating_add(self.source.batch_size);
        Some(batch)
    }
}
