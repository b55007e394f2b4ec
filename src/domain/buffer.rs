// ============================================================
// Layer 3 - Id Buffers
// ============================================================
// A small row-major buffer of token ids with an explicit
// location attribute. Every encoded split, label vector,
// batch and stream window in the crate is an IdBuffer.
//
// Layout:
//   rank 1  dims = [n]          one label per sample
//   rank 2  dims = [rows, cols] one padded sample per row
//
// Row slicing (narrow) copies the contiguous row range, so a
// batch owns its data and never borrows from the corpus.
//
// The location travels with the buffer. Only the burn batcher
// (data/batcher.rs) turns it into a real backend device.

use serde::{Deserialize, Serialize};

use crate::domain::error::{CorpusError, Result};

/// Where a buffer is meant to live when it reaches the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// CPU memory (burn NdArray backend)
    #[default]
    Host,
    /// GPU memory (burn Wgpu backend)
    Accelerator,
}

impl std::str::FromStr for Location {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "host" | "cpu" => Ok(Self::Host),
            "accelerator" | "gpu" => Ok(Self::Accelerator),
            other => Err(CorpusError::config(format!(
                "unknown location '{other}' (expected 'host' or 'accelerator')"
            ))),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Accelerator => write!(f, "accelerator"),
        }
    }
}

/// Row-major i32 buffer of rank 1 or 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdBuffer {
    data: Vec<i32>,
    dims: Vec<usize>,
    location: Location,
}

impl IdBuffer {
    /// Rank-1 buffer of `data.len()` elements on the host.
    pub fn vector(data: Vec<i32>) -> Self {
        let dims = vec![data.len()];
        Self { data, dims, location: Location::Host }
    }

    /// Rank-2 buffer; `data.len()` must equal `rows * cols`.
    pub fn matrix(data: Vec<i32>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(CorpusError::shape(
                "matrix element count",
                rows * cols,
                data.len(),
            ));
        }
        Ok(Self { data, dims: vec![rows, cols], location: Location::Host })
    }

    /// Stack equal-length rows into a `[rows.len(), width]` matrix.
    pub fn from_rows(rows: Vec<Vec<i32>>, width: usize) -> Result<Self> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * width);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(CorpusError::shape(format!("row {i} length"), width, row.len()));
            }
            data.extend(row);
        }
        Ok(Self { data, dims: vec![n, width], location: Location::Host })
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Rank is 1 or 2 and the dims account for every element.
    /// Buffers built here always pass; deserialized ones may not.
    pub fn check_dims(&self) -> Result<()> {
        if !(1..=2).contains(&self.rank()) {
            return Err(CorpusError::shape("buffer rank", "1 or 2", self.rank()));
        }
        let expected = self
            .dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| CorpusError::shape("buffer element count", "a usize", "overflow"))?;
        if expected != self.data.len() {
            return Err(CorpusError::shape("buffer element count", expected, self.data.len()));
        }
        Ok(())
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Size of the first dimension.
    pub fn rows(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    /// Number of elements per row (1 for a vector).
    pub fn row_len(&self) -> usize {
        self.dims.iter().skip(1).product()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn location(&self) -> Location {
        self.location
    }

    /// Retag the buffer for another location.
    pub fn to(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<i32> {
        self.data
    }

    /// Row `i` of the buffer (a single element for vectors).
    pub fn row(&self, i: usize) -> Option<&[i32]> {
        let width = self.row_len();
        if i >= self.rows() {
            return None;
        }
        Some(&self.data[i * width..(i + 1) * width])
    }

    /// Copy rows `[start, start + len)`, clamped to the buffer.
    pub fn narrow(&self, start: usize, len: usize) -> Self {
        let rows = self.rows();
        let begin = start.min(rows);
        let end = start.saturating_add(len).min(rows);
        let width = self.row_len();

        let mut dims = self.dims.clone();
        if let Some(first) = dims.first_mut() {
            *first = end - begin;
        }

        Self {
            data: self.data[begin * width..end * width].to_vec(),
            dims,
            location: self.location,
        }
    }

    /// View a rank-1 buffer as `[rows, cols]`.
    pub fn reshape(self, rows: usize, cols: usize) -> Result<Self> {
        if self.data.len() != rows * cols {
            return Err(CorpusError::shape(
                "reshape element count",
                rows * cols,
                self.data.len(),
            ));
        }
        Ok(Self { dims: vec![rows, cols], ..self })
    }

    /// Swap the two axes of a rank-2 buffer.
    pub fn transpose(&self) -> Result<Self> {
        if self.rank() != 2 {
            return Err(CorpusError::shape("transpose rank", 2, self.rank()));
        }
        let (rows, cols) = (self.dims[0], self.dims[1]);
        let mut data = Vec::with_capacity(self.data.len());
        for c in 0..cols {
            for r in 0..rows {
                data.push(self.data[r * cols + c]);
            }
        }
        Ok(Self { data, dims: vec![cols, rows], location: self.location })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IdBuffer {
        IdBuffer::matrix((0..12).collect(), 4, 3).unwrap()
    }

    #[test]
    fn test_matrix_rejects_wrong_count() {
        let err = IdBuffer::matrix(vec![1, 2, 3], 2, 2).unwrap_err();
        assert!(matches!(err, CorpusError::Shape { .. }));
    }

    #[test]
    fn test_from_rows_checks_width() {
        assert!(IdBuffer::from_rows(vec![vec![1, 2], vec![3]], 2).is_err());
        let m = IdBuffer::from_rows(vec![vec![1, 2], vec![3, 4]], 2).unwrap();
        assert_eq!(m.dims(), &[2, 2]);
        assert_eq!(m.row(1), Some(&[3, 4][..]));
    }

    #[test]
    fn test_narrow_copies_rows() {
        let m = sample();
        let n = m.narrow(1, 2);
        assert_eq!(n.dims(), &[2, 3]);
        assert_eq!(n.as_slice(), &[3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_narrow_clamps_past_end() {
        let m = sample();
        assert_eq!(m.narrow(3, 10).dims(), &[1, 3]);
        let empty = m.narrow(9, 2);
        assert_eq!(empty.dims(), &[0, 3]);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_narrow_vector() {
        let v = IdBuffer::vector(vec![5, 6, 7, 8]);
        let n = v.narrow(2, 5);
        assert_eq!(n.dims(), &[2]);
        assert_eq!(n.as_slice(), &[7, 8]);
    }

    #[test]
    fn test_transpose() {
        let t = sample().transpose().unwrap();
        assert_eq!(t.dims(), &[3, 4]);
        assert_eq!(t.row(0), Some(&[0, 3, 6, 9][..]));
        assert_eq!(t.row(2), Some(&[2, 5, 8, 11][..]));
    }

    #[test]
    fn test_transpose_needs_rank_two() {
        assert!(IdBuffer::vector(vec![1, 2]).transpose().is_err());
    }

    #[test]
    fn test_location_is_inherited_by_slices() {
        let m = sample().to(Location::Accelerator);
        assert_eq!(m.narrow(0, 1).location(), Location::Accelerator);
        assert_eq!(m.transpose().unwrap().location(), Location::Accelerator);
    }

    #[test]
    fn test_check_dims() {
        assert!(sample().check_dims().is_ok());
        assert!(sample().narrow(9, 1).check_dims().is_ok());

        let mut bad = sample();
        bad.dims = vec![4, 4];
        assert!(matches!(bad.check_dims(), Err(CorpusError::Shape { .. })));
        bad.dims = vec![];
        assert!(bad.check_dims().is_err());
    }

    #[test]
    fn test_location_parsing() {
        assert_eq!("gpu".parse::<Location>().unwrap(), Location::Accelerator);
        assert_eq!("Host".parse::<Location>().unwrap(), Location::Host);
        assert!("tpu".parse::<Location>().unwrap_err().is_config());
    }
}
