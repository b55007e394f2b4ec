// ============================================================
// Layer 2 - Inspect Use Cases
// ============================================================
// Walk a prepared corpus the way a training loop would and report
// what was produced:
//
//   BatchesUseCase  → FixedBatchIterator over a split
//   StreamUseCase   → OrderedStreamIterator (fixed or varlen)
//
// The first batch / window is uploaded through ClassifyBatcher on
// the backend matching the requested Location:
//
//   Location::Host         → burn NdArray
//   Location::Accelerator  → burn Wgpu
//
// Reference: Burn Book §4 (Batcher)

use anyhow::{Context, Result};
use burn::{
    backend::{NdArray, Wgpu},
    prelude::Backend,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::application::prepare_use_case::{PrepareConfig, PrepareUseCase};
use crate::data::batch_iter::LabeledBatch;
use crate::data::batcher::ClassifyBatcher;
use crate::data::stream_iter::{StreamWindow, VarlenConfig};
use crate::domain::buffer::Location;
use crate::domain::split::Split;

// ─── Backend Dispatch ─────────────────────────────────────────────────────────
fn labeled_dims<B: Backend>(batch: &LabeledBatch) -> Vec<usize> {
    let batcher = ClassifyBatcher::<B>::new(Default::default());
    let tensors = batcher.from_labeled(batch);
    let [rows, cols] = tensors.tokens.dims();
    let [labels] = tensors.labels.dims();
    tracing::info!("First batch on device: tokens=[{rows}, {cols}], labels=[{labels}]");
    vec![rows, cols]
}

fn window_dims<B: Backend>(window: &StreamWindow) -> Vec<usize> {
    let batcher = ClassifyBatcher::<B>::new(Default::default());
    let [rows, cols] = batcher.from_window(window).dims();
    tracing::info!("First window on device: [{rows}, {cols}]");
    vec![rows, cols]
}

fn upload_labeled(batch: &LabeledBatch, location: Location) -> Vec<usize> {
    match location {
        Location::Host => labeled_dims::<NdArray>(batch),
        Location::Accelerator => labeled_dims::<Wgpu>(batch),
    }
}

fn upload_window(window: &StreamWindow, location: Location) -> Vec<usize> {
    match location {
        Location::Host => window_dims::<NdArray>(window),
        Location::Accelerator => window_dims::<Wgpu>(window),
    }
}

// ─── BatchesUseCase ───────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct BatchesConfig {
    pub prepare: PrepareConfig,
    pub split: String,
    pub batch_size: usize,
    pub location: Location,
    /// Stop after this many batches
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub split: String,
    pub location: String,
    pub num_examples: usize,
    pub batch_size: usize,
    pub n_batch: usize,
    pub batches: usize,
    pub rows_covered: usize,
    /// Token tensor dims of the first batch, once uploaded
    pub first_batch_dims: Option<Vec<usize>>,
}

pub struct BatchesUseCase {
    config: BatchesConfig,
}

impl BatchesUseCase {
    pub fn new(config: BatchesConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<BatchReport> {
        let cfg = &self.config;
        let corpus = PrepareUseCase::new(cfg.prepare.clone()).load_corpus()?;
        let iter = corpus
            .get_split_iterator(&cfg.split, cfg.batch_size, cfg.location)
            .with_context(|| format!("Cannot iterate split '{}'", cfg.split))?;

        let limit = cfg.limit.unwrap_or(usize::MAX);
        let mut batches = 0;
        let mut rows_covered = 0;
        let mut first_batch_dims = None;

        for batch in iter.iter().take(limit) {
            if first_batch_dims.is_none() {
                first_batch_dims = Some(upload_labeled(&batch, cfg.location));
            }
            batches += 1;
            rows_covered += batch.len;
        }

        tracing::info!(
            "Split '{}': {} batches covering {}/{} rows",
            cfg.split,
            batches,
            rows_covered,
            iter.num_examples()
        );

        Ok(BatchReport {
            split: cfg.split.clone(),
            location: cfg.location.to_string(),
            num_examples: iter.num_examples(),
            batch_size: iter.batch_size(),
            n_batch: iter.n_batch(),
            batches,
            rows_covered,
            first_batch_dims,
        })
    }
}

// ─── StreamUseCase ────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub prepare: PrepareConfig,
    pub split: String,
    pub bptt: usize,
    pub ext_len: Option<usize>,
    /// Random span lengths when set, fixed `bptt` windows otherwise
    pub varlen: Option<VarlenConfig>,
    pub seed: u64,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamReport {
    pub split: String,
    pub stream_len: usize,
    pub batch_width: usize,
    pub n_batch: usize,
    pub windows: usize,
    /// seq_len of every yielded window
    pub spans: Vec<usize>,
    pub steps_covered: usize,
    pub first_window_dims: Option<Vec<usize>>,
}

pub struct StreamUseCase {
    config: StreamConfig,
}

impl StreamUseCase {
    pub fn new(config: StreamConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<StreamReport> {
        let cfg = &self.config;
        let split: Split = cfg.split.parse()?;
        let corpus = PrepareUseCase::new(cfg.prepare.clone()).load_corpus()?;
        let iter = corpus
            .stream_iterator(split, cfg.bptt, cfg.ext_len, cfg.location)
            .with_context(|| format!("Cannot stream split '{}'", cfg.split))?;

        let windows: Vec<StreamWindow> = match cfg.varlen {
            Some(varlen) => {
                let rng = StdRng::seed_from_u64(cfg.seed);
                iter.iter_varlen(0, varlen, rng)?.collect()
            }
            None => iter.iter_fixed(0).collect(),
        };

        let first_window_dims = windows
            .first()
            .filter(|w| !w.data.is_empty())
            .map(|w| upload_window(w, cfg.location));
        let spans: Vec<usize> = windows.iter().map(|w| w.seq_len).collect();
        let steps_covered = spans.iter().sum();

        tracing::info!(
            "Stream '{}': {} windows covering {}/{} steps",
            cfg.split,
            windows.len(),
            steps_covered,
            iter.stream_len()
        );

        Ok(StreamReport {
            split: cfg.split.clone(),
            stream_len: iter.stream_len(),
            batch_width: iter.batch_width(),
            n_batch: iter.n_batch(),
            windows: windows.len(),
            spans,
            steps_covered,
            first_window_dims,
        })
    }
}
