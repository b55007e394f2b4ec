// ============================================================
// Layer 4 - Tensor Batcher
// ============================================================
// Turns host-side id buffers into burn tensors on a device.
//
// This is the only place where a buffer's Location becomes a
// real backend device:
//
//   Location::Host         -> burn NdArray  (CPU)
//   Location::Accelerator  -> burn Wgpu     (GPU)
//
// The caller picks the backend B and hands in its device; the
// batcher itself is generic over B.
//
// Shapes:
//   LabeledBatch [len, L] + [len]   -> ClassifyBatch
//   StreamWindow [rows, width]      -> Tensor<B, 2, Int>
//   Vec<LabeledSample> (DataLoader) -> ClassifyBatch
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::batch_iter::LabeledBatch;
use crate::data::dataset::LabeledSample;
use crate::data::stream_iter::StreamWindow;
use crate::domain::buffer::IdBuffer;

// ─── ClassifyBatch ────────────────────────────────────────────────────────────
/// A batch of classification samples ready for a forward pass.
#[derive(Debug, Clone)]
pub struct ClassifyBatch<B: Backend> {
    /// Token ids, shape [batch_size, align_len]
    pub tokens: Tensor<B, 2, Int>,

    /// Class labels, shape [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

// ─── ClassifyBatcher ──────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ClassifyBatcher<B: Backend> {
    /// Device the tensors are created on
    pub device: B::Device,
}

impl<B: Backend> ClassifyBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    fn matrix(&self, buffer: &IdBuffer) -> Tensor<B, 2, Int> {
        Tensor::<B, 1, Int>::from_ints(buffer.as_slice(), &self.device)
            .reshape([buffer.rows(), buffer.row_len()])
    }

    /// Upload a batch produced by FixedBatchIterator.
    pub fn from_labeled(&self, batch: &LabeledBatch) -> ClassifyBatch<B> {
        ClassifyBatch {
            tokens: self.matrix(&batch.data),
            labels: Tensor::<B, 1, Int>::from_ints(batch.labels.as_slice(), &self.device),
        }
    }

    /// Upload a window produced by OrderedStreamIterator.
    pub fn from_window(&self, window: &StreamWindow) -> Tensor<B, 2, Int> {
        self.matrix(&window.data)
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
// Lets a SplitDataset drive a burn DataLoader.
impl<B: Backend> Batcher<LabeledSample, ClassifyBatch<B>> for ClassifyBatcher<B> {
    fn batch(&self, items: Vec<LabeledSample>) -> ClassifyBatch<B> {
        let batch_size = items.len();
        let seq_len = items.first().map(|s| s.tokens.len()).unwrap_or(0);

        let tokens_flat: Vec<i32> = items
            .iter()
            .flat_map(|s| s.tokens.iter().copied())
            .collect();
        let labels: Vec<i32> = items.iter().map(|s| s.label).collect();

        let tokens = Tensor::<B, 1, Int>::from_ints(tokens_flat.as_slice(), &self.device)
            .reshape([batch_size, seq_len]);
        let labels = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        ClassifyBatch { tokens, labels }
    }
}
