// ============================================================
// Layer 4 - Corpus
// ============================================================
// Owns a built vocabulary plus the four encoded buffers of a
// classification corpus:
//
//   train         [N_train, L]     train_labels  [N_train]
//   valid         [N_valid, L]     valid_labels  [N_valid]
//
// Build order:
//   1. Count train.txt        (only without a vocab file)
//   2. build_vocab()
//   3. Encode train.txt / train.label
//   4. Encode valid.txt / valid.label
//
// Once built (or loaded from cache) a Corpus is never mutated.
// Iterators receive their own copy of a split's buffers.

use serde::{Deserialize, Serialize};

use crate::data::batch_iter::FixedBatchIterator;
use crate::data::dataset::SplitDataset;
use crate::data::loader::CorpusFiles;
use crate::data::stream_iter::OrderedStreamIterator;
use crate::data::vocabulary::{VocabConfig, Vocabulary};
use crate::domain::buffer::{IdBuffer, Location};
use crate::domain::error::{CorpusError, Result};
use crate::domain::split::Split;
use crate::domain::traits::CorpusEncoder;

/// Fixed length every encoded sample is padded or truncated to.
pub const DEFAULT_ALIGN_LEN: usize = 3000;

// ─── Corpus Configuration ────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    pub vocab: VocabConfig,
    pub align_len: usize,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self { vocab: VocabConfig::default(), align_len: DEFAULT_ALIGN_LEN }
    }
}

/// Counts reported after building or loading a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSummary {
    pub vocab_size: usize,
    pub align_len: usize,
    pub train_samples: usize,
    pub valid_samples: usize,
}

// ─── Corpus ───────────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corpus {
    vocab: Vocabulary,
    align_len: usize,
    train: IdBuffer,
    train_labels: IdBuffer,
    valid: IdBuffer,
    valid_labels: IdBuffer,
}

impl Corpus {
    /// Build the vocabulary and encode all four source files.
    /// Any read or encoding failure is returned unchanged.
    pub fn build(files: &CorpusFiles, config: &CorpusConfig) -> Result<Self> {
        if config.align_len == 0 {
            return Err(CorpusError::config("align_len must be at least 1"));
        }
        tracing::info!("Producing dataset from '{}'", files.data_dir().display());

        let mut vocab = Vocabulary::new(config.vocab.clone(), config.align_len);
        if config.vocab.vocab_file.is_none() {
            vocab.count_file(&files.text(Split::Train), true)?;
        }

        let [train, train_labels, valid, valid_labels] = encode_splits(&mut vocab, files)?;

        let corpus = Self {
            vocab,
            align_len: config.align_len,
            train,
            train_labels,
            valid,
            valid_labels,
        };
        tracing::info!(
            "Corpus ready: vocab={}, train={}, valid={}",
            corpus.vocab.len(),
            corpus.train.rows(),
            corpus.valid.rows(),
        );
        Ok(corpus)
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn align_len(&self) -> usize {
        self.align_len
    }

    /// Sample matrix and label vector of a split.
    pub fn split(&self, split: Split) -> (&IdBuffer, &IdBuffer) {
        match split {
            Split::Train => (&self.train, &self.train_labels),
            Split::Valid => (&self.valid, &self.valid_labels),
        }
    }

    /// Batch iterator over a split given by name. Names other than
    /// "train" and "valid" are a configuration error.
    pub fn get_split_iterator(
        &self,
        split_name: &str,
        batch_size: usize,
        location: Location,
    ) -> Result<FixedBatchIterator> {
        let split: Split = split_name.parse()?;
        self.split_iterator(split, batch_size, location)
    }

    pub fn split_iterator(
        &self,
        split: Split,
        batch_size: usize,
        location: Location,
    ) -> Result<FixedBatchIterator> {
        let (data, labels) = self.split(split);
        FixedBatchIterator::new(
            data.clone(),
            labels.clone(),
            batch_size,
            self.align_len,
            location,
        )
    }

    /// Ordered-stream view of a split: every sample becomes one
    /// column and the alignment length is the stream length.
    pub fn stream_iterator(
        &self,
        split: Split,
        bptt: usize,
        ext_len: Option<usize>,
        location: Location,
    ) -> Result<OrderedStreamIterator> {
        let (data, _) = self.split(split);
        OrderedStreamIterator::new(
            data.clone(),
            data.rows(),
            bptt,
            self.align_len,
            ext_len,
            location,
        )
    }

    /// A split as a burn Dataset.
    pub fn dataset(&self, split: Split) -> Result<SplitDataset> {
        let (data, labels) = self.split(split);
        SplitDataset::new(data.clone(), labels.clone())
    }

    /// Every buffer has consistent dims, sample rows are
    /// `align_len` wide and labels are vectors. Used on corpora
    /// that come back from disk.
    pub fn check_buffers(&self) -> Result<()> {
        for split in Split::ALL {
            let (data, labels) = self.split(split);
            data.check_dims()?;
            labels.check_dims()?;
            if data.rank() != 2 || data.row_len() != self.align_len {
                return Err(CorpusError::shape(
                    format!("{split} sample matrix"),
                    format!("[_, {}]", self.align_len),
                    format!("{:?}", data.dims()),
                ));
            }
            if labels.rank() != 1 {
                return Err(CorpusError::shape(format!("{split} labels rank"), 1, labels.rank()));
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> CorpusSummary {
        CorpusSummary {
            vocab_size: self.vocab.len(),
            align_len: self.align_len,
            train_samples: self.train.rows(),
            valid_samples: self.valid.rows(),
        }
    }
}

/// Build the encoder's vocabulary, then encode both splits.
/// Returns [train, train_labels, valid, valid_labels].
fn encode_splits<E: CorpusEncoder>(encoder: &mut E, files: &CorpusFiles) -> Result<[IdBuffer; 4]> {
    encoder.build_vocab()?;

    let train = encoder.encode_file(&files.text(Split::Train), true)?;
    let train_labels = encoder.encode_labels(&files.labels(Split::Train), true)?;
    let valid = encoder.encode_file(&files.text(Split::Valid), true)?;
    let valid_labels = encoder.encode_labels(&files.labels(Split::Valid), true)?;

    Ok([train, train_labels, valid, valid_labels])
}
