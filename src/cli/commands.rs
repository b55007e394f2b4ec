// ============================================================
// Layer 1 - CLI Commands and Arguments
// ============================================================
// Defines the three subcommands and their flags:
//
//   prepare  - load or build the cached corpus
//   batches  - walk a split in fixed-size labelled batches
//   stream   - walk a split as ordered (optionally varlen) windows
//
// Every command shares the corpus flags in CorpusArgs.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::application::inspect_use_case::{BatchesConfig, StreamConfig};
use crate::application::prepare_use_case::PrepareConfig;
use crate::data::corpus::CorpusConfig;
use crate::data::stream_iter::VarlenConfig;
use crate::data::vocabulary::VocabConfig;
use crate::domain::buffer::Location;
use crate::infra::corpus_cache::InvalidationPolicy;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build (or load from cache) the encoded corpus
    Prepare(PrepareArgs),

    /// Iterate a split in fixed-size labelled batches
    Batches(BatchesArgs),

    /// Iterate a split as ordered windows
    Stream(StreamArgs),
}

/// Flags describing which corpus to build and how.
#[derive(Args, Debug, Clone)]
pub struct CorpusArgs {
    /// Directory holding train.txt, train.label, valid.txt, valid.label
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Vocabulary file, one symbol per line. Counted from
    /// train.txt when omitted.
    #[arg(long)]
    pub vocab_file: Option<PathBuf>,

    /// Every sample is padded or truncated to this many ids
    #[arg(long, default_value_t = crate::data::corpus::DEFAULT_ALIGN_LEN)]
    pub align_len: usize,

    /// Lower-case text before encoding
    #[arg(long)]
    pub lower_case: bool,

    /// Special tokens, comma separated (default: <pad>,<s>,<unk>,</s>)
    #[arg(long, value_delimiter = ',')]
    pub special: Vec<String>,

    /// JSON file with a full prepare config. Replaces the flags
    /// above except --data-dir and --no-fingerprint.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Reuse any existing cache.pt even if the sources changed
    #[arg(long)]
    pub no_fingerprint: bool,
}

impl From<CorpusArgs> for PrepareConfig {
    fn from(a: CorpusArgs) -> Self {
        let mut vocab = VocabConfig {
            lower_case: a.lower_case,
            vocab_file: a.vocab_file,
            ..VocabConfig::default()
        };
        if !a.special.is_empty() {
            vocab.special_tokens = a.special;
        }

        PrepareConfig {
            data_dir: a.data_dir,
            corpus: CorpusConfig { vocab, align_len: a.align_len },
            policy: policy(a.no_fingerprint),
        }
    }
}

fn policy(no_fingerprint: bool) -> InvalidationPolicy {
    if no_fingerprint {
        InvalidationPolicy::Never
    } else {
        InvalidationPolicy::SourceFingerprint
    }
}

impl CorpusArgs {
    /// Resolve the prepare config, reading --config when given.
    pub fn resolve(self) -> Result<PrepareConfig> {
        match &self.config {
            Some(path) => {
                let mut config = PrepareConfig::from_json_file(path)?;
                config.data_dir = self.data_dir;
                if self.no_fingerprint {
                    config.policy = InvalidationPolicy::Never;
                }
                Ok(config)
            }
            None => Ok(self.into()),
        }
    }
}

#[derive(Args, Debug)]
pub struct PrepareArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,
}

#[derive(Args, Debug)]
pub struct BatchesArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// "train" or "valid"
    #[arg(long, default_value = "train")]
    pub split: String,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// host or accelerator
    #[arg(long, default_value_t = Location::Host)]
    pub device: Location,

    /// Stop after this many batches
    #[arg(long)]
    pub limit: Option<usize>,
}

impl BatchesArgs {
    pub fn into_config(self) -> Result<BatchesConfig> {
        Ok(BatchesConfig {
            prepare: self.corpus.resolve()?,
            split: self.split,
            batch_size: self.batch_size,
            location: self.device,
            limit: self.limit,
        })
    }
}

#[derive(Args, Debug)]
pub struct StreamArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// "train" or "valid"
    #[arg(long, default_value = "train")]
    pub split: String,

    /// Steps per window
    #[arg(long, default_value_t = 70)]
    pub bptt: usize,

    /// Extra context steps prepended to every window
    #[arg(long)]
    pub ext_len: Option<usize>,

    /// Draw a random span for every window
    #[arg(long)]
    pub varlen: bool,

    /// RNG seed for --varlen
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Standard deviation of the drawn span
    #[arg(long, default_value_t = 5.0)]
    pub std: f64,

    #[arg(long, default_value_t = 5)]
    pub min_len: usize,

    /// Spans never exceed bptt + max_deviation * std
    #[arg(long, default_value_t = 3)]
    pub max_deviation: usize,

    /// host or accelerator
    #[arg(long, default_value_t = Location::Host)]
    pub device: Location,
}

impl StreamArgs {
    pub fn into_config(self) -> Result<StreamConfig> {
        let varlen = self.varlen.then_some(VarlenConfig {
            std: self.std,
            min_len: self.min_len,
            max_deviation: self.max_deviation,
        });

        Ok(StreamConfig {
            prepare: self.corpus.resolve()?,
            split: self.split,
            bptt: self.bptt,
            ext_len: self.ext_len,
            varlen,
            seed: self.seed,
            location: self.device,
        })
    }
}
