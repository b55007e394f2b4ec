// ============================================================
// Layer 4 - Vocabulary
// ============================================================
// Maps whitespace-separated symbols to integer ids and encodes
// corpus files through that table.
//
// Id layout after build_vocab():
//
//   0 .. k-1   special tokens, in configured order
//              (default: <pad> <s> <unk> </s>)
//   k ..       symbols from the vocab file, in file order,
//              or counted symbols by descending frequency
//
// Symbols already present (e.g. a special token repeated in
// the vocab file) keep their first id.
//
// Encoding goes through a HuggingFace `tokenizers` Tokenizer
// assembled from that table:
//
//   model          WordLevel (this id layout, unk = <unk>)
//   normalizer     see data/preprocessor.rs
//   pre_tokenizer  WhitespaceSplit
//   truncation     max_length = align_len
//   padding        Fixed(align_len) with the <pad> id
//
// so every encoded line becomes exactly `align_len` ids:
//
//   "the cat sat"  ->  [12, 7, 93, 0, 0, ..., 0]   (0 = <pad>)

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tokenizers::{
    models::wordlevel::WordLevel, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams,
};

use crate::data::loader::read_lines;
use crate::data::preprocessor::LineNormalizer;
use crate::domain::buffer::IdBuffer;
use crate::domain::error::{CorpusError, Result};
use crate::domain::traits::CorpusEncoder;

pub const PAD_TOKEN: &str = "<pad>";
pub const START_TOKEN: &str = "<s>";
pub const UNK_TOKEN: &str = "<unk>";
pub const END_TOKEN: &str = "</s>";

/// Progress is logged every this many lines when encoding verbosely.
const LOG_EVERY: usize = 500_000;

// ─── Vocabulary Configuration ────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabConfig {
    /// Reserved tokens, added first. Must contain <pad> and <unk>.
    pub special_tokens: Vec<String>,

    /// Lower-case every line before splitting it into symbols
    pub lower_case: bool,

    /// One symbol per line (first field). When absent, the
    /// vocabulary is counted from the training text.
    pub vocab_file: Option<PathBuf>,

    /// Counted symbols seen fewer times than this are dropped
    pub min_freq: usize,

    /// Upper bound on counted symbols (special tokens excluded)
    pub max_size: Option<usize>,
}

impl Default for VocabConfig {
    fn default() -> Self {
        Self {
            special_tokens: [PAD_TOKEN, START_TOKEN, UNK_TOKEN, END_TOKEN]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            lower_case: false,
            vocab_file: None,
            min_freq: 0,
            max_size: None,
        }
    }
}

// ─── Vocabulary ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    config: VocabConfig,
    align_len: usize,
    idx2sym: Vec<String>,
    sym2idx: HashMap<String, usize>,
    pad_idx: usize,
    unk_idx: usize,
    /// Symbol counts gathered by count_file(); emptied by build_vocab().
    #[serde(skip)]
    counter: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn new(config: VocabConfig, align_len: usize) -> Self {
        Self {
            config,
            align_len,
            idx2sym: Vec::new(),
            sym2idx: HashMap::new(),
            pad_idx: 0,
            unk_idx: 0,
            counter: HashMap::new(),
        }
    }

    pub fn config(&self) -> &VocabConfig {
        &self.config
    }

    pub fn align_len(&self) -> usize {
        self.align_len
    }

    fn normalizer(&self) -> LineNormalizer {
        LineNormalizer::new(self.config.lower_case)
    }

    /// Count symbol frequencies in a text file. Used when no
    /// vocab file is configured. Returns the number of lines read.
    pub fn count_file(&mut self, path: &Path, verbose: bool) -> Result<usize> {
        if verbose {
            tracing::info!("Counting symbols in '{}'", path.display());
        }
        let normalizer = self.normalizer();
        let lines = read_lines(path)?;

        for (idx, line) in lines.iter().enumerate() {
            if verbose && idx > 0 && idx % LOG_EVERY == 0 {
                tracing::info!("  counted line {}", idx);
            }
            for sym in normalizer.symbols(line)? {
                *self.counter.entry(sym).or_insert(0) += 1;
            }
        }
        Ok(lines.len())
    }

    /// Fix the symbol table. Special tokens first, then either the
    /// vocab file or the counted symbols.
    pub fn build_vocab(&mut self) -> Result<()> {
        self.idx2sym.clear();
        self.sym2idx.clear();

        let specials = self.config.special_tokens.clone();
        for sym in &specials {
            self.add_symbol(sym);
        }

        if let Some(vocab_file) = self.config.vocab_file.clone() {
            tracing::info!("Building vocab from '{}'", vocab_file.display());
            for line in read_lines(&vocab_file)? {
                if let Some(sym) = line.split_whitespace().next() {
                    self.add_symbol(sym);
                }
            }
        } else {
            if self.counter.is_empty() {
                return Err(CorpusError::config(
                    "no vocab file configured and no symbols were counted",
                ));
            }
            tracing::info!(
                "Building vocab from {} counted symbols (min_freq={}, max_size={:?})",
                self.counter.len(),
                self.config.min_freq,
                self.config.max_size,
            );

            // Most frequent first; ties broken by symbol for a stable order
            let mut counted: Vec<(String, usize)> = self.counter.drain().collect();
            counted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

            let limit = self.config.max_size.unwrap_or(usize::MAX);
            for (sym, count) in counted.into_iter().take(limit) {
                if count < self.config.min_freq {
                    break;
                }
                self.add_symbol(&sym);
            }
        }
        self.counter.clear();

        self.pad_idx = *self
            .sym2idx
            .get(PAD_TOKEN)
            .ok_or_else(|| CorpusError::config(format!("vocabulary has no {PAD_TOKEN} token")))?;
        self.unk_idx = *self
            .sym2idx
            .get(UNK_TOKEN)
            .or_else(|| self.sym2idx.get("<UNK>"))
            .ok_or_else(|| CorpusError::config(format!("vocabulary has no {UNK_TOKEN} token")))?;

        tracing::info!("Final vocab size {}", self.idx2sym.len());
        Ok(())
    }

    fn add_symbol(&mut self, sym: &str) {
        if !self.sym2idx.contains_key(sym) {
            self.sym2idx.insert(sym.to_string(), self.idx2sym.len());
            self.idx2sym.push(sym.to_string());
        }
    }

    /// Reverse lookup table: id -> symbol.
    pub fn idx2sym(&self) -> &[String] {
        &self.idx2sym
    }

    pub fn len(&self) -> usize {
        self.idx2sym.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idx2sym.is_empty()
    }

    pub fn pad_idx(&self) -> usize {
        self.pad_idx
    }

    pub fn unk_idx(&self) -> usize {
        self.unk_idx
    }

    /// Id of a symbol, <unk> if it is not in the table.
    pub fn get_idx(&self, sym: &str) -> usize {
        self.sym2idx.get(sym).copied().unwrap_or(self.unk_idx)
    }

    pub fn get_sym(&self, idx: usize) -> Option<&str> {
        self.idx2sym.get(idx).map(String::as_str)
    }

    /// Tokenizer that encodes with this table: WordLevel model,
    /// truncated and padded to `align_len`.
    pub fn tokenizer(&self) -> Result<Tokenizer> {
        self.ensure_built()?;

        let vocab: HashMap<String, u32> = self
            .sym2idx
            .iter()
            .map(|(sym, &idx)| (sym.clone(), idx as u32))
            .collect();
        let model = WordLevel::builder()
            .vocab(vocab)
            .unk_token(self.idx2sym[self.unk_idx].clone())
            .build()
            .map_err(|e| CorpusError::tokenizer("cannot build word-level model", e))?;

        let normalizer = self.normalizer();
        let mut tokenizer = Tokenizer::new(model);
        tokenizer
            .with_normalizer(normalizer.normalizer())
            .with_pre_tokenizer(normalizer.pre_tokenizer());
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: self.align_len,
                ..TruncationParams::default()
            }))
            .map_err(|e| CorpusError::tokenizer("invalid truncation", e))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(self.align_len),
            pad_id: self.pad_idx as u32,
            pad_token: self.idx2sym[self.pad_idx].clone(),
            ..PaddingParams::default()
        }));

        Ok(tokenizer)
    }

    /// Encode one line to exactly `align_len` ids. Builds a fresh
    /// tokenizer; use encode_file for whole files.
    pub fn encode_line(&self, line: &str) -> Result<Vec<i32>> {
        let encoding = self
            .tokenizer()?
            .encode(line, false)
            .map_err(|e| CorpusError::tokenizer("cannot encode line", e))?;
        Ok(to_ids(encoding.get_ids()))
    }

    /// Symbols for a row of ids, padding dropped.
    pub fn decode(&self, ids: &[i32]) -> String {
        ids.iter()
            .filter(|&&id| id != self.pad_idx as i32)
            .map(|&id| {
                usize::try_from(id)
                    .ok()
                    .and_then(|i| self.get_sym(i))
                    .unwrap_or(UNK_TOKEN)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn ensure_built(&self) -> Result<()> {
        if self.idx2sym.is_empty() {
            return Err(CorpusError::config("build_vocab() must run before encoding"));
        }
        Ok(())
    }
}

fn to_ids(ids: &[u32]) -> Vec<i32> {
    ids.iter().map(|&id| id as i32).collect()
}

impl CorpusEncoder for Vocabulary {
    fn build_vocab(&mut self) -> Result<()> {
        Vocabulary::build_vocab(self)
    }

    fn encode_file(&self, path: &Path, verbose: bool) -> Result<IdBuffer> {
        self.ensure_built()?;
        if verbose {
            tracing::info!("Encoding file '{}'", path.display());
        }

        let tokenizer = self.tokenizer()?;
        let lines = read_lines(path)?;
        let mut rows = Vec::with_capacity(lines.len());
        for chunk in lines.chunks(LOG_EVERY) {
            let inputs: Vec<&str> = chunk.iter().map(String::as_str).collect();
            let encodings = tokenizer.encode_batch(inputs, false).map_err(|e| {
                CorpusError::tokenizer(format!("cannot encode '{}'", path.display()), e)
            })?;
            rows.extend(encodings.iter().map(|enc| to_ids(enc.get_ids())));

            if verbose && rows.len() < lines.len() {
                tracing::info!("  encoded line {}", rows.len());
            }
        }

        IdBuffer::from_rows(rows, self.align_len)
    }

    fn encode_labels(&self, path: &Path, verbose: bool) -> Result<IdBuffer> {
        if verbose {
            tracing::info!("Encoding labels '{}'", path.display());
        }

        let lines = read_lines(path)?;
        let mut labels = Vec::with_capacity(lines.len());
        for (idx, line) in lines.iter().enumerate() {
            let label = line.trim().parse::<i32>().map_err(|e| {
                CorpusError::malformed(path, idx + 1, format!("bad label '{}': {e}", line.trim()))
            })?;
            labels.push(label);
        }

        Ok(IdBuffer::vector(labels))
    }

    fn vocab_size(&self) -> usize {
        self.len()
    }
}
