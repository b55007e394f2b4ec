// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The corpus never talks to a concrete vocabulary directly.
// It builds and encodes through CorpusEncoder:
//
//   build_vocab()       -> fix the symbol table
//   encode_file()       -> [lines, align_len] id matrix
//   encode_labels()     -> [lines] label vector
//
// Implementations:
//   - data::vocabulary::Vocabulary -> whitespace symbols from
//     a vocab file (or counted from the training text)

use std::path::Path;

use crate::domain::buffer::IdBuffer;
use crate::domain::error::Result;

// ─── CorpusEncoder ────────────────────────────────────────────────────────────
/// Turns raw text and label files into id buffers.
pub trait CorpusEncoder {
    /// Finalise the symbol table. Must run before any encode call.
    fn build_vocab(&mut self) -> Result<()>;

    /// Encode every line of a text file into one padded row.
    /// With `verbose`, progress is logged while encoding.
    fn encode_file(&self, path: &Path, verbose: bool) -> Result<IdBuffer>;

    /// Encode every line of a label file into one integer label.
    fn encode_labels(&self, path: &Path, verbose: bool) -> Result<IdBuffer>;

    /// Number of symbols, special tokens included.
    fn vocab_size(&self) -> usize;
}
