// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types that describe an encoded corpus:
//
//   buffer.rs  - IdBuffer (row-major ids) and Location
//   split.rs   - the train / valid partitions
//   error.rs   - CorpusError, the typed failure taxonomy
//   traits.rs  - CorpusEncoder, the vocabulary interface
//
// Rules for this layer:
//   - NO burn types
//   - NO file I/O
//   - only structs, enums and traits

pub mod buffer;

pub mod error;

pub mod split;

pub mod traits;
