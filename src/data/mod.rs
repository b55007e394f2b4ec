// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from raw corpus files to batches:
//
//   train.txt / train.label / valid.txt / valid.label
//       │
//       ▼
//   loader            → data-directory layout, line reading
//       │
//       ▼
//   preprocessor      → per-line cleanup, optional lower-casing
//       │
//       ▼
//   vocabulary        → symbol table, fixed-length id rows
//       │
//       ▼
//   corpus            → four encoded buffers + iterator factory
//       │
//       ├──► batch_iter   → labelled mini-batches
//       ├──► stream_iter  → ordered windows (fixed / varlen)
//       └──► dataset      → burn Dataset view of a split
//                 │
//                 ▼
//            batcher      → burn tensors on a device
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Data-directory layout and line reading
pub mod loader;

/// Per-line text cleanup
pub mod preprocessor;

/// Symbol table and file encoding
pub mod vocabulary;

/// Fixed-size labelled mini-batches
pub mod batch_iter;

/// Ordered token-stream windows
pub mod stream_iter;

/// Implements Burn's Dataset trait for a split
pub mod dataset;

/// Implements Burn's Batcher trait and buffer uploads
pub mod batcher;

/// The encoded corpus and its iterator factory
pub mod corpus;
