// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal per
// command:
//
//   prepare_use_case  - load or build the cached corpus
//   inspect_use_case  - walk a split as batches or ordered windows
//
// Rules for this layer:
//   - No iteration arithmetic here (that's Layer 4)
//   - No printing here (that's Layer 1)
//   - Errors carry context via anyhow
//
// Reference: Clean Architecture pattern

/// Load-or-build of the corpus for a data directory
pub mod prepare_use_case;

/// Batch and stream inspection
pub mod inspect_use_case;
