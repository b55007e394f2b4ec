// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// Persistence concerns shared by the use cases:
//
//   corpus_cache.rs - load-or-build of the encoded corpus
//                     (bincode artifact, cache.pt)
//
//   fingerprint.rs  - xxHash64 over the source files and the
//                     corpus config, used to detect stale caches
//
// Reference: Rust Book §9 (Error Handling)

/// Corpus cache with format versioning and invalidation
pub mod corpus_cache;

/// Source-file fingerprinting
pub mod fingerprint;
