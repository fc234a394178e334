// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that persists state between runs or writes results:
//
//   checkpoint.rs   — parameter groups saved with Burn's
//                     DefaultRecorder plus a JSON pointer per group,
//                     so a later run with the same identity resumes.
//
//   metrics.rs      — loss tracking, the start/end convergence
//                     summary and a per-epoch CSV log.
//
//   image_store.rs  — PNG output of reconstructed images.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Generator / discriminator checkpoint saving and loading
pub mod checkpoint;

/// Loss windows, improvement metric and CSV logger
pub mod metrics;

/// PNG writer for reconstructed images
pub mod image_store;
