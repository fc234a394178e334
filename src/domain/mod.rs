// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain data types shared by every other layer: the validated
// run configuration, the checkpoint identity, image planes and
// patches. No burn types and no file I/O here.

/// Options, derived patch geometry, configuration errors
pub mod config;

/// Deterministic checkpoint directory key
pub mod identity;

/// Normalised CHW image buffer
pub mod image;

/// Training patch pairs and inference tiles
pub mod patch;

/// Abstractions the data layer implements
pub mod traits;
