// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from image files on disk all
// the way to tensor batches.
//
//   image files
//       │
//       ▼
//   ImageDirLoader    → decodes, converts to luma or RGB planes
//       │
//       ▼
//   Preprocessor      → modcrop, bicubic downscale, JPEG distortion
//       │
//       ▼
//   Patcher           → aligned (LR, HR) patches / test tiles
//       │
//       ▼
//   PatchDataset      → implements Burn's Dataset trait
//       │
//       ▼
//   PatchBatcher      → stacks patches into NCHW tensors
//       │
//       ▼
//   Augmentation      → identity / rotation / flip per batch
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Decodes training and test images using the image crate
pub mod loader;

/// Modcrop, downscale and optional JPEG distortion
pub mod preprocessor;

/// Sliding-window patch extraction and test tiling
pub mod patcher;

/// Implements Burn's Dataset trait for patch pairs
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Rotation and flip variants applied to each batch
pub mod augment;

/// End-to-end dataset and tile construction
pub mod pipeline;
