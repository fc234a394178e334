// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All network definitions and everything that runs them.
//
//   architecture.rs — the `SuperResolution` contract every
//                     generator implements
//   layers.rs       — shared conv / deconv / PReLU builders,
//                     pixel shuffle, parameter flattening
//   fsrcnn.rs       — FSRCNN
//   espcn.rs        — ESPCN (sub-pixel convolution)
//   lapsrn.rs       — single-level LapSRN, Charbonnier loss
//   discriminator.rs — patch discriminator for adversarial runs
//   adversarial.rs  — discriminator / generator objectives
//   trainer.rs      — the training loop and its two step kinds
//   inferencer.rs   — tiled prediction and merge
//   exporter.rs     — `params` mode JSON dump
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Generator plugin contract
pub mod architecture;

/// Layer builders shared by the architectures
pub mod layers;

/// FSRCNN generator
pub mod fsrcnn;

/// ESPCN generator
pub mod espcn;

/// LapSRN generator
pub mod lapsrn;

/// Real / fake patch discriminator
pub mod discriminator;

/// Adversarial loss terms
pub mod adversarial;

/// Training loop with augmentation and checkpointing
pub mod trainer;

/// Tiled inference on the test image
pub mod inferencer;

/// Learnable parameter export
pub mod exporter;
