// ============================================================
// Layer 3 — Run Configuration
// ============================================================
// The immutable set of scalars fixing one run: which network,
// which scale factor, how the patches are sampled, and how
// long to train.
//
// Derived geometry (per scale factor):
//
//   scale | image_size      | label_size | stride
//   ------+-----------------+------------+-------
//     2   | 10 + 2·radius   |     20     |  10
//     3   |  7 + 2·radius   |     21     |   7
//     4   |  6 + 2·radius   |     24     |   6
//
// `image_size` is the low-resolution input patch including the
// sampling border, `label_size` the high-resolution target patch.
//
// Validation happens once, in `SrConfig::validate`, before any
// model is built. Everything downstream works on `Settings`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// (unpadded input size, label size) indexed by `scale - 2`.
pub const SCALE_FACTORS: [(usize, usize); 3] = [(10, 20), (7, 21), (6, 24)];

/// Steps between checkpoint saves.
pub const CHECKPOINT_EVERY: usize = 500;

/// Steps between progress records.
pub const LOG_EVERY: usize = 10;

// ─── ConfigError ──────────────────────────────────────────────────────────────
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown architecture id {0} (expected 1 = FSRCNN, 2 = ESPCN, 3 = LapSRN)")]
    UnknownArchitecture(u8),

    #[error("unsupported scale factor {0} (expected 2, 3 or 4)")]
    UnsupportedScale(usize),

    #[error("c_dim must be 1 (luma) or 3 (RGB), got {0}")]
    UnsupportedChannels(usize),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("learning rate must be a positive number, got {0}")]
    InvalidLearningRate(f64),
}

// ─── Mode ─────────────────────────────────────────────────────────────────────
/// What a run does once the model is assembled and restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Train,
    Test,
    Params,
}

// ─── Architecture ─────────────────────────────────────────────────────────────
/// The closed set of generator networks, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Architecture {
    Fsrcnn,
    Espcn,
    LapSrn,
}

impl Architecture {
    pub fn from_id(id: u8) -> Result<Self, ConfigError> {
        match id {
            1 => Ok(Self::Fsrcnn),
            2 => Ok(Self::Espcn),
            3 => Ok(Self::LapSrn),
            other => Err(ConfigError::UnknownArchitecture(other)),
        }
    }
}

// ─── Geometry ─────────────────────────────────────────────────────────────────
/// Patch geometry derived from (scale, radius).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub padding:    usize,
    pub image_size: usize,
    pub label_size: usize,
    pub stride:     usize,
}

impl Geometry {
    pub fn new(scale: usize, radius: usize) -> Result<Self, ConfigError> {
        if !(2..=4).contains(&scale) {
            return Err(ConfigError::UnsupportedScale(scale));
        }
        let padding = radius * 2;
        let (base, label_size) = SCALE_FACTORS[scale - 2];
        let image_size = base + padding;

        Ok(Self {
            padding,
            image_size,
            label_size,
            stride: image_size - padding,
        })
    }
}

// ─── SrConfig ─────────────────────────────────────────────────────────────────
/// Raw options as supplied by the CLI. Serialisable so a run can be
/// recorded next to its checkpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SrConfig {
    pub arch:           u8,
    pub fast:           bool,
    pub mode:           Mode,
    pub adversarial:    bool,
    pub c_dim:          usize,
    pub epoch:          usize,
    pub scale:          usize,
    pub radius:         usize,
    pub batch_size:     usize,
    pub learning_rate:  f64,
    pub threads:        usize,
    pub distort:        bool,
    pub checkpoint_dir: String,
    pub output_dir:     String,
    pub data_dir:       String,
    pub test_image:     String,
    pub seed:           Option<u64>,
}

impl Default for SrConfig {
    fn default() -> Self {
        Self {
            arch:           1,
            fast:           false,
            mode:           Mode::Train,
            adversarial:    false,
            c_dim:          1,
            epoch:          10,
            scale:          2,
            radius:         1,
            batch_size:     32,
            learning_rate:  1e-3,
            threads:        1,
            distort:        false,
            checkpoint_dir: "checkpoint".to_string(),
            output_dir:     "result".to_string(),
            data_dir:       "Train".to_string(),
            test_image:     "Test/Set5/butterfly_GT.bmp".to_string(),
            seed:           None,
        }
    }
}

impl SrConfig {
    /// Check every option and derive the patch geometry.
    /// Nothing touches the filesystem or builds a model before this passes.
    pub fn validate(self) -> Result<Settings, ConfigError> {
        let architecture = Architecture::from_id(self.arch)?;
        let geometry     = Geometry::new(self.scale, self.radius)?;

        if self.c_dim != 1 && self.c_dim != 3 {
            return Err(ConfigError::UnsupportedChannels(self.c_dim));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Zero("batch_size"));
        }
        if self.epoch == 0 && self.mode == Mode::Train {
            return Err(ConfigError::Zero("epoch"));
        }
        if self.threads == 0 {
            return Err(ConfigError::Zero("threads"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::InvalidLearningRate(self.learning_rate));
        }

        Ok(Settings { config: self, architecture, geometry })
    }
}

// ─── Settings ─────────────────────────────────────────────────────────────────
/// A validated configuration plus everything derived from it.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config:       SrConfig,
    pub architecture: Architecture,
    pub geometry:     Geometry,
}

impl Settings {
    /// Adversarial refinement runs only while training.
    pub fn adversarial_training(&self) -> bool {
        self.config.adversarial && self.config.mode == Mode::Train
    }

    pub fn model_context(&self) -> ModelContext {
        ModelContext {
            c_dim:      self.config.c_dim,
            scale:      self.config.scale,
            radius:     self.config.radius,
            fast:       self.config.fast,
            image_size: self.geometry.image_size,
            label_size: self.geometry.label_size,
        }
    }
}

/// The part of the configuration a network definition is allowed to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelContext {
    pub c_dim:      usize,
    pub scale:      usize,
    pub radius:     usize,
    pub fast:       bool,
    pub image_size: usize,
    pub label_size: usize,
}
