// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands `train`, `test` and `params`.
// They share one set of flags, because the checkpoint a `test`
// or `params` run restores is found through the same options
// (architecture, scale, radius, fast) that trained it.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::domain::config::{Mode, SrConfig};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train on every image in --data-dir, resuming from the latest checkpoint
    Train(RunArgs),

    /// Upscale --test-image with the latest checkpoint
    Test(RunArgs),

    /// Export the learned parameters of the latest checkpoint as JSON
    Params(RunArgs),
}

/// Options shared by all subcommands.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Network: 1 = FSRCNN, 2 = ESPCN, 3 = LapSRN
    #[arg(long, default_value_t = 1)]
    pub arch: u8,

    /// Use the smaller hyperparameter set of the chosen network
    #[arg(long)]
    pub fast: bool,

    /// Refine the generator against a discriminator (training only)
    #[arg(long)]
    pub adversarial: bool,

    /// Channels: 1 = luma only, 3 = RGB
    #[arg(long, default_value_t = 1)]
    pub c_dim: usize,

    /// Number of passes over the training patches
    #[arg(long, default_value_t = 10)]
    pub epoch: usize,

    /// Upscaling factor (2, 3 or 4)
    #[arg(long, default_value_t = 2)]
    pub scale: usize,

    /// Border (in LR pixels) the first convolution consumes
    #[arg(long, default_value_t = 1)]
    pub radius: usize,

    /// Patches per optimisation step
    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Adam learning rate for every parameter group
    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Worker threads for building training patches
    #[arg(long, default_value_t = 1)]
    pub threads: usize,

    /// JPEG-compress the low-resolution training images
    #[arg(long)]
    pub distort: bool,

    #[arg(long, default_value = "checkpoint")]
    pub checkpoint_dir: String,

    #[arg(long, default_value = "result")]
    pub output_dir: String,

    /// Directory of training images
    #[arg(long, default_value = "Train")]
    pub data_dir: String,

    /// Image reconstructed by `test`
    #[arg(long, default_value = "Test/Set5/butterfly_GT.bmp")]
    pub test_image: String,

    /// Seed for parameter init, shuffling and augmentation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run on the CPU (ndarray) instead of the GPU (wgpu)
    #[arg(long)]
    pub cpu: bool,
}

/// Convert CLI args into the domain-layer SrConfig. The mode comes
/// from the subcommand. The domain layer never sees clap types.
impl From<(Mode, RunArgs)> for SrConfig {
    fn from((mode, a): (Mode, RunArgs)) -> Self {
        SrConfig {
            arch:           a.arch,
            fast:           a.fast,
            mode,
            adversarial:    a.adversarial,
            c_dim:          a.c_dim,
            epoch:          a.epoch,
            scale:          a.scale,
            radius:         a.radius,
            batch_size:     a.batch_size,
            learning_rate:  a.learning_rate,
            threads:        a.threads,
            distort:        a.distort,
            checkpoint_dir: a.checkpoint_dir,
            output_dir:     a.output_dir,
            data_dir:       a.data_dir,
            test_image:     a.test_image,
            seed:           a.seed,
        }
    }
}
