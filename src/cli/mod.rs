// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap, validates them into `Settings`, picks the backend and
// hands off to Layer 2. Results are printed here.
//
//   train   — train (or resume) a model
//   test    — reconstruct the test image
//   params  — export learned parameters
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use burn::backend::{
    wgpu::{Wgpu, WgpuDevice},
    Autodiff, NdArray,
};
use clap::Parser;
use commands::Commands;

use crate::application::run_use_case::{RunOutcome, RunUseCase};
use crate::domain::config::{Mode, Settings, SrConfig};

#[derive(Parser, Debug)]
#[command(
    name = "sr-trainer",
    version = "0.1.0",
    about = "Train FSRCNN / ESPCN / LapSRN super-resolution models, then upscale images."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let (mode, args) = match self.command {
            Commands::Train(args)  => (Mode::Train, args),
            Commands::Test(args)   => (Mode::Test, args),
            Commands::Params(args) => (Mode::Params, args),
        };
        let cpu      = args.cpu;
        let settings = SrConfig::from((mode, args)).validate()?;

        let outcome = if cpu {
            tracing::info!("Using NdArray CPU backend");
            run_on::<Autodiff<NdArray>>(settings, &Default::default())?
        } else {
            let device = WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            run_on::<Autodiff<Wgpu>>(settings, &device)?
        };

        report(outcome);
        Ok(())
    }
}

fn run_on<B: burn::tensor::backend::AutodiffBackend>(
    settings: Settings,
    device:   &B::Device,
) -> Result<RunOutcome> {
    RunUseCase::new(settings).execute::<B>(device)
}

fn report(outcome: RunOutcome) {
    match outcome {
        RunOutcome::Trained(report) => {
            println!(
                "Training complete: {} steps, improvement {}.",
                report.steps, report.summary.improvement,
            );
        }
        RunOutcome::Tested(result) => {
            match result.psnr {
                Some(db) => println!("Saved '{}' (PSNR {:.2} dB)", result.path.display(), db),
                None     => println!("Saved '{}'", result.path.display()),
            }
        }
        RunOutcome::Exported(path) => {
            println!("Parameters written to '{}'", path.display());
        }
    }
}
