// ============================================================
// Layer 2 — RunUseCase
// ============================================================
// Orchestrates one run in order:
//
//   Step 1: Resolve the architecture       (once, from Settings)
//   Step 2: Build generator (+ discriminator in adversarial training)
//   Step 3: Derive the model identity      (checkpoint lineage)
//   Step 4: Restore the latest checkpoint  (failure is not fatal)
//   Step 5: params → export JSON
//           train  → build patches, train, checkpoint
//           test   → tile test image, predict, merge, write PNG
//
// `execute` matches on `Architecture` and hands off to
// `run_model`, which is generic over the concrete network, so
// everything after step 1 is written once.

use anyhow::Result;
use burn::{module::AutodiffModule, tensor::backend::AutodiffBackend};
use rand::{rngs::StdRng, SeedableRng};
use std::path::PathBuf;

use crate::data::{loader::ImageDirLoader, pipeline};
use crate::domain::{
    config::{Architecture, Mode, Settings},
    identity::ModelIdentity,
};
use crate::infra::{
    checkpoint::{CheckpointManager, Restored},
};
use crate::ml::{
    architecture::SuperResolution,
    discriminator::DiscriminatorConfig,
    espcn::Espcn,
    exporter::ParamsExport,
    fsrcnn::Fsrcnn,
    inferencer::{Inferencer, Reconstruction},
    lapsrn::LapSrn,
    trainer::{TrainReport, Trainer},
};

/// What a finished run produced.
pub enum RunOutcome {
    Trained(TrainReport),
    Tested(Reconstruction),
    Exported(PathBuf),
}

pub struct RunUseCase {
    settings: Settings,
}

impl RunUseCase {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn execute<B: AutodiffBackend>(&self, device: &B::Device) -> Result<RunOutcome> {
        match self.settings.architecture {
            Architecture::Fsrcnn => self.run_model::<B, Fsrcnn<B>>(device),
            Architecture::Espcn  => self.run_model::<B, Espcn<B>>(device),
            Architecture::LapSrn => self.run_model::<B, LapSrn<B>>(device),
        }
    }

    fn run_model<B, M>(&self, device: &B::Device) -> Result<RunOutcome>
    where
        B: AutodiffBackend,
        M: SuperResolution<B> + AutodiffModule<B>,
        M::InnerModule: SuperResolution<B::InnerBackend>,
    {
        let settings = &self.settings;
        let cfg      = &settings.config;

        let mut rng = match cfg.seed {
            Some(seed) => {
                B::seed(seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };

        // ── Step 2: Build the parameter groups ───────────────────────────────
        let model = M::init(&settings.model_context(), device);
        let discriminator = settings
            .adversarial_training()
            .then(|| DiscriminatorConfig::new(cfg.c_dim).init::<B>(device));

        // ── Step 3: Model identity ───────────────────────────────────────────
        let identity = ModelIdentity::new(
            model.name(),
            settings.geometry.label_size,
            &model.model_params(),
            cfg.radius,
        );
        tracing::info!("Model {} ({:?} mode)", identity, cfg.mode);

        // ── Step 4: Restore ──────────────────────────────────────────────────
        let checkpoints = CheckpointManager::new(&cfg.checkpoint_dir, &identity, model.name());
        tracing::info!(" [*] Reading checkpoints...");
        let (model, discriminator) =
            match checkpoints.load::<B, _, _>(model.clone(), discriminator.clone(), device) {
                Ok(Restored { generator, discriminator, step: Some(step) }) => {
                    tracing::info!(" [*] Load SUCCESS (step {})", step);
                    (generator, discriminator)
                }
                Ok(_) => {
                    tracing::warn!(" [!] Load failed: no checkpoint under '{}'", checkpoints.dir().display());
                    (model, discriminator)
                }
                Err(e) => {
                    tracing::warn!(" [!] Load failed: {:#}", e);
                    (model, discriminator)
                }
            };

        // ── Step 5: Mode ─────────────────────────────────────────────────────
        match cfg.mode {
            Mode::Params => {
                let path = ParamsExport::collect(&model, &identity, settings)?.write(&cfg.output_dir)?;
                Ok(RunOutcome::Exported(path))
            }

            Mode::Train => {
                let source  = ImageDirLoader::new(&cfg.data_dir, cfg.c_dim);
                let dataset = pipeline::train_dataset(&source, settings, &mut rng)?;

                checkpoints.save_config(cfg)?;

                let trained = Trainer::new(settings, &checkpoints)
                    .run(model, discriminator, &dataset, &mut rng, device)?;
                Ok(RunOutcome::Trained(trained.report))
            }

            Mode::Test => {
                let tiles  = pipeline::test_tiles(settings)?;
                let result = Inferencer::new(settings).run(&model.valid(), &tiles, device)?;
                Ok(RunOutcome::Tested(result))
            }
        }
    }
}
