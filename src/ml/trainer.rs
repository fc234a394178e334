// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Drives optimisation over the patch dataset:
//
//   for epoch in 0..epochs
//     for each full batch (remainder dropped)
//       for variant in [identity, rotate k·90°, flip]
//         one optimisation step, step += 1
//         every `log_every` steps        → progress record
//         every `checkpoint_every` steps → save both groups
//     epoch average → start / end window
//
// Plain mode: one Adam optimiser on the reconstruction loss.
//
// Adversarial mode: two Adam optimisers, one per parameter group,
// same learning rate. Each step runs in two phases:
//
//   1. discriminator: score detached prediction vs label,
//      d_loss, update discriminator
//   2. generator:     recompute prediction and its score with the
//      updated discriminator, loss + 1e-3·adv_loss, update
//      generator
//
// The step counter is shared by both groups. The reported loss is
// always the reconstruction loss so plain and adversarial runs
// compare directly.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam
//            Ledig et al. (2017) SRGAN

use anyhow::{bail, Result};
use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::Rng;
use std::time::Instant;

use crate::data::{augment::Augmentation, batcher::PatchBatcher, dataset::PatchDataset};
use crate::domain::config::{Settings, CHECKPOINT_EVERY, LOG_EVERY};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{ConvergenceSummary, LossTracker},
};
use crate::ml::{
    adversarial::{adversarial_loss, discriminator_loss, generator_objective},
    architecture::SuperResolution,
    discriminator::Discriminator,
};

// ─── Schedule / Report ────────────────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainSchedule {
    pub log_every:        usize,
    pub checkpoint_every: usize,
}

impl Default for TrainSchedule {
    fn default() -> Self {
        Self { log_every: LOG_EVERY, checkpoint_every: CHECKPOINT_EVERY }
    }
}

#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Optimisation steps taken in this run.
    pub steps:            usize,
    pub checkpoint_steps: Vec<usize>,
    pub epoch_losses:     Vec<f64>,
    pub summary:          ConvergenceSummary,
}

/// Modules after training, ready for checkpointing or inference.
pub struct Trained<B: AutodiffBackend, M> {
    pub model:         M,
    pub discriminator: Option<Discriminator<B>>,
    pub report:        TrainReport,
}

// ─── Single Steps ─────────────────────────────────────────────────────────────
/// Losses of one adversarial step.
#[derive(Debug, Clone, Copy)]
pub struct AdversarialLosses {
    pub reconstruction: f64,
    pub discriminator:  f64,
    pub adversarial:    f64,
}

fn scalar<B: Backend>(t: &Tensor<B, 1>) -> f64 {
    t.clone().into_scalar().elem::<f64>()
}

/// One update of the generator on its reconstruction loss.
pub fn generator_step<B, M, O>(
    model:  M,
    optim:  &mut O,
    lr:     f64,
    inputs: Tensor<B, 4>,
    labels: Tensor<B, 4>,
) -> (M, f64)
where
    B: AutodiffBackend,
    M: SuperResolution<B> + AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    let prediction = model.forward(inputs);
    let loss       = model.loss(labels, prediction);
    let value      = scalar(&loss);

    let grads = GradientsParams::from_grads(loss.backward(), &model);
    (optim.step(lr, model, grads), value)
}

/// Discriminator update followed by a generator update.
pub fn adversarial_step<B, M, OG, OD>(
    model:         M,
    discriminator: Discriminator<B>,
    optim_g:       &mut OG,
    optim_d:       &mut OD,
    lr:            f64,
    inputs:        Tensor<B, 4>,
    labels:        Tensor<B, 4>,
) -> (M, Discriminator<B>, AdversarialLosses)
where
    B: AutodiffBackend,
    M: SuperResolution<B> + AutodiffModule<B>,
    OG: Optimizer<M, B>,
    OD: Optimizer<Discriminator<B>, B>,
{
    // ── Phase 1: discriminator ────────────────────────────────────────────────
    let fake_images  = model.forward(inputs.clone()).detach();
    let (fake, real) = discriminator.score_pair(fake_images, labels.clone());
    let d_loss       = discriminator_loss(real, fake);
    let d_value      = scalar(&d_loss);

    let grads = GradientsParams::from_grads(d_loss.backward(), &discriminator);
    let discriminator = optim_d.step(lr, discriminator, grads);

    // ── Phase 2: generator against the updated discriminator ─────────────────
    let prediction = model.forward(inputs);
    let recon      = model.loss(labels, prediction.clone());
    let adv        = adversarial_loss(discriminator.score(prediction));
    let losses = AdversarialLosses {
        reconstruction: scalar(&recon),
        discriminator:  d_value,
        adversarial:    scalar(&adv),
    };

    let g_loss = generator_objective(recon, adv);
    let grads  = GradientsParams::from_grads(g_loss.backward(), &model);
    (optim_g.step(lr, model, grads), discriminator, losses)
}

// ─── Trainer ──────────────────────────────────────────────────────────────────
pub struct Trainer<'a> {
    settings:    &'a Settings,
    checkpoints: &'a CheckpointManager,
    schedule:    TrainSchedule,
}

impl<'a> Trainer<'a> {
    pub fn new(settings: &'a Settings, checkpoints: &'a CheckpointManager) -> Self {
        Self { settings, checkpoints, schedule: TrainSchedule::default() }
    }

    pub fn with_schedule(mut self, schedule: TrainSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn run<B, M, R>(
        &self,
        model:         M,
        discriminator: Option<Discriminator<B>>,
        dataset:       &PatchDataset,
        rng:           &mut R,
        device:        &B::Device,
    ) -> Result<Trained<B, M>>
    where
        B: AutodiffBackend,
        M: SuperResolution<B> + AutodiffModule<B>,
        R: Rng,
    {
        let cfg        = &self.settings.config;
        let geometry   = self.settings.geometry;
        let batch_size = cfg.batch_size;
        let lr         = cfg.learning_rate;

        let batches = dataset.batch_count(batch_size);
        if batches == 0 {
            bail!(
                "{} training patches do not fill a single batch of {}; \
                 add images to '{}' or lower --batch-size",
                dataset.len(),
                batch_size,
                cfg.data_dir,
            );
        }

        let batcher = PatchBatcher::<B>::new(
            device.clone(),
            cfg.c_dim,
            geometry.image_size,
            geometry.label_size,
        );
        let mut optim_g = AdamConfig::new().init::<B, M>();
        let mut optim_d = AdamConfig::new().init::<B, Discriminator<B>>();

        let mut model         = model;
        let mut discriminator = discriminator;
        let mut tracker       = LossTracker::new(cfg.epoch);
        let mut checkpoints   = Vec::new();
        let mut step          = 0usize;
        let start             = Instant::now();

        tracing::info!(
            "Training {} epochs × {} batches × 3 variants ({} patches, adversarial: {})",
            cfg.epoch,
            batches,
            dataset.len(),
            discriminator.is_some(),
        );

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in 0..cfg.epoch {
            for index in 0..batches {
                let batch = batcher.batch(dataset.batch(index, batch_size).to_vec());

                for variant in Augmentation::variants(rng) {
                    let (inputs, labels) =
                        variant.apply_pair(batch.inputs.clone(), batch.labels.clone());

                    let loss = match discriminator.take() {
                        Some(disc) => {
                            let (m, d, losses) = adversarial_step(
                                model, disc, &mut optim_g, &mut optim_d, lr, inputs, labels,
                            );
                            model         = m;
                            discriminator = Some(d);
                            tracing::debug!(
                                "d_loss={:.6} adv_loss={:.6}",
                                losses.discriminator,
                                losses.adversarial,
                            );
                            losses.reconstruction
                        }
                        None => {
                            let (m, loss) = generator_step(model, &mut optim_g, lr, inputs, labels);
                            model = m;
                            loss
                        }
                    };

                    step += 1;
                    tracker.record_step(loss);

                    if step % self.schedule.log_every == 0 {
                        tracing::info!(
                            "Epoch: [{:2}], step: [{:2}], time: [{:4.4}], loss: [{:.8}]",
                            epoch + 1,
                            step,
                            start.elapsed().as_secs_f64(),
                            loss,
                        );
                    }

                    if step % self.schedule.checkpoint_every == 0 {
                        self.checkpoints.save::<B, _, _>(&model, discriminator.as_ref(), step)?;
                        checkpoints.push(step);
                        tracing::info!("Checkpoint saved at step {}", step);
                    }
                }
            }

            if let Some(avg) = tracker.finish_epoch(epoch) {
                println!("Epoch {:>3}/{} | steps={} | loss={:.6}", epoch + 1, cfg.epoch, step, avg);
            }
        }

        let summary = tracker.summary();
        println!(
            "Start Average: [{}], End Average: [{}], Improved: [{}]",
            fmt_average(summary.start_average),
            fmt_average(summary.end_average),
            summary.improvement,
        );
        tracing::info!("Training complete after {} steps", step);

        Ok(Trained {
            model,
            discriminator,
            report: TrainReport {
                steps: step,
                checkpoint_steps: checkpoints,
                epoch_losses: tracker.epoch_losses().to_vec(),
                summary,
            },
        })
    }
}

fn fmt_average(avg: Option<f64>) -> String {
    avg.map(|v| format!("{v:.6}")).unwrap_or_else(|| "n/a".to_string())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use rand::{rngs::StdRng, SeedableRng};

    use crate::domain::{
        config::SrConfig,
        identity::ModelIdentity,
        patch::PatchPair,
    };
    use crate::infra::checkpoint::ParameterGroup;
    use crate::ml::{discriminator::DiscriminatorConfig, fsrcnn::Fsrcnn};

    type TestBackend = Autodiff<NdArray>;

    fn settings(epoch: usize, batch_size: usize, adversarial: bool) -> Settings {
        SrConfig { fast: true, epoch, batch_size, adversarial, ..SrConfig::default() }
            .validate()
            .unwrap()
    }

    /// `n` patches of a smooth ramp: label is the nearest-neighbour
    /// upscale of the input centre.
    fn dataset(n: usize) -> PatchDataset {
        let pairs = (0..n)
            .map(|i| {
                let shift = i as f32 / n as f32;
                let input = (0..12 * 12).map(|p| ((p % 12) as f32 / 12.0 + shift) / 2.0).collect();
                let label = (0..20 * 20)
                    .map(|p| (((p % 20) / 2 + 1) as f32 / 12.0 + shift) / 2.0)
                    .collect();
                PatchPair::new(input, label)
            })
            .collect();
        PatchDataset::new(pairs)
    }

    fn manager(root: &std::path::Path) -> CheckpointManager {
        let id = ModelIdentity::new("FSRCNN", 20, &[32, 5, 1], 1);
        CheckpointManager::new(root, &id, "FSRCNN")
    }

    #[test]
    fn test_three_steps_per_batch() {
        let tmp      = tempfile::tempdir().unwrap();
        let settings = settings(2, 2, false);
        let ckpt     = manager(tmp.path());
        let device   = Default::default();
        let model    = Fsrcnn::<TestBackend>::init(&settings.model_context(), &device);

        // 5 patches / batch 2 → 2 batches, remainder dropped
        let trained = Trainer::new(&settings, &ckpt)
            .run(model, None, &dataset(5), &mut StdRng::seed_from_u64(0), &device)
            .unwrap();

        assert_eq!(trained.report.steps, 2 * 2 * 3);
        assert_eq!(trained.report.epoch_losses.len(), 2);
        assert!(trained.report.epoch_losses.iter().all(|l| l.is_finite()));
        assert!(trained.report.checkpoint_steps.is_empty());
    }

    #[test]
    fn test_checkpoint_cadence() {
        let tmp      = tempfile::tempdir().unwrap();
        let settings = settings(2, 1, false);
        let ckpt     = manager(tmp.path());
        let device   = Default::default();
        let model    = Fsrcnn::<TestBackend>::init(&settings.model_context(), &device);
        let schedule = TrainSchedule { log_every: 1, checkpoint_every: 4 };

        // 3 batches × 3 variants × 2 epochs = 18 steps → saves at 4, 8, 12, 16
        let trained = Trainer::new(&settings, &ckpt)
            .with_schedule(schedule)
            .run(model, None, &dataset(3), &mut StdRng::seed_from_u64(1), &device)
            .unwrap();

        assert_eq!(trained.report.steps, 18);
        assert_eq!(trained.report.checkpoint_steps, vec![4, 8, 12, 16]);
        let state = ckpt.latest(ParameterGroup::Generator).unwrap().unwrap();
        assert_eq!(state.latest_step, 16);
        assert!(ckpt.latest(ParameterGroup::Discriminator).unwrap().is_none());
    }

    #[test]
    fn test_adversarial_run_saves_both_groups() {
        let tmp      = tempfile::tempdir().unwrap();
        let settings = settings(1, 2, true);
        let ckpt     = manager(tmp.path());
        let device   = Default::default();
        let model    = Fsrcnn::<TestBackend>::init(&settings.model_context(), &device);
        let disc     = DiscriminatorConfig::new(1).init::<TestBackend>(&device);
        let schedule = TrainSchedule { log_every: 10, checkpoint_every: 3 };

        let trained = Trainer::new(&settings, &ckpt)
            .with_schedule(schedule)
            .run(model, Some(disc), &dataset(4), &mut StdRng::seed_from_u64(2), &device)
            .unwrap();

        assert_eq!(trained.report.steps, 6);
        assert!(trained.discriminator.is_some());
        assert_eq!(trained.report.checkpoint_steps, vec![3, 6]);
        let state = ckpt.latest(ParameterGroup::Discriminator).unwrap().unwrap();
        assert_eq!(state.artifact, "discriminator-6");
    }

    #[test]
    fn test_checkpoint_write_failure_aborts_run() {
        let tmp      = tempfile::tempdir().unwrap();
        let blocker  = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"occupied").unwrap();

        let settings = settings(1, 2, false);
        let ckpt     = manager(&blocker);
        let device   = Default::default();
        let model    = Fsrcnn::<TestBackend>::init(&settings.model_context(), &device);
        let schedule = TrainSchedule { log_every: 10, checkpoint_every: 1 };

        let result = Trainer::new(&settings, &ckpt)
            .with_schedule(schedule)
            .run(model, None, &dataset(4), &mut StdRng::seed_from_u64(4), &device);

        assert!(result.is_err());
        assert!(blocker.is_file());
    }

    #[test]
    fn test_too_few_patches_is_an_error() {
        let tmp      = tempfile::tempdir().unwrap();
        let settings = settings(1, 8, false);
        let ckpt     = manager(tmp.path());
        let device   = Default::default();
        let model    = Fsrcnn::<TestBackend>::init(&settings.model_context(), &device);

        let result = Trainer::new(&settings, &ckpt)
            .run(model, None, &dataset(3), &mut StdRng::seed_from_u64(3), &device);
        assert!(result.is_err());
    }

    #[test]
    fn test_generator_step_reduces_loss_on_fixed_batch() {
        let settings = settings(1, 2, false);
        let device   = Default::default();
        let mut model = Fsrcnn::<TestBackend>::init(&settings.model_context(), &device);
        let mut optim = AdamConfig::new().init::<TestBackend, Fsrcnn<TestBackend>>();

        let batch = PatchBatcher::<TestBackend>::new(device, 1, 12, 20)
            .batch(dataset(2).batch(0, 2).to_vec());

        let mut losses = Vec::new();
        for _ in 0..20 {
            let (m, loss) = generator_step(
                model, &mut optim, 1e-3, batch.inputs.clone(), batch.labels.clone(),
            );
            model = m;
            losses.push(loss);
        }
        assert!(losses[19] < losses[0]);
    }

    #[test]
    fn test_adversarial_step_updates_discriminator() {
        let device  = Default::default();
        let ctx     = settings(1, 2, true).model_context();
        let model   = Fsrcnn::<TestBackend>::init(&ctx, &device);
        let disc    = DiscriminatorConfig::new(1).init::<TestBackend>(&device);
        let mut og  = AdamConfig::new().init::<TestBackend, Fsrcnn<TestBackend>>();
        let mut od  = AdamConfig::new().init::<TestBackend, Discriminator<TestBackend>>();

        let batch = PatchBatcher::<TestBackend>::new(device, 1, 12, 20)
            .batch(dataset(2).batch(0, 2).to_vec());
        let real = batch.labels.clone().inner();
        let before = disc.valid().score(real.clone()).into_data().to_vec::<f32>().unwrap();

        let (_, disc, losses) = adversarial_step(
            model, disc, &mut og, &mut od, 1e-3, batch.inputs, batch.labels,
        );
        let after = disc.valid().score(real).into_data().to_vec::<f32>().unwrap();

        assert!(losses.discriminator.is_finite());
        assert!(losses.adversarial.is_finite());
        assert!(losses.reconstruction.is_finite());
        assert_ne!(before, after);
    }
}
