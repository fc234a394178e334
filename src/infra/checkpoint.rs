// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the two parameter groups of a run using
// Burn's DefaultRecorder (named MessagePack, full precision, so a
// restore reproduces predictions exactly).
//
// Layout under the checkpoint root:
//
//   <root>/<identity>/
//     FSRCNN-500.mpk          ← generator record at step 500
//     FSRCNN-1000.mpk
//     checkpoint.json         ← pointer: latest step + artifact
//     run_config.json         ← options of the last training run
//     discriminator/          ← only written in adversarial runs
//       discriminator-500.mpk
//       checkpoint.json
//
// The pointer is written after the record, so it never names a
// file that does not exist yet. Only the newest `KEEP` artifacts
// of each group stay on disk.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{DefaultRecorder, FileRecorder},
};
use serde::{Deserialize, Serialize};

use crate::domain::identity::ModelIdentity;

/// Artifacts kept per parameter group.
pub const KEEP: usize = 5;

const POINTER_FILE:      &str = "checkpoint.json";
const CONFIG_FILE:       &str = "run_config.json";
const DISCRIMINATOR_DIR: &str = "discriminator";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterGroup {
    Generator,
    Discriminator,
}

/// Contents of `checkpoint.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointState {
    pub latest_step: usize,
    pub artifact:    String,
    /// Artifacts still on disk, oldest first.
    pub history:     Vec<String>,
}

/// Modules after a restore attempt. `step` is `None` when no
/// generator checkpoint existed and the fresh parameters were kept.
pub struct Restored<G, D> {
    pub generator:     G,
    pub discriminator: Option<D>,
    pub step:          Option<usize>,
}

pub struct CheckpointManager {
    dir:  PathBuf,
    name: String,
}

impl CheckpointManager {
    /// Nothing is created on disk until the first save.
    pub fn new(root: impl AsRef<Path>, identity: &ModelIdentity, name: &str) -> Self {
        Self { dir: identity.dir(root), name: name.to_string() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn group_dir(&self, group: ParameterGroup) -> PathBuf {
        match group {
            ParameterGroup::Generator     => self.dir.clone(),
            ParameterGroup::Discriminator => self.dir.join(DISCRIMINATOR_DIR),
        }
    }

    fn artifact_name(&self, group: ParameterGroup, step: usize) -> String {
        match group {
            ParameterGroup::Generator     => format!("{}-{step}", self.name),
            ParameterGroup::Discriminator => format!("{DISCRIMINATOR_DIR}-{step}"),
        }
    }

    // ── Save ──────────────────────────────────────────────────────────────────
    /// Save one group at `step` and move its pointer.
    pub fn save_group<B: Backend, M: Module<B>>(
        &self,
        group:  ParameterGroup,
        module: &M,
        step:   usize,
    ) -> Result<()> {
        let dir = self.group_dir(group);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;

        let artifact = self.artifact_name(group, step);
        let path     = dir.join(&artifact);
        let recorder = DefaultRecorder::new();
        module
            .clone()
            .save_file(path.clone(), &recorder)
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        let mut history = self.latest(group)?.map(|s| s.history).unwrap_or_default();
        history.retain(|a| a != &artifact);
        history.push(artifact.clone());

        let stale = history.len().saturating_sub(KEEP);
        let ext   = <DefaultRecorder as FileRecorder<B>>::file_extension();
        for old in history.drain(..stale) {
            let old_path = dir.join(&old).with_extension(ext);
            if let Err(e) = fs::remove_file(&old_path) {
                tracing::warn!("Could not remove old checkpoint '{}': {}", old_path.display(), e);
            }
        }

        let state = CheckpointState { latest_step: step, artifact, history };
        let pointer = dir.join(POINTER_FILE);
        fs::write(&pointer, serde_json::to_string_pretty(&state)?)
            .with_context(|| format!("Failed to write '{}'", pointer.display()))?;

        tracing::debug!("Saved {:?} checkpoint at step {}", group, step);
        Ok(())
    }

    /// Save the generator and, in adversarial runs, the discriminator.
    pub fn save<B: Backend, G: Module<B>, D: Module<B>>(
        &self,
        generator:     &G,
        discriminator: Option<&D>,
        step:          usize,
    ) -> Result<()> {
        self.save_group(ParameterGroup::Generator, generator, step)?;
        if let Some(disc) = discriminator {
            self.save_group(ParameterGroup::Discriminator, disc, step)?;
        }
        Ok(())
    }

    /// Record the options of a training run next to its checkpoints.
    pub fn save_config<T: Serialize>(&self, config: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", self.dir.display()))?;
        let path = self.dir.join(CONFIG_FILE);
        fs::write(&path, serde_json::to_string_pretty(config)?)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved run config to '{}'", path.display());
        Ok(())
    }

    // ── Load ──────────────────────────────────────────────────────────────────
    /// The group's pointer, or `None` if it was never saved.
    pub fn latest(&self, group: ParameterGroup) -> Result<Option<CheckpointState>> {
        let path = self.group_dir(group).join(POINTER_FILE);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Cannot read '{}'", path.display()));
            }
        };
        let state = serde_json::from_str(&json)
            .with_context(|| format!("Corrupt checkpoint pointer '{}'", path.display()))?;
        Ok(Some(state))
    }

    /// Restore `module` from the group's latest artifact.
    /// Returns the module unchanged and `None` when there is no pointer.
    pub fn load_group<B: Backend, M: Module<B>>(
        &self,
        group:  ParameterGroup,
        module: M,
        device: &B::Device,
    ) -> Result<(M, Option<usize>)> {
        let Some(state) = self.latest(group)? else {
            return Ok((module, None));
        };

        let path = self.group_dir(group).join(&state.artifact);
        let module = module
            .load_file(path.clone(), &DefaultRecorder::new(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;
        Ok((module, Some(state.latest_step)))
    }

    /// Restore the generator, then the discriminator if one is given.
    /// A discriminator that has no checkpoint, or one that fails to load,
    /// keeps its fresh parameters.
    pub fn load<B: Backend, G: Module<B>, D: Module<B>>(
        &self,
        generator:     G,
        discriminator: Option<D>,
        device:        &B::Device,
    ) -> Result<Restored<G, D>> {
        let (generator, step) = self.load_group(ParameterGroup::Generator, generator, device)?;
        if step.is_none() {
            return Ok(Restored { generator, discriminator, step });
        }

        let discriminator = match discriminator {
            Some(fresh) => {
                match self.load_group(ParameterGroup::Discriminator, fresh.clone(), device) {
                    Ok((disc, Some(_))) => Some(disc),
                    Ok((disc, None)) => {
                        tracing::info!("No discriminator checkpoint, starting it fresh");
                        Some(disc)
                    }
                    Err(e) => {
                        tracing::warn!("Discriminator load failed ({e:#}), starting it fresh");
                        Some(fresh)
                    }
                }
            }
            None => None,
        };

        Ok(Restored { generator, discriminator, step })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use crate::domain::config::ModelContext;
    use crate::ml::{
        architecture::SuperResolution,
        discriminator::{Discriminator, DiscriminatorConfig},
        fsrcnn::Fsrcnn,
    };

    type TestBackend = NdArray;

    fn ctx() -> ModelContext {
        ModelContext { c_dim: 1, scale: 2, radius: 1, fast: true, image_size: 12, label_size: 20 }
    }

    fn manager(root: &Path) -> CheckpointManager {
        let id = ModelIdentity::new("FSRCNN", 20, &[32, 5, 1], 1);
        CheckpointManager::new(root, &id, "FSRCNN")
    }

    fn predict(model: &Fsrcnn<TestBackend>) -> Vec<f32> {
        let x = Tensor::<TestBackend, 4>::full([1, 1, 12, 12], 0.5, &Default::default());
        model.forward(x).into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_round_trip_reproduces_predictions() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let ckpt   = manager(tmp.path());

        let trained = Fsrcnn::<TestBackend>::init(&ctx(), &device);
        ckpt.save::<TestBackend, _, Discriminator<TestBackend>>(&trained, None, 500).unwrap();

        let fresh    = Fsrcnn::<TestBackend>::init(&ctx(), &device);
        let restored = ckpt
            .load::<TestBackend, _, Discriminator<TestBackend>>(fresh, None, &device)
            .unwrap();

        assert_eq!(restored.step, Some(500));
        assert_eq!(predict(&restored.generator), predict(&trained));
        assert!(tmp.path().join("fsrcnn_20_32-5-1_r1").join("FSRCNN-500.mpk").exists());
    }

    #[test]
    fn test_missing_checkpoint_is_none() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let ckpt   = manager(tmp.path());

        assert!(ckpt.latest(ParameterGroup::Generator).unwrap().is_none());
        let model    = Fsrcnn::<TestBackend>::init(&ctx(), &device);
        let restored = ckpt
            .load::<TestBackend, _, Discriminator<TestBackend>>(model, None, &device)
            .unwrap();
        assert_eq!(restored.step, None);
        assert!(!ckpt.dir().exists());
    }

    #[test]
    fn test_missing_discriminator_is_tolerated() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let ckpt   = manager(tmp.path());

        let model = Fsrcnn::<TestBackend>::init(&ctx(), &device);
        ckpt.save::<TestBackend, _, Discriminator<TestBackend>>(&model, None, 10).unwrap();

        let disc = DiscriminatorConfig::new(1).init::<TestBackend>(&device);
        let restored = ckpt.load::<TestBackend, _, _>(model, Some(disc), &device).unwrap();
        assert_eq!(restored.step, Some(10));
        assert!(restored.discriminator.is_some());
    }

    #[test]
    fn test_corrupt_discriminator_keeps_restored_generator() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let ckpt   = manager(tmp.path());

        let trained = Fsrcnn::<TestBackend>::init(&ctx(), &device);
        let disc    = DiscriminatorConfig::new(1).init::<TestBackend>(&device);
        ckpt.save::<TestBackend, _, _>(&trained, Some(&disc), 20).unwrap();

        let artifact = ckpt.group_dir(ParameterGroup::Discriminator).join("discriminator-20.mpk");
        std::fs::write(&artifact, b"not a record").unwrap();

        let fresh      = Fsrcnn::<TestBackend>::init(&ctx(), &device);
        let fresh_disc = DiscriminatorConfig::new(1).init::<TestBackend>(&device);
        let restored   = ckpt.load::<TestBackend, _, _>(fresh, Some(fresh_disc), &device).unwrap();

        assert_eq!(restored.step, Some(20));
        assert_eq!(predict(&restored.generator), predict(&trained));
        assert!(restored.discriminator.is_some());
    }

    #[test]
    fn test_discriminator_saved_in_subdirectory() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let ckpt   = manager(tmp.path());

        let model = Fsrcnn::<TestBackend>::init(&ctx(), &device);
        let disc  = DiscriminatorConfig::new(1).init::<TestBackend>(&device);
        ckpt.save::<TestBackend, _, _>(&model, Some(&disc), 1000).unwrap();

        let state = ckpt.latest(ParameterGroup::Discriminator).unwrap().unwrap();
        assert_eq!(state.artifact, "discriminator-1000");
        assert!(ckpt.group_dir(ParameterGroup::Discriminator).join("discriminator-1000.mpk").exists());
    }

    #[test]
    fn test_only_newest_artifacts_are_kept() {
        let tmp    = tempfile::tempdir().unwrap();
        let device = Default::default();
        let ckpt   = manager(tmp.path());
        let model  = Fsrcnn::<TestBackend>::init(&ctx(), &device);

        for step in (1..=7).map(|i| i * 500) {
            ckpt.save::<TestBackend, _, Discriminator<TestBackend>>(&model, None, step).unwrap();
        }
        // saving twice into an existing directory is fine
        ckpt.save::<TestBackend, _, Discriminator<TestBackend>>(&model, None, 3500).unwrap();

        let state = ckpt.latest(ParameterGroup::Generator).unwrap().unwrap();
        assert_eq!(state.latest_step, 3500);
        assert_eq!(state.history.len(), KEEP);
        assert_eq!(state.history.first().map(String::as_str), Some("FSRCNN-1500"));
        assert!(!ckpt.dir().join("FSRCNN-500.mpk").exists());
        assert!(!ckpt.dir().join("FSRCNN-1000.mpk").exists());
        assert!(ckpt.dir().join("FSRCNN-1500.mpk").exists());
    }
}
