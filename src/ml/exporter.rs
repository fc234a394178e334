// ============================================================
// Layer 5 — Parameter Export
// ============================================================
// `params` mode: dump every learnable tensor of the restored
// generator to `<output_dir>/<identity>_params.json` so the
// weights can be used outside this program.

use anyhow::{Context, Result};
use burn::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::{config::Settings, identity::ModelIdentity};
use crate::ml::{architecture::SuperResolution, layers::ExportedParam};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamsExport {
    pub name:         String,
    pub identity:     String,
    pub model_params: Vec<usize>,
    pub scale:        usize,
    pub radius:       usize,
    pub c_dim:        usize,
    pub params:       Vec<ExportedParam>,
}

impl ParamsExport {
    pub fn collect<B: Backend, M: SuperResolution<B>>(
        model:    &M,
        identity: &ModelIdentity,
        settings: &Settings,
    ) -> Result<Self> {
        Ok(Self {
            name:         model.name().to_string(),
            identity:     identity.to_string(),
            model_params: model.model_params(),
            scale:        settings.config.scale,
            radius:       settings.config.radius,
            c_dim:        settings.config.c_dim,
            params:       model.export_params()?,
        })
    }

    /// Write into `output_dir` and return the file path.
    pub fn write(&self, output_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = output_dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create output directory '{}'", dir.display()))?;

        let path = dir.join(format!("{}_params.json", self.identity));
        fs::write(&path, serde_json::to_string(self)?)
            .with_context(|| format!("Cannot write parameters to '{}'", path.display()))?;

        tracing::info!("Exported {} tensors to '{}'", self.params.len(), path.display());
        Ok(path)
    }
}
