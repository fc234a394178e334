// ============================================================
// Layer 3 — Model Identity
// ============================================================
// The checkpoint directory key of a run:
//
//   <name lowercased>_<label_size>_<hparams joined by '-'>_r<radius>
//
//   e.g. FSRCNN, label 20, params [56, 12, 4], radius 1
//        → "fsrcnn_20_56-12-4_r1"
//
// Two runs with the same identity share checkpoints, which is
// what makes a run resumable. The string is a pure function of
// its inputs.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelIdentity(String);

impl ModelIdentity {
    pub fn new(name: &str, label_size: usize, model_params: &[usize], radius: usize) -> Self {
        let params = model_params
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join("-");

        Self(format!("{}_{}_{}_r{}", name.to_lowercase(), label_size, params, radius))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory holding this lineage under `checkpoint_root`.
    pub fn dir(&self, checkpoint_root: impl AsRef<Path>) -> PathBuf {
        checkpoint_root.as_ref().join(&self.0)
    }
}

impl fmt::Display for ModelIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_format() {
        let id = ModelIdentity::new("FSRCNN", 20, &[56, 12, 4], 1);
        assert_eq!(id.as_str(), "fsrcnn_20_56-12-4_r1");

        let id = ModelIdentity::new("LapSRN", 24, &[32, 3], 2);
        assert_eq!(id.to_string(), "lapsrn_24_32-3_r2");
    }

    #[test]
    fn test_identity_is_deterministic() {
        let a = ModelIdentity::new("ESPCN", 21, &[64, 32], 3);
        let b = ModelIdentity::new("ESPCN", 21, &[64, 32], 3);
        assert_eq!(a, b);
        assert_eq!(a.as_str().as_bytes(), b.as_str().as_bytes());
    }

    #[test]
    fn test_identity_separates_lineages() {
        let base = ModelIdentity::new("FSRCNN", 20, &[56, 12, 4], 1);
        assert_ne!(base, ModelIdentity::new("FSRCNN", 20, &[32, 5, 1], 1));
        assert_ne!(base, ModelIdentity::new("FSRCNN", 20, &[56, 12, 4], 2));
        assert_ne!(base, ModelIdentity::new("FSRCNN", 21, &[56, 12, 4], 1));
    }

    #[test]
    fn test_identity_dir() {
        let id = ModelIdentity::new("FSRCNN", 20, &[32, 5, 1], 1);
        assert_eq!(id.dir("checkpoint"), PathBuf::from("checkpoint/fsrcnn_20_32-5-1_r1"));
    }
}
