//! Invocation of the scene-setup host script.

use std::path::PathBuf;

use crate::profiles::{JOB_ENV_VAR, SCENE_SETUP};
use crate::script_traits::BatchScript;

/// Arguments for `run_scene_setup.js`.
///
/// # Environment Contract
///
/// | Rust Field | Variable / Flag | Notes |
/// |------------|-----------------|-------|
/// | `job_path` | `TB_JOB`        | Job JSON with `config_path` and `scene_id` |
/// | `readonly` | `-readonly`     | Preview runs that must not save the scene |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSetupArgs {
    pub job_path: PathBuf,
    pub readonly: bool,
}

impl BatchScript for SceneSetupArgs {
    fn script_name(&self) -> &'static str {
        SCENE_SETUP.file_name
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        vec![(
            JOB_ENV_VAR.to_string(),
            self.job_path.to_string_lossy().into_owned(),
        )]
    }

    fn readonly(&self) -> bool {
        self.readonly
    }
}
