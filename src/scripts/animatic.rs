//! Invocation of the import-animatic host script.

use std::path::PathBuf;

use crate::profiles::{IMPORT_ANIMATIC, JOB_ENV_VAR};
use crate::script_traits::BatchScript;

/// Arguments for `import_animatic.js`.
///
/// # Environment Contract
///
/// | Rust Field | Variable | Notes |
/// |------------|----------|-------|
/// | `job_path` | `TB_JOB` | Absolute path of the job JSON |
///
/// The import saves the scene, so the scene is never opened read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportAnimaticArgs {
    pub job_path: PathBuf,
}

impl BatchScript for ImportAnimaticArgs {
    fn script_name(&self) -> &'static str {
        IMPORT_ANIMATIC.file_name
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        vec![(
            JOB_ENV_VAR.to_string(),
            self.job_path.to_string_lossy().into_owned(),
        )]
    }
}
