//! Logic modules: what the host scripts do, expressed over injected
//! collaborators.
//!
//! # Modules
//!
//! - `resolver`: project config scene selection, default merge, path bases
//! - `import_animatic`: movie import into the open scene
//! - `scene_setup`: BG, rig, animatic and nodes from a project config

pub mod import_animatic;
pub mod resolver;
pub mod scene_setup;

use tracing::{error, info};

use crate::error::{BatchError, Result};
use crate::host::{EnvironmentReader, HostFs};
use crate::locator::{job_candidates, locate_file};
use crate::profiles::{JOB_ENV_VAR, ScriptProfile};

/// Find the job file for a script: hint first, then the script's fallbacks
/// under the current project directory.
pub(crate) fn locate_job<E, F>(env: &E, fs: &F, profile: &ScriptProfile) -> Result<String>
where
    E: EnvironmentReader + ?Sized,
    F: HostFs + ?Sized,
{
    let hint = env.var(JOB_ENV_VAR);
    let project_dir = env.current_project_path();

    if let Some(hint) = &hint {
        info!("{} {} env={}", profile.label, JOB_ENV_VAR, hint);
    }
    if let Some(dir) = &project_dir {
        info!("{} scene path={}", profile.label, dir);
    }

    let candidates = job_candidates(hint.as_deref(), project_dir.as_deref(), profile.job_fallbacks);
    if candidates.is_empty() {
        error!(
            "{} neither {} nor a current project path is available",
            profile.label, JOB_ENV_VAR
        );
        return Err(BatchError::missing_hint(format!(
            "{} is empty and no scene is open",
            JOB_ENV_VAR
        )));
    }

    locate_file(fs, &profile.step("job"), &candidates)
}
