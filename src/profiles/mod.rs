//! Host script profiles.
//!
//! Both host scripts share one resolution library; what differs between them
//! lives here: the log label, where to look for a job file when no hint is
//! given, and their default literals.
//!
//! # Profiles
//!
//! | Script            | Host file             | Fallback job files |
//! |-------------------|-----------------------|--------------------|
//! | `import_animatic` | `import_animatic.js`  | `_tb_jobs/_tb_job_import_animatic.json`, `_job_animatic.json` |
//! | `scene_setup`     | `run_scene_setup.js`  | `_tb_jobs/_tb_job_scene_setup.json` |

use strum::{Display, EnumIter, EnumString};

/// Environment variable carrying the job-file path into the host.
pub const JOB_ENV_VAR: &str = "TB_JOB";

/// Directory, relative to a scene, holding generated job files.
pub const JOBS_DIR: &str = "_tb_jobs";

/// Host scripts driven by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum HostScript {
    /// Imports one movie as an image sequence into the open scene.
    ImportAnimatic,
    /// Builds a scene (BG, rig, animatic, nodes) from a project config.
    SceneSetup,
}

/// Per-script constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptProfile {
    pub script: HostScript,
    /// Prefix of every log line emitted for this script.
    pub label: &'static str,
    /// Script file name under the scripts directory.
    pub file_name: &'static str,
    /// Job files tried, in order, relative to the current project directory.
    pub job_fallbacks: &'static [&'static str],
    pub default_image_prefix: &'static str,
    pub default_start_frame: i64,
    /// Image folder used when neither job nor config names one.
    pub default_image_subdir: &'static str,
}

pub const IMPORT_ANIMATIC: ScriptProfile = ScriptProfile {
    script: HostScript::ImportAnimatic,
    label: "[import_animatic]",
    file_name: "import_animatic.js",
    job_fallbacks: &["_tb_jobs/_tb_job_import_animatic.json", "_job_animatic.json"],
    default_image_prefix: "ANIM_",
    default_start_frame: 1,
    default_image_subdir: "elements/animatic",
};

pub const SCENE_SETUP: ScriptProfile = ScriptProfile {
    script: HostScript::SceneSetup,
    label: "[scene_setup]",
    file_name: "run_scene_setup.js",
    job_fallbacks: &["_tb_jobs/_tb_job_scene_setup.json"],
    default_image_prefix: "ANIM_",
    default_start_frame: 1,
    default_image_subdir: "elements/animatic",
};

impl HostScript {
    /// Constants for this script.
    pub fn profile(&self) -> &'static ScriptProfile {
        match self {
            HostScript::ImportAnimatic => &IMPORT_ANIMATIC,
            HostScript::SceneSetup => &SCENE_SETUP,
        }
    }
}

impl ScriptProfile {
    /// Label for a sub-step, e.g. `"[scene_setup] job"`.
    pub fn step(&self, what: &str) -> String {
        format!("{} {}", self.label, what)
    }
}
