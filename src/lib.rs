//! harmony-batch Library
//!
//! Batch tooling for Toon Boom Harmony: job-file location and project-config
//! resolution for the host scripts, plus the orchestration that writes job
//! files and runs the host headlessly.

pub mod batch;
pub mod cli;
pub mod config;
pub mod config_file;
pub mod error;
pub mod host;
pub mod job;
pub mod locator;
pub mod logic;
pub mod orchestrator;
pub mod paths;
pub mod profiles;
pub mod sanity;
pub mod script_traits;
pub mod scripts;
pub mod splitter;

// Re-export main types for convenience
pub use batch::{BatchInvocation, BatchOutput, run_harmony_batch, run_script};
pub use config::{AssetKind, ProjectConfig, SceneRecord};
pub use config_file::ToolSettings;
pub use error::{BatchError, Result};
pub use host::{
    EnvironmentReader, HostFs, HostRecorder, LocalFs, MediaImporter, Position,
    ProcessEnvironment, SceneGraphBuilder, StaticEnvironment,
};
pub use job::{AnimaticJob, JobDocument, SceneSetupJob};
pub use locator::{PathProbe, locate_file, pick_existing};
pub use profiles::{HostScript, ScriptProfile};
pub use script_traits::BatchScript;

// Path candidates and resolution
pub use paths::{candidates_from_path, is_absolute_path, join_paths, resolve_path};

// Config resolution
pub use logic::resolver::{ScenePlan, apply_defaults, pick_scene, resolve_scene_dir};
