//! Type-safe host script invocation contracts.
//!
//! This module provides the `BatchScript` trait. Instead of assembling raw
//! environment maps at each call site, a struct per host script produces the
//! script name, the environment the script reads, and whether the scene may
//! be opened read-only.
//!
//! # Contract
//!
//! - `script_name()`: the script file name (e.g. "import_animatic.js");
//!   the execution layer resolves it against the configured scripts dir.
//! - `get_env_vars()`: environment variables the script reads, at minimum
//!   `TB_JOB` pointing at the job file.
//! - `readonly()`: whether `-readonly` is passed. Scripts that save the scene
//!   must return `false`.

/// Trait for typed host script invocations.
pub trait BatchScript {
    /// Get the script filename.
    fn script_name(&self) -> &'static str;

    /// Get required environment variables.
    ///
    /// Example: `[("TB_JOB", "C:/shows/S01/_tb_jobs/job.json")]`
    fn get_env_vars(&self) -> Vec<(String, String)>;

    /// Open the scene read-only.
    fn readonly(&self) -> bool {
        false
    }
}
