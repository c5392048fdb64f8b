//! Host collaborator interfaces.
//!
//! Inside the host, the batch scripts talk to global objects: the environment,
//! the file API, the movie importer and the scene graph. Here each capability
//! is a trait injected into the workflows in `crate::logic`, which keeps the
//! path and config logic testable without the host present.
//!
//! Provided implementations:
//!
//! - [`ProcessEnvironment`] / [`StaticEnvironment`] for [`EnvironmentReader`]
//! - [`LocalFs`] / [`DryRunFs`] for [`HostFs`]
//! - [`HostRecorder`] for [`MediaImporter`] and [`SceneGraphBuilder`], which
//!   records every call instead of performing it

use std::collections::HashMap;
use std::fs;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::null_as_default;
use crate::error::Result;
use crate::locator::PathProbe;
use crate::paths::strip_bom;

// ============================================================================
// Capabilities
// ============================================================================

/// Environment accessors.
pub trait EnvironmentReader {
    /// Value of an environment variable; empty values count as unset.
    fn var(&self, name: &str) -> Option<String>;

    /// Directory of the scene currently open in the host, if any.
    fn current_project_path(&self) -> Option<String>;
}

/// File access needed by the workflows.
pub trait HostFs: PathProbe {
    /// Read a whole UTF-8 text file, dropping a leading byte-order mark.
    fn read_text(&self, path: &str) -> Result<String>;

    /// Create a directory and its parents.
    fn create_dir_all(&self, path: &str) -> Result<()>;
}

/// Movie-to-image-sequence importer, configured through setters and executed
/// by a single `do_import` call.
pub trait MediaImporter {
    fn set_movie_filename(&mut self, path: &str);
    fn set_image_folder(&mut self, path: &str);
    fn set_image_prefix(&mut self, prefix: &str);
    fn set_start_frame(&mut self, frame: i64);
    fn set_audio_file(&mut self, path: &str);

    /// Run the import. `false` means the host reported failure.
    fn do_import(&mut self) -> bool;
}

/// Node-view position offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    #[serde(deserialize_with = "null_as_default")]
    pub x: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub y: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub z: f64,
}

/// Scene-graph construction.
pub trait SceneGraphBuilder {
    /// Create a drawing node and expose `path` as drawing `drawing_name` at
    /// `start_frame`.
    fn add_drawing(
        &mut self,
        node_name: &str,
        start_frame: i64,
        drawing_name: &str,
        path: &str,
        convert_to_tvg: bool,
    ) -> Result<()>;

    /// Import a template (rig) at the given offset.
    fn import_template(&mut self, path: &str, position: Position) -> Result<()>;

    /// Create a generic node of `node_type`.
    fn add_node(&mut self, node_type: &str, name: &str, position: Position) -> Result<()>;
}

// ============================================================================
// Environment implementations
// ============================================================================

/// Reads variables from the current process environment.
#[derive(Debug, Clone, Default)]
pub struct ProcessEnvironment {
    /// Scene directory, when known to the caller.
    pub project_path: Option<String>,
}

impl EnvironmentReader for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|v| !v.is_empty())
    }

    fn current_project_path(&self) -> Option<String> {
        self.project_path.clone().filter(|p| !p.is_empty())
    }
}

/// Fixed set of variables, for previews and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    pub vars: HashMap<String, String>,
    pub project_path: Option<String>,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_project_path(mut self, path: impl Into<String>) -> Self {
        self.project_path = Some(path.into());
        self
    }
}

impl EnvironmentReader for StaticEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).filter(|v| !v.is_empty()).cloned()
    }

    fn current_project_path(&self) -> Option<String> {
        self.project_path.clone().filter(|p| !p.is_empty())
    }
}

// ============================================================================
// Filesystem implementations
// ============================================================================

/// The local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl PathProbe for LocalFs {
    fn exists(&self, path: &str) -> bool {
        std::path::Path::new(path).exists()
    }
}

impl HostFs for LocalFs {
    fn read_text(&self, path: &str) -> Result<String> {
        let text = fs::read_to_string(path)?;
        Ok(strip_bom(&text).to_string())
    }

    fn create_dir_all(&self, path: &str) -> Result<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }
}

/// Reads the local filesystem but only logs directory creation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunFs;

impl PathProbe for DryRunFs {
    fn exists(&self, path: &str) -> bool {
        LocalFs.exists(path)
    }
}

impl HostFs for DryRunFs {
    fn read_text(&self, path: &str) -> Result<String> {
        LocalFs.read_text(path)
    }

    fn create_dir_all(&self, path: &str) -> Result<()> {
        info!("[DRY RUN] would create directory {}", path);
        Ok(())
    }
}

// ============================================================================
// Recording host
// ============================================================================

/// One call made against the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum HostCall {
    SetMovieFilename { path: String },
    SetImageFolder { path: String },
    SetImagePrefix { prefix: String },
    SetStartFrame { frame: i64 },
    SetAudioFile { path: String },
    DoImport,
    AddDrawing {
        node_name: String,
        start_frame: i64,
        drawing_name: String,
        path: String,
        convert_to_tvg: bool,
    },
    ImportTemplate { path: String, position: Position },
    AddNode { node_type: String, name: String, position: Position },
}

/// Records host calls in order. `do_import` answers with `import_result`.
#[derive(Debug, Clone)]
pub struct HostRecorder {
    pub calls: Vec<HostCall>,
    pub import_result: bool,
}

impl Default for HostRecorder {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            import_result: true,
        }
    }
}

impl HostRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder whose imports report failure.
    pub fn failing() -> Self {
        Self {
            calls: Vec::new(),
            import_result: false,
        }
    }
}

impl MediaImporter for HostRecorder {
    fn set_movie_filename(&mut self, path: &str) {
        self.calls.push(HostCall::SetMovieFilename { path: path.to_string() });
    }

    fn set_image_folder(&mut self, path: &str) {
        self.calls.push(HostCall::SetImageFolder { path: path.to_string() });
    }

    fn set_image_prefix(&mut self, prefix: &str) {
        self.calls.push(HostCall::SetImagePrefix { prefix: prefix.to_string() });
    }

    fn set_start_frame(&mut self, frame: i64) {
        self.calls.push(HostCall::SetStartFrame { frame });
    }

    fn set_audio_file(&mut self, path: &str) {
        self.calls.push(HostCall::SetAudioFile { path: path.to_string() });
    }

    fn do_import(&mut self) -> bool {
        self.calls.push(HostCall::DoImport);
        self.import_result
    }
}

impl SceneGraphBuilder for HostRecorder {
    fn add_drawing(
        &mut self,
        node_name: &str,
        start_frame: i64,
        drawing_name: &str,
        path: &str,
        convert_to_tvg: bool,
    ) -> Result<()> {
        self.calls.push(HostCall::AddDrawing {
            node_name: node_name.to_string(),
            start_frame,
            drawing_name: drawing_name.to_string(),
            path: path.to_string(),
            convert_to_tvg,
        });
        Ok(())
    }

    fn import_template(&mut self, path: &str, position: Position) -> Result<()> {
        self.calls.push(HostCall::ImportTemplate {
            path: path.to_string(),
            position,
        });
        Ok(())
    }

    fn add_node(&mut self, node_type: &str, name: &str, position: Position) -> Result<()> {
        self.calls.push(HostCall::AddNode {
            node_type: node_type.to_string(),
            name: name.to_string(),
            position,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_environment_ignores_empty_values() {
        let env = StaticEnvironment::new()
            .with_var("TB_JOB", "")
            .with_var("OTHER", "x")
            .with_project_path("");
        assert_eq!(env.var("TB_JOB"), None);
        assert_eq!(env.var("OTHER").as_deref(), Some("x"));
        assert_eq!(env.current_project_path(), None);
    }

    #[test]
    fn test_local_fs_strips_bom() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("job.json");
        fs::write(&file, "\u{feff}{\"a\":1}").unwrap();
        let text = LocalFs.read_text(file.to_str().unwrap()).unwrap();
        assert_eq!(text, "{\"a\":1}");
    }

    #[test]
    fn test_dry_run_fs_does_not_create() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out").join("frames");
        DryRunFs.create_dir_all(target.to_str().unwrap()).unwrap();
        assert!(!target.exists());

        LocalFs.create_dir_all(target.to_str().unwrap()).unwrap();
        assert!(target.exists());
    }

    #[test]
    fn test_recorder_records_in_order() {
        let mut host = HostRecorder::new();
        host.set_movie_filename("a.mp4");
        host.set_start_frame(1);
        assert!(host.do_import());
        assert_eq!(
            host.calls,
            vec![
                HostCall::SetMovieFilename { path: "a.mp4".into() },
                HostCall::SetStartFrame { frame: 1 },
                HostCall::DoImport,
            ]
        );
        assert!(!HostRecorder::failing().do_import());
    }

    #[test]
    fn test_host_call_serializes_tagged() {
        let json = serde_json::to_value(HostCall::SetImagePrefix { prefix: "ANIM_".into() }).unwrap();
        assert_eq!(json["call"], "set_image_prefix");
        assert_eq!(json["prefix"], "ANIM_");
    }
}
