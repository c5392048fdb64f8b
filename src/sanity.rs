//! Pre-flight sanity checks for the batch environment
//!
//! This module verifies, before any host run, that:
//! - The host executable exists
//! - Both host scripts exist in the scripts directory
//! - ffmpeg and ffprobe answer `-version` (needed by the splitter only)
//!
//! `doctor` prints the report; batch commands only need the host checks.

use std::process::{Command, Stdio};

use strum::IntoEnumIterator;
use tracing::debug;

use crate::config_file::ToolSettings;
use crate::profiles::HostScript;

/// Result of environment verification
#[derive(Debug, Default)]
pub struct SanityCheckResult {
    pub harmony_exe_found: bool,
    pub missing_scripts: Vec<String>,
    pub missing_tools: Vec<String>,
}

impl SanityCheckResult {
    /// Host runs are possible
    pub fn host_ok(&self) -> bool {
        self.harmony_exe_found && self.missing_scripts.is_empty()
    }

    /// Returns true if all checks passed
    pub fn is_ok(&self) -> bool {
        self.host_ok() && self.missing_tools.is_empty()
    }

    /// One line per problem found
    pub fn problems(&self, settings: &ToolSettings) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.harmony_exe_found {
            problems.push(format!(
                "Harmony executable not found: {}",
                settings.harmony_exe.display()
            ));
        }
        for script in &self.missing_scripts {
            problems.push(format!("Host script not found: {}", script));
        }
        for tool in &self.missing_tools {
            problems.push(format!("Tool not runnable: {}", tool));
        }
        problems
    }
}

/// Check that `<program> -version` runs and exits 0
fn tool_runs(program: &str) -> bool {
    Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Perform all sanity checks and return the result
pub fn verify_environment(settings: &ToolSettings) -> SanityCheckResult {
    let mut result = SanityCheckResult {
        harmony_exe_found: settings.harmony_exe.is_file(),
        ..SanityCheckResult::default()
    };

    for script in HostScript::iter() {
        let path = settings.script_path(script.profile());
        if !path.is_file() {
            result.missing_scripts.push(path.display().to_string());
        }
    }

    for tool in [&settings.ffmpeg_path, &settings.ffprobe_path] {
        if !tool_runs(tool) {
            debug!("{} -version failed", tool);
            result.missing_tools.push(tool.clone());
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn test_tool_runs_nonexistent() {
        assert!(!tool_runs("this_binary_definitely_does_not_exist_12345"));
    }

    #[test]
    fn test_verify_environment_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = ToolSettings::default();
        settings.harmony_exe = dir.path().join("Harmony.exe");
        settings.scripts_dir = dir.path().to_path_buf();
        settings.ffmpeg_path = "this_binary_definitely_does_not_exist_12345".to_string();
        fs::write(dir.path().join("import_animatic.js"), "").unwrap();

        let result = verify_environment(&settings);
        assert!(!result.harmony_exe_found);
        assert_eq!(result.missing_scripts.len(), 1);
        assert!(result.missing_scripts[0].ends_with("run_scene_setup.js"));
        assert!(result.missing_tools.contains(&settings.ffmpeg_path));
        assert!(!result.is_ok());

        let problems = result.problems(&settings);
        assert!(problems[0].starts_with("Harmony executable not found"));
    }

    #[test]
    fn test_host_ok_ignores_tools() {
        let result = SanityCheckResult {
            harmony_exe_found: true,
            missing_scripts: vec![],
            missing_tools: vec!["ffmpeg".to_string()],
        };
        assert!(result.host_ok());
        assert!(!result.is_ok());
        let settings = ToolSettings {
            harmony_exe: PathBuf::from("h.exe"),
            ..ToolSettings::default()
        };
        assert_eq!(result.problems(&settings), vec!["Tool not runnable: ffmpeg"]);
    }
}
