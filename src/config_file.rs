//! Tool settings file handling.
//!
//! The settings file tells the orchestrator where the host executable, the
//! host scripts and ffmpeg live, plus the default project roots. A missing
//! file means defaults; a present but malformed file is an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::profiles::ScriptProfile;

/// Default settings file name, looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "harmony-batch.json";

/// Operator settings that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    // External tools
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub harmony_exe: PathBuf,
    /// Directory holding the host scripts (`import_animatic.js`, ...)
    pub scripts_dir: PathBuf,

    // Project roots (empty = unset)
    pub scenes_root: String,
    pub animatics_root: String,

    // Media
    /// Frame rate assumed when ffprobe cannot report one
    pub fps: u32,

    // Batch runs
    pub batch_timeout_secs: Option<u64>,
    pub log_dir: Option<PathBuf>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            harmony_exe: PathBuf::from(
                r"C:\Program Files\Toon Boom Harmony 24\win64\bin\Harmony.exe",
            ),
            scripts_dir: PathBuf::from("harmony_scripts"),
            scenes_root: String::new(),
            animatics_root: String::new(),
            fps: 24,
            batch_timeout_secs: None,
            log_dir: None,
        }
    }
}

impl ToolSettings {
    /// Save settings to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize settings to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write settings to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load settings from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {:?}", path.as_ref()))?;

        let settings: Self = serde_json::from_str(crate::paths::strip_bom(&content))
            .context("Failed to parse settings JSON")?;

        Ok(settings)
    }

    /// Load settings if the file exists, defaults otherwise
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No settings at {:?}, using defaults", path.as_ref());
            Ok(Self::default())
        }
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.ffmpeg_path.trim().is_empty() {
            anyhow::bail!("ffmpeg_path must be specified");
        }
        if self.ffprobe_path.trim().is_empty() {
            anyhow::bail!("ffprobe_path must be specified");
        }
        if self.harmony_exe.as_os_str().is_empty() {
            anyhow::bail!("harmony_exe must be specified");
        }
        if self.fps == 0 {
            anyhow::bail!("fps must be greater than zero");
        }
        if self.batch_timeout_secs == Some(0) {
            anyhow::bail!("batch_timeout_secs must be greater than zero when set");
        }
        Ok(())
    }

    /// Full path of a host script
    pub fn script_path(&self, profile: &ScriptProfile) -> PathBuf {
        self.scripts_dir.join(profile.file_name)
    }

    /// Batch timeout, if configured
    pub fn batch_timeout(&self) -> Option<Duration> {
        self.batch_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::{IMPORT_ANIMATIC, SCENE_SETUP};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_settings_default() {
        let settings = ToolSettings::default();
        assert_eq!(settings.ffmpeg_path, "ffmpeg");
        assert_eq!(settings.ffprobe_path, "ffprobe");
        assert_eq!(settings.fps, 24);
        assert!(settings.batch_timeout().is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let mut settings = ToolSettings::default();
        settings.scenes_root = "C:/shows/pilot/scenes".to_string();
        settings.batch_timeout_secs = Some(600);

        let file = NamedTempFile::new().unwrap();
        settings.save_to_file(file.path()).unwrap();
        let loaded = ToolSettings::load_from_file(file.path()).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.batch_timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "\u{feff}{{\"ffmpeg_path\": \"C:/ffmpeg/bin/ffmpeg.exe\"}}").unwrap();
        let loaded = ToolSettings::load_from_file(file.path()).unwrap();
        assert_eq!(loaded.ffmpeg_path, "C:/ffmpeg/bin/ffmpeg.exe");
        assert_eq!(loaded.ffprobe_path, "ffprobe");
        assert_eq!(loaded.fps, 24);
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(ToolSettings::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ToolSettings::load_or_default(dir.path().join("absent.json")).unwrap();
        assert_eq!(loaded, ToolSettings::default());
    }

    #[test]
    fn test_validation_rejects_zero_fps_and_timeout() {
        let mut settings = ToolSettings::default();
        settings.fps = 0;
        assert!(settings.validate().is_err());

        let mut settings = ToolSettings::default();
        settings.batch_timeout_secs = Some(0);
        assert!(settings.validate().is_err());

        let mut settings = ToolSettings::default();
        settings.ffmpeg_path = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_script_path() {
        let mut settings = ToolSettings::default();
        settings.scripts_dir = PathBuf::from("/opt/tb/scripts");
        assert_eq!(
            settings.script_path(&IMPORT_ANIMATIC),
            PathBuf::from("/opt/tb/scripts/import_animatic.js")
        );
        assert_eq!(
            settings.script_path(&SCENE_SETUP),
            PathBuf::from("/opt/tb/scripts/run_scene_setup.js")
        );
    }
}
