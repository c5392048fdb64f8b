//! Job documents exchanged between the orchestrator and the host scripts.
//!
//! A job file is a small JSON object written right before the host is
//! launched. It is parsed loosely into [`JobDocument`] (every field optional,
//! unknown fields ignored) and then validated into the typed job of the
//! script that consumes it. Validation happens before any media path is
//! probed on disk.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{BatchError, Result};
use crate::paths::{strip_bom, to_forward_slashes};
use crate::profiles::ScriptProfile;

/// Every field any host script reads from a job file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct JobDocument {
    pub animatic_mp4: Option<String>,
    pub image_folder: Option<String>,
    pub image_prefix: Option<String>,
    /// Number or numeric string.
    pub start_frame: Option<Value>,
    pub audio_file: Option<String>,
    pub config_path: Option<String>,
    pub scene_id: Option<String>,
}

impl JobDocument {
    /// Parse job text, tolerating a leading byte-order mark.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let job: Self = serde_json::from_str(strip_bom(text))?;
        debug!("Parsed job document: {:?}", job);
        Ok(job)
    }
}

/// Non-empty string field or `MissingField`.
fn required(value: &Option<String>, field: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(BatchError::missing_field(format!("job.{}", field))),
    }
}

fn optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Interpret a start frame given as a JSON number or numeric string.
///
/// `null` and the empty string count as absent.
pub fn parse_start_frame(value: Option<&Value>) -> Result<Option<i64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .map(Some)
            .ok_or_else(|| BatchError::invalid_field("start_frame", n.to_string())),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| BatchError::invalid_field("start_frame", format!("not a number: {:?}", s))),
        Some(other) => Err(BatchError::invalid_field(
            "start_frame",
            format!("unexpected value {}", other),
        )),
    }
}

// ============================================================================
// Import animatic job
// ============================================================================

/// Job consumed by the import-animatic script.
///
/// Paths are stored with forward slashes, the form the host handles best.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimaticJob {
    pub animatic_mp4: String,
    pub image_folder: String,
    pub image_prefix: String,
    pub start_frame: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
}

impl AnimaticJob {
    /// Validate a loose document, filling the script's defaults.
    pub fn from_document(doc: &JobDocument, profile: &ScriptProfile) -> Result<Self> {
        let animatic_mp4 = to_forward_slashes(&required(&doc.animatic_mp4, "animatic_mp4")?);
        let image_folder = to_forward_slashes(&required(&doc.image_folder, "image_folder")?);
        let image_prefix =
            optional(&doc.image_prefix).unwrap_or_else(|| profile.default_image_prefix.to_string());
        let start_frame =
            parse_start_frame(doc.start_frame.as_ref())?.unwrap_or(profile.default_start_frame);
        let audio_file = optional(&doc.audio_file).map(|a| to_forward_slashes(&a));

        Ok(Self {
            animatic_mp4,
            image_folder,
            image_prefix,
            start_frame,
            audio_file,
        })
    }
}

// ============================================================================
// Scene setup job
// ============================================================================

/// Job consumed by the scene-setup script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSetupJob {
    pub config_path: String,
    pub scene_id: String,
}

impl SceneSetupJob {
    pub fn from_document(doc: &JobDocument) -> Result<Self> {
        Ok(Self {
            config_path: required(&doc.config_path, "config_path")?,
            scene_id: required(&doc.scene_id, "scene_id")?,
        })
    }
}

// ============================================================================
// Writing
// ============================================================================

/// Write a job as pretty JSON (no byte-order mark), creating parent dirs.
pub fn write_job<T: Serialize, P: AsRef<Path>>(path: P, job: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(job)?;
    fs::write(path, json)?;
    debug!("Wrote job file {:?}", path);
    Ok(())
}
