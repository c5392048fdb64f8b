//! Project configuration: asset locations and per-scene records.
//!
//! Every recognized option is a typed field. Fields of the `bg`, `rig` and
//! `animatic` sub-records are a [`Setting`]: a missing key is `None` and an
//! explicit `null` is `Some(None)`. The default merge in
//! `logic::resolver::apply_defaults` only fills missing keys, so `null`,
//! `start_frame: 0` and `convert_to_tvg: false` all survive it. A `null`
//! section or list reads as empty. Unknown fields are ignored.
//!
//! ```json
//! {
//!   "project": {
//!     "root_path": "C:/shows/pilot",
//!     "paths": { "scenes": "scenes", "bgs": "assets/bg", "rigs": "assets/rigs", "animatics": "animatics" }
//!   },
//!   "defaults": { "bg": { "node_name": "BG", "start_frame": 1 } },
//!   "scenes": [ { "scene_id": "S01", "bg": { "path": "S01_bg.psd" } } ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::Result;
use crate::host::Position;
use crate::paths::strip_bom;

/// Sub-record field: `None` when the key is missing, `Some(None)` when it is
/// `null`.
pub type Setting<T> = Option<Option<T>>;

/// Value of a setting that is present and not `null`.
pub fn setting_value<T>(field: &Setting<T>) -> Option<&T> {
    field.as_ref().and_then(Option::as_ref)
}

/// Present keys always deserialize to `Some`, including `null`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Setting<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `null` reads as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Asset families with their own project path entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum AssetKind {
    Scenes,
    Bgs,
    Rigs,
    Animatics,
}

/// Top-level project config document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub project: ProjectSection,
    #[serde(deserialize_with = "null_as_default")]
    pub defaults: SceneDefaults,
    #[serde(deserialize_with = "null_as_default")]
    pub scenes: Vec<SceneRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    pub root_path: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub paths: ProjectPaths,
}

impl ProjectSection {
    /// Project root, or `""` when unset.
    pub fn root(&self) -> &str {
        self.root_path.as_deref().unwrap_or("")
    }
}

/// Per-asset-type directories, each possibly relative to `root_path`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectPaths {
    pub scenes: Option<String>,
    pub bgs: Option<String>,
    pub rigs: Option<String>,
    pub animatics: Option<String>,
}

impl ProjectPaths {
    /// Non-empty entry for an asset kind.
    pub fn get(&self, kind: AssetKind) -> Option<&str> {
        let entry = match kind {
            AssetKind::Scenes => &self.scenes,
            AssetKind::Bgs => &self.bgs,
            AssetKind::Rigs => &self.rigs,
            AssetKind::Animatics => &self.animatics,
        };
        entry.as_deref().filter(|p| !p.is_empty())
    }
}

/// Sub-records applied to every scene that omits them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDefaults {
    pub bg: Option<BgSpec>,
    pub rig: Option<RigSpec>,
    pub animatic: Option<AnimaticSpec>,
}

/// One scene entry, matched by `scene_id` or `scene_code`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneRecord {
    pub scene_id: Option<String>,
    pub scene_code: Option<String>,
    /// Scene directory, relative to the project's scenes path.
    pub scene_dir: Option<String>,
    pub bg: Option<BgSpec>,
    pub rig: Option<RigSpec>,
    pub animatic: Option<AnimaticSpec>,
    /// `null` entries are kept and skipped when planning.
    #[serde(deserialize_with = "null_as_default")]
    pub nodes: Vec<Option<NodeSpec>>,
}

/// Background image imported as a drawing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BgSpec {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub path: Setting<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub node_name: Setting<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub start_frame: Setting<i64>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub convert_to_tvg: Setting<bool>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub drawing_name: Setting<String>,
}

/// Rig template imported at an offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigSpec {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub path: Setting<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub offset: Setting<Position>,
}

/// Animatic movie imported as an image sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimaticSpec {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub path: Setting<String>,
    /// Relative to the scene directory.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub image_folder: Setting<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub image_prefix: Setting<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub start_frame: Setting<i64>,
    /// Relative to the project's animatics path.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub audio_file: Setting<String>,
}

/// Generic node to create in the scene root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    #[serde(rename = "type")]
    pub node_type: Option<String>,
    pub name: Option<String>,
    pub position: Option<Position>,
}

impl ProjectConfig {
    /// Parse config text, tolerating a leading byte-order mark.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(strip_bom(text))?)
    }

    /// Load a config file from disk.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
