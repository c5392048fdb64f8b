//! Config Resolver: scene selection, default merge and path resolution.
//!
//! # Pipeline
//!
//! 1. [`pick_scene`]: first record in document order whose `scene_id` or
//!    `scene_code` equals the requested id
//! 2. [`apply_defaults`]: shallow, per sub-object fill of missing fields
//! 3. [`ScenePlan::from_record`]: every relative path resolved against its
//!    base, literal defaults applied
//!
//! # Path bases
//!
//! | Field                    | Resolved against |
//! |--------------------------|------------------|
//! | `scene_dir`              | `paths.scenes` |
//! | `bg.path`                | `paths.bgs` |
//! | `rig.path`               | `paths.rigs` |
//! | `animatic.path`          | `paths.animatics` |
//! | `animatic.audio_file`    | `paths.animatics` |
//! | `animatic.image_folder`  | scene directory |
//!
//! Each `paths.*` entry is itself resolved against `root_path` and falls back
//! to `root_path` when absent. Image folders follow the scene while source
//! media stays in the shared project tree.

use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::{
    AnimaticSpec, AssetKind, BgSpec, ProjectConfig, ProjectSection, RigSpec, SceneDefaults,
    SceneRecord, setting_value,
};
use crate::error::{BatchError, Result};
use crate::host::Position;
use crate::paths::{join_paths, resolve_path};
use crate::profiles::ScriptProfile;

// ============================================================================
// Scene selection and default merge
// ============================================================================

/// First scene whose `scene_id` or `scene_code` equals `scene_id`.
pub fn pick_scene<'a>(config: &'a ProjectConfig, scene_id: &str) -> Option<&'a SceneRecord> {
    config.scenes.iter().find(|scene| {
        scene.scene_id.as_deref() == Some(scene_id) || scene.scene_code.as_deref() == Some(scene_id)
    })
}

/// Fill missing fields of `dst` from `src`; present values, `null` included,
/// are never touched.
macro_rules! fill_missing {
    ($dst:expr, $src:expr; $($field:ident),+ $(,)?) => {{
        $(
            if $dst.$field.is_none() {
                $dst.$field = $src.$field.clone();
            }
        )+
    }};
}

fn merge_bg(scene: &mut Option<BgSpec>, defaults: &Option<BgSpec>) {
    let Some(d) = defaults else { return };
    match scene {
        None => *scene = Some(d.clone()),
        Some(s) => fill_missing!(s, d; path, node_name, start_frame, convert_to_tvg, drawing_name),
    }
}

fn merge_rig(scene: &mut Option<RigSpec>, defaults: &Option<RigSpec>) {
    let Some(d) = defaults else { return };
    match scene {
        None => *scene = Some(d.clone()),
        Some(s) => fill_missing!(s, d; path, offset),
    }
}

fn merge_animatic(scene: &mut Option<AnimaticSpec>, defaults: &Option<AnimaticSpec>) {
    let Some(d) = defaults else { return };
    match scene {
        None => *scene = Some(d.clone()),
        Some(s) => fill_missing!(s, d; path, image_folder, image_prefix, start_frame, audio_file),
    }
}

/// Merge project defaults into a scene record, independently for `bg`, `rig`
/// and `animatic`.
pub fn apply_defaults(scene: &mut SceneRecord, defaults: &SceneDefaults) {
    merge_bg(&mut scene.bg, &defaults.bg);
    merge_rig(&mut scene.rig, &defaults.rig);
    merge_animatic(&mut scene.animatic, &defaults.animatic);
}

/// Select a scene and merge the project defaults into a copy of it.
pub fn resolve_scene(config: &ProjectConfig, scene_id: &str) -> Result<SceneRecord> {
    let Some(scene) = pick_scene(config, scene_id) else {
        error!(
            "Scene {:?} not found among {} scene record(s)",
            scene_id,
            config.scenes.len()
        );
        return Err(BatchError::SceneNotFound(scene_id.to_string()));
    };
    let mut scene = scene.clone();
    apply_defaults(&mut scene, &config.defaults);
    debug!("Scene {:?} after defaults: {:?}", scene_id, scene);
    Ok(scene)
}

// ============================================================================
// Path bases
// ============================================================================

/// Base directory for an asset kind: its project path resolved against the
/// root, or the root itself.
pub fn asset_base(project: &ProjectSection, kind: AssetKind) -> String {
    let root = project.root();
    match project.paths.get(kind) {
        Some(entry) => resolve_path(entry, root),
        None => root.to_string(),
    }
}

/// Working directory for a scene's relative assets.
///
/// Empty when neither `scene_dir` nor (`scene_id` and a scenes root) is
/// available; callers then fall back to a default relative location.
pub fn resolve_scene_dir(scene: &SceneRecord, project: &ProjectSection) -> String {
    let root = project.root();
    let scenes_root = project
        .paths
        .get(AssetKind::Scenes)
        .map(|entry| resolve_path(entry, root))
        .unwrap_or_default();

    if let Some(dir) = scene.scene_dir.as_deref().filter(|d| !d.is_empty()) {
        return resolve_path(dir, &scenes_root);
    }
    match scene.scene_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) if !scenes_root.is_empty() => join_paths(&scenes_root, id),
        _ => String::new(),
    }
}

// ============================================================================
// Scene plan
// ============================================================================

/// Background drawing, fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedBg {
    pub path: String,
    pub node_name: String,
    pub start_frame: i64,
    pub convert_to_tvg: bool,
    pub drawing_name: String,
}

/// Rig template, fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedRig {
    pub path: String,
    pub offset: Position,
}

/// Animatic import, fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedAnimatic {
    pub path: String,
    pub image_folder: String,
    pub image_prefix: String,
    pub start_frame: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
}

/// Generic node with a type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedNode {
    pub node_type: String,
    pub name: String,
    pub position: Position,
}

/// Everything a scene setup needs, with no relative path left to interpret.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenePlan {
    pub scene_id: Option<String>,
    pub scene_code: Option<String>,
    pub scene_dir: String,
    pub bg: Option<PlannedBg>,
    pub rig: Option<PlannedRig>,
    pub animatic: Option<PlannedAnimatic>,
    pub nodes: Vec<PlannedNode>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

impl ScenePlan {
    /// Resolve a merged scene record. Sub-records whose `path` is missing,
    /// `null` or empty are skipped; any other `null` field takes its literal
    /// default.
    pub fn from_record(scene: &SceneRecord, project: &ProjectSection, profile: &ScriptProfile) -> Self {
        let label = profile.label;
        let scene_dir = resolve_scene_dir(scene, project);
        info!("{} scene dir={:?}", label, scene_dir);

        let bg = match scene.bg.as_ref().and_then(|bg| non_empty(setting_value(&bg.path)).map(|p| (bg, p))) {
            Some((bg, path)) => Some(PlannedBg {
                path: resolve_path(path, &asset_base(project, AssetKind::Bgs)),
                node_name: non_empty(setting_value(&bg.node_name)).unwrap_or("BG").to_string(),
                start_frame: setting_value(&bg.start_frame).copied().unwrap_or(profile.default_start_frame),
                convert_to_tvg: setting_value(&bg.convert_to_tvg).copied().unwrap_or(false),
                drawing_name: non_empty(setting_value(&bg.drawing_name)).unwrap_or("1").to_string(),
            }),
            None => {
                info!("{} BG skip (no path).", label);
                None
            }
        };

        let rig = match scene.rig.as_ref().and_then(|rig| non_empty(setting_value(&rig.path)).map(|p| (rig, p))) {
            Some((rig, path)) => Some(PlannedRig {
                path: resolve_path(path, &asset_base(project, AssetKind::Rigs)),
                offset: setting_value(&rig.offset).copied().unwrap_or_default(),
            }),
            None => {
                info!("{} Rig skip (no path).", label);
                None
            }
        };

        let animatic = match scene
            .animatic
            .as_ref()
            .and_then(|anim| non_empty(setting_value(&anim.path)).map(|p| (anim, p)))
        {
            Some((anim, path)) => {
                let media_base = asset_base(project, AssetKind::Animatics);
                let image_folder = match non_empty(setting_value(&anim.image_folder)) {
                    Some(folder) => resolve_path(folder, &scene_dir),
                    None => join_paths(&scene_dir, profile.default_image_subdir),
                };
                Some(PlannedAnimatic {
                    path: resolve_path(path, &media_base),
                    image_folder,
                    image_prefix: non_empty(setting_value(&anim.image_prefix))
                        .unwrap_or(profile.default_image_prefix)
                        .to_string(),
                    start_frame: setting_value(&anim.start_frame).copied().unwrap_or(profile.default_start_frame),
                    audio_file: non_empty(setting_value(&anim.audio_file)).map(|a| resolve_path(a, &media_base)),
                })
            }
            None => {
                info!("{} Animatic skip (no path).", label);
                None
            }
        };

        let nodes = scene
            .nodes
            .iter()
            .flatten()
            .filter_map(|node| {
                let node_type = non_empty(node.node_type.as_ref())?;
                Some(PlannedNode {
                    node_type: node_type.to_string(),
                    name: node.name.clone().unwrap_or_default(),
                    position: node.position.unwrap_or_default(),
                })
            })
            .collect();

        Self {
            scene_id: scene.scene_id.clone(),
            scene_code: scene.scene_code.clone(),
            scene_dir,
            bg,
            rig,
            animatic,
            nodes,
        }
    }
}

/// Select, merge and resolve a scene in one step.
pub fn plan_scene(config: &ProjectConfig, scene_id: &str, profile: &ScriptProfile) -> Result<ScenePlan> {
    let scene = resolve_scene(config, scene_id)?;
    Ok(ScenePlan::from_record(&scene, &config.project, profile))
}
