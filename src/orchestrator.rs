//! Outside-the-host orchestration.
//!
//! Each operation writes a job file next to the scene and launches the host
//! headlessly with `TB_JOB` pointing at it. The host scripts then run the
//! workflows in [`crate::logic`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::batch::{BatchOutput, file_timestamp, run_script};
use crate::config::ProjectConfig;
use crate::config_file::ToolSettings;
use crate::error::{BatchError, Result};
use crate::job::{AnimaticJob, SceneSetupJob, write_job};
use crate::logic::resolver::resolve_scene;
use crate::paths::to_forward_slashes;
use crate::profiles::{IMPORT_ANIMATIC, JOBS_DIR, SCENE_SETUP};
use crate::scripts::animatic::ImportAnimaticArgs;
use crate::scripts::scene_setup::SceneSetupArgs;

/// Job file name used by the batch importer, inside each scene dir.
pub const BATCH_ANIMATIC_JOB: &str = "_job_animatic.json";

/// Job file name used by scene setup, inside `<scene_dir>/_tb_jobs`.
pub const SCENE_SETUP_JOB: &str = "_tb_job_scene_setup.json";

fn path_string(path: &Path) -> String {
    to_forward_slashes(&path.to_string_lossy())
}

fn require_file(label: &str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(BatchError::not_found(label, &[path_string(path)]))
    }
}

fn require_root<'a>(value: &'a str, name: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        Err(BatchError::validation(format!("{} is not set", name)))
    } else {
        Ok(value)
    }
}

/// Result of one orchestrated host run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub scene_file: PathBuf,
    pub job_path: PathBuf,
    pub output: BatchOutput,
}

// ============================================================================
// Animatic import
// ============================================================================

/// Parameters of a single animatic import.
#[derive(Debug, Clone, Default)]
pub struct AnimaticImportRequest {
    pub scene_file: PathBuf,
    pub animatic: PathBuf,
    /// Defaults to the scene file's directory.
    pub scene_dir: Option<PathBuf>,
    /// Relative to the scene dir. Defaults to `elements/animatic`.
    pub image_subdir: Option<String>,
    pub image_prefix: Option<String>,
    pub start_frame: Option<i64>,
    pub audio_file: Option<PathBuf>,
}

impl AnimaticImportRequest {
    pub fn new(scene_file: impl Into<PathBuf>, animatic: impl Into<PathBuf>) -> Self {
        Self {
            scene_file: scene_file.into(),
            animatic: animatic.into(),
            ..Self::default()
        }
    }

    fn scene_dir(&self) -> PathBuf {
        match &self.scene_dir {
            Some(dir) => dir.clone(),
            None => self
                .scene_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }

    /// Build the job the host script will read.
    pub fn to_job(&self) -> AnimaticJob {
        let subdir = self
            .image_subdir
            .as_deref()
            .unwrap_or(IMPORT_ANIMATIC.default_image_subdir);
        AnimaticJob {
            animatic_mp4: path_string(&self.animatic),
            image_folder: path_string(&self.scene_dir().join(subdir)),
            image_prefix: self
                .image_prefix
                .clone()
                .unwrap_or_else(|| IMPORT_ANIMATIC.default_image_prefix.to_string()),
            start_frame: self.start_frame.unwrap_or(IMPORT_ANIMATIC.default_start_frame),
            audio_file: self.audio_file.as_deref().map(path_string),
        }
    }
}

fn run_import(
    settings: &ToolSettings,
    scene_file: &Path,
    job: &AnimaticJob,
    job_path: PathBuf,
    dry_run: bool,
) -> Result<RunReport> {
    if dry_run {
        info!("[DRY RUN] would create {} and write {:?}", job.image_folder, job_path);
    } else {
        fs::create_dir_all(&job.image_folder)?;
        write_job(&job_path, job)?;
    }

    let args = ImportAnimaticArgs {
        job_path: job_path.clone(),
    };
    let output = run_script(settings, scene_file, &args, dry_run)?;
    output.ensure_success(IMPORT_ANIMATIC.label)?;

    Ok(RunReport {
        scene_file: scene_file.to_path_buf(),
        job_path,
        output,
    })
}

/// Import one movie into one scene.
///
/// Writes `<scene_dir>/_tb_jobs/job_import_animatic_<stem>_<timestamp>.json`
/// and runs the import script against the scene.
pub fn import_animatic_to_scene(
    settings: &ToolSettings,
    request: &AnimaticImportRequest,
    dry_run: bool,
) -> Result<RunReport> {
    require_file("Animatic", &request.animatic)?;
    if let Some(audio) = &request.audio_file {
        require_file("Audio file", audio)?;
    }

    let job = request.to_job();
    let stem = request
        .scene_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scene".to_string());
    let job_path = request.scene_dir().join(JOBS_DIR).join(format!(
        "job_import_animatic_{}_{}.json",
        stem,
        file_timestamp()
    ));

    info!(
        "import_animatic_to_scene: scene={:?} animatic={} image_folder={}",
        request.scene_file, job.animatic_mp4, job.image_folder
    );
    run_import(settings, &request.scene_file, &job, job_path, dry_run)
}

/// Import `<animatics_root>/<code>.mp4` into `<scenes_root>/<code>/<code>.xstage`
/// for every scene code, in order. Stops at the first failure.
pub fn batch_import_animatics(
    settings: &ToolSettings,
    scene_codes: &[String],
    dry_run: bool,
) -> Result<Vec<RunReport>> {
    let scenes_root = PathBuf::from(require_root(&settings.scenes_root, "scenes_root")?);
    let animatics_root = PathBuf::from(require_root(&settings.animatics_root, "animatics_root")?);
    if scene_codes.is_empty() {
        return Err(BatchError::validation("no scene codes given"));
    }

    let mut reports = Vec::with_capacity(scene_codes.len());
    for (i, code) in scene_codes.iter().enumerate() {
        let code = code.trim();
        info!("=== [{}/{}] {} ===", i + 1, scene_codes.len(), code);

        let scene_dir = scenes_root.join(code);
        let scene_file = scene_dir.join(format!("{}.xstage", code));
        let animatic = animatics_root.join(format!("{}.mp4", code));
        require_file("Scene file", &scene_file)?;
        require_file("Animatic", &animatic)?;

        let request = AnimaticImportRequest {
            scene_dir: Some(scene_dir.clone()),
            ..AnimaticImportRequest::new(&scene_file, &animatic)
        };
        let job = request.to_job();
        let report = run_import(
            settings,
            &scene_file,
            &job,
            scene_dir.join(BATCH_ANIMATIC_JOB),
            dry_run,
        )?;
        reports.push(report);
    }

    info!("Batch import finished: {} scene(s)", reports.len());
    Ok(reports)
}

// ============================================================================
// Scene setup
// ============================================================================

/// Parameters of a scene setup run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneSetupRequest {
    pub scene_file: PathBuf,
    pub config_path: PathBuf,
    pub scene_id: String,
    pub readonly: bool,
}

/// Assemble a scene from the project config.
///
/// The config is loaded and the scene resolved up front, so a bad config or
/// an unknown scene id fails before the host is launched.
pub fn setup_scene(
    settings: &ToolSettings,
    request: &SceneSetupRequest,
    dry_run: bool,
) -> Result<RunReport> {
    require_file("Scene file", &request.scene_file)?;
    let config = ProjectConfig::load_from_file(&request.config_path)?;
    resolve_scene(&config, &request.scene_id)?;

    let scene_dir = request
        .scene_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let job_path = scene_dir.join(JOBS_DIR).join(SCENE_SETUP_JOB);
    let job = SceneSetupJob {
        config_path: path_string(&request.config_path),
        scene_id: request.scene_id.clone(),
    };

    if dry_run {
        info!("[DRY RUN] would write {:?}", job_path);
    } else {
        write_job(&job_path, &job)?;
    }

    let args = SceneSetupArgs {
        job_path: job_path.clone(),
        readonly: request.readonly,
    };
    let output = run_script(settings, &request.scene_file, &args, dry_run)?;
    output.ensure_success(SCENE_SETUP.label)?;

    Ok(RunReport {
        scene_file: request.scene_file.clone(),
        job_path,
        output,
    })
}
