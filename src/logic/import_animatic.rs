//! Import-animatic workflow, as run inside the host in batch mode.
//!
//! 1. Locate the job file (hint from `TB_JOB`, then the script's fallbacks
//!    under the open scene's directory)
//! 2. Validate the job; a missing `animatic_mp4` or `image_folder` fails here,
//!    before any media path is probed
//! 3. Locate the movie among its separator variants
//! 4. Create the image folder and drive the importer

use serde::Serialize;
use tracing::{error, info};

use crate::error::{BatchError, Result};
use crate::host::{EnvironmentReader, HostFs, MediaImporter};
use crate::job::{AnimaticJob, JobDocument};
use crate::locator::locate_file;
use crate::paths::candidates_from_path;
use crate::profiles::{IMPORT_ANIMATIC, ScriptProfile};

use super::locate_job;

/// What was imported, with every path as actually used.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportOutcome {
    pub job_path: String,
    pub media_path: String,
    pub image_folder: String,
    pub image_prefix: String,
    pub start_frame: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
}

/// Run the import-animatic script against the given collaborators.
pub fn run_import_animatic<E, F, M>(env: &E, fs: &F, importer: &mut M) -> Result<ImportOutcome>
where
    E: EnvironmentReader + ?Sized,
    F: HostFs + ?Sized,
    M: MediaImporter + ?Sized,
{
    let profile = &IMPORT_ANIMATIC;
    info!("{} START", profile.label);

    let job_path = locate_job(env, fs, profile)?;
    let document = JobDocument::from_json_str(&fs.read_text(&job_path)?)?;
    let job = AnimaticJob::from_document(&document, profile)?;

    let outcome = import_job(&job, &job_path, fs, importer, profile)?;
    info!("{} DONE", profile.label);
    Ok(outcome)
}

/// Import an already validated job.
pub fn import_job<F, M>(
    job: &AnimaticJob,
    job_path: &str,
    fs: &F,
    importer: &mut M,
    profile: &ScriptProfile,
) -> Result<ImportOutcome>
where
    F: HostFs + ?Sized,
    M: MediaImporter + ?Sized,
{
    let label = profile.label;
    let media_path = locate_file(fs, &profile.step("media"), &candidates_from_path(&job.animatic_mp4))?;

    info!("{} mp4={}", label, media_path);
    info!("{} imageFolder={}", label, job.image_folder);
    info!("{} imagePrefix={}", label, job.image_prefix);
    info!("{} startFrame={}", label, job.start_frame);
    if let Some(audio) = &job.audio_file {
        info!("{} audioFile={}", label, audio);
    }

    fs.create_dir_all(&job.image_folder)?;

    importer.set_movie_filename(&media_path);
    importer.set_image_folder(&job.image_folder);
    importer.set_image_prefix(&job.image_prefix);
    importer.set_start_frame(job.start_frame);
    if let Some(audio) = &job.audio_file {
        importer.set_audio_file(audio);
    }

    if !importer.do_import() {
        error!("{} importer returned false for {}", label, media_path);
        return Err(BatchError::import_failed(format!(
            "movie import of {} returned false",
            media_path
        )));
    }

    Ok(ImportOutcome {
        job_path: job_path.to_string(),
        media_path,
        image_folder: job.image_folder.clone(),
        image_prefix: job.image_prefix.clone(),
        start_frame: job.start_frame,
        audio_file: job.audio_file.clone(),
    })
}
