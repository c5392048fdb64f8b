//! Scene-setup workflow, as run inside the host in batch mode.
//!
//! Locates the job, then the project config it points to, resolves the
//! requested scene into a [`ScenePlan`] and applies it: background drawing,
//! rig template, animatic import, then generic nodes, in that order.

use tracing::{error, info};

use crate::config::ProjectConfig;
use crate::error::{BatchError, Result};
use crate::host::{EnvironmentReader, HostFs, MediaImporter, SceneGraphBuilder};
use crate::job::{JobDocument, SceneSetupJob};
use crate::locator::locate_file;
use crate::paths::candidates_from_path;
use crate::profiles::{SCENE_SETUP, ScriptProfile};

use super::locate_job;
use super::resolver::{ScenePlan, plan_scene};

/// Run the scene-setup script against the given collaborators and return the
/// plan that was applied.
pub fn run_scene_setup<E, F, M, G>(env: &E, fs: &F, importer: &mut M, graph: &mut G) -> Result<ScenePlan>
where
    E: EnvironmentReader + ?Sized,
    F: HostFs + ?Sized,
    M: MediaImporter + ?Sized,
    G: SceneGraphBuilder + ?Sized,
{
    let profile = &SCENE_SETUP;
    info!("{} START", profile.label);

    let plan = load_scene_plan(env, fs, profile)?;
    apply_scene_plan(&plan, importer, graph, profile)?;

    info!("{} DONE", profile.label);
    Ok(plan)
}

/// Locate job and config and resolve the scene, without touching the host.
pub fn load_scene_plan<E, F>(env: &E, fs: &F, profile: &ScriptProfile) -> Result<ScenePlan>
where
    E: EnvironmentReader + ?Sized,
    F: HostFs + ?Sized,
{
    let job_path = locate_job(env, fs, profile)?;
    info!("{} using jobPath={}", profile.label, job_path);

    let document = JobDocument::from_json_str(&fs.read_text(&job_path)?)?;
    let job = SceneSetupJob::from_document(&document)?;

    let config_path = locate_file(fs, &profile.step("config"), &candidates_from_path(&job.config_path))?;
    info!("{} config={}", profile.label, config_path);

    let config = ProjectConfig::from_json_str(&fs.read_text(&config_path)?)?;
    plan_scene(&config, &job.scene_id, profile)
}

/// Apply a resolved plan through the host collaborators.
pub fn apply_scene_plan<M, G>(
    plan: &ScenePlan,
    importer: &mut M,
    graph: &mut G,
    profile: &ScriptProfile,
) -> Result<()>
where
    M: MediaImporter + ?Sized,
    G: SceneGraphBuilder + ?Sized,
{
    let label = profile.label;

    if let Some(bg) = &plan.bg {
        graph.add_drawing(
            &bg.node_name,
            bg.start_frame,
            &bg.drawing_name,
            &bg.path,
            bg.convert_to_tvg,
        )?;
        info!("{} BG imported: {}", label, bg.path);
    }

    if let Some(rig) = &plan.rig {
        graph.import_template(&rig.path, rig.offset)?;
        info!("{} Rig imported: {}", label, rig.path);
    }

    if let Some(anim) = &plan.animatic {
        importer.set_movie_filename(&anim.path);
        importer.set_image_folder(&anim.image_folder);
        importer.set_image_prefix(&anim.image_prefix);
        importer.set_start_frame(anim.start_frame);
        if let Some(audio) = &anim.audio_file {
            importer.set_audio_file(audio);
        }
        if !importer.do_import() {
            error!("{} importer returned false for {}", label, anim.path);
            return Err(BatchError::import_failed(format!(
                "movie import of {} returned false",
                anim.path
            )));
        }
        info!("{} Animatic imported: {}", label, anim.path);
    }

    for node in &plan.nodes {
        graph.add_node(&node.node_type, &node.name, node.position)?;
    }

    Ok(())
}
