//! harmony-batch - Main entry point
//!
//! Parses the command line, loads the tool settings and dispatches to the
//! library. Errors surface here as `anyhow` chains and a nonzero exit.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{debug, info};

use harmony_batch::cli::{Cli, Commands, PlanCommands};
use harmony_batch::config::ProjectConfig;
use harmony_batch::config_file::ToolSettings;
use harmony_batch::host::{
    DryRunFs, EnvironmentReader, HostCall, HostRecorder, ProcessEnvironment, StaticEnvironment,
};
use harmony_batch::logic::import_animatic::run_import_animatic;
use harmony_batch::logic::resolver::{plan_scene, resolve_scene};
use harmony_batch::logic::scene_setup::{apply_scene_plan, load_scene_plan};
use harmony_batch::orchestrator::{
    AnimaticImportRequest, RunReport, SceneSetupRequest, batch_import_animatics,
    import_animatic_to_scene, setup_scene,
};
use harmony_batch::profiles::{IMPORT_ANIMATIC, JOB_ENV_VAR, SCENE_SETUP};
use harmony_batch::sanity::verify_environment;
use harmony_batch::splitter::{SplitRequest, parse_frame_count, split_master};

/// Initialize the tracing subscriber: `RUST_LOG` overrides, `info` otherwise.
fn init_logger() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();
}

fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");
    let dry_run = cli.dry_run;
    if dry_run {
        info!("Dry-run mode: nothing will be written and the host will not be launched");
    }

    match cli.command {
        Commands::ImportAnimatic {
            scene,
            animatic,
            scene_dir,
            image_subdir,
            prefix,
            start_frame,
            audio,
        } => {
            let settings = load_settings(&cli.settings)?;
            let request = AnimaticImportRequest {
                scene_dir,
                image_subdir,
                image_prefix: prefix,
                start_frame,
                audio_file: audio,
                ..AnimaticImportRequest::new(scene, animatic)
            };
            let report = import_animatic_to_scene(&settings, &request, dry_run)?;
            print_report(&report);
        }
        Commands::BatchImport {
            codes,
            scenes_root,
            animatics_root,
        } => {
            let mut settings = load_settings(&cli.settings)?;
            if let Some(root) = scenes_root {
                settings.scenes_root = root;
            }
            if let Some(root) = animatics_root {
                settings.animatics_root = root;
            }
            let reports = batch_import_animatics(&settings, &codes, dry_run)?;
            for report in &reports {
                print_report(report);
            }
            println!("✓ {} scene(s) imported", reports.len());
        }
        Commands::SceneSetup {
            scene,
            config,
            scene_id,
            readonly,
        } => {
            let settings = load_settings(&cli.settings)?;
            let request = SceneSetupRequest {
                scene_file: scene,
                config_path: config,
                scene_id,
                readonly,
            };
            let report = setup_scene(&settings, &request, dry_run)?;
            print_report(&report);
        }
        Commands::Resolve {
            config,
            scene_id,
            plan,
        } => {
            let config = ProjectConfig::load_from_file(&config)
                .with_context(|| format!("Failed to load project config {:?}", config))?;
            if plan {
                print_json(&plan_scene(&config, &scene_id, &SCENE_SETUP)?)?;
            } else {
                print_json(&resolve_scene(&config, &scene_id)?)?;
            }
        }
        Commands::Plan { script } => run_plan(script)?,
        Commands::Split {
            master,
            out_dir,
            start_index,
            frames_file,
            counts,
        } => {
            let settings = load_settings(&cli.settings)?;
            let mut entries = Vec::new();
            if let Some(file) = frames_file {
                let text = fs::read_to_string(&file)
                    .with_context(|| format!("Failed to read frame counts from {:?}", file))?;
                entries.extend(text.lines().map(str::to_string));
            }
            entries.extend(counts);
            let frame_counts = entries
                .iter()
                .filter(|line| !line.trim().is_empty())
                .map(|line| parse_frame_count(line))
                .collect::<harmony_batch::Result<Vec<_>>>()?;

            let request = SplitRequest {
                master,
                out_dir,
                frame_counts,
                start_index,
                ffmpeg: settings.ffmpeg_path.clone(),
                ffprobe: settings.ffprobe_path.clone(),
                fallback_fps: f64::from(settings.fps),
            };
            let written = split_master(&request, dry_run)?;
            for path in &written {
                println!("{}", path.display());
            }
            println!("✓ {} movie(s) generated", written.len());
        }
        Commands::Doctor => {
            let settings = load_settings(&cli.settings)?;
            let result = verify_environment(&settings);
            if result.is_ok() {
                println!("✓ Environment OK");
            } else {
                let problems = result.problems(&settings);
                for problem in &problems {
                    eprintln!("✗ {}", problem);
                }
                bail!("{} problem(s) found", problems.len());
            }
        }
        Commands::InitSettings { force } => {
            if cli.settings.exists() && !force {
                bail!(
                    "{:?} already exists (use --force to overwrite)",
                    cli.settings
                );
            }
            ToolSettings::default().save_to_file(&cli.settings)?;
            println!("✓ Settings written to {}", cli.settings.display());
        }
    }

    Ok(())
}

fn load_settings(path: &Path) -> Result<ToolSettings> {
    let settings = ToolSettings::load_or_default(path)?;
    settings
        .validate()
        .with_context(|| format!("Invalid settings in {:?}", path))?;
    Ok(settings)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_report(report: &RunReport) {
    if report.output.dry_run {
        println!("[DRY RUN] {}", report.output.cmd);
        return;
    }
    println!("✓ {}", report.scene_file.display());
    println!("  job: {}", report.job_path.display());
    if let Some(log) = &report.output.log_path {
        println!("  log: {}", log.display());
    }
}

#[derive(Serialize)]
struct ImportPreview<'a, T: Serialize> {
    result: T,
    calls: &'a [HostCall],
}

#[derive(Serialize)]
struct SceneSetupPreview<'a, T: Serialize> {
    plan: T,
    graph_calls: &'a [HostCall],
    import_calls: &'a [HostCall],
}

/// Run a host script's logic against a recording host and print what it did.
fn run_plan(script: PlanCommands) -> Result<()> {
    let (job, project_dir) = match &script {
        PlanCommands::ImportAnimatic { job, project_dir }
        | PlanCommands::SceneSetup { job, project_dir } => (job.clone(), project_dir.clone()),
    };

    // --job overrides TB_JOB from the process environment
    let process = ProcessEnvironment {
        project_path: project_dir.clone(),
    };
    let fixed;
    let env: &dyn EnvironmentReader = match job {
        Some(job) => {
            let mut static_env = StaticEnvironment::new().with_var(JOB_ENV_VAR, job.to_string_lossy());
            if let Some(dir) = project_dir {
                static_env = static_env.with_project_path(dir);
            }
            fixed = static_env;
            &fixed
        }
        None => &process,
    };

    match script {
        PlanCommands::ImportAnimatic { .. } => {
            let mut importer = HostRecorder::new();
            let outcome = run_import_animatic(env, &DryRunFs, &mut importer)
                .with_context(|| format!("{} plan failed", IMPORT_ANIMATIC.label))?;
            print_json(&ImportPreview {
                result: outcome,
                calls: &importer.calls,
            })
        }
        PlanCommands::SceneSetup { .. } => {
            let plan = load_scene_plan(env, &DryRunFs, &SCENE_SETUP)
                .with_context(|| format!("{} plan failed", SCENE_SETUP.label))?;
            let mut importer = HostRecorder::new();
            let mut graph = HostRecorder::new();
            apply_scene_plan(&plan, &mut importer, &mut graph, &SCENE_SETUP)?;
            print_json(&SceneSetupPreview {
                plan: &plan,
                graph_calls: &graph.calls,
                import_calls: &importer.calls,
            })
        }
    }
}
