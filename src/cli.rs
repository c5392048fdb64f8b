use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config_file::DEFAULT_SETTINGS_FILE;

/// harmony-batch - Headless Toon Boom Harmony batch tooling
#[derive(Parser)]
#[command(name = "harmony-batch")]
#[command(about = "Prepare job files and run Toon Boom Harmony scripts headlessly")]
#[command(version)]
pub struct Cli {
    /// Tool settings file (created by `init-settings`)
    #[arg(long, global = true, default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,

    /// Dry-run mode: show what would be executed without making changes.
    ///
    /// Job files, image folders and split movies are not written and the
    /// host is not launched. Inputs are still checked so the preview is
    /// realistic.
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import one animatic movie into one scene
    ImportAnimatic {
        /// Scene file (.xstage)
        #[arg(short, long)]
        scene: PathBuf,
        /// Animatic movie (.mp4)
        #[arg(short, long)]
        animatic: PathBuf,
        /// Scene directory (defaults to the scene file's directory)
        #[arg(long)]
        scene_dir: Option<PathBuf>,
        /// Image folder relative to the scene directory
        #[arg(long)]
        image_subdir: Option<String>,
        /// Prefix of the imported images
        #[arg(long)]
        prefix: Option<String>,
        /// First frame of the imported sequence
        #[arg(long)]
        start_frame: Option<i64>,
        /// Separate audio file
        #[arg(long)]
        audio: Option<PathBuf>,
    },
    /// Import `<animatics_root>/<code>.mp4` into each `<scenes_root>/<code>/<code>.xstage`
    BatchImport {
        /// Scene codes (e.g. C001 C002)
        #[arg(required = true)]
        codes: Vec<String>,
        /// Override `scenes_root` from the settings
        #[arg(long)]
        scenes_root: Option<String>,
        /// Override `animatics_root` from the settings
        #[arg(long)]
        animatics_root: Option<String>,
    },
    /// Assemble a scene (BG, rig, animatic, nodes) from a project config
    SceneSetup {
        /// Scene file (.xstage)
        #[arg(short, long)]
        scene: PathBuf,
        /// Project config JSON
        #[arg(short, long)]
        config: PathBuf,
        /// Scene identifier (scene_id or scene_code)
        #[arg(long)]
        scene_id: String,
        /// Open the scene read-only (preview, nothing is saved)
        #[arg(long)]
        readonly: bool,
    },
    /// Print a scene record with project defaults applied
    Resolve {
        /// Project config JSON
        #[arg(short, long)]
        config: PathBuf,
        /// Scene identifier (scene_id or scene_code)
        #[arg(long)]
        scene_id: String,
        /// Print the resolved plan (absolute paths) instead of the merged record
        #[arg(long)]
        plan: bool,
    },
    /// Run a host script's logic outside the host and print the host calls it would make
    Plan {
        #[command(subcommand)]
        script: PlanCommands,
    },
    /// Split a master animatic into per-scene movies
    Split {
        /// Master movie
        #[arg(short, long)]
        master: PathBuf,
        /// Output directory
        #[arg(short, long)]
        out_dir: PathBuf,
        /// Index of the first scene (C001 = 1)
        #[arg(long, default_value_t = 1)]
        start_index: u32,
        /// File with one frame count per line
        #[arg(long)]
        frames_file: Option<PathBuf>,
        /// Frame counts, one per scene
        counts: Vec<String>,
    },
    /// Check the host executable, host scripts, ffmpeg and ffprobe
    Doctor,
    /// Write a settings file with default values
    InitSettings {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Plan an animatic import from a job file
    ImportAnimatic {
        /// Job file (what TB_JOB would point at)
        #[arg(long)]
        job: Option<PathBuf>,
        /// Directory of the scene open in the host
        #[arg(long)]
        project_dir: Option<String>,
    },
    /// Plan a scene setup from a job file
    SceneSetup {
        /// Job file (what TB_JOB would point at)
        #[arg(long)]
        job: Option<PathBuf>,
        /// Directory of the scene open in the host
        #[arg(long)]
        project_dir: Option<String>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["harmony-batch"]).is_err());
    }

    #[test]
    fn test_cli_global_defaults() {
        let cli = Cli::try_parse_from(["harmony-batch", "doctor"]).unwrap();
        assert_eq!(cli.settings, PathBuf::from("harmony-batch.json"));
        assert!(!cli.dry_run);
        assert!(matches!(cli.command, Commands::Doctor));
    }

    #[test]
    fn test_cli_import_animatic() {
        let cli = Cli::try_parse_from([
            "harmony-batch",
            "--dry-run",
            "import-animatic",
            "--scene",
            "C:/shows/C001/C001.xstage",
            "--animatic",
            "C:/anim/C001.mp4",
            "--start-frame",
            "0",
        ])
        .unwrap();
        assert!(cli.dry_run);
        match cli.command {
            Commands::ImportAnimatic {
                scene,
                animatic,
                start_frame,
                prefix,
                ..
            } => {
                assert_eq!(scene.to_str().unwrap(), "C:/shows/C001/C001.xstage");
                assert_eq!(animatic.to_str().unwrap(), "C:/anim/C001.mp4");
                assert_eq!(start_frame, Some(0));
                assert_eq!(prefix, None);
            }
            _ => panic!("Expected ImportAnimatic command"),
        }
    }

    #[test]
    fn test_cli_batch_import_needs_codes() {
        assert!(Cli::try_parse_from(["harmony-batch", "batch-import"]).is_err());
        let cli = Cli::try_parse_from(["harmony-batch", "batch-import", "C001", "C002"]).unwrap();
        match cli.command {
            Commands::BatchImport { codes, .. } => assert_eq!(codes, vec!["C001", "C002"]),
            _ => panic!("Expected BatchImport command"),
        }
    }

    #[test]
    fn test_cli_scene_setup_with_global_after_subcommand() {
        let cli = Cli::try_parse_from([
            "harmony-batch",
            "scene-setup",
            "-s",
            "S01.xstage",
            "-c",
            "project.json",
            "--scene-id",
            "S01",
            "--readonly",
            "--settings",
            "other.json",
        ])
        .unwrap();
        assert_eq!(cli.settings, PathBuf::from("other.json"));
        match cli.command {
            Commands::SceneSetup { readonly, scene_id, .. } => {
                assert!(readonly);
                assert_eq!(scene_id, "S01");
            }
            _ => panic!("Expected SceneSetup command"),
        }
    }

    #[test]
    fn test_cli_plan_subcommands() {
        let cli = Cli::try_parse_from([
            "harmony-batch",
            "plan",
            "scene-setup",
            "--job",
            "job.json",
        ])
        .unwrap();
        match cli.command {
            Commands::Plan {
                script: PlanCommands::SceneSetup { job, project_dir },
            } => {
                assert_eq!(job, Some(PathBuf::from("job.json")));
                assert!(project_dir.is_none());
            }
            _ => panic!("Expected Plan SceneSetup command"),
        }
    }

    #[test]
    fn test_cli_split() {
        let cli = Cli::try_parse_from([
            "harmony-batch",
            "split",
            "-m",
            "master.mp4",
            "-o",
            "out",
            "48",
            "24",
        ])
        .unwrap();
        match cli.command {
            Commands::Split {
                start_index,
                counts,
                frames_file,
                ..
            } => {
                assert_eq!(start_index, 1);
                assert_eq!(counts, vec!["48", "24"]);
                assert!(frames_file.is_none());
            }
            _ => panic!("Expected Split command"),
        }
    }
}
