//! Tests for the host-side workflows
//!
//! The workflows run against an in-memory filesystem (Windows-style paths,
//! probe log) or the real one (tempfile), a static environment and a
//! recording host. These tests verify:
//! - Job location through TB_JOB and the per-script fallbacks
//! - Validation before any media probing
//! - Importer call order and the image folder side effect
//! - Scene setup from a project config, end to end

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;

use harmony_batch::error::{BatchError, Result};
use harmony_batch::host::{
    HostCall, HostFs, HostRecorder, LocalFs, Position, StaticEnvironment,
};
use harmony_batch::locator::PathProbe;
use harmony_batch::logic::import_animatic::run_import_animatic;
use harmony_batch::logic::scene_setup::run_scene_setup;
use harmony_batch::paths::candidates_from_path;

// =============================================================================
// In-memory host filesystem
// =============================================================================

#[derive(Default)]
struct MemFs {
    files: HashMap<String, String>,
    created: RefCell<Vec<String>>,
    probes: RefCell<Vec<String>>,
}

impl MemFs {
    fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }
}

impl PathProbe for MemFs {
    fn exists(&self, path: &str) -> bool {
        self.probes.borrow_mut().push(path.to_string());
        self.files.contains_key(path)
    }
}

impl HostFs for MemFs {
    fn read_text(&self, path: &str) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            BatchError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                path.to_string(),
            ))
        })
    }

    fn create_dir_all(&self, path: &str) -> Result<()> {
        self.created.borrow_mut().push(path.to_string());
        Ok(())
    }
}

// =============================================================================
// Import animatic
// =============================================================================

#[test]
fn test_import_end_to_end() {
    let fs = MemFs::default()
        .with_file(
            "job.json",
            r#"{"animatic_mp4": "anim.mp4", "image_folder": "out", "start_frame": 1}"#,
        )
        .with_file("anim.mp4", "");
    let env = StaticEnvironment::new().with_var("TB_JOB", "job.json");
    let mut importer = HostRecorder::new();

    let outcome = run_import_animatic(&env, &fs, &mut importer).unwrap();

    assert!(candidates_from_path("anim.mp4")[..3].contains(&outcome.media_path));
    assert_eq!(*fs.created.borrow(), vec!["out".to_string()]);
    assert_eq!(
        importer.calls,
        vec![
            HostCall::SetMovieFilename { path: "anim.mp4".into() },
            HostCall::SetImageFolder { path: "out".into() },
            HostCall::SetImagePrefix { prefix: "ANIM_".into() },
            HostCall::SetStartFrame { frame: 1 },
            HostCall::DoImport,
        ]
    );
}

#[test]
fn test_missing_animatic_fails_before_media_probe() {
    let fs = MemFs::default().with_file("job.json", r#"{"image_folder": "out"}"#);
    let env = StaticEnvironment::new().with_var("TB_JOB", "job.json");
    let mut importer = HostRecorder::new();

    let err = run_import_animatic(&env, &fs, &mut importer).unwrap_err();

    assert!(matches!(err, BatchError::MissingField(ref f) if f == "job.animatic_mp4"));
    assert!(fs.probes.borrow().iter().all(|p| p.ends_with("job.json")));
    assert!(fs.created.borrow().is_empty());
    assert!(importer.calls.is_empty());
}

#[test]
fn test_job_hint_matched_through_separator_variant() {
    let fs = MemFs::default()
        .with_file(
            r"C:\shows\C01\_tb_jobs\job.json",
            r#"{"animatic_mp4": "C:\\anim\\C01.mp4", "image_folder": "C:/shows/C01/elements/animatic", "start_frame": "0", "audio_file": "C:\\anim\\C01.wav"}"#,
        )
        .with_file("file:///C:/anim/C01.mp4", "");
    let env = StaticEnvironment::new().with_var("TB_JOB", "C:/shows/C01/_tb_jobs/job.json");
    let mut importer = HostRecorder::new();

    let outcome = run_import_animatic(&env, &fs, &mut importer).unwrap();

    assert_eq!(outcome.job_path, r"C:\shows\C01\_tb_jobs\job.json");
    assert_eq!(outcome.media_path, "file:///C:/anim/C01.mp4");
    assert_eq!(outcome.start_frame, 0);
    assert_eq!(outcome.audio_file.as_deref(), Some("C:/anim/C01.wav"));
    assert!(importer.calls.contains(&HostCall::SetAudioFile {
        path: "C:/anim/C01.wav".into()
    }));
}

#[test]
fn test_job_found_through_project_fallback() {
    let fs = MemFs::default()
        .with_file(
            "C:/shows/C02/_job_animatic.json",
            r#"{"animatic_mp4": "a.mp4", "image_folder": "out"}"#,
        )
        .with_file("a.mp4", "");
    let env = StaticEnvironment::new().with_project_path("C:/shows/C02");
    let mut importer = HostRecorder::new();

    let outcome = run_import_animatic(&env, &fs, &mut importer).unwrap();
    assert_eq!(outcome.job_path, "C:/shows/C02/_job_animatic.json");

    // The first fallback was probed in both separator forms before the second
    let probes = fs.probes.borrow();
    assert_eq!(probes[0], "C:/shows/C02/_tb_jobs/_tb_job_import_animatic.json");
    assert_eq!(probes[1], r"C:\shows\C02\_tb_jobs\_tb_job_import_animatic.json");
    assert_eq!(probes[2], "C:/shows/C02/_job_animatic.json");
}

#[test]
fn test_no_hint_and_no_project_is_missing_hint() {
    let fs = MemFs::default();
    let env = StaticEnvironment::new();
    let err = run_import_animatic(&env, &fs, &mut HostRecorder::new()).unwrap_err();
    assert!(matches!(err, BatchError::MissingHint(_)));
    assert!(fs.probes.borrow().is_empty());
}

#[test]
fn test_media_not_found_lists_candidates() {
    let fs = MemFs::default().with_file(
        "job.json",
        r#"{"animatic_mp4": "D:/anim/missing.mp4", "image_folder": "out"}"#,
    );
    let env = StaticEnvironment::new().with_var("TB_JOB", "job.json");

    let err = run_import_animatic(&env, &fs, &mut HostRecorder::new()).unwrap_err();
    match err {
        BatchError::NotFound { label, tried } => {
            assert_eq!(label, "[import_animatic] media");
            assert_eq!(tried, candidates_from_path("D:/anim/missing.mp4"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_importer_failure_is_import_failed() {
    let fs = MemFs::default()
        .with_file("job.json", r#"{"animatic_mp4": "a.mp4", "image_folder": "out"}"#)
        .with_file("a.mp4", "");
    let env = StaticEnvironment::new().with_var("TB_JOB", "job.json");
    let mut importer = HostRecorder::failing();

    let err = run_import_animatic(&env, &fs, &mut importer).unwrap_err();
    assert!(matches!(err, BatchError::ImportFailed(_)));
    assert_eq!(importer.calls.last(), Some(&HostCall::DoImport));
}

#[test]
fn test_import_on_local_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_string_lossy().replace('\\', "/");
    let movie = format!("{}/C01.mp4", root);
    let folder = format!("{}/C01/elements/animatic", root);
    let job = format!("{}/job.json", root);
    fs::write(&movie, b"").unwrap();
    fs::write(
        &job,
        format!(
            "\u{feff}{{\"animatic_mp4\": \"{}\", \"image_folder\": \"{}\", \"image_prefix\": \"C01_\"}}",
            movie, folder
        ),
    )
    .unwrap();

    let env = StaticEnvironment::new().with_var("TB_JOB", &job);
    let mut importer = HostRecorder::new();
    let outcome = run_import_animatic(&env, &LocalFs, &mut importer).unwrap();

    assert_eq!(outcome.media_path, movie);
    assert_eq!(outcome.image_prefix, "C01_");
    assert!(std::path::Path::new(&folder).is_dir());
}

// =============================================================================
// Scene setup
// =============================================================================

const PROJECT: &str = r#"{
    "project": {
        "root_path": "C:/shows/pilot",
        "paths": { "scenes": "scenes", "bgs": "assets/bg", "rigs": "D:/rigs", "animatics": "anim" }
    },
    "defaults": {
        "bg": { "node_name": "BG_MAIN", "start_frame": 5 },
        "rig": { "path": "hero.tpl", "offset": { "x": 1.5 } },
        "animatic": { "image_prefix": "A_", "start_frame": 0 }
    },
    "scenes": [
        { "scene_id": "S00", "bg": { "path": "s00.png" } },
        {
            "scene_code": "S01",
            "scene_dir": "S01_dir",
            "bg": { "path": "s01.png", "convert_to_tvg": false },
            "animatic": { "path": "S01.mp4", "audio_file": "S01.wav" },
            "nodes": [
                { "type": "PEG", "name": "Root", "position": { "x": 10, "y": 20 } },
                { "name": "untyped" }
            ]
        }
    ]
}"#;

#[test]
fn test_scene_setup_end_to_end() {
    let fs = MemFs::default()
        .with_file(
            "C:/shows/pilot/scenes/S01_dir/_tb_jobs/_tb_job_scene_setup.json",
            r#"{"config_path": "C:\\shows\\pilot\\project.json", "scene_id": "S01"}"#,
        )
        .with_file("C:/shows/pilot/project.json", PROJECT);
    let env = StaticEnvironment::new().with_project_path("C:/shows/pilot/scenes/S01_dir");
    let mut importer = HostRecorder::new();
    let mut graph = HostRecorder::new();

    let plan = run_scene_setup(&env, &fs, &mut importer, &mut graph).unwrap();

    assert_eq!(plan.scene_code.as_deref(), Some("S01"));
    assert_eq!(plan.scene_dir, "C:/shows/pilot/scenes/S01_dir");
    assert_eq!(
        graph.calls,
        vec![
            HostCall::AddDrawing {
                node_name: "BG_MAIN".into(),
                start_frame: 5,
                drawing_name: "1".into(),
                path: "C:/shows/pilot/assets/bg/s01.png".into(),
                convert_to_tvg: false,
            },
            HostCall::ImportTemplate {
                path: "D:/rigs/hero.tpl".into(),
                position: Position { x: 1.5, y: 0.0, z: 0.0 },
            },
            HostCall::AddNode {
                node_type: "PEG".into(),
                name: "Root".into(),
                position: Position { x: 10.0, y: 20.0, z: 0.0 },
            },
        ]
    );
    assert_eq!(
        importer.calls,
        vec![
            HostCall::SetMovieFilename { path: "C:/shows/pilot/anim/S01.mp4".into() },
            HostCall::SetImageFolder {
                path: "C:/shows/pilot/scenes/S01_dir/elements/animatic".into()
            },
            HostCall::SetImagePrefix { prefix: "A_".into() },
            HostCall::SetStartFrame { frame: 0 },
            HostCall::SetAudioFile { path: "C:/shows/pilot/anim/S01.wav".into() },
            HostCall::DoImport,
        ]
    );
}

#[test]
fn test_scene_setup_unknown_scene() {
    let fs = MemFs::default()
        .with_file("job.json", r#"{"config_path": "project.json", "scene_id": "S99"}"#)
        .with_file("project.json", PROJECT);
    let env = StaticEnvironment::new().with_var("TB_JOB", "job.json");

    let err = run_scene_setup(&env, &fs, &mut HostRecorder::new(), &mut HostRecorder::new())
        .unwrap_err();
    assert!(matches!(err, BatchError::SceneNotFound(ref id) if id == "S99"));
}

#[test]
fn test_scene_setup_job_requires_fields() {
    let fs = MemFs::default().with_file("job.json", r#"{"scene_id": "S01"}"#);
    let env = StaticEnvironment::new().with_var("TB_JOB", "job.json");

    let err = run_scene_setup(&env, &fs, &mut HostRecorder::new(), &mut HostRecorder::new())
        .unwrap_err();
    assert!(matches!(err, BatchError::MissingField(ref f) if f == "job.config_path"));
}

#[test]
fn test_scene_setup_missing_config_lists_variants() {
    let fs = MemFs::default().with_file(
        "job.json",
        r#"{"config_path": "C:/shows/none.json", "scene_id": "S01"}"#,
    );
    let env = StaticEnvironment::new().with_var("TB_JOB", "job.json");

    let err = run_scene_setup(&env, &fs, &mut HostRecorder::new(), &mut HostRecorder::new())
        .unwrap_err();
    match err {
        BatchError::NotFound { label, tried } => {
            assert_eq!(label, "[scene_setup] config");
            let unique: HashSet<_> = tried.iter().collect();
            assert_eq!(unique.len(), 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}
