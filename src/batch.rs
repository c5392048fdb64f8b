//! Headless host execution
//!
//! This module is the single place where the host executable is launched.
//! Everything that runs a host script goes through [`run_harmony_batch`]
//! (or [`run_script`] for typed `BatchScript` arguments), which guarantees:
//!
//! - Inputs (executable, scene file, script) are checked before spawning
//! - The script is rewritten without a UTF-8 byte-order mark, which the
//!   host's script compiler rejects
//! - stdout/stderr are captured, optionally to a per-run log file
//! - An optional timeout kills the host instead of hanging the batch
//!
//! # Command line
//!
//! `<exe> <scene-file> -batch -compile <script> [-readonly]`

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config_file::ToolSettings;
use crate::error::{BatchError, Result};
use crate::script_traits::BatchScript;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Local timestamp used in generated job and log file names.
pub fn file_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// One headless host run.
#[derive(Debug, Clone, Default)]
pub struct BatchInvocation {
    pub harmony_exe: PathBuf,
    pub scene_file: PathBuf,
    pub script: PathBuf,
    /// Extra environment for the child, e.g. `TB_JOB`.
    pub env: Vec<(String, String)>,
    pub readonly: bool,
    pub timeout: Option<Duration>,
    pub cwd: Option<PathBuf>,
    /// When set, a combined log is written here after the run.
    pub log_dir: Option<PathBuf>,
    pub dry_run: bool,
}

impl BatchInvocation {
    pub fn new(
        harmony_exe: impl Into<PathBuf>,
        scene_file: impl Into<PathBuf>,
        script: impl Into<PathBuf>,
    ) -> Self {
        Self {
            harmony_exe: harmony_exe.into(),
            scene_file: scene_file.into(),
            script: script.into(),
            ..Self::default()
        }
    }

    /// Invocation of a typed host script with the settings' exe, scripts
    /// dir, timeout and log dir.
    pub fn for_script<T: BatchScript>(
        settings: &ToolSettings,
        scene_file: &Path,
        args: &T,
        dry_run: bool,
    ) -> Self {
        Self {
            harmony_exe: settings.harmony_exe.clone(),
            scene_file: scene_file.to_path_buf(),
            script: settings.scripts_dir.join(args.script_name()),
            env: args.get_env_vars(),
            readonly: args.readonly(),
            timeout: settings.batch_timeout(),
            cwd: None,
            log_dir: settings.log_dir.clone(),
            dry_run,
        }
    }

    /// Arguments passed after the executable.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            self.scene_file.to_string_lossy().into_owned(),
            "-batch".to_string(),
            "-compile".to_string(),
            self.script.to_string_lossy().into_owned(),
        ];
        if self.readonly {
            args.push("-readonly".to_string());
        }
        args
    }

    /// Printable command line, quoting arguments that contain spaces.
    pub fn command_line(&self) -> String {
        std::iter::once(self.harmony_exe.to_string_lossy().into_owned())
            .chain(self.args())
            .map(|a| quote_arg(&a))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote_arg(arg: &str) -> String {
    if arg.contains(' ') {
        format!("\"{}\"", arg)
    } else {
        arg.to_string()
    }
}

/// Output from a host run.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    /// Command line that was (or would have been) run.
    pub cmd: String,
    pub stdout: String,
    pub stderr: String,
    /// Exit code (None if killed or terminated by signal).
    pub exit_code: Option<i32>,
    pub success: bool,
    pub timed_out: bool,
    pub dry_run: bool,
    pub log_path: Option<PathBuf>,
}

impl BatchOutput {
    /// Check if the run succeeded and return an error if not.
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.dry_run || self.success {
            return Ok(());
        }
        if self.timed_out {
            return Err(BatchError::process(format!("{} timed out", context)));
        }
        let code = self.exit_code.unwrap_or(-1);
        Err(BatchError::process(format!(
            "{} failed (exit code {}): {}",
            context,
            code,
            self.stderr.trim()
        )))
    }

    /// Text written to the per-run log file.
    pub fn log_text(&self) -> String {
        format!(
            "CMD:\n{}\n\nSTDOUT:\n{}\n\nSTDERR:\n{}\n",
            self.cmd, self.stdout, self.stderr
        )
    }
}

/// Rewrite `path` without a leading UTF-8 BOM. Returns whether one was removed.
pub fn strip_script_bom(path: &Path) -> Result<bool> {
    let bytes = fs::read(path)?;
    match bytes.strip_prefix(UTF8_BOM) {
        Some(rest) => {
            fs::write(path, rest)?;
            info!("Removed byte-order mark from {:?}", path);
            Ok(true)
        }
        None => Ok(false),
    }
}

fn require_file(label: &str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(BatchError::not_found(
            label,
            &[path.to_string_lossy().into_owned()],
        ))
    }
}

fn drain<R: Read + Send + 'static>(source: Option<R>) -> Option<JoinHandle<std::io::Result<Vec<u8>>>> {
    source.map(|mut reader| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn collect(handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<String> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| BatchError::process("output reader thread panicked"))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Wait for the child, killing it once `timeout` elapses.
/// Returns `None` when the child was killed.
fn wait_with_timeout(child: &mut Child, timeout: Option<Duration>) -> Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return Ok(Some(child.wait()?));
    };
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= timeout {
            warn!("Host run exceeded {:?}, killing pid {}", timeout, child.id());
            child.kill()?;
            child.wait()?;
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Run a host script headlessly.
///
/// # Errors
///
/// - `NotFound` when the executable, scene file or script is missing
/// - `ProcessFailure` when the host cannot be spawned
/// - `Io` when output capture or the log file fails
///
/// A nonzero exit or timeout is reported in the returned [`BatchOutput`];
/// call [`BatchOutput::ensure_success`] to turn it into an error.
pub fn run_harmony_batch(inv: &BatchInvocation) -> Result<BatchOutput> {
    let cmd = inv.command_line();
    info!("run_harmony_batch: {} env={:?}", cmd, inv.env);

    if inv.dry_run {
        if !inv.harmony_exe.is_file() {
            warn!("[DRY RUN] host executable not found: {:?}", inv.harmony_exe);
        }
    } else {
        require_file("Harmony executable", &inv.harmony_exe)?;
    }
    require_file("Scene file", &inv.scene_file)?;
    require_file("Batch script", &inv.script)?;

    if inv.dry_run {
        info!("[DRY RUN] would run: {}", cmd);
        return Ok(BatchOutput {
            cmd,
            success: true,
            dry_run: true,
            ..BatchOutput::default()
        });
    }

    if let Err(e) = strip_script_bom(&inv.script) {
        warn!("Could not rewrite {:?} without BOM: {}", inv.script, e);
    }

    let mut command = Command::new(&inv.harmony_exe);
    command
        .args(inv.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in &inv.env {
        command.env(key, value);
    }
    if let Some(cwd) = &inv.cwd {
        command.current_dir(cwd);
    }

    let mut child = command
        .spawn()
        .map_err(|e| BatchError::process(format!("Failed to spawn {:?}: {}", inv.harmony_exe, e)))?;
    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    let status = wait_with_timeout(&mut child, inv.timeout)?;
    let stdout = collect(stdout_reader)?;
    let stderr = collect(stderr_reader)?;

    let mut output = BatchOutput {
        cmd,
        stdout,
        stderr,
        exit_code: status.and_then(|s| s.code()),
        success: status.is_some_and(|s| s.success()),
        timed_out: status.is_none(),
        dry_run: false,
        log_path: None,
    };

    if output.success {
        info!("Host run succeeded: {:?}", inv.script);
    } else {
        info!(
            "Host run failed: {:?} exit={:?} timed_out={}",
            inv.script, output.exit_code, output.timed_out
        );
    }

    if let Some(dir) = &inv.log_dir {
        fs::create_dir_all(dir)?;
        let stem = inv
            .scene_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "scene".to_string());
        let log_path = dir.join(format!("harmony_batch_{}_{}.log", stem, file_timestamp()));
        fs::write(&log_path, output.log_text())?;
        info!("Log written to {:?}", log_path);
        output.log_path = Some(log_path);
    }

    Ok(output)
}

/// Run a typed host script with the given settings.
pub fn run_script<T: BatchScript>(
    settings: &ToolSettings,
    scene_file: &Path,
    args: &T,
    dry_run: bool,
) -> Result<BatchOutput> {
    run_harmony_batch(&BatchInvocation::for_script(settings, scene_file, args, dry_run))
}
