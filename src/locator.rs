//! Job Locator: probe candidate paths and keep the first one that exists.
//!
//! # Precedence
//!
//! Job candidates are ordered so that an explicit hint always beats
//! convention-based discovery:
//!
//! 1. every variant of the hint (usually `TB_JOB`), see [`candidates_from_path`]
//! 2. for each fallback name of the calling script, `<project>/<name>` in
//!    forward-slash form, then `<project>\<name>` in back-slash form
//!
//! Probing short-circuits on the first existing candidate and every attempt is
//! logged so a failed batch run can be diagnosed from its log alone.

use tracing::{error, info};

use crate::error::{BatchError, Result};
use crate::paths::{candidates_from_path, to_back_slashes, to_forward_slashes};

/// Read-only existence check used while probing candidates.
pub trait PathProbe {
    fn exists(&self, path: &str) -> bool;
}

/// Return the first candidate that exists, or `None` once all are exhausted.
pub fn pick_existing<P: PathProbe + ?Sized>(
    probe: &P,
    label: &str,
    candidates: &[String],
) -> Option<String> {
    for candidate in candidates {
        let exists = probe.exists(candidate);
        info!("{} try: {} exists={}", label, candidate, exists);
        if exists {
            return Some(candidate.clone());
        }
    }
    None
}

/// Like [`pick_existing`], but a miss is a `NotFound` error listing every
/// candidate tried.
pub fn locate_file<P: PathProbe + ?Sized>(
    probe: &P,
    label: &str,
    candidates: &[String],
) -> Result<String> {
    pick_existing(probe, label, candidates).ok_or_else(|| {
        error!("{} not found after {} candidate(s)", label, candidates.len());
        BatchError::not_found(label, candidates)
    })
}

/// Build the ordered job-file candidates for one host script.
///
/// Empty hints and empty project directories contribute nothing.
pub fn job_candidates(hint: Option<&str>, project_dir: Option<&str>, fallbacks: &[&str]) -> Vec<String> {
    let mut candidates = Vec::new();

    if let Some(hint) = hint.filter(|h| !h.is_empty()) {
        candidates.extend(candidates_from_path(hint));
    }

    if let Some(dir) = project_dir.filter(|d| !d.is_empty()) {
        let forward = to_forward_slashes(dir);
        let back = to_back_slashes(dir);
        for name in fallbacks {
            candidates.push(format!("{}/{}", forward, to_forward_slashes(name)));
            candidates.push(format!("{}\\{}", back, to_back_slashes(name)));
        }
    }

    candidates
}
