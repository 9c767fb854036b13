//! Per-process startup: environment loading and model prewarm.
//!
//! [`prewarm`] runs once per worker process before any job is accepted, so
//! every session reuses the same loaded VAD instead of paying the load per
//! conversation.

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::vad::VadModel;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Resources loaded once per process and shared by every job.
#[derive(Debug, Clone)]
pub struct PrewarmedResources {
    pub vad: Arc<VadModel>,
}

/// Load the shared models.
///
/// # Errors
///
/// Returns an error if the VAD cannot be loaded from `config.vad`.
pub fn prewarm(config: &AgentConfig) -> Result<PrewarmedResources> {
    let start = Instant::now();
    let vad = VadModel::load(&config.vad)?;
    info!(
        threshold = config.vad.threshold,
        "VAD loaded in {:.1}ms",
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(PrewarmedResources { vad: Arc::new(vad) })
}

/// Load `KEY=value` pairs from `path` into the process environment.
///
/// Variables already set are left alone. Returns `false` if the file does
/// not exist.
///
/// # Errors
///
/// Returns [`AgentError::Config`] if the file exists but cannot be parsed.
pub fn load_env_file(path: &Path) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            info!("loaded environment from {}", path.display());
            Ok(true)
        }
        Err(e) if e.not_found() => {
            warn!("no environment file at {}, using process environment", path.display());
            Ok(false)
        }
        Err(e) => Err(AgentError::Config(format!(
            "invalid environment file {}: {e}",
            path.display()
        ))),
    }
}
