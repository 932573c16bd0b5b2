//! One complete gallery build.
//!
//! ```text
//! walk input/ ──submit──▶ dispatcher ──▶ encoder processes
//!      │                      │
//!      └─ index.html pages    └─ drain: wait for every job
//! ```
//!
//! [`run`] is what the binary calls; tests call it with a mock [`Encoder`].

use crate::classify::Classifier;
use crate::config::{self, GalleryConfig};
use crate::dispatch::{DispatchError, DispatchReport, Dispatcher, OutputSizes};
use crate::encoder::Encoder;
use crate::shutdown::CancellationToken;
use crate::types::DirectorySummary;
use crate::walk::{WalkError, Walker};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("input directory not found: {0}")]
    InputNotFound(PathBuf),
    #[error("cannot prepare output directory {path}: {source}")]
    OutputRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Walk(#[from] WalkError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// What a finished (or interrupted) run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: DirectorySummary,
    pub report: DispatchReport,
    /// Whether the run stopped early on request.
    pub interrupted: bool,
}

/// Create the output root and resolve both roots to canonical paths, so an
/// output directory nested in the input is recognised however it is spelled.
fn resolve_roots(input: &Path, output: &Path) -> Result<(PathBuf, PathBuf), RunError> {
    let input = fs::canonicalize(input).map_err(|_| RunError::InputNotFound(input.to_path_buf()))?;
    let output_err = |source| RunError::OutputRoot {
        path: output.to_path_buf(),
        source,
    };
    fs::create_dir_all(output).map_err(output_err)?;
    let output = fs::canonicalize(output).map_err(output_err)?;
    Ok((input, output))
}

/// Build the gallery for `input` into `output`.
///
/// Returns after traversal has finished and every launched conversion has
/// exited.
pub fn run(
    input: &Path,
    output: &Path,
    config: &GalleryConfig,
    encoder: Arc<dyn Encoder>,
    token: CancellationToken,
) -> Result<RunOutcome, RunError> {
    if !input.is_dir() {
        return Err(RunError::InputNotFound(input.to_path_buf()));
    }
    let (input, output) = resolve_roots(input, output)?;

    let parallelism = config::effective_parallelism(&config.processing);
    let sizes = OutputSizes {
        thumbnail: config.thumbnail,
        scale: config.scale,
    };
    let mut dispatcher = Dispatcher::new(encoder, parallelism, sizes)?;
    info!(
        "Building gallery {} → {} ({} parallel conversions)",
        input.display(),
        output.display(),
        dispatcher.parallelism()
    );

    let walker = Walker::new(
        &input,
        &output,
        Classifier::new(config.media.clone()),
        config.thumbnail,
        token.clone(),
    );
    let summary = walker.visit_root(&mut dispatcher)?;

    info!("Waiting for running conversions to finish");
    let report = dispatcher.drain()?;

    Ok(RunOutcome {
        summary,
        report,
        interrupted: token.is_cancelled(),
    })
}
