//! Conversion dispatch.
//!
//! The [`Dispatcher`] turns a [`ConversionTask`] into at most two encoder jobs
//! (thumbnail and scaled version) and runs them on its own tokio runtime.
//!
//! ## Flow
//!
//! ```text
//! submit(task)
//!   ├── target exists?  → skip (no slot taken)
//!   ├── acquire slot    ← blocks the caller while all slots are busy
//!   └── spawn job       → slot released when the encoder exits
//! drain()
//!   ├── await every job handle
//!   └── drain_all on the limiter
//! ```
//!
//! Blocking in `submit` is the only backpressure: the walker cannot get more
//! than `parallelism` conversions ahead of the encoders.
//!
//! ## Failure Policy
//!
//! A job that exits non-zero, cannot be spawned, or prints diagnostics is
//! logged at debug level and counted, never propagated. The gallery will
//! link to an output that does not exist. Skipping is based on existence
//! alone, so a truncated output from an earlier run is not repaired.

use crate::classify::{MediaKind, OutputNames};
use crate::config::BoxSize;
use crate::encoder::{EncodeJob, Encoder, Operation, OutputRole};
use crate::limiter::RateLimiter;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("failed to start encoder runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("encoder slots are no longer available")]
    LimiterClosed(#[from] tokio::sync::AcquireError),
}

/// One source file's required outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    pub source: PathBuf,
    pub kind: MediaKind,
    pub names: OutputNames,
}

/// Bounding boxes for the two outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSizes {
    pub thumbnail: BoxSize,
    pub scale: BoxSize,
}

impl Default for OutputSizes {
    fn default() -> Self {
        Self {
            thumbnail: BoxSize::THUMBNAIL,
            scale: BoxSize::SCALE,
        }
    }
}

/// Job counters for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// Encoder jobs started.
    pub launched: usize,
    /// Outputs that already existed.
    pub skipped: usize,
    /// Jobs that exited non-zero, failed to start, or panicked.
    pub failed: usize,
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} launched, {} skipped, {} failed",
            self.launched, self.skipped, self.failed
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobOutcome {
    Succeeded,
    Failed,
}

pub struct Dispatcher {
    runtime: Runtime,
    limiter: RateLimiter,
    encoder: Arc<dyn Encoder>,
    sizes: OutputSizes,
    pending: Vec<JoinHandle<JobOutcome>>,
    report: DispatchReport,
}

impl Dispatcher {
    /// Create a dispatcher allowing `parallelism` concurrent encoder jobs.
    pub fn new(
        encoder: Arc<dyn Encoder>,
        parallelism: usize,
        sizes: OutputSizes,
    ) -> Result<Self, DispatchError> {
        // Jobs spend their time awaiting child processes.
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("mediagal-encode")
            .enable_all()
            .build()
            .map_err(DispatchError::Runtime)?;
        Ok(Self {
            runtime,
            limiter: RateLimiter::new(parallelism),
            encoder,
            sizes,
            pending: Vec::new(),
            report: DispatchReport::default(),
        })
    }

    pub fn parallelism(&self) -> usize {
        self.limiter.capacity()
    }

    /// Launch whatever `task` still needs into `output_dir`.
    ///
    /// Returns once every needed job has been started. Blocks while all
    /// slots are busy.
    pub fn submit(&mut self, task: &ConversionTask, output_dir: &Path) -> Result<(), DispatchError> {
        for role in [OutputRole::Thumbnail, OutputRole::Scale] {
            let Some(operation) = Operation::for_kind(task.kind, role) else {
                return Ok(());
            };
            let (name, size) = match role {
                OutputRole::Thumbnail => (&task.names.thumbnail, self.sizes.thumbnail),
                OutputRole::Scale => (&task.names.scale, self.sizes.scale),
            };
            let target = output_dir.join(name);
            if target.exists() {
                debug!("skip {}: already exists", target.display());
                self.report.skipped += 1;
                continue;
            }

            let job = EncodeJob {
                operation,
                source: task.source.clone(),
                target,
                size,
            };
            self.launch(job)?;
        }
        self.reap_finished();
        Ok(())
    }

    fn launch(&mut self, job: EncodeJob) -> Result<(), DispatchError> {
        let slot = self.runtime.block_on(self.limiter.acquire())?;
        let encoder = Arc::clone(&self.encoder);
        let handle = self.runtime.spawn(async move {
            let _slot = slot;
            match encoder.encode(&job).await {
                Ok(output) => {
                    if !output.diagnostics.is_empty() || !output.success {
                        debug!(
                            "{} {} (exit {:?}): {}",
                            job.operation.label(),
                            job.source.display(),
                            output.exit_code,
                            output.diagnostics
                        );
                    }
                    if output.success {
                        JobOutcome::Succeeded
                    } else {
                        JobOutcome::Failed
                    }
                }
                Err(e) => {
                    debug!("{} {}: {}", job.operation.label(), job.source.display(), e);
                    JobOutcome::Failed
                }
            }
        });
        self.report.launched += 1;
        self.pending.push(handle);
        Ok(())
    }

    /// Collect outcomes of jobs that already finished so `pending` stays small.
    fn reap_finished(&mut self) {
        let (done, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|handle| handle.is_finished());
        self.pending = running;
        for handle in done {
            let outcome = self.runtime.block_on(handle);
            self.record(outcome);
        }
    }

    fn record(&mut self, outcome: Result<JobOutcome, tokio::task::JoinError>) {
        match outcome {
            Ok(JobOutcome::Succeeded) => {}
            Ok(JobOutcome::Failed) => self.report.failed += 1,
            Err(e) => {
                debug!("encoder task aborted: {e}");
                self.report.failed += 1;
            }
        }
    }

    /// Wait for every launched job, then for every slot to be free.
    pub fn drain(mut self) -> Result<DispatchReport, DispatchError> {
        let pending = std::mem::take(&mut self.pending);
        debug!("draining {} encoder jobs", pending.len());
        for handle in pending {
            let outcome = self.runtime.block_on(handle);
            self.record(outcome);
        }
        self.runtime.block_on(self.limiter.drain_all())?;
        Ok(self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::backend::tests::RecordingEncoder;
    use std::time::Duration;
    use tempfile::TempDir;

    fn image_task(dir: &Path, name: &str) -> ConversionTask {
        ConversionTask {
            source: dir.join(name),
            kind: MediaKind::Image,
            names: OutputNames {
                scale: format!("s_{name}"),
                thumbnail: format!("t_{name}"),
            },
        }
    }

    fn dispatcher(encoder: &Arc<RecordingEncoder>, parallelism: usize) -> Dispatcher {
        let encoder: Arc<dyn Encoder> = encoder.clone();
        Dispatcher::new(encoder, parallelism, OutputSizes::default()).unwrap()
    }

    #[test]
    fn submits_thumbnail_and_scale() {
        let tmp = TempDir::new().unwrap();
        let encoder = Arc::new(RecordingEncoder::new());
        let mut d = dispatcher(&encoder, 2);

        d.submit(&image_task(tmp.path(), "a.jpg"), tmp.path()).unwrap();
        let report = d.drain().unwrap();

        assert_eq!(report.launched, 2);
        assert_eq!(report.failed, 0);
        let jobs = encoder.recorded();
        assert!(jobs.iter().any(|j| {
            j.operation == Operation::ImageThumbnail
                && j.target == tmp.path().join("t_a.jpg")
                && j.size == BoxSize::THUMBNAIL
        }));
        assert!(jobs.iter().any(|j| {
            j.operation == Operation::ImageScale
                && j.target == tmp.path().join("s_a.jpg")
                && j.size == BoxSize::SCALE
        }));
    }

    #[test]
    fn existing_outputs_are_skipped() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("t_a.jpg"), b"").unwrap();
        let encoder = Arc::new(RecordingEncoder::new());
        let mut d = dispatcher(&encoder, 2);

        d.submit(&image_task(tmp.path(), "a.jpg"), tmp.path()).unwrap();
        let report = d.drain().unwrap();

        assert_eq!(report.launched, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(encoder.recorded()[0].operation, Operation::ImageScale);
    }

    #[test]
    fn resubmitting_after_completion_launches_nothing() {
        let tmp = TempDir::new().unwrap();
        let encoder = Arc::new(RecordingEncoder::new());
        let task = image_task(tmp.path(), "a.jpg");

        let mut first = dispatcher(&encoder, 1);
        first.submit(&task, tmp.path()).unwrap();
        first.drain().unwrap();

        let mut second = dispatcher(&encoder, 1);
        second.submit(&task, tmp.path()).unwrap();
        let report = second.drain().unwrap();

        assert_eq!(report.launched, 0);
        assert_eq!(report.skipped, 2);
        assert_eq!(encoder.job_count(), 2);
    }

    #[test]
    fn concurrency_never_exceeds_parallelism() {
        let tmp = TempDir::new().unwrap();
        let encoder = Arc::new(RecordingEncoder::with_delay(Duration::from_millis(20)));
        let mut d = dispatcher(&encoder, 2);

        for i in 0..6 {
            d.submit(&image_task(tmp.path(), &format!("{i}.jpg")), tmp.path())
                .unwrap();
        }
        let report = d.drain().unwrap();

        assert_eq!(report.launched, 12);
        assert_eq!(encoder.job_count(), 12);
        assert!(encoder.peak_concurrency() <= 2);
        assert!(encoder.peak_concurrency() >= 1);
    }

    #[test]
    fn drain_waits_for_every_job() {
        let tmp = TempDir::new().unwrap();
        let encoder = Arc::new(RecordingEncoder::with_delay(Duration::from_millis(30)));
        let mut d = dispatcher(&encoder, 4);

        for name in ["a.jpg", "b.jpg"] {
            d.submit(&image_task(tmp.path(), name), tmp.path()).unwrap();
        }
        d.drain().unwrap();

        for name in ["s_a.jpg", "t_a.jpg", "s_b.jpg", "t_b.jpg"] {
            assert!(tmp.path().join(name).exists(), "{name} missing after drain");
        }
    }

    #[test]
    fn failures_are_counted_not_propagated() {
        let tmp = TempDir::new().unwrap();
        let encoder = Arc::new(RecordingEncoder::failing());
        let mut d = dispatcher(&encoder, 1);

        d.submit(&image_task(tmp.path(), "a.jpg"), tmp.path()).unwrap();
        d.submit(&image_task(tmp.path(), "b.jpg"), tmp.path()).unwrap();
        let report = d.drain().unwrap();

        assert_eq!(report.launched, 4);
        assert_eq!(report.failed, 4);
    }

    #[test]
    fn video_jobs_use_video_operations() {
        let tmp = TempDir::new().unwrap();
        let encoder = Arc::new(RecordingEncoder::new());
        let mut d = dispatcher(&encoder, 2);
        let task = ConversionTask {
            source: tmp.path().join("b.mov"),
            kind: MediaKind::Video,
            names: OutputNames {
                scale: "b.mp4".into(),
                thumbnail: "b.mp4.jpg".into(),
            },
        };

        d.submit(&task, tmp.path()).unwrap();
        d.drain().unwrap();

        let mut ops: Vec<_> = encoder.recorded().iter().map(|j| j.operation).collect();
        ops.sort_by_key(|op| op.label());
        assert_eq!(ops, [Operation::VideoScale, Operation::VideoThumbnail]);
    }

    #[test]
    fn unknown_kind_launches_nothing() {
        let tmp = TempDir::new().unwrap();
        let encoder = Arc::new(RecordingEncoder::new());
        let mut d = dispatcher(&encoder, 1);
        let task = ConversionTask {
            source: tmp.path().join("notes.txt"),
            kind: MediaKind::Unknown,
            names: OutputNames {
                scale: String::new(),
                thumbnail: String::new(),
            },
        };

        d.submit(&task, tmp.path()).unwrap();
        assert_eq!(d.drain().unwrap(), DispatchReport::default());
    }
}
