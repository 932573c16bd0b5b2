//! Encoder trait and the subprocess-backed implementation.
//!
//! The [`Encoder`] trait is the seam between the dispatcher, which decides
//! *which* outputs are missing, and whatever actually produces them. The
//! production implementation is [`CommandEncoder`], which spawns ImageMagick
//! or ffmpeg. Tests swap in a recording mock.

use super::commands::command_line;
use super::params::EncodeJob;
use crate::config::ToolsConfig;
use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// What an encoder run left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOutput {
    /// Whether the process exited with status zero.
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr, trimmed.
    pub diagnostics: String,
}

impl EncodeOutput {
    pub fn succeeded() -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            diagnostics: String::new(),
        }
    }
}

/// Produces one output file per call.
///
/// Implementations must be shareable across the dispatcher's tasks.
#[async_trait]
pub trait Encoder: Send + Sync {
    async fn encode(&self, job: &EncodeJob) -> Result<EncodeOutput, EncodeError>;
}

/// Runs ImageMagick / ffmpeg as child processes.
///
/// Each child is placed in its own process group, so a terminal interrupt
/// aimed at this tool does not reach conversions that are already running.
#[derive(Debug, Clone, Default)]
pub struct CommandEncoder {
    tools: ToolsConfig,
}

impl CommandEncoder {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl Encoder for CommandEncoder {
    async fn encode(&self, job: &EncodeJob) -> Result<EncodeOutput, EncodeError> {
        let line = command_line(job, &self.tools);
        debug!(
            "{} {}",
            line.program,
            line.display_args().join(" ")
        );

        let mut cmd = Command::new(&line.program);
        cmd.args(&line.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        cmd.process_group(0);

        let output = cmd.output().await.map_err(|source| EncodeError::Spawn {
            program: line.program.clone(),
            source,
        })?;

        let mut diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
        diagnostics.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(EncodeOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            diagnostics: diagnostics.trim().to_string(),
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::config::BoxSize;
    use crate::encoder::Operation;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Mock encoder that records jobs instead of spawning processes.
    ///
    /// By default it creates an empty target file, like a real encoder would,
    /// so skip-if-exists behaves the same on a second run. It also tracks how
    /// many jobs were running at the same time.
    #[derive(Default)]
    pub struct RecordingEncoder {
        pub jobs: Mutex<Vec<EncodeJob>>,
        active: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
        fail: bool,
        skip_writes: bool,
    }

    impl RecordingEncoder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Hold each job for `delay` so overlapping jobs can be observed.
        pub fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        /// Exit non-zero with diagnostics and write nothing.
        pub fn failing() -> Self {
            Self {
                fail: true,
                skip_writes: true,
                ..Self::default()
            }
        }

        pub fn recorded(&self) -> Vec<EncodeJob> {
            self.jobs.lock().unwrap().clone()
        }

        pub fn job_count(&self) -> usize {
            self.jobs.lock().unwrap().len()
        }

        /// Highest number of jobs observed running concurrently.
        pub fn peak_concurrency(&self) -> usize {
            self.peak.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Encoder for RecordingEncoder {
        async fn encode(&self, job: &EncodeJob) -> Result<EncodeOutput, EncodeError> {
            self.jobs.lock().unwrap().push(job.clone());
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if !self.skip_writes {
                std::fs::write(&job.target, b"").map_err(|source| EncodeError::Spawn {
                    program: "mock".into(),
                    source,
                })?;
            }

            self.active.fetch_sub(1, Ordering::SeqCst);
            if self.fail {
                Ok(EncodeOutput {
                    success: false,
                    exit_code: Some(1),
                    diagnostics: "mock: unsupported input".into(),
                })
            } else {
                Ok(EncodeOutput::succeeded())
            }
        }
    }

    fn job(target: &std::path::Path) -> EncodeJob {
        EncodeJob {
            operation: Operation::ImageThumbnail,
            source: "/in/a.jpg".into(),
            target: target.to_path_buf(),
            size: BoxSize::THUMBNAIL,
        }
    }

    #[test]
    fn mock_records_and_writes_target() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("t_a.jpg");
        let encoder = RecordingEncoder::new();
        let rt = tokio::runtime::Runtime::new().unwrap();

        let out = rt.block_on(encoder.encode(&job(&target))).unwrap();
        assert!(out.success);
        assert!(target.exists());
        assert_eq!(encoder.job_count(), 1);
        assert_eq!(encoder.peak_concurrency(), 1);
    }

    #[test]
    fn failing_mock_writes_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("t_a.jpg");
        let encoder = RecordingEncoder::failing();
        let rt = tokio::runtime::Runtime::new().unwrap();

        let out = rt.block_on(encoder.encode(&job(&target))).unwrap();
        assert!(!out.success);
        assert_eq!(out.exit_code, Some(1));
        assert!(!target.exists());
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let encoder = CommandEncoder::new(ToolsConfig {
            image: "mediagal-no-such-encoder".into(),
            video: "mediagal-no-such-encoder".into(),
        });
        let rt = tokio::runtime::Runtime::new().unwrap();

        let err = rt
            .block_on(encoder.encode(&job(&tmp.path().join("t.jpg"))))
            .unwrap_err();
        assert!(err.to_string().contains("mediagal-no-such-encoder"));
    }

    #[cfg(unix)]
    #[test]
    fn command_encoder_captures_exit_status_and_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        // `sh <src> ...` runs the "source" as a script, which stands in for an encoder.
        let script = tmp.path().join("enc.sh");
        std::fs::write(&script, "echo broken input >&2\nexit 3\n").unwrap();
        let encoder = CommandEncoder::new(ToolsConfig {
            image: "sh".into(),
            video: "sh".into(),
        });
        let mut failing = job(&tmp.path().join("t.jpg"));
        failing.source = script;
        let rt = tokio::runtime::Runtime::new().unwrap();

        let out = rt.block_on(encoder.encode(&failing)).unwrap();
        assert!(!out.success);
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.diagnostics, "broken input");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn command_encoder_runs_child_in_own_process_group() {
        let tmp = tempfile::TempDir::new().unwrap();
        // Field 5 of /proc/<pid>/stat is the process group id.
        let script = tmp.path().join("pgid.sh");
        std::fs::write(
            &script,
            "read -r _ _ _ _ pgid _ < /proc/$$/stat\necho \"$$ $pgid\"\n",
        )
        .unwrap();
        let encoder = CommandEncoder::new(ToolsConfig {
            image: "sh".into(),
            video: "sh".into(),
        });
        let mut pgid_job = job(&tmp.path().join("t.jpg"));
        pgid_job.source = script;
        let rt = tokio::runtime::Runtime::new().unwrap();

        let out = rt.block_on(encoder.encode(&pgid_job)).unwrap();
        assert!(out.success, "{}", out.diagnostics);
        let ids: Vec<&str> = out.diagnostics.split_whitespace().collect();
        assert_eq!(ids.len(), 2, "{}", out.diagnostics);
        assert_eq!(ids[0], ids[1]);
    }
}
