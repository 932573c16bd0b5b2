//! Argument vectors for the external encoders.
//!
//! All functions here are pure; nothing is spawned.

use super::params::{EncodeJob, Operation};
use crate::config::ToolsConfig;
use std::ffi::OsString;

/// A program plus its arguments, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<OsString>,
}

impl CommandLine {
    /// Arguments rendered lossily, for logs and tests.
    pub fn display_args(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

/// Build the command line that produces `job.target` from `job.source`.
pub fn command_line(job: &EncodeJob, tools: &ToolsConfig) -> CommandLine {
    match job.operation {
        Operation::ImageThumbnail => imagemagick(job, tools, "-thumbnail"),
        Operation::ImageScale => imagemagick(job, tools, "-scale"),
        Operation::VideoThumbnail => {
            let filter = format!(
                "scale={}:{}:force_original_aspect_ratio=increase",
                job.size.width, job.size.height
            );
            ffmpeg(job, tools, &["-vframes", "1", "-vf", &filter])
        }
        Operation::VideoScale => ffmpeg(
            job,
            tools,
            &["-c:v", "libx264", "-preset", "veryfast", "-c:a", "aac"],
        ),
    }
}

/// `convert <src> -auto-orient -strip <resize> WxH <dst>`
fn imagemagick(job: &EncodeJob, tools: &ToolsConfig, resize: &str) -> CommandLine {
    CommandLine {
        program: tools.image.clone(),
        args: vec![
            job.source.clone().into_os_string(),
            "-auto-orient".into(),
            "-strip".into(),
            resize.into(),
            job.size.geometry().into(),
            job.target.clone().into_os_string(),
        ],
    }
}

/// `ffmpeg -y -i <src> -loglevel error <extra...> <dst>`
fn ffmpeg(job: &EncodeJob, tools: &ToolsConfig, extra: &[&str]) -> CommandLine {
    let mut args: Vec<OsString> = vec![
        "-y".into(),
        "-i".into(),
        job.source.clone().into_os_string(),
        "-loglevel".into(),
        "error".into(),
    ];
    args.extend(extra.iter().map(OsString::from));
    args.push(job.target.clone().into_os_string());
    CommandLine {
        program: tools.video.clone(),
        args,
    }
}
