//! Parameter types for encoder jobs.
//!
//! These structs describe *what* to produce, not *how*. The
//! [`commands`](super::commands) module turns them into argument vectors and
//! the [`backend`](super::backend) runs them.

use crate::classify::MediaKind;
use crate::config::BoxSize;
use std::path::PathBuf;

/// Which of a source file's two outputs a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputRole {
    Thumbnail,
    Scale,
}

/// One concrete encoder operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ImageThumbnail,
    ImageScale,
    VideoThumbnail,
    VideoScale,
}

impl Operation {
    /// The operation producing `role` for a file of `kind`; `None` for unknown files.
    pub fn for_kind(kind: MediaKind, role: OutputRole) -> Option<Self> {
        match (kind, role) {
            (MediaKind::Image, OutputRole::Thumbnail) => Some(Self::ImageThumbnail),
            (MediaKind::Image, OutputRole::Scale) => Some(Self::ImageScale),
            (MediaKind::Video, OutputRole::Thumbnail) => Some(Self::VideoThumbnail),
            (MediaKind::Video, OutputRole::Scale) => Some(Self::VideoScale),
            (MediaKind::Unknown, _) => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ImageThumbnail => "image thumbnail",
            Self::ImageScale => "image scale",
            Self::VideoThumbnail => "video thumbnail",
            Self::VideoScale => "video scale",
        }
    }
}

/// Everything one encoder run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeJob {
    pub operation: Operation,
    pub source: PathBuf,
    pub target: PathBuf,
    /// Bounding box for the output.
    pub size: BoxSize,
}
