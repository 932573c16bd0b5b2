//! Per-directory statistics shared by the walker, the renderer and CLI output.

use crate::classify::MediaKind;
use serde::Serialize;

/// Aggregated counts and thumbnails for one directory.
///
/// Built bottom-up: each directory folds in its children's summaries first,
/// then its own files. Both steps fill `representative_thumbnail` only while
/// it is still empty, so a descendant's thumbnail takes precedence over a
/// direct file's.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectorySummary {
    pub name: String,
    /// Thumbnail of the first image directly in this directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_thumbnail: Option<String>,
    /// Thumbnail shown for this directory, relative to the directory itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative_thumbnail: Option<String>,
    pub images: usize,
    pub videos: usize,
    /// Direct subdirectories visited.
    pub directories: usize,
    /// Images in all descendant directories.
    pub nested_images: usize,
    /// Videos in all descendant directories.
    pub nested_videos: usize,
}

impl DirectorySummary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn total_images(&self) -> usize {
        self.images + self.nested_images
    }

    pub fn total_videos(&self) -> usize {
        self.videos + self.nested_videos
    }

    /// Whether anything in this subtree is an image or a video.
    pub fn has_media(&self) -> bool {
        self.total_images() + self.total_videos() > 0
    }

    /// Fold a finished child summary into this one.
    ///
    /// Returns `true` if the child has media anywhere below it, which is
    /// also the condition for it to appear on this directory's page.
    pub fn fold_child(&mut self, child: &DirectorySummary) -> bool {
        self.directories += 1;
        self.nested_images += child.total_images();
        self.nested_videos += child.total_videos();

        if !child.has_media() {
            return false;
        }
        if self.representative_thumbnail.is_none() {
            self.representative_thumbnail = child
                .representative_thumbnail
                .as_ref()
                .map(|thumb| format!("{}/{}", child.name, thumb));
        }
        true
    }

    /// Count a direct media file whose thumbnail is `thumbnail`.
    pub fn record_file(&mut self, kind: MediaKind, thumbnail: &str) {
        match kind {
            MediaKind::Image => {
                self.images += 1;
                self.own_thumbnail
                    .get_or_insert_with(|| thumbnail.to_string());
            }
            MediaKind::Video => self.videos += 1,
            MediaKind::Unknown => return,
        }
        self.representative_thumbnail
            .get_or_insert_with(|| thumbnail.to_string());
    }
}
