//! Media classification and output naming.
//!
//! A file's kind comes from its extension alone (no content sniffing), matched
//! case-insensitively against the configured image and video lists. The kind
//! then decides what the converted files are called:
//!
//! | Source | Kind | Scaled | Thumbnail |
//! |---|---|---|---|
//! | `a.jpg` | image | `s_a.jpg` | `t_a.jpg` |
//! | `photo.HEIC` (convert set) | image | `s_photo.jpg` | `t_photo.jpg` |
//! | `clip.mov` | video | `clip.mp4` | `clip.mp4.jpg` |
//! | `notes.txt` | unknown | — | — |

use crate::config::MediaConfig;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Unknown,
}

/// File names (not paths) of the two converted outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNames {
    pub scale: String,
    pub thumbnail: String,
}

/// Lowercased extension of `filename`, if any.
///
/// Dotfiles such as `.jpg` have no extension, matching `Path::extension`.
fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

fn contains(list: &[String], ext: &str) -> bool {
    list.iter().any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

/// Classify a file by extension.
///
/// A name without an extension, or with one in neither list, is
/// [`MediaKind::Unknown`]. Image wins if an extension appears in both lists.
pub fn classify(filename: &str, images: &[String], videos: &[String]) -> MediaKind {
    match extension_of(filename) {
        Some(ext) if contains(images, &ext) => MediaKind::Image,
        Some(ext) if contains(videos, &ext) => MediaKind::Video,
        _ => MediaKind::Unknown,
    }
}

/// Derive the scaled and thumbnail file names for a classified file.
///
/// Returns `None` for [`MediaKind::Unknown`].
pub fn derive_output_names(
    filename: &str,
    kind: MediaKind,
    convert: &[String],
) -> Option<OutputNames> {
    match kind {
        MediaKind::Image => {
            let name = match extension_of(filename) {
                Some(ext) if contains(convert, &ext) => {
                    format!("{}.jpg", stem_of(filename))
                }
                _ => filename.to_string(),
            };
            Some(OutputNames {
                scale: format!("s_{name}"),
                thumbnail: format!("t_{name}"),
            })
        }
        MediaKind::Video => {
            let stem = stem_of(filename);
            Some(OutputNames {
                scale: format!("{stem}.mp4"),
                thumbnail: format!("{stem}.mp4.jpg"),
            })
        }
        MediaKind::Unknown => None,
    }
}

fn stem_of(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string())
}

/// Classification settings bundled for the walker.
#[derive(Debug, Clone)]
pub struct Classifier {
    media: MediaConfig,
}

impl Classifier {
    pub fn new(media: MediaConfig) -> Self {
        Self { media }
    }

    pub fn classify(&self, filename: &str) -> MediaKind {
        classify(filename, &self.media.image, &self.media.video)
    }

    pub fn output_names(&self, filename: &str, kind: MediaKind) -> Option<OutputNames> {
        derive_output_names(filename, kind, &self.media.convert)
    }
}
