//! Recursive directory traversal.
//!
//! The [`Walker`] mirrors the input tree under the output root. For each
//! directory it:
//!
//! 1. creates the mirrored output directory,
//! 2. lists entries once, sorted by name, splitting directories from regular
//!    files (symlinks are not followed),
//! 3. recurses into each subdirectory and folds the child summary in,
//! 4. submits each media file to the [`Dispatcher`] and counts it,
//! 5. writes the directory's `index.html` unless the walk was cancelled.
//!
//! ## Cancellation
//!
//! The [`CancellationToken`] is checked before each subdirectory and after
//! each file. Once it is set, the current directory stops taking new work and
//! returns a partial summary without writing its page, so a page left by an
//! earlier complete run is not replaced by a partial one. That is not an
//! error: every level above does the same, and the run drains the
//! conversions already launched.
//!
//! ## Errors
//!
//! Failing to list a directory, create its output directory or write its page
//! aborts the whole run. Conversion failures never reach the walker.

use crate::classify::Classifier;
use crate::config::BoxSize;
use crate::dispatch::{ConversionTask, DispatchError, Dispatcher};
use crate::gallery::{self, GalleryPage};
use crate::shutdown::CancellationToken;
use crate::types::DirectorySummary;
use maud::Markup;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot list {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("cannot write gallery page {path}: {source}")]
    WritePage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not inside the input root")]
    OutsideRoot(PathBuf),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Directory entries split the way the walker consumes them.
#[derive(Debug, Default, PartialEq)]
struct Listing {
    directories: Vec<PathBuf>,
    files: Vec<PathBuf>,
    /// Symlinks and special files.
    skipped: Vec<PathBuf>,
}

fn list_directory(dir: &Path) -> Result<Listing, WalkError> {
    let mut listing = Listing::default();
    let entries = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();
    for entry in entries {
        let entry = entry.map_err(|source| WalkError::ListDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let file_type = entry.file_type();
        if file_type.is_dir() {
            listing.directories.push(entry.into_path());
        } else if file_type.is_file() {
            listing.files.push(entry.into_path());
        } else {
            listing.skipped.push(entry.into_path());
        }
    }
    Ok(listing)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub struct Walker {
    input_root: PathBuf,
    output_root: PathBuf,
    classifier: Classifier,
    thumbnail: BoxSize,
    token: CancellationToken,
}

impl Walker {
    pub fn new(
        input_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        classifier: Classifier,
        thumbnail: BoxSize,
        token: CancellationToken,
    ) -> Self {
        Self {
            input_root: input_root.into(),
            output_root: output_root.into(),
            classifier,
            thumbnail,
            token,
        }
    }

    /// Walk the whole input tree.
    pub fn visit_root(&self, dispatcher: &mut Dispatcher) -> Result<DirectorySummary, WalkError> {
        self.visit(dispatcher, &self.input_root)
    }

    /// Output directory mirroring `dir`.
    fn mirror_of(&self, dir: &Path) -> Result<PathBuf, WalkError> {
        let relative = dir
            .strip_prefix(&self.input_root)
            .map_err(|_| WalkError::OutsideRoot(dir.to_path_buf()))?;
        Ok(self.output_root.join(relative))
    }

    /// Visit `dir` and everything below it.
    pub fn visit(
        &self,
        dispatcher: &mut Dispatcher,
        dir: &Path,
    ) -> Result<DirectorySummary, WalkError> {
        let out_dir = self.mirror_of(dir)?;
        fs::create_dir_all(&out_dir).map_err(|source| WalkError::CreateDir {
            path: out_dir.clone(),
            source,
        })?;

        let listing = list_directory(dir)?;
        for path in &listing.skipped {
            debug!("skipping {}: not a regular file or directory", path.display());
        }
        let mut summary = DirectorySummary::new(file_name_of(dir));
        let mut entries: Vec<Markup> = Vec::new();

        for sub in &listing.directories {
            if self.token.is_cancelled() {
                info!("Stopped early in {}", dir.display());
                return Ok(summary);
            }
            if *sub == self.output_root {
                debug!("skipping output directory {}", sub.display());
                continue;
            }
            let child = self.visit(dispatcher, sub)?;
            if summary.fold_child(&child) {
                entries.push(gallery::render_directory(&child));
            }
        }

        for file in &listing.files {
            let filename = file_name_of(file);
            let kind = self.classifier.classify(&filename);
            let Some(names) = self.classifier.output_names(&filename, kind) else {
                continue;
            };

            let task = ConversionTask {
                source: file.clone(),
                kind,
                names,
            };
            dispatcher.submit(&task, &out_dir)?;
            entries.push(gallery::render_file(kind, &task.names));
            summary.record_file(kind, &task.names.thumbnail);

            if self.token.is_cancelled() {
                info!("Stopped early in {}", dir.display());
                return Ok(summary);
            }
        }

        let page_path = out_dir.join("index.html");
        let page = GalleryPage {
            title: &summary.name,
            is_root: dir == self.input_root,
            thumbnail: self.thumbnail,
            entries: &entries,
        };
        gallery::write_gallery_page(&page_path, &page).map_err(|source| WalkError::WritePage {
            path: page_path.clone(),
            source,
        })?;

        debug!(
            "{}: {} images, {} videos, {} subdirectories",
            dir.display(),
            summary.images,
            summary.videos,
            summary.directories
        );
        Ok(summary)
    }
}
