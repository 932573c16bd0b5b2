//! HTML gallery rendering.
//!
//! Every directory of the output tree gets an `index.html` listing its
//! subdirectories (as folder tiles) followed by its media (as thumbnail tiles
//! linking to the scaled version).
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! File and directory names are interpolated as typed values and escaped, so
//! a name that looks like markup or a placeholder is rendered literally.
//!
//! The stylesheet is embedded at compile time from `static/gallery.css`; the
//! thumbnail bounding box is injected as the `--thumb-w` / `--thumb-h` custom
//! properties so tiles match the generated thumbnails.

use crate::classify::{MediaKind, OutputNames};
use crate::config::BoxSize;
use crate::types::DirectorySummary;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;

const CSS_STATIC: &str = include_str!("../static/gallery.css");

/// Tile for one media file.
///
/// Unknown files render as nothing; the walker never asks for them.
pub fn render_file(kind: MediaKind, names: &OutputNames) -> Markup {
    match kind {
        MediaKind::Image => html! {
            a.tile.image href=(names.scale) {
                img src=(names.thumbnail) alt=(names.scale) loading="lazy";
            }
        },
        MediaKind::Video => html! {
            a.tile.video href=(names.scale) {
                img src=(names.thumbnail) alt=(names.scale) loading="lazy";
                span.play { "▶" }
            }
        },
        MediaKind::Unknown => html! {},
    }
}

/// Tile linking to a subdirectory's page.
pub fn render_directory(summary: &DirectorySummary) -> Markup {
    let images = summary.total_images();
    let videos = summary.total_videos();
    html! {
        a.tile.folder href={ (summary.name) "/index.html" } {
            @if let Some(thumb) = &summary.representative_thumbnail {
                img src={ (summary.name) "/" (thumb) } alt=(summary.name) loading="lazy";
            }
            span.caption {
                (summary.name)
                span.count {
                    @if images > 0 { (images) @if images == 1 { " photo" } @else { " photos" } }
                    @if images > 0 && videos > 0 { ", " }
                    @if videos > 0 { (videos) @if videos == 1 { " video" } @else { " videos" } }
                }
            }
        }
    }
}

/// Everything a directory page needs.
pub struct GalleryPage<'a> {
    pub title: &'a str,
    /// The root page has no link to a parent.
    pub is_root: bool,
    pub thumbnail: BoxSize,
    /// Directory tiles followed by file tiles, in listing order.
    pub entries: &'a [Markup],
}

fn page_css(thumbnail: BoxSize) -> String {
    format!(
        ":root {{ --thumb-w: {}px; --thumb-h: {}px; }}\n{}",
        thumbnail.width, thumbnail.height, CSS_STATIC
    )
}

/// Render a full directory page.
pub fn render_page(page: &GalleryPage) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (page.title) }
                style { (PreEscaped(page_css(page.thumbnail))) }
            }
            body {
                header.gallery-header {
                    @if !page.is_root {
                        a.up href="../index.html" { "↑ Up" }
                    }
                    h1 { (page.title) }
                }
                main.grid {
                    @for entry in page.entries {
                        (entry)
                    }
                    @if page.entries.is_empty() {
                        p.empty { "Nothing here yet." }
                    }
                }
            }
        }
    }
}

/// Write `index.html`-style page content to `path`.
pub fn write_gallery_page(path: &Path, page: &GalleryPage) -> std::io::Result<()> {
    fs::write(path, render_page(page).into_string())
}
