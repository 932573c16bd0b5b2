//! # mediagal
//!
//! Mirror a directory tree of photos and videos into a static, nested HTML
//! gallery. Every image and video gets a web-sized version and a thumbnail,
//! produced by external encoders (ImageMagick and ffmpeg); every directory
//! gets an `index.html`.
//!
//! # Architecture
//!
//! ```text
//! input/ ─▶ Walker ──submit──▶ Dispatcher ──▶ convert / ffmpeg (≤ p at once)
//!             │                    │
//!             ▼                    ▼
//!      output/**/index.html   output/**/s_*, t_*, *.mp4, *.mp4.jpg
//! ```
//!
//! Traversal runs on the calling thread. Conversions run as child processes
//! supervised by a small tokio runtime inside the [`dispatch::Dispatcher`].
//! A counting [`limiter::RateLimiter`] bounds how many run at once; when all
//! slots are taken, `submit` blocks and the walk waits. At the end of the run
//! the dispatcher drains every outstanding job.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`classify`] | Extension-based media kind and output file names |
//! | [`config`] | Layered configuration: defaults, TOML file, CLI flags |
//! | [`encoder`] | External encoder commands and the [`encoder::Encoder`] trait |
//! | [`limiter`] | Counting slots for concurrent encoder processes |
//! | [`dispatch`] | Skip-if-exists, slot acquisition, job handles, drain |
//! | [`walk`] | Recursive traversal and bottom-up aggregation |
//! | [`types`] | [`types::DirectorySummary`] |
//! | [`gallery`] | Maud templates for directory pages |
//! | [`shutdown`] | SIGINT/SIGTERM → cancellation token |
//! | [`pipeline`] | One full run: walk, then drain |
//! | [`output`] | End-of-run CLI report |
//!
//! # Design Decisions
//!
//! ## Reruns Are Cheap
//!
//! An output file that already exists is never regenerated. A second run over
//! an unchanged tree starts no encoder processes and only rewrites the HTML.
//! The flip side: a truncated output left by a crash is not repaired; delete
//! it to force a redo.
//!
//! ## Cooperative Shutdown
//!
//! Ctrl-C stops the walk from taking new work but lets running conversions
//! finish, so no half-written output is left behind by an interrupt. Encoder
//! processes run in their own process group and never see the terminal's
//! signal. Directories the walk did not finish keep whatever page they had,
//! and the run exits successfully.
//!
//! ## Conversion Failures Are Not Fatal
//!
//! A file the encoder cannot handle is logged (with `-v`) and counted; the
//! page still links to its missing outputs. Only problems with the trees
//! themselves (listing, creating directories, writing pages) stop the run.

pub mod classify;
pub mod config;
pub mod dispatch;
pub mod encoder;
pub mod gallery;
pub mod limiter;
pub mod output;
pub mod pipeline;
pub mod shutdown;
pub mod types;
pub mod walk;

#[cfg(test)]
pub(crate) mod test_helpers;
