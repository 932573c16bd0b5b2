//! External encoder invocation.
//!
//! Pixel and video work is delegated to programs on `PATH`:
//!
//! | Operation | Program | Effect |
//! |---|---|---|
//! | **Image thumbnail** | ImageMagick `convert` | auto-orient, strip, `-thumbnail WxH` |
//! | **Image scale** | ImageMagick `convert` | auto-orient, strip, `-scale WxH` |
//! | **Video thumbnail** | `ffmpeg` | first frame, scaled to cover `WxH` |
//! | **Video scale** | `ffmpeg` | H.264 + AAC transcode, `veryfast` preset |
//!
//! The module is split into:
//! - **Parameters**: [`EncodeJob`] describes one output to produce
//! - **Commands**: pure argument-vector construction (unit testable)
//! - **Backend**: [`Encoder`] trait + [`CommandEncoder`]

pub mod backend;
mod commands;
mod params;

pub use backend::{CommandEncoder, EncodeError, EncodeOutput, Encoder};
pub use commands::{CommandLine, command_line};
pub use params::{EncodeJob, Operation, OutputRole};
