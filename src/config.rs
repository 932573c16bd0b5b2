//! Gallery configuration.
//!
//! Settings are layered: stock defaults, then an optional TOML file passed
//! with `--config`, then command-line flags. Every layer is sparse; only the
//! values it names override the layer below.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [media]
//! image = ["jpg", "jpeg", "gif", "png", "heic"]
//! video = ["mp4", "avi", "mov"]
//! convert = ["heic"]        # image extensions re-encoded as JPEG
//!
//! [thumbnail]
//! width = 400
//! height = 225
//!
//! [scale]
//! width = 1920
//! height = 1080
//!
//! [processing]
//! parallelism = 4           # Max concurrent encoder processes (omit for auto = CPU cores)
//!
//! [tools]
//! image = "convert"         # ImageMagick
//! video = "ffmpeg"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Everything a run needs besides the input and output roots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Extension lists driving classification.
    pub media: MediaConfig,
    /// Bounding box for thumbnails.
    pub thumbnail: BoxSize,
    /// Bounding box for the scaled web version.
    pub scale: BoxSize,
    /// Concurrency limits.
    pub processing: ProcessingConfig,
    /// External encoder programs.
    pub tools: ToolsConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            media: MediaConfig::default(),
            thumbnail: BoxSize::THUMBNAIL,
            scale: BoxSize::SCALE,
            processing: ProcessingConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, size) in [("thumbnail", &self.thumbnail), ("scale", &self.scale)] {
            if size.width == 0 || size.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "{label} width and height must be non-zero"
                )));
            }
        }
        if self.processing.parallelism == Some(0) {
            return Err(ConfigError::Validation(
                "processing.parallelism must be at least 1".into(),
            ));
        }
        if self.media.image.is_empty() && self.media.video.is_empty() {
            return Err(ConfigError::Validation(
                "media.image and media.video cannot both be empty".into(),
            ));
        }
        if self.tools.image.trim().is_empty() || self.tools.video.trim().is_empty() {
            return Err(ConfigError::Validation(
                "tools.image and tools.video must name a program".into(),
            ));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Extension lists, stored lowercase without the leading dot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaConfig {
    pub image: Vec<String>,
    pub video: Vec<String>,
    /// Image extensions whose outputs are written as JPEG.
    pub convert: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            image: parse_extension_list("jpg,jpeg,gif,png,heic"),
            video: parse_extension_list("mp4,avi,mov"),
            convert: parse_extension_list("heic"),
        }
    }
}

/// A width × height bounding box in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoxSize {
    pub width: u32,
    pub height: u32,
}

impl BoxSize {
    pub const THUMBNAIL: BoxSize = BoxSize {
        width: 400,
        height: 225,
    };
    pub const SCALE: BoxSize = BoxSize {
        width: 1920,
        height: 1080,
    };

    /// ImageMagick geometry string, e.g. `400x225`.
    pub fn geometry(self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Concurrency settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of encoder processes running at once.
    /// When absent, defaults to the number of CPU cores.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<usize>,
}

/// Resolve the effective slot count.
///
/// - `None` → number of available cores
/// - `Some(n)` → `n`, not clamped to the core count
pub fn effective_parallelism(config: &ProcessingConfig) -> usize {
    config.parallelism.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    })
}

/// External encoder program names, resolved through `PATH`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsConfig {
    pub image: String,
    pub video: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            image: "convert".to_string(),
            video: "ffmpeg".to_string(),
        }
    }
}

/// Split a comma-separated extension list, normalizing case and dots.
///
/// `"JPG, .png,,heic"` → `["jpg", "png", "heic"]`.
pub fn parse_extension_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

/// Values supplied on the command line; `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub image: Option<String>,
    pub video: Option<String>,
    pub convert: Option<String>,
    pub thumbnail_width: Option<u32>,
    pub thumbnail_height: Option<u32>,
    pub scale_width: Option<u32>,
    pub scale_height: Option<u32>,
    pub parallelism: Option<usize>,
}

impl Overrides {
    /// Apply these overrides on top of `config`.
    pub fn apply(&self, config: &mut GalleryConfig) {
        if let Some(list) = &self.image {
            config.media.image = parse_extension_list(list);
        }
        if let Some(list) = &self.video {
            config.media.video = parse_extension_list(list);
        }
        if let Some(list) = &self.convert {
            config.media.convert = parse_extension_list(list);
        }
        if let Some(w) = self.thumbnail_width {
            config.thumbnail.width = w;
        }
        if let Some(h) = self.thumbnail_height {
            config.thumbnail.height = h;
        }
        if let Some(w) = self.scale_width {
            config.scale.width = w;
        }
        if let Some(h) = self.scale_height {
            config.scale.height = h;
        }
        if let Some(p) = self.parallelism {
            config.processing.parallelism = Some(p);
        }
    }
}

/// Parse a sparse TOML document on top of the stock defaults.
pub fn parse_config(content: &str) -> Result<GalleryConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let base = toml::Value::try_from(GalleryConfig::default())?;
    let config: GalleryConfig = merge_toml(base, overlay).try_into()?;
    Ok(config)
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key-by-key; any other overlay value replaces the base value.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Build the effective configuration: defaults → optional file → flags.
pub fn load_config(
    file: Option<&Path>,
    overrides: &Overrides,
) -> Result<GalleryConfig, ConfigError> {
    let mut config = match file {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => GalleryConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}
