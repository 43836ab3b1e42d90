use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use crate::models::ConvertError;

/// Encoder quality on a 0-1 scale. Applied to lossy targets only.
pub const ENCODE_QUALITY: f32 = 0.9;

/// Per-entry deadline used when none is configured
pub const DEFAULT_ENTRY_TIMEOUT_MS: u64 = 30_000;

/// Default ravif speed (1 = slowest/best, 10 = fastest)
pub const DEFAULT_AVIF_SPEED: u8 = 8;

/// Image formats recognized inside an archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Heic,
    Gif,
    WebP,
    Avif,
    Bmp,
    Tiff,
}

/// Extension → format lookup. Matching is done on the lowercased extension.
const EXTENSION_TABLE: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("heic", ImageFormat::Heic),
    ("gif", ImageFormat::Gif),
    ("webp", ImageFormat::WebP),
    ("avif", ImageFormat::Avif),
    ("bmp", ImageFormat::Bmp),
    ("tiff", ImageFormat::Tiff),
];

impl ImageFormat {
    /// Look up a format by file extension (without the dot), case-insensitively
    pub fn from_extension(ext: &str) -> Option<Self> {
        let lower = ext.to_ascii_lowercase();
        EXTENSION_TABLE
            .iter()
            .find(|(e, _)| *e == lower)
            .map(|(_, format)| *format)
    }

    /// All recognized extensions
    pub fn known_extensions() -> impl Iterator<Item = &'static str> {
        EXTENSION_TABLE.iter().map(|(e, _)| *e)
    }
}

/// Output format for a whole batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionTarget {
    Jpeg,
    Png,
    WebP,
    Avif,
}

impl ConversionTarget {
    /// Extension appended to converted entries
    pub fn extension(self) -> &'static str {
        match self {
            ConversionTarget::Jpeg => "jpeg",
            ConversionTarget::Png => "png",
            ConversionTarget::WebP => "webp",
            ConversionTarget::Avif => "avif",
        }
    }

    pub fn as_image_format(self) -> ImageFormat {
        match self {
            ConversionTarget::Jpeg => ImageFormat::Jpeg,
            ConversionTarget::Png => ImageFormat::Png,
            ConversionTarget::WebP => ImageFormat::WebP,
            ConversionTarget::Avif => ImageFormat::Avif,
        }
    }

    /// Whether `ENCODE_QUALITY` affects the encoder
    pub fn is_lossy(self) -> bool {
        matches!(self, ConversionTarget::Jpeg | ConversionTarget::Avif)
    }
}

impl fmt::Display for ConversionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ConversionTarget {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(ConversionTarget::Jpeg),
            "png" => Ok(ConversionTarget::Png),
            "webp" => Ok(ConversionTarget::WebP),
            "avif" => Ok(ConversionTarget::Avif),
            other => Err(ConvertError::InvalidConfig(
                format!("Unsupported target format: {}", other)
            )),
        }
    }
}

/// Settings for one conversion run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionConfig {
    /// Format every image entry ends up in
    pub target: ConversionTarget,
    /// Deadline for a single entry's conversion
    #[serde(default = "default_entry_timeout_ms")]
    pub entry_timeout_ms: u64,
    /// AVIF encoder speed (1 - 10)
    #[serde(default = "default_avif_speed")]
    pub avif_speed: u8,
}

fn default_entry_timeout_ms() -> u64 {
    DEFAULT_ENTRY_TIMEOUT_MS
}

fn default_avif_speed() -> u8 {
    DEFAULT_AVIF_SPEED
}

impl ConversionConfig {
    pub fn new(target: ConversionTarget) -> Self {
        Self {
            target,
            entry_timeout_ms: DEFAULT_ENTRY_TIMEOUT_MS,
            avif_speed: DEFAULT_AVIF_SPEED,
        }
    }

    pub fn with_entry_timeout(mut self, timeout: Duration) -> Self {
        self.entry_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn entry_timeout(&self) -> Duration {
        Duration::from_millis(self.entry_timeout_ms)
    }

    /// AVIF speed clamped to the range ravif accepts
    pub fn avif_speed(&self) -> u8 {
        self.avif_speed.clamp(1, 10)
    }

    /// Parse a TOML document such as:
    ///
    /// ```toml
    /// target = "webp"
    /// entryTimeoutMs = 10000
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, ConvertError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConvertError::InvalidConfig(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConvertError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.entry_timeout_ms == 0 {
            return Err(ConvertError::InvalidConfig(
                "entryTimeoutMs must be greater than zero".to_string()
            ));
        }
        Ok(())
    }
}
