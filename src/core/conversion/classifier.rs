use crate::models::ImageFormat;

/// How an entry must be handled, decided from its name alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    NotImage,
    /// Decodable by the generic raster pipeline
    ImageDirect(ImageFormat),
    /// Needs a format-specific decode to an intermediate raster first
    ImageRequiringPreDecode(ImageFormat),
}

impl Classification {
    pub fn is_image(self) -> bool {
        !matches!(self, Classification::NotImage)
    }

    /// Source format for image entries
    pub fn format(self) -> Option<ImageFormat> {
        match self {
            Classification::NotImage => None,
            Classification::ImageDirect(format)
            | Classification::ImageRequiringPreDecode(format) => Some(format),
        }
    }
}

/// Extension of the last path segment: the text after its last dot.
///
/// Names without a dot, or ending in one, have an empty extension.
pub fn extension_of(entry_name: &str) -> &str {
    let file_name = entry_name.rsplit('/').next().unwrap_or(entry_name);
    match file_name.rfind('.') {
        Some(index) => &file_name[index + 1..],
        None => "",
    }
}

/// Classify an entry by its (case-insensitive) extension. No I/O.
pub fn classify(entry_name: &str) -> Classification {
    match ImageFormat::from_extension(extension_of(entry_name)) {
        None => Classification::NotImage,
        Some(ImageFormat::Heic) => Classification::ImageRequiringPreDecode(ImageFormat::Heic),
        Some(format) => Classification::ImageDirect(format),
    }
}

/// Swap the extension of the last path segment, appending one if there is none
pub fn replace_extension(entry_name: &str, new_extension: &str) -> String {
    let segment_start = entry_name.rfind('/').map(|i| i + 1).unwrap_or(0);
    let base = match entry_name[segment_start..].rfind('.') {
        Some(dot) => &entry_name[..segment_start + dot],
        None => entry_name,
    };
    format!("{}.{}", base, new_extension)
}
