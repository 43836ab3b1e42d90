// Archive container modules
pub mod common;
pub mod zip_handler;

#[path = "7z_handler.rs"]
pub mod sevenz_handler;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use crate::models::{ArchiveEntry, ConversionTarget, ConvertError};
use common::ArchiveCodec;
use zip_handler::ZipCodec;
use sevenz_handler::SevenZCodec;

/// In-memory archive: ordered entries with unique names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in iteration order
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove an entry by name, keeping the order of the rest
    pub fn remove(&mut self, name: &str) -> Option<ArchiveEntry> {
        let index = self.entries.iter().position(|e| e.name == name)?;
        Some(self.entries.remove(index))
    }

    /// Insert an entry. A same-named entry is replaced in place, otherwise it is appended.
    ///
    /// Returns the replaced entry, if any.
    pub fn put(&mut self, entry: ArchiveEntry) -> Option<ArchiveEntry> {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => Some(std::mem::replace(existing, entry)),
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    /// `put` for codecs while parsing: a duplicate name in the input keeps the later entry
    pub(crate) fn put_parsed(&mut self, entry: ArchiveEntry) {
        let name = entry.name.clone();
        if self.put(entry).is_some() {
            warn!(entry = %name, "duplicate entry name in archive, keeping the later one");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of non-directory entries
    pub fn file_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_dir).count()
    }
}

/// Picks a codec by sniffing the input and round-trips archives through it
pub struct ArchiveProcessor {
    codecs: Vec<Arc<dyn ArchiveCodec>>,
}

impl ArchiveProcessor {
    /// Create a processor with all supported codecs
    pub fn new() -> Self {
        let codecs: Vec<Arc<dyn ArchiveCodec>> = vec![
            Arc::new(ZipCodec::new()),
            Arc::new(SevenZCodec::new()),
        ];

        Self { codecs }
    }

    /// Find the codec whose magic bytes match the input
    fn get_codec(&self, bytes: &[u8]) -> Result<Arc<dyn ArchiveCodec>, ConvertError> {
        self.codecs
            .iter()
            .find(|codec| codec.supports(bytes))
            .map(Arc::clone)
            .ok_or_else(|| ConvertError::ArchiveUnreadable(
                "Unrecognized archive format (expected ZIP or 7z)".to_string()
            ))
    }

    /// Parse archive bytes, returning the codec to serialize with afterwards
    pub fn open(&self, bytes: &[u8]) -> Result<(Arc<dyn ArchiveCodec>, Archive), ConvertError> {
        let codec = self.get_codec(bytes)?;
        let archive = codec.parse(bytes)?;
        debug!(format = codec.name(), entries = archive.len(), "archive parsed");
        Ok((codec, archive))
    }

    /// Check if the bytes look like a supported archive
    pub fn is_supported(&self, bytes: &[u8]) -> bool {
        self.codecs.iter().any(|c| c.supports(bytes))
    }

    /// Generate the output filename `<stem>.<target>.<ext>`
    ///
    /// # Example
    /// ```ignore
    /// "photos.zip" + webp -> "photos.webp.zip"
    /// "data.7z" + jpeg -> "data.jpeg.7z"
    /// ```
    pub fn generate_output_name(input_path: &Path, target: ConversionTarget) -> PathBuf {
        let parent = input_path.parent();
        let stem = input_path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("converted");
        let extension = input_path.extension()
            .and_then(|e| e.to_str())
            .unwrap_or("zip");

        let new_name = format!("{}.{}.{}", stem, target.extension(), extension);

        match parent {
            Some(p) => p.join(new_name),
            None => PathBuf::from(new_name),
        }
    }

    pub fn supported_formats() -> Vec<&'static str> {
        vec!["zip", "7z"]
    }
}

impl Default for ArchiveProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_replaces_in_place() {
        let mut archive = Archive::new();
        archive.put(ArchiveEntry::file("a.txt", b"1".to_vec()));
        archive.put(ArchiveEntry::file("b.txt", b"2".to_vec()));

        let replaced = archive.put(ArchiveEntry::file("a.txt", b"3".to_vec()));
        assert_eq!(replaced.unwrap().payload, b"1");
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.entries()[0].payload, b"3");
    }

    #[test]
    fn test_remove_then_put_appends() {
        let mut archive = Archive::new();
        archive.put(ArchiveEntry::file("a.png", b"1".to_vec()));
        archive.put(ArchiveEntry::file("b.txt", b"2".to_vec()));

        assert!(archive.remove("a.png").is_some());
        assert!(archive.remove("a.png").is_none());
        archive.put(ArchiveEntry::file("a.webp", b"3".to_vec()));

        let names: Vec<_> = archive.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b.txt", "a.webp"]);
    }

    #[test]
    fn test_file_count_ignores_directories() {
        let mut archive = Archive::new();
        archive.put(ArchiveEntry::directory("dir/"));
        archive.put(ArchiveEntry::file("dir/a.txt", Vec::new()));
        assert_eq!(archive.len(), 2);
        assert_eq!(archive.file_count(), 1);
    }

    #[test]
    fn test_generate_output_name() {
        let output = ArchiveProcessor::generate_output_name(
            Path::new("/path/to/photos.zip"), ConversionTarget::WebP
        );
        assert_eq!(output, Path::new("/path/to/photos.webp.zip"));

        let output2 = ArchiveProcessor::generate_output_name(
            Path::new("data.7z"), ConversionTarget::Jpeg
        );
        assert_eq!(output2, Path::new("data.jpeg.7z"));
    }

    #[test]
    fn test_open_detects_codec() {
        let processor = ArchiveProcessor::new();
        let mut archive = Archive::new();
        archive.put(ArchiveEntry::file("a.txt", b"x".to_vec()));

        let zip_bytes = ZipCodec::new().serialize(&archive).unwrap();
        let (codec, parsed) = processor.open(&zip_bytes).unwrap();
        assert_eq!(codec.name(), "zip");
        assert_eq!(parsed, archive);

        let sevenz_bytes = SevenZCodec::new().serialize(&archive).unwrap();
        let (codec, _) = processor.open(&sevenz_bytes).unwrap();
        assert_eq!(codec.name(), "7z");
    }

    #[test]
    fn test_unrecognized_input() {
        let processor = ArchiveProcessor::new();
        assert!(!processor.is_supported(b"GIF89a"));
        assert!(matches!(
            processor.open(b"GIF89a"),
            Err(ConvertError::ArchiveUnreadable(_))
        ));
        assert!(matches!(
            processor.open(b""),
            Err(ConvertError::ArchiveUnreadable(_))
        ));
    }

    #[test]
    fn test_supported_formats() {
        let formats = ArchiveProcessor::supported_formats();
        assert!(formats.contains(&"zip"));
        assert!(formats.contains(&"7z"));
    }
}
