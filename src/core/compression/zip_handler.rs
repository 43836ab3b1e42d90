use std::io::{Cursor, Read, Write};
use zip::{ZipArchive, ZipWriter, write::FileOptions, CompressionMethod};
use crate::core::compression::common::ArchiveCodec;
use crate::core::compression::Archive;
use crate::models::{ArchiveEntry, ConvertError};

const LOCAL_HEADER_MAGIC: &[u8] = b"PK\x03\x04";
const EMPTY_ARCHIVE_MAGIC: &[u8] = b"PK\x05\x06";

/// ZIP archive codec
///
/// Reads entries in central-directory order and writes them back in model order.
pub struct ZipCodec;

impl ZipCodec {
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveCodec for ZipCodec {
    fn name(&self) -> &'static str {
        "zip"
    }

    /// Parse a ZIP archive held in memory
    ///
    /// # Behavior
    /// - Directory entries are kept as structural entries
    /// - Entry names are kept verbatim (no path sanitizing, nothing touches disk)
    fn parse(&self, bytes: &[u8]) -> Result<Archive, ConvertError> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ConvertError::ArchiveUnreadable(
                format!("Failed to read ZIP archive: {}", e)
            ))?;

        let mut archive = Archive::new();
        for i in 0..zip.len() {
            let mut file = zip.by_index(i)
                .map_err(|e| ConvertError::ArchiveUnreadable(
                    format!("Failed to read entry at index {}: {}", i, e)
                ))?;

            let name = file.name().to_string();
            if file.is_dir() {
                archive.put_parsed(ArchiveEntry::directory(name));
                continue;
            }

            let mut payload = Vec::new();
            file.read_to_end(&mut payload)
                .map_err(|e| ConvertError::ArchiveUnreadable(
                    format!("Failed to read entry {}: {}", name, e)
                ))?;
            archive.put_parsed(ArchiveEntry::file(name, payload));
        }

        Ok(archive)
    }

    /// Write the archive model as a ZIP
    ///
    /// # Behavior
    /// - Already-compressed formats (PNG, JPG, WEBP…) are stored without re-compression
    /// - Everything else uses Deflate level 1
    fn serialize(&self, archive: &Archive) -> Result<Vec<u8>, ConvertError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        let stored_opts = FileOptions::<()>::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(0o644);
        let deflated_opts = FileOptions::<()>::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(1))
            .unix_permissions(0o644);

        for entry in archive.entries() {
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), stored_opts)
                    .map_err(|e| ConvertError::ArchiveWriteError(
                        format!("Failed to add directory {} to archive: {}", entry.name, e)
                    ))?;
                continue;
            }

            let opts = if is_already_compressed(&entry.name) {
                stored_opts
            } else {
                deflated_opts
            };

            zip.start_file(entry.name.as_str(), opts)
                .map_err(|e| ConvertError::ArchiveWriteError(
                    format!("Failed to start file {} in archive: {}", entry.name, e)
                ))?;
            zip.write_all(&entry.payload)
                .map_err(|e| ConvertError::ArchiveWriteError(
                    format!("Failed to write file {} to archive: {}", entry.name, e)
                ))?;
        }

        let cursor = zip.finish()
            .map_err(|e| ConvertError::ArchiveWriteError(
                format!("Failed to finalize ZIP archive: {}", e)
            ))?;

        Ok(cursor.into_inner())
    }

    fn supports(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(LOCAL_HEADER_MAGIC) || bytes.starts_with(EMPTY_ARCHIVE_MAGIC)
    }
}

/// Returns true for formats that are already compressed and won't benefit from Deflate.
fn is_already_compressed(name: &str) -> bool {
    let ext = name.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    matches!(
        ext.as_str(),
        "png" | "jpg" | "jpeg" | "gif" | "webp" | "avif" | "heic"
            | "mp3" | "mp4" | "ogg" | "aac" | "flac"
            | "zip" | "7z" | "rar"
    )
}

impl Default for ZipCodec {
    fn default() -> Self {
        Self::new()
    }
}
