use std::io::{Cursor, Read};
use sevenz_rust::{Password, SevenZArchiveEntry, SevenZReader, SevenZWriter};
use crate::core::compression::common::ArchiveCodec;
use crate::core::compression::Archive;
use crate::models::{ArchiveEntry, ConvertError};

const SEVENZ_MAGIC: &[u8] = b"7z\xBC\xAF\x27\x1C";

/// 7z archive codec
///
/// Reads and writes 7z archives in memory using sevenz-rust.
/// Password-protected archives are not supported.
pub struct SevenZCodec;

impl SevenZCodec {
    pub fn new() -> Self {
        Self
    }
}

impl ArchiveCodec for SevenZCodec {
    fn name(&self) -> &'static str {
        "7z"
    }

    /// Parse a 7z archive held in memory
    ///
    /// Directory names are normalized to end with `/` so they match the ZIP convention.
    fn parse(&self, bytes: &[u8]) -> Result<Archive, ConvertError> {
        let mut reader = SevenZReader::new(Cursor::new(bytes), bytes.len() as u64, Password::empty())
            .map_err(|e| ConvertError::ArchiveUnreadable(
                format!("Failed to read 7z archive: {}", e)
            ))?;

        let mut archive = Archive::new();
        reader.for_each_entries(|entry, reader| {
            if entry.is_directory() {
                let mut name = entry.name().to_string();
                if !name.ends_with('/') {
                    name.push('/');
                }
                archive.put_parsed(ArchiveEntry::directory(name));
            } else {
                let mut payload = Vec::new();
                reader.read_to_end(&mut payload)
                    .map_err(sevenz_rust::Error::io)?;
                archive.put_parsed(ArchiveEntry::file(entry.name(), payload));
            }

            Ok(true) // Continue processing
        })
        .map_err(|e| ConvertError::ArchiveUnreadable(
            format!("Failed to extract 7z archive: {}", e)
        ))?;

        Ok(archive)
    }

    /// Write the archive model as a 7z (LZMA2)
    fn serialize(&self, archive: &Archive) -> Result<Vec<u8>, ConvertError> {
        let mut writer = SevenZWriter::new(Cursor::new(Vec::new()))
            .map_err(|e| ConvertError::ArchiveWriteError(
                format!("Failed to create 7z writer: {}", e)
            ))?;

        for entry in archive.entries() {
            let mut archive_entry = SevenZArchiveEntry::new();
            if entry.is_dir {
                archive_entry.name = entry.name.trim_end_matches('/').to_string();
                archive_entry.is_directory = true;
                writer.push_archive_entry::<&[u8]>(archive_entry, None)
                    .map_err(|e| ConvertError::ArchiveWriteError(
                        format!("Failed to add directory {} to archive: {}", entry.name, e)
                    ))?;
            } else {
                archive_entry.name = entry.name.clone();
                writer.push_archive_entry(archive_entry, Some(entry.payload.as_slice()))
                    .map_err(|e| ConvertError::ArchiveWriteError(
                        format!("Failed to add file {} to archive: {}", entry.name, e)
                    ))?;
            }
        }

        let cursor = writer.finish()
            .map_err(|e| ConvertError::ArchiveWriteError(
                format!("Failed to finalize 7z archive: {}", e)
            ))?;

        Ok(cursor.into_inner())
    }

    fn supports(&self, bytes: &[u8]) -> bool {
        bytes.starts_with(SEVENZ_MAGIC)
    }
}

impl Default for SevenZCodec {
    fn default() -> Self {
        Self::new()
    }
}
