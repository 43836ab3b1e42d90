use std::path::{Path, PathBuf};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::info;
use crate::core::compression::ArchiveProcessor;
use crate::core::conversion::{classify, Classification, ConversionPipeline, ConversionSummary};
use crate::models::{ConversionConfig, ImageFormat};
use crate::utils::progress::ProgressObserver;

/// Result of converting an archive file on disk
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedArchive {
    pub output_path: String,
    #[serde(flatten)]
    pub summary: ConversionSummary,
}

/// One image entry found in an archive
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImageEntryInfo {
    pub name: String,
    pub format: ImageFormat,
    pub needs_pre_decode: bool,
    pub size: usize,
}

/// Convert every image inside an archive file and write the result next to it
///
/// # Flow
/// 1. Read the archive into memory
/// 2. Run the conversion pipeline
/// 3. Write the output (default: `<stem>.<target>.<ext>` beside the input)
pub fn process_archive(
    archive_path: &Path,
    output_path: Option<&Path>,
    config: &ConversionConfig,
    observer: &dyn ProgressObserver,
    cancel: &CancellationToken,
) -> Result<ProcessedArchive, String> {
    config.validate()?;

    let input = std::fs::read(archive_path)
        .map_err(|e| format!("Failed to read {}: {}", archive_path.display(), e))?;

    let pipeline = ConversionPipeline::new(config.clone());
    let run = pipeline.run_with_cancel(&input, observer, cancel)?;

    let output_path: PathBuf = match output_path {
        Some(path) => path.to_path_buf(),
        None => ArchiveProcessor::generate_output_name(archive_path, config.target),
    };
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create output directory {}: {}", parent.display(), e))?;
    }
    std::fs::write(&output_path, &run.output)
        .map_err(|e| format!("Failed to write {}: {}", output_path.display(), e))?;

    info!(output = %output_path.display(), bytes = run.output.len(), "archive written");

    Ok(ProcessedArchive {
        output_path: output_path.to_string_lossy().to_string(),
        summary: run.summary,
    })
}

/// List the image entries of an archive file without converting anything
pub fn list_images_in_archive(archive_path: &Path) -> Result<Vec<ImageEntryInfo>, String> {
    let input = std::fs::read(archive_path)
        .map_err(|e| format!("Failed to read {}: {}", archive_path.display(), e))?;

    let (_, archive) = ArchiveProcessor::new().open(&input)?;

    Ok(archive
        .entries()
        .iter()
        .filter(|e| !e.is_dir)
        .filter_map(|entry| {
            let classification = classify(&entry.name);
            classification.format().map(|format| ImageEntryInfo {
                name: entry.name.clone(),
                format,
                needs_pre_decode: matches!(classification, Classification::ImageRequiringPreDecode(_)),
                size: entry.payload.len(),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use image::{DynamicImage, Rgb, RgbImage};
    use tempfile::TempDir;
    use crate::core::compression::common::ArchiveCodec;
    use crate::core::compression::zip_handler::ZipCodec;
    use crate::core::compression::Archive;
    use crate::core::conversion::raster;
    use crate::models::{ArchiveEntry, ConversionTarget};
    use crate::utils::progress::NullObserver;

    fn write_test_zip(dir: &Path) -> PathBuf {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 6, Rgb([200, 10, 10])));
        let png = raster::encode(&img, ConversionTarget::Png, 0.9, 8).unwrap();

        let mut archive = Archive::new();
        archive.put(ArchiveEntry::directory("album/"));
        archive.put(ArchiveEntry::file("album/red.png", png));
        archive.put(ArchiveEntry::file("album/shot.heic", b"heic".to_vec()));
        archive.put(ArchiveEntry::file("album/notes.txt", b"notes".to_vec()));

        let path = dir.join("photos.zip");
        fs::write(&path, ZipCodec::new().serialize(&archive).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_process_archive_writes_default_output() {
        let temp = TempDir::new().unwrap();
        let input = write_test_zip(temp.path());
        let config = ConversionConfig::new(ConversionTarget::Jpeg);

        let result = process_archive(&input, None, &config, &NullObserver, &CancellationToken::new())
            .unwrap();

        let expected = temp.path().join("photos.jpeg.zip");
        assert_eq!(Path::new(&result.output_path), expected);
        assert!(expected.exists());

        // The HEIC entry fails without a decoder; the PNG converts
        assert_eq!(result.summary.report.converted, 2);
        assert_eq!(result.summary.report.skipped, 1);
        assert_eq!(result.summary.report.failed, vec!["album/shot.heic".to_string()]);

        let output = ZipCodec::new().parse(&fs::read(&expected).unwrap()).unwrap();
        assert!(output.contains("album/red.jpeg"));
        assert!(output.contains("album/shot.heic"));
        assert!(output.get("album/").unwrap().is_dir);
    }

    #[test]
    fn test_process_archive_explicit_output() {
        let temp = TempDir::new().unwrap();
        let input = write_test_zip(temp.path());
        let output = temp.path().join("out/converted.zip");
        let config = ConversionConfig::new(ConversionTarget::Png);

        let result = process_archive(&input, Some(&output), &config, &NullObserver, &CancellationToken::new())
            .unwrap();
        assert!(output.exists());
        assert!(result.summary.renamed.is_empty());
    }

    #[test]
    fn test_process_missing_archive() {
        let config = ConversionConfig::new(ConversionTarget::Png);
        let result = process_archive(
            Path::new("/nonexistent/photos.zip"),
            None,
            &config,
            &NullObserver,
            &CancellationToken::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_list_images_in_archive() {
        let temp = TempDir::new().unwrap();
        let input = write_test_zip(temp.path());

        let images = list_images_in_archive(&input).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].name, "album/red.png");
        assert_eq!(images[0].format, ImageFormat::Png);
        assert!(!images[0].needs_pre_decode);
        assert!(images[1].needs_pre_decode);
        assert_eq!(images[1].size, 4);
    }
}
