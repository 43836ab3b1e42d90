use std::sync::Arc;
use std::time::Instant;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use crate::core::compression::{Archive, ArchiveProcessor};
use crate::core::conversion::classifier::{classify, Classification};
use crate::core::conversion::converter::{ConversionRequest, EntryConverter, ImageConverter};
use crate::core::conversion::guard::TimeoutGuard;
use crate::models::{
    ConversionConfig, ConversionOutcome, ConversionTarget, ConvertError, EntryError, EntryPhase,
    ProgressSignal, Report,
};
use crate::utils::progress::ProgressObserver;

/// An image entry that was replaced under a new name
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RenamedEntry {
    pub from: String,
    pub to: String,
}

/// What a finished batch did
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionSummary {
    pub report: Report,
    pub renamed: Vec<RenamedEntry>,
    pub total_entries: usize,
    pub image_entries: usize,
    pub elapsed_ms: u64,
}

/// Output bytes plus summary of a successful run
#[derive(Debug, Clone)]
pub struct ConversionRun {
    pub output: Vec<u8>,
    pub summary: ConversionSummary,
}

/// Batch orchestrator
///
/// Workflow:
/// 1. Parse the archive (codec picked from magic bytes)
/// 2. Classify entries; bail out if none is an image
/// 3. Count every non-image entry as skipped (left untouched)
/// 4. Convert image entries one at a time, each under the timeout guard
/// 5. Serialize the mutated archive with the input's codec
pub struct ConversionPipeline {
    config: ConversionConfig,
    processor: ArchiveProcessor,
    converter: Arc<dyn EntryConverter>,
    guard: TimeoutGuard,
}

impl ConversionPipeline {
    pub fn new(config: ConversionConfig) -> Self {
        let converter = ImageConverter::new().with_avif_speed(config.avif_speed());
        Self::with_converter(config, Arc::new(converter))
    }

    pub fn with_converter(config: ConversionConfig, converter: Arc<dyn EntryConverter>) -> Self {
        let guard = TimeoutGuard::new(config.entry_timeout());
        Self {
            config,
            processor: ArchiveProcessor::new(),
            converter,
            guard,
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert every image entry in `archive_bytes`
    pub fn run(
        &self,
        archive_bytes: &[u8],
        observer: &dyn ProgressObserver,
    ) -> Result<ConversionRun, ConvertError> {
        self.run_with_cancel(archive_bytes, observer, &CancellationToken::new())
    }

    /// Same as `run`, checking `cancel` between entries.
    ///
    /// A cancelled batch produces no output.
    pub fn run_with_cancel(
        &self,
        archive_bytes: &[u8],
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<ConversionRun, ConvertError> {
        let started = Instant::now();
        let target = self.config.target;
        let (codec, mut archive) = self.processor.open(archive_bytes)?;

        let mut pass_through: Vec<String> = Vec::new();
        let mut images: Vec<(String, Classification)> = Vec::new();
        for entry in archive.entries().iter().filter(|e| !e.is_dir) {
            match classify(&entry.name) {
                Classification::NotImage => pass_through.push(entry.name.clone()),
                classification => images.push((entry.name.clone(), classification)),
            }
        }

        if images.is_empty() {
            return Err(ConvertError::NoImagesFound);
        }

        info!(
            format = codec.name(),
            to = %target,
            images = images.len(),
            others = pass_through.len(),
            "starting conversion"
        );

        let mut report = Report::default();

        // Non-image entries stay in the archive as they are
        for name in &pass_through {
            debug!(entry = %name, "passing through");
            report.record_skipped();
            observer.on_report(&report);
        }

        let total = images.len();
        let mut renamed = Vec::new();
        for (completed, (name, classification)) in images.into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(completed, total, "conversion cancelled");
                return Err(ConvertError::Cancelled);
            }

            observer.on_progress(&ProgressSignal {
                completed_count: completed,
                total_count: total,
                current_entry_name: name.clone(),
                current_entry_phase: EntryPhase::Processing,
            });

            let outcome = match build_request(&archive, &name, classification, target) {
                Ok(request) => {
                    let converter = Arc::clone(&self.converter);
                    self.guard.run(&name, cancel, move |token| {
                        converter.convert(request, &token)
                    })
                }
                Err(reason) => ConversionOutcome::Failed(reason),
            };
            let phase = outcome.phase();

            // Single commit point for this entry
            match outcome {
                ConversionOutcome::Converted(new_entry) => {
                    archive.remove(&name);
                    if archive.contains(&new_entry.name) {
                        warn!(from = %name, to = %new_entry.name, "converted entry overwrites an existing entry");
                    }
                    renamed.push(RenamedEntry { from: name.clone(), to: new_entry.name.clone() });
                    archive.put(new_entry);
                    report.record_converted();
                }
                ConversionOutcome::SkippedAlreadyTarget => {
                    report.record_converted();
                }
                ConversionOutcome::SkippedNotImage => {
                    report.record_skipped();
                }
                ConversionOutcome::Failed(reason) => {
                    warn!(entry = %name, error = %reason, "conversion failed");
                    report.record_failed(&name);
                }
            }

            observer.on_progress(&ProgressSignal {
                completed_count: completed + 1,
                total_count: total,
                current_entry_name: name,
                current_entry_phase: phase,
            });
            observer.on_report(&report);
        }

        let output = codec.serialize(&archive)?;

        let summary = ConversionSummary {
            report,
            renamed,
            total_entries: archive.file_count(),
            image_entries: total,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            converted = summary.report.converted,
            skipped = summary.report.skipped,
            failed = summary.report.failed.len(),
            elapsed_ms = summary.elapsed_ms,
            "conversion finished"
        );

        Ok(ConversionRun { output, summary })
    }
}

/// Snapshot an entry's payload for the worker; the worker never sees the archive
fn build_request(
    archive: &Archive,
    name: &str,
    classification: Classification,
    target: ConversionTarget,
) -> Result<ConversionRequest, EntryError> {
    let entry = archive.get(name).ok_or_else(|| EntryError::Missing(name.to_string()))?;
    Ok(ConversionRequest {
        name: name.to_string(),
        payload: entry.payload.clone(),
        classification,
        target,
    })
}
