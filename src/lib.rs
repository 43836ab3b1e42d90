// Module declarations
pub mod models;
pub mod core;
pub mod commands;
pub mod utils;

pub use crate::core::compression::{Archive, ArchiveProcessor};
pub use crate::core::conversion::{
    classify, Classification, ConversionPipeline, ConversionRun, ConversionSummary,
    EntryConverter, HeicDecoder, ImageConverter, TimeoutGuard,
};
pub use models::{
    ArchiveEntry, ConversionConfig, ConversionOutcome, ConversionTarget, ConvertError, EntryError,
    EntryPhase, ImageFormat, ProgressSignal, Report,
};
pub use utils::progress::{FnObserver, LogObserver, NullObserver, ProgressObserver};
pub use tokio_util::sync::CancellationToken;
