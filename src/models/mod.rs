pub mod error;
pub mod task;
pub mod config;

// Re-export commonly used types
pub use error::{ConvertError, EntryError};
pub use task::{ArchiveEntry, ConversionOutcome, EntryPhase, ProgressSignal, Report};
pub use config::{ConversionConfig, ConversionTarget, ImageFormat, ENCODE_QUALITY};
