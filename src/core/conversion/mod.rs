// Archive image conversion modules
pub mod classifier;
pub mod converter;
pub mod guard;
pub mod heic;
pub mod pipeline;
pub mod raster;

pub use classifier::{classify, Classification};
pub use converter::{ConversionRequest, EntryConverter, ImageConverter};
pub use guard::TimeoutGuard;
pub use heic::{HeicDecoder, UnavailableHeicDecoder};
pub use pipeline::{ConversionPipeline, ConversionRun, ConversionSummary, RenamedEntry};
