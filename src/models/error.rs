use thiserror::Error;

/// Errors that abort a whole conversion run
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Archive unreadable: {0}")]
    ArchiveUnreadable(String),

    #[error("No supported image files found in the archive")]
    NoImagesFound,

    #[error("Failed to write archive: {0}")]
    ArchiveWriteError(String),

    #[error("Conversion cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors confined to a single archive entry.
///
/// These never abort a batch; the entry name ends up in the report's
/// failed list and the loop moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error("decode failed: {0}")]
    Decode(String),

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("{entry} timed out after {after_ms} ms")]
    Timeout { entry: String, after_ms: u64 },

    #[error("conversion cancelled")]
    Cancelled,

    #[error("conversion worker failed: {0}")]
    Worker(String),

    #[error("entry missing from archive: {0}")]
    Missing(String),
}

// Command surface returns Result<T, String>
impl From<ConvertError> for String {
    fn from(err: ConvertError) -> String {
        err.to_string()
    }
}
