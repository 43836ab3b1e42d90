// Archive codec trait for different container formats

use crate::core::compression::Archive;
use crate::models::ConvertError;

/// Trait for reading and writing one container format in memory
pub trait ArchiveCodec: Send + Sync {
    /// Short format name used in logs
    fn name(&self) -> &'static str;

    /// Parse raw archive bytes into an ordered entry model
    fn parse(&self, bytes: &[u8]) -> Result<Archive, ConvertError>;

    /// Serialize the entry model back to archive bytes
    fn serialize(&self, archive: &Archive) -> Result<Vec<u8>, ConvertError>;

    /// Check the leading magic bytes
    fn supports(&self, bytes: &[u8]) -> bool;
}
