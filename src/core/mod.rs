pub mod compression;
pub mod conversion;
