//! Pluggable log encodings

use crate::flat::FlatCodec;
use crate::rich::RichCodec;
use marklog_core::MarkupEntry;
use thiserror::Error;

/// A codec failed to encode or decode a snapshot
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CodecError(pub String);

/// One canonical row sequence, two interchangeable encodings. All
/// encoding-specific logic stays behind this trait.
pub trait LogCodec {
    /// File name of the persisted log within a session folder
    fn file_name(&self) -> &'static str;
    fn encode(&self, rows: &[MarkupEntry]) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, bytes: &[u8]) -> Result<Vec<MarkupEntry>, CodecError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogEncoding {
    /// Flat CSV, friendly to simple row-append tools
    #[default]
    Flat,
    /// JSON workbook with typed columns and multiple named tables
    Rich,
}

impl LogEncoding {
    pub fn codec(&self) -> Box<dyn LogCodec> {
        match self {
            LogEncoding::Flat => Box::new(FlatCodec),
            LogEncoding::Rich => Box::new(RichCodec),
        }
    }

    pub fn file_name(&self) -> &'static str {
        self.codec().file_name()
    }

    /// The alternate encoding, used when loading whichever log file is
    /// actually present in a folder
    pub fn other(&self) -> Self {
        match self {
            LogEncoding::Flat => LogEncoding::Rich,
            LogEncoding::Rich => LogEncoding::Flat,
        }
    }
}
