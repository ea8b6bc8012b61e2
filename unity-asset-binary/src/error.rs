//! The flat error taxonomy for bundle and SerializedFile parsing.
//!
//! Every failure mode the reader can hit surfaces as one of these variants.
//! Variants carry whatever structured context their callers need to decide
//! whether to retry, skip, or abort.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BinaryError>;

#[derive(Error, Debug)]
pub enum BinaryError {
    #[error("unexpected end of input: wanted {wanted} bytes, {available} available")]
    UnexpectedEof { wanted: usize, available: usize },

    #[error("invalid UTF-8 in string field: {0}")]
    InvalidUtf8(String),

    #[error("invalid bundle signature: {actual:?}")]
    InvalidBundleSignature { actual: String },

    #[error("unsupported format version: {version}")]
    UnsupportedVersion { version: i64 },

    #[error("malformed bundle header: {0}")]
    HeaderParse(String),

    #[error("malformed BlocksInfo: {0}")]
    BlocksInfoParse(String),

    #[error("BlocksInfo hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch { expected: String, computed: String },

    #[error("duplicate node path: {path}")]
    DuplicateNode { path: String },

    #[error("node range overlaps or exceeds the decompressed data region")]
    NodeOverlap,

    #[error("value out of declared bounds: {0}")]
    Bounds(String),

    #[error("unsupported compression code: {code}")]
    UnsupportedCompression { code: u8 },

    #[error("LZ4 decompression failed: {0}")]
    Lz4Decompression(String),

    #[error("decompressed size mismatch: expected {expected}, got {actual}")]
    DecompressionSizeMismatch { expected: usize, actual: usize },

    #[error("reserved bits set in block flags: {flags:#06x}")]
    BlockFlags { flags: u16 },

    #[error("invalid SerializedFile version: {version}")]
    InvalidVersion { version: i32 },

    #[error("corrupted SerializedFile header: {0}")]
    CorruptedHeader(String),

    #[error("truncated metadata: {0}")]
    TruncatedMetadata(String),

    #[error("unrecognized endianness byte: {value}")]
    EndiannessMismatch { value: u8 },

    #[error("duplicate path_id: {path_id}")]
    DuplicatePathId { path_id: i64 },

    #[error("invalid object table entry: {0}")]
    InvalidObjectInfo(String),

    #[error("non-zero alignment padding detected in strict mode")]
    AlignmentValidation,

    #[error("type tree missing and no fallback schema applies")]
    TypeTreeMissing,

    #[error("external stream reference could not be resolved: {path}")]
    StreamingInfo { path: String },

    #[error("invalid mesh data: {0}")]
    InvalidMesh(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl BinaryError {
    pub fn eof(wanted: usize, available: usize) -> Self {
        Self::UnexpectedEof { wanted, available }
    }

    pub fn invalid_bundle_signature(actual: impl Into<String>) -> Self {
        Self::InvalidBundleSignature {
            actual: actual.into(),
        }
    }

    pub fn unsupported_version(version: i64) -> Self {
        Self::UnsupportedVersion { version }
    }

    pub fn header_parse(msg: impl Into<String>) -> Self {
        Self::HeaderParse(msg.into())
    }

    pub fn blocks_info_parse(msg: impl Into<String>) -> Self {
        Self::BlocksInfoParse(msg.into())
    }

    pub fn bounds(msg: impl Into<String>) -> Self {
        Self::Bounds(msg.into())
    }

    pub fn corrupted_header(msg: impl Into<String>) -> Self {
        Self::CorruptedHeader(msg.into())
    }

    pub fn truncated_metadata(msg: impl Into<String>) -> Self {
        Self::TruncatedMetadata(msg.into())
    }

    pub fn invalid_object_info(msg: impl Into<String>) -> Self {
        Self::InvalidObjectInfo(msg.into())
    }

    pub fn invalid_mesh(msg: impl Into<String>) -> Self {
        Self::InvalidMesh(msg.into())
    }

    pub fn streaming_info(path: impl Into<String>) -> Self {
        Self::StreamingInfo { path: path.into() }
    }

    /// Whether a caller iterating many items (nodes, objects) should treat this
    /// as local to the current item rather than fatal to the whole operation.
    /// Every variant is node/object-local except [`Self::Cancelled`], which
    /// always aborts the enclosing call regardless of fail-fast settings.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, BinaryError::Cancelled)
    }
}

impl From<std::io::Error> for BinaryError {
    fn from(err: std::io::Error) -> Self {
        Self::CorruptedHeader(format!("I/O error: {err}"))
    }
}

impl From<std::string::FromUtf8Error> for BinaryError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::InvalidUtf8(err.to_string())
    }
}

impl From<std::str::Utf8Error> for BinaryError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::InvalidUtf8(err.to_string())
    }
}

impl From<lz4_flex::block::DecompressError> for BinaryError {
    fn from(err: lz4_flex::block::DecompressError) -> Self {
        Self::Lz4Decompression(err.to_string())
    }
}

impl From<lzma_rs::error::Error> for BinaryError {
    fn from(err: lzma_rs::error::Error) -> Self {
        Self::BlocksInfoParse(format!("LZMA error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eof_message_carries_both_numbers() {
        let err = BinaryError::eof(8, 3);
        assert_eq!(
            err.to_string(),
            "unexpected end of input: wanted 8 bytes, 3 available"
        );
    }

    #[test]
    fn recoverable_classification() {
        assert!(BinaryError::TypeTreeMissing.is_recoverable());
        assert!(!BinaryError::Cancelled.is_recoverable());
    }
}
