//! UnityFS bundle header parsing.

use crate::compression::{ArchiveFlags, CompressionType};
use crate::error::{BinaryError, Result};
use crate::reader::BinaryReader;
use serde::{Deserialize, Serialize};

/// Signatures accepted as bundle magic bytes.
pub mod signatures {
    pub const UNITY_FS: &str = "UnityFS";
    pub const UNITY_WEB: &str = "UnityWeb";
    pub const UNITY_RAW: &str = "UnityRaw";
    pub const UNITY_ARCHIVE: &str = "UnityArchive";

    pub const ALL: &[&str] = &[UNITY_FS, UNITY_WEB, UNITY_RAW, UNITY_ARCHIVE];
}

/// The fixed-layout portion of a UnityFS bundle header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleHeader {
    pub signature: String,
    pub format_version: u32,
    pub unity_engine_version: String,
    pub unity_revision: String,
    pub total_size: u64,
    pub compressed_blocks_info_size: u32,
    pub uncompressed_blocks_info_size: u32,
    pub flags: u32,
}

impl BundleHeader {
    /// Parse the fixed header fields. All UnityFS-family signatures share this layout.
    pub fn from_reader(reader: &mut BinaryReader) -> Result<Self> {
        let signature = reader.read_cstring()?;
        if !signatures::ALL.contains(&signature.as_str()) {
            return Err(BinaryError::invalid_bundle_signature(signature));
        }

        let format_version = reader.read_u32()?;
        let unity_engine_version = reader.read_cstring()?;
        let unity_revision = reader.read_cstring()?;
        let total_size = reader.read_u64()?;
        let compressed_blocks_info_size = reader.read_u32()?;
        let uncompressed_blocks_info_size = reader.read_u32()?;
        let flags = reader.read_u32()?;

        Ok(Self {
            signature,
            format_version,
            unity_engine_version,
            unity_revision,
            total_size,
            compressed_blocks_info_size,
            uncompressed_blocks_info_size,
            flags,
        })
    }

    pub fn compression_type(&self) -> Result<CompressionType> {
        CompressionType::from_code((self.flags & ArchiveFlags::COMPRESSION_TYPE_MASK) as u8)
    }

    pub fn blocks_info_at_end(&self) -> bool {
        self.flags & ArchiveFlags::BLOCKS_INFO_AT_END != 0
    }

    pub fn blocks_info_padded(&self) -> bool {
        self.format_version >= 7 && self.flags & ArchiveFlags::BLOCKS_INFO_PADDED != 0
    }
}
