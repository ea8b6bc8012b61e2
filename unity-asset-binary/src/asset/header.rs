//! SerializedFile header parsing.

use crate::error::{BinaryError, Result};
use crate::reader::{BinaryReader, ByteOrder};
use serde::{Deserialize, Serialize};

/// Fixed-layout header of a SerializedFile. Field widths vary by `version`;
/// callers should use the widened `u64` accessors regardless of on-disk width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedFileHeader {
    pub metadata_size: u64,
    pub file_size: u64,
    pub version: i32,
    pub data_offset: u64,
    pub endian: u8,
}

impl SerializedFileHeader {
    pub fn from_reader(reader: &mut BinaryReader) -> Result<Self> {
        let mut metadata_size = reader.read_u32()? as u64;
        let mut file_size = reader.read_u32()? as u64;
        let version = reader.read_i32()?;
        let mut data_offset = reader.read_u32()? as u64;

        let endian;
        if version >= 9 {
            endian = reader.read_u8()?;
            reader.read_bytes(3)?; // reserved
        } else {
            let saved = reader.position();
            if file_size < metadata_size {
                return Err(BinaryError::corrupted_header(
                    "file_size smaller than metadata_size in legacy header",
                ));
            }
            reader.set_position(file_size - metadata_size)?;
            endian = reader.read_u8()?;
            reader.set_position(saved)?;
        }

        if version >= 22 {
            metadata_size = reader.read_u32()? as u64;
            file_size = reader.read_u64()?;
            data_offset = reader.read_u64()?;
            reader.read_u64()?; // reserved
        }

        Ok(Self {
            metadata_size,
            file_size,
            version,
            data_offset,
            endian,
        })
    }

    pub fn byte_order(&self) -> ByteOrder {
        if self.endian == 0 {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.endian > 1 {
            return Err(BinaryError::EndiannessMismatch { value: self.endian });
        }
        if self.metadata_size == 0 {
            return Err(BinaryError::corrupted_header("metadata_size is zero"));
        }
        if self.data_offset < self.metadata_size && self.version >= 9 {
            return Err(BinaryError::corrupted_header(
                "data_offset cannot be less than metadata_size",
            ));
        }
        if self.file_size < self.data_offset {
            return Err(BinaryError::corrupted_header(
                "file_size cannot be less than data_offset",
            ));
        }
        Ok(())
    }

    pub fn supports_type_trees(&self) -> bool {
        self.version >= 7
    }

    pub fn supports_script_types(&self) -> bool {
        self.version >= 11
    }

    pub fn uses_wide_path_ids(&self) -> bool {
        self.version >= 14
    }
}

impl Default for SerializedFileHeader {
    fn default() -> Self {
        Self {
            metadata_size: 0,
            file_size: 0,
            version: 19,
            data_offset: 0,
            endian: 0,
        }
    }
}

/// Version thresholds that gate header and body layout changes.
pub mod versions {
    pub const FIRST_WITH_TYPETREE: i32 = 7;
    pub const FIRST_WITH_ENDIAN_FLAG: i32 = 9;
    pub const FIRST_WITH_SCRIPT_TYPES: i32 = 11;
    pub const FIRST_WITH_WIDE_PATH_IDS: i32 = 14;
    pub const FIRST_WITH_REF_TYPES: i32 = 20;
    pub const FIRST_WITH_WIDE_HEADER: i32 = 22;
}
