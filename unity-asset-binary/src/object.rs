//! Cheap object-table queries that don't require decoding any object body.

use crate::asset::parse_serialized_file;
use crate::error::Result;
use unity_asset_core::constants::class_ids;

/// Answers "does this file contain a Mesh?" by scanning the object table's
/// class ids, without decoding any object body or requiring a type tree.
pub struct RenderableDetector;

impl RenderableDetector {
    pub fn has_mesh(serialized_file_bytes: Vec<u8>) -> Result<bool> {
        let file = parse_serialized_file(serialized_file_bytes)?;
        Ok(file
            .objects()
            .iter()
            .any(|obj| file.class_id_of(obj) == class_ids::MESH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_empty_v19() -> Vec<u8> {
        let mut metadata = Vec::new();
        metadata.push(0); // unity_version terminator (empty string)
        metadata.extend_from_slice(&0i32.to_le_bytes()); // target_platform
        metadata.push(0); // enable_type_tree
        metadata.extend_from_slice(&0i32.to_le_bytes()); // type_count
        metadata.extend_from_slice(&0i32.to_le_bytes()); // object_count
        metadata.extend_from_slice(&0i32.to_le_bytes()); // script_count
        metadata.extend_from_slice(&0i32.to_le_bytes()); // externals_count
        metadata.push(0); // user_information terminator

        let data_offset = 32u32;
        let mut buf = Vec::new();
        buf.extend_from_slice(&(metadata.len() as u32).to_be_bytes());
        buf.extend_from_slice(&(data_offset + metadata.len() as u32).to_be_bytes());
        buf.extend_from_slice(&19i32.to_be_bytes());
        buf.extend_from_slice(&data_offset.to_be_bytes());
        buf.push(0); // endian: little
        buf.extend_from_slice(&[0, 0, 0]);
        buf.extend_from_slice(&metadata);
        buf
    }

    #[test]
    fn empty_file_has_no_mesh() {
        assert!(!RenderableDetector::has_mesh(encode_empty_v19()).unwrap());
    }
}
