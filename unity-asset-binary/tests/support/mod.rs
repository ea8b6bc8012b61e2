//! Shared byte-buffer builders for integration tests. Every fixture is built
//! in-process; nothing here reads a checked-in binary file.

pub fn align4(len: usize) -> usize {
    len.div_ceil(4) * 4
}

/// Build a minimal format_version 19 SerializedFile: no TypeTree blobs
/// (`enable_type_tree = false`), wide (`i64`) path ids, narrow (`u32`)
/// byte_start/byte_size. `types` is a list of class ids (no MonoBehaviour
/// script id is ever emitted since none of the test fixtures use it);
/// `objects` is `(path_id, byte_start, byte_size, type_id)`.
pub fn encode_serialized_file_v19(unity_version: &str, types: &[i32], objects: &[(i64, u32, u32, i32)]) -> Vec<u8> {
    let mut metadata = Vec::new();
    metadata.extend_from_slice(unity_version.as_bytes());
    metadata.push(0);
    metadata.extend_from_slice(&0i32.to_le_bytes()); // target_platform
    metadata.push(0); // enable_type_tree = false

    metadata.extend_from_slice(&(types.len() as i32).to_le_bytes());
    for &class_id in types {
        metadata.extend_from_slice(&class_id.to_le_bytes());
        metadata.push(0); // is_stripped_type (version >= 16)
        metadata.extend_from_slice(&(-1i16).to_le_bytes()); // script_type_index (version >= 17)
        metadata.extend_from_slice(&[0u8; 16]); // old_type_hash (version >= 13)
    }

    metadata.extend_from_slice(&(objects.len() as i32).to_le_bytes());
    for &(path_id, byte_start, byte_size, type_id) in objects {
        let pad = align4(metadata.len()) - metadata.len();
        metadata.extend(std::iter::repeat(0u8).take(pad));
        metadata.extend_from_slice(&path_id.to_le_bytes());
        metadata.extend_from_slice(&byte_start.to_le_bytes());
        metadata.extend_from_slice(&byte_size.to_le_bytes());
        metadata.extend_from_slice(&type_id.to_le_bytes());
    }

    metadata.extend_from_slice(&0i32.to_le_bytes()); // script_count (version >= 11)
    metadata.extend_from_slice(&0i32.to_le_bytes()); // externals_count
    metadata.push(0); // user_information terminator

    let data_offset = metadata.len() as u32;
    let file_size = data_offset;

    let mut buf = Vec::new();
    buf.extend_from_slice(&(metadata.len() as u32).to_be_bytes());
    buf.extend_from_slice(&file_size.to_be_bytes());
    buf.extend_from_slice(&19i32.to_be_bytes());
    buf.extend_from_slice(&data_offset.to_be_bytes());
    buf.push(0); // endian: little
    buf.extend_from_slice(&[0, 0, 0]);
    buf.extend_from_slice(&metadata);
    buf
}

/// Build a complete UnityFS bundle wrapping one node. The BlocksInfo payload
/// itself is always stored uncompressed (compression code 0); `compression`
/// selects the compression applied to the node's own storage block.
/// `compressed_payload` is whatever bytes should sit in the data region for
/// that block, letting callers pass truncated/corrupted bytes directly.
pub fn build_bundle(
    compression: u8,
    blocks_info_at_end: bool,
    node_path: &str,
    uncompressed_size: u32,
    compressed_payload: &[u8],
) -> Vec<u8> {
    let mut blocks_info = Vec::new();
    blocks_info.extend_from_slice(&[0u8; 16]); // hash: all-zero, treated as absent
    blocks_info.extend_from_slice(&1i32.to_be_bytes()); // block_count
    blocks_info.extend_from_slice(&uncompressed_size.to_be_bytes());
    blocks_info.extend_from_slice(&(compressed_payload.len() as u32).to_be_bytes());
    blocks_info.extend_from_slice(&(compression as u16).to_be_bytes()); // block flags: compression code only
    blocks_info.extend_from_slice(&1i32.to_be_bytes()); // node_count
    blocks_info.extend_from_slice(&0i64.to_be_bytes()); // offset
    blocks_info.extend_from_slice(&(uncompressed_size as i64).to_be_bytes()); // size
    blocks_info.extend_from_slice(&4u32.to_be_bytes()); // node flags
    blocks_info.extend_from_slice(node_path.as_bytes());
    blocks_info.push(0);

    let header_flags: u32 = if blocks_info_at_end { 0x80 } else { 0 }; // BlocksInfo itself: compression none

    let mut buf = Vec::new();
    buf.extend_from_slice(b"UnityFS\0");
    buf.extend_from_slice(&7u32.to_be_bytes());
    buf.extend_from_slice(b"2021.3.21f1\0");
    buf.extend_from_slice(b"rev\0");

    let total_size_pos = buf.len();
    buf.extend_from_slice(&0u64.to_be_bytes()); // total_size placeholder, patched below
    buf.extend_from_slice(&(blocks_info.len() as u32).to_be_bytes()); // compressed_blocks_info_size
    buf.extend_from_slice(&(blocks_info.len() as u32).to_be_bytes()); // uncompressed_blocks_info_size
    buf.extend_from_slice(&header_flags.to_be_bytes());

    if blocks_info_at_end {
        buf.extend_from_slice(compressed_payload);
        buf.extend_from_slice(&blocks_info);
    } else {
        buf.extend_from_slice(&blocks_info);
        buf.extend_from_slice(compressed_payload);
    }

    let total = buf.len() as u64;
    buf[total_size_pos..total_size_pos + 8].copy_from_slice(&total.to_be_bytes());
    buf
}
