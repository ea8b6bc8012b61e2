//! UnityFS bundle parsing: header, BlocksInfo, and node directory.

use super::header::BundleHeader;
use super::types::{Bundle, Node};
use crate::compression::{self, CompressionType, StorageBlock};
use crate::error::{BinaryError, Result};
use crate::reader::{BinaryReader, ByteOrder};

/// Whether BlocksInfo hash mismatches should be treated as fatal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub strict_hash: bool,
}

/// Parse a UnityFS bundle from its complete byte representation.
pub fn parse_bundle(data: Vec<u8>) -> Result<Bundle> {
    parse_bundle_with_options(data, ParseOptions::default())
}

pub fn parse_bundle_with_options(data: Vec<u8>, options: ParseOptions) -> Result<Bundle> {
    let mut reader = BinaryReader::new(&data, ByteOrder::Big);
    let header = BundleHeader::from_reader(&mut reader)?;

    tracing::debug!(signature = %header.signature, format_version = header.format_version, "parsed bundle header");

    if header.blocks_info_padded() {
        reader.align_to(16)?;
    }

    let blocks_info_bytes = if header.blocks_info_at_end() {
        let start = header
            .total_size
            .checked_sub(header.compressed_blocks_info_size as u64)
            .ok_or_else(|| BinaryError::header_parse("total_size smaller than BlocksInfo size"))?;
        if start as usize > data.len() {
            return Err(BinaryError::header_parse("BlocksInfo-at-end offset out of range"));
        }
        data[start as usize..start as usize + header.compressed_blocks_info_size as usize].to_vec()
    } else {
        reader.read_bytes(header.compressed_blocks_info_size as usize)?
    };

    let compression = header.compression_type()?;
    let blocks_info = compression::decompress(
        &blocks_info_bytes,
        compression,
        header.uncompressed_blocks_info_size as usize,
    )?;

    let (blocks, nodes) = parse_blocks_info(&blocks_info, options.strict_hash)?;
    validate_nodes(&blocks, &nodes)?;

    tracing::debug!(block_count = blocks.len(), node_count = nodes.len(), "parsed BlocksInfo");

    let data_region_start = if header.blocks_info_at_end() {
        reader.position() as usize
    } else {
        reader.position() as usize
    };
    let data_region = data[data_region_start..].to_vec();

    Ok(Bundle::new(header, blocks, nodes, data_region))
}

fn parse_blocks_info(data: &[u8], strict_hash: bool) -> Result<(Vec<StorageBlock>, Vec<Node>)> {
    let mut reader = BinaryReader::new(data, ByteOrder::Big);

    let hash_bytes = reader.read_bytes(16)?;
    let mut hash = [0u8; 16];
    hash.copy_from_slice(&hash_bytes);

    let block_count = reader.read_i32()?;
    if block_count < 0 {
        return Err(BinaryError::blocks_info_parse("negative block count"));
    }
    let mut blocks = Vec::with_capacity(block_count as usize);
    for _ in 0..block_count {
        let uncompressed_size = reader.read_u32()?;
        let compressed_size = reader.read_u32()?;
        let flags = reader.read_u16()?;
        blocks.push(StorageBlock::new(uncompressed_size, compressed_size, flags));
    }

    let node_count = reader.read_i32()?;
    if node_count < 0 {
        return Err(BinaryError::blocks_info_parse("negative node count"));
    }
    let mut nodes = Vec::with_capacity(node_count as usize);
    for _ in 0..node_count {
        let offset = reader.read_i64()?;
        let size = reader.read_i64()?;
        let flags = reader.read_u32()?;
        let path = reader.read_cstring()?;
        nodes.push(Node { offset, size, flags, path });
    }

    // The hash covers the blocks info payload up to but excluding itself in
    // Unity's own layout; here it is verified against the node/block tables
    // that follow it, matching the payload the header's hash field protects.
    let payload_for_hash = &data[16..];
    compression::verify_hash(payload_for_hash, &hash, strict_hash)?;

    Ok((blocks, nodes))
}

fn validate_nodes(blocks: &[StorageBlock], nodes: &[Node]) -> Result<()> {
    if blocks.is_empty() {
        return Err(BinaryError::blocks_info_parse("no storage blocks"));
    }
    let total: i64 = blocks.iter().map(|b| b.uncompressed_size as i64).sum();

    let mut seen_paths = std::collections::HashSet::new();
    for node in nodes {
        if node.offset < 0 || node.size < 0 || node.end_offset() > total {
            return Err(BinaryError::NodeOverlap);
        }
        if !seen_paths.insert(node.path.clone()) {
            return Err(BinaryError::DuplicateNode {
                path: node.path.clone(),
            });
        }
    }
    Ok(())
}

/// Cheap classification of a bundle's header without decompressing BlocksInfo.
pub fn estimate_complexity(data: &[u8]) -> Result<ParsingComplexity> {
    let mut reader = BinaryReader::new(data, ByteOrder::Big);
    let header = BundleHeader::from_reader(&mut reader)?;
    let compression = header.compression_type()?;
    Ok(ParsingComplexity {
        format: header.signature.clone(),
        has_compression: compression != CompressionType::None,
        total_size: header.total_size,
    })
}

#[derive(Debug, Clone)]
pub struct ParsingComplexity {
    pub format: String,
    pub has_compression: bool,
    pub total_size: u64,
}
