//! Bundle data structures: the parsed BlocksInfo table and the resulting virtual nodes.

use crate::compression::StorageBlock;
use crate::error::{BinaryError, Result};
use serde::{Deserialize, Serialize};

use super::header::BundleHeader;

/// A virtual file entry inside a bundle's decompressed data region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub offset: i64,
    pub size: i64,
    pub flags: u32,
    pub path: String,
}

impl Node {
    pub fn end_offset(&self) -> i64 {
        self.offset + self.size
    }
}

/// Default cap on a single node extraction, guarding against adversarial
/// size fields inflating memory use far past the bundle's own declared size.
pub const DEFAULT_MAX_EXTRACTION_BYTES: u64 = 256 * 1024 * 1024;

/// A parsed UnityFS bundle: header, compressed block table, and node directory.
/// Holds the bundle's raw bytes so that node extraction can happen lazily,
/// decompressing only the blocks a given node actually spans.
pub struct Bundle {
    pub header: BundleHeader,
    pub blocks: Vec<StorageBlock>,
    pub nodes: Vec<Node>,
    /// Compressed bytes of the data region (concatenation of each block's payload).
    data: Vec<u8>,
    /// Byte offset within `data` where each block's compressed payload starts.
    block_offsets: Vec<usize>,
    pub max_extraction_bytes: u64,
}

impl Bundle {
    pub fn new(header: BundleHeader, blocks: Vec<StorageBlock>, nodes: Vec<Node>, data: Vec<u8>) -> Self {
        let mut block_offsets = Vec::with_capacity(blocks.len());
        let mut pos = 0usize;
        for block in &blocks {
            block_offsets.push(pos);
            pos += block.compressed_size as usize;
        }
        Self {
            header,
            blocks,
            nodes,
            data,
            block_offsets,
            max_extraction_bytes: DEFAULT_MAX_EXTRACTION_BYTES,
        }
    }

    /// Ordered iteration over the bundle's virtual files, on-disk order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn uncompressed_block_bounds(&self) -> Vec<(i64, i64)> {
        let mut bounds = Vec::with_capacity(self.blocks.len());
        let mut pos = 0i64;
        for block in &self.blocks {
            let start = pos;
            let end = start + block.uncompressed_size as i64;
            bounds.push((start, end));
            pos = end;
        }
        bounds
    }

    /// Decompress only the blocks spanning `[node.offset, node.offset + node.size)`
    /// and return the slice of bytes belonging to that node.
    pub fn extract_node(&self, node: &Node) -> Result<Vec<u8>> {
        if node.size < 0 || node.offset < 0 {
            return Err(BinaryError::bounds("negative node offset/size"));
        }
        if node.size as u64 > self.max_extraction_bytes {
            return Err(BinaryError::bounds(format!(
                "node '{}' size {} exceeds extraction cap {}",
                node.path, node.size, self.max_extraction_bytes
            )));
        }

        let bounds = self.uncompressed_block_bounds();
        let want_start = node.offset;
        let want_end = node.end_offset();

        let mut out = Vec::with_capacity(node.size as usize);
        for (i, (start, end)) in bounds.iter().enumerate() {
            if *end <= want_start || *start >= want_end {
                continue;
            }
            let block = &self.blocks[i];
            let block_offset = self.block_offsets[i];
            let compressed = &self.data[block_offset..block_offset + block.compressed_size as usize];
            let decompressed = block.decompress(compressed)?;

            let clip_start = (want_start - *start).max(0) as usize;
            let clip_end = ((want_end - *start).min(*end - *start)) as usize;
            out.extend_from_slice(&decompressed[clip_start..clip_end]);
        }

        if out.len() != node.size as usize {
            return Err(BinaryError::NodeOverlap);
        }
        Ok(out)
    }

    /// Decompress the entire data region in one pass. Prefer [`Bundle::extract_node`]
    /// when only specific nodes are needed.
    pub fn decompress_all(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for (i, block) in self.blocks.iter().enumerate() {
            let block_offset = self.block_offsets[i];
            let compressed = &self.data[block_offset..block_offset + block.compressed_size as usize];
            out.extend(block.decompress(compressed)?);
        }
        Ok(out)
    }

    pub fn total_uncompressed_size(&self) -> i64 {
        self.blocks.iter().map(|b| b.uncompressed_size as i64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::header::BundleHeader;

    #[test]
    fn extract_node_slices_single_uncompressed_block() {
        let header = BundleHeader::default();
        let blocks = vec![StorageBlock::new(8, 8, 0)];
        let data = b"abcdefgh".to_vec();
        let nodes = vec![Node {
            offset: 2,
            size: 4,
            flags: 0,
            path: "n".into(),
        }];
        let bundle = Bundle::new(header, blocks, nodes.clone(), data);
        let extracted = bundle.extract_node(&nodes[0]).unwrap();
        assert_eq!(extracted, b"cdef");
    }

    #[test]
    fn oversized_node_is_rejected() {
        let header = BundleHeader::default();
        let blocks = vec![StorageBlock::new(8, 8, 0)];
        let data = b"abcdefgh".to_vec();
        let node = Node {
            offset: 0,
            size: (DEFAULT_MAX_EXTRACTION_BYTES + 1) as i64,
            flags: 0,
            path: "n".into(),
        };
        let bundle = Bundle::new(header, blocks, vec![node.clone()], data);
        assert!(bundle.extract_node(&node).is_err());
    }
}
