//! Normalized mesh geometry output, and the packed/compressed on-disk
//! representations it is decoded from.

use serde::{Deserialize, Serialize};

/// Unity's primitive topology enum, as stored per-submesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshTopology {
    Triangles = 0,
    TriangleStrip = 1,
    Quads = 2,
    Lines = 3,
    LineStrip = 4,
    Points = 5,
}

impl MeshTopology {
    pub fn from_i32(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Triangles),
            1 => Some(Self::TriangleStrip),
            2 => Some(Self::Quads),
            3 => Some(Self::Lines),
            4 => Some(Self::LineStrip),
            5 => Some(Self::Points),
            _ => None,
        }
    }
}

/// One submesh descriptor: an index-buffer range plus the vertex range it draws from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubMesh {
    pub first_byte: u32,
    pub index_count: u32,
    pub topology: MeshTopology,
    pub base_vertex: u32,
    pub first_vertex: u32,
    pub vertex_count: u32,
}

/// A reference to vertex/index data living outside the bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamingInfo {
    pub offset: u64,
    pub size: u32,
    pub path: String,
}

impl StreamingInfo {
    pub fn is_external(&self) -> bool {
        !self.path.is_empty() && self.size > 0
    }
}

/// One vertex channel: which stream it lives in, its byte offset within the
/// stream's stride, its on-disk format code, and its component count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub stream: u8,
    pub offset: u8,
    pub format: u8,
    pub dimension: u8,
}

/// One interleaved vertex stream: byte stride and which channels live in it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stream {
    pub channel_mask: u32,
    pub offset: u32,
    pub stride: u32,
    pub divider_op: u8,
    pub frequency: u16,
}

/// Uncompressed, interleaved vertex buffer plus its channel/stream layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VertexData {
    pub vertex_count: u32,
    pub channels: Vec<ChannelInfo>,
    pub streams: Vec<Stream>,
    pub data: Vec<u8>,
}

/// A quantized array: `num_items` values of `bit_size` bits each, packed
/// contiguously into `data`, decodable as floats, raw ints, or sign bits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackedBitVector {
    pub num_items: u32,
    pub range: f32,
    pub start: f32,
    pub data: Vec<u8>,
    pub bit_size: u8,
}

impl PackedBitVector {
    fn read_bits(&self, index: usize) -> u32 {
        if self.bit_size == 0 {
            return 0;
        }
        let bit_pos = index * self.bit_size as usize;
        let mut value: u32 = 0;
        for b in 0..self.bit_size as usize {
            let bit_index = bit_pos + b;
            let byte = self.data.get(bit_index / 8).copied().unwrap_or(0);
            let bit = (byte >> (bit_index % 8)) & 1;
            value |= (bit as u32) << b;
        }
        value
    }

    /// Decode `num_items` quantized floats: `start + (raw / max) * range`.
    pub fn unpack_floats(&self) -> Vec<f32> {
        let max = if self.bit_size == 0 {
            1.0
        } else {
            ((1u64 << self.bit_size) - 1) as f32
        };
        (0..self.num_items as usize)
            .map(|i| self.start + (self.read_bits(i) as f32 / max) * self.range)
            .collect()
    }

    /// Decode `num_items` raw unsigned integers (indices, bone indices).
    pub fn unpack_ints(&self) -> Vec<u32> {
        (0..self.num_items as usize).map(|i| self.read_bits(i)).collect()
    }

    /// Decode a one-bit-per-item sign field; `true` means negative.
    pub fn unpack_signs(&self) -> Vec<bool> {
        (0..self.num_items as usize).map(|i| self.read_bits(i) != 0).collect()
    }
}

/// The `mesh_compression != 0` on-disk representation: every stream packed
/// into its own quantized bit vector instead of an interleaved byte buffer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompressedMesh {
    pub vertices: PackedBitVector,
    pub uv: PackedBitVector,
    pub normals: PackedBitVector,
    pub normal_signs: PackedBitVector,
    pub tangents: PackedBitVector,
    pub tangent_signs: PackedBitVector,
    pub weights: PackedBitVector,
    pub bone_indices: PackedBitVector,
    pub triangles: PackedBitVector,
    pub float_colors: PackedBitVector,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub center: [f32; 3],
    pub extent: [f32; 3],
}

/// One draw group in the normalized output, one per submesh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshGroup {
    pub start_index: usize,
    pub index_count: usize,
    pub material_index: usize,
}

/// Normalized, renderer-ready geometry for one Mesh object: the public
/// output of [`super::parser::parse_mesh`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshGeometry {
    pub name: String,
    pub positions: Vec<f32>,
    pub normals: Option<Vec<f32>>,
    pub uvs: Option<Vec<f32>>,
    pub indices: Vec<u32>,
    pub use16bit_indices: bool,
    pub groups: Vec<MeshGroup>,
}

impl MeshGeometry {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_bit_vector_unpacks_8bit_floats() {
        let packed = PackedBitVector {
            num_items: 2,
            range: 10.0,
            start: 0.0,
            data: vec![0x00, 0xFF],
            bit_size: 8,
        };
        let floats = packed.unpack_floats();
        assert_eq!(floats[0], 0.0);
        assert!((floats[1] - 10.0).abs() < 1e-3);
    }

    #[test]
    fn packed_bit_vector_unpacks_sub_byte_ints() {
        // Two 4-bit values packed into a single byte: low nibble then high nibble.
        let packed = PackedBitVector {
            num_items: 2,
            range: 0.0,
            start: 0.0,
            data: vec![0b0101_0011],
            bit_size: 4,
        };
        let ints = packed.unpack_ints();
        assert_eq!(ints, vec![0b0011, 0b0101]);
    }

    #[test]
    fn topology_from_i32_rejects_unknown() {
        assert!(MeshTopology::from_i32(99).is_none());
        assert_eq!(MeshTopology::from_i32(1), Some(MeshTopology::TriangleStrip));
    }
}
