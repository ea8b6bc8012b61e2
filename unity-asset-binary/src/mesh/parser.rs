//! Decode a Mesh object's value tree into normalized [`MeshGeometry`].

use super::types::{
    ChannelInfo, CompressedMesh, MeshGeometry, MeshGroup, MeshTopology, PackedBitVector,
    StreamingInfo, Stream, SubMesh, VertexData,
};
use crate::error::{BinaryError, Result};
use unity_asset_core::Value;

/// Resolves a `(path, offset, size)` streaming reference to the bytes it names.
pub type StreamResolver<'a> = dyn Fn(&str, u64, u32) -> Option<Vec<u8>> + 'a;

/// Decode a Mesh object's generic value tree (as produced by
/// [`crate::asset::SerializedFile::read_object_tree`]) into renderer-ready geometry.
pub fn parse_mesh(root: &Value, resolver: Option<&StreamResolver<'_>>) -> Result<MeshGeometry> {
    let name = root.field("m_Name").and_then(Value::as_str).unwrap_or("").to_string();

    let submeshes = parse_submeshes(root.field("m_SubMeshes"))?;
    let use16bit_indices = detect_index_width(root);
    let compression = root.field("m_MeshCompression").and_then(Value::as_i64).unwrap_or(0);

    let index_buffer = resolve_index_buffer(root, resolver)?;

    let (positions, normals, uvs, raw_indices, vertex_count) = if compression != 0 {
        let compressed = parse_compressed_mesh(root.field("m_CompressedMesh"))?;
        let (positions, normals, vertex_count) = decode_compressed_positions_normals(&compressed);
        (positions, normals, None, compressed.triangles.unpack_ints(), vertex_count)
    } else {
        let vertex_data = parse_vertex_data(root.field("m_VertexData"), root, resolver)?;
        let (positions, normals, vertex_count) = decode_interleaved_positions_normals(&vertex_data);
        let uvs = decode_interleaved_uv0(&vertex_data);
        (positions, normals, uvs, decode_index_buffer(&index_buffer, use16bit_indices), vertex_count)
    };

    let (indices, groups) = build_groups(&submeshes, use16bit_indices, &raw_indices)?;

    if positions.len() / 3 != vertex_count && vertex_count != 0 {
        return Err(BinaryError::invalid_mesh(format!(
            "decoded {} positions but vertex_data reports {vertex_count} vertices",
            positions.len() / 3
        )));
    }

    Ok(MeshGeometry {
        name,
        positions,
        normals,
        uvs,
        indices,
        use16bit_indices,
        groups,
    })
}

fn detect_index_width(root: &Value) -> bool {
    if let Some(format) = root.field("m_IndexFormat").and_then(Value::as_i64) {
        return format == 0;
    }
    if let Some(use16bit) = root.field("m_Use16BitIndices").and_then(Value::as_i64) {
        return use16bit != 0;
    }
    true
}

fn parse_submeshes(value: Option<&Value>) -> Result<Vec<SubMesh>> {
    let Some(value) = value else { return Ok(Vec::new()) };
    let seq = value.as_seq().ok_or_else(|| BinaryError::invalid_mesh("m_SubMeshes is not an array"))?;
    seq.iter()
        .map(|entry| {
            let first_byte = entry.field("firstByte").and_then(Value::as_u64).unwrap_or(0) as u32;
            let index_count = entry.field("indexCount").and_then(Value::as_u64).unwrap_or(0) as u32;
            let topology_raw = entry.field("topology").and_then(Value::as_i64).unwrap_or(0);
            let topology = MeshTopology::from_i32(topology_raw)
                .ok_or_else(|| BinaryError::invalid_mesh(format!("unknown submesh topology {topology_raw}")))?;
            let base_vertex = entry.field("baseVertex").and_then(Value::as_u64).unwrap_or(0) as u32;
            let first_vertex = entry.field("firstVertex").and_then(Value::as_u64).unwrap_or(0) as u32;
            let vertex_count = entry.field("vertexCount").and_then(Value::as_u64).unwrap_or(0) as u32;
            Ok(SubMesh { first_byte, index_count, topology, base_vertex, first_vertex, vertex_count })
        })
        .collect()
}

fn parse_streaming_info(value: Option<&Value>) -> StreamingInfo {
    let Some(value) = value else { return StreamingInfo::default() };
    StreamingInfo {
        offset: value.field("offset").and_then(Value::as_u64).unwrap_or(0),
        size: value.field("size").and_then(Value::as_u64).unwrap_or(0) as u32,
        path: value.field("path").and_then(Value::as_str).unwrap_or("").to_string(),
    }
}

fn bytes_of(value: &Value) -> Vec<u8> {
    match value {
        Value::Bytes(b) => b.clone(),
        Value::Seq(items) => items.iter().filter_map(Value::as_i64).map(|v| v as u8).collect(),
        _ => Vec::new(),
    }
}

fn resolve_streamed(info: &StreamingInfo, resolver: Option<&StreamResolver<'_>>) -> Result<Vec<u8>> {
    if !info.is_external() {
        return Ok(Vec::new());
    }
    let resolver = resolver.ok_or_else(|| BinaryError::streaming_info(info.path.clone()))?;
    resolver(&info.path, info.offset, info.size).ok_or_else(|| BinaryError::streaming_info(info.path.clone()))
}

fn resolve_index_buffer(root: &Value, resolver: Option<&StreamResolver<'_>>) -> Result<Vec<u8>> {
    let stream_data = root.field("m_StreamData");
    let info = parse_streaming_info(stream_data);
    if info.is_external() {
        return resolve_streamed(&info, resolver);
    }
    Ok(root.field("m_IndexBuffer").map(bytes_of).unwrap_or_default())
}

fn parse_vertex_data(
    value: Option<&Value>,
    root: &Value,
    resolver: Option<&StreamResolver<'_>>,
) -> Result<VertexData> {
    let Some(value) = value else { return Ok(VertexData::default()) };
    let vertex_count = value.field("m_VertexCount").and_then(Value::as_u64).unwrap_or(0) as u32;

    let channels = value
        .field("m_Channels")
        .and_then(Value::as_seq)
        .map(|arr| {
            arr.iter()
                .map(|c| ChannelInfo {
                    stream: c.field("stream").and_then(Value::as_u64).unwrap_or(0) as u8,
                    offset: c.field("offset").and_then(Value::as_u64).unwrap_or(0) as u8,
                    format: c.field("format").and_then(Value::as_u64).unwrap_or(0) as u8,
                    dimension: c.field("dimension").and_then(Value::as_u64).unwrap_or(0) as u8,
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let streams = value
        .field("m_Streams")
        .and_then(Value::as_seq)
        .map(|arr| {
            arr.iter()
                .map(|s| Stream {
                    channel_mask: s.field("channelMask").and_then(Value::as_u64).unwrap_or(0) as u32,
                    offset: s.field("offset").and_then(Value::as_u64).unwrap_or(0) as u32,
                    stride: s.field("stride").and_then(Value::as_u64).unwrap_or(0) as u32,
                    divider_op: s.field("dividerOp").and_then(Value::as_u64).unwrap_or(0) as u8,
                    frequency: s.field("frequency").and_then(Value::as_u64).unwrap_or(0) as u16,
                })
                .collect()
        })
        .unwrap_or_else(|| derive_single_stream(&channels, vertex_count));

    let stream_data = root.field("m_StreamData");
    let streaming = parse_streaming_info(stream_data);
    let data = if streaming.is_external() {
        resolve_streamed(&streaming, resolver)?
    } else {
        value.field("_typelessdata").or_else(|| value.field("m_DataSize")).map(bytes_of).unwrap_or_default()
    };

    Ok(VertexData { vertex_count, channels, streams, data })
}

/// Unity 5.x encodes a single interleaved stream without an explicit `m_Streams`
/// array; derive one from the channel table so the decoder has a uniform shape.
fn derive_single_stream(channels: &[ChannelInfo], vertex_count: u32) -> Vec<Stream> {
    if channels.is_empty() {
        return Vec::new();
    }
    let stride: u32 = channels
        .iter()
        .map(|c| c.offset as u32 + component_width(c.format) * c.dimension as u32)
        .max()
        .unwrap_or(0);
    let _ = vertex_count;
    vec![Stream { channel_mask: 0, offset: 0, stride, divider_op: 0, frequency: 0 }]
}

/// Byte width of one component for a VertexChannelFormat/VertexFormat code.
/// Covers the common float/half/byte encodings shared across Unity eras;
/// unrecognized codes fall back to 4-byte float, the most common channel format.
fn component_width(format: u8) -> u32 {
    match format {
        0 => 4, // kFloat
        1 => 2, // kFloat16
        2 => 1, // kUNorm8 / byte
        3 => 1, // kSNorm8
        4 => 2, // kUNorm16
        5 => 2, // kSNorm16
        6 => 1, // kUInt8
        7 => 1, // kSInt8
        8 => 2, // kUInt16
        9 => 2, // kSInt16
        10 => 4, // kUInt32
        11 => 4, // kSInt32
        _ => 4,
    }
}

fn read_component(data: &[u8], offset: usize, format: u8) -> f32 {
    match component_width(format) {
        1 => *data.get(offset).unwrap_or(&0) as f32 / 255.0,
        2 => {
            let bytes = [data.get(offset).copied().unwrap_or(0), data.get(offset + 1).copied().unwrap_or(0)];
            half_to_f32(u16::from_le_bytes(bytes))
        }
        _ => {
            let bytes = [
                data.get(offset).copied().unwrap_or(0),
                data.get(offset + 1).copied().unwrap_or(0),
                data.get(offset + 2).copied().unwrap_or(0),
                data.get(offset + 3).copied().unwrap_or(0),
            ];
            f32::from_le_bytes(bytes)
        }
    }
}

fn half_to_f32(half: u16) -> f32 {
    let sign = (half >> 15) & 1;
    let exponent = (half >> 10) & 0x1f;
    let mantissa = half & 0x3ff;
    let value = if exponent == 0 {
        (mantissa as f32) * 2f32.powi(-24)
    } else if exponent == 0x1f {
        if mantissa == 0 { f32::INFINITY } else { f32::NAN }
    } else {
        (1.0 + mantissa as f32 / 1024.0) * 2f32.powi(exponent as i32 - 15)
    };
    if sign == 1 { -value } else { value }
}

/// Channel 0 is always position (3 components), channel 1 normal (3 components)
/// when present, matching Unity's fixed vertex channel layout.
fn decode_channel(vertex_data: &VertexData, channel_index: usize, dim: usize) -> Option<Vec<f32>> {
    let channel = vertex_data.channels.get(channel_index)?;
    if channel.dimension == 0 {
        return None;
    }
    let stream = vertex_data.streams.get(channel.stream as usize)?;
    let vertex_count = vertex_data.vertex_count as usize;
    let mut out = Vec::with_capacity(vertex_count * dim);
    for v in 0..vertex_count {
        let base = stream.offset as usize + v * stream.stride as usize + channel.offset as usize;
        for d in 0..dim.min(channel.dimension as usize) {
            let width = component_width(channel.format) as usize;
            out.push(read_component(&vertex_data.data, base + d * width, channel.format));
        }
        for _ in channel.dimension as usize..dim {
            out.push(0.0);
        }
    }
    Some(out)
}

fn decode_interleaved_positions_normals(vertex_data: &VertexData) -> (Vec<f32>, Option<Vec<f32>>, usize) {
    let positions = decode_channel(vertex_data, 0, 3).unwrap_or_default();
    let normals = decode_channel(vertex_data, 1, 3);
    (positions, normals, vertex_data.vertex_count as usize)
}

fn decode_interleaved_uv0(vertex_data: &VertexData) -> Option<Vec<f32>> {
    decode_channel(vertex_data, 4, 2)
}

fn parse_packed(value: Option<&Value>) -> PackedBitVector {
    let Some(value) = value else { return PackedBitVector::default() };
    PackedBitVector {
        num_items: value.field("m_NumItems").and_then(Value::as_u64).unwrap_or(0) as u32,
        range: value.field("m_Range").and_then(Value::as_f64).unwrap_or(0.0) as f32,
        start: value.field("m_Start").and_then(Value::as_f64).unwrap_or(0.0) as f32,
        data: value.field("m_Data").map(bytes_of).unwrap_or_default(),
        bit_size: value.field("m_BitSize").and_then(Value::as_u64).unwrap_or(0) as u8,
    }
}

fn parse_compressed_mesh(value: Option<&Value>) -> Result<CompressedMesh> {
    let value = value.ok_or_else(|| BinaryError::invalid_mesh("m_MeshCompression set but m_CompressedMesh missing"))?;
    Ok(CompressedMesh {
        vertices: parse_packed(value.field("m_Vertices")),
        uv: parse_packed(value.field("m_UV")),
        normals: parse_packed(value.field("m_Normals")),
        normal_signs: parse_packed(value.field("m_NormalSigns")),
        tangents: parse_packed(value.field("m_Tangents")),
        tangent_signs: parse_packed(value.field("m_TangentSigns")),
        weights: parse_packed(value.field("m_Weights")),
        bone_indices: parse_packed(value.field("m_BoneIndices")),
        triangles: parse_packed(value.field("m_Triangles")),
        float_colors: parse_packed(value.field("m_FloatColors")),
    })
}

/// Reconstruct positions and normals from a CompressedMesh's packed bit vectors.
/// Positions come in XYZ triplets; normals store only XY plus a sign bit per
/// vertex used to reconstruct Z (`z = sqrt(1 - x^2 - y^2)`, negated per the sign).
fn decode_compressed_positions_normals(compressed: &CompressedMesh) -> (Vec<f32>, Option<Vec<f32>>, usize) {
    let positions = compressed.vertices.unpack_floats();
    let vertex_count = positions.len() / 3;

    if compressed.normals.num_items == 0 {
        return (positions, None, vertex_count);
    }

    let xy = compressed.normals.unpack_floats();
    let signs = compressed.normal_signs.unpack_signs();
    let mut normals = Vec::with_capacity(xy.len() / 2 * 3);
    for (i, pair) in xy.chunks(2).enumerate() {
        let (x, y) = (pair[0], pair[1]);
        let z_sq = (1.0 - x * x - y * y).max(0.0);
        let mut z = z_sq.sqrt();
        if signs.get(i).copied().unwrap_or(false) {
            z = -z;
        }
        let len = (x * x + y * y + z * z).sqrt();
        if len > f32::EPSILON {
            normals.extend_from_slice(&[x / len, y / len, z / len]);
        } else {
            normals.extend_from_slice(&[0.0, 0.0, 1.0]);
        }
    }
    (positions, Some(normals), vertex_count)
}

fn decode_index_buffer(buffer: &[u8], use16bit: bool) -> Vec<u32> {
    if use16bit {
        buffer
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]) as u32)
            .collect()
    } else {
        buffer
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }
}

/// Expand each submesh's index range into a flat, triangles-only draw group,
/// converting TriangleStrip/Quads topologies per Unity's standard expansion rules:
/// a strip walks overlapping triples, alternating winding and skipping degenerate
/// triples where two of the three indices repeat; a quad splits into two triangles
/// sharing its first and third corners. Returns the expanded index buffer alongside
/// each submesh's range within it, since expansion changes index counts for
/// strips and the raw submesh byte range no longer applies.
fn build_groups(submeshes: &[SubMesh], use16bit: bool, indices: &[u32]) -> Result<(Vec<u32>, Vec<MeshGroup>)> {
    let stride = if use16bit { 2 } else { 4 };
    let mut expanded = Vec::with_capacity(indices.len());
    let mut groups = Vec::with_capacity(submeshes.len());
    for (material_index, sub) in submeshes.iter().enumerate() {
        let first_index = sub.first_byte as usize / stride;
        let last_index = first_index + sub.index_count as usize;
        if last_index > indices.len() {
            return Err(BinaryError::invalid_mesh(format!(
                "submesh {material_index} references indices [{first_index}, {last_index}) beyond a {}-entry buffer",
                indices.len()
            )));
        }
        let slice = &indices[first_index..last_index];
        let start = expanded.len();
        match sub.topology {
            MeshTopology::Triangles | MeshTopology::Lines | MeshTopology::LineStrip | MeshTopology::Points => {
                expanded.extend_from_slice(slice);
            }
            MeshTopology::TriangleStrip => {
                for i in 0..slice.len().saturating_sub(2) {
                    let (a, b, c) = (slice[i], slice[i + 1], slice[i + 2]);
                    if a == b || b == c || a == c {
                        continue;
                    }
                    if i % 2 == 0 {
                        expanded.extend_from_slice(&[a, b, c]);
                    } else {
                        expanded.extend_from_slice(&[b, a, c]);
                    }
                }
            }
            MeshTopology::Quads => {
                for quad in slice.chunks_exact(4) {
                    expanded.extend_from_slice(&[quad[0], quad[1], quad[2]]);
                    expanded.extend_from_slice(&[quad[0], quad[2], quad[3]]);
                }
            }
        }
        groups.push(MeshGroup {
            start_index: start,
            index_count: expanded.len() - start,
            material_index,
        });
    }
    Ok((expanded, groups))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn map(pairs: Vec<(&str, Value)>) -> Value {
        let mut m = IndexMap::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v);
        }
        Value::Map(m)
    }

    #[test]
    fn packed_positions_and_normals_decode() {
        let compressed = CompressedMesh {
            vertices: PackedBitVector { num_items: 6, range: 2.0, start: -1.0, data: vec![0xFF; 6], bit_size: 8 },
            normals: PackedBitVector { num_items: 2, range: 1.0, start: 0.0, data: vec![0x00, 0x00], bit_size: 8 },
            normal_signs: PackedBitVector { num_items: 1, range: 0.0, start: 0.0, data: vec![0x00], bit_size: 1 },
            ..Default::default()
        };
        let (positions, normals, vertex_count) = decode_compressed_positions_normals(&compressed);
        assert_eq!(vertex_count, 2);
        assert_eq!(positions.len(), 6);
        let normals = normals.unwrap();
        assert_eq!(normals.len(), 3);
        assert!((normals[2] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn decode_index_buffer_reads_16_and_32_bit() {
        let buf16 = vec![1, 0, 2, 0];
        assert_eq!(decode_index_buffer(&buf16, true), vec![1, 2]);
        let buf32 = vec![1, 0, 0, 0, 2, 0, 0, 0];
        assert_eq!(decode_index_buffer(&buf32, false), vec![1, 2]);
    }

    #[test]
    fn parse_mesh_rejects_unknown_topology() {
        let root = map(vec![
            ("m_Name", Value::Str("Cube".into())),
            (
                "m_SubMeshes",
                Value::Seq(vec![map(vec![
                    ("firstByte", Value::UInt(0)),
                    ("indexCount", Value::UInt(3)),
                    ("topology", Value::Int(42)),
                ])]),
            ),
        ]);
        let err = parse_mesh(&root, None).unwrap_err();
        assert!(matches!(err, BinaryError::InvalidMesh(_)));
    }

    #[test]
    fn parse_mesh_without_resolver_errors_on_external_stream() {
        let root = map(vec![
            ("m_Name", Value::Str("Streamed".into())),
            (
                "m_StreamData",
                map(vec![
                    ("offset", Value::UInt(0)),
                    ("size", Value::UInt(12)),
                    ("path", Value::Str("archive:/CAB-1234/CAB-1234.resS".into())),
                ]),
            ),
        ]);
        let err = parse_mesh(&root, None).unwrap_err();
        assert!(matches!(err, BinaryError::StreamingInfo { .. }));
    }
}
