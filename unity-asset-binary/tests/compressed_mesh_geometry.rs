//! A compressed Mesh (`m_MeshCompression != 0`) decodes its packed vertex and
//! triangle bit vectors into plain float/index buffers without going through
//! a SerializedFile at all.

use indexmap::IndexMap;
use unity_asset_binary::parse_mesh;
use unity_asset_core::Value;

fn map(pairs: Vec<(&str, Value)>) -> Value {
    let mut m = IndexMap::new();
    for (k, v) in pairs {
        m.insert(k.to_string(), v);
    }
    Value::Map(m)
}

fn packed(num_items: u32, range: f64, start: f64, bit_size: u8, data: Vec<u8>) -> Value {
    map(vec![
        ("m_NumItems", Value::UInt(num_items as u64)),
        ("m_Range", Value::Float(range)),
        ("m_Start", Value::Float(start)),
        ("m_BitSize", Value::UInt(bit_size as u64)),
        ("m_Data", Value::Bytes(data)),
    ])
}

fn compressed_cube_root() -> Value {
    let vertices = packed(12, 2.0, -1.0, 8, vec![0, 64, 128, 192, 255, 10, 20, 30, 40, 50, 60, 70]);
    let triangles = packed(6, 0.0, 0.0, 8, vec![0, 1, 2, 1, 2, 3]);
    let normals = packed(8, 0.0, 0.0, 8, vec![0; 8]);
    let normal_signs = packed(4, 0.0, 0.0, 1, vec![0]);

    map(vec![
        ("m_Name", Value::Str("CompressedQuad".into())),
        ("m_MeshCompression", Value::Int(1)),
        (
            "m_SubMeshes",
            Value::Seq(vec![map(vec![
                ("firstByte", Value::UInt(0)),
                ("indexCount", Value::UInt(6)),
                ("topology", Value::Int(0)),
            ])]),
        ),
        (
            "m_CompressedMesh",
            map(vec![
                ("m_Vertices", vertices),
                ("m_Triangles", triangles),
                ("m_Normals", normals),
                ("m_NormalSigns", normal_signs),
            ]),
        ),
    ])
}

#[test]
fn compressed_mesh_decodes_positions_and_triangle_indices() {
    let root = compressed_cube_root();
    let mesh = parse_mesh(&root, None).unwrap();

    assert_eq!(mesh.positions.len(), 12);
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.indices, vec![0, 1, 2, 1, 2, 3]);
    assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    assert_eq!(mesh.groups.len(), 1);
    assert_eq!(mesh.groups[0].index_count, 6);
}

#[test]
fn compressed_mesh_reconstructs_unit_normals() {
    let root = compressed_cube_root();
    let mesh = parse_mesh(&root, None).unwrap();

    let normals = mesh.normals.unwrap();
    assert_eq!(normals.len(), 12);
    for triple in normals.chunks(3) {
        let len = (triple[0] * triple[0] + triple[1] * triple[1] + triple[2] * triple[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-3);
    }
}
