//! A SerializedFile with a Mesh and a Texture2D but no TypeTree: the cheap
//! object-table scan still finds the Mesh, but decoding its body fails with
//! `TypeTreeMissing` rather than silently returning nothing.

mod support;

use support::encode_serialized_file_v19;
use unity_asset_binary::{parse_serialized_file, BinaryError, RenderableDetector};

const MESH: i32 = 43;
const TEXTURE_2D: i32 = 28;

fn two_object_file() -> Vec<u8> {
    encode_serialized_file_v19(
        "2021.3.21f1",
        &[MESH, TEXTURE_2D],
        &[(1, 0, 0, 0), (2, 0, 0, 1)],
    )
}

#[test]
fn renderable_detector_finds_mesh_without_type_tree() {
    assert!(RenderableDetector::has_mesh(two_object_file()).unwrap());
}

#[test]
fn reading_mesh_body_without_type_tree_is_recoverable() {
    let file = parse_serialized_file(two_object_file()).unwrap();
    let mesh_obj = file.find_object(1).unwrap();
    assert_eq!(file.class_id_of(mesh_obj), MESH);

    let err = file.read_object_tree(mesh_obj).unwrap_err();
    assert!(matches!(err, BinaryError::TypeTreeMissing));
    assert!(err.is_recoverable());
}
