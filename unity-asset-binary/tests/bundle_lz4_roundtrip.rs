//! A UnityFS bundle wrapping one LZ4-compressed node round-trips to the same
//! SerializedFile a direct parse of the uncompressed bytes would produce, and
//! a truncated block fails to decompress instead of silently producing the
//! wrong bytes.

mod support;

use support::{build_bundle, encode_serialized_file_v19};
use unity_asset_binary::{parse_bundle, parse_serialized_file};

fn payload() -> Vec<u8> {
    encode_serialized_file_v19("2021.3.21f1", &[], &[])
}

#[test]
fn lz4_node_round_trips_to_the_same_serialized_file() {
    let payload = payload();
    let compressed = lz4_flex::compress(&payload);
    let data = build_bundle(2, false, "CAB-0000000000000000000000000000", payload.len() as u32, &compressed);

    let bundle = parse_bundle(data).unwrap();
    assert_eq!(bundle.nodes().len(), 1);
    assert_eq!(bundle.nodes()[0].path, "CAB-0000000000000000000000000000");

    let extracted = bundle.extract_node(&bundle.nodes()[0]).unwrap();
    assert_eq!(extracted, payload);

    let file = parse_serialized_file(extracted).unwrap();
    assert_eq!(file.unity_version, "2021.3.21f1");
    assert_eq!(file.objects().len(), 0);
}

#[test]
fn truncated_lz4_block_fails_to_decompress() {
    let payload = payload();
    let compressed = lz4_flex::compress(&payload);
    let corrupted = &compressed[..compressed.len() - 1];
    let data = build_bundle(2, false, "CAB-0000000000000000000000000000", payload.len() as u32, corrupted);

    let bundle = parse_bundle(data).unwrap();
    assert_eq!(bundle.nodes().len(), 1);
    assert!(bundle.extract_node(&bundle.nodes()[0]).is_err());
}
