//! An empty SerializedFile (no types, no objects) parses cleanly and reports
//! an empty object table.

mod support;

use support::encode_serialized_file_v19;
use unity_asset_binary::parse_serialized_file;

#[test]
fn empty_file_has_no_objects_or_types() {
    let data = encode_serialized_file_v19("2021.3.21f1", &[], &[]);
    let file = parse_serialized_file(data).unwrap();

    assert_eq!(file.objects().len(), 0);
    assert_eq!(file.types.len(), 0);
    assert_eq!(file.unity_version, "2021.3.21f1");
}

#[test]
fn empty_unity_version_round_trips() {
    let data = encode_serialized_file_v19("", &[], &[]);
    let file = parse_serialized_file(data).unwrap();
    assert_eq!(file.unity_version, "");
}
