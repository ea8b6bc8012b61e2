//! The same node data parses identically whether its BlocksInfo sits right
//! after the header or is appended after the data region.

mod support;

use support::build_bundle;
use unity_asset_binary::parse_bundle;

#[test]
fn inline_and_trailing_blocks_info_produce_the_same_node() {
    let payload = b"hello unityfs world".to_vec();

    let inline = build_bundle(0, false, "CAB-inline", payload.len() as u32, &payload);
    let at_end = build_bundle(0, true, "CAB-inline", payload.len() as u32, &payload);

    let inline_bundle = parse_bundle(inline).unwrap();
    let at_end_bundle = parse_bundle(at_end).unwrap();

    assert_eq!(inline_bundle.nodes().len(), 1);
    assert_eq!(at_end_bundle.nodes().len(), 1);
    assert_eq!(inline_bundle.nodes()[0].path, at_end_bundle.nodes()[0].path);
    assert_eq!(inline_bundle.nodes()[0].offset, at_end_bundle.nodes()[0].offset);
    assert_eq!(inline_bundle.nodes()[0].size, at_end_bundle.nodes()[0].size);

    let inline_bytes = inline_bundle.extract_node(&inline_bundle.nodes()[0]).unwrap();
    let at_end_bytes = at_end_bundle.extract_node(&at_end_bundle.nodes()[0]).unwrap();
    assert_eq!(inline_bytes, payload);
    assert_eq!(at_end_bytes, payload);
}
