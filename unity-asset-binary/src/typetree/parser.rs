//! TypeTree parsing: legacy (recursive, per-node strings) and blob (flat
//! record table plus a shared string buffer) on-disk representations.

use super::common_strings;
use super::types::{TypeNode, TypeTree};
use crate::error::{BinaryError, Result};
use crate::reader::BinaryReader;

/// Top bit of a blob-format string offset marks a common-string table index
/// rather than an offset into the local string buffer.
const COMMON_STRING_FLAG: u32 = 0x8000_0000;

/// Select and run the on-disk TypeTree parser for `format_version`, per the
/// selection rule: <10 legacy; 10, 12, and >=12 blob; 11 routed to legacy.
pub fn parse(reader: &mut BinaryReader, format_version: i32) -> Result<TypeTree> {
    if format_version >= 12 || format_version == 10 {
        parse_blob(reader, format_version)
    } else {
        parse_legacy(reader, format_version)
    }
}

/// Blob-format TypeTree: `node_count`, `string_buffer_size`, then that many
/// fixed-width records, then the local string buffer.
pub fn parse_blob(reader: &mut BinaryReader, format_version: i32) -> Result<TypeTree> {
    let node_count = reader.read_i32()?;
    let string_buffer_size = reader.read_i32()?;
    if node_count < 0 || string_buffer_size < 0 {
        return Err(BinaryError::BlocksInfoParse(
            "negative TypeTree node or string buffer size".into(),
        ));
    }

    struct Raw {
        version: i32,
        level: u8,
        type_flags: u8,
        type_str_offset: u32,
        name_str_offset: u32,
        byte_size: i32,
        index: i32,
        meta_flag: i32,
        ref_type_hash: Option<u64>,
    }

    let mut raws = Vec::with_capacity(node_count as usize);
    for _ in 0..node_count {
        let version = reader.read_i16()? as i32;
        let level = reader.read_u8()?;
        let type_flags = reader.read_u8()?;
        let type_str_offset = reader.read_u32()?;
        let name_str_offset = reader.read_u32()?;
        let byte_size = reader.read_i32()?;
        let index = reader.read_i32()?;
        let meta_flag = reader.read_i32()?;
        let ref_type_hash = if format_version >= 19 {
            Some(reader.read_u64()?)
        } else {
            None
        };
        raws.push(Raw {
            version,
            level,
            type_flags,
            type_str_offset,
            name_str_offset,
            byte_size,
            index,
            meta_flag,
            ref_type_hash,
        });
    }

    let string_buffer = reader.read_bytes(string_buffer_size as usize)?;
    let resolve = |offset: u32| -> Result<String> {
        if offset & COMMON_STRING_FLAG != 0 {
            Ok(common_strings::lookup(offset & !COMMON_STRING_FLAG).unwrap_or_default())
        } else {
            read_local_string(&string_buffer, offset)
        }
    };

    let mut flat = Vec::with_capacity(raws.len());
    for raw in raws {
        flat.push((
            raw.level as i32,
            TypeNode {
                level: raw.level as i32,
                type_name: resolve(raw.type_str_offset)?,
                field_name: resolve(raw.name_str_offset)?,
                byte_size: raw.byte_size,
                index: raw.index,
                version: raw.version,
                type_flags: raw.type_flags as i32,
                meta_flag: raw.meta_flag,
                ref_type_hash: raw.ref_type_hash,
                children: Vec::new(),
            },
        ));
    }

    Ok(TypeTree {
        nodes: build_hierarchy(flat),
    })
}

fn read_local_string(buffer: &[u8], offset: u32) -> Result<String> {
    let start = offset as usize;
    if start >= buffer.len() {
        return Ok(String::new());
    }
    let end = buffer[start..]
        .iter()
        .position(|&b| b == 0)
        .map(|p| start + p)
        .unwrap_or(buffer.len());
    String::from_utf8(buffer[start..end].to_vec()).map_err(Into::into)
}

/// Reconstruct parent/child nesting from a flat, depth-annotated node list.
fn build_hierarchy(flat: Vec<(i32, TypeNode)>) -> Vec<TypeNode> {
    fn build(flat: &[(i32, TypeNode)], pos: &mut usize, level: i32) -> Vec<TypeNode> {
        let mut siblings = Vec::new();
        while *pos < flat.len() {
            let (node_level, _) = &flat[*pos];
            if *node_level < level {
                break;
            }
            let mut node = flat[*pos].1.clone();
            *pos += 1;
            node.children = build(flat, pos, level + 1);
            siblings.push(node);
        }
        siblings
    }
    if flat.is_empty() {
        return Vec::new();
    }
    let root_level = flat[0].0;
    let mut pos = 0;
    build(&flat, &mut pos, root_level)
}

/// Legacy TypeTree: each node is read recursively, strings inline as cstrings.
pub fn parse_legacy(reader: &mut BinaryReader, legacy_version: i32) -> Result<TypeTree> {
    let root = read_legacy_node(reader, 0, legacy_version)?;
    Ok(TypeTree { nodes: vec![root] })
}

fn read_legacy_node(reader: &mut BinaryReader, level: i32, legacy_version: i32) -> Result<TypeNode> {
    let type_name = reader.read_cstring()?;
    let field_name = reader.read_cstring()?;
    let byte_size = reader.read_i32()?;

    if legacy_version == 2 {
        reader.read_i32()?; // variable_count, unused
    }

    let index = if legacy_version != 3 {
        reader.read_i32()?
    } else {
        0
    };

    let type_flags = reader.read_i32()?;
    let version = reader.read_i32()?;

    let meta_flag = if legacy_version != 3 {
        reader.read_i32()?
    } else {
        0
    };

    let children_count = reader.read_i32()?;
    if children_count < 0 {
        return Err(BinaryError::BlocksInfoParse(
            "negative TypeTree children count".into(),
        ));
    }

    let mut children = Vec::with_capacity(children_count as usize);
    for _ in 0..children_count {
        children.push(read_legacy_node(reader, level + 1, legacy_version)?);
    }

    Ok(TypeNode {
        level,
        type_name,
        field_name,
        byte_size,
        index,
        version,
        type_flags,
        meta_flag,
        ref_type_hash: None,
        children,
    })
}
