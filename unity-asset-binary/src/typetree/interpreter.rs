//! Generic TypeTree-driven object decoder: walks a [`TypeNode`] tree against
//! a cursor positioned at the start of an object's body and produces a
//! [`Value`] tree.

use super::types::{TypeNode, ALIGN_BYTES};
use crate::error::{BinaryError, Result};
use crate::reader::BinaryReader;
use unity_asset_core::Value;

/// Context threaded through recursive decoding; only the path_id width
/// (version-dependent) is needed beyond the node tree itself.
#[derive(Debug, Clone, Copy)]
pub struct InterpreterContext {
    pub wide_path_ids: bool,
}

/// Decode one object body using `root` as the top-level TypeNode.
pub fn read_object(reader: &mut BinaryReader, root: &TypeNode, ctx: InterpreterContext) -> Result<Value> {
    read_node(reader, root, ctx)
}

fn read_node(reader: &mut BinaryReader, node: &TypeNode, ctx: InterpreterContext) -> Result<Value> {
    let value = read_node_value(reader, node, ctx)?;
    if node.meta_flag & ALIGN_BYTES != 0 {
        reader.align_to(4)?;
    }
    Ok(value)
}

fn read_node_value(reader: &mut BinaryReader, node: &TypeNode, ctx: InterpreterContext) -> Result<Value> {
    if node.is_pptr() {
        let file_id = reader.read_i32()?;
        let path_id = if ctx.wide_path_ids {
            reader.read_i64()?
        } else {
            reader.read_i32()? as i64
        };
        let mut map = indexmap::IndexMap::new();
        map.insert("m_FileID".to_string(), Value::Int(file_id as i64));
        map.insert("m_PathID".to_string(), Value::Int(path_id));
        return Ok(Value::Map(map));
    }

    if node.is_string() {
        let length = reader.read_i32()?;
        if length < 0 {
            return Err(BinaryError::Bounds("negative string length".into()));
        }
        let bytes = reader.read_bytes(length as usize)?;
        let s = String::from_utf8(bytes)?;
        if let Some(array_child) = node.find_child("Array") {
            if array_child.meta_flag & ALIGN_BYTES != 0 {
                reader.align_to(4)?;
            }
        }
        return Ok(Value::Str(s));
    }

    if node.is_array() {
        return read_array(reader, node, ctx);
    }

    if let Some(primitive) = read_primitive(reader, node)? {
        return Ok(primitive);
    }

    if !node.children.is_empty() {
        let mut map = indexmap::IndexMap::new();
        for child in &node.children {
            map.insert(child.field_name.clone(), read_node(reader, child, ctx)?);
        }
        return Ok(Value::Map(map));
    }

    // Unknown primitive with no children: treat declared byte_size as an
    // opaque blob rather than fail outright.
    if node.byte_size > 0 {
        return Ok(Value::Bytes(reader.read_bytes(node.byte_size as usize)?));
    }

    Ok(Value::Null)
}

fn read_array(reader: &mut BinaryReader, node: &TypeNode, ctx: InterpreterContext) -> Result<Value> {
    let size_node = node.find_child("size");
    let data_node = node
        .find_child("data")
        .ok_or_else(|| BinaryError::InvalidObjectInfo("Array node missing 'data' child".into()))?;

    let _ = size_node;
    let count = reader.read_i32()?;
    if count < 0 {
        return Err(BinaryError::Bounds("negative array length".into()));
    }

    if let Some(width) = fixed_primitive_width(data_node) {
        let bytes = reader.read_bytes(count as usize * width)?;
        return Ok(Value::Bytes(bytes));
    }

    let mut items = Vec::with_capacity(count as usize);
    for _ in 0..count {
        items.push(read_node(reader, data_node, ctx)?);
    }
    Ok(Value::Seq(items))
}

fn fixed_primitive_width(node: &TypeNode) -> Option<usize> {
    if !node.children.is_empty() {
        return None;
    }
    match node.type_name.as_str() {
        "SInt8" | "UInt8" | "char" | "bool" => Some(1),
        "SInt16" | "UInt16" => Some(2),
        "SInt32" | "UInt32" | "int" | "unsigned int" | "float" => Some(4),
        "SInt64" | "UInt64" | "double" | "long long" | "unsigned long long" => Some(8),
        _ => None,
    }
}

fn read_primitive(reader: &mut BinaryReader, node: &TypeNode) -> Result<Option<Value>> {
    let canonical_width = fixed_primitive_width(node);
    let width = if node.byte_size > 0 {
        node.byte_size as usize
    } else {
        match canonical_width {
            Some(w) => w,
            None => return Ok(None),
        }
    };

    let value = match node.type_name.as_str() {
        "SInt8" => Value::Int(reader.read_i8()? as i64),
        "UInt8" | "char" => Value::UInt(reader.read_u8()? as u64),
        "SInt16" => Value::Int(reader.read_i16()? as i64),
        "UInt16" => Value::UInt(reader.read_u16()? as u64),
        "SInt32" | "int" => Value::Int(reader.read_i32()? as i64),
        "UInt32" | "unsigned int" => Value::UInt(reader.read_u32()? as u64),
        "SInt64" | "long long" => Value::Int(reader.read_i64()?),
        "UInt64" | "unsigned long long" => Value::UInt(reader.read_u64()?),
        "float" => Value::Float(reader.read_f32()? as f64),
        "double" => Value::Float(reader.read_f64()?),
        "bool" => Value::Bool(reader.read_u8()? != 0),
        _ => {
            let _ = width;
            return Ok(None);
        }
    };
    Ok(Some(value))
}
