//! SerializedFile body records: type catalogue, object table, and external
//! file references.

use crate::error::{BinaryError, Result};
use crate::reader::BinaryReader;
use crate::typetree::{parse_type_tree, TypeTree};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of a SerializedFile's type catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedType {
    pub class_id: i32,
    pub is_stripped_type: bool,
    pub script_type_index: Option<i16>,
    pub type_tree: TypeTree,
    pub script_id: [u8; 16],
    pub old_type_hash: [u8; 16],
    pub type_dependencies: Vec<i32>,
    pub class_name: String,
    pub namespace: String,
    pub assembly_name: String,
}

impl SerializedType {
    pub fn new(class_id: i32) -> Self {
        Self {
            class_id,
            is_stripped_type: false,
            script_type_index: None,
            type_tree: TypeTree::new(),
            script_id: [0; 16],
            old_type_hash: [0; 16],
            type_dependencies: Vec::new(),
            class_name: String::new(),
            namespace: String::new(),
            assembly_name: String::new(),
        }
    }

    /// Parse one `SerializedType` record per §4.4: the script/script-hash
    /// fields and TypeTree body are all gated on `format_version`.
    pub fn from_reader(reader: &mut BinaryReader, format_version: i32, has_type_tree: bool) -> Result<Self> {
        let class_id = reader.read_i32()?;
        let mut stype = Self::new(class_id);

        if format_version >= 16 {
            stype.is_stripped_type = reader.read_bool()?;
        }

        if format_version >= 17 {
            stype.script_type_index = Some(reader.read_i16()?);
        }

        if format_version >= 13 {
            let reads_script_id = if format_version < 16 {
                class_id < 0
            } else {
                class_id == unity_asset_core::constants::class_ids::MONO_BEHAVIOUR
            };
            if reads_script_id {
                stype.script_id.copy_from_slice(&reader.read_bytes(16)?);
            }
            stype.old_type_hash.copy_from_slice(&reader.read_bytes(16)?);
        }

        if has_type_tree {
            stype.type_tree = parse_type_tree(reader, format_version)?;

            if format_version >= 21 {
                let dep_count = reader.read_i32()?;
                if dep_count < 0 {
                    return Err(BinaryError::InvalidObjectInfo(
                        "negative type_dependencies count".into(),
                    ));
                }
                for _ in 0..dep_count {
                    stype.type_dependencies.push(reader.read_i32()?);
                }
            }
        }

        Ok(stype)
    }

    pub fn is_script_type(&self) -> bool {
        self.class_id == unity_asset_core::constants::class_ids::MONO_BEHAVIOUR
            || self.script_type_index.is_some()
    }

    pub fn has_type_tree(&self) -> bool {
        !self.type_tree.is_empty()
    }

    pub fn type_name(&self) -> String {
        if !self.class_name.is_empty() {
            self.class_name.clone()
        } else {
            unity_asset_core::get_class_name(self.class_id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Class_{}", self.class_id))
        }
    }
}

/// One entry of the (format_version >= 11) script type table: a local
/// reference from a MonoScript's serialized index to its object identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptTypeInfo {
    pub local_serialized_file_index: i32,
    pub local_identifier_in_file: i64,
}

impl ScriptTypeInfo {
    pub fn from_reader(reader: &mut BinaryReader, format_version: i32) -> Result<Self> {
        let local_serialized_file_index = reader.read_i32()?;
        let local_identifier_in_file = if format_version >= 14 {
            reader.align()?;
            reader.read_i64()?
        } else {
            reader.read_i32()? as i64
        };
        Ok(Self {
            local_serialized_file_index,
            local_identifier_in_file,
        })
    }
}

/// One entry of the (format_version >= 20) ref_types table: a [`SerializedType`]
/// record extended with the class/namespace/assembly name of the referenced type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefType {
    pub serialized_type: SerializedType,
}

impl RefType {
    pub fn from_reader(reader: &mut BinaryReader, format_version: i32, has_type_tree: bool) -> Result<Self> {
        let mut serialized_type = SerializedType::from_reader(reader, format_version, has_type_tree)?;
        serialized_type.class_name = reader.read_cstring()?;
        serialized_type.namespace = reader.read_cstring()?;
        serialized_type.assembly_name = reader.read_cstring()?;
        Ok(Self { serialized_type })
    }
}

/// A reference to an object in another Unity file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileIdentifier {
    pub guid: [u8; 16],
    pub type_: i32,
    pub path: String,
}

impl FileIdentifier {
    /// Parse one `externals` table entry: `{guid (>=6), type (>=5), path: cstr}`.
    pub fn from_reader(reader: &mut BinaryReader, format_version: i32) -> Result<Self> {
        let guid = if format_version >= 6 {
            let bytes = reader.read_bytes(16)?;
            let mut g = [0u8; 16];
            g.copy_from_slice(&bytes);
            g
        } else {
            [0; 16]
        };

        let type_ = if format_version >= 5 { reader.read_i32()? } else { 0 };
        let path = reader.read_cstring()?;

        Ok(Self { guid, type_, path })
    }

    pub fn guid_string(&self) -> String {
        format!(
            "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.guid[0], self.guid[1], self.guid[2], self.guid[3],
            self.guid[4], self.guid[5], self.guid[6], self.guid[7],
            self.guid[8], self.guid[9], self.guid[10], self.guid[11],
            self.guid[12], self.guid[13], self.guid[14], self.guid[15]
        )
    }
}

/// One object table entry: locates an object's body and names its type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub path_id: i64,
    pub byte_start: u64,
    pub byte_size: u32,
    pub type_id: i32,
    pub class_id: Option<i16>,
    pub is_destroyed: Option<u16>,
    pub stripped: Option<u8>,
}

impl ObjectInfo {
    /// Parse one object table entry per §4.4 step 6, including the version
    /// 15/16 extra fields and the version >=14 4-byte table alignment (handled
    /// by the caller before invoking this).
    pub fn from_reader(reader: &mut BinaryReader, format_version: i32, data_offset: u64) -> Result<Self> {
        let path_id = if format_version < 14 {
            reader.read_i32()? as i64
        } else {
            reader.read_i64()?
        };

        let byte_start = if format_version >= 22 {
            reader.read_u64()?
        } else {
            reader.read_u32()? as u64
        } + data_offset;

        let byte_size = reader.read_u32()?;
        let type_id = reader.read_i32()?;

        let (class_id, is_destroyed) = if (15..=16).contains(&format_version) {
            (Some(reader.read_i16()?), Some(reader.read_u16()?))
        } else {
            (None, None)
        };

        let stripped = if format_version == 16 {
            Some(reader.read_u8()?)
        } else {
            None
        };

        Ok(Self {
            path_id,
            byte_start,
            byte_size,
            type_id,
            class_id,
            is_destroyed,
            stripped,
        })
    }

    pub fn byte_end(&self) -> u64 {
        self.byte_start + self.byte_size as u64
    }
}

/// Lookup table from class id (and script index) to registered [`SerializedType`].
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: HashMap<i32, SerializedType>,
    script_types: HashMap<i16, SerializedType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_type(&mut self, stype: SerializedType) {
        if let Some(index) = stype.script_type_index {
            self.script_types.insert(index, stype.clone());
        }
        self.types.insert(stype.class_id, stype);
    }

    pub fn get_type(&self, class_id: i32) -> Option<&SerializedType> {
        self.types.get(&class_id)
    }

    pub fn get_script_type(&self, index: i16) -> Option<&SerializedType> {
        self.script_types.get(&index)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
