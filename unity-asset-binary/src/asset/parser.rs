//! SerializedFile body assembly: orchestrates the header and per-record
//! readers in `types` into one complete, queryable `SerializedFile`.

use super::header::SerializedFileHeader;
use super::types::{FileIdentifier, ObjectInfo, RefType, ScriptTypeInfo, SerializedType, TypeRegistry};
use crate::error::{BinaryError, Result};
use crate::reader::{BinaryReader, ByteOrder};
use crate::typetree::{read_object, InterpreterContext};
use unity_asset_core::Value;

/// Parse a complete SerializedFile from its binary representation.
pub fn parse_serialized_file(data: Vec<u8>) -> Result<SerializedFile> {
    let mut reader = BinaryReader::new(&data, ByteOrder::Big);
    let header = SerializedFileHeader::from_reader(&mut reader)?;
    header.validate()?;

    reader.set_byte_order(header.byte_order());

    let mut file = SerializedFile {
        header,
        unity_version: String::new(),
        target_platform: 0,
        enable_type_tree: false,
        types: Vec::new(),
        big_id_enabled: false,
        objects: Vec::new(),
        script_types: Vec::new(),
        externals: Vec::new(),
        ref_types: Vec::new(),
        user_information: String::new(),
        data: Vec::new(),
    };

    parse_metadata(&mut file, &mut reader)?;
    tracing::debug!(
        version = file.header.version,
        object_count = file.objects.len(),
        type_count = file.types.len(),
        "parsed SerializedFile metadata"
    );
    file.data = data;
    Ok(file)
}

fn parse_metadata(file: &mut SerializedFile, reader: &mut BinaryReader) -> Result<()> {
    let version = file.header.version;

    if version >= 7 {
        file.unity_version = reader.read_cstring()?;
    }
    if version >= 8 {
        file.target_platform = reader.read_i32()?;
    }
    if version >= 13 {
        file.enable_type_tree = reader.read_bool()?;
    }

    let type_count = reader.read_i32()?;
    if type_count < 0 {
        return Err(BinaryError::truncated_metadata("negative type count"));
    }
    for _ in 0..type_count {
        file.types
            .push(SerializedType::from_reader(reader, version, file.enable_type_tree)?);
    }

    if version >= 7 && version < 14 {
        file.big_id_enabled = reader.read_bool()?;
    }

    let object_count = reader.read_i32()?;
    if object_count < 0 {
        return Err(BinaryError::truncated_metadata("negative object count"));
    }
    let mut seen_path_ids = std::collections::HashSet::new();
    for _ in 0..object_count {
        if version >= 14 {
            reader.align()?;
        }
        let obj = ObjectInfo::from_reader(reader, version, file.header.data_offset)?;
        if !seen_path_ids.insert(obj.path_id) {
            return Err(BinaryError::DuplicatePathId { path_id: obj.path_id });
        }
        file.objects.push(obj);
    }

    if version >= 11 {
        let script_count = reader.read_i32()?;
        if script_count < 0 {
            return Err(BinaryError::truncated_metadata("negative script type count"));
        }
        for _ in 0..script_count {
            file.script_types.push(ScriptTypeInfo::from_reader(reader, version)?);
        }
    }

    let external_count = reader.read_i32()?;
    if external_count < 0 {
        return Err(BinaryError::truncated_metadata("negative externals count"));
    }
    for _ in 0..external_count {
        file.externals.push(FileIdentifier::from_reader(reader, version)?);
    }

    if version >= 20 {
        let ref_type_count = reader.read_i32()?;
        if ref_type_count < 0 {
            return Err(BinaryError::truncated_metadata("negative ref_type count"));
        }
        for _ in 0..ref_type_count {
            file.ref_types
                .push(RefType::from_reader(reader, version, file.enable_type_tree)?);
        }
    }

    if version >= 5 {
        file.user_information = reader.read_cstring()?;
    }

    Ok(())
}

/// A fully parsed SerializedFile: header, type catalogue, and object table,
/// plus the raw bytes object bodies are sliced out of.
#[derive(Debug)]
pub struct SerializedFile {
    pub header: SerializedFileHeader,
    pub unity_version: String,
    pub target_platform: i32,
    pub enable_type_tree: bool,
    pub types: Vec<SerializedType>,
    pub big_id_enabled: bool,
    pub objects: Vec<ObjectInfo>,
    pub script_types: Vec<ScriptTypeInfo>,
    pub externals: Vec<FileIdentifier>,
    pub ref_types: Vec<RefType>,
    pub user_information: String,
    data: Vec<u8>,
}

impl SerializedFile {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Iterate the object table in on-disk order.
    pub fn objects(&self) -> &[ObjectInfo] {
        &self.objects
    }

    pub fn find_object(&self, path_id: i64) -> Option<&ObjectInfo> {
        self.objects.iter().find(|obj| obj.path_id == path_id)
    }

    fn serialized_type_for(&self, obj: &ObjectInfo) -> Option<&SerializedType> {
        self.types.get(obj.type_id as usize)
    }

    /// The Unity engine class id of `obj`: the object table's own field when
    /// present (format_version 15/16), else looked up via its type catalogue entry.
    pub fn class_id_of(&self, obj: &ObjectInfo) -> i32 {
        if let Some(class_id) = obj.class_id {
            class_id as i32
        } else {
            self.serialized_type_for(obj).map(|t| t.class_id).unwrap_or(-1)
        }
    }

    /// Slice of this file's body belonging to `obj`.
    pub fn read_object_data(&self, obj: &ObjectInfo) -> Result<&[u8]> {
        let start = obj.byte_start as usize;
        let end = obj.byte_end() as usize;
        self.data
            .get(start..end)
            .ok_or_else(|| BinaryError::invalid_object_info(format!(
                "object at path_id {} spans [{start}, {end}) outside a {}-byte file",
                obj.path_id,
                self.data.len()
            )))
    }

    /// Decode `obj`'s body into a generic value tree using its registered TypeTree.
    pub fn read_object_tree(&self, obj: &ObjectInfo) -> Result<Value> {
        let stype = self
            .serialized_type_for(obj)
            .ok_or_else(|| BinaryError::invalid_object_info("object references an unknown type index"))?;
        let root = stype
            .type_tree
            .nodes
            .first()
            .ok_or(BinaryError::TypeTreeMissing)?;

        let body = self.read_object_data(obj)?;
        let mut reader = BinaryReader::new(body, self.header.byte_order());
        let ctx = InterpreterContext {
            wide_path_ids: self.header.uses_wide_path_ids(),
        };
        read_object(&mut reader, root, ctx)
    }

    pub fn create_type_registry(&self) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for stype in &self.types {
            registry.add_type(stype.clone());
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_minimal_v22(unity_version: &str) -> Vec<u8> {
        // metadata_size / file_size / data_offset placeholders get the wide v22
        // treatment; everything after them is little-endian per the header's
        // own endian byte.
        let mut metadata = Vec::new();
        metadata.extend_from_slice(unity_version.as_bytes());
        metadata.push(0);
        metadata.extend_from_slice(&8i32.to_le_bytes()); // target_platform
        metadata.push(1); // enable_type_tree
        metadata.extend_from_slice(&0i32.to_le_bytes()); // type_count
        metadata.extend_from_slice(&0i32.to_le_bytes()); // object_count
        metadata.extend_from_slice(&0i32.to_le_bytes()); // script_count
        metadata.extend_from_slice(&0i32.to_le_bytes()); // externals_count
        metadata.extend_from_slice(&0i32.to_le_bytes()); // ref_type_count
        metadata.push(0); // user_information cstr terminator

        let data_offset = 64u64;
        let file_size = data_offset;

        let mut buf = Vec::new();
        buf.extend_from_slice(&(metadata.len() as u32).to_be_bytes()); // legacy metadata_size field (ignored at v22)
        buf.extend_from_slice(&0u32.to_be_bytes()); // legacy file_size field (ignored at v22)
        buf.extend_from_slice(&22i32.to_be_bytes()); // version
        buf.extend_from_slice(&0u32.to_be_bytes()); // legacy data_offset field (ignored at v22)
        buf.push(0); // endian: little
        buf.extend_from_slice(&[0, 0, 0]); // reserved
        buf.extend_from_slice(&(metadata.len() as u32).to_be_bytes()); // wide metadata_size
        buf.extend_from_slice(&file_size.to_be_bytes());
        buf.extend_from_slice(&data_offset.to_be_bytes());
        buf.extend_from_slice(&0u64.to_be_bytes()); // reserved

        buf.extend_from_slice(&metadata);
        buf.resize(data_offset as usize, 0);
        buf
    }

    #[test]
    fn minimal_file_has_no_objects_or_types() {
        let data = encode_minimal_v22("2021.3.21f1");
        let file = parse_serialized_file(data).unwrap();
        assert_eq!(file.objects().len(), 0);
        assert_eq!(file.types.len(), 0);
        assert_eq!(file.unity_version, "2021.3.21f1");
    }

    #[test]
    fn read_object_tree_without_type_tree_is_missing() {
        let data = encode_minimal_v22("");
        let file = parse_serialized_file(data).unwrap();
        let fake_obj = ObjectInfo {
            path_id: 1,
            byte_start: file.header.data_offset,
            byte_size: 0,
            type_id: 0,
            class_id: None,
            is_destroyed: None,
            stripped: None,
        };
        assert!(matches!(
            file.read_object_tree(&fake_obj),
            Err(BinaryError::InvalidObjectInfo(_))
        ));
    }
}
