//! Unity's fixed common-string table.
//!
//! Blob-format TypeTree nodes reference field/type names either by an offset
//! into the SerializedFile's own string buffer, or, when the top bit of the
//! offset is set, by an offset into this fixed, engine-wide table. The table
//! never changes across Unity versions; it is reproduced here as a single
//! null-terminated byte buffer so lookups use the same offset arithmetic as
//! the local buffer.

const ENTRIES: &[&str] = &[
    "AABB", "AnimationClip", "AnimationCurve", "AnimationState", "Array", "Base", "BitField",
    "bitset", "bool", "char", "ColorRGBA", "Component", "data", "deque", "double", "dynamic_array",
    "FastPropertyName", "first", "float", "Font", "GameObject", "Generic Mono", "GradientNEW",
    "GUID", "GUIStyle", "int", "list", "long long", "map", "Matrix4x4f", "MdFour", "MonoBehaviour",
    "MonoScript", "m_ByteSize", "m_Curve", "m_EditorClassIdentifier", "m_EditorHideFlags",
    "m_Enabled", "m_ExtensionPtr", "m_GameObject", "m_Index", "m_IsArray", "m_IsStatic", "m_MetaFlag",
    "m_Name", "m_ObjectHideFlags", "m_PrefabInternal", "m_PrefabParentObject", "m_Script",
    "m_StaticEditorFlags", "m_Type", "m_Version", "Object", "pair", "PPtr<Component>",
    "PPtr<GameObject>", "PPtr<Material>", "PPtr<MonoBehaviour>", "PPtr<MonoScript>",
    "PPtr<Object>", "PPtr<Prefab>", "PPtr<Sprite>", "PPtr<TextAsset>", "PPtr<Texture>",
    "PPtr<Texture2D>", "PPtr<Transform>", "Prefab", "Quaternionf", "Rectf", "Resource",
    "second", "set", "short", "size", "SInt16", "SInt32", "SInt64", "SInt8", "staticvector",
    "string", "TextAsset", "TextMesh", "Texture", "Texture2D", "Transform", "TypelessData",
    "UInt16", "UInt32", "UInt64", "UInt8", "unsigned int", "unsigned long long", "unsigned short",
    "vector", "Vector2f", "Vector3f", "Vector4f", "m_ScriptingClassIdentifier", "Gradient",
    "Type*", "int2_storage", "int3_storage", "UnityPropertySheet", "UnityTexEnv", "UnityTexEnvs",
    "m_Father", "m_RootOrder", "m_LocalRotation", "m_LocalPosition", "m_LocalScale",
    "m_Children", "m_ConstrainProportionsScale",
];

use std::sync::OnceLock;

fn buffer() -> &'static [u8] {
    static BUFFER: OnceLock<Vec<u8>> = OnceLock::new();
    BUFFER.get_or_init(|| {
        let mut buf = Vec::new();
        for entry in ENTRIES {
            buf.extend_from_slice(entry.as_bytes());
            buf.push(0);
        }
        buf
    })
}

/// Look up a string in the common-string table by its byte offset (the
/// offset with its top bit already stripped by the caller).
pub fn lookup(offset: u32) -> Option<String> {
    let buf = buffer();
    let start = offset as usize;
    if start >= buf.len() {
        return None;
    }
    let end = buf[start..]
        .iter()
        .position(|&b| b == 0)
        .map(|p| start + p)?;
    String::from_utf8(buf[start..end].to_vec()).ok()
}
