//! Static lookup tables shared by every consumer of the binary reader.

/// Unity class ID to class name mapping, covering exactly the classes this
/// crate's pipeline and CLI diagnostics reference (see `class_ids` below).
/// Unknown class ids simply have no name.
pub struct ClassIdMap;

impl ClassIdMap {
    /// Resolve a class id to its Unity engine name, if known.
    pub fn get_class_name(&self, class_id: i32) -> Option<&'static str> {
        let name = match class_id {
            1 => "GameObject",
            4 => "Transform",
            28 => "Texture2D",
            43 => "Mesh",
            114 => "MonoBehaviour",

            _ => return None,
        };
        Some(name)
    }
}

lazy_static::lazy_static! {
    /// The single immutable class-id to class-name table used by the whole crate.
    pub static ref GLOBAL_CLASS_ID_MAP: ClassIdMap = ClassIdMap;
}

/// Class ids referenced directly by the mesh/object pipeline.
pub mod class_ids {
    pub const GAME_OBJECT: i32 = 1;
    pub const TRANSFORM: i32 = 4;
    pub const TEXTURE_2D: i32 = 28;
    pub const MESH: i32 = 43;
    pub const MONO_BEHAVIOUR: i32 = 114;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_class_ids() {
        assert_eq!(GLOBAL_CLASS_ID_MAP.get_class_name(43), Some("Mesh"));
        assert_eq!(GLOBAL_CLASS_ID_MAP.get_class_name(28), Some("Texture2D"));
        assert_eq!(GLOBAL_CLASS_ID_MAP.get_class_name(999_999), None);
    }
}
