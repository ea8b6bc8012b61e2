//! Unity Asset Core
//!
//! Shared data structures for the Unity asset-bundle reader: the dynamic
//! [`Value`] tree produced by decoding an object against its TypeTree, and
//! the static class-id lookup table used to name decoded objects.

pub mod constants;
pub mod value;

pub use constants::GLOBAL_CLASS_ID_MAP;
pub use value::Value;

/// Resolve a Unity engine class id to its name, when known.
pub fn get_class_name(class_id: i32) -> Option<&'static str> {
    GLOBAL_CLASS_ID_MAP.get_class_name(class_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_name_lookup() {
        assert_eq!(get_class_name(43), Some("Mesh"));
        assert_eq!(get_class_name(-1), None);
    }
}
