//! TypeTree data structures: the field-descriptor tree used to decode an
//! opaque Unity object body.

use serde::{Deserialize, Serialize};

/// `meta_flag` bit marking that the cursor must be 4-byte aligned after a
/// node's value is read.
pub const ALIGN_BYTES: i32 = 0x4000;

/// One field descriptor in a Unity TypeTree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeNode {
    pub level: i32,
    pub type_name: String,
    pub field_name: String,
    pub byte_size: i32,
    pub index: i32,
    pub version: i32,
    pub type_flags: i32,
    pub meta_flag: i32,
    pub ref_type_hash: Option<u64>,
    pub children: Vec<TypeNode>,
}

impl TypeNode {
    pub fn is_aligned(&self) -> bool {
        self.meta_flag & ALIGN_BYTES != 0
    }

    pub fn is_array(&self) -> bool {
        self.type_name == "Array" || self.type_name == "TypedArray"
    }

    pub fn is_string(&self) -> bool {
        self.type_name == "string"
    }

    pub fn is_pptr(&self) -> bool {
        self.type_name.starts_with("PPtr<")
    }

    pub fn find_child(&self, field_name: &str) -> Option<&TypeNode> {
        self.children.iter().find(|c| c.field_name == field_name)
    }
}

/// A fully parsed TypeTree: the ordered list of a SerializedType's root-level
/// field nodes (conventionally a single `Base` root for object bodies).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeTree {
    pub nodes: Vec<TypeNode>,
}

impl TypeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The conventional single root node object bodies are decoded from.
    pub fn root(&self) -> Option<&TypeNode> {
        self.nodes.first()
    }
}
