//! SerializedFile reading: header, type catalogue, and object table.
//!
//! A SerializedFile is the metadata section Unity embeds in every serialized
//! asset (directly in a `.assets` file, or as a node inside a bundle). This
//! module parses that section into a queryable [`SerializedFile`] without
//! decoding any object bodies; callers use [`SerializedFile::read_object_tree`]
//! to decode a specific object on demand.

pub mod header;
pub mod parser;
pub mod types;

pub use header::SerializedFileHeader;
pub use parser::{parse_serialized_file, SerializedFile};
pub use types::{FileIdentifier, ObjectInfo, RefType, ScriptTypeInfo, SerializedType, TypeRegistry};
