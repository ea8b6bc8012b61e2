//! TypeTree parsing and the generic object-body interpreter.

pub mod common_strings;
pub mod interpreter;
pub mod parser;
pub mod types;

pub use interpreter::{read_object, InterpreterContext};
pub use parser::parse as parse_type_tree;
pub use types::{TypeNode, TypeTree, ALIGN_BYTES};
