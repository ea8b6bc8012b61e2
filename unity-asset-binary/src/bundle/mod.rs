//! UnityFS bundle reading: header, BlocksInfo, and on-demand node extraction.

pub mod header;
pub mod parser;
pub mod types;

pub use header::BundleHeader;
pub use parser::{parse_bundle, parse_bundle_with_options, ParseOptions, ParsingComplexity};
pub use types::{Bundle, Node, DEFAULT_MAX_EXTRACTION_BYTES};
