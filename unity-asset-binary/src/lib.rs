//! Unity asset-bundle reader.
//!
//! This crate reads UnityFS asset bundles and the SerializedFile metadata they
//! contain: bundle headers and block tables, per-file object tables and type
//! trees, and Mesh geometry decoded from either representation Unity stores it
//! in (interleaved vertex streams or a quantized CompressedMesh). It does not
//! decode textures, audio, materials, or animations.
//!
//! # Example
//!
//! ```rust,no_run
//! use unity_asset_binary::parse_bundle;
//!
//! let data = std::fs::read("example.bundle")?;
//! let bundle = parse_bundle(data)?;
//! for node in bundle.nodes() {
//!     println!("node: {} ({} bytes)", node.path, node.size);
//! }
//! # Ok::<(), unity_asset_binary::BinaryError>(())
//! ```

pub mod asset;
pub mod bundle;
pub mod compression;
pub mod error;
pub mod mesh;
pub mod object;
pub mod reader;
pub mod typetree;
pub mod unity_version;

pub use asset::{
    parse_serialized_file, FileIdentifier, ObjectInfo, RefType, ScriptTypeInfo, SerializedFile,
    SerializedFileHeader, SerializedType, TypeRegistry,
};
pub use bundle::{parse_bundle, parse_bundle_with_options, Bundle, Node, ParseOptions};
pub use error::{BinaryError, Result};
pub use mesh::{parse_mesh, MeshGeometry, StreamResolver};
pub use object::RenderableDetector;
pub use reader::{BinaryReader, ByteOrder};
pub use unity_version::{UnityFeature, UnityVersion, UnityVersionType, VersionCompatibility};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation for long-running scans across many nodes/objects.
/// Checked between units of work; parsing already in flight for a single
/// object or block always runs to completion before a cancellation is observed.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(BinaryError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Options shared by every top-level read operation: the per-node extraction
/// cap, strict header validation, and the external-stream resolver.
pub struct ExtractionLimits<'a> {
    pub max_extraction_bytes: u64,
    pub strict: bool,
    pub resolver: Option<&'a StreamResolver<'a>>,
    pub cancellation: CancellationToken,
    /// When set, the first node- or object-level failure aborts the whole
    /// `extract_meshes` call instead of being recorded as a warning. Off by
    /// default, matching the spec's "record and continue" propagation rule.
    pub fail_fast: bool,
}

impl<'a> Default for ExtractionLimits<'a> {
    fn default() -> Self {
        Self {
            max_extraction_bytes: bundle::DEFAULT_MAX_EXTRACTION_BYTES,
            strict: true,
            resolver: None,
            cancellation: CancellationToken::new(),
            fail_fast: false,
        }
    }
}

/// One Mesh found while walking a bundle, alongside where it was found.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExtractedMesh {
    pub node_path: String,
    pub mesh_name: String,
    pub geometry: MeshGeometry,
}

/// A per-node failure recorded by [`extract_meshes`] instead of aborting the
/// whole scan, per the crate's recoverable-error policy.
#[derive(Debug, Clone)]
pub struct ExtractionWarning {
    pub node_path: String,
    pub message: String,
}

/// Walk every node in `bundle`, decode each as a SerializedFile, and collect
/// the geometry of every Mesh object found. A node that isn't a SerializedFile,
/// or a Mesh whose TypeTree or streamed data can't be resolved, is recorded as
/// a warning rather than aborting the scan.
pub fn extract_meshes(
    bundle: &Bundle,
    limits: &ExtractionLimits,
) -> Result<(Vec<ExtractedMesh>, Vec<ExtractionWarning>)> {
    let span = tracing::debug_span!("extract_meshes", node_count = bundle.nodes().len());
    let _enter = span.enter();

    let mut meshes = Vec::new();
    let mut warnings = Vec::new();

    for node in bundle.nodes() {
        limits.cancellation.check()?;

        let node_bytes = match bundle.extract_node(node) {
            Ok(bytes) => bytes,
            Err(err) if err.is_recoverable() && !limits.fail_fast => {
                tracing::warn!(node = %node.path, error = %err, "skipping node");
                warnings.push(ExtractionWarning { node_path: node.path.clone(), message: err.to_string() });
                continue;
            }
            Err(err) => return Err(err),
        };

        let file = match parse_serialized_file(node_bytes) {
            Ok(file) => file,
            Err(err) if err.is_recoverable() && !limits.fail_fast => {
                tracing::warn!(node = %node.path, error = %err, "not a SerializedFile");
                warnings.push(ExtractionWarning { node_path: node.path.clone(), message: err.to_string() });
                continue;
            }
            Err(err) => return Err(err),
        };

        for obj in file.objects() {
            limits.cancellation.check()?;
            if file.class_id_of(obj) != unity_asset_core::constants::class_ids::MESH {
                continue;
            }

            let tree = match file.read_object_tree(obj) {
                Ok(tree) => tree,
                Err(err) if err.is_recoverable() && !limits.fail_fast => {
                    tracing::warn!(node = %node.path, path_id = obj.path_id, error = %err, "skipping mesh object");
                    warnings.push(ExtractionWarning {
                        node_path: node.path.clone(),
                        message: format!("path_id {}: {err}", obj.path_id),
                    });
                    continue;
                }
                Err(err) => return Err(err),
            };

            match mesh::parse_mesh(&tree, limits.resolver) {
                Ok(geometry) => meshes.push(ExtractedMesh {
                    node_path: node.path.clone(),
                    mesh_name: geometry.name.clone(),
                    geometry,
                }),
                Err(err) if err.is_recoverable() && !limits.fail_fast => {
                    tracing::warn!(node = %node.path, path_id = obj.path_id, error = %err, "failed to decode mesh");
                    warnings.push(ExtractionWarning {
                        node_path: node.path.clone(),
                        message: format!("path_id {}: {err}", obj.path_id),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }

    Ok((meshes, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_token_starts_clear() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(BinaryError::Cancelled)));
    }

    #[test]
    fn extraction_limits_default_matches_bundle_cap() {
        let limits = ExtractionLimits::default();
        assert_eq!(limits.max_extraction_bytes, bundle::DEFAULT_MAX_EXTRACTION_BYTES);
        assert!(limits.strict);
    }
}
