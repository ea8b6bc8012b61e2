//! Command-line inspector for UnityFS asset bundles.
//!
//! Prints the stable JSON schemas `unity-asset-binary` exposes for its three
//! levels of detail: bundle nodes, SerializedFile object tables, and decoded
//! Mesh geometry.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use unity_asset_binary::{
    extract_meshes, parse_bundle, parse_serialized_file, BinaryError, ExtractionLimits,
};

#[derive(Parser)]
#[command(name = "unity-asset")]
#[command(about = "Inspect UnityFS asset bundles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the virtual files stored inside a bundle.
    Nodes {
        /// Path to a .bundle/.unity3d file.
        bundle: PathBuf,
    },
    /// List the object table of one SerializedFile node inside a bundle.
    Objects {
        bundle: PathBuf,
        /// Path of the node to inspect, as printed by `nodes`.
        node: String,
    },
    /// Decode every Mesh object found anywhere in a bundle.
    Meshes {
        bundle: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Nodes { bundle } => run_nodes(&bundle),
        Commands::Objects { bundle, node } => run_objects(&bundle, &node),
        Commands::Meshes { bundle } => run_meshes(&bundle),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn read_bundle(path: &PathBuf) -> Result<unity_asset_binary::Bundle, BinaryError> {
    let bytes = std::fs::read(path).map_err(BinaryError::from)?;
    parse_bundle(bytes)
}

fn run_nodes(path: &PathBuf) -> Result<(), BinaryError> {
    let bundle = read_bundle(path)?;
    let nodes: Vec<_> = bundle
        .nodes()
        .iter()
        .map(|n| serde_json::json!({ "path": n.path, "offset": n.offset, "size": n.size }))
        .collect();
    println!("{}", serde_json::to_string_pretty(&nodes).unwrap());
    Ok(())
}

fn run_objects(path: &PathBuf, node_path: &str) -> Result<(), BinaryError> {
    let bundle = read_bundle(path)?;
    let node = bundle
        .nodes()
        .iter()
        .find(|n| n.path == node_path)
        .ok_or_else(|| BinaryError::bounds(format!("no node named '{node_path}' in bundle")))?;
    let data = bundle.extract_node(node)?;
    let file = parse_serialized_file(data)?;

    let objects: Vec<_> = file
        .objects()
        .iter()
        .map(|obj| {
            let class_id = file.class_id_of(obj);
            serde_json::json!({
                "path_id": obj.path_id,
                "class_id": class_id,
                "class_name": unity_asset_core::get_class_name(class_id),
                "byte_start": obj.byte_start,
                "byte_size": obj.byte_size,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&objects).unwrap());
    Ok(())
}

fn run_meshes(path: &PathBuf) -> Result<(), BinaryError> {
    let bundle = read_bundle(path)?;
    let limits = ExtractionLimits::default();
    let (meshes, warnings) = extract_meshes(&bundle, &limits)?;

    for warning in &warnings {
        eprintln!("warning: {} ({})", warning.message, warning.node_path);
    }

    let out: Vec<_> = meshes
        .iter()
        .map(|m| {
            let g = &m.geometry;
            serde_json::json!({
                "name": g.name,
                "vertex_count": g.vertex_count(),
                "positions": g.positions,
                "normals": g.normals,
                "uvs": g.uvs,
                "indices": g.indices,
                "use16bit_indices": g.use16bit_indices,
                "groups": g.groups.iter().map(|grp| serde_json::json!({
                    "start": grp.start_index,
                    "count": grp.index_count,
                    "material_index": grp.material_index,
                })).collect::<Vec<_>>(),
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&out).unwrap());
    Ok(())
}
