//! Mesh decoding: normalized geometry ([`MeshGeometry`]) decoded from either an
//! interleaved [`VertexData`] buffer or a compressed, quantized [`CompressedMesh`].

pub mod parser;
pub mod types;

pub use parser::{parse_mesh, StreamResolver};
pub use types::{
    Aabb, ChannelInfo, CompressedMesh, MeshGeometry, MeshGroup, MeshTopology, PackedBitVector,
    Stream, StreamingInfo, SubMesh, VertexData,
};
