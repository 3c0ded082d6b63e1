//! Mesh pipeline: turns an indexed triangle mesh into draw-ready arrays.
//!
//! Everything here is a pure function of its input. No GPU calls are made;
//! both render backends consume these results.
//!
//! # Invariants
//! - Position arrays hold `3 * vertex_count` floats, index arrays `3 * face_count` indices.
//! - Face winding is never reordered.
//! - An invalid mesh yields an error and no partial output.

pub mod bounds;
pub mod buffers;
pub mod edges;
pub mod gradient;
pub mod grid;
pub mod normals;

pub use bounds::Bounds;
pub use buffers::{
    MeshBuffers, MeshError, PointBuffers, build_mesh_buffers, build_point_buffers, validate_mesh,
};
pub use edges::{EdgeKey, EdgeSet, dedup_edges, edge_positions};
pub use gradient::HeightGradient;
pub use grid::{HeightField, demo_height, sample_surface};
pub use normals::compute_vertex_normals;

pub fn crate_info() -> &'static str {
    concat!("surfview-mesh v", env!("CARGO_PKG_VERSION"))
}
