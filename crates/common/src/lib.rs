//! Shared value types: points, triangle faces, meshes and point clouds.
//!
//! These are the shapes a producer hands to the viewer. They carry no GPU
//! state; buffers are derived from them by `surfview-mesh`.

mod types;

pub use types::{Face, Mesh, Point3, PointCloud};
