use surfview_common::{Mesh, Point3, PointCloud};

/// Errors raised while turning a mesh into buffers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("face {face} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("a {nu}x{nv} grid needs more vertices than a u32 index can address")]
    GridTooLarge { nu: u32, nv: u32 },
}

/// Flat GPU-ready arrays for an indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    /// `x0, y0, z0, x1, y1, z1, ...`
    pub positions: Vec<f32>,
    /// `a0, b0, c0, a1, b1, c1, ...` in face order, winding preserved.
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Flat position array for a point cloud. There is no index array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointBuffers {
    pub positions: Vec<f32>,
}

impl PointBuffers {
    pub fn point_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// Check every face index against the vertex count.
pub fn validate_mesh(mesh: &Mesh) -> Result<(), MeshError> {
    let vertex_count = mesh.vertices.len();
    for (face_idx, face) in mesh.faces.iter().enumerate() {
        for index in face.indices() {
            if index as usize >= vertex_count {
                return Err(MeshError::IndexOutOfRange {
                    face: face_idx,
                    index,
                    vertex_count,
                });
            }
        }
    }
    Ok(())
}

pub(crate) fn flatten_positions(points: &[Point3]) -> Vec<f32> {
    let mut out = Vec::with_capacity(points.len() * 3);
    for p in points {
        out.extend_from_slice(&p.to_array());
    }
    out
}

/// Flatten a mesh into position and index arrays.
///
/// The whole mesh is validated before anything is allocated, so a bad face
/// index never produces a partially filled buffer.
pub fn build_mesh_buffers(mesh: &Mesh) -> Result<MeshBuffers, MeshError> {
    validate_mesh(mesh)?;

    let positions = flatten_positions(&mesh.vertices);
    let mut indices = Vec::with_capacity(mesh.faces.len() * 3);
    for face in &mesh.faces {
        indices.extend_from_slice(&face.indices());
    }

    tracing::debug!(
        vertices = mesh.vertices.len(),
        faces = mesh.faces.len(),
        "built mesh buffers"
    );
    Ok(MeshBuffers { positions, indices })
}

/// Flatten a point cloud into a position array.
pub fn build_point_buffers(cloud: &PointCloud) -> PointBuffers {
    PointBuffers {
        positions: flatten_positions(&cloud.points),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surfview_common::Face;

    fn quad() -> Mesh {
        Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.5),
                Point3::new(0.0, 1.0, -0.5),
                Point3::new(1.0, 1.0, 1.0),
            ],
            vec![Face::new(0, 1, 2), Face::new(1, 3, 2)],
        )
    }

    #[test]
    fn lengths_match_vertex_and_face_counts() {
        let mesh = quad();
        let buffers = build_mesh_buffers(&mesh).unwrap();
        assert_eq!(buffers.positions.len(), 3 * mesh.vertex_count());
        assert_eq!(buffers.indices.len(), 3 * mesh.face_count());
        assert_eq!(buffers.vertex_count(), 4);
        assert_eq!(buffers.triangle_count(), 2);
    }

    #[test]
    fn positions_are_interleaved_xyz() {
        let buffers = build_mesh_buffers(&quad()).unwrap();
        assert_eq!(&buffers.positions[3..6], &[1.0, 0.0, 0.5]);
        assert_eq!(&buffers.positions[9..12], &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn winding_is_preserved() {
        let buffers = build_mesh_buffers(&quad()).unwrap();
        assert_eq!(buffers.indices, vec![0, 1, 2, 1, 3, 2]);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut mesh = quad();
        mesh.faces.push(Face::new(2, 3, 4));
        let err = build_mesh_buffers(&mesh).unwrap_err();
        assert_eq!(
            err,
            MeshError::IndexOutOfRange {
                face: 2,
                index: 4,
                vertex_count: 4
            }
        );
    }

    #[test]
    fn faceless_mesh_has_no_indices() {
        let mesh = Mesh::new(vec![Point3::new(1.0, 2.0, 3.0)], vec![]);
        let buffers = build_mesh_buffers(&mesh).unwrap();
        assert_eq!(buffers.positions, vec![1.0, 2.0, 3.0]);
        assert!(buffers.indices.is_empty());
    }

    #[test]
    fn point_cloud_flattens_without_indices() {
        let cloud = PointCloud::new(vec![Point3::new(1.0, 2.0, 3.0), Point3::new(4.0, 5.0, 6.0)]);
        let buffers = build_point_buffers(&cloud);
        assert_eq!(buffers.positions, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(buffers.point_count(), 2);
    }
}
