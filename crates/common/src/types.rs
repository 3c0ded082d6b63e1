use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A point in the display frame. Vertical axis is +Z.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Narrow to single precision for GPU upload.
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x as f32, self.y as f32, self.z as f32]
    }
}

impl From<[f64; 3]> for Point3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

/// A triangle referencing three vertices by zero-based index.
///
/// Winding `(a, b, c)` is preserved all the way to the index buffer; it
/// decides which side is the front face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Face {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Face {
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    pub fn indices(&self) -> [u32; 3] {
        [self.a, self.b, self.c]
    }

    /// The three directed edges in winding order.
    pub fn edges(&self) -> [(u32, u32); 3] {
        [(self.a, self.b), (self.b, self.c), (self.c, self.a)]
    }
}

impl From<[u32; 3]> for Face {
    fn from([a, b, c]: [u32; 3]) -> Self {
        Self { a, b, c }
    }
}

/// An indexed triangle mesh as produced by the external tessellator.
///
/// Faces are expected to index into `vertices`; this is checked when the mesh
/// is turned into buffers, not on construction. A mesh without faces is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Point3>,
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn new(vertices: Vec<Point3>, faces: Vec<Face>) -> Self {
        Self { vertices, faces }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Free-standing sample points shown alongside (or instead of) a surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointCloud {
    pub points: Vec<Point3>,
}

impl PointCloud {
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<Vec<Point3>> for PointCloud {
    fn from(points: Vec<Point3>) -> Self {
        Self { points }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_edges_follow_winding() {
        let f = Face::new(4, 7, 9);
        assert_eq!(f.edges(), [(4, 7), (7, 9), (9, 4)]);
        assert_eq!(f.indices(), [4, 7, 9]);
    }

    #[test]
    fn point_serializes_with_named_fields() {
        let json = serde_json::to_string(&Point3::new(1.0, 2.5, -3.0)).unwrap();
        assert_eq!(json, r#"{"x":1.0,"y":2.5,"z":-3.0}"#);
    }

    #[test]
    fn mesh_serializes_vertices_and_faces() {
        let mesh = Mesh::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)],
            vec![Face::new(0, 1, 0)],
        );
        let value = serde_json::to_value(&mesh).unwrap();
        assert_eq!(value["faces"][0]["b"], 1);
        assert_eq!(value["vertices"][1]["x"], 1.0);
    }

    #[test]
    fn point_cloud_is_a_plain_array() {
        let cloud = PointCloud::new(vec![Point3::new(0.0, 1.0, 2.0)]);
        let json = serde_json::to_string(&cloud).unwrap();
        assert!(json.starts_with('['));
        let back: PointCloud = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cloud);
    }

    #[test]
    fn empty_mesh_is_valid() {
        let mesh = Mesh::default();
        assert!(mesh.is_empty());
        assert_eq!(mesh.face_count(), 0);
    }
}
