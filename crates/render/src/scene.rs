//! Retained scene graph: the objects a [`RetainedViewer`](crate::RetainedViewer)
//! keeps alive between display calls.
//!
//! Objects only hold handles. The geometry and material data behind a handle
//! belong to the [`SceneHost`](crate::SceneHost) that created them.

use glam::Vec3;
use surfview_mesh::MeshBuffers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u64);

/// `0xRRGGBB` to linear-ish float RGB.
pub fn rgb(hex: u32) -> [f32; 3] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    ]
}

/// Vertex data for one scene object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    pub positions: Vec<f32>,
    pub indices: Option<Vec<u32>>,
    pub normals: Option<Vec<f32>>,
}

impl Geometry {
    /// Unindexed vertices (points, or line segment pairs).
    pub fn from_positions(positions: Vec<f32>) -> Self {
        Self {
            positions,
            ..Self::default()
        }
    }

    pub fn indexed(buffers: MeshBuffers) -> Self {
        Self {
            positions: buffers.positions,
            indices: Some(buffers.indices),
            normals: None,
        }
    }

    pub fn with_normals(mut self, normals: Vec<f32>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// Depth offset pushing filled polygons back so coplanar lines stay visible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolygonOffset {
    pub factor: f32,
    pub units: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Lit surface material.
    Phong {
        color: [f32; 3],
        shininess: f32,
        double_sided: bool,
        polygon_offset: Option<PolygonOffset>,
    },
    /// Unlit line color.
    Line { color: [f32; 3] },
    /// Screen-space points.
    Points {
        color: [f32; 3],
        size: f32,
        size_attenuation: bool,
    },
}

impl Material {
    pub fn surface() -> Self {
        Self::Phong {
            color: rgb(0x00aaff),
            shininess: 30.0,
            double_sided: true,
            polygon_offset: Some(PolygonOffset {
                factor: 1.0,
                units: 1.0,
            }),
        }
    }

    pub fn edges() -> Self {
        Self::Line {
            color: rgb(0x000000),
        }
    }

    pub fn samples() -> Self {
        Self::Points {
            color: rgb(0xff0000),
            size: 10.0,
            size_attenuation: false,
        }
    }

    pub fn color(&self) -> [f32; 3] {
        match *self {
            Self::Phong { color, .. } | Self::Line { color } | Self::Points { color, .. } => color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Mesh,
    LineSegments,
    Points,
}

/// A drawable node. Children are drawn with the parent and released with it.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    pub name: &'static str,
    pub kind: ObjectKind,
    pub geometry: GeometryId,
    pub material: MaterialId,
    /// Triangles, segments or points, depending on `kind`.
    pub primitives: usize,
    pub children: Vec<SceneObject>,
}

impl SceneObject {
    pub fn new(
        name: &'static str,
        kind: ObjectKind,
        geometry: GeometryId,
        material: MaterialId,
        primitives: usize,
    ) -> Self {
        Self {
            name,
            kind,
            geometry,
            material,
            primitives,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: SceneObject) -> Self {
        self.children.push(child);
        self
    }

    /// This object and all descendants, depth-first.
    pub fn walk(&self) -> Vec<&SceneObject> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Ambient {
        color: [f32; 3],
        intensity: f32,
    },
    Directional {
        color: [f32; 3],
        intensity: f32,
        position: Vec3,
    },
}

/// Everything the retained backend displays: fixed helpers plus at most one
/// mesh and one point cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub background: [f32; 3],
    pub lights: Vec<Light>,
    pub helpers: Vec<SceneObject>,
    mesh: Option<SceneObject>,
    points: Option<SceneObject>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            background: rgb(0xf0f0f0),
            lights: vec![
                Light::Ambient {
                    color: [1.0, 1.0, 1.0],
                    intensity: 0.6,
                },
                Light::Directional {
                    color: [1.0, 1.0, 1.0],
                    intensity: 0.4,
                    position: Vec3::new(5.0, 10.0, 7.5),
                },
            ],
            helpers: Vec::new(),
            mesh: None,
            points: None,
        }
    }
}

impl Scene {
    pub fn mesh(&self) -> Option<&SceneObject> {
        self.mesh.as_ref()
    }

    pub fn points(&self) -> Option<&SceneObject> {
        self.points.as_ref()
    }

    /// Install a mesh object, handing back the one it replaces.
    pub fn replace_mesh(&mut self, mesh: Option<SceneObject>) -> Option<SceneObject> {
        std::mem::replace(&mut self.mesh, mesh)
    }

    /// Install a point object, handing back the one it replaces.
    pub fn replace_points(&mut self, points: Option<SceneObject>) -> Option<SceneObject> {
        std::mem::replace(&mut self.points, points)
    }

    /// Top-level objects in draw order: helpers, mesh, points.
    pub fn objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.helpers
            .iter()
            .chain(self.mesh.iter())
            .chain(self.points.iter())
    }

    /// Every object including children.
    pub fn walk(&self) -> Vec<&SceneObject> {
        self.objects().flat_map(SceneObject::walk).collect()
    }
}

/// Line segments for an axes helper of length `size`: X, Y, Z from the origin.
pub fn axes_segments(size: f32) -> [(Vec<f32>, [f32; 3]); 3] {
    [
        (vec![0.0, 0.0, 0.0, size, 0.0, 0.0], rgb(0xff0000)),
        (vec![0.0, 0.0, 0.0, 0.0, size, 0.0], rgb(0x00ff00)),
        (vec![0.0, 0.0, 0.0, 0.0, 0.0, size], rgb(0x0000ff)),
    ]
}

/// Line segments of a square grid centered on the origin in the XY plane,
/// `size` wide with `divisions` cells per side, lifted to height `z`.
pub fn grid_segments(size: f32, divisions: u32, z: f32) -> Vec<f32> {
    let divisions = divisions.max(1);
    let half = size / 2.0;
    let step = size / divisions as f32;
    let mut out = Vec::with_capacity((divisions as usize + 1) * 12);
    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        out.extend_from_slice(&[-half, k, z, half, k, z]);
        out.extend_from_slice(&[k, -half, z, k, half, z]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(rgb(0xff0000), [1.0, 0.0, 0.0]);
        assert_eq!(rgb(0x000000), [0.0, 0.0, 0.0]);
        let c = rgb(0x00aaff);
        assert_eq!(c[0], 0.0);
        assert!((c[1] - 170.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn grid_segment_count() {
        let segs = grid_segments(10.0, 10, -0.001);
        // 11 lines each way, 2 endpoints, 3 floats
        assert_eq!(segs.len(), 11 * 2 * 2 * 3);
        assert!(segs.chunks_exact(3).all(|p| p[2] == -0.001));
    }

    #[test]
    fn walk_includes_children() {
        let obj = SceneObject::new("mesh", ObjectKind::Mesh, GeometryId(1), MaterialId(1), 2)
            .with_child(SceneObject::new(
                "edges",
                ObjectKind::LineSegments,
                GeometryId(2),
                MaterialId(2),
                5,
            ));
        let mut scene = Scene::default();
        assert!(scene.replace_mesh(Some(obj)).is_none());
        let names: Vec<_> = scene.walk().iter().map(|o| o.name).collect();
        assert_eq!(names, vec!["mesh", "edges"]);
    }

    #[test]
    fn default_scene_is_lit_and_empty() {
        let scene = Scene::default();
        assert_eq!(scene.lights.len(), 2);
        assert!(scene.mesh().is_none());
        assert!(scene.points().is_none());
    }
}
