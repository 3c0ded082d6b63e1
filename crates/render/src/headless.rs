use std::collections::{BTreeMap, HashMap};

use glam::Mat4;

use crate::retained::SceneHost;
use crate::scene::{Geometry, GeometryId, Material, MaterialId, ObjectKind, Scene};
use crate::surface::RenderError;

/// One object drawn during a headless frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub name: &'static str,
    pub kind: ObjectKind,
    pub primitives: usize,
}

/// In-memory [`SceneHost`] with no GPU behind it.
///
/// Tracks resource handles and draw lists so the CLI and tests can drive a
/// [`RetainedViewer`](crate::RetainedViewer) and inspect what it would show.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    targets: HashMap<String, (u32, u32)>,
    attached: Option<String>,
    size: (u32, u32),
    geometries: BTreeMap<GeometryId, Geometry>,
    materials: BTreeMap<MaterialId, Material>,
    next_id: u64,
    allocations: usize,
    renderer_disposed: bool,
    frames: u64,
    last_frame: Vec<DrawRecord>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a display target that [`SceneHost::attach`] can find.
    pub fn with_target(mut self, id: &str, width: u32, height: u32) -> Self {
        self.targets.insert(id.to_string(), (width, height));
        self
    }

    pub fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn live_geometries(&self) -> usize {
        self.geometries.len()
    }

    pub fn live_materials(&self) -> usize {
        self.materials.len()
    }

    pub fn has_geometry(&self, id: GeometryId) -> bool {
        self.geometries.contains_key(&id)
    }

    /// Geometries plus materials created over the host's lifetime.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    pub fn renderer_disposed(&self) -> bool {
        self.renderer_disposed
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame(&self) -> &[DrawRecord] {
        &self.last_frame
    }

    /// Human-readable summary of the last frame.
    pub fn report(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "=== Headless frame {} ({}x{}) ===\n",
            self.frames, self.size.0, self.size.1
        ));
        out.push_str(&format!(
            "Live: {} geometries, {} materials\n",
            self.geometries.len(),
            self.materials.len()
        ));
        for record in &self.last_frame {
            let unit = match record.kind {
                ObjectKind::Mesh => "triangles",
                ObjectKind::LineSegments => "segments",
                ObjectKind::Points => "points",
            };
            out.push_str(&format!(
                "  {:<8} {:>6} {}\n",
                record.name, record.primitives, unit
            ));
        }
        out
    }

    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.allocations += 1;
        self.next_id
    }
}

impl SceneHost for HeadlessHost {
    fn has_target(&self, target: &str) -> bool {
        self.targets.contains_key(target)
    }

    fn attach(&mut self, target: &str) -> Option<(u32, u32)> {
        let size = *self.targets.get(target)?;
        self.attached = Some(target.to_string());
        self.size = size;
        self.renderer_disposed = false;
        Some(size)
    }

    fn detach(&mut self) {
        self.attached = None;
    }

    fn create_geometry(&mut self, geometry: Geometry) -> GeometryId {
        let id = GeometryId(self.next());
        self.geometries.insert(id, geometry);
        id
    }

    fn release_geometry(&mut self, id: GeometryId) {
        if self.geometries.remove(&id).is_none() {
            tracing::warn!(?id, "released unknown geometry");
        }
    }

    fn create_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.next());
        self.materials.insert(id, material);
        id
    }

    fn release_material(&mut self, id: MaterialId) {
        if self.materials.remove(&id).is_none() {
            tracing::warn!(?id, "released unknown material");
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn render(&mut self, scene: &Scene, view_proj: Mat4) -> Result<(), RenderError> {
        if self.attached.is_none() || self.renderer_disposed {
            return Err(RenderError::NotInitialized);
        }
        if !view_proj.is_finite() {
            return Err(RenderError::Gpu("non-finite view-projection matrix".into()));
        }

        let mut records = Vec::new();
        for object in scene.walk() {
            if !self.geometries.contains_key(&object.geometry) {
                return Err(RenderError::Gpu(format!(
                    "object '{}' uses released geometry {:?}",
                    object.name, object.geometry
                )));
            }
            if !self.materials.contains_key(&object.material) {
                return Err(RenderError::Gpu(format!(
                    "object '{}' uses released material {:?}",
                    object.name, object.material
                )));
            }
            records.push(DrawRecord {
                name: object.name,
                kind: object.kind,
                primitives: object.primitives,
            });
        }

        self.frames += 1;
        self.last_frame = records;
        Ok(())
    }

    fn dispose_renderer(&mut self) {
        self.renderer_disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneObject;

    #[test]
    fn unknown_target_is_not_attached() {
        let mut host = HeadlessHost::new().with_target("viewer", 640, 480);
        assert_eq!(host.attach("other"), None);
        assert!(!host.is_attached());
        assert_eq!(host.attach("viewer"), Some((640, 480)));
        assert!(host.is_attached());
    }

    #[test]
    fn ids_are_unique_across_kinds() {
        let mut host = HeadlessHost::new();
        let g = host.create_geometry(Geometry::default());
        let m = host.create_material(Material::edges());
        assert_ne!(g.0, m.0);
        assert_eq!(host.allocations(), 2);
    }

    #[test]
    fn render_rejects_released_geometry() {
        let mut host = HeadlessHost::new().with_target("viewer", 10, 10);
        host.attach("viewer");
        let g = host.create_geometry(Geometry::default());
        let m = host.create_material(Material::samples());
        let mut scene = Scene::default();
        scene.replace_points(Some(SceneObject::new("points", ObjectKind::Points, g, m, 0)));
        host.render(&scene, Mat4::IDENTITY).unwrap();

        host.release_geometry(g);
        assert!(matches!(
            host.render(&scene, Mat4::IDENTITY),
            Err(RenderError::Gpu(_))
        ));
    }

    #[test]
    fn report_lists_last_frame() {
        let mut host = HeadlessHost::new().with_target("viewer", 10, 10);
        host.attach("viewer");
        let g = host.create_geometry(Geometry::default());
        let m = host.create_material(Material::samples());
        let mut scene = Scene::default();
        scene.replace_points(Some(SceneObject::new("points", ObjectKind::Points, g, m, 25)));
        host.render(&scene, Mat4::IDENTITY).unwrap();

        let report = host.report();
        assert!(report.contains("frame 1"));
        assert!(report.contains("25 points"));
    }

    #[test]
    fn detached_host_cannot_render() {
        let mut host = HeadlessHost::new();
        assert!(matches!(
            host.render(&Scene::default(), Mat4::IDENTITY),
            Err(RenderError::NotInitialized)
        ));
    }
}
