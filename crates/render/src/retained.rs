use glam::Mat4;
use surfview_common::{Mesh, PointCloud};
use surfview_mesh::{build_mesh_buffers, build_point_buffers, compute_vertex_normals, edge_positions};

use crate::camera::{OrbitCamera, OrbitControls};
use crate::scene::{
    Geometry, GeometryId, Material, MaterialId, ObjectKind, Scene, SceneObject, axes_segments,
    grid_segments,
};
use crate::surface::{FrameContext, RenderError, RenderSurface, SurfaceStats};

/// The layer a [`RetainedViewer`] draws through.
///
/// A host owns the actual resources behind geometry and material handles and
/// knows which display targets exist.
pub trait SceneHost {
    /// Whether a display target named `target` exists. Allocates nothing.
    fn has_target(&self, target: &str) -> bool;

    /// Attach the renderer's output to the display target named `target`.
    /// Returns its size in pixels, or `None` if no such target exists; in
    /// that case nothing may be allocated.
    fn attach(&mut self, target: &str) -> Option<(u32, u32)>;

    /// Detach the renderer's output from its target.
    fn detach(&mut self);

    fn create_geometry(&mut self, geometry: Geometry) -> GeometryId;

    fn release_geometry(&mut self, id: GeometryId);

    fn create_material(&mut self, material: Material) -> MaterialId;

    fn release_material(&mut self, id: MaterialId);

    fn resize(&mut self, width: u32, height: u32);

    /// Draw `scene` once with the given view-projection matrix.
    fn render(&mut self, scene: &Scene, view_proj: Mat4) -> Result<(), RenderError>;

    /// Tear down the renderer itself (pipelines, output surface). Geometry
    /// and material handles stay releasable afterwards.
    fn dispose_renderer(&mut self);
}

const AXES_SIZE: f32 = 5.0;
const GRID_SIZE: f32 = 10.0;
const GRID_DIVISIONS: u32 = 10;
/// Slightly below the XY plane so the axes are not hidden by the grid.
const GRID_HEIGHT: f32 = -0.001;

struct Session {
    target: String,
    viewport: (u32, u32),
    scene: Scene,
    camera: OrbitCamera,
    controls: OrbitControls,
    resize_listener: bool,
}

enum ViewerState {
    Idle,
    Active(Box<Session>),
    Disposed,
}

/// Retained-graph backend: keeps one mesh object (with its edge overlay as a
/// child) and one point object alive, replacing them on each display call.
///
/// Viewer state is per instance; two viewers never share a scene or camera.
pub struct RetainedViewer<H: SceneHost> {
    host: H,
    state: ViewerState,
}

fn release_object<H: SceneHost>(host: &mut H, object: SceneObject) {
    for child in object.children {
        release_object(host, child);
    }
    host.release_geometry(object.geometry);
    host.release_material(object.material);
}

impl<H: SceneHost> RetainedViewer<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            state: ViewerState::Idle,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, ViewerState::Active(_))
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self.state, ViewerState::Disposed)
    }

    pub fn scene(&self) -> Option<&Scene> {
        match &self.state {
            ViewerState::Active(session) => Some(&session.scene),
            _ => None,
        }
    }

    pub fn camera(&self) -> Option<&OrbitCamera> {
        match &self.state {
            ViewerState::Active(session) => Some(&session.camera),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<&str> {
        match &self.state {
            ViewerState::Active(session) => Some(&session.target),
            _ => None,
        }
    }

    /// Attach to the display target `target` and build the empty scene:
    /// lights, axes, ground grid, Z-up camera and orbit controls.
    ///
    /// Fails with [`RenderError::TargetNotFound`] if the host has no such
    /// target; nothing is allocated in that case and an active session stays
    /// as it was. Initializing an active viewer on an existing target tears
    /// the previous session down first.
    pub fn initialize(&mut self, target: &str) -> Result<(), RenderError> {
        if !self.host.has_target(target) {
            tracing::error!(container = target, "display target not found");
            return Err(RenderError::TargetNotFound(target.to_string()));
        }
        if self.is_initialized() {
            tracing::warn!(container = target, "viewer re-initialized; disposing previous session");
            self.dispose();
        }

        let Some((width, height)) = self.host.attach(target) else {
            tracing::error!(container = target, "display target not found");
            return Err(RenderError::TargetNotFound(target.to_string()));
        };

        let mut scene = Scene::default();
        for (segments, color) in axes_segments(AXES_SIZE) {
            let count = segments.len() / 6;
            let geometry = self.host.create_geometry(Geometry::from_positions(segments));
            let material = self.host.create_material(Material::Line { color });
            scene.helpers.push(SceneObject::new(
                "axes",
                ObjectKind::LineSegments,
                geometry,
                material,
                count,
            ));
        }
        let grid = grid_segments(GRID_SIZE, GRID_DIVISIONS, GRID_HEIGHT);
        let count = grid.len() / 6;
        let geometry = self.host.create_geometry(Geometry::from_positions(grid));
        let material = self.host.create_material(Material::Line {
            color: [0.53, 0.53, 0.53],
        });
        scene.helpers.push(SceneObject::new(
            "grid",
            ObjectKind::LineSegments,
            geometry,
            material,
            count,
        ));

        let mut camera = OrbitCamera::default();
        camera.projection.set_viewport(width, height);

        self.state = ViewerState::Active(Box::new(Session {
            target: target.to_string(),
            viewport: (width, height),
            scene,
            camera,
            controls: OrbitControls::default(),
            resize_listener: true,
        }));
        tracing::info!(container = target, width, height, "retained viewer initialized");
        Ok(())
    }

    fn parts(&mut self) -> Result<(&mut H, &mut Session), RenderError> {
        match &mut self.state {
            ViewerState::Active(session) => Ok((&mut self.host, &mut **session)),
            ViewerState::Idle => Err(RenderError::NotInitialized),
            ViewerState::Disposed => Err(RenderError::Disposed),
        }
    }
}

impl<H: SceneHost> RenderSurface for RetainedViewer<H> {
    fn show_points(&mut self, points: &PointCloud) -> Result<(), RenderError> {
        let (host, session) = self.parts()?;
        let buffers = build_point_buffers(points);

        if let Some(old) = session.scene.replace_points(None) {
            release_object(host, old);
        }

        let count = buffers.point_count();
        let geometry = host.create_geometry(Geometry::from_positions(buffers.positions));
        let material = host.create_material(Material::samples());
        session.scene.replace_points(Some(SceneObject::new(
            "points",
            ObjectKind::Points,
            geometry,
            material,
            count,
        )));
        tracing::debug!(points = count, "displayed points");
        Ok(())
    }

    fn show_mesh(&mut self, mesh: &Mesh) -> Result<(), RenderError> {
        let (host, session) = self.parts()?;

        // Everything that can fail happens before the old mesh is touched.
        let buffers = build_mesh_buffers(mesh)?;
        let edges = edge_positions(mesh)?;
        let normals = compute_vertex_normals(&buffers);

        if let Some(old) = session.scene.replace_mesh(None) {
            release_object(host, old);
        }

        let triangles = buffers.triangle_count();
        let edge_count = edges.len() / 6;
        let geometry = host.create_geometry(Geometry::indexed(buffers).with_normals(normals));
        let material = host.create_material(Material::surface());
        let edge_geometry = host.create_geometry(Geometry::from_positions(edges));
        let edge_material = host.create_material(Material::edges());

        let object = SceneObject::new("mesh", ObjectKind::Mesh, geometry, material, triangles)
            .with_child(SceneObject::new(
                "edges",
                ObjectKind::LineSegments,
                edge_geometry,
                edge_material,
                edge_count,
            ));
        session.scene.replace_mesh(Some(object));
        tracing::debug!(
            vertices = mesh.vertex_count(),
            triangles,
            edges = edge_count,
            "displayed mesh"
        );
        Ok(())
    }

    fn clear(&mut self) -> Result<(), RenderError> {
        let (host, session) = self.parts()?;
        if let Some(old) = session.scene.replace_points(None) {
            release_object(host, old);
        }
        if let Some(old) = session.scene.replace_mesh(None) {
            release_object(host, old);
        }
        Ok(())
    }

    /// Forwarded only while the resize listener is registered; a disposed or
    /// uninitialized viewer ignores resizes.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        let ViewerState::Active(session) = &mut self.state else {
            return Ok(());
        };
        if !session.resize_listener {
            return Ok(());
        }
        session.viewport = (width, height);
        session.camera.projection.set_viewport(width, height);
        self.host.resize(width, height);
        Ok(())
    }

    fn render_frame(&mut self, _frame: &FrameContext) -> Result<(), RenderError> {
        let (host, session) = self.parts()?;
        session.controls.update(&mut session.camera);
        host.render(&session.scene, session.camera.view_projection())
    }

    fn orbit(&mut self, dx: f32, dy: f32) {
        if let ViewerState::Active(session) = &mut self.state {
            let height = session.viewport.1;
            session.controls.rotate(dx, dy, height);
        }
    }

    fn zoom(&mut self, delta: f32) {
        if let ViewerState::Active(session) = &mut self.state {
            session.controls.zoom(delta);
        }
    }

    fn stats(&self) -> SurfaceStats {
        let Some(scene) = self.scene() else {
            return SurfaceStats::default();
        };
        let mut stats = SurfaceStats::default();
        if let Some(mesh) = scene.mesh() {
            stats.has_mesh = true;
            stats.triangles = mesh.primitives;
            stats.edges = mesh.children.iter().map(|c| c.primitives).sum();
        }
        if let Some(points) = scene.points() {
            stats.has_points = true;
            stats.points = points.primitives;
        }
        stats
    }

    /// Unregister the resize listener, dispose the controls, dispose the host
    /// renderer and detach its output, then release every scene object.
    fn dispose(&mut self) {
        if !self.is_initialized() {
            return;
        }
        let ViewerState::Active(mut session) = std::mem::replace(&mut self.state, ViewerState::Disposed)
        else {
            return;
        };

        session.resize_listener = false;
        session.controls.dispose();
        self.host.dispose_renderer();
        self.host.detach();

        let scene = &mut session.scene;
        if let Some(old) = scene.replace_points(None) {
            release_object(&mut self.host, old);
        }
        if let Some(old) = scene.replace_mesh(None) {
            release_object(&mut self.host, old);
        }
        for helper in scene.helpers.drain(..) {
            release_object(&mut self.host, helper);
        }
        tracing::info!(container = %session.target, "retained viewer disposed");
    }
}
