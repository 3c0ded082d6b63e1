use surfview_common::{Mesh, PointCloud};
use surfview_mesh::MeshError;

/// Errors surfaced by render surfaces and their hosts.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("display target '{0}' not found")]
    TargetNotFound(String),
    #[error("{label} shader failed to compile: {diagnostic}")]
    ShaderCompilation { label: String, diagnostic: String },
    #[error("adapter is missing required feature: {0}")]
    MissingFeature(String),
    #[error("GPU error: {0}")]
    Gpu(String),
    #[error("invalid mesh: {0}")]
    InvalidMesh(#[from] MeshError),
    #[error("render surface used before initialization")]
    NotInitialized,
    #[error("render surface used after disposal")]
    Disposed,
}

/// Per-frame inputs handed to [`RenderSurface::render_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameContext {
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Accumulated model rotation about +Z, in radians.
    pub model_angle: f32,
}

/// What a surface is currently displaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceStats {
    pub has_mesh: bool,
    pub has_points: bool,
    pub triangles: usize,
    pub edges: usize,
    pub points: usize,
}

/// The contract both render backends implement.
///
/// All methods run on the thread that owns the surface. Display calls replace
/// what was shown before; they never stack.
pub trait RenderSurface {
    /// Show `points`, replacing any previous point display.
    ///
    /// An empty cloud still replaces the previous one: the display is
    /// installed with zero points and draws nothing.
    fn show_points(&mut self, points: &PointCloud) -> Result<(), RenderError>;

    /// Show `mesh` as a shaded surface with an edge overlay, replacing any
    /// previous mesh display. Invalid meshes are rejected untouched.
    ///
    /// A mesh without faces is valid. It replaces the previous mesh and is
    /// installed with zero triangles and edges, so `stats().has_mesh` is true
    /// while nothing is drawn for it.
    fn show_mesh(&mut self, mesh: &Mesh) -> Result<(), RenderError>;

    /// Remove both the mesh and the point display.
    fn clear(&mut self) -> Result<(), RenderError>;

    /// The display surface changed size.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    /// Draw and present one frame.
    fn render_frame(&mut self, frame: &FrameContext) -> Result<(), RenderError>;

    /// Pointer-driven camera orbit. Surfaces without orbit controls ignore it.
    fn orbit(&mut self, _dx: f32, _dy: f32) {}

    /// Camera dolly. Surfaces without orbit controls ignore it.
    fn zoom(&mut self, _delta: f32) {}

    fn stats(&self) -> SurfaceStats;

    /// Release every resource the surface holds. Safe to call twice.
    fn dispose(&mut self);
}
