//! Rendering adapter: one surface contract, two kinds of backend.
//!
//! [`RenderSurface`] is what the presentation loop drives. The retained
//! backend ([`RetainedViewer`]) keeps scene objects and replaces them on each
//! display call; it draws through a [`SceneHost`]. The immediate backend lives
//! in `surfview-render-wgpu`.
//!
//! # Invariants
//! - Replacing a display releases the previous resources before installing new ones.
//! - An invalid mesh is rejected before any host allocation.
//! - Disposing unregisters the resize listener before releasing host resources.

pub mod camera;
pub mod frame;
pub mod headless;
pub mod retained;
pub mod scene;
pub mod surface;

pub use camera::{FixedCamera, OrbitCamera, OrbitControls, Perspective, model_rotation};
pub use frame::{LoopControl, PresentationLoop, SpinClock};
pub use headless::{DrawRecord, HeadlessHost};
pub use retained::{RetainedViewer, SceneHost};
pub use scene::{Geometry, GeometryId, Light, Material, MaterialId, ObjectKind, Scene, SceneObject};
pub use surface::{FrameContext, RenderError, RenderSurface, SurfaceStats};

pub fn crate_info() -> &'static str {
    concat!("surfview-render v", env!("CARGO_PKG_VERSION"))
}
