//! wgpu render backends for the surface viewer.
//!
//! [`ImmediateRenderer`] uploads mesh buffers directly and draws them with two
//! shader programs: a height gradient fill and a line-mode wireframe.
//! [`WgpuSceneHost`] realizes the retained scene of a
//! [`RetainedViewer`](surfview_render::RetainedViewer) on the GPU.
//!
//! # Invariants
//! - Shader compilation failures are returned, never logged and ignored.
//! - Replaced and disposed buffers are destroyed explicitly.
//! - The wireframe pass shares the fill pass's index buffer.

mod gpu;
mod immediate;
mod scene_host;
mod shaders;

pub use gpu::{DepthTarget, GpuContext};
pub use immediate::{ImmediateRenderer, ImmediateSettings};
pub use scene_host::WgpuSceneHost;

pub fn crate_info() -> &'static str {
    concat!("surfview-render-wgpu v", env!("CARGO_PKG_VERSION"))
}
