use std::future::Future;

use parking_lot::Mutex;
use serde_json::Value;
use surfview_common::{Mesh, PointCloud};
use surfview_render::{RenderError, RenderSurface, RetainedViewer, SceneHost};

use crate::error::BridgeError;
use crate::wire::{InitArgs, Method};

/// The far side of the bridge: something that answers named JSON calls.
pub trait ViewerModule: Send + Sync {
    fn invoke(
        &self,
        method: &str,
        args: Value,
    ) -> impl Future<Output = Result<Value, BridgeError>> + Send;
}

/// A [`ViewerModule`] backed by a retained viewer.
///
/// Calls are serialized through a mutex; the viewer itself is
/// single-threaded.
pub struct ViewerEndpoint<H: SceneHost> {
    viewer: Mutex<RetainedViewer<H>>,
}

impl<H: SceneHost> ViewerEndpoint<H> {
    pub fn new(viewer: RetainedViewer<H>) -> Self {
        Self {
            viewer: Mutex::new(viewer),
        }
    }

    /// Run `f` with exclusive access to the viewer.
    pub fn with_viewer<R>(&self, f: impl FnOnce(&mut RetainedViewer<H>) -> R) -> R {
        f(&mut self.viewer.lock())
    }

    /// Dispatch one call. [`Method::Init`] answers `false` when the container
    /// does not exist; every other call answers `null`.
    pub fn call(&self, method: Method, args: Value) -> Result<Value, BridgeError> {
        let mut viewer = self.viewer.lock();
        match method {
            Method::Init => {
                let args: InitArgs = serde_json::from_value(args)?;
                match viewer.initialize(&args.container_id) {
                    Ok(()) => Ok(Value::Bool(true)),
                    Err(RenderError::TargetNotFound(id)) => {
                        tracing::warn!(container = %id, "container not found");
                        Ok(Value::Bool(false))
                    }
                    Err(e) => Err(e.into()),
                }
            }
            Method::DisplayPoints => {
                let points: PointCloud = serde_json::from_value(args)?;
                viewer.show_points(&points)?;
                Ok(Value::Null)
            }
            Method::DisplayMesh => {
                let mesh: Mesh = serde_json::from_value(args)?;
                viewer.show_mesh(&mesh)?;
                Ok(Value::Null)
            }
            Method::ClearScene => {
                viewer.clear()?;
                Ok(Value::Null)
            }
            Method::Dispose => {
                viewer.dispose();
                Ok(Value::Null)
            }
        }
    }
}

impl<H: SceneHost + Send> ViewerModule for ViewerEndpoint<H> {
    async fn invoke(&self, method: &str, args: Value) -> Result<Value, BridgeError> {
        let method: Method = method.parse()?;
        tracing::trace!(%method, "bridge call");
        self.call(method, args)
    }
}
