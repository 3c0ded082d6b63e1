use std::future::Future;

use serde::de::DeserializeOwned;
use serde_json::Value;
use surfview_common::{Mesh, PointCloud};
use tokio::sync::OnceCell;

use crate::endpoint::ViewerModule;
use crate::error::BridgeError;
use crate::wire::{InitArgs, Method};

/// Acquires the viewer module. Called at most once per successful load.
pub trait ModuleLoader: Send + Sync {
    type Module: ViewerModule;

    fn load(&self) -> impl Future<Output = Result<Self::Module, BridgeError>> + Send;
}

/// A [`ModuleLoader`] built from a synchronous factory.
pub struct FnLoader<F>(F);

impl<F> FnLoader<F> {
    pub fn new<M>(factory: F) -> Self
    where
        F: Fn() -> Result<M, BridgeError>,
    {
        Self(factory)
    }
}

impl<F, M> ModuleLoader for FnLoader<F>
where
    F: Fn() -> Result<M, BridgeError> + Send + Sync,
    M: ViewerModule,
{
    type Module = M;

    async fn load(&self) -> Result<M, BridgeError> {
        (self.0)()
    }
}

/// Typed front of a viewer module.
///
/// The module is loaded lazily by the first call. Concurrent first calls wait
/// on the same load; a failed load surfaces to its callers and is retried by
/// the next call.
pub struct DisplayBridge<L: ModuleLoader> {
    loader: L,
    module: OnceCell<L::Module>,
    disposed: bool,
}

impl<L: ModuleLoader> DisplayBridge<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            module: OnceCell::new(),
            disposed: false,
        }
    }

    /// Whether the module has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.module.initialized()
    }

    async fn module(&self) -> Result<&L::Module, BridgeError> {
        if self.disposed {
            return Err(BridgeError::Disposed);
        }
        self.module
            .get_or_try_init(|| async {
                tracing::info!("loading viewer module");
                let module = self.loader.load().await.inspect_err(|e| {
                    tracing::error!("viewer module load failed: {e}");
                })?;
                tracing::debug!("viewer module loaded");
                Ok::<_, BridgeError>(module)
            })
            .await
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, args: Value) -> Result<T, BridgeError> {
        let module = self.module().await?;
        let result = module.invoke(method.as_str(), args).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// Attach the viewer to `container_id`. Returns `false` if the container
    /// does not exist.
    pub async fn init(&self, container_id: &str) -> Result<bool, BridgeError> {
        let args = serde_json::to_value(InitArgs {
            container_id: container_id.to_string(),
        })?;
        self.call(Method::Init, args).await
    }

    pub async fn display_points(&self, points: &PointCloud) -> Result<(), BridgeError> {
        self.call(Method::DisplayPoints, serde_json::to_value(points)?)
            .await
    }

    pub async fn display_mesh(&self, mesh: &Mesh) -> Result<(), BridgeError> {
        self.call(Method::DisplayMesh, serde_json::to_value(mesh)?)
            .await
    }

    pub async fn clear_scene(&self) -> Result<(), BridgeError> {
        self.call(Method::ClearScene, Value::Null).await
    }

    /// Dispose the viewer if the module was ever loaded; never loads it.
    /// Later calls fail with [`BridgeError::Disposed`].
    pub async fn dispose(&mut self) -> Result<(), BridgeError> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        if let Some(module) = self.module.take() {
            module.invoke(Method::Dispose.as_str(), Value::Null).await?;
            tracing::info!("viewer module disposed");
        }
        Ok(())
    }

    /// The loaded module, if any.
    pub fn loaded(&self) -> Option<&L::Module> {
        self.module.get()
    }
}
