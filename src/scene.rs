//! Scene cache with a single active scene.
//!
//! [`SceneCache::prepare_scene`] starts loading a scene in the background
//! and marks it active. [`SceneCache::get_scene`] reports where the active
//! scene is in its lifecycle instead of handing out a possibly missing
//! value, so callers can tell "still loading" apart from "failed".
//!
//! Loads are fire-and-forget: on native targets they are spawned on the
//! tokio runtime the cache was created in (if any), on wasm they are spawned
//! with `wasm_bindgen_futures::spawn_local`. Without a runtime a load makes
//! progress whenever someone awaits its [`SceneHandle`].
//!
//! Entries are never evicted. A failed entry is replaced by a fresh load the
//! next time its id is prepared.

use std::{
    collections::HashMap,
    fmt,
    pin::Pin,
    sync::Arc,
    task::{Context as TaskContext, Poll},
};

use futures::{FutureExt, future::Shared};
use instant::Instant;

use crate::{context::Context, resources};

/// Opaque scene identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(pub u32);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The future returned by a [`SceneLoader`].
#[cfg(not(target_arch = "wasm32"))]
pub type LoadFuture<T> = futures::future::BoxFuture<'static, anyhow::Result<T>>;
#[cfg(target_arch = "wasm32")]
pub type LoadFuture<T> = futures::future::LocalBoxFuture<'static, anyhow::Result<T>>;

/// Outcome of a scene load, shared by every waiter.
pub type SceneResult<S> = Result<Arc<S>, Arc<anyhow::Error>>;

#[cfg(not(target_arch = "wasm32"))]
type FillFuture<S> = futures::future::BoxFuture<'static, SceneResult<S>>;
#[cfg(target_arch = "wasm32")]
type FillFuture<S> = futures::future::LocalBoxFuture<'static, SceneResult<S>>;

/// Loads scenes by id. This is the resource service the cache fills from.
pub trait SceneLoader {
    #[cfg(not(target_arch = "wasm32"))]
    type Scene: Send + Sync + 'static;
    #[cfg(target_arch = "wasm32")]
    type Scene: 'static;

    fn scene(&self, id: SceneId) -> LoadFuture<Self::Scene>;
}

/// A scene as stored in the asset tree: its id and raw contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    pub id: SceneId,
    pub data: Vec<u8>,
}

/// Loads `scenes/<id>.bin` through [`resources::load_binary`].
#[derive(Debug, Clone, Default)]
pub struct AssetSceneLoader {
    ctx: Arc<Context>,
}

impl AssetSceneLoader {
    pub fn new(ctx: Context) -> Self {
        Self { ctx: Arc::new(ctx) }
    }
}

impl SceneLoader for AssetSceneLoader {
    type Scene = Scene;

    fn scene(&self, id: SceneId) -> LoadFuture<Scene> {
        let ctx = self.ctx.clone();
        let fut = async move {
            let data = resources::load_binary(&ctx, &resources::scene_file(id.0)).await?;
            Ok::<_, anyhow::Error>(Scene { id, data })
        };
        #[cfg(not(target_arch = "wasm32"))]
        return fut.boxed();
        #[cfg(target_arch = "wasm32")]
        return fut.boxed_local();
    }
}

/// A cloneable future resolving to the outcome of one scene load.
pub struct SceneHandle<S> {
    id: SceneId,
    fill: Shared<FillFuture<S>>,
}

impl<S> Clone for SceneHandle<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            fill: self.fill.clone(),
        }
    }
}

impl<S> fmt::Debug for SceneHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneHandle")
            .field("id", &self.id)
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl<S> SceneHandle<S> {
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// The outcome, if the load has finished.
    pub fn peek(&self) -> Option<&SceneResult<S>> {
        self.fill.peek()
    }

    pub fn is_ready(&self) -> bool {
        self.peek().is_some()
    }

    fn lookup(&self) -> SceneLookup<S> {
        match self.peek() {
            None => SceneLookup::Pending(self.clone()),
            Some(Ok(scene)) => SceneLookup::Ready(scene.clone()),
            Some(Err(e)) => SceneLookup::Failed(e.clone()),
        }
    }
}

impl<S> Future for SceneHandle<S> {
    type Output = SceneResult<S>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.fill).poll(cx)
    }
}

/// Where a scene is in its lifecycle.
pub enum SceneLookup<S> {
    /// No scene has been prepared yet.
    NoActiveScene,
    /// The requested id was never prepared.
    NotPrepared,
    /// The load has not finished. The handle resolves when it does.
    Pending(SceneHandle<S>),
    Ready(Arc<S>),
    Failed(Arc<anyhow::Error>),
}

impl<S> SceneLookup<S> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    /// The scene, if it is loaded.
    pub fn ready(self) -> Option<Arc<S>> {
        match self {
            Self::Ready(scene) => Some(scene),
            _ => None,
        }
    }
}

impl<S> fmt::Debug for SceneLookup<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveScene => f.write_str("NoActiveScene"),
            Self::NotPrepared => f.write_str("NotPrepared"),
            Self::Pending(handle) => f.debug_tuple("Pending").field(&handle.id).finish(),
            Self::Ready(_) => f.write_str("Ready(..)"),
            Self::Failed(e) => f.debug_tuple("Failed").field(&format!("{e:#}")).finish(),
        }
    }
}

/// Caches scenes by id and tracks which one is active.
pub struct SceneCache<L: SceneLoader> {
    loader: L,
    scenes: HashMap<SceneId, SceneHandle<L::Scene>>,
    active: Option<SceneId>,
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: Option<tokio::runtime::Handle>,
}

impl<L: SceneLoader> fmt::Debug for SceneCache<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneCache")
            .field("scenes", &self.scenes.len())
            .field("active", &self.active)
            .finish()
    }
}

impl<L: SceneLoader> SceneCache<L> {
    /// Create a cache. On native targets loads are spawned on the current
    /// tokio runtime, if there is one.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            scenes: HashMap::new(),
            active: None,
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime: current_runtime(),
        }
    }

    /// Create a cache that spawns its loads on `handle`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn with_runtime(loader: L, handle: tokio::runtime::Handle) -> Self {
        Self {
            loader,
            scenes: HashMap::new(),
            active: None,
            async_runtime: Some(handle),
        }
    }

    /// Start loading `id` unless it is loading or loaded already, and make
    /// it the active scene.
    ///
    /// The returned handle resolves once the load finishes. Callers that
    /// don't need to wait can drop it.
    pub fn prepare_scene(&mut self, id: SceneId) -> SceneHandle<L::Scene> {
        self.active = Some(id);
        if let Some(handle) = self.scenes.get(&id) {
            match handle.peek() {
                Some(Err(e)) => log::info!("Retrying scene {} after failed load: {:#}", id, e),
                _ => return handle.clone(),
            }
        }

        let handle = SceneHandle {
            id,
            fill: self.fill(id).shared(),
        };
        self.spawn(handle.clone());
        self.scenes.insert(id, handle.clone());
        handle
    }

    /// The active scene's state.
    pub fn get_scene(&self) -> SceneLookup<L::Scene> {
        match self.active {
            Some(id) => self.scene(id),
            None => SceneLookup::NoActiveScene,
        }
    }

    /// The state of any prepared scene. Scenes that were never prepared
    /// report [`SceneLookup::NotPrepared`].
    pub fn scene(&self, id: SceneId) -> SceneLookup<L::Scene> {
        match self.scenes.get(&id) {
            Some(handle) => handle.lookup(),
            None => SceneLookup::NotPrepared,
        }
    }

    pub fn active(&self) -> Option<SceneId> {
        self.active
    }

    /// Number of scenes that were prepared, in any state.
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    fn fill(&self, id: SceneId) -> FillFuture<L::Scene> {
        let load = self.loader.scene(id);
        let fut = async move {
            let start = Instant::now();
            match load.await {
                Ok(scene) => {
                    log::info!("Loaded scene {} in {:?}", id, start.elapsed());
                    Ok(Arc::new(scene))
                }
                Err(e) => {
                    log::error!("Failed to load scene {}: {:#}", id, e);
                    Err(Arc::new(e))
                }
            }
        };
        #[cfg(not(target_arch = "wasm32"))]
        return fut.boxed();
        #[cfg(target_arch = "wasm32")]
        return fut.boxed_local();
    }

    fn spawn(&self, handle: SceneHandle<L::Scene>) {
        #[cfg(not(target_arch = "wasm32"))]
        let handle_id = handle.id;
        let drive = async move {
            let _ = handle.await;
        };
        #[cfg(not(target_arch = "wasm32"))]
        {
            match &self.async_runtime {
                Some(runtime) => {
                    runtime.spawn(drive);
                }
                None => log::debug!("Scene {} will load when its handle is awaited", handle_id),
            }
        }
        #[cfg(target_arch = "wasm32")]
        {
            wasm_bindgen_futures::spawn_local(drive);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn current_runtime() -> Option<tokio::runtime::Handle> {
    let runtime = tokio::runtime::Handle::try_current().ok();
    if runtime.is_none() {
        log::warn!("No tokio runtime, scene loads only run while their handles are awaited");
    }
    runtime
}
