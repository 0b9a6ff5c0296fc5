use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use quick_cache::sync::Cache;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use crate::bitmap::BitmapData;
use crate::error::TileLoadError;
use crate::tile::{TileKey, TileSource};

const DEFAULT_CAPACITY: usize = 5000;

/// Outcome of a finished tile request, as stored in the loader cache.
#[derive(Debug, Clone)]
pub enum TileState {
    /// Tile image is available.
    Loaded(Arc<BitmapData>),
    /// Loading failed. The error stays cached until the key is [invalidated](TileLoader::invalidate).
    Failed(TileLoadError),
}

impl TileState {
    fn into_result(self) -> Result<Arc<BitmapData>, TileLoadError> {
        match self {
            TileState::Loaded(bitmap) => Ok(bitmap),
            TileState::Failed(err) => Err(err),
        }
    }
}

/// Position of a key in the `Idle -> Fetching -> Loaded | Failed` lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TileStatus {
    /// The tile is neither cached nor being fetched: it was never requested, or it was invalidated.
    Idle,
    /// A fetch is in progress.
    Fetching,
    /// The tile is cached.
    Loaded,
    /// The last fetch failed.
    Failed,
}

struct LoaderInner {
    source: Arc<dyn TileSource>,
    tiles: Cache<TileKey, TileState>,
    fetching: Mutex<HashSet<TileKey>>,
    spawned: Mutex<HashMap<TileKey, AbortHandle>>,
}

/// Removes a key from the fetching set when the fetch ends, including when its future is dropped.
struct FetchingMark<'a> {
    inner: &'a LoaderInner,
    key: TileKey,
}

impl Drop for FetchingMark<'_> {
    fn drop(&mut self) {
        self.inner.fetching.lock().remove(&self.key);
    }
}

impl LoaderInner {
    async fn load(&self, key: TileKey) -> Result<Arc<BitmapData>, TileLoadError> {
        match self.tiles.get_value_or_guard_async(&key).await {
            Ok(state) => state.into_result(),
            Err(guard) => {
                self.fetching.lock().insert(key);
                let _mark = FetchingMark { inner: self, key };

                log::debug!("Fetching tile {key:?}");
                let state = match self.source.load_tile(key).await {
                    Ok(bitmap) => TileState::Loaded(Arc::new(bitmap)),
                    Err(err) => {
                        log::warn!("Failed to load tile {key:?}: {err}");
                        TileState::Failed(err)
                    }
                };

                let _ = guard.insert(state.clone());
                state.into_result()
            }
        }
    }
}

/// Loads bitmap tiles from a [`TileSource`] and caches them by [`TileKey`].
///
/// The loader can be used from many threads and tasks at once. Concurrent requests for the same key share
/// one fetch: the first caller fetches, the others wait for its result.
pub struct TileLoader {
    inner: Arc<LoaderInner>,
    runtime: Option<Handle>,
}

impl std::fmt::Debug for TileLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileLoader")
            .field("cached", &self.inner.tiles.len())
            .field("fetching", &self.inner.fetching.lock().len())
            .finish()
    }
}

impl TileLoader {
    /// Creates a loader. If called inside a tokio runtime, that runtime is used for
    /// [background requests](TileLoader::request).
    pub fn new(source: impl TileSource + 'static) -> Self {
        Self::with_capacity(source, DEFAULT_CAPACITY)
    }

    /// Creates a loader caching at most `capacity` tiles.
    pub fn with_capacity(source: impl TileSource + 'static, capacity: usize) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                source: Arc::new(source),
                tiles: Cache::new(capacity.max(1)),
                fetching: Mutex::new(HashSet::new()),
                spawned: Mutex::new(HashMap::new()),
            }),
            runtime: Handle::try_current().ok(),
        }
    }

    /// Sets the runtime background requests are spawned on.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Loads the tile, or returns the cached result.
    pub async fn load_tile(&self, key: TileKey) -> Result<Arc<BitmapData>, TileLoadError> {
        self.inner.load(key).await
    }

    /// Cached result for the key without starting a fetch.
    pub fn cached(&self, key: &TileKey) -> Option<TileState> {
        self.inner.tiles.get(key)
    }

    /// Lifecycle position of the key.
    pub fn status(&self, key: &TileKey) -> TileStatus {
        if self.inner.fetching.lock().contains(key) {
            return TileStatus::Fetching;
        }

        match self.cached(key) {
            Some(TileState::Loaded(_)) => TileStatus::Loaded,
            Some(TileState::Failed(_)) => TileStatus::Failed,
            None => TileStatus::Idle,
        }
    }

    /// Starts loading the tile in background unless it is cached or already being fetched.
    ///
    /// Returns `false` if no runtime is available to run the request.
    pub fn request(&self, key: TileKey) -> bool {
        let Some(runtime) = &self.runtime else {
            log::debug!("No runtime to load tile {key:?} in background");
            return false;
        };

        if self.cached(&key).is_some() {
            return true;
        }

        let mut spawned = self.inner.spawned.lock();
        if spawned.contains_key(&key) || self.inner.fetching.lock().contains(&key) {
            return true;
        }

        let inner = self.inner.clone();
        let handle = runtime.spawn(async move {
            let _ = inner.load(key).await;
            inner.spawned.lock().remove(&key);
        });
        spawned.insert(key, handle.abort_handle());

        true
    }

    /// Aborts background requests for every key not in `visible`. Returns the number of aborted requests.
    ///
    /// Waiters of an aborted fetch are not left hanging: one of them takes the fetch over.
    pub fn cancel_stale(&self, visible: &HashSet<TileKey>) -> usize {
        let mut spawned = self.inner.spawned.lock();
        let stale: Vec<TileKey> = spawned
            .keys()
            .filter(|key| !visible.contains(key))
            .copied()
            .collect();

        for key in &stale {
            if let Some(handle) = spawned.remove(key) {
                log::debug!("Cancelling stale tile request {key:?}");
                handle.abort();
            }
        }

        stale.len()
    }

    /// Drops the cached result for the key, so that the next request fetches it again.
    pub fn invalidate(&self, key: &TileKey) {
        self.inner.tiles.remove(key);
    }

    /// Number of cached results.
    pub fn cached_count(&self) -> usize {
        self.inner.tiles.len()
    }
}
