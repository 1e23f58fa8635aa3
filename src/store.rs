//! Durable per-game state.
//!
//! A [`StateBackend`] is an opaque load/save pair for one serialized document.
//! [`GameStateStore`] layers the game's exclusive lock on top of it: every
//! mutation is one load → compute → save cycle with no other writer in between.

use crate::game::{GameError, GameResult};
use crate::types::GameState;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("state document could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Opaque key-value persistence for a single game document
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Returns `None` when nothing has been saved yet
    async fn load(&self) -> StoreResult<Option<String>>;

    /// Replace the stored document. Must be all-or-nothing.
    async fn save(&self, document: &str) -> StoreResult<()>;
}

/// JSON file on disk, replaced atomically via write-then-rename
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StateBackend for FileBackend {
    async fn load(&self) -> StoreResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(doc) => Ok(Some(doc)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, document: &str) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, document).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Process-local backend
#[derive(Default)]
pub struct MemoryBackend {
    document: RwLock<Option<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing (possibly garbage) document
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: RwLock::new(Some(document.into())),
        }
    }
}

#[async_trait]
impl StateBackend for MemoryBackend {
    async fn load(&self) -> StoreResult<Option<String>> {
        Ok(self.document.read().await.clone())
    }

    async fn save(&self, document: &str) -> StoreResult<()> {
        *self.document.write().await = Some(document.to_string());
        Ok(())
    }
}

/// One game's state behind an exclusive lock
pub struct GameStateStore {
    backend: Box<dyn StateBackend>,
    lock: Mutex<()>,
}

impl GameStateStore {
    pub fn new(backend: Box<dyn StateBackend>) -> Self {
        Self {
            backend,
            lock: Mutex::new(()),
        }
    }

    /// Snapshot of the current state
    pub async fn load(&self) -> GameState {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    /// Run `f` against the current state and commit the result.
    ///
    /// `f` works on a copy: if it fails nothing is written and the stored
    /// state is untouched.
    pub async fn transact<T, F>(&self, f: F) -> GameResult<T>
    where
        F: FnOnce(&mut GameState) -> GameResult<T> + Send,
        T: Send,
    {
        let _guard = self.lock.lock().await;
        let mut state = self.read().await;
        let out = f(&mut state)?;
        self.write(&mut state).await?;
        Ok(out)
    }

    /// Like [`transact`](Self::transact), but only commits when `f` returns `Some`.
    /// Used for hot paths (chat messages) where most events change nothing.
    pub async fn transact_if<T, F>(&self, f: F) -> GameResult<Option<T>>
    where
        F: FnOnce(&mut GameState) -> GameResult<Option<T>> + Send,
        T: Send,
    {
        let _guard = self.lock.lock().await;
        let mut state = self.read().await;
        let out = f(&mut state)?;
        if out.is_some() {
            self.write(&mut state).await?;
        }
        Ok(out)
    }

    /// Load without locking. Unreadable or corrupt documents yield fresh state.
    async fn read(&self) -> GameState {
        match self.backend.load().await {
            Ok(Some(doc)) => match serde_json::from_str(&doc) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!("Corrupt game state, starting fresh: {}", e);
                    GameState::fresh()
                }
            },
            Ok(None) => GameState::fresh(),
            Err(e) => {
                tracing::warn!("Failed to load game state, starting fresh: {}", e);
                GameState::fresh()
            }
        }
    }

    async fn write(&self, state: &mut GameState) -> Result<(), GameError> {
        state.updated_at = Some(chrono::Utc::now().to_rfc3339());
        let doc = serde_json::to_string_pretty(state).map_err(StoreError::from)?;
        self.backend.save(&doc).await?;
        Ok(())
    }
}
