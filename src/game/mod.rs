mod assignment;
mod kill;
mod lobby;
mod score;

pub use assignment::{build_ring, shuffled_ring, Assignment, Briefing};
pub use kill::{contains_phrase, find_killer, Elimination};
pub use lobby::StatusReport;
pub use score::{rank, LeaderboardEntry};

use crate::config::EngineConfig;
use crate::store::{GameStateStore, StateBackend, StoreError};
use crate::types::{GameId, GameState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};

/// Minimum lobby size for a game to start
pub const MIN_PLAYERS: usize = 2;

pub type GameResult<T> = Result<T, GameError>;

/// Errors reported to whoever invoked a game operation.
/// None of them leave a partial mutation behind.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("The lobby is closed, the game has already started")]
    LobbyClosed,

    #[error("Participant {0} already joined")]
    AlreadyJoined(String),

    #[error("Participant {0} is not in the lobby")]
    NotInLobby(String),

    #[error("Need at least 2 players, have {have}")]
    InsufficientPlayers { have: usize },

    #[error("Invalid difficulty '{0}', expected easy, medium or hard")]
    InvalidDifficulty(String),

    #[error("No lobby member matches '{0}'")]
    NotFound(String),

    #[error("The game has already been started")]
    AlreadyLocked,

    #[error("Team name must not be empty")]
    InvalidTeam,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GameError {
    /// Stable machine-readable code for protocol error replies
    pub fn code(&self) -> &'static str {
        match self {
            GameError::LobbyClosed => "LOBBY_CLOSED",
            GameError::AlreadyJoined(_) => "ALREADY_JOINED",
            GameError::NotInLobby(_) => "NOT_IN_LOBBY",
            GameError::InsufficientPlayers { .. } => "INSUFFICIENT_PLAYERS",
            GameError::InvalidDifficulty(_) => "INVALID_DIFFICULTY",
            GameError::NotFound(_) => "NOT_FOUND",
            GameError::AlreadyLocked => "ALREADY_LOCKED",
            GameError::InvalidTeam => "INVALID_TEAM",
            GameError::Store(_) => "STORE_FAILED",
        }
    }
}

/// One running game: its store, its randomness and the engine settings.
///
/// Operations are split across the submodules (`lobby`, `assignment`,
/// `kill`, `score`), each adding an `impl Game` block.
pub struct Game {
    id: GameId,
    store: GameStateStore,
    config: Arc<EngineConfig>,
    rng: Mutex<StdRng>,
}

impl Game {
    pub fn new(
        id: impl Into<GameId>,
        backend: Box<dyn StateBackend>,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self::with_rng(id, backend, config, StdRng::from_os_rng())
    }

    /// Deterministic game for tests and replays
    pub fn with_seed(
        id: impl Into<GameId>,
        backend: Box<dyn StateBackend>,
        config: Arc<EngineConfig>,
        seed: u64,
    ) -> Self {
        Self::with_rng(id, backend, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        id: impl Into<GameId>,
        backend: Box<dyn StateBackend>,
        config: Arc<EngineConfig>,
        rng: StdRng,
    ) -> Self {
        Self {
            id: id.into(),
            store: GameStateStore::new(backend),
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current persisted state
    pub async fn snapshot(&self) -> GameState {
        self.store.load().await
    }

    fn with_rng_mut<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        // A poisoned RNG is still a perfectly good RNG
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut rng)
    }
}
