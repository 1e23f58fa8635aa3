use crate::config::{EngineConfig, StorageKind};
use crate::game::Game;
use crate::store::{FileBackend, MemoryBackend, StateBackend};
use crate::types::GameId;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Lazily created games, one per chat. Each game carries its own lock,
/// so unrelated chats never wait on each other.
#[derive(Clone)]
pub struct GameRegistry {
    games: Arc<RwLock<HashMap<GameId, Arc<Game>>>>,
    config: Arc<EngineConfig>,
}

impl GameRegistry {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self {
            games: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.config
    }

    /// Get the game for `id`, creating its handle on first use
    pub async fn game(&self, id: &str) -> Arc<Game> {
        if let Some(game) = self.games.read().await.get(id) {
            return game.clone();
        }

        let mut games = self.games.write().await;
        games
            .entry(id.to_string())
            .or_insert_with(|| {
                tracing::debug!("Opening game {}", id);
                Arc::new(Game::new(id, self.backend_for(id), self.config.clone()))
            })
            .clone()
    }

    /// Register a prebuilt game (seeded games in tests, custom backends)
    pub async fn insert(&self, game: Game) -> Arc<Game> {
        let game = Arc::new(game);
        self.games
            .write()
            .await
            .insert(game.id().to_string(), game.clone());
        game
    }

    fn backend_for(&self, id: &str) -> Box<dyn StateBackend> {
        match self.config.storage {
            StorageKind::Memory => Box::new(MemoryBackend::new()),
            StorageKind::File => {
                let path = self.config.data_dir.join(format!("game-{}.json", file_stem(id)));
                Box::new(FileBackend::new(path))
            }
        }
    }
}

/// Chat ids are arbitrary strings. Hex keeps file names portable and maps
/// distinct ids to distinct files.
fn file_stem(id: &str) -> String {
    hex::encode(id.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LobbyStatus;

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("-42"), "2d3432");
        assert!(file_stem("../etc/passwd")
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
        assert_ne!(file_stem("team.red"), file_stem("team_red"));
        assert_ne!(file_stem("a/b"), file_stem("a_b"));
    }

    #[tokio::test]
    async fn test_same_id_same_game() {
        let registry = GameRegistry::new(Arc::new(EngineConfig::in_memory()));
        let a = registry.game("chat-1").await;
        let b = registry.game("chat-1").await;
        assert!(Arc::ptr_eq(&a, &b));

        let other = registry.game("chat-2").await;
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[tokio::test]
    async fn test_games_are_isolated() {
        let registry = GameRegistry::new(Arc::new(EngineConfig::in_memory()));
        registry.game("one").await.join("a", "alice").await.unwrap();
        assert_eq!(registry.game("one").await.size().await, 1);
        assert_eq!(registry.game("two").await.size().await, 0);
    }

    #[tokio::test]
    async fn test_file_games_survive_registry_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(EngineConfig {
            data_dir: dir.path().to_path_buf(),
            ..EngineConfig::default()
        });

        let registry = GameRegistry::new(config.clone());
        registry.game("-42").await.join("a", "alice").await.unwrap();
        assert!(dir.path().join("game-2d3432.json").exists());

        let restarted = GameRegistry::new(config);
        assert_eq!(restarted.game("-42").await.size().await, 1);
    }

    #[tokio::test]
    async fn test_similar_ids_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = Arc::new(EngineConfig {
            data_dir: dir.path().to_path_buf(),
            ..EngineConfig::default()
        });
        let registry = GameRegistry::new(config);

        let red = registry.game("team.red").await;
        red.join("x", "xavier").await.unwrap();
        red.join("y", "yvonne").await.unwrap();
        red.force_start().await.unwrap();

        let status = registry.game("team_red").await.status().await;
        assert_eq!(status.lobby_count, 0);
        assert_eq!(status.players, 0);
        assert_eq!(status.lobby_status, LobbyStatus::Waiting);

        for id in ["a/b", "a_b"] {
            registry.game(id).await.join("z", "zed").await.unwrap();
        }
        assert_eq!(registry.game("a/b").await.size().await, 1);
        assert_eq!(registry.game("a_b").await.size().await, 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
    }
}
