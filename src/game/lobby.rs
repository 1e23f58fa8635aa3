use super::{Game, GameError, GameResult};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Summary for the `status` command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusReport {
    pub phase: Phase,
    pub lobby_status: LobbyStatus,
    pub lobby_count: usize,
    pub players: usize,
    pub alive: usize,
    pub difficulty: Difficulty,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<ParticipantId>,
}

impl From<&GameState> for StatusReport {
    fn from(state: &GameState) -> Self {
        Self {
            phase: state.phase(),
            lobby_status: state.lobby.status,
            lobby_count: state.lobby.players.len(),
            players: state.players.len(),
            alive: state.alive_count(),
            difficulty: state.difficulty,
            winner: state.winner.clone(),
        }
    }
}

/// Fresh lobby, keeping only what outlives a single game
fn reset_state(state: &mut GameState) {
    let teams = std::mem::take(&mut state.teams);
    *state = GameState {
        teams,
        ..GameState::fresh()
    };
}

fn ensure_waiting(state: &GameState) -> GameResult<()> {
    match state.lobby.status {
        LobbyStatus::Waiting => Ok(()),
        LobbyStatus::Locked => Err(GameError::LobbyClosed),
    }
}

/// Resolve `who` to a lobby member: `@name` matches display names
/// case-insensitively, anything else is tried as an id first.
fn resolve_member(lobby: &Lobby, who: &str) -> Option<ParticipantId> {
    let who = who.trim();
    let by_name = |name: &str| {
        let name = name.to_lowercase();
        lobby
            .players
            .iter()
            .find(|p| {
                lobby
                    .names
                    .get(*p)
                    .is_some_and(|n| n.trim_start_matches('@').to_lowercase() == name)
            })
            .cloned()
    };

    match who.strip_prefix('@') {
        Some(name) => by_name(name),
        None if lobby.contains(who) => Some(who.to_string()),
        None => by_name(who),
    }
}

impl Game {
    /// Wipe the current game and reopen an empty lobby. Team labels survive.
    pub async fn reset(&self) -> GameResult<()> {
        self.store
            .transact(|state| {
                reset_state(state);
                Ok(())
            })
            .await?;
        tracing::info!("Game {} reset", self.id);
        Ok(())
    }

    /// Same transition as [`reset`](Self::reset), announced as a new lobby
    pub async fn open_lobby(&self) -> GameResult<()> {
        self.reset().await?;
        tracing::info!("Game {} lobby open", self.id);
        Ok(())
    }

    /// Add a participant to the waiting lobby. Returns the new lobby size.
    pub async fn join(&self, participant: &str, name: &str) -> GameResult<usize> {
        let size = self
            .store
            .transact(|state| {
                ensure_waiting(state)?;
                if state.lobby.contains(participant) {
                    return Err(GameError::AlreadyJoined(participant.to_string()));
                }
                state.lobby.players.push(participant.to_string());
                state
                    .lobby
                    .names
                    .insert(participant.to_string(), name.to_string());
                Ok(state.lobby.players.len())
            })
            .await?;

        tracing::info!("{} joined game {} ({} in lobby)", name, self.id, size);
        Ok(size)
    }

    /// Remove a participant from the waiting lobby. Returns the new lobby size.
    pub async fn leave(&self, participant: &str) -> GameResult<usize> {
        let size = self
            .store
            .transact(|state| {
                ensure_waiting(state)?;
                if !state.lobby.contains(participant) {
                    return Err(GameError::NotInLobby(participant.to_string()));
                }
                state.lobby.players.retain(|p| p != participant);
                state.lobby.names.remove(participant);
                Ok(state.lobby.players.len())
            })
            .await?;

        tracing::info!("{} left game {} ({} in lobby)", participant, self.id, size);
        Ok(size)
    }

    /// Remove a lobby member by id or `@name`. Returns the removed id and name.
    pub async fn kick(&self, who: &str) -> GameResult<(ParticipantId, String)> {
        let (participant, name) = self
            .store
            .transact(|state| {
                ensure_waiting(state)?;
                let participant = resolve_member(&state.lobby, who)
                    .ok_or_else(|| GameError::NotFound(who.to_string()))?;
                let name = state.lobby.name_of(&participant);
                state.lobby.players.retain(|p| *p != participant);
                state.lobby.names.remove(&participant);
                Ok((participant, name))
            })
            .await?;

        tracing::info!("Kicked {} from game {}", name, self.id);
        Ok((participant, name))
    }

    /// Current lobby membership count
    pub async fn size(&self) -> usize {
        self.store.load().await.lobby.players.len()
    }

    /// Change the phrase pool for future draws. Allowed at any time.
    pub async fn set_difficulty(&self, level: &str) -> GameResult<Difficulty> {
        let difficulty: Difficulty = level.parse()?;
        self.store
            .transact(|state| {
                state.difficulty = difficulty;
                Ok(())
            })
            .await?;

        tracing::info!("Game {} difficulty set to {}", self.id, difficulty);
        Ok(difficulty)
    }

    pub async fn status(&self) -> StatusReport {
        StatusReport::from(&self.store.load().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::store::MemoryBackend;
    use std::sync::Arc;

    fn game() -> Game {
        Game::with_seed(
            "test",
            Box::new(MemoryBackend::new()),
            Arc::new(EngineConfig::in_memory()),
            1,
        )
    }

    #[tokio::test]
    async fn test_join_preserves_order() {
        let game = game();
        game.join("a", "alice").await.unwrap();
        game.join("b", "bob").await.unwrap();
        assert_eq!(game.join("c", "carol").await.unwrap(), 3);

        let state = game.snapshot().await;
        assert_eq!(state.lobby.players, vec!["a", "b", "c"]);
        assert_eq!(state.lobby.names["b"], "bob");
        assert_eq!(game.size().await, 3);
    }

    #[tokio::test]
    async fn test_duplicate_join_rejected() {
        let game = game();
        game.join("a", "alice").await.unwrap();
        let result = game.join("a", "alice").await;
        assert!(matches!(result, Err(GameError::AlreadyJoined(ref id)) if id == "a"));
        assert_eq!(game.size().await, 1);
    }

    #[tokio::test]
    async fn test_leave() {
        let game = game();
        game.join("a", "alice").await.unwrap();
        game.join("b", "bob").await.unwrap();

        assert_eq!(game.leave("a").await.unwrap(), 1);
        assert!(matches!(
            game.leave("a").await,
            Err(GameError::NotInLobby(_))
        ));
        assert_eq!(game.snapshot().await.lobby.players, vec!["b"]);
    }

    #[tokio::test]
    async fn test_lobby_closed_after_start() {
        let game = game();
        game.join("a", "alice").await.unwrap();
        game.join("b", "bob").await.unwrap();
        game.force_start().await.unwrap();

        assert!(matches!(
            game.join("c", "carol").await,
            Err(GameError::LobbyClosed)
        ));
        assert!(matches!(game.leave("a").await, Err(GameError::LobbyClosed)));
        assert!(matches!(game.kick("@bob").await, Err(GameError::LobbyClosed)));
        assert_eq!(game.snapshot().await.lobby.players.len(), 2);
    }

    #[tokio::test]
    async fn test_kick_by_name_or_id() {
        let game = game();
        game.join("1", "Alice").await.unwrap();
        game.join("2", "bob").await.unwrap();
        game.join("3", "carol").await.unwrap();

        assert_eq!(
            game.kick("@alice").await.unwrap(),
            ("1".to_string(), "Alice".to_string())
        );
        assert_eq!(game.kick("2").await.unwrap().0, "2");
        assert!(matches!(
            game.kick("@dave").await,
            Err(GameError::NotFound(ref who)) if who == "@dave"
        ));
        assert_eq!(game.snapshot().await.lobby.players, vec!["3"]);
    }

    #[tokio::test]
    async fn test_kick_by_non_ascii_name_ignores_case() {
        let game = game();
        game.join("1", "Ölaf").await.unwrap();
        game.join("2", "ИВАН").await.unwrap();

        assert_eq!(game.kick("@ölaf").await.unwrap().0, "1");
        assert_eq!(game.kick("@иван").await.unwrap().0, "2");
        assert_eq!(game.size().await, 0);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent_and_keeps_teams() {
        let game = game();
        game.set_team("a", "Red").await.unwrap();
        game.join("a", "alice").await.unwrap();
        game.join("b", "bob").await.unwrap();
        game.set_difficulty("hard").await.unwrap();
        game.force_start().await.unwrap();

        game.reset().await.unwrap();
        let mut once = game.snapshot().await;
        game.reset().await.unwrap();
        let mut twice = game.snapshot().await;

        once.updated_at = None;
        twice.updated_at = None;
        assert_eq!(once, twice);
        assert_eq!(once.lobby.status, LobbyStatus::Waiting);
        assert!(once.lobby.players.is_empty());
        assert!(once.players.is_empty());
        assert_eq!(once.difficulty, Difficulty::Medium);
        assert_eq!(once.teams["a"], "Red");
    }

    #[tokio::test]
    async fn test_invalid_difficulty_leaves_state() {
        let game = game();
        game.set_difficulty("Easy").await.unwrap();
        let result = game.set_difficulty("nightmare").await;
        assert!(matches!(result, Err(GameError::InvalidDifficulty(_))));
        assert_eq!(game.snapshot().await.difficulty, Difficulty::Easy);
    }

    #[tokio::test]
    async fn test_status_counts() {
        let game = game();
        let status = game.status().await;
        assert_eq!(status.phase, Phase::Waiting);
        assert_eq!(status.lobby_count, 0);

        game.join("a", "alice").await.unwrap();
        game.join("b", "bob").await.unwrap();
        game.join("c", "carol").await.unwrap();
        game.force_start().await.unwrap();

        let status = game.status().await;
        assert_eq!(status.phase, Phase::Running);
        assert_eq!(status.lobby_status, LobbyStatus::Locked);
        assert_eq!(status.players, 3);
        assert_eq!(status.alive, 3);
        assert!(status.winner.is_none());
    }
}
