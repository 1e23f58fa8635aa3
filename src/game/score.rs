use super::{Game, GameError, GameResult};
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub rank: usize,
    pub id: ParticipantId,
    pub username: String,
    pub kills: u32,
    pub alive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

/// Rank all known players by kills, highest first.
/// Ties keep creation order (seat), then id as a last resort.
pub fn rank(state: &GameState) -> Vec<LeaderboardEntry> {
    let mut players: Vec<(&ParticipantId, &Player)> = state.players.iter().collect();
    players.sort_by(|(a_id, a), (b_id, b)| {
        b.kills
            .cmp(&a.kills)
            .then(a.seat.cmp(&b.seat))
            .then(a_id.cmp(b_id))
    });

    players
        .into_iter()
        .enumerate()
        .map(|(i, (id, player))| LeaderboardEntry {
            rank: i + 1,
            id: id.clone(),
            username: player.username.clone(),
            kills: player.kills,
            alive: player.alive,
            team: state.teams.get(id).cloned(),
        })
        .collect()
}

impl Game {
    pub async fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        rank(&self.store.load().await)
    }

    /// Forget all player records. Lobby and teams are untouched.
    pub async fn clear_leaderboard(&self) -> GameResult<()> {
        self.store
            .transact(|state| {
                state.players.clear();
                state.winner = None;
                Ok(())
            })
            .await?;
        tracing::info!("Game {} leaderboard cleared", self.id);
        Ok(())
    }

    /// Tag a participant with a team label shown on the leaderboard
    pub async fn set_team(&self, participant: &str, label: &str) -> GameResult<String> {
        let label = label.trim();
        if label.is_empty() {
            return Err(GameError::InvalidTeam);
        }
        self.store
            .transact(|state| {
                state
                    .teams
                    .insert(participant.to_string(), label.to_string());
                Ok(())
            })
            .await?;
        Ok(label.to_string())
    }

    pub async fn clear_team(&self, participant: &str) -> GameResult<()> {
        self.store
            .transact(|state| {
                state.teams.remove(participant);
                Ok(())
            })
            .await
    }
}
