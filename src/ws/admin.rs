//! Admin command handlers
//!
//! The dispatcher has already checked the actor's admin flag.

use super::handlers::{emit, error_reply};
use crate::game::Game;
use crate::protocol::Reply;
use crate::state::AppState;
use std::sync::Arc;

pub async fn handle_reset_game(game: &Game) -> Reply {
    tracing::info!("Admin resetting game {}", game.id());
    match game.reset().await {
        Ok(()) => Reply::GameReset,
        Err(e) => error_reply(e),
    }
}

pub async fn handle_kick(game: &Game, who: String) -> Reply {
    tracing::info!("Admin kicking {} from game {}", who, game.id());
    match game.kick(&who).await {
        Ok((participant, name)) => Reply::Kicked { participant, name },
        Err(e) => error_reply(e),
    }
}

pub async fn handle_set_difficulty(game: &Game, level: String) -> Reply {
    match game.set_difficulty(&level).await {
        Ok(difficulty) => Reply::DifficultySet { difficulty },
        Err(e) => error_reply(e),
    }
}

pub async fn handle_force_start(state: &Arc<AppState>, game: &Game) -> Reply {
    tracing::info!("Admin force-starting game {}", game.id());
    match game.force_start().await {
        Ok(assignment) => {
            emit(state, assignment.effects(game.id())).await;
            Reply::Started {
                difficulty: assignment.difficulty,
                players: assignment.briefings.len(),
            }
        }
        Err(e) => error_reply(e),
    }
}

pub async fn handle_clear_leaderboard(game: &Game) -> Reply {
    match game.clear_leaderboard().await {
        Ok(()) => Reply::LeaderboardCleared,
        Err(e) => error_reply(e),
    }
}
