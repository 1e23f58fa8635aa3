//! Player command handlers
//!
//! Lobby membership, read-only reports, team labels and chat messages.

use super::handlers::{emit, error_reply};
use crate::game::Game;
use crate::protocol::{Actor, Announcement, Effect, Reply};
use crate::state::AppState;
use std::sync::Arc;

pub async fn handle_open_lobby(state: &Arc<AppState>, game: &Game) -> Reply {
    match game.open_lobby().await {
        Ok(()) => {
            emit(state, vec![Effect::announce(game.id(), Announcement::LobbyOpened)]).await;
            Reply::LobbyOpened
        }
        Err(e) => error_reply(e),
    }
}

pub async fn handle_join(state: &Arc<AppState>, game: &Game, actor: &Actor) -> Reply {
    let name = actor.display_name();
    match game.join(&actor.id, &name).await {
        Ok(lobby_size) => {
            let joined = Announcement::PlayerJoined {
                participant: actor.id.clone(),
                name,
            };
            emit(state, vec![Effect::announce(game.id(), joined)]).await;
            Reply::Joined {
                participant: actor.id.clone(),
                lobby_size,
            }
        }
        Err(e) => error_reply(e),
    }
}

pub async fn handle_leave(game: &Game, actor: &Actor) -> Reply {
    match game.leave(&actor.id).await {
        Ok(lobby_size) => Reply::Left {
            participant: actor.id.clone(),
            lobby_size,
        },
        Err(e) => error_reply(e),
    }
}

pub async fn handle_status(game: &Game) -> Reply {
    Reply::Status {
        status: game.status().await,
    }
}

pub async fn handle_leaderboard(game: &Game) -> Reply {
    Reply::Leaderboard {
        entries: game.leaderboard().await,
    }
}

pub async fn handle_set_team(game: &Game, actor: &Actor, label: String) -> Reply {
    match game.set_team(&actor.id, &label).await {
        Ok(label) => Reply::TeamSet { label },
        Err(e) => error_reply(e),
    }
}

pub async fn handle_clear_team(game: &Game, actor: &Actor) -> Reply {
    match game.clear_team(&actor.id).await {
        Ok(()) => Reply::TeamCleared,
        Err(e) => error_reply(e),
    }
}

/// Every chat line in the game channel goes through kill detection
pub async fn handle_chat_message(
    state: &Arc<AppState>,
    game: &Game,
    actor: &Actor,
    text: String,
) -> Reply {
    match game.handle_message(&actor.id, &text).await {
        Ok(Some(elimination)) => {
            emit(state, elimination.effects(game.id())).await;
            Reply::Ack
        }
        Ok(None) => Reply::Ack,
        Err(e) => error_reply(e),
    }
}
