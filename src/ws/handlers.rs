//! Command dispatch
//!
//! Entry point for commands arriving from the chat bridge. Admin checks happen
//! here, then the command is routed to the admin or player handler module.

use crate::broadcast;
use crate::game::GameError;
use crate::protocol::{Command, Effect, Envelope, Reply};
use crate::state::AppState;
use std::sync::Arc;

use super::{admin, player};

/// Handle one command and return the reply for the issuing actor.
/// Effects produced along the way are delivered before this returns.
pub async fn handle_command(envelope: Envelope, state: &Arc<AppState>) -> Reply {
    let Envelope {
        game_id,
        actor,
        command,
    } = envelope;

    // The transport flags chat admins; everything admin-only is gated here
    if command.requires_admin() && !actor.is_admin {
        tracing::debug!("Rejected {} from non-admin {}", command.name(), actor.id);
        return Reply::Error {
            code: "ADMIN_ONLY".to_string(),
            msg: format!("Only admins can use {}", command.name()),
        };
    }

    let game = state.games.game(&game_id).await;

    match command {
        Command::ResetGame => admin::handle_reset_game(&game).await,
        Command::Kick { who } => admin::handle_kick(&game, who).await,
        Command::SetDifficulty { level } => admin::handle_set_difficulty(&game, level).await,
        Command::ForceStart => admin::handle_force_start(state, &game).await,
        Command::ClearLeaderboard => admin::handle_clear_leaderboard(&game).await,

        Command::OpenLobby => player::handle_open_lobby(state, &game).await,
        Command::Join => player::handle_join(state, &game, &actor).await,
        Command::Leave => player::handle_leave(&game, &actor).await,
        Command::Status => player::handle_status(&game).await,
        Command::Leaderboard => player::handle_leaderboard(&game).await,
        Command::SetTeam { label } => player::handle_set_team(&game, &actor, label).await,
        Command::ClearTeam => player::handle_clear_team(&game, &actor).await,
        Command::Message { text } => {
            player::handle_chat_message(state, &game, &actor, text).await
        }
    }
}

/// Error reply for a failed game operation
pub(super) fn error_reply(e: GameError) -> Reply {
    match &e {
        GameError::Store(_) => tracing::error!("Game operation failed: {}", e),
        _ => tracing::debug!("Game operation rejected: {}", e),
    }
    Reply::Error {
        code: e.code().to_string(),
        msg: e.to_string(),
    }
}

/// Best-effort delivery of committed effects
pub(super) async fn emit(state: &Arc<AppState>, effects: Vec<Effect>) {
    broadcast::deliver(
        state.notifier.as_ref(),
        &effects,
        state.config().notify_timeout,
    )
    .await;
}
