use crate::game::{LeaderboardEntry, StatusReport};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Who issued a command, as resolved by the chat transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: ParticipantId,
    #[serde(default)]
    pub name: Option<String>,
    /// Whether the transport considers this actor a chat administrator
    #[serde(default)]
    pub is_admin: bool,
}

impl Actor {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// A command addressed to one game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub game_id: GameId,
    pub actor: Actor,
    pub command: Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Command {
    // Admin-only
    ResetGame,
    Kick { who: String },
    SetDifficulty { level: String },
    ForceStart,
    ClearLeaderboard,

    OpenLobby,
    Join,
    Leave,
    Status,
    Leaderboard,
    SetTeam { label: String },
    ClearTeam,
    /// Plain chat text seen in the game channel
    Message { text: String },
}

impl Command {
    /// Wire name, as in the `t` tag
    pub fn name(&self) -> &'static str {
        match self {
            Command::ResetGame => "reset_game",
            Command::Kick { .. } => "kick",
            Command::SetDifficulty { .. } => "set_difficulty",
            Command::ForceStart => "force_start",
            Command::ClearLeaderboard => "clear_leaderboard",
            Command::OpenLobby => "open_lobby",
            Command::Join => "join",
            Command::Leave => "leave",
            Command::Status => "status",
            Command::Leaderboard => "leaderboard",
            Command::SetTeam { .. } => "set_team",
            Command::ClearTeam => "clear_team",
            Command::Message { .. } => "message",
        }
    }

    /// Commands only chat admins may issue
    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Command::ResetGame
                | Command::Kick { .. }
                | Command::SetDifficulty { .. }
                | Command::ForceStart
                | Command::ClearLeaderboard
        )
    }
}

/// Direct answer to the actor that issued a command
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Reply {
    LobbyOpened,
    GameReset,
    Joined {
        participant: ParticipantId,
        lobby_size: usize,
    },
    Left {
        participant: ParticipantId,
        lobby_size: usize,
    },
    Kicked {
        participant: ParticipantId,
        name: String,
    },
    DifficultySet {
        difficulty: Difficulty,
    },
    Started {
        difficulty: Difficulty,
        players: usize,
    },
    Status {
        status: StatusReport,
    },
    Leaderboard {
        entries: Vec<LeaderboardEntry>,
    },
    LeaderboardCleared,
    TeamSet {
        label: String,
    },
    TeamCleared,
    Ack,
    Error {
        code: String,
        msg: String,
    },
}

/// Public message for the whole game channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Announcement {
    LobbyOpened,
    PlayerJoined {
        participant: ParticipantId,
        name: String,
    },
    GameStarted {
        difficulty: Difficulty,
        players: usize,
    },
    Eliminated {
        killer: ParticipantId,
        killer_name: String,
        victim: ParticipantId,
        victim_name: String,
        phrase: String,
        /// Set when this elimination ended the game
        #[serde(skip_serializing_if = "Option::is_none")]
        winner: Option<ParticipantId>,
    },
}

/// Private message for a single player
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Notice {
    /// Initial assignment at game start
    Briefing {
        target: ParticipantId,
        target_name: String,
        phrase: String,
    },
    /// Chain reassignment after a kill
    NewMission {
        target: ParticipantId,
        target_name: String,
        phrase: String,
    },
    /// The ring collapsed onto this player
    Victory { kills: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum EffectKind {
    Announce {
        announcement: Announcement,
    },
    Notify {
        to: ParticipantId,
        notice: Notice,
    },
}

/// Transport-agnostic output of the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Effect {
    pub id: String,
    pub game_id: GameId,
    #[serde(flatten)]
    pub kind: EffectKind,
}

impl Effect {
    fn new(game_id: &str, kind: EffectKind) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            game_id: game_id.to_string(),
            kind,
        }
    }

    pub fn announce(game_id: &str, announcement: Announcement) -> Self {
        Self::new(game_id, EffectKind::Announce { announcement })
    }

    pub fn notify(game_id: &str, to: impl Into<ParticipantId>, notice: Notice) -> Self {
        Self::new(
            game_id,
            EffectKind::Notify {
                to: to.into(),
                notice,
            },
        )
    }
}

/// Frames sent to a connected chat bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum Outbound {
    Welcome { protocol: String, server_now: String },
    Reply { reply: Reply },
    Effect { effect: Effect },
}
