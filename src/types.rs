use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Opaque ID types for type safety
pub type GameId = String;
pub type ParticipantId = String;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = crate::game::GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(crate::game::GameError::InvalidDifficulty(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LobbyStatus {
    #[default]
    Waiting,
    Locked,
}

/// Pre-game roster. `players` keeps join order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Lobby {
    #[serde(default)]
    pub players: Vec<ParticipantId>,
    #[serde(default)]
    pub status: LobbyStatus,
    /// Display names supplied at join time
    #[serde(default)]
    pub names: HashMap<ParticipantId, String>,
}

impl Lobby {
    pub fn contains(&self, participant: &str) -> bool {
        self.players.iter().any(|p| p == participant)
    }

    /// Display name for a member, falling back to the raw identifier
    pub fn name_of(&self, participant: &str) -> String {
        self.names
            .get(participant)
            .cloned()
            .unwrap_or_else(|| participant.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub username: String,
    pub target: ParticipantId,
    pub kill_word: String,
    pub alive: bool,
    pub kills: u32,
    /// Position in the shuffled ring, i.e. creation order
    #[serde(default)]
    pub seat: u32,
}

/// Coarse lifecycle of a game, derived from the persisted state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Waiting,
    Running,
    Won,
}

/// The whole persisted document for one game
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    #[serde(default)]
    pub lobby: Lobby,
    #[serde(default)]
    pub players: HashMap<ParticipantId, Player>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub teams: HashMap<ParticipantId, String>,
    /// Sole survivor once the ring has collapsed onto a single player
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<ParticipantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl GameState {
    pub fn fresh() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        match (self.lobby.status, &self.winner) {
            (LobbyStatus::Waiting, _) => Phase::Waiting,
            (LobbyStatus::Locked, Some(_)) => Phase::Won,
            (LobbyStatus::Locked, None) => Phase::Running,
        }
    }

    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.alive).count()
    }

    pub fn username(&self, participant: &str) -> String {
        match self.players.get(participant) {
            Some(player) => player.username.clone(),
            None => self.lobby.name_of(participant),
        }
    }

    /// Walk the target relation from `start`, returning the visited ids in ring order.
    /// Stops when the walk returns to `start`, revisits a node or hits a dangling target.
    pub fn ring_from(&self, start: &str) -> Vec<ParticipantId> {
        let mut ring = Vec::new();
        let mut seen = HashSet::new();
        let mut current = start.to_string();

        while let Some(player) = self.players.get(&current) {
            if !seen.insert(current.clone()) {
                break;
            }
            ring.push(current.clone());
            if player.target == start {
                break;
            }
            current = player.target.clone();
        }
        ring
    }

    /// True when the alive players form exactly one directed cycle under `target`
    pub fn is_single_ring(&self) -> bool {
        let alive: Vec<&ParticipantId> = self
            .players
            .iter()
            .filter(|(_, p)| p.alive)
            .map(|(id, _)| id)
            .collect();

        let Some(start) = alive.first() else {
            return true;
        };

        let ring = self.ring_from(start);
        let closes = self
            .players
            .get(ring.last().map(String::as_str).unwrap_or(start.as_str()))
            .is_some_and(|last| last.target == **start);

        closes
            && ring.len() == alive.len()
            && ring
                .iter()
                .all(|id| self.players.get(id).is_some_and(|p| p.alive))
    }
}
