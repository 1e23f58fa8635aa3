use super::{Game, GameError, GameResult, MIN_PLAYERS};
use crate::phrases;
use crate::protocol::{Announcement, Effect, Notice};
use crate::types::*;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// What one player is told at game start
#[derive(Debug, Clone, PartialEq)]
pub struct Briefing {
    pub player: ParticipantId,
    pub target: ParticipantId,
    pub target_name: String,
    pub phrase: String,
}

/// Result of a successful force-start
#[derive(Debug, Clone)]
pub struct Assignment {
    pub difficulty: Difficulty,
    /// In ring order
    pub briefings: Vec<Briefing>,
}

impl Assignment {
    /// One public start announcement, then one private briefing per player
    pub fn effects(&self, game_id: &str) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(self.briefings.len() + 1);
        effects.push(Effect::announce(
            game_id,
            Announcement::GameStarted {
                difficulty: self.difficulty,
                players: self.briefings.len(),
            },
        ));
        effects.extend(self.briefings.iter().map(|b| {
            Effect::notify(
                game_id,
                b.player.clone(),
                Notice::Briefing {
                    target: b.target.clone(),
                    target_name: b.target_name.clone(),
                    phrase: b.phrase.clone(),
                },
            )
        }));
        effects
    }
}

/// Link `order` into a ring: `order[i]` targets `order[(i + 1) % n]`.
/// Each player draws a phrase independently from the difficulty's pool.
pub fn build_ring<R: Rng + ?Sized>(
    order: &[ParticipantId],
    names: &HashMap<ParticipantId, String>,
    difficulty: Difficulty,
    rng: &mut R,
) -> HashMap<ParticipantId, Player> {
    let n = order.len();
    order
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let player = Player {
                username: names.get(id).cloned().unwrap_or_else(|| id.clone()),
                target: order[(i + 1) % n].clone(),
                kill_word: phrases::draw(difficulty, rng),
                alive: true,
                kills: 0,
                seat: i as u32,
            };
            (id.clone(), player)
        })
        .collect()
}

/// Shuffle `members` once, then link the shuffled order into a ring.
/// Returns the shuffled order alongside the players.
pub fn shuffled_ring<R: Rng + ?Sized>(
    members: &[ParticipantId],
    names: &HashMap<ParticipantId, String>,
    difficulty: Difficulty,
    rng: &mut R,
) -> (Vec<ParticipantId>, HashMap<ParticipantId, Player>) {
    let mut order = members.to_vec();
    order.shuffle(rng);
    let players = build_ring(&order, names, difficulty, rng);
    (order, players)
}

impl Game {
    /// Shuffle the lobby into a ring, hand out phrases and lock the lobby.
    ///
    /// The roster and the lock are committed in a single write; a concurrent
    /// second call sees the locked lobby and fails with `AlreadyLocked`.
    pub async fn force_start(&self) -> GameResult<Assignment> {
        let assignment = self
            .store
            .transact(|state| {
                if state.lobby.status == LobbyStatus::Locked {
                    return Err(GameError::AlreadyLocked);
                }
                let have = state.lobby.players.len();
                if have < MIN_PLAYERS {
                    return Err(GameError::InsufficientPlayers { have });
                }

                let difficulty = state.difficulty;
                let (order, players) = self.with_rng_mut(|rng| {
                    shuffled_ring(&state.lobby.players, &state.lobby.names, difficulty, rng)
                });

                let briefings = order
                    .iter()
                    .map(|id| {
                        let player = &players[id];
                        Briefing {
                            player: id.clone(),
                            target: player.target.clone(),
                            target_name: players[&player.target].username.clone(),
                            phrase: player.kill_word.clone(),
                        }
                    })
                    .collect();

                state.players = players;
                state.winner = None;
                state.lobby.status = LobbyStatus::Locked;

                Ok(Assignment {
                    difficulty,
                    briefings,
                })
            })
            .await?;

        tracing::info!(
            "Game {} started with {} players on {}",
            self.id,
            assignment.briefings.len(),
            assignment.difficulty
        );
        Ok(assignment)
    }
}
