use super::{Game, GameResult};
use crate::phrases;
use crate::protocol::{Announcement, Effect, Notice};
use crate::types::*;

/// A committed kill and the chain reassignment that followed it
#[derive(Debug, Clone, PartialEq)]
pub struct Elimination {
    pub killer: ParticipantId,
    pub killer_name: String,
    pub victim: ParticipantId,
    pub victim_name: String,
    /// The phrase the victim said
    pub phrase: String,
    pub new_target: ParticipantId,
    pub new_target_name: String,
    pub new_phrase: String,
    pub kills: u32,
    /// Set when the killer is the last one standing
    pub winner: Option<ParticipantId>,
}

impl Elimination {
    /// Exactly two effects: the public announcement, then the killer's private notice
    pub fn effects(&self, game_id: &str) -> Vec<Effect> {
        let announcement = Announcement::Eliminated {
            killer: self.killer.clone(),
            killer_name: self.killer_name.clone(),
            victim: self.victim.clone(),
            victim_name: self.victim_name.clone(),
            phrase: self.phrase.clone(),
            winner: self.winner.clone(),
        };

        let notice = match self.winner {
            Some(_) => Notice::Victory { kills: self.kills },
            None => Notice::NewMission {
                target: self.new_target.clone(),
                target_name: self.new_target_name.clone(),
                phrase: self.new_phrase.clone(),
            },
        };

        vec![
            Effect::announce(game_id, announcement),
            Effect::notify(game_id, self.killer.clone(), notice),
        ]
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whole-word, case-insensitive phrase search.
///
/// The phrase must be bounded on both sides by a non-word character or the
/// edge of the text, so `"hi"` matches `"oh hi!"` but not `"this"`.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    let phrase = phrase.trim().to_lowercase();
    if phrase.is_empty() {
        return false;
    }
    let text = text.to_lowercase();

    text.match_indices(&phrase).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        let after_ok = text[end..].chars().next().map_or(true, |c| !is_word_char(c));
        before_ok && after_ok
    })
}

/// Find the player who kills `sender` by this message, if any.
///
/// Only alive players other than the sender whose target is the sender are
/// candidates, tried in ascending id order; the first phrase match wins.
/// Messages longer than `max_chars` are never scanned.
pub fn find_killer(
    state: &GameState,
    sender: &str,
    text: &str,
    max_chars: usize,
) -> Option<ParticipantId> {
    if !state.players.get(sender).is_some_and(|p| p.alive) {
        return None;
    }
    if text.chars().count() > max_chars {
        return None;
    }

    let mut candidates: Vec<(&ParticipantId, &Player)> = state
        .players
        .iter()
        .filter(|(id, p)| p.alive && p.target == sender && id.as_str() != sender)
        .collect();
    candidates.sort_by(|a, b| a.0.cmp(b.0));

    candidates
        .into_iter()
        .find(|(_, p)| contains_phrase(text, &p.kill_word))
        .map(|(id, _)| id.clone())
}

impl Game {
    /// Feed one chat message from `sender` through kill detection.
    ///
    /// On a hit the victim is eliminated, the killer inherits the victim's
    /// target and a fresh phrase, and the new state is committed before this
    /// returns. At most one elimination happens per message.
    pub async fn handle_message(
        &self,
        sender: &str,
        text: &str,
    ) -> GameResult<Option<Elimination>> {
        let max_chars = self.config.max_message_chars;
        let elimination = self
            .store
            .transact_if(|state| {
                let Some(killer_id) = find_killer(state, sender, text, max_chars) else {
                    return Ok(None);
                };

                let difficulty = state.difficulty;
                let new_phrase = self.with_rng_mut(|rng| phrases::draw(difficulty, rng));

                let Some(victim) = state.players.get_mut(sender) else {
                    return Ok(None);
                };
                victim.alive = false;
                let victim_name = victim.username.clone();
                let new_target = victim.target.clone();

                let Some(killer) = state.players.get_mut(&killer_id) else {
                    return Ok(None);
                };
                let phrase = std::mem::replace(&mut killer.kill_word, new_phrase.clone());
                killer.kills += 1;
                killer.target = new_target.clone();
                let kills = killer.kills;
                let killer_name = killer.username.clone();

                let winner = (new_target == killer_id).then(|| killer_id.clone());
                state.winner = winner.clone();
                if !state.is_single_ring() {
                    tracing::warn!("Game {}: target ring is broken after elimination", self.id);
                }

                Ok(Some(Elimination {
                    new_target_name: state.username(&new_target),
                    killer: killer_id,
                    killer_name,
                    victim: sender.to_string(),
                    victim_name,
                    phrase,
                    new_target,
                    new_phrase,
                    kills,
                    winner,
                }))
            })
            .await?;

        match &elimination {
            Some(e) => {
                tracing::info!(
                    "Game {}: {} eliminated {} with '{}'",
                    self.id,
                    e.killer_name,
                    e.victim_name,
                    e.phrase
                );
                if let Some(winner) = &e.winner {
                    tracing::info!("Game {} won by {}", self.id, winner);
                }
            }
            None => tracing::debug!("Game {}: no kill in message from {}", self.id, sender),
        }
        Ok(elimination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::game::build_ring;
    use crate::protocol::EffectKind;
    use crate::store::MemoryBackend;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Locked state whose ring follows `order`, with explicit phrases
    fn ring(order: &[&str], phrases: &[&str]) -> GameState {
        let order: Vec<ParticipantId> = order.iter().map(|s| s.to_string()).collect();
        let mut rng = StdRng::seed_from_u64(0);
        let mut players = build_ring(&order, &HashMap::new(), Difficulty::Easy, &mut rng);
        for (id, phrase) in order.iter().zip(phrases) {
            if let Some(p) = players.get_mut(id) {
                p.kill_word = phrase.to_string();
            }
        }
        let mut state = GameState {
            players,
            ..GameState::fresh()
        };
        state.lobby.players = order;
        state.lobby.status = LobbyStatus::Locked;
        state
    }

    async fn game_with(state: &GameState) -> Game {
        let doc = serde_json::to_string(state).unwrap();
        Game::with_seed(
            "test",
            Box::new(MemoryBackend::with_document(doc)),
            Arc::new(EngineConfig::in_memory()),
            3,
        )
    }

    #[test]
    fn test_whole_word_matching() {
        assert!(contains_phrase("hi", "hi"));
        assert!(contains_phrase("Oh HI there", "hi"));
        assert!(contains_phrase("well... hi!", "hi"));
        assert!(contains_phrase("see you tomorrow", "tomorrow"));
        assert!(!contains_phrase("this is great", "hi"));
        assert!(!contains_phrase("hint", "hi"));
        assert!(!contains_phrase("hi_there", "hi"));
        assert!(!contains_phrase("anything", ""));
    }

    #[test]
    fn test_multi_word_phrase() {
        assert!(contains_phrase("I'll be there, see you later.", "see you later"));
        assert!(!contains_phrase("see you laterz", "see you later"));
    }

    #[test]
    fn test_match_after_failed_occurrence() {
        // First occurrence is inside a word, second is standalone
        assert!(contains_phrase("this hi", "hi"));
        assert!(contains_phrase("okok ok", "ok"));
    }

    #[test]
    fn test_non_ascii_boundaries() {
        assert!(contains_phrase("¿hola? yes!", "yes"));
        assert!(!contains_phrase("yesño", "yes"));
    }

    #[test]
    fn test_find_killer_direction() {
        // B→C, C→A, A→B
        let state = ring(&["B", "C", "A"], &["pb", "pc", "pa"]);

        // C says B's phrase: B targets C, so this is B's kill
        assert_eq!(find_killer(&state, "C", "pb", 300), Some("B".to_string()));
        // C says A's phrase: A targets B, not C
        assert_eq!(find_killer(&state, "C", "pa", 300), None);
        // Unknown sender
        assert_eq!(find_killer(&state, "Z", "pb", 300), None);
    }

    #[test]
    fn test_long_messages_are_ignored() {
        let state = ring(&["A", "B"], &["yes", "no"]);
        let long = format!("yes {}", "x".repeat(300));
        assert_eq!(find_killer(&state, "B", &long, 300), None);
        assert_eq!(find_killer(&state, "B", "yes", 300), Some("A".to_string()));
    }

    #[tokio::test]
    async fn test_wrong_direction_then_kill() {
        let state = ring(&["B", "C", "A"], &["phrase-b", "phrase-c", "phrase-a"]);
        let game = game_with(&state).await;

        // The killer saying their own phrase is the wrong direction
        assert!(game.handle_message("B", "phrase-b").await.unwrap().is_none());
        // So is C saying the phrase of A, who hunts B
        assert!(game.handle_message("C", "phrase-a").await.unwrap().is_none());

        // C, B's target, says B's phrase
        let kill = game
            .handle_message("C", "oh, phrase-b indeed")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kill.killer, "B");
        assert_eq!(kill.victim, "C");
        assert_eq!(kill.phrase, "phrase-b");
        assert_eq!(kill.new_target, "A");
        assert_eq!(kill.kills, 1);
        assert!(kill.winner.is_none());

        let after = game.snapshot().await;
        assert!(!after.players["C"].alive);
        assert_eq!(after.players["B"].target, "A");
        assert_eq!(after.players["B"].kills, 1);
        assert_eq!(after.players["B"].kill_word, kill.new_phrase);
        assert!(phrases::pool(Difficulty::Medium).contains(&kill.new_phrase.as_str()));
        assert!(after.is_single_ring());
        assert_eq!(after.alive_count(), 2);
    }

    #[tokio::test]
    async fn test_substring_never_kills() {
        let state = ring(&["A", "B"], &["hi", "yes"]);
        let game = game_with(&state).await;

        assert!(game
            .handle_message("B", "this is great")
            .await
            .unwrap()
            .is_none());
        let after = game.snapshot().await;
        assert!(after.players["B"].alive);
        assert_eq!(after.players["A"].kills, 0);
    }

    #[tokio::test]
    async fn test_two_player_endgame() {
        let state = ring(&["A", "B"], &["hi", "yes"]);
        let game = game_with(&state).await;

        let kill = game.handle_message("B", "hi").await.unwrap().unwrap();
        assert_eq!(kill.killer, "A");
        assert_eq!(kill.new_target, "A");
        assert_eq!(kill.winner.as_deref(), Some("A"));

        let after = game.snapshot().await;
        assert_eq!(after.players["A"].target, "A");
        assert_eq!(after.winner.as_deref(), Some("A"));
        assert_eq!(after.phase(), Phase::Won);

        // The survivor cannot kill themselves, and the dead stay dead
        let phrase = after.players["A"].kill_word.clone();
        assert!(game.handle_message("A", &phrase).await.unwrap().is_none());
        assert!(game.handle_message("B", "yes hi").await.unwrap().is_none());
        assert_eq!(game.snapshot().await.players["A"].kills, 1);

        let effects = kill.effects("test");
        assert_eq!(effects.len(), 2);
        assert!(matches!(
            &effects[1].kind,
            EffectKind::Notify { to, notice: Notice::Victory { kills: 1 } } if to == "A"
        ));
    }

    #[tokio::test]
    async fn test_repeated_message_kills_once() {
        let state = ring(&["A", "B", "C"], &["hi", "yes", "ok"]);
        let game = game_with(&state).await;

        assert!(game.handle_message("B", "hi").await.unwrap().is_some());
        // B is dead now; the same message again changes nothing
        assert!(game.handle_message("B", "hi").await.unwrap().is_none());

        let after = game.snapshot().await;
        assert_eq!(after.players["A"].kills, 1);
        assert_eq!(after.players["A"].target, "C");
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_messages_kill_once() {
        let state = ring(&["A", "B", "C"], &["hi", "yes", "ok"]);
        let game = Arc::new(game_with(&state).await);

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let game = game.clone();
                tokio::spawn(async move { game.handle_message("B", "hi hi").await })
            })
            .collect();

        let mut kills = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().is_some() {
                kills += 1;
            }
        }
        assert_eq!(kills, 1);
        assert_eq!(game.snapshot().await.players["A"].kills, 1);
    }

    #[tokio::test]
    async fn test_messages_before_start_are_ignored() {
        let game = Game::with_seed(
            "test",
            Box::new(MemoryBackend::new()),
            Arc::new(EngineConfig::in_memory()),
            0,
        );
        game.join("a", "alice").await.unwrap();
        assert!(game.handle_message("a", "hello").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chain_until_winner() {
        let state = ring(&["A", "B", "C", "D"], &["w1", "w2", "w3", "w4"]);
        let game = game_with(&state).await;

        // A kills B, then must get C to say A's new phrase
        let first = game.handle_message("B", "w1").await.unwrap().unwrap();
        assert_eq!(first.new_target, "C");

        let phrase = game.snapshot().await.players["A"].kill_word.clone();
        let second = game.handle_message("C", &phrase).await.unwrap().unwrap();
        assert_eq!(second.killer, "A");
        assert_eq!(second.new_target, "D");

        let phrase = game.snapshot().await.players["A"].kill_word.clone();
        let third = game.handle_message("D", &phrase).await.unwrap().unwrap();
        assert_eq!(third.winner.as_deref(), Some("A"));

        let after = game.snapshot().await;
        assert_eq!(after.players["A"].kills, 3);
        assert_eq!(after.alive_count(), 1);
        assert!(after.is_single_ring());
    }
}
