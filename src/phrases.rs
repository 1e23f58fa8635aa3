//! Static kill-phrase pools, keyed by difficulty.

use crate::types::Difficulty;
use rand::Rng;

const EASY: &[&str] = &["hello", "yes", "bro", "ok", "sorry", "good", "thanks", "hi"];
const MEDIUM: &[&str] = &["tomorrow", "night", "wait", "where", "come", "why", "later"];
const HARD: &[&str] = &["probably", "actually", "honestly", "between", "seriously"];

/// The phrase pool for a difficulty level. Never empty.
pub fn pool(difficulty: Difficulty) -> &'static [&'static str] {
    match difficulty {
        Difficulty::Easy => EASY,
        Difficulty::Medium => MEDIUM,
        Difficulty::Hard => HARD,
    }
}

/// Draw one phrase uniformly at random from the difficulty's pool
pub fn draw<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> String {
    let pool = pool(difficulty);
    pool[rng.random_range(0..pool.len())].to_string()
}
