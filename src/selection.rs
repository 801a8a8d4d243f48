use crate::games::GameId;
use rand::seq::SliceRandom;
use rand::Rng;

/// Picks the next game uniformly, avoiding an immediate repeat of `last`.
///
/// Falls back to the full set when `last` is the only registered game.
/// Returns `None` only for an empty slice.
pub fn next<R: Rng + ?Sized>(ids: &[GameId], last: Option<GameId>, rng: &mut R) -> Option<GameId> {
    let candidates: Vec<GameId> = ids.iter().copied().filter(|id| Some(*id) != last).collect();
    if candidates.is_empty() {
        ids.choose(rng).copied()
    } else {
        candidates.choose(rng).copied()
    }
}
