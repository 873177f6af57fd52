//! Win evaluation.
//!
//! A game ends once both boards are completely built, when the player about
//! to move has no legal action, or when the turn limit is reached. The player
//! with more standing houses wins; equal counts draw. Bunkers defend but do
//! not score.
//!
//! Works from the encrypted per-player tallies kept in `GameRuntime`, never
//! from the cells. Disclosure: one bit for "both boards full", one bit for
//! "next player's board full", two bits for the house comparison. Counts are
//! never revealed.

use crate::fhe::Fhe;
use crate::{GameCore, GameRuntime, GameStatus, Player};

pub(crate) const TURN_LIMIT_PER_CELL: u32 = 4;

pub(crate) fn turn_limit(core: &GameCore) -> u32 {
    TURN_LIMIT_PER_CELL * 2 * core.width * core.height
}

/// Terminal status for the current state, if any. `next` is the player who
/// would move next. Reads only; the caller writes the status.
pub(crate) fn evaluate(
    fhe: &Fhe,
    core: &GameCore,
    runtime: &GameRuntime,
    next: Player,
) -> Option<GameStatus> {
    if runtime.turn >= turn_limit(core) {
        return Some(score(fhe, runtime));
    }

    let cells = core.width * core.height;
    // Build coordinates are public: a board cannot be full before its owner
    // has built at least once per cell.
    let may_be_full = |player: Player| runtime.builds(player) >= cells;
    if !may_be_full(Player::One) && !may_be_full(Player::Two) {
        return None;
    }
    let area = fhe.constant(cells);

    if may_be_full(Player::One) && may_be_full(Player::Two) {
        let full1 = fhe.equal(&runtime.tally(Player::One).standing, &area);
        let full2 = fhe.equal(&runtime.tally(Player::Two).standing, &area);
        if fhe.reveal(&fhe.and(&full1, &full2)) {
            return Some(score(fhe, runtime));
        }
    }

    // With no empty cell left and no missile armed, `next` cannot move.
    if !runtime.armed(next)
        && may_be_full(next)
        && fhe.reveal(&fhe.equal(&runtime.tally(next).standing, &area))
    {
        return Some(score(fhe, runtime));
    }

    None
}

fn score(fhe: &Fhe, runtime: &GameRuntime) -> GameStatus {
    let houses1 = &runtime.tally(Player::One).houses;
    let houses2 = &runtime.tally(Player::Two).houses;
    if fhe.reveal(&fhe.less_than(houses2, houses1)) {
        GameStatus::Player1Won
    } else if fhe.reveal(&fhe.less_than(houses1, houses2)) {
        GameStatus::Player2Won
    } else {
        GameStatus::Draw
    }
}
