//! Missile resolution against one column of the defender's board.
//!
//! The missile climbs from row 0 and stops at the lowest standing structure:
//! - BUNKER: intercepts; its charge is spent and it becomes a SPENT_BUNKER,
//!   which still stands and supports but never scores. No hit.
//! - HOUSE or SPENT_BUNKER: destroyed; the cell becomes EMPTY and not alive. Hit.
//! - nothing standing: no hit, row+1 stays 0.
//!
//! Every row is rewritten with the same sequence of encrypted operations, so
//! neither control flow nor the set of written keys depends on the board.

use soroban_sdk::BytesN;

use crate::board::{self, Board, Cell};
use crate::fhe::Fhe;
use crate::{GameCore, SPENT_BUNKER};

/// Encrypted outcome of one missile.
pub(crate) struct Strike {
    pub(crate) hit: BytesN<32>,
    /// Row of the struck structure plus one, 0 when nothing was struck.
    pub(crate) row_plus_one: BytesN<32>,
    /// 1 when the destroyed structure was a scoring house.
    pub(crate) house_lost: BytesN<32>,
}

pub(crate) fn resolve(fhe: &Fhe, core: &GameCore, defender: &Board, column: u32) -> Strike {
    let spent = fhe.constant(SPENT_BUNKER);
    let mut resolved = core.zero.clone();
    let mut hit = core.zero.clone();
    let mut house_lost = core.zero.clone();
    let mut row_plus_one = core.zero.clone();

    for row in 0..core.height {
        let cell = defender.cell(row, column);
        let standing = board::standing(fhe, core, &cell);
        let target = fhe.and(&standing, &fhe.not(&resolved));

        let bunker = fhe.equal(&cell.content, &core.two);
        let intercept = fhe.and(&target, &bunker);
        let destroy = fhe.and(&target, &fhe.not(&bunker));

        let kept_or_cleared = fhe.select(&destroy, &core.zero, &cell.content);
        let content = fhe.select(&intercept, &spent, &kept_or_cleared);
        let alive = fhe.and(&cell.alive, &fhe.not(&destroy));
        let house = fhe.equal(&cell.content, &core.one);
        defender.set(row, column, &Cell { content, alive });

        hit = fhe.or(&hit, &destroy);
        house_lost = fhe.or(&house_lost, &fhe.and(&destroy, &house));
        row_plus_one = fhe.select(&target, &fhe.constant(row + 1), &row_plus_one);
        resolved = fhe.or(&resolved, &standing);
    }

    Strike {
        hit,
        row_plus_one,
        house_lost,
    }
}
