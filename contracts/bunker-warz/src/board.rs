//! Board store: one W×H grid of encrypted cells per player.
//!
//! Cells that were never written read as the game's encrypted defaults
//! (content EMPTY, alive), so creating a game costs no per-cell storage.

use soroban_sdk::{contracttype, BytesN, Env};

use crate::fhe::Fhe;
use crate::registry;
use crate::{DataKey, GameCore, Player};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Cell {
    /// Encrypted EMPTY / HOUSE / BUNKER tag.
    pub content: BytesN<32>,
    /// Encrypted boolean, false once a house on this cell was destroyed.
    pub alive: BytesN<32>,
}

pub(crate) struct Board<'a> {
    env: &'a Env,
    core: &'a GameCore,
    owner: Player,
}

impl<'a> Board<'a> {
    pub(crate) fn new(env: &'a Env, core: &'a GameCore, owner: Player) -> Self {
        Self { env, core, owner }
    }

    pub(crate) fn cell(&self, row: u32, column: u32) -> Cell {
        self.env
            .storage()
            .persistent()
            .get(&self.key(row, column))
            .unwrap_or_else(|| Cell {
                content: self.core.zero.clone(),
                alive: self.core.one.clone(),
            })
    }

    pub(crate) fn set(&self, row: u32, column: u32, cell: &Cell) {
        registry::persist(self.env, &self.key(row, column), cell);
    }

    fn key(&self, row: u32, column: u32) -> DataKey {
        DataKey::Cell(self.core.game_id, self.owner, row, column)
    }
}

/// Encrypted `content != EMPTY AND alive`: the cell holds a structure that can
/// support another one and that a missile can strike.
pub(crate) fn standing(fhe: &Fhe, core: &GameCore, cell: &Cell) -> BytesN<32> {
    let built = fhe.not_equal(&cell.content, &core.zero);
    fhe.and(&built, &cell.alive)
}
