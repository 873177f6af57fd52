#![no_std]

//! BunkerWarZ: a confidential two-player building game.
//!
//! Each player owns a W×H board. On their turn a player either builds a HOUSE
//! or a BUNKER on their own board, or fires a missile at a column of the
//! opponent's board. What stands where is encrypted: the contract only holds
//! ciphertext handles and evaluates the rules through an FHE coprocessor,
//! revealing single rule bits ("this placement is unsupported") and sealing
//! everything else for the player entitled to see it.
//!
//! Turn order, bounds and missile arming are public and checked in cleartext
//! before any encrypted work happens.

use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, Address, BytesN, Env,
};

mod attack;
mod board;
mod fhe;
mod outcome;
mod registry;

#[cfg(test)]
mod test;


pub use board::Cell;
pub use fhe::{Coprocessor, FheClient};

use board::Board;
use fhe::Fhe;

// ============================================================================
// Errors
// ============================================================================

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    InvalidDimensions = 1,
    UnknownGame = 2,
    NotYourTurn = 3,
    GameOver = 4,
    OutOfBounds = 5,
    CellOccupied = 6,
    UnsupportedPlacement = 7,
    MissileAlreadyPending = 8,
    Unauthorized = 9,
    NoMissileFired = 10,
}

// ============================================================================
// Data Types
// ============================================================================

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Player {
    One = 0,
    Two = 1,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    fn turn_status(self) -> GameStatus {
        match self {
            Player::One => GameStatus::Player1Turn,
            Player::Two => GameStatus::Player2Turn,
        }
    }
}

#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum GameStatus {
    /// Never stored: games are created in `Player1Turn`.
    Uninitialized = 0,
    Player1Turn = 1,
    Player2Turn = 2,
    Player1Won = 3,
    Player2Won = 4,
    Draw = 5,
}

/// Public projection of a game.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Game {
    pub player1: Address,
    pub player2: Address,
    pub width: u32,
    pub height: u32,
    /// Number of accepted actions.
    pub turn: u32,
    pub status: GameStatus,
    pub player1_armed: bool,
    pub player2_armed: bool,
}

// Game storage is split by write frequency:
// - GameCore: written once at creation
// - GameRuntime: rewritten by every accepted action
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameCore {
    pub game_id: u32,
    pub player1: Address,
    pub player2: Address,
    pub width: u32,
    pub height: u32,
    /// Coprocessor that owns every handle of this game.
    pub coprocessor: Address,
    /// Encrypted constants: 0 is EMPTY/false, 1 is HOUSE/true, 2 is BUNKER.
    pub zero: BytesN<32>,
    pub one: BytesN<32>,
    pub two: BytesN<32>,
}

/// Encrypted running counts for one board, kept in step with its cells.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tally {
    /// Cells holding a standing structure.
    pub standing: BytesN<32>,
    /// Standing HOUSE cells. Bunkers, spent or not, do not count.
    pub houses: BytesN<32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameRuntime {
    pub turn: u32,
    pub status: GameStatus,
    pub player1_armed: bool,
    pub player2_armed: bool,
    pub player1_builds: u32,
    pub player2_builds: u32,
    pub player1_tally: Tally,
    pub player2_tally: Tally,
}

/// Last missile of a game, as stored.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MissileRecord {
    pub attacker: Player,
    pub column: u32,
    pub hit: BytesN<32>,
    pub row_plus_one: BytesN<32>,
}

/// Last missile of a game, sealed for the requester. The attacker only learns
/// whether the missile hit; `row_plus_one` is present for the defender.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MissileReport {
    pub attacker: Address,
    pub column: u32,
    pub hit: BytesN<32>,
    pub row_plus_one: Option<BytesN<32>>,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Coprocessor,
    NextGameId,
    GameCore(u32),
    GameRuntime(u32),
    LastMissile(u32),
    Cell(u32, Player, u32, u32),
}

impl GameCore {
    fn address_of(&self, player: Player) -> Address {
        match player {
            Player::One => self.player1.clone(),
            Player::Two => self.player2.clone(),
        }
    }

    fn player_of(&self, account: &Address) -> Option<Player> {
        if *account == self.player1 {
            Some(Player::One)
        } else if *account == self.player2 {
            Some(Player::Two)
        } else {
            None
        }
    }

    fn check_bounds(&self, row: u32, column: u32) -> Result<(), Error> {
        if row >= self.height || column >= self.width {
            return Err(Error::OutOfBounds);
        }
        Ok(())
    }
}

impl GameRuntime {
    fn armed(&self, player: Player) -> bool {
        match player {
            Player::One => self.player1_armed,
            Player::Two => self.player2_armed,
        }
    }

    fn set_armed(&mut self, player: Player, armed: bool) {
        match player {
            Player::One => self.player1_armed = armed,
            Player::Two => self.player2_armed = armed,
        }
    }

    fn builds(&self, player: Player) -> u32 {
        match player {
            Player::One => self.player1_builds,
            Player::Two => self.player2_builds,
        }
    }

    fn tally(&self, player: Player) -> &Tally {
        match player {
            Player::One => &self.player1_tally,
            Player::Two => &self.player2_tally,
        }
    }

    fn set_tally(&mut self, player: Player, tally: Tally) {
        match player {
            Player::One => self.player1_tally = tally,
            Player::Two => self.player2_tally = tally,
        }
    }

    /// A build re-arms the opponent's missile.
    fn record_build(&mut self, builder: Player) {
        match builder {
            Player::One => self.player1_builds = self.player1_builds.saturating_add(1),
            Player::Two => self.player2_builds = self.player2_builds.saturating_add(1),
        }
        self.set_armed(builder.opponent(), true);
    }
}

// ============================================================================
// Events
// ============================================================================

#[contractevent]
pub struct GameCreated {
    pub game_id: u32,
    pub player1: Address,
    pub player2: Address,
    pub width: u32,
    pub height: u32,
}

/// Coordinates are public; the structure type is not.
#[contractevent]
pub struct StructureBuilt {
    pub game_id: u32,
    pub player: Address,
    pub row: u32,
    pub column: u32,
}

#[contractevent]
pub struct MissileFired {
    pub game_id: u32,
    pub attacker: Address,
    pub column: u32,
}

#[contractevent]
pub struct GameEnded {
    pub game_id: u32,
    pub status: GameStatus,
}

// ============================================================================
// Contract Implementation
// ============================================================================

pub const EMPTY: u32 = 0;
pub const HOUSE: u32 = 1;
pub const BUNKER: u32 = 2;
/// A bunker that absorbed a missile. Stands and supports, never scores.
pub const SPENT_BUNKER: u32 = 3;
pub const MAX_DIMENSION: u32 = 16;

#[contract]
pub struct BunkerWarz;

#[contractimpl]
impl BunkerWarz {
    pub fn __constructor(env: Env, admin: Address, coprocessor: Address) {
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Coprocessor, &coprocessor);
    }

    /// Point new games at another coprocessor. Running games keep theirs.
    pub fn set_coprocessor(env: Env, coprocessor: Address) {
        let admin = Self::get_admin(env.clone());
        admin.require_auth();
        env.storage().instance().set(&DataKey::Coprocessor, &coprocessor);
    }

    pub fn create_game(
        env: Env,
        width: u32,
        height: u32,
        player1: Address,
        player2: Address,
    ) -> Result<u32, Error> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::InvalidDimensions);
        }

        let coprocessor = Self::get_coprocessor(env.clone());
        let fhe = Fhe::new(&env, &coprocessor);
        let game_id = registry::allocate_id(&env);

        let core = GameCore {
            game_id,
            player1: player1.clone(),
            player2: player2.clone(),
            width,
            height,
            coprocessor,
            zero: fhe.constant(EMPTY),
            one: fhe.constant(HOUSE),
            two: fhe.constant(BUNKER),
        };
        let empty = Tally {
            standing: core.zero.clone(),
            houses: core.zero.clone(),
        };
        // Both players start armed; the first missile has nothing to wait for.
        let runtime = GameRuntime {
            turn: 0,
            status: GameStatus::Player1Turn,
            player1_armed: true,
            player2_armed: true,
            player1_builds: 0,
            player2_builds: 0,
            player1_tally: empty.clone(),
            player2_tally: empty,
        };
        registry::store_core(&env, game_id, &core);
        registry::store_runtime(&env, game_id, &runtime);

        GameCreated {
            game_id,
            player1,
            player2,
            width,
            height,
        }
        .publish(&env);
        Ok(game_id)
    }

    /// Build on the caller's own board. `content_minus_one` is the caller's
    /// encryption of `HOUSE - 1` or `BUNKER - 1`; anything else builds a HOUSE.
    pub fn build(
        env: Env,
        game_id: u32,
        player: Address,
        row: u32,
        column: u32,
        content_minus_one: BytesN<32>,
    ) -> Result<(), Error> {
        let (core, mut runtime) = registry::load_pair(&env, game_id)?;
        let builder = Self::require_turn(&core, &runtime, &player)?;
        core.check_bounds(row, column)?;

        let fhe = Fhe::new(&env, &core.coprocessor);
        let board = Board::new(&env, &core, builder);

        if row > 0 {
            let below = board.cell(row - 1, column);
            if !fhe.reveal(&board::standing(&fhe, &core, &below)) {
                return Err(Error::UnsupportedPlacement);
            }
        }
        let target = board.cell(row, column);
        if fhe.reveal(&fhe.not_equal(&target.content, &core.zero)) {
            return Err(Error::CellOccupied);
        }

        let input = fhe.accept_input(&player, &content_minus_one)?;
        let in_range = fhe.less_than(&input, &core.two);
        let requested = fhe.add(&input, &core.one);
        let content = fhe.select(&in_range, &requested, &core.one);

        let tally = runtime.tally(builder);
        let tally = Tally {
            standing: fhe.add(&tally.standing, &core.one),
            houses: fhe.add(&tally.houses, &fhe.equal(&content, &core.one)),
        };
        runtime.set_tally(builder, tally);
        board.set(
            row,
            column,
            &Cell {
                content,
                alive: core.one.clone(),
            },
        );

        runtime.record_build(builder);
        StructureBuilt {
            game_id,
            player,
            row,
            column,
        }
        .publish(&env);

        Self::finish_action(&env, &fhe, &core, &mut runtime, builder);
        registry::store_runtime(&env, game_id, &runtime);
        Ok(())
    }

    /// Fire at `column` of the opponent's board. A player cannot fire again
    /// until the opponent has built since their last missile.
    pub fn send_missile(
        env: Env,
        game_id: u32,
        player: Address,
        column: u32,
    ) -> Result<(), Error> {
        let (core, mut runtime) = registry::load_pair(&env, game_id)?;
        let attacker = Self::require_turn(&core, &runtime, &player)?;
        if column >= core.width {
            return Err(Error::OutOfBounds);
        }
        if !runtime.armed(attacker) {
            return Err(Error::MissileAlreadyPending);
        }

        let fhe = Fhe::new(&env, &core.coprocessor);
        let defender = Board::new(&env, &core, attacker.opponent());
        let strike = attack::resolve(&fhe, &core, &defender, column);

        let tally = runtime.tally(attacker.opponent());
        let tally = Tally {
            standing: fhe.sub(&tally.standing, &strike.hit),
            houses: fhe.sub(&tally.houses, &strike.house_lost),
        };
        runtime.set_tally(attacker.opponent(), tally);
        registry::store_missile(
            &env,
            game_id,
            &MissileRecord {
                attacker,
                column,
                hit: strike.hit,
                row_plus_one: strike.row_plus_one,
            },
        );

        runtime.set_armed(attacker, false);
        MissileFired {
            game_id,
            attacker: player,
            column,
        }
        .publish(&env);

        Self::finish_action(&env, &fhe, &core, &mut runtime, attacker);
        registry::store_runtime(&env, game_id, &runtime);
        Ok(())
    }

    pub fn get_game(env: Env, game_id: u32) -> Result<Game, Error> {
        let (core, runtime) = registry::load_pair(&env, game_id)?;
        Ok(Game {
            player1: core.player1,
            player2: core.player2,
            width: core.width,
            height: core.height,
            turn: runtime.turn,
            status: runtime.status,
            player1_armed: runtime.player1_armed,
            player2_armed: runtime.player2_armed,
        })
    }

    /// Last missile of the game, sealed for `requester` under `public_key`.
    /// The defender sees hit and row; the attacker sees hit only.
    pub fn get_missile_hit(
        env: Env,
        game_id: u32,
        requester: Address,
        public_key: BytesN<32>,
    ) -> Result<MissileReport, Error> {
        let core = registry::load_core(&env, game_id)?;
        let record = registry::load_missile(&env, game_id).ok_or(Error::NoMissileFired)?;
        let attacker = core.address_of(record.attacker);
        let defender = core.address_of(record.attacker.opponent());

        let full_view = if requester == defender {
            true
        } else if requester == attacker {
            false
        } else {
            return Err(Error::Unauthorized);
        };
        requester.require_auth();

        let fhe = Fhe::new(&env, &core.coprocessor);
        let hit = fhe.seal(&record.hit, &requester, &public_key);
        let row_plus_one = if full_view {
            Some(fhe.seal(&record.row_plus_one, &requester, &public_key))
        } else {
            None
        };
        Ok(MissileReport {
            attacker,
            column: record.column,
            hit,
            row_plus_one,
        })
    }

    /// Content of a cell on the requester's own board, sealed for them.
    pub fn get_board_value(
        env: Env,
        game_id: u32,
        row: u32,
        column: u32,
        requester: Address,
        public_key: BytesN<32>,
    ) -> Result<BytesN<32>, Error> {
        let core = registry::load_core(&env, game_id)?;
        let owner = core.player_of(&requester).ok_or(Error::Unauthorized)?;
        requester.require_auth();
        core.check_bounds(row, column)?;

        let fhe = Fhe::new(&env, &core.coprocessor);
        let cell = Board::new(&env, &core, owner).cell(row, column);
        Ok(fhe.seal(&cell.content, &requester, &public_key))
    }

    pub fn current_player(env: Env, game_id: u32) -> Result<Address, Error> {
        let (core, runtime) = registry::load_pair(&env, game_id)?;
        match runtime.status {
            GameStatus::Player1Turn => Ok(core.player1),
            GameStatus::Player2Turn => Ok(core.player2),
            _ => Err(Error::GameOver),
        }
    }

    pub fn next_game_id(env: Env) -> u32 {
        registry::next_id(&env)
    }

    pub fn get_admin(env: Env) -> Address {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .expect("admin not set")
    }

    pub fn get_coprocessor(env: Env) -> Address {
        env.storage()
            .instance()
            .get(&DataKey::Coprocessor)
            .expect("coprocessor not set")
    }

    // --- Internals ---
    fn require_turn(
        core: &GameCore,
        runtime: &GameRuntime,
        actor: &Address,
    ) -> Result<Player, Error> {
        let mover = match runtime.status {
            GameStatus::Player1Turn => Player::One,
            GameStatus::Player2Turn => Player::Two,
            _ => return Err(Error::GameOver),
        };
        if *actor != core.address_of(mover) {
            return Err(Error::NotYourTurn);
        }
        actor.require_auth();
        Ok(mover)
    }

    fn finish_action(
        env: &Env,
        fhe: &Fhe,
        core: &GameCore,
        runtime: &mut GameRuntime,
        mover: Player,
    ) {
        runtime.turn = runtime.turn.saturating_add(1);
        match outcome::evaluate(fhe, core, runtime, mover.opponent()) {
            Some(status) => {
                runtime.status = status;
                GameEnded {
                    game_id: core.game_id,
                    status,
                }
                .publish(env);
            }
            None => runtime.status = mover.opponent().turn_status(),
        }
    }
}
