//! Game registry: identifier allocation and record storage.
//!
//! The id counter lives in instance storage; game records, missile records and
//! cells live in persistent storage and get their TTL bumped on every write.

use soroban_sdk::{Env, IntoVal, Val};

use crate::{DataKey, Error, GameCore, GameRuntime, MissileRecord};

const GAME_TTL_LEDGERS: u32 = 518_400; // ~30 days

pub(crate) fn next_id(env: &Env) -> u32 {
    env.storage().instance().get(&DataKey::NextGameId).unwrap_or(0)
}

/// Hands out the next id. Ids are never reused.
pub(crate) fn allocate_id(env: &Env) -> u32 {
    let id = next_id(env);
    env.storage().instance().set(&DataKey::NextGameId, &(id + 1));
    id
}

pub(crate) fn load_core(env: &Env, game_id: u32) -> Result<GameCore, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::GameCore(game_id))
        .ok_or(Error::UnknownGame)
}

pub(crate) fn store_core(env: &Env, game_id: u32, core: &GameCore) {
    persist(env, &DataKey::GameCore(game_id), core);
}

pub(crate) fn load_pair(env: &Env, game_id: u32) -> Result<(GameCore, GameRuntime), Error> {
    let core = load_core(env, game_id)?;
    let runtime = env
        .storage()
        .persistent()
        .get(&DataKey::GameRuntime(game_id))
        .ok_or(Error::UnknownGame)?;
    Ok((core, runtime))
}

pub(crate) fn store_runtime(env: &Env, game_id: u32, runtime: &GameRuntime) {
    persist(env, &DataKey::GameRuntime(game_id), runtime);
}

pub(crate) fn load_missile(env: &Env, game_id: u32) -> Option<MissileRecord> {
    env.storage().persistent().get(&DataKey::LastMissile(game_id))
}

pub(crate) fn store_missile(env: &Env, game_id: u32, record: &MissileRecord) {
    persist(env, &DataKey::LastMissile(game_id), record);
}

pub(crate) fn persist<V: IntoVal<Env, Val>>(env: &Env, key: &DataKey, value: &V) {
    env.storage().persistent().set(key, value);
    env.storage()
        .persistent()
        .extend_ttl(key, GAME_TTL_LEDGERS, GAME_TTL_LEDGERS);
}
