//! Encrypted-value capability.
//!
//! The game never holds plaintexts: it stores 32-byte ciphertext handles and
//! asks an external coprocessor contract to compute on them. `Fhe` wraps the
//! generated client so call sites read like the arithmetic they express, and
//! always names this contract as the caller the coprocessor checks its ACL
//! against.

use soroban_sdk::{contractclient, Address, BytesN, Env};

use crate::Error;

#[contractclient(name = "FheClient")]
pub trait Coprocessor {
    fn trivial(env: Env, caller: Address, value: u32) -> BytesN<32>;
    fn accept_input(env: Env, caller: Address, owner: Address, handle: BytesN<32>) -> BytesN<32>;
    fn equal(env: Env, caller: Address, a: BytesN<32>, b: BytesN<32>) -> BytesN<32>;
    fn not_equal(env: Env, caller: Address, a: BytesN<32>, b: BytesN<32>) -> BytesN<32>;
    fn less_than(env: Env, caller: Address, a: BytesN<32>, b: BytesN<32>) -> BytesN<32>;
    fn add(env: Env, caller: Address, a: BytesN<32>, b: BytesN<32>) -> BytesN<32>;
    fn sub(env: Env, caller: Address, a: BytesN<32>, b: BytesN<32>) -> BytesN<32>;
    fn and(env: Env, caller: Address, a: BytesN<32>, b: BytesN<32>) -> BytesN<32>;
    fn or(env: Env, caller: Address, a: BytesN<32>, b: BytesN<32>) -> BytesN<32>;
    fn not(env: Env, caller: Address, a: BytesN<32>) -> BytesN<32>;
    fn select(
        env: Env,
        caller: Address,
        cond: BytesN<32>,
        if_true: BytesN<32>,
        if_false: BytesN<32>,
    ) -> BytesN<32>;
    fn reveal(env: Env, caller: Address, handle: BytesN<32>) -> u32;
    fn seal(
        env: Env,
        caller: Address,
        handle: BytesN<32>,
        recipient: Address,
        public_key: BytesN<32>,
    ) -> BytesN<32>;
}

pub(crate) struct Fhe {
    client: FheClient<'static>,
    me: Address,
}

impl Fhe {
    pub(crate) fn new(env: &Env, coprocessor: &Address) -> Self {
        Self {
            client: FheClient::new(env, coprocessor),
            me: env.current_contract_address(),
        }
    }

    pub(crate) fn constant(&self, value: u32) -> BytesN<32> {
        self.client.trivial(&self.me, &value)
    }

    /// Take over a ciphertext `owner` encrypted as call input. The returned
    /// handle is this contract's.
    pub(crate) fn accept_input(
        &self,
        owner: &Address,
        handle: &BytesN<32>,
    ) -> Result<BytesN<32>, Error> {
        match self.client.try_accept_input(&self.me, owner, handle) {
            Ok(Ok(adopted)) => Ok(adopted),
            _ => Err(Error::Unauthorized),
        }
    }

    pub(crate) fn equal(&self, a: &BytesN<32>, b: &BytesN<32>) -> BytesN<32> {
        self.client.equal(&self.me, a, b)
    }

    pub(crate) fn not_equal(&self, a: &BytesN<32>, b: &BytesN<32>) -> BytesN<32> {
        self.client.not_equal(&self.me, a, b)
    }

    pub(crate) fn less_than(&self, a: &BytesN<32>, b: &BytesN<32>) -> BytesN<32> {
        self.client.less_than(&self.me, a, b)
    }

    pub(crate) fn add(&self, a: &BytesN<32>, b: &BytesN<32>) -> BytesN<32> {
        self.client.add(&self.me, a, b)
    }

    pub(crate) fn sub(&self, a: &BytesN<32>, b: &BytesN<32>) -> BytesN<32> {
        self.client.sub(&self.me, a, b)
    }

    pub(crate) fn and(&self, a: &BytesN<32>, b: &BytesN<32>) -> BytesN<32> {
        self.client.and(&self.me, a, b)
    }

    pub(crate) fn or(&self, a: &BytesN<32>, b: &BytesN<32>) -> BytesN<32> {
        self.client.or(&self.me, a, b)
    }

    pub(crate) fn not(&self, a: &BytesN<32>) -> BytesN<32> {
        self.client.not(&self.me, a)
    }

    pub(crate) fn select(
        &self,
        cond: &BytesN<32>,
        if_true: &BytesN<32>,
        if_false: &BytesN<32>,
    ) -> BytesN<32> {
        self.client.select(&self.me, cond, if_true, if_false)
    }

    /// Decrypt an encrypted boolean to this contract. Every call discloses one
    /// bit publicly; callers reveal rule outcomes only, never cell contents.
    pub(crate) fn reveal(&self, cond: &BytesN<32>) -> bool {
        self.client.reveal(&self.me, cond) != 0
    }

    /// Re-encrypt a handle so only `recipient` can decrypt it.
    pub(crate) fn seal(
        &self,
        handle: &BytesN<32>,
        recipient: &Address,
        public_key: &BytesN<32>,
    ) -> BytesN<32> {
        self.client.seal(&self.me, handle, recipient, public_key)
    }
}
