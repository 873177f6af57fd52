#![no_std]

//! Development FHE coprocessor for Soroban
//!
//! Implements the encrypted-value capability consumed by confidential game
//! contracts: opaque 32-byte handles, homomorphic comparison / arithmetic /
//! selection, decryption to an authorized caller, and re-encryption
//! ("sealing") of a handle for one recipient.
//!
//! NOTE: a handle carries its plaintext in the clear next to a keyed tag. The
//! access rules are enforced exactly as a real coprocessor would enforce them,
//! but nothing here is cryptographically hidden, and the tag key sits in
//! instance storage. Deploy a real threshold-FHE coprocessor exposing the same
//! interface outside of tests and local networks.
//!
//! ## Handle layout
//!
//! ```text
//! [ value: u32 BE | nonce: u64 BE | binding tag: 10 | kind tag: 10 ]
//! ```
//!
//! Tags are truncated `sha256(master_key || domain || binding || head)` where
//! `head` is the first 12 bytes. Handles need no per-handle storage, so a
//! call may chain any number of operations without growing its ledger
//! footprint.
//!
//! ## Access control
//!
//! - A handle is bound to exactly one account.
//! - `encrypt` binds a fresh handle to its `owner` (a player encrypting input).
//! - Every operation names its `caller`, which must authorize the call and own
//!   each operand. The result is bound to the caller.
//! - `accept_input` re-binds a handle encrypted by a player to the calling
//!   contract.
//! - `seal` re-encrypts a handle for `(recipient, public_key)`; only that
//!   recipient, presenting that key, can `decrypt` it. Sealed handles are not
//!   operands.
//!
//! Booleans are encoded as `0` / `1`. Addition and subtraction wrap.

use soroban_sdk::xdr::ToXdr;
use soroban_sdk::{contract, contracterror, contractimpl, contracttype, Address, Bytes, BytesN, Env};


// ============================================================================
// Errors
// ============================================================================

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum FheError {
    NotAllowed = 1,
    NotSealedForRecipient = 2,
    KeyMismatch = 3,
}

// ============================================================================
// Storage
// ============================================================================

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    MasterKey,
    Counter,
}

const HEAD_LEN: usize = 12;
const TAG_LEN: usize = 10;

// Tag domains.
const OWNER: u8 = 0;
const OPERAND: u8 = 1;
const RECIPIENT: u8 = 2;
const SEALING_KEY: u8 = 3;

type Head = [u8; HEAD_LEN];
type Tag = [u8; TAG_LEN];

// ============================================================================
// Contract
// ============================================================================

#[contract]
pub struct FheCoprocessor;

#[contractimpl]
impl FheCoprocessor {
    pub fn __constructor(env: Env, master_key: BytesN<32>) {
        env.storage().instance().set(&DataKey::MasterKey, &master_key);
    }

    // ----- Client side -------------------------------------------------------

    /// Encrypt a player input. The handle is bound to `owner`.
    pub fn encrypt(env: Env, owner: Address, value: u32) -> BytesN<32> {
        owner.require_auth();
        Self::mint_operand(&env, &owner, value)
    }

    /// Decrypt a handle sealed for `recipient` under `public_key`.
    pub fn decrypt(
        env: Env,
        recipient: Address,
        public_key: BytesN<32>,
        handle: BytesN<32>,
    ) -> Result<u32, FheError> {
        recipient.require_auth();
        let (head, binding, kind) = Self::split(&handle);
        if binding != Self::tag(&env, RECIPIENT, &recipient.to_xdr(&env), &head) {
            return Err(FheError::NotSealedForRecipient);
        }
        let key = Bytes::from_array(&env, &public_key.to_array());
        if kind != Self::tag(&env, SEALING_KEY, &key, &head) {
            return Err(FheError::KeyMismatch);
        }
        Ok(Self::value_of(&head))
    }

    // ----- Contract side -----------------------------------------------------

    /// Encrypt a public constant for `caller`.
    pub fn trivial(env: Env, caller: Address, value: u32) -> BytesN<32> {
        caller.require_auth();
        Self::mint_operand(&env, &caller, value)
    }

    /// Adopt a handle that `owner` encrypted. Returns the same plaintext bound
    /// to `caller`.
    pub fn accept_input(
        env: Env,
        caller: Address,
        owner: Address,
        handle: BytesN<32>,
    ) -> Result<BytesN<32>, FheError> {
        caller.require_auth();
        let value = Self::operand(&env, &owner, &handle)?;
        Ok(Self::mint_operand(&env, &caller, value))
    }

    pub fn equal(env: Env, caller: Address, a: BytesN<32>, b: BytesN<32>) -> Result<BytesN<32>, FheError> {
        Self::binary(&env, &caller, &a, &b, |x, y| u32::from(x == y))
    }

    pub fn not_equal(env: Env, caller: Address, a: BytesN<32>, b: BytesN<32>) -> Result<BytesN<32>, FheError> {
        Self::binary(&env, &caller, &a, &b, |x, y| u32::from(x != y))
    }

    pub fn less_than(env: Env, caller: Address, a: BytesN<32>, b: BytesN<32>) -> Result<BytesN<32>, FheError> {
        Self::binary(&env, &caller, &a, &b, |x, y| u32::from(x < y))
    }

    pub fn add(env: Env, caller: Address, a: BytesN<32>, b: BytesN<32>) -> Result<BytesN<32>, FheError> {
        Self::binary(&env, &caller, &a, &b, u32::wrapping_add)
    }

    pub fn sub(env: Env, caller: Address, a: BytesN<32>, b: BytesN<32>) -> Result<BytesN<32>, FheError> {
        Self::binary(&env, &caller, &a, &b, u32::wrapping_sub)
    }

    pub fn and(env: Env, caller: Address, a: BytesN<32>, b: BytesN<32>) -> Result<BytesN<32>, FheError> {
        Self::binary(&env, &caller, &a, &b, |x, y| u32::from(x != 0 && y != 0))
    }

    pub fn or(env: Env, caller: Address, a: BytesN<32>, b: BytesN<32>) -> Result<BytesN<32>, FheError> {
        Self::binary(&env, &caller, &a, &b, |x, y| u32::from(x != 0 || y != 0))
    }

    pub fn not(env: Env, caller: Address, a: BytesN<32>) -> Result<BytesN<32>, FheError> {
        caller.require_auth();
        let x = Self::operand(&env, &caller, &a)?;
        Ok(Self::mint_operand(&env, &caller, u32::from(x == 0)))
    }

    /// `cond ? if_true : if_false` without revealing `cond`.
    pub fn select(
        env: Env,
        caller: Address,
        cond: BytesN<32>,
        if_true: BytesN<32>,
        if_false: BytesN<32>,
    ) -> Result<BytesN<32>, FheError> {
        caller.require_auth();
        let c = Self::operand(&env, &caller, &cond)?;
        let t = Self::operand(&env, &caller, &if_true)?;
        let f = Self::operand(&env, &caller, &if_false)?;
        Ok(Self::mint_operand(&env, &caller, if c != 0 { t } else { f }))
    }

    /// Decrypt a handle to its owner.
    pub fn reveal(env: Env, caller: Address, handle: BytesN<32>) -> Result<u32, FheError> {
        caller.require_auth();
        Self::operand(&env, &caller, &handle)
    }

    /// Re-encrypt a handle for `recipient` under `public_key`.
    pub fn seal(
        env: Env,
        caller: Address,
        handle: BytesN<32>,
        recipient: Address,
        public_key: BytesN<32>,
    ) -> Result<BytesN<32>, FheError> {
        caller.require_auth();
        let value = Self::operand(&env, &caller, &handle)?;
        let head = Self::next_head(&env, value);
        let binding = Self::tag(&env, RECIPIENT, &recipient.to_xdr(&env), &head);
        let key = Bytes::from_array(&env, &public_key.to_array());
        let kind = Self::tag(&env, SEALING_KEY, &key, &head);
        Ok(Self::assemble(&env, &head, &binding, &kind))
    }

    pub fn allowed(env: Env, handle: BytesN<32>, account: Address) -> bool {
        Self::operand(&env, &account, &handle).is_ok()
    }

    // --- Internals ---
    fn binary(
        env: &Env,
        caller: &Address,
        a: &BytesN<32>,
        b: &BytesN<32>,
        op: fn(u32, u32) -> u32,
    ) -> Result<BytesN<32>, FheError> {
        caller.require_auth();
        let x = Self::operand(env, caller, a)?;
        let y = Self::operand(env, caller, b)?;
        Ok(Self::mint_operand(env, caller, op(x, y)))
    }
    fn operand(env: &Env, owner: &Address, handle: &BytesN<32>) -> Result<u32, FheError> {
        let (head, binding, kind) = Self::split(handle);
        let owner_bytes = owner.clone().to_xdr(env);
        if binding != Self::tag(env, OWNER, &owner_bytes, &head)
            || kind != Self::tag(env, OPERAND, &Bytes::new(env), &head)
        {
            return Err(FheError::NotAllowed);
        }
        Ok(Self::value_of(&head))
    }
    fn mint_operand(env: &Env, owner: &Address, value: u32) -> BytesN<32> {
        let head = Self::next_head(env, value);
        let binding = Self::tag(env, OWNER, &owner.clone().to_xdr(env), &head);
        let kind = Self::tag(env, OPERAND, &Bytes::new(env), &head);
        Self::assemble(env, &head, &binding, &kind)
    }
    fn next_head(env: &Env, value: u32) -> Head {
        let nonce: u64 = env.storage().instance().get(&DataKey::Counter).unwrap_or(0);
        env.storage().instance().set(&DataKey::Counter, &(nonce + 1));
        let mut head = [0u8; HEAD_LEN];
        head[..4].copy_from_slice(&value.to_be_bytes());
        head[4..].copy_from_slice(&nonce.to_be_bytes());
        head
    }
    fn value_of(head: &Head) -> u32 {
        u32::from_be_bytes([head[0], head[1], head[2], head[3]])
    }
    fn tag(env: &Env, domain: u8, binding: &Bytes, head: &Head) -> Tag {
        let master: BytesN<32> = env
            .storage()
            .instance()
            .get(&DataKey::MasterKey)
            .expect("master key not set");
        let mut preimage = Bytes::from_array(env, &master.to_array());
        preimage.push_back(domain);
        preimage.append(binding);
        preimage.extend_from_array(head);
        let digest = env.crypto().sha256(&preimage).to_array();
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&digest[..TAG_LEN]);
        tag
    }
    fn assemble(env: &Env, head: &Head, binding: &Tag, kind: &Tag) -> BytesN<32> {
        let mut raw = [0u8; 32];
        raw[..HEAD_LEN].copy_from_slice(head);
        raw[HEAD_LEN..HEAD_LEN + TAG_LEN].copy_from_slice(binding);
        raw[HEAD_LEN + TAG_LEN..].copy_from_slice(kind);
        BytesN::from_array(env, &raw)
    }
    fn split(handle: &BytesN<32>) -> (Head, Tag, Tag) {
        let raw = handle.to_array();
        let mut head = [0u8; HEAD_LEN];
        let mut binding = [0u8; TAG_LEN];
        let mut kind = [0u8; TAG_LEN];
        head.copy_from_slice(&raw[..HEAD_LEN]);
        binding.copy_from_slice(&raw[HEAD_LEN..HEAD_LEN + TAG_LEN]);
        kind.copy_from_slice(&raw[HEAD_LEN + TAG_LEN..]);
        (head, binding, kind)
    }
}
