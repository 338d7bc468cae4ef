use soroban_sdk::{contractclient, Address, Env};

use crate::types::RecordKind;

/// Directory contract that issues global identifiers and keeps the
/// unit-of-account allow-list.
#[contractclient(name = "RegistryClient")]
pub trait RegistryInterface {
    /// Register a pool or round and return its globally unique id.
    fn add_record(env: Env, kind: RecordKind, pool_id: u64) -> u64;

    /// Register a pool-local proposal and return its global id.
    fn add_proposal(env: Env, pool_id: u64, proposal_id: u32) -> u64;

    fn is_token_allowed(env: Env, token: Address) -> bool;
}
