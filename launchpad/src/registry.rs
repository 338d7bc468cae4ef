use shared::{errors::Error, registry::RegistryClient, types::RecordKind};
use soroban_sdk::{Address, Env};

use crate::storage::get_registry;

fn client(env: &Env) -> Result<RegistryClient, Error> {
    Ok(RegistryClient::new(env, &get_registry(env)?))
}

/// Global id for a new pool.
pub fn register_pool(env: &Env) -> Result<u64, Error> {
    Ok(client(env)?.add_record(&RecordKind::Pool, &0))
}

/// Global id for a new round of `pool_id`.
pub fn register_round(env: &Env, pool_id: u64) -> Result<u64, Error> {
    Ok(client(env)?.add_record(&RecordKind::Round, &pool_id))
}

pub fn register_proposal(env: &Env, pool_id: u64, proposal_id: u32) -> Result<u64, Error> {
    Ok(client(env)?.add_proposal(&pool_id, &proposal_id))
}

pub fn require_allowed_token(env: &Env, token: &Address) -> Result<(), Error> {
    if !client(env)?.is_token_allowed(token) {
        return Err(Error::TokenNotAllowed);
    }
    Ok(())
}
