//! Organizations: settings, capability table and treasury.

use shared::{
    errors::Error,
    events::{POOL_CREATED, ROLES_UPDATED, TREASURY_DEPOSIT},
    types::{Amount, GovernanceSettings, Pool, Role, RoleChange, RoundState},
};
use soroban_sdk::{token::TokenClient, Address, Env, String};

use crate::{registry, round, storage::*, validation};

pub fn create(
    env: &Env,
    owner: &Address,
    name: String,
    settings: GovernanceSettings,
) -> Result<u64, Error> {
    validation::validate_settings(&settings)?;

    let id = registry::register_pool(env)?;
    if get_pool(env, id).is_ok() {
        return Err(Error::AlreadyInit);
    }

    let pool = Pool {
        id,
        owner: owner.clone(),
        name,
        settings,
        is_dao: false,
        governance_token: None,
        primary_round: None,
        proposal_count: 0,
    };
    set_pool(env, &pool);

    env.events().publish((POOL_CREATED,), (id, owner.clone()));

    Ok(id)
}

/// Load a pool, flipping `is_dao` if its primary round has since succeeded.
pub fn load(env: &Env, pool_id: u64) -> Result<Pool, Error> {
    let mut pool = get_pool(env, pool_id)?;
    if !pool.is_dao {
        if let Some(round_id) = pool.primary_round {
            let state = round::sync(env, round_id)?.state;
            if state == RoundState::Successful {
                // sync persisted the flag
                pool = get_pool(env, pool_id)?;
            }
        }
    }
    Ok(pool)
}

/// Pool as observed at the current block. Read-only.
pub fn view(env: &Env, pool_id: u64) -> Result<Pool, Error> {
    let mut pool = get_pool(env, pool_id)?;
    if !pool.is_dao {
        if let Some(round_id) = pool.primary_round {
            pool.is_dao = round::view(env, round_id)?.state == RoundState::Successful;
        }
    }
    Ok(pool)
}

/// Owner or executor may open rounds on behalf of the pool.
pub fn require_operator(env: &Env, pool: &Pool, caller: &Address) -> Result<(), Error> {
    if pool.owner == *caller || has_role(env, pool.id, Role::Executor, caller) {
        return Ok(());
    }
    Err(Error::Unauthorized)
}

pub fn has_role(env: &Env, pool_id: u64, role: Role, account: &Address) -> bool {
    validation::is_member(&get_role_members(env, pool_id, role), account)
}

pub fn set_roles(env: &Env, pool_id: u64, change: &RoleChange) -> Result<(), Error> {
    validation::validate_role_change(change)?;
    set_role_members(env, pool_id, Role::Executor, &change.executors);
    set_role_members(env, pool_id, Role::Secretary, &change.secretaries);

    env.events().publish(
        (ROLES_UPDATED,),
        (pool_id, change.executors.len(), change.secretaries.len()),
    );
    Ok(())
}

pub fn deposit(
    env: &Env,
    pool_id: u64,
    from: &Address,
    asset: &Address,
    amount: Amount,
) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvInput);
    }
    get_pool(env, pool_id)?;

    credit_treasury(env, pool_id, asset, amount)?;
    TokenClient::new(env, asset).transfer(from, &env.current_contract_address(), &amount);

    env.events()
        .publish((TREASURY_DEPOSIT,), (pool_id, from.clone(), asset.clone(), amount));
    Ok(())
}

pub fn credit_treasury(env: &Env, pool_id: u64, asset: &Address, amount: Amount) -> Result<(), Error> {
    let balance = get_treasury(env, pool_id, asset)
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    set_treasury(env, pool_id, asset, balance);
    Ok(())
}

pub fn debit_treasury(env: &Env, pool_id: u64, asset: &Address, amount: Amount) -> Result<(), Error> {
    let balance = get_treasury(env, pool_id, asset);
    if balance < amount {
        return Err(Error::InsufficientTreasury);
    }
    set_treasury(env, pool_id, asset, balance - amount);
    Ok(())
}
