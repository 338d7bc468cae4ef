//! Token ledger: balances, per-round locks, reserves and vote checkpoints.
//!
//! Every token belongs to a pool. Governance tokens additionally keep vote
//! and supply histories; preference series only track balances.

use shared::{
    errors::Error,
    events::{BURN, DELEGATE_CHANGED, MINT, TOKEN_CREATED, TRANSFER},
    types::{Account, Amount, BlockNumber, TokenInfo, TokenKind, TokenSpec},
};
use soroban_sdk::{Address, Env, Vec};
use soroban_token_sdk::metadata::TokenMetadata;

use crate::{checkpoints, storage::*, validation};

/// Issue a new token for `pool_id` and return its id.
pub fn create(env: &Env, pool_id: u64, kind: TokenKind, spec: &TokenSpec) -> Result<u32, Error> {
    validation::validate_token_spec(spec)?;

    let id = next_token_id(env)?;
    let info = TokenInfo {
        id,
        pool_id,
        kind,
        name: spec.name.clone(),
        symbol: spec.symbol.clone(),
        decimals: spec.decimals,
        cap: spec.cap,
        supply: 0,
        reserved: 0,
    };
    set_token(env, &info);
    add_pool_token(env, pool_id, id);

    env.events().publish((TOKEN_CREATED,), (pool_id, id, kind));

    Ok(id)
}

/// Room left under the cap once supply and reserves are accounted for.
pub fn headroom(token: &TokenInfo) -> Result<Amount, Error> {
    let committed = token
        .supply
        .checked_add(token.reserved)
        .ok_or(Error::Overflow)?;
    token.cap.checked_sub(committed).ok_or(Error::Overflow)
}

// ==================== Views ====================

/// Standard token description of `token_id`.
pub fn metadata(env: &Env, token_id: u32) -> Result<TokenMetadata, Error> {
    let info = get_token(env, token_id)?;
    Ok(TokenMetadata {
        decimal: info.decimals,
        name: info.name,
        symbol: info.symbol,
    })
}

pub fn balance(env: &Env, token_id: u32, holder: &Address) -> Amount {
    get_account(env, token_id, holder).balance
}

pub fn locked(env: &Env, token_id: u32, holder: &Address) -> Result<Amount, Error> {
    locked_of(env, holder, &get_account(env, token_id, holder))
}

pub fn unlocked(env: &Env, token_id: u32, holder: &Address) -> Result<Amount, Error> {
    let account = get_account(env, token_id, holder);
    let locked = locked_of(env, holder, &account)?;
    if locked > account.balance {
        return Err(Error::InvariantViolation);
    }
    Ok(account.balance - locked)
}

pub fn delegates(env: &Env, token_id: u32, holder: &Address) -> Address {
    get_delegate(env, token_id, holder).unwrap_or(holder.clone())
}

pub fn votes(env: &Env, token_id: u32, account: &Address) -> Amount {
    checkpoints::latest(env, &History::Votes(token_id, account.clone()))
}

pub fn votes_at(env: &Env, token_id: u32, account: &Address, block: BlockNumber) -> Amount {
    checkpoints::value_at(env, &History::Votes(token_id, account.clone()), block)
}

/// Governance supply in effect at `block`. Preference series keep no history.
pub fn supply_at(env: &Env, token_id: u32, block: BlockNumber) -> Amount {
    checkpoints::value_at(env, &History::Supply(token_id), block)
}

// ==================== Holder operations ====================

pub fn transfer(
    env: &Env,
    token_id: u32,
    from: &Address,
    to: &Address,
    amount: Amount,
) -> Result<(), Error> {
    move_tokens(env, token_id, from, to, amount, None)
}

/// Move unlocked tokens from `from` to `to`, locking them at the receiver
/// under `round_id`.
pub fn transfer_locked(
    env: &Env,
    token_id: u32,
    from: &Address,
    to: &Address,
    amount: Amount,
    round_id: u64,
) -> Result<(), Error> {
    move_tokens(env, token_id, from, to, amount, Some(round_id))
}

pub fn burn(env: &Env, token_id: u32, from: &Address, amount: Amount) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvInput);
    }
    if unlocked(env, token_id, from)? < amount {
        return Err(Error::InsufficientUnlocked);
    }

    let mut token = get_token(env, token_id)?;
    apply(env, &token, from, -amount, None)?;
    change_supply(env, &mut token, -amount)?;
    set_token(env, &token);

    env.events().publish((BURN,), (token_id, from.clone(), amount));
    Ok(())
}

pub fn delegate(
    env: &Env,
    token_id: u32,
    holder: &Address,
    delegatee: &Address,
) -> Result<(), Error> {
    let token = get_token(env, token_id)?;
    if token.kind != TokenKind::Governance {
        return Err(Error::NotGovernanceToken);
    }

    let previous = delegates(env, token_id, holder);
    if previous == *delegatee {
        return Ok(());
    }

    let weight = balance(env, token_id, holder);
    move_votes(env, token_id, &previous, -weight)?;
    move_votes(env, token_id, delegatee, weight)?;
    set_delegate(env, token_id, holder, delegatee);

    env.events().publish(
        (DELEGATE_CHANGED,),
        (token_id, holder.clone(), previous, delegatee.clone()),
    );
    Ok(())
}

// ==================== Round hooks ====================

/// Mint `amount` to `to`, locked under `lock` when given.
pub fn mint(
    env: &Env,
    token_id: u32,
    to: &Address,
    amount: Amount,
    lock: Option<u64>,
) -> Result<(), Error> {
    if amount == 0 {
        return Ok(());
    }
    if amount < 0 {
        return Err(Error::InvInput);
    }

    let mut token = get_token(env, token_id)?;
    change_supply(env, &mut token, amount)?;
    apply(env, &token, to, amount, lock)?;
    set_token(env, &token);

    env.events().publish((MINT,), (token_id, to.clone(), amount));
    Ok(())
}

/// Set aside `amount` of the cap for a later mint.
pub fn reserve(env: &Env, token_id: u32, amount: Amount) -> Result<(), Error> {
    let mut token = get_token(env, token_id)?;
    token.reserved = token.reserved.checked_add(amount).ok_or(Error::Overflow)?;
    if token.reserved < 0 {
        return Err(Error::InvariantViolation);
    }
    if headroom(&token)? < 0 {
        return Err(Error::CapExceeded);
    }
    set_token(env, &token);
    Ok(())
}

/// Drop `amount` from the reserve without minting it.
pub fn release_reserve(env: &Env, token_id: u32, amount: Amount) -> Result<(), Error> {
    reserve(env, token_id, -amount)
}

/// Mint previously reserved tokens, unlocked.
pub fn mint_reserved(env: &Env, token_id: u32, to: &Address, amount: Amount) -> Result<(), Error> {
    release_reserve(env, token_id, amount)?;
    mint(env, token_id, to, amount, None)
}

/// Remove `holder`'s lock under `round_id` and return the amount it covered.
/// The tokens stay in the balance, now unlocked.
pub fn take_lock(env: &Env, token_id: u32, holder: &Address, round_id: u64) -> Amount {
    let amount = get_round_lock(env, round_id, holder);
    set_round_lock(env, round_id, holder, 0);

    let mut account = get_account(env, token_id, holder);
    if let Some(index) = account.lock_rounds.first_index_of(round_id) {
        account.lock_rounds.remove(index);
        set_account(env, token_id, holder, &account);
    }
    amount
}

/// Burn whatever `holder` still has locked under `round_id`.
pub fn burn_locked(env: &Env, token_id: u32, holder: &Address, round_id: u64) -> Result<Amount, Error> {
    let amount = take_lock(env, token_id, holder, round_id);
    if amount > 0 {
        burn(env, token_id, holder, amount)?;
    }
    Ok(amount)
}

/// Release every holder's lock under `round_id` at once.
pub fn unlock_round(env: &Env, round_id: u64) {
    set_lock_released(env, round_id);
}

// ==================== Internals ====================

fn move_tokens(
    env: &Env,
    token_id: u32,
    from: &Address,
    to: &Address,
    amount: Amount,
    lock: Option<u64>,
) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvInput);
    }
    if unlocked(env, token_id, from)? < amount {
        return Err(Error::InsufficientUnlocked);
    }

    let token = get_token(env, token_id)?;
    apply(env, &token, from, -amount, None)?;
    apply(env, &token, to, amount, lock)?;

    env.events()
        .publish((TRANSFER,), (token_id, from.clone(), to.clone(), amount));
    Ok(())
}

/// Apply a signed balance change, optionally locking a credit under a round,
/// and move the matching vote power.
fn apply(
    env: &Env,
    token: &TokenInfo,
    holder: &Address,
    delta: Amount,
    lock: Option<u64>,
) -> Result<(), Error> {
    let mut account = get_account(env, token.id, holder);
    prune_locks(env, holder, &mut account);

    account.balance = account.balance.checked_add(delta).ok_or(Error::Overflow)?;
    if let Some(round_id) = lock {
        let current = get_round_lock(env, round_id, holder);
        let next = current.checked_add(delta).ok_or(Error::Overflow)?;
        if next < 0 {
            return Err(Error::InvariantViolation);
        }
        set_round_lock(env, round_id, holder, next);
        if !account.lock_rounds.contains(round_id) {
            account.lock_rounds.push_back(round_id);
        }
    }

    if account.balance < 0 || locked_of(env, holder, &account)? > account.balance {
        return Err(Error::InvariantViolation);
    }
    set_account(env, token.id, holder, &account);

    if token.kind == TokenKind::Governance {
        move_votes(env, token.id, &delegates(env, token.id, holder), delta)?;
    }
    Ok(())
}

fn change_supply(env: &Env, token: &mut TokenInfo, delta: Amount) -> Result<(), Error> {
    token.supply = token.supply.checked_add(delta).ok_or(Error::Overflow)?;
    if token.supply < 0 {
        return Err(Error::InvariantViolation);
    }
    if headroom(token)? < 0 {
        return Err(Error::CapExceeded);
    }

    if token.kind == TokenKind::Governance {
        checkpoints::push(
            env,
            &History::Supply(token.id),
            env.ledger().sequence(),
            token.supply,
        );
    }
    Ok(())
}

fn move_votes(env: &Env, token_id: u32, delegatee: &Address, delta: Amount) -> Result<(), Error> {
    if delta == 0 {
        return Ok(());
    }
    let history = History::Votes(token_id, delegatee.clone());
    let next = checkpoints::latest(env, &history)
        .checked_add(delta)
        .ok_or(Error::Overflow)?;
    if next < 0 {
        return Err(Error::InvariantViolation);
    }
    checkpoints::push(env, &history, env.ledger().sequence(), next);
    Ok(())
}

fn locked_of(env: &Env, holder: &Address, account: &Account) -> Result<Amount, Error> {
    let mut total: Amount = 0;
    for round_id in account.lock_rounds.iter() {
        if is_lock_released(env, round_id) {
            continue;
        }
        total = total
            .checked_add(get_round_lock(env, round_id, holder))
            .ok_or(Error::Overflow)?;
    }
    Ok(total)
}

/// Forget lock tags whose round has been released.
fn prune_locks(env: &Env, holder: &Address, account: &mut Account) {
    let mut kept = Vec::new(env);
    for round_id in account.lock_rounds.iter() {
        if is_lock_released(env, round_id) {
            set_round_lock(env, round_id, holder, 0);
        } else {
            kept.push_back(round_id);
        }
    }
    account.lock_rounds = kept;
}
