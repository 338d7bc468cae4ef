//! Fundraising rounds.
//!
//! A round sells tokens of one ledger token against a unit of account. Mint
//! rounds (primary, secondary, preference series) create new supply; peer
//! rounds sell inventory a holder moved into the contract. The state is a
//! function of the purchased amount and the ledger sequence, persisted by
//! `sync` on the first write after a boundary is crossed.

use shared::{
    errors::Error,
    events::{
        EXTERNAL_PURCHASE, FUNDS_TRANSFERRED, LOCK_RELEASED, PURCHASE, REDEEM, ROUND_CREATED,
        ROUND_FINISHED,
    },
    types::{
        Amount, BlockNumber, PeerRoundParams, Pool, Round, RoundKind, RoundParams,
        RoundState, RoundTarget, TokenKind, TokenSpec, VestingParams,
    },
    DENOMINATOR, PRICE_SCALE,
};
use soroban_sdk::{log, token::TokenClient, Address, Env, Vec};

use crate::{pool, registry, storage::*, token, validation};

// ==================== State ====================

/// Derive the state of `round` at block `now` without touching storage.
pub fn current_state(round: &Round, now: BlockNumber) -> RoundState {
    if round.state != RoundState::Active {
        return round.state;
    }
    if round.purchased >= round.params.hardcap {
        return RoundState::Successful;
    }
    if now < round.end_block {
        return RoundState::Active;
    }
    if round.purchased >= round.params.softcap {
        RoundState::Successful
    } else {
        RoundState::Failed
    }
}

/// Round as observed at the current block. Read-only.
pub fn view(env: &Env, round_id: u64) -> Result<Round, Error> {
    let mut round = get_round(env, round_id)?;
    round.state = current_state(&round, env.ledger().sequence());
    Ok(round)
}

/// Load a round and persist its state if a boundary has been crossed.
pub fn sync(env: &Env, round_id: u64) -> Result<Round, Error> {
    let mut round = get_round(env, round_id)?;
    if round.state == RoundState::Active {
        let state = current_state(&round, env.ledger().sequence());
        if state != RoundState::Active {
            finalize(env, &mut round, state)?;
            set_round(env, &round);
        }
    }
    Ok(round)
}

fn finalize(env: &Env, round: &mut Round, state: RoundState) -> Result<(), Error> {
    round.state = state;
    log!(env, "round finalized", round.id, round.purchased, state);
    env.events()
        .publish((ROUND_FINISHED,), (round.id, state, round.purchased));

    if round.kind == RoundKind::Primary && state == RoundState::Successful {
        let mut org = get_pool(env, round.pool_id)?;
        if org.primary_round == Some(round.id) && !org.is_dao {
            org.is_dao = true;
            set_pool(env, &org);
        }
    }
    Ok(())
}

/// Block from which the vesting schedule runs.
pub fn vesting_start(round: &Round) -> BlockNumber {
    round.completed_at.unwrap_or(round.end_block)
}

// ==================== Creation ====================

/// Open the pool's primary round, issuing its governance token.
pub fn create_primary(
    env: &Env,
    pool_id: u64,
    spec: &TokenSpec,
    params: RoundParams,
) -> Result<u64, Error> {
    let existing = get_pool(env, pool_id)?;
    if let Some(round_id) = existing.primary_round {
        match sync(env, round_id)?.state {
            RoundState::Active => return Err(Error::ActiveRoundExists),
            RoundState::Successful => return Err(Error::GovernanceTokenExists),
            RoundState::Failed => {}
        }
    }

    let token_id = token::create(env, pool_id, TokenKind::Governance, spec)?;
    let round_id = create_mint(env, pool_id, token_id, RoundKind::Primary, params)?;

    let mut updated = get_pool(env, pool_id)?;
    updated.governance_token = Some(token_id);
    updated.primary_round = Some(round_id);
    set_pool(env, &updated);

    Ok(round_id)
}

/// Open a minting round for a DAO, on its governance token, an existing
/// preference series, or a freshly issued one.
pub fn create_for_target(
    env: &Env,
    owner: &Pool,
    target: &RoundTarget,
    params: RoundParams,
) -> Result<u64, Error> {
    if !owner.is_dao {
        return Err(Error::NotDao);
    }

    match target {
        RoundTarget::Governance => {
            let token_id = owner.governance_token.ok_or(Error::NotFound)?;
            create_mint(env, owner.id, token_id, RoundKind::Secondary, params)
        }
        RoundTarget::Preference(token_id) => {
            let info = get_token(env, *token_id)?;
            if info.pool_id != owner.id || info.kind != TokenKind::Preference {
                return Err(Error::InvInput);
            }
            create_mint(env, owner.id, *token_id, RoundKind::MultiId, params)
        }
        RoundTarget::NewPreference(spec) => {
            let token_id = token::create(env, owner.id, TokenKind::Preference, spec)?;
            create_mint(env, owner.id, token_id, RoundKind::MultiId, params)
        }
    }
}

/// Target matching an existing token of the pool.
pub fn target_for_token(env: &Env, owner: &Pool, token_id: u32) -> Result<RoundTarget, Error> {
    let info = get_token(env, token_id)?;
    if info.pool_id != owner.id {
        return Err(Error::InvInput);
    }
    Ok(match info.kind {
        TokenKind::Governance => RoundTarget::Governance,
        TokenKind::Preference => RoundTarget::Preference(token_id),
    })
}

fn create_mint(
    env: &Env,
    pool_id: u64,
    token_id: u32,
    kind: RoundKind,
    params: RoundParams,
) -> Result<u64, Error> {
    validation::validate_round_params(&params)?;
    registry::require_allowed_token(env, &params.unit_of_account)?;

    if let Some(previous) = get_active_round(env, token_id) {
        if sync(env, previous)?.state == RoundState::Active {
            return Err(Error::ActiveRoundExists);
        }
    }

    let fee_rate = get_protocol_fee(env);
    let info = get_token(env, token_id)?;
    let needed = params
        .hardcap
        .checked_add(share(params.hardcap, fee_rate)?)
        .ok_or(Error::Overflow)?;
    if needed > token::headroom(&info)? {
        return Err(Error::HardcapOverflow);
    }

    let round = open(env, pool_id, token_id, kind, None, params, fee_rate)?;
    set_active_round(env, token_id, round.id);
    Ok(round.id)
}

/// Open a peer round selling `params.amount` of the seller's unlocked tokens.
pub fn create_peer(
    env: &Env,
    seller: &Address,
    token_id: u32,
    params: PeerRoundParams,
) -> Result<u64, Error> {
    validation::validate_peer_params(&params)?;
    registry::require_allowed_token(env, &params.unit_of_account)?;

    let info = get_token(env, token_id)?;
    if let Some(previous) = get_peer_round(env, token_id, seller) {
        if sync(env, previous)?.state == RoundState::Active {
            return Err(Error::ActiveRoundExists);
        }
    }

    let round_params = RoundParams {
        unit_of_account: params.unit_of_account,
        price: params.price,
        softcap: params.softcap,
        hardcap: params.amount,
        min_purchase: params.min_purchase,
        max_purchase: params.max_purchase,
        duration: params.duration,
        lockup_duration: 0,
        lockup_tvl: 0,
        vesting: VestingParams {
            vested_share: 0,
            cliff: 0,
            cliff_share: 0,
            spans: 0,
            span_duration: 0,
            span_share: 0,
            claim_tvl: 0,
            resolvers: Vec::new(env),
        },
        whitelist: params.whitelist,
    };

    let round = open(
        env,
        info.pool_id,
        token_id,
        RoundKind::Peer,
        Some(seller.clone()),
        round_params,
        0,
    )?;
    token::transfer(env, token_id, seller, &env.current_contract_address(), params.amount)?;
    set_peer_round(env, token_id, seller, round.id);
    Ok(round.id)
}

fn open(
    env: &Env,
    pool_id: u64,
    token_id: u32,
    kind: RoundKind,
    seller: Option<Address>,
    params: RoundParams,
    fee_rate: u32,
) -> Result<Round, Error> {
    let id = registry::register_round(env, pool_id)?;
    if get_round(env, id).is_ok() {
        return Err(Error::AlreadyInit);
    }

    let now = env.ledger().sequence();
    let end_block = now.checked_add(params.duration).ok_or(Error::Overflow)?;
    let round = Round {
        id,
        pool_id,
        token: token_id,
        kind,
        seller,
        params,
        start_block: now,
        end_block,
        completed_at: None,
        purchased: 0,
        vested: 0,
        raised: 0,
        escrow: 0,
        protocol_fee: 0,
        fee_rate,
        state: RoundState::Active,
        transfer_unlocked: false,
        claim_unlocked: false,
        funds_released: false,
    };
    set_round(env, &round);
    add_token_round(env, token_id, id);

    env.events()
        .publish((ROUND_CREATED,), (pool_id, id, token_id, kind));

    Ok(round)
}

// ==================== Sale ====================

pub fn purchase(
    env: &Env,
    round_id: u64,
    buyer: &Address,
    amount: Amount,
    payment: Amount,
) -> Result<(), Error> {
    let mut round = sync(env, round_id)?;
    admit(env, &round, buyer, amount)?;

    let expected = amount
        .checked_mul(round.params.price)
        .ok_or(Error::Overflow)?
        / PRICE_SCALE;
    if payment <= 0 || payment != expected {
        return Err(Error::IncorrectPayment);
    }

    record(env, &mut round, buyer, amount, payment)?;

    TokenClient::new(env, &round.params.unit_of_account).transfer(
        buyer,
        &env.current_contract_address(),
        &payment,
    );

    env.events()
        .publish((PURCHASE,), (round_id, buyer.clone(), amount, payment));
    Ok(())
}

/// Allocation settled outside the contract; admission checks still apply.
pub fn external_purchase(
    env: &Env,
    round_id: u64,
    operator: &Address,
    beneficiary: &Address,
    amount: Amount,
) -> Result<(), Error> {
    let mut round = sync(env, round_id)?;
    match &round.seller {
        Some(seller) if seller != operator => return Err(Error::Unauthorized),
        Some(_) => {}
        None => pool::require_operator(env, &get_pool(env, round.pool_id)?, operator)?,
    }
    admit(env, &round, beneficiary, amount)?;
    record(env, &mut round, beneficiary, amount, 0)?;

    env.events()
        .publish((EXTERNAL_PURCHASE,), (round_id, beneficiary.clone(), amount));
    Ok(())
}

/// Purchase limits for `buyer`: whitelist entry when a whitelist is set,
/// zero entries falling back to the round defaults.
fn limits(round: &Round, buyer: &Address) -> Result<(Amount, Amount), Error> {
    let params = &round.params;
    if params.whitelist.is_empty() {
        return Ok((params.min_purchase, params.max_purchase));
    }

    let entry = params
        .whitelist
        .iter()
        .find(|a| a.account == *buyer)
        .ok_or(Error::NotWhitelisted)?;
    let min = if entry.min == 0 { params.min_purchase } else { entry.min };
    let max = if entry.max == 0 { params.max_purchase } else { entry.max };
    Ok((min, max))
}

fn admit(env: &Env, round: &Round, buyer: &Address, amount: Amount) -> Result<(), Error> {
    if round.state != RoundState::Active {
        return Err(Error::WrongState);
    }
    if amount <= 0 {
        return Err(Error::InvalidPurchaseAmount);
    }

    let (min, max) = limits(round, buyer)?;
    let bought = get_purchase(env, round.id, buyer)
        .amount
        .checked_add(amount)
        .ok_or(Error::Overflow)?;
    let total = round.purchased.checked_add(amount).ok_or(Error::Overflow)?;
    if amount < min || bought > max || total > round.params.hardcap {
        return Err(Error::InvalidPurchaseAmount);
    }
    Ok(())
}

/// Ledger effects of an admitted purchase. Runs before any payment moves.
fn record(
    env: &Env,
    round: &mut Round,
    buyer: &Address,
    amount: Amount,
    paid: Amount,
) -> Result<(), Error> {
    let mut purchase = get_purchase(env, round.id, buyer);
    purchase.amount = purchase.amount.checked_add(amount).ok_or(Error::Overflow)?;
    purchase.paid = purchase.paid.checked_add(paid).ok_or(Error::Overflow)?;

    round.purchased = round.purchased.checked_add(amount).ok_or(Error::Overflow)?;
    round.raised = round.raised.checked_add(paid).ok_or(Error::Overflow)?;
    round.escrow = round.escrow.checked_add(paid).ok_or(Error::Overflow)?;

    if round.kind == RoundKind::Peer {
        token::transfer_locked(
            env,
            round.token,
            &env.current_contract_address(),
            buyer,
            amount,
            round.id,
        )?;
    } else {
        let vested = share(amount, round.params.vesting.vested_share)?;
        let fee = share(amount, round.fee_rate)?;

        token::mint(env, round.token, buyer, amount - vested, Some(round.id))?;
        token::reserve(env, round.token, vested.checked_add(fee).ok_or(Error::Overflow)?)?;

        if vested > 0 {
            let mut entry = get_vesting_entry(env, round.id, buyer);
            entry.vested = entry.vested.checked_add(vested).ok_or(Error::Overflow)?;
            set_vesting_entry(env, round.id, buyer, &entry);
        }
        purchase.fee = purchase.fee.checked_add(fee).ok_or(Error::Overflow)?;
        round.vested = round.vested.checked_add(vested).ok_or(Error::Overflow)?;
        round.protocol_fee = round.protocol_fee.checked_add(fee).ok_or(Error::Overflow)?;
    }
    set_purchase(env, round.id, buyer, &purchase);

    if round.purchased >= round.params.hardcap {
        round.completed_at = Some(env.ledger().sequence());
        finalize(env, round, RoundState::Successful)?;
    }
    set_round(env, round);
    Ok(())
}

// ==================== Resolution ====================

/// Refund a purchaser of a failed round and take back their allocation.
pub fn redeem(env: &Env, round_id: u64, account: &Address) -> Result<Amount, Error> {
    let mut round = sync(env, round_id)?;
    if round.state != RoundState::Failed {
        return Err(Error::WrongState);
    }

    let mut purchase = get_purchase(env, round_id, account);
    if purchase.redeemed {
        return Err(Error::AlreadyRedeemed);
    }
    if purchase.amount == 0 {
        return Err(Error::NothingToRedeem);
    }

    if let Some(seller) = round.seller.clone() {
        let amount = token::take_lock(env, round.token, account, round_id);
        if amount > 0 {
            token::transfer(env, round.token, account, &seller, amount)?;
        }
    } else {
        token::burn_locked(env, round.token, account, round_id)?;

        let entry = get_vesting_entry(env, round_id, account);
        let reserved = entry
            .vested
            .checked_add(purchase.fee)
            .ok_or(Error::Overflow)?;
        token::release_reserve(env, round.token, reserved)?;
        set_vesting_entry(env, round_id, account, &Default::default());

        round.vested = round.vested.checked_sub(entry.vested).ok_or(Error::Overflow)?;
        round.protocol_fee = round
            .protocol_fee
            .checked_sub(purchase.fee)
            .ok_or(Error::Overflow)?;
    }

    let refund = purchase.paid;
    purchase.redeemed = true;
    set_purchase(env, round_id, account, &purchase);

    round.escrow = round.escrow.checked_sub(refund).ok_or(Error::Overflow)?;
    if round.escrow < 0 {
        return Err(Error::InvariantViolation);
    }
    set_round(env, &round);

    if refund > 0 {
        TokenClient::new(env, &round.params.unit_of_account).transfer(
            &env.current_contract_address(),
            account,
            &refund,
        );
    }

    env.events()
        .publish((REDEEM,), (round_id, account.clone(), purchase.amount, refund));
    Ok(refund)
}

/// Payment `account` could reclaim from the round right now.
pub fn redeemable_balance_of(env: &Env, round_id: u64, account: &Address) -> Result<Amount, Error> {
    let round = view(env, round_id)?;
    let purchase = get_purchase(env, round_id, account);
    if round.state != RoundState::Failed || purchase.redeemed {
        return Ok(0);
    }
    Ok(purchase.paid)
}

/// Lift the transfer lock on the round's allocations.
pub fn set_lockup_tvl_reached(env: &Env, round_id: u64) -> Result<(), Error> {
    let mut round = sync(env, round_id)?;
    if round.state != RoundState::Successful {
        return Err(Error::WrongState);
    }
    if round.transfer_unlocked {
        return Ok(());
    }

    let params = &round.params;
    let tvl_reached = params.lockup_tvl > 0 && round.raised >= params.lockup_tvl;
    let unlock_at = (round.start_block as u64) + (params.lockup_duration as u64);
    let time_reached = env.ledger().sequence() as u64 >= unlock_at;
    if !tvl_reached && !time_reached {
        return Err(Error::LockupNotReached);
    }

    round.transfer_unlocked = true;
    set_round(env, &round);
    token::unlock_round(env, round_id);

    env.events().publish((LOCK_RELEASED,), (round_id, round.raised));
    Ok(())
}

/// Release the proceeds of a successful round. Later calls move nothing.
pub fn transfer_funds(env: &Env, round_id: u64) -> Result<(), Error> {
    let mut round = sync(env, round_id)?;
    if round.kind == RoundKind::Peer {
        return settle_peer(env, round);
    }
    if round.state != RoundState::Successful {
        return Err(Error::WrongState);
    }

    let asset = round.params.unit_of_account.clone();
    let fee_payment = share(round.escrow, round.fee_rate)?;
    let net = round.escrow - fee_payment;
    let fee_tokens = round.protocol_fee;

    pool::credit_treasury(env, round.pool_id, &asset, net)?;
    let collected = get_collected_fees(env, &asset)
        .checked_add(fee_payment)
        .ok_or(Error::Overflow)?;
    set_collected_fees(env, &asset, collected);

    round.escrow = 0;
    round.protocol_fee = 0;
    round.funds_released = true;
    set_round(env, &round);

    if fee_tokens > 0 {
        let treasury = get_protocol_treasury(env)?;
        token::mint_reserved(env, round.token, &treasury, fee_tokens)?;
    }

    env.events()
        .publish((FUNDS_TRANSFERRED,), (round_id, net, fee_payment, fee_tokens));
    Ok(())
}

/// Settle a peer round with its seller. The seller may also close an
/// active round early, keeping what has been sold so far.
pub fn finish_peer(env: &Env, round_id: u64, caller: &Address) -> Result<(), Error> {
    let mut round = sync(env, round_id)?;
    if round.kind != RoundKind::Peer {
        return Err(Error::InvInput);
    }
    if round.state == RoundState::Active {
        if round.seller.as_ref() != Some(caller) {
            return Err(Error::Unauthorized);
        }
        round.completed_at = Some(env.ledger().sequence());
        finalize(env, &mut round, RoundState::Successful)?;
        set_round(env, &round);
    }
    settle_peer(env, round)
}

/// The seller receives the whole escrow on success and the unsold inventory
/// either way; buyers' locks are released on success.
fn settle_peer(env: &Env, mut round: Round) -> Result<(), Error> {
    if round.state == RoundState::Active {
        return Err(Error::WrongState);
    }
    if round.funds_released {
        return Ok(());
    }

    let seller = round.seller.clone().ok_or(Error::InvariantViolation)?;
    let unsold = round
        .params
        .hardcap
        .checked_sub(round.purchased)
        .ok_or(Error::Overflow)?;
    let proceeds = if round.state == RoundState::Successful {
        round.escrow
    } else {
        0
    };

    round.escrow -= proceeds;
    round.funds_released = true;
    if round.state == RoundState::Successful {
        round.transfer_unlocked = true;
        token::unlock_round(env, round.id);
    }
    set_round(env, &round);

    let contract = env.current_contract_address();
    if unsold > 0 {
        token::transfer(env, round.token, &contract, &seller, unsold)?;
    }
    if proceeds > 0 {
        TokenClient::new(env, &round.params.unit_of_account).transfer(&contract, &seller, &proceeds);
    }

    env.events()
        .publish((FUNDS_TRANSFERRED,), (round.id, proceeds, 0i128, unsold));
    Ok(())
}

/// `amount * ppm / DENOMINATOR`, rounded down.
pub fn share(amount: Amount, ppm: u32) -> Result<Amount, Error> {
    Ok(amount
        .checked_mul(ppm as Amount)
        .ok_or(Error::Overflow)?
        / DENOMINATOR as Amount)
}
