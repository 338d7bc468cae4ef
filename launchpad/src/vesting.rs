//! Cliff-and-span release of the vested part of each purchase.
//!
//! Vested tokens are reserved on purchase and minted, unlocked, as they are
//! claimed. A resolver can cancel an account's remaining allocation, which
//! drops it from the reserve.

use shared::{
    errors::Error,
    events::{CLAIM, CLAIM_UNLOCKED, VESTING_CANCELLED},
    types::{Amount, BlockNumber, Round, RoundState, VestingEntry, VestingParams},
    DENOMINATOR,
};
use soroban_sdk::{Address, Env};

use crate::{round, storage::*, token, validation};

/// Part of `total` the schedule has released by block `now`.
pub fn released(
    params: &VestingParams,
    total: Amount,
    start: BlockNumber,
    now: BlockNumber,
) -> Result<Amount, Error> {
    let cliff_end = start as u64 + params.cliff as u64;
    if (now as u64) < cliff_end {
        return Ok(0);
    }

    let elapsed = now as u64 - cliff_end;
    let spans = params.spans as u64;
    let completed = if params.span_duration == 0 {
        spans
    } else {
        spans.min(elapsed / params.span_duration as u64)
    };
    if completed >= spans {
        return Ok(total);
    }

    let ppm = params.cliff_share as u64 + params.span_share as u64 * completed;
    let amount = total
        .checked_mul(ppm as Amount)
        .ok_or(Error::Overflow)?
        / DENOMINATOR as Amount;
    Ok(amount.min(total))
}

/// Released amount for `account` as of now, frozen at `claimed` once cancelled.
pub fn vested_of(env: &Env, round: &Round, entry: &VestingEntry) -> Result<Amount, Error> {
    if entry.cancelled {
        return Ok(entry.claimed);
    }
    if round.state != RoundState::Successful {
        return Ok(0);
    }
    released(
        &round.params.vesting,
        entry.vested,
        round::vesting_start(round),
        env.ledger().sequence(),
    )
}

fn claim_open(round: &Round) -> bool {
    round.state == RoundState::Successful
        && (round.params.vesting.claim_tvl == 0 || round.claim_unlocked)
}

pub fn vested(env: &Env, round_id: u64, account: &Address) -> Result<Amount, Error> {
    let round = round::view(env, round_id)?;
    vested_of(env, &round, &get_vesting_entry(env, round_id, account))
}

/// What `claim` would mint right now.
pub fn claimable(env: &Env, round_id: u64, account: &Address) -> Result<Amount, Error> {
    let round = round::view(env, round_id)?;
    if !claim_open(&round) {
        return Ok(0);
    }
    let entry = get_vesting_entry(env, round_id, account);
    let released = vested_of(env, &round, &entry)?;
    Ok((released - entry.claimed).max(0))
}

pub fn set_claim_tvl_reached(env: &Env, round_id: u64) -> Result<(), Error> {
    let mut round = round::sync(env, round_id)?;
    if round.state != RoundState::Successful {
        return Err(Error::WrongState);
    }
    if round.claim_unlocked {
        return Ok(());
    }
    if round.raised < round.params.vesting.claim_tvl {
        return Err(Error::ClaimNotAvailable);
    }

    round.claim_unlocked = true;
    set_round(env, &round);

    env.events().publish((CLAIM_UNLOCKED,), (round_id, round.raised));
    Ok(())
}

pub fn claim(env: &Env, round_id: u64, account: &Address) -> Result<Amount, Error> {
    let round = round::sync(env, round_id)?;
    if !claim_open(&round) {
        return Err(Error::ClaimNotAvailable);
    }

    let mut entry = get_vesting_entry(env, round_id, account);
    let released = vested_of(env, &round, &entry)?;
    if released <= entry.claimed {
        return Err(Error::ClaimNotAvailable);
    }

    let amount = released - entry.claimed;
    entry.claimed = released;
    if entry.claimed + entry.resolved > entry.vested {
        return Err(Error::InvariantViolation);
    }
    set_vesting_entry(env, round_id, account, &entry);
    token::mint_reserved(env, round.token, account, amount)?;

    env.events()
        .publish((CLAIM,), (round_id, account.clone(), amount));
    Ok(amount)
}

/// Forfeit what `account` has not claimed yet. Resolvers only.
pub fn cancel(env: &Env, round_id: u64, resolver: &Address, account: &Address) -> Result<Amount, Error> {
    let round = round::sync(env, round_id)?;
    if !validation::is_member(&round.params.vesting.resolvers, resolver) {
        return Err(Error::Unauthorized);
    }
    if round.state != RoundState::Successful {
        return Err(Error::WrongState);
    }

    let mut entry = get_vesting_entry(env, round_id, account);
    if entry.cancelled {
        return Err(Error::WrongState);
    }
    if entry.vested == 0 {
        return Err(Error::NotFound);
    }

    let remainder = entry
        .vested
        .checked_sub(entry.claimed)
        .ok_or(Error::Overflow)?;
    entry.resolved = remainder;
    entry.cancelled = true;
    set_vesting_entry(env, round_id, account, &entry);
    token::release_reserve(env, round.token, remainder)?;

    env.events().publish(
        (VESTING_CANCELLED,),
        (round_id, resolver.clone(), account.clone(), remainder),
    );
    Ok(remainder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::{Env, Vec};

    fn schedule(env: &Env) -> VestingParams {
        VestingParams {
            vested_share: DENOMINATOR,
            cliff: 100,
            cliff_share: 100_000,
            spans: 4,
            span_duration: 50,
            span_share: 200_000,
            claim_tvl: 0,
            resolvers: Vec::new(env),
        }
    }

    #[test]
    fn test_schedule_points() {
        let env = Env::default();
        let params = schedule(&env);

        assert_eq!(released(&params, 500, 0, 0), Ok(0));
        assert_eq!(released(&params, 500, 0, 99), Ok(0));
        assert_eq!(released(&params, 500, 0, 100), Ok(50));
        assert_eq!(released(&params, 500, 0, 149), Ok(50));
        assert_eq!(released(&params, 500, 0, 150), Ok(150));
        assert_eq!(released(&params, 500, 0, 250), Ok(350));
        assert_eq!(released(&params, 500, 0, 300), Ok(500));
        assert_eq!(released(&params, 500, 0, 450), Ok(500));
    }

    #[test]
    fn test_schedule_is_monotonic() {
        let env = Env::default();
        let params = schedule(&env);

        let mut previous = 0;
        for block in 1_000..1_500u32 {
            let current = released(&params, 12_345, 1_000, block).unwrap();
            assert!(current >= previous);
            assert!(current <= 12_345);
            previous = current;
        }
        assert_eq!(previous, 12_345);
    }

    #[test]
    fn test_schedule_without_spans_releases_everything_at_cliff() {
        let env = Env::default();
        let mut params = schedule(&env);
        params.spans = 0;
        params.span_duration = 0;

        assert_eq!(released(&params, 500, 10, 109), Ok(0));
        assert_eq!(released(&params, 500, 10, 110), Ok(500));
    }
}
