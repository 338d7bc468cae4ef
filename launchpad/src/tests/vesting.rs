use shared::{errors::Error, types::VestingParams, DENOMINATOR};
use soroban_sdk::{testutils::Address as _, vec, Address};

use super::{Setup, START, UNIT};

/// 10% at a 100-block cliff, then four 50-block spans of 20%.
fn schedule(s: &Setup, resolver: &Address) -> VestingParams {
    VestingParams {
        vested_share: DENOMINATOR,
        cliff: 100,
        cliff_share: 100_000,
        spans: 4,
        span_duration: 50,
        span_share: 200_000,
        claim_tvl: 0,
        resolvers: vec![&s.env, resolver.clone()],
    }
}

/// Sold-out vesting round started at `START`; returns (round, token, buyer).
fn vesting_round(s: &Setup, vesting: VestingParams, amount: i128) -> (u64, u32, Address) {
    let owner = Address::generate(&s.env);
    let mut params = s.round_params(amount, amount);
    params.vesting = vesting;
    let (_, round_id, token_id) = s.primary(&owner, 10_000 * UNIT, params);
    let buyer = s.buyer(round_id, amount);
    (round_id, token_id, buyer)
}

#[test]
fn test_claims_follow_the_schedule() {
    let s = Setup::new();
    let resolver = Address::generate(&s.env);
    let (round_id, token_id, buyer) = vesting_round(&s, schedule(&s, &resolver), 500 * UNIT);

    assert_eq!(s.client.get_round(&round_id).completed_at, Some(START));
    assert_eq!(s.client.balance(&token_id, &buyer), 0);
    assert_eq!(s.client.vesting_entry(&round_id, &buyer).vested, 500 * UNIT);
    assert_eq!(s.client.claimable(&round_id, &buyer), 0);
    assert_eq!(
        s.client.try_claim(&round_id, &buyer),
        Err(Ok(Error::ClaimNotAvailable))
    );

    s.advance(100);
    assert_eq!(s.client.claimable(&round_id, &buyer), 50 * UNIT);
    assert_eq!(s.client.claim(&round_id, &buyer), 50 * UNIT);
    assert_eq!(
        s.client.try_claim(&round_id, &buyer),
        Err(Ok(Error::ClaimNotAvailable))
    );

    s.advance(50);
    assert_eq!(s.client.vested(&round_id, &buyer), 150 * UNIT);
    assert_eq!(s.client.claim(&round_id, &buyer), 100 * UNIT);

    s.advance(300);
    assert_eq!(s.client.claim(&round_id, &buyer), 350 * UNIT);
    assert_eq!(s.client.balance(&token_id, &buyer), 500 * UNIT);
    assert_eq!(s.client.unlocked_balance(&token_id, &buyer), 500 * UNIT);
    assert_eq!(s.client.claimable(&round_id, &buyer), 0);

    // only the fee reserve is left
    assert_eq!(s.client.token_info(&token_id).reserved, 5 * UNIT);
}

#[test]
fn test_claimed_tokens_carry_vote_power() {
    let s = Setup::new();
    let resolver = Address::generate(&s.env);
    let (round_id, token_id, buyer) = vesting_round(&s, schedule(&s, &resolver), 500 * UNIT);

    assert_eq!(s.client.votes(&token_id, &buyer), 0);
    s.advance(150);
    s.client.claim(&round_id, &buyer);
    assert_eq!(s.client.votes(&token_id, &buyer), 150 * UNIT);
    assert_eq!(s.client.total_supply(&token_id), 150 * UNIT);
}

#[test]
fn test_partial_vesting_splits_purchase() {
    let s = Setup::new();
    let resolver = Address::generate(&s.env);
    let mut vesting = schedule(&s, &resolver);
    vesting.vested_share = 400_000;
    let (round_id, token_id, buyer) = vesting_round(&s, vesting, 1_000 * UNIT);

    assert_eq!(s.client.balance(&token_id, &buyer), 600 * UNIT);
    assert_eq!(s.client.locked_balance(&token_id, &buyer), 600 * UNIT);
    assert_eq!(s.client.vesting_entry(&round_id, &buyer).vested, 400 * UNIT);
    assert_eq!(s.client.get_round(&round_id).vested, 400 * UNIT);

    s.advance(100);
    s.client.claim(&round_id, &buyer);
    // claimed tokens arrive unlocked next to the round lock
    assert_eq!(s.client.balance(&token_id, &buyer), 640 * UNIT);
    assert_eq!(s.client.unlocked_balance(&token_id, &buyer), 40 * UNIT);
}

#[test]
fn test_cancel_forfeits_the_remainder() {
    let s = Setup::new();
    let resolver = Address::generate(&s.env);
    let (round_id, token_id, buyer) = vesting_round(&s, schedule(&s, &resolver), 500 * UNIT);
    let reserved = s.client.token_info(&token_id).reserved;

    s.advance(150);
    s.client.claim(&round_id, &buyer);

    let stranger = Address::generate(&s.env);
    assert_eq!(
        s.client.try_cancel_vesting(&round_id, &stranger, &buyer),
        Err(Ok(Error::Unauthorized))
    );
    assert_eq!(
        s.client.try_cancel_vesting(&round_id, &resolver, &stranger),
        Err(Ok(Error::NotFound))
    );

    assert_eq!(
        s.client.cancel_vesting(&round_id, &resolver, &buyer),
        350 * UNIT
    );
    let entry = s.client.vesting_entry(&round_id, &buyer);
    assert!(entry.cancelled);
    assert_eq!(entry.claimed, 150 * UNIT);
    assert_eq!(entry.resolved, 350 * UNIT);
    assert_eq!(entry.claimed + entry.resolved, entry.vested);
    assert_eq!(
        s.client.token_info(&token_id).reserved,
        reserved - 500 * UNIT
    );

    s.advance(500);
    assert_eq!(s.client.vested(&round_id, &buyer), 150 * UNIT);
    assert_eq!(s.client.claimable(&round_id, &buyer), 0);
    assert_eq!(
        s.client.try_claim(&round_id, &buyer),
        Err(Ok(Error::ClaimNotAvailable))
    );
    assert_eq!(
        s.client.try_cancel_vesting(&round_id, &resolver, &buyer),
        Err(Ok(Error::WrongState))
    );
}

#[test]
fn test_cancel_requires_successful_round() {
    let s = Setup::new();
    let resolver = Address::generate(&s.env);
    let owner = Address::generate(&s.env);
    let mut params = s.round_params(400 * UNIT, 500 * UNIT);
    params.vesting = schedule(&s, &resolver);
    let (_, round_id, _) = s.primary(&owner, 10_000 * UNIT, params);
    let buyer = s.buyer(round_id, 100 * UNIT);

    assert_eq!(
        s.client.try_cancel_vesting(&round_id, &resolver, &buyer),
        Err(Ok(Error::WrongState))
    );
    s.advance(100);
    assert_eq!(
        s.client.try_cancel_vesting(&round_id, &resolver, &buyer),
        Err(Ok(Error::WrongState))
    );
}

#[test]
fn test_claim_tvl_gates_claims() {
    let s = Setup::new();
    let resolver = Address::generate(&s.env);

    // 500 tokens at 0.01 raise 5 units
    let mut vesting = schedule(&s, &resolver);
    vesting.claim_tvl = 6 * UNIT;
    let (round_id, _, buyer) = vesting_round(&s, vesting, 500 * UNIT);
    s.advance(200);
    assert_eq!(s.client.claimable(&round_id, &buyer), 0);
    assert_eq!(
        s.client.try_claim(&round_id, &buyer),
        Err(Ok(Error::ClaimNotAvailable))
    );
    assert_eq!(
        s.client.try_set_claim_tvl_reached(&round_id),
        Err(Ok(Error::ClaimNotAvailable))
    );

    let mut vesting = schedule(&s, &resolver);
    vesting.claim_tvl = 5 * UNIT;
    let (round_id, _, buyer) = vesting_round(&s, vesting, 500 * UNIT);
    s.advance(200);
    assert_eq!(
        s.client.try_claim(&round_id, &buyer),
        Err(Ok(Error::ClaimNotAvailable))
    );
    s.client.set_claim_tvl_reached(&round_id);
    s.client.set_claim_tvl_reached(&round_id);
    assert!(s.client.get_round(&round_id).claim_unlocked);
    assert_eq!(s.client.claim(&round_id, &buyer), 250 * UNIT);
}

#[test]
fn test_failed_round_returns_vested_reserve() {
    let s = Setup::new();
    let resolver = Address::generate(&s.env);
    let owner = Address::generate(&s.env);
    let mut params = s.round_params(400 * UNIT, 500 * UNIT);
    params.vesting = schedule(&s, &resolver);
    params.vesting.vested_share = 500_000;
    let (_, round_id, token_id) = s.primary(&owner, 10_000 * UNIT, params);
    let buyer = s.buyer(round_id, 200 * UNIT);

    assert_eq!(s.client.token_info(&token_id).reserved, 102 * UNIT);
    s.advance(100);
    assert_eq!(
        s.client.try_set_claim_tvl_reached(&round_id),
        Err(Ok(Error::WrongState))
    );
    assert_eq!(s.client.vested(&round_id, &buyer), 0);

    s.client.redeem(&round_id, &buyer);
    let info = s.client.token_info(&token_id);
    assert_eq!(info.reserved, 0);
    assert_eq!(info.supply, 0);
    assert_eq!(s.client.vesting_entry(&round_id, &buyer).vested, 0);
    assert_eq!(s.usdc_balance(&buyer), 2 * UNIT);
}
