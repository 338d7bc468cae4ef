use shared::{errors::Error, types::TokenKind};
use soroban_sdk::{testutils::Address as _, Address, String};

use super::{Setup, UNIT};

/// Pool whose primary round sold out at `START`; returns (token, round, buyers).
fn sold_out(s: &Setup, amounts: &[i128]) -> (u32, u64, std::vec::Vec<Address>) {
    let owner = Address::generate(&s.env);
    let total: i128 = amounts.iter().sum();
    let (_, round_id, token_id) = s.primary(&owner, 10_000 * UNIT, s.round_params(total, total));
    let buyers = amounts.iter().map(|a| s.buyer(round_id, *a)).collect();
    (token_id, round_id, buyers)
}

#[test]
fn test_token_info_and_metadata() {
    let s = Setup::new();
    let (token_id, _, _) = sold_out(&s, &[250 * UNIT]);

    let info = s.client.token_info(&token_id);
    assert_eq!(info.id, token_id);
    assert_eq!(info.kind, TokenKind::Governance);
    assert_eq!(info.name, String::from_str(&s.env, "Nova Governance"));
    assert_eq!(info.symbol, String::from_str(&s.env, "NOVA"));
    assert_eq!(info.decimals, 7);
    assert_eq!(info.cap, 10_000 * UNIT);
    assert_eq!(info, s.client.token_info(&token_id));

    let metadata = s.client.token_metadata(&token_id);
    assert_eq!(metadata.decimal, 7);
    assert_eq!(metadata.name, info.name);
    assert_eq!(metadata.symbol, info.symbol);

    assert_eq!(
        s.client.try_token_metadata(&(token_id + 1)).err(),
        Some(Ok(Error::NotFound))
    );
}

#[test]
fn test_locked_tokens_vote_but_do_not_move() {
    let s = Setup::new();
    let (token_id, _, buyers) = sold_out(&s, &[600 * UNIT, 400 * UNIT]);
    let (alice, bob) = (&buyers[0], &buyers[1]);

    assert_eq!(s.client.votes(&token_id, alice), 600 * UNIT);
    assert_eq!(s.client.delegates(&token_id, alice), alice.clone());
    assert_eq!(s.client.unlocked_balance(&token_id, alice), 0);
    assert_eq!(
        s.client.try_transfer(&token_id, alice, bob, &UNIT),
        Err(Ok(Error::InsufficientUnlocked))
    );
    assert_eq!(
        s.client.try_burn(&token_id, alice, &UNIT),
        Err(Ok(Error::InsufficientUnlocked))
    );
}

#[test]
fn test_transfer_moves_unlocked_balance_and_votes() {
    let s = Setup::new();
    let (token_id, round_id, buyers) = sold_out(&s, &[600 * UNIT, 400 * UNIT]);
    let (alice, bob) = (&buyers[0], &buyers[1]);
    s.client.set_lockup_tvl_reached(&round_id);

    s.advance(1);
    s.client.transfer(&token_id, alice, bob, &(100 * UNIT));
    assert_eq!(s.client.balance(&token_id, alice), 500 * UNIT);
    assert_eq!(s.client.balance(&token_id, bob), 500 * UNIT);
    assert_eq!(s.client.votes(&token_id, alice), 500 * UNIT);
    assert_eq!(s.client.votes(&token_id, bob), 500 * UNIT);

    assert_eq!(
        s.client.try_transfer(&token_id, alice, bob, &(501 * UNIT)),
        Err(Ok(Error::InsufficientUnlocked))
    );
    assert_eq!(
        s.client.try_transfer(&token_id, alice, bob, &0),
        Err(Ok(Error::InvInput))
    );
}

#[test]
fn test_delegation_moves_vote_power_immediately() {
    let s = Setup::new();
    let (token_id, _, buyers) = sold_out(&s, &[600 * UNIT, 400 * UNIT]);
    let (alice, bob) = (&buyers[0], &buyers[1]);
    let before = s.now();

    s.advance(5);
    s.client.delegate(&token_id, alice, bob);
    assert_eq!(s.client.delegates(&token_id, alice), bob.clone());
    assert_eq!(s.client.votes(&token_id, alice), 0);
    assert_eq!(s.client.votes(&token_id, bob), 1_000 * UNIT);

    // history is untouched
    assert_eq!(s.client.votes_at(&token_id, alice, &before), 600 * UNIT);
    assert_eq!(s.client.votes_at(&token_id, bob, &before), 400 * UNIT);
    assert_eq!(s.client.votes_at(&token_id, bob, &(before - 1)), 0);

    // re-delegating to the current delegate is a no-op
    s.client.delegate(&token_id, alice, bob);
    assert_eq!(s.client.votes(&token_id, bob), 1_000 * UNIT);

    s.advance(1);
    s.client.delegate(&token_id, alice, alice);
    assert_eq!(s.client.votes(&token_id, alice), 600 * UNIT);
    assert_eq!(s.client.votes(&token_id, bob), 400 * UNIT);
    assert_eq!(s.client.votes_at(&token_id, bob, &(s.now() - 1)), 1_000 * UNIT);
}

#[test]
fn test_supply_checkpoints_track_mints_and_burns() {
    let s = Setup::new();
    let owner = Address::generate(&s.env);
    let (_, round_id, token_id) =
        s.primary(&owner, 10_000 * UNIT, s.round_params(100 * UNIT, 1_000 * UNIT));

    let first = s.now();
    let alice = s.buyer(round_id, 300 * UNIT);
    s.advance(3);
    let second = s.now();
    s.buyer(round_id, 700 * UNIT);

    assert_eq!(s.client.supply_at(&token_id, &(first - 1)), 0);
    assert_eq!(s.client.supply_at(&token_id, &first), 300 * UNIT);
    assert_eq!(s.client.supply_at(&token_id, &(second - 1)), 300 * UNIT);
    assert_eq!(s.client.supply_at(&token_id, &second), 1_000 * UNIT);

    s.client.set_lockup_tvl_reached(&round_id);
    s.advance(1);
    s.client.burn(&token_id, &alice, &(100 * UNIT));
    assert_eq!(s.client.total_supply(&token_id), 900 * UNIT);
    assert_eq!(s.client.supply_at(&token_id, &second), 1_000 * UNIT);
    assert_eq!(s.client.supply_at(&token_id, &s.now()), 900 * UNIT);
    assert_eq!(s.client.votes(&token_id, &alice), 200 * UNIT);
}

#[test]
fn test_locks_are_tracked_per_round() {
    let s = Setup::new();
    let owner = Address::generate(&s.env);
    let (pool_id, primary, token_id) =
        s.primary(&owner, 10_000 * UNIT, s.round_params(1_000 * UNIT, 1_000 * UNIT));
    let alice = s.buyer(primary, 1_000 * UNIT);

    let mut params = s.round_params(100 * UNIT, 500 * UNIT);
    params.lockup_duration = 1_000;
    let secondary = s
        .client
        .create_secondary_round(&pool_id, &owner, &token_id, &params);
    let payment = s.price_of(secondary, 200 * UNIT);
    soroban_sdk::token::StellarAssetClient::new(&s.env, &s.usdc).mint(&alice, &payment);
    s.client
        .purchase(&secondary, &alice, &(200 * UNIT), &payment);

    assert_eq!(s.client.balance(&token_id, &alice), 1_200 * UNIT);
    assert_eq!(s.client.locked_balance(&token_id, &alice), 1_200 * UNIT);

    // releasing one round leaves the other lock in place
    s.client.set_lockup_tvl_reached(&primary);
    assert_eq!(s.client.locked_balance(&token_id, &alice), 200 * UNIT);
    assert_eq!(s.client.unlocked_balance(&token_id, &alice), 1_000 * UNIT);

    let bob = Address::generate(&s.env);
    assert_eq!(
        s.client.try_transfer(&token_id, &alice, &bob, &(1_001 * UNIT)),
        Err(Ok(Error::InsufficientUnlocked))
    );
    s.client.transfer(&token_id, &alice, &bob, &(1_000 * UNIT));
    assert_eq!(s.client.balance(&token_id, &alice), 200 * UNIT);
    assert_eq!(s.client.locked_balance(&token_id, &alice), 200 * UNIT);
}

#[test]
fn test_locked_never_exceeds_balance() {
    let s = Setup::new();
    let owner = Address::generate(&s.env);
    let (_, round_id, token_id) =
        s.primary(&owner, 10_000 * UNIT, s.round_params(500 * UNIT, 2_000 * UNIT));

    let mut holders = std::vec::Vec::new();
    for i in 1..=5i128 {
        holders.push(s.buyer(round_id, i * 100 * UNIT));
        s.advance(7);
    }
    let check = |holders: &std::vec::Vec<Address>| {
        for h in holders.iter() {
            let balance = s.client.balance(&token_id, h);
            let locked = s.client.locked_balance(&token_id, h);
            assert!(locked <= balance);
            assert_eq!(s.client.unlocked_balance(&token_id, h), balance - locked);
        }
    };
    check(&holders);

    s.advance(100);
    s.client.set_lockup_tvl_reached(&round_id);
    check(&holders);

    let sink = Address::generate(&s.env);
    for h in holders.iter() {
        let amount = s.client.unlocked_balance(&token_id, h) / 2;
        s.client.transfer(&token_id, h, &sink, &amount);
    }
    holders.push(sink);
    check(&holders);
}
