use shared::{
    errors::Error,
    types::{
        Amount, GovernanceSettings, PeerRoundParams, RoleChange, RoundParams, TokenSpec,
        TransferAction, VestingParams,
    },
    DENOMINATOR, MAX_RECIPIENTS, MAX_RESOLVERS, MAX_ROLE_MEMBERS, MAX_WHITELIST, PROPOSAL_KINDS,
};
use soroban_sdk::{Address, Env, Vec};

use crate::storage::is_paused;

pub fn require_not_paused(env: &Env) -> Result<(), Error> {
    if is_paused(env) {
        return Err(Error::Paused);
    }
    Ok(())
}

pub fn is_member(members: &Vec<Address>, account: &Address) -> bool {
    members.iter().any(|m| m == *account)
}

pub fn validate_token_spec(spec: &TokenSpec) -> Result<(), Error> {
    if spec.cap <= 0 || spec.decimals > 18 || spec.name.len() == 0 || spec.symbol.len() == 0 {
        return Err(Error::InvInput);
    }
    Ok(())
}

pub fn validate_settings(settings: &GovernanceSettings) -> Result<(), Error> {
    let denominator = DENOMINATOR;
    if settings.proposal_threshold > denominator
        || settings.quorum_threshold == 0
        || settings.quorum_threshold > denominator
        || settings.decision_threshold == 0
        || settings.decision_threshold > denominator
    {
        return Err(Error::InvalidSettings);
    }
    if settings.voting_duration == 0
        || settings.transfer_value_for_delay < 0
        || settings.execution_delays.len() != PROPOSAL_KINDS
    {
        return Err(Error::InvalidSettings);
    }
    Ok(())
}

pub fn validate_round_params(params: &RoundParams) -> Result<(), Error> {
    if params.price <= 0
        || params.hardcap <= 0
        || params.softcap < 0
        || params.softcap > params.hardcap
        || params.duration == 0
        || params.lockup_tvl < 0
    {
        return Err(Error::InvInput);
    }
    validate_purchase_limits(params.min_purchase, params.max_purchase)?;
    validate_whitelist(&params.whitelist)?;
    validate_vesting(&params.vesting)
}

pub fn validate_peer_params(params: &PeerRoundParams) -> Result<(), Error> {
    if params.amount <= 0
        || params.price <= 0
        || params.softcap < 0
        || params.softcap > params.amount
        || params.duration == 0
    {
        return Err(Error::InvInput);
    }
    validate_purchase_limits(params.min_purchase, params.max_purchase)?;
    validate_whitelist(&params.whitelist)
}

fn validate_purchase_limits(min: Amount, max: Amount) -> Result<(), Error> {
    if min < 0 || max <= 0 || max < min {
        return Err(Error::InvInput);
    }
    Ok(())
}

fn validate_whitelist(whitelist: &Vec<shared::types::Allocation>) -> Result<(), Error> {
    if whitelist.len() > MAX_WHITELIST {
        return Err(Error::InvInput);
    }
    for entry in whitelist.iter() {
        if entry.min < 0 || entry.max < 0 || (entry.max > 0 && entry.max < entry.min) {
            return Err(Error::InvInput);
        }
    }
    Ok(())
}

pub fn validate_vesting(vesting: &VestingParams) -> Result<(), Error> {
    let denominator = DENOMINATOR as u64;
    let scheduled = (vesting.cliff_share as u64)
        .checked_add((vesting.span_share as u64) * (vesting.spans as u64))
        .ok_or(Error::InvInput)?;

    if vesting.vested_share as u64 > denominator
        || scheduled > denominator
        || (vesting.spans > 0 && vesting.span_duration == 0)
        || vesting.claim_tvl < 0
        || vesting.resolvers.len() > MAX_RESOLVERS
    {
        return Err(Error::InvInput);
    }
    Ok(())
}

pub fn validate_role_change(change: &RoleChange) -> Result<(), Error> {
    if change.executors.len() > MAX_ROLE_MEMBERS || change.secretaries.len() > MAX_ROLE_MEMBERS {
        return Err(Error::InvInput);
    }
    Ok(())
}

/// Check a treasury transfer and return the total it moves.
pub fn validate_transfer(action: &TransferAction) -> Result<Amount, Error> {
    let count = action.recipients.len();
    if count == 0 || count > MAX_RECIPIENTS || count != action.amounts.len() {
        return Err(Error::InvInput);
    }

    let mut total: Amount = 0;
    for amount in action.amounts.iter() {
        if amount <= 0 {
            return Err(Error::InvInput);
        }
        total = total.checked_add(amount).ok_or(Error::Overflow)?;
    }
    Ok(total)
}
