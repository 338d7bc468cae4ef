//! Token-weighted proposals.
//!
//! Vote weight is the voter's governance checkpoint at `start_block - 1`,
//! the quorum base is the governance supply at the same block. The stored
//! execution state only records facts (an outcome settled before the end of
//! voting, execution, cancellation); everything else is derived from the
//! block number and the tally.

use shared::{
    errors::Error,
    events::{
        PROPOSAL_ACCEPTED, PROPOSAL_CANCELLED, PROPOSAL_CREATED, PROPOSAL_EXECUTED,
        PROPOSAL_REJECTED, SETTINGS_UPDATED, VOTE_CAST,
    },
    types::{
        Amount, Ballot, BlockNumber, ExecutionState, Pool, Proposal, ProposalAction,
        ProposalCore, ProposalKind, ProposalState, ProposalVote, Role, RoundTarget,
        TokenKind, TransferAction,
    },
    DENOMINATOR,
};
use soroban_sdk::{log, token::TokenClient, Address, Env, String};

use crate::{pool, registry, round, storage::*, token, validation};

pub fn kind_of(action: &ProposalAction) -> ProposalKind {
    match action {
        ProposalAction::Transfer(_) => ProposalKind::Transfer,
        ProposalAction::NewRound(_) => ProposalKind::NewRound,
        ProposalAction::Settings(_) => ProposalKind::Settings,
        ProposalAction::Roles(_) => ProposalKind::Roles,
    }
}

/// Proposals of the same class may not be voted on concurrently.
fn class_of(kind: ProposalKind) -> Option<u32> {
    match kind {
        ProposalKind::Transfer => None,
        ProposalKind::Settings | ProposalKind::Roles => Some(0),
        ProposalKind::NewRound => Some(1),
    }
}

fn snapshot_block(vote: &ProposalVote) -> BlockNumber {
    vote.start_block.saturating_sub(1)
}

fn governance_token(env: &Env, pool_id: u64) -> Result<u32, Error> {
    get_pool(env, pool_id)?
        .governance_token
        .ok_or(Error::NotFound)
}

fn quorum_reached(core: &ProposalCore, cast: Amount, total: Amount) -> bool {
    cast > 0
        && cast.saturating_mul(DENOMINATOR as Amount)
            >= total.saturating_mul(core.quorum_threshold as Amount)
}

fn decision_reached(core: &ProposalCore, for_votes: Amount, cast: Amount) -> bool {
    for_votes.saturating_mul(DENOMINATOR as Amount)
        >= cast.saturating_mul(core.decision_threshold as Amount)
}

/// Outcome already fixed before the end of voting: even if all power not
/// yet cast went the other way, the result could not change.
fn settled_early(
    core: &ProposalCore,
    vote: &ProposalVote,
    total: Amount,
) -> Option<ExecutionState> {
    let den = DENOMINATOR as Amount;
    let for_scaled = vote.for_votes.saturating_mul(den);
    if for_scaled >= total.saturating_mul(core.quorum_threshold as Amount)
        && for_scaled > total.saturating_mul(core.decision_threshold as Amount)
    {
        return Some(ExecutionState::Accepted);
    }
    let against_share = (DENOMINATOR - core.decision_threshold) as Amount;
    if vote.against_votes.saturating_mul(den) > total.saturating_mul(against_share) {
        return Some(ExecutionState::Rejected);
    }
    None
}

pub fn state_of(env: &Env, proposal: &Proposal) -> Result<ProposalState, Error> {
    let vote = &proposal.vote;
    match vote.execution {
        ExecutionState::Executed => return Ok(ProposalState::Executed),
        ExecutionState::Cancelled => return Ok(ProposalState::Cancelled),
        ExecutionState::Rejected => return Ok(ProposalState::Rejected),
        ExecutionState::Accepted => return Ok(ProposalState::Accepted),
        ExecutionState::Initialized => {}
    }

    let now = env.ledger().sequence();
    if now < vote.start_block {
        return Ok(ProposalState::Pending);
    }
    if now < vote.end_block {
        return Ok(ProposalState::Active);
    }

    let total = token::supply_at(
        env,
        governance_token(env, proposal.pool_id)?,
        snapshot_block(vote),
    );
    let cast = vote.for_votes + vote.against_votes;
    if quorum_reached(&proposal.core, cast, total)
        && decision_reached(&proposal.core, vote.for_votes, cast)
    {
        Ok(ProposalState::Accepted)
    } else {
        Ok(ProposalState::Rejected)
    }
}

/// Check an action against the pool it would run in and return the value
/// a transfer moves.
fn validate_action(env: &Env, org: &Pool, action: &ProposalAction) -> Result<Amount, Error> {
    match action {
        ProposalAction::Transfer(transfer) => validation::validate_transfer(transfer),
        ProposalAction::NewRound(new_round) => {
            validation::validate_round_params(&new_round.params)?;
            match &new_round.target {
                RoundTarget::Governance => {}
                RoundTarget::Preference(token_id) => {
                    let info = get_token(env, *token_id)?;
                    if info.pool_id != org.id || info.kind != TokenKind::Preference {
                        return Err(Error::InvInput);
                    }
                }
                RoundTarget::NewPreference(spec) => validation::validate_token_spec(spec)?,
            }
            Ok(0)
        }
        ProposalAction::Settings(settings) => {
            validation::validate_settings(settings)?;
            Ok(0)
        }
        ProposalAction::Roles(change) => {
            validation::validate_role_change(change)?;
            Ok(0)
        }
    }
}

pub fn create(
    env: &Env,
    pool_id: u64,
    proposer: &Address,
    action: ProposalAction,
    description: String,
    meta_hash: String,
) -> Result<u32, Error> {
    let mut org = pool::load(env, pool_id)?;
    if !org.is_dao {
        return Err(Error::NotDao);
    }
    let token_id = org.governance_token.ok_or(Error::NotFound)?;
    let kind = kind_of(&action);
    let value = validate_action(env, &org, &action)?;

    let now = env.ledger().sequence();
    let snapshot = now.saturating_sub(1);
    let weight = token::votes_at(env, token_id, proposer, snapshot);
    let supply = token::supply_at(env, token_id, snapshot);
    if weight.saturating_mul(DENOMINATOR as Amount)
        < supply.saturating_mul(org.settings.proposal_threshold as Amount)
    {
        return Err(Error::NotValidProposer);
    }

    let class = class_of(kind);
    if let Some(class) = class {
        if let Some(previous) = get_class_proposal(env, pool_id, class) {
            let state = state_of(env, &get_proposal(env, pool_id, previous)?)?;
            if state == ProposalState::Pending || state == ProposalState::Active {
                return Err(Error::ActiveProposalExists);
            }
        }
    }

    let settings = &org.settings;
    let mut execution_delay = settings.execution_delays.get(kind as u32).unwrap_or(0);
    if kind == ProposalKind::Transfer && value < settings.transfer_value_for_delay {
        execution_delay = 0;
    }
    let start_block = now
        .checked_add(settings.voting_start_delay)
        .ok_or(Error::Overflow)?;
    let end_block = start_block
        .checked_add(settings.voting_duration)
        .ok_or(Error::Overflow)?;

    let id = org.proposal_count;
    org.proposal_count = id.checked_add(1).ok_or(Error::Overflow)?;
    let core = ProposalCore {
        quorum_threshold: settings.quorum_threshold,
        decision_threshold: settings.decision_threshold,
        execution_delay,
    };
    set_pool(env, &org);

    let global_id = registry::register_proposal(env, pool_id, id)?;
    let proposal = Proposal {
        id,
        pool_id,
        global_id,
        proposer: proposer.clone(),
        kind,
        action,
        core,
        vote: ProposalVote {
            start_block,
            end_block,
            for_votes: 0,
            against_votes: 0,
            accepted_at: None,
            execution: ExecutionState::Initialized,
        },
        description,
        meta_hash,
    };
    set_proposal(env, &proposal);
    if let Some(class) = class {
        set_class_proposal(env, pool_id, class, id);
    }

    env.events().publish(
        (PROPOSAL_CREATED,),
        (pool_id, id, proposer.clone(), kind, start_block, end_block),
    );
    Ok(id)
}

pub fn cast_vote(
    env: &Env,
    pool_id: u64,
    proposal_id: u32,
    voter: &Address,
    support: bool,
) -> Result<Amount, Error> {
    let mut proposal = get_proposal(env, pool_id, proposal_id)?;
    let now = env.ledger().sequence();
    if proposal.vote.execution != ExecutionState::Initialized
        || now < proposal.vote.start_block
        || now >= proposal.vote.end_block
    {
        return Err(Error::VotingNotActive);
    }

    if get_ballot(env, pool_id, proposal_id, voter).cast {
        return Err(Error::AlreadyVoted);
    }

    let token_id = governance_token(env, pool_id)?;
    let snapshot = snapshot_block(&proposal.vote);
    let weight = token::votes_at(env, token_id, voter, snapshot);
    if weight == 0 {
        return Err(Error::ZeroVotes);
    }

    let ballot = Ballot {
        cast: true,
        support,
        weight,
    };
    set_ballot(env, pool_id, proposal_id, voter, &ballot);

    if support {
        proposal.vote.for_votes = proposal
            .vote
            .for_votes
            .checked_add(weight)
            .ok_or(Error::Overflow)?;
    } else {
        proposal.vote.against_votes = proposal
            .vote
            .against_votes
            .checked_add(weight)
            .ok_or(Error::Overflow)?;
    }

    let total = token::supply_at(env, token_id, snapshot);
    match settled_early(&proposal.core, &proposal.vote, total) {
        Some(ExecutionState::Accepted) => {
            proposal.vote.accepted_at = Some(now);
            proposal.vote.execution = ExecutionState::Accepted;
            log!(env, "proposal accepted early", pool_id, proposal_id, now);
            env.events()
                .publish((PROPOSAL_ACCEPTED,), (pool_id, proposal_id, now));
        }
        Some(ExecutionState::Rejected) => {
            proposal.vote.execution = ExecutionState::Rejected;
            log!(env, "proposal rejected early", pool_id, proposal_id, now);
            env.events()
                .publish((PROPOSAL_REJECTED,), (pool_id, proposal_id, now));
        }
        _ => {}
    }
    set_proposal(env, &proposal);

    env.events().publish(
        (VOTE_CAST,),
        (pool_id, proposal_id, voter.clone(), support, weight),
    );
    Ok(weight)
}

/// Weight `voter` could still cast on the proposal.
pub fn available_votes(
    env: &Env,
    pool_id: u64,
    proposal_id: u32,
    voter: &Address,
) -> Result<Amount, Error> {
    let proposal = get_proposal(env, pool_id, proposal_id)?;
    if get_ballot(env, pool_id, proposal_id, voter).cast {
        return Ok(0);
    }
    let token_id = governance_token(env, pool_id)?;
    Ok(token::votes_at(env, token_id, voter, snapshot_block(&proposal.vote)))
}

pub fn execute(env: &Env, pool_id: u64, proposal_id: u32, caller: &Address) -> Result<(), Error> {
    let executors = get_role_members(env, pool_id, Role::Executor);
    if !executors.is_empty() && !validation::is_member(&executors, caller) {
        return Err(Error::Unauthorized);
    }

    let mut proposal = get_proposal(env, pool_id, proposal_id)?;
    if state_of(env, &proposal)? != ProposalState::Accepted {
        return Err(Error::WrongState);
    }
    let accepted_at = proposal
        .vote
        .accepted_at
        .unwrap_or(proposal.vote.end_block);
    let executable_at = accepted_at as u64 + proposal.core.execution_delay as u64;
    if (env.ledger().sequence() as u64) < executable_at {
        return Err(Error::WrongState);
    }

    proposal.vote.execution = ExecutionState::Executed;
    set_proposal(env, &proposal);

    match proposal.action {
        ProposalAction::Transfer(transfer) => pay_out(env, pool_id, &transfer)?,
        ProposalAction::NewRound(new_round) => {
            let org = pool::load(env, pool_id)?;
            round::create_for_target(env, &org, &new_round.target, new_round.params)?;
        }
        ProposalAction::Settings(settings) => {
            validation::validate_settings(&settings)?;
            let mut org = get_pool(env, pool_id)?;
            org.settings = settings;
            set_pool(env, &org);
            env.events().publish((SETTINGS_UPDATED,), pool_id);
        }
        ProposalAction::Roles(change) => pool::set_roles(env, pool_id, &change)?,
    }

    env.events()
        .publish((PROPOSAL_EXECUTED,), (pool_id, proposal_id, caller.clone()));
    Ok(())
}

fn pay_out(env: &Env, pool_id: u64, transfer: &TransferAction) -> Result<(), Error> {
    validation::validate_transfer(transfer)?;
    for amount in transfer.amounts.iter() {
        pool::debit_treasury(env, pool_id, &transfer.asset, amount)?;
    }

    let client = TokenClient::new(env, &transfer.asset);
    let contract = env.current_contract_address();
    for (recipient, amount) in transfer.recipients.iter().zip(transfer.amounts.iter()) {
        client.transfer(&contract, &recipient, &amount);
    }
    Ok(())
}

/// Withdraw a proposal during its contest window. Protocol admin or a pool
/// secretary only.
pub fn cancel(env: &Env, pool_id: u64, proposal_id: u32, caller: &Address) -> Result<(), Error> {
    let is_admin = get_admin(env)? == *caller;
    if !is_admin && !pool::has_role(env, pool_id, Role::Secretary, caller) {
        return Err(Error::Unauthorized);
    }

    let mut proposal = get_proposal(env, pool_id, proposal_id)?;
    match state_of(env, &proposal)? {
        ProposalState::Executed | ProposalState::Rejected | ProposalState::Cancelled => {
            return Err(Error::WrongState)
        }
        _ => {}
    }
    proposal.vote.execution = ExecutionState::Cancelled;
    set_proposal(env, &proposal);

    env.events()
        .publish((PROPOSAL_CANCELLED,), (pool_id, proposal_id, caller.clone()));
    Ok(())
}
