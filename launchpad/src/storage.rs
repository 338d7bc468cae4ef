use shared::{
    errors::Error,
    types::{
        Account, Amount, Ballot, Checkpoint, Pool, Proposal, Purchase, Role, Round, TokenInfo,
        VestingEntry,
    },
    INSTANCE_TTL_EXTEND, INSTANCE_TTL_THRESHOLD, PERSISTENT_TTL_EXTEND, PERSISTENT_TTL_THRESHOLD,
};
use soroban_sdk::{contracttype, Address, Env, Vec};

/// Storage keys. Protocol configuration lives in instance storage, every
/// entity in persistent storage under a composite key.
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Registry,
    ProtocolTreasury,
    ProtocolFee,
    Paused,
    TokenCounter,
    Pool(u64),
    Role(u64, Role),
    Treasury(u64, Address),
    CollectedFees(Address),
    PoolTokens(u64),
    Token(u32),
    Account(u32, Address),
    RoundLock(u64, Address),
    LockReleased(u64),
    Delegate(u32, Address),
    VoteCheckpoint(u32, Address, u32),
    VoteCheckpointCount(u32, Address),
    SupplyCheckpoint(u32, u32),
    SupplyCheckpointCount(u32),
    TokenRounds(u32),
    Round(u64),
    ActiveRound(u32),
    PeerRound(u32, Address),
    Purchase(u64, Address),
    Vesting(u64, Address),
    Proposal(u64, u32),
    Ballot(u64, u32, Address),
    ClassProposal(u64, u32),
}

// ==================== Protocol configuration ====================

pub fn has_admin(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

pub fn get_admin(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInit)
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
    extend_instance_ttl(env);
}

pub fn get_registry(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::Registry)
        .ok_or(Error::NotInit)
}

pub fn set_registry(env: &Env, registry: &Address) {
    env.storage().instance().set(&DataKey::Registry, registry);
    extend_instance_ttl(env);
}

pub fn get_protocol_treasury(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::ProtocolTreasury)
        .ok_or(Error::NotInit)
}

pub fn set_protocol_treasury(env: &Env, treasury: &Address) {
    env.storage()
        .instance()
        .set(&DataKey::ProtocolTreasury, treasury);
    extend_instance_ttl(env);
}

pub fn get_protocol_fee(env: &Env) -> u32 {
    env.storage()
        .instance()
        .get(&DataKey::ProtocolFee)
        .unwrap_or(0)
}

pub fn set_protocol_fee(env: &Env, fee: u32) {
    env.storage().instance().set(&DataKey::ProtocolFee, &fee);
    extend_instance_ttl(env);
}

pub fn is_paused(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Paused)
        .unwrap_or(false)
}

pub fn set_paused(env: &Env, paused: bool) {
    env.storage().instance().set(&DataKey::Paused, &paused);
    extend_instance_ttl(env);
}

/// Allocate the next token id, starting at 1.
pub fn next_token_id(env: &Env) -> Result<u32, Error> {
    let current: u32 = env
        .storage()
        .instance()
        .get(&DataKey::TokenCounter)
        .unwrap_or(0);
    let next = current.checked_add(1).ok_or(Error::Overflow)?;
    env.storage().instance().set(&DataKey::TokenCounter, &next);
    extend_instance_ttl(env);
    Ok(next)
}

// ==================== Pools ====================

pub fn get_pool(env: &Env, pool_id: u64) -> Result<Pool, Error> {
    read(env, &DataKey::Pool(pool_id)).ok_or(Error::NotFound)
}

pub fn set_pool(env: &Env, pool: &Pool) {
    write(env, &DataKey::Pool(pool.id), pool);
}

pub fn get_role_members(env: &Env, pool_id: u64, role: Role) -> Vec<Address> {
    read(env, &DataKey::Role(pool_id, role)).unwrap_or(Vec::new(env))
}

pub fn set_role_members(env: &Env, pool_id: u64, role: Role, members: &Vec<Address>) {
    write(env, &DataKey::Role(pool_id, role), members);
}

pub fn get_treasury(env: &Env, pool_id: u64, asset: &Address) -> Amount {
    read(env, &DataKey::Treasury(pool_id, asset.clone())).unwrap_or(0)
}

pub fn set_treasury(env: &Env, pool_id: u64, asset: &Address, amount: Amount) {
    write(env, &DataKey::Treasury(pool_id, asset.clone()), &amount);
}

pub fn get_collected_fees(env: &Env, asset: &Address) -> Amount {
    read(env, &DataKey::CollectedFees(asset.clone())).unwrap_or(0)
}

pub fn set_collected_fees(env: &Env, asset: &Address, amount: Amount) {
    write(env, &DataKey::CollectedFees(asset.clone()), &amount);
}

pub fn get_pool_tokens(env: &Env, pool_id: u64) -> Vec<u32> {
    read(env, &DataKey::PoolTokens(pool_id)).unwrap_or(Vec::new(env))
}

pub fn add_pool_token(env: &Env, pool_id: u64, token_id: u32) {
    let mut tokens = get_pool_tokens(env, pool_id);
    tokens.push_back(token_id);
    write(env, &DataKey::PoolTokens(pool_id), &tokens);
}

// ==================== Token ledger ====================

pub fn get_token(env: &Env, token_id: u32) -> Result<TokenInfo, Error> {
    read(env, &DataKey::Token(token_id)).ok_or(Error::NotFound)
}

pub fn set_token(env: &Env, token: &TokenInfo) {
    write(env, &DataKey::Token(token.id), token);
}

pub fn get_account(env: &Env, token_id: u32, holder: &Address) -> Account {
    read(env, &DataKey::Account(token_id, holder.clone())).unwrap_or(Account {
        balance: 0,
        lock_rounds: Vec::new(env),
    })
}

pub fn set_account(env: &Env, token_id: u32, holder: &Address, account: &Account) {
    write(env, &DataKey::Account(token_id, holder.clone()), account);
}

pub fn get_round_lock(env: &Env, round_id: u64, holder: &Address) -> Amount {
    read(env, &DataKey::RoundLock(round_id, holder.clone())).unwrap_or(0)
}

/// Store the amount `holder` has locked under `round_id`; zero removes the entry.
pub fn set_round_lock(env: &Env, round_id: u64, holder: &Address, amount: Amount) {
    let key = DataKey::RoundLock(round_id, holder.clone());
    if amount == 0 {
        env.storage().persistent().remove(&key);
    } else {
        write(env, &key, &amount);
    }
}

pub fn is_lock_released(env: &Env, round_id: u64) -> bool {
    read(env, &DataKey::LockReleased(round_id)).unwrap_or(false)
}

pub fn set_lock_released(env: &Env, round_id: u64) {
    write(env, &DataKey::LockReleased(round_id), &true);
}

pub fn get_delegate(env: &Env, token_id: u32, holder: &Address) -> Option<Address> {
    read(env, &DataKey::Delegate(token_id, holder.clone()))
}

pub fn set_delegate(env: &Env, token_id: u32, holder: &Address, delegatee: &Address) {
    write(env, &DataKey::Delegate(token_id, holder.clone()), delegatee);
}

/// A checkpoint history, stored one entry per index next to its length.
#[derive(Clone)]
pub enum History {
    Votes(u32, Address),
    Supply(u32),
}

impl History {
    fn count_key(&self) -> DataKey {
        match self {
            History::Votes(token_id, holder) => {
                DataKey::VoteCheckpointCount(*token_id, holder.clone())
            }
            History::Supply(token_id) => DataKey::SupplyCheckpointCount(*token_id),
        }
    }

    fn entry_key(&self, index: u32) -> DataKey {
        match self {
            History::Votes(token_id, holder) => {
                DataKey::VoteCheckpoint(*token_id, holder.clone(), index)
            }
            History::Supply(token_id) => DataKey::SupplyCheckpoint(*token_id, index),
        }
    }
}

pub fn get_checkpoint_count(env: &Env, history: &History) -> u32 {
    read(env, &history.count_key()).unwrap_or(0)
}

pub fn set_checkpoint_count(env: &Env, history: &History, count: u32) {
    write(env, &history.count_key(), &count);
}

pub fn get_checkpoint(env: &Env, history: &History, index: u32) -> Option<Checkpoint> {
    read(env, &history.entry_key(index))
}

pub fn set_checkpoint(env: &Env, history: &History, index: u32, checkpoint: &Checkpoint) {
    write(env, &history.entry_key(index), checkpoint);
}

pub fn get_token_rounds(env: &Env, token_id: u32) -> Vec<u64> {
    read(env, &DataKey::TokenRounds(token_id)).unwrap_or(Vec::new(env))
}

pub fn add_token_round(env: &Env, token_id: u32, round_id: u64) {
    let mut rounds = get_token_rounds(env, token_id);
    rounds.push_back(round_id);
    write(env, &DataKey::TokenRounds(token_id), &rounds);
}

// ==================== Rounds ====================

pub fn get_round(env: &Env, round_id: u64) -> Result<Round, Error> {
    read(env, &DataKey::Round(round_id)).ok_or(Error::NotFound)
}

pub fn set_round(env: &Env, round: &Round) {
    write(env, &DataKey::Round(round.id), round);
}

/// Latest minting round created for a token, whatever its state.
pub fn get_active_round(env: &Env, token_id: u32) -> Option<u64> {
    read(env, &DataKey::ActiveRound(token_id))
}

pub fn set_active_round(env: &Env, token_id: u32, round_id: u64) {
    write(env, &DataKey::ActiveRound(token_id), &round_id);
}

/// Latest peer round a seller opened on a token, whatever its state.
pub fn get_peer_round(env: &Env, token_id: u32, seller: &Address) -> Option<u64> {
    read(env, &DataKey::PeerRound(token_id, seller.clone()))
}

pub fn set_peer_round(env: &Env, token_id: u32, seller: &Address, round_id: u64) {
    write(env, &DataKey::PeerRound(token_id, seller.clone()), &round_id);
}

pub fn get_purchase(env: &Env, round_id: u64, buyer: &Address) -> Purchase {
    read(env, &DataKey::Purchase(round_id, buyer.clone())).unwrap_or_default()
}

pub fn set_purchase(env: &Env, round_id: u64, buyer: &Address, purchase: &Purchase) {
    write(env, &DataKey::Purchase(round_id, buyer.clone()), purchase);
}

pub fn get_vesting_entry(env: &Env, round_id: u64, account: &Address) -> VestingEntry {
    read(env, &DataKey::Vesting(round_id, account.clone())).unwrap_or_default()
}

pub fn set_vesting_entry(env: &Env, round_id: u64, account: &Address, entry: &VestingEntry) {
    write(env, &DataKey::Vesting(round_id, account.clone()), entry);
}

// ==================== Proposals ====================

pub fn get_proposal(env: &Env, pool_id: u64, proposal_id: u32) -> Result<Proposal, Error> {
    read(env, &DataKey::Proposal(pool_id, proposal_id)).ok_or(Error::NotFound)
}

pub fn set_proposal(env: &Env, proposal: &Proposal) {
    write(env, &DataKey::Proposal(proposal.pool_id, proposal.id), proposal);
}

pub fn get_ballot(env: &Env, pool_id: u64, proposal_id: u32, voter: &Address) -> Ballot {
    read(env, &DataKey::Ballot(pool_id, proposal_id, voter.clone())).unwrap_or_default()
}

pub fn set_ballot(env: &Env, pool_id: u64, proposal_id: u32, voter: &Address, ballot: &Ballot) {
    write(env, &DataKey::Ballot(pool_id, proposal_id, voter.clone()), ballot);
}

/// Latest proposal created in a mutually exclusive class.
pub fn get_class_proposal(env: &Env, pool_id: u64, class: u32) -> Option<u32> {
    read(env, &DataKey::ClassProposal(pool_id, class))
}

pub fn set_class_proposal(env: &Env, pool_id: u64, class: u32, proposal_id: u32) {
    write(env, &DataKey::ClassProposal(pool_id, class), &proposal_id);
}

// ==================== TTL management ====================

fn read<V>(env: &Env, key: &DataKey) -> Option<V>
where
    V: soroban_sdk::TryFromVal<Env, soroban_sdk::Val>,
{
    let result = env.storage().persistent().get(key);
    if result.is_some() {
        extend_persistent_ttl(env, key);
    }
    result
}

fn write<V>(env: &Env, key: &DataKey, value: &V)
where
    V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.storage().persistent().set(key, value);
    extend_persistent_ttl(env, key);
}

fn extend_instance_ttl(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND);
}

fn extend_persistent_ttl(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_TTL_THRESHOLD, PERSISTENT_TTL_EXTEND);
}
