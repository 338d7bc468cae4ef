use soroban_sdk::{contracttype, Address, String, Vec};

pub type Amount = i128;

/// Ledger sequence number, the only clock the contracts observe.
pub type BlockNumber = u32;

/// Kind of record registered with the directory.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum RecordKind {
    Pool = 0,
    Round = 1,
}

// ==================== Protocol ====================

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProtocolConfig {
    pub admin: Address,
    pub registry: Address,
    pub treasury: Address,
    /// Protocol fee in ppm of every minted purchase
    pub fee: u32,
}

// ==================== Organizations ====================

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GovernanceSettings {
    /// Share of supply (ppm) a proposer must hold at `now - 1`
    pub proposal_threshold: u32,
    /// Share of supply (ppm) that must take part in the vote
    pub quorum_threshold: u32,
    /// Share of cast votes (ppm) that must be in favour
    pub decision_threshold: u32,
    pub voting_duration: BlockNumber,
    pub voting_start_delay: BlockNumber,
    /// Transfer proposals moving less than this skip the execution delay
    pub transfer_value_for_delay: Amount,
    /// Execution delay per `ProposalKind`, indexed by the kind discriminant
    pub execution_delays: Vec<BlockNumber>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pool {
    pub id: u64,
    pub owner: Address,
    pub name: String,
    pub settings: GovernanceSettings,
    /// Set once the primary round is observed Successful
    pub is_dao: bool,
    pub governance_token: Option<u32>,
    pub primary_round: Option<u64>,
    pub proposal_count: u32,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Role {
    Executor = 0,
    Secretary = 1,
}

// ==================== Token ledger ====================

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum TokenKind {
    Governance = 0,
    Preference = 1,
}

/// Parameters for a token issued by the ledger.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenSpec {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub cap: Amount,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenInfo {
    pub id: u32,
    pub pool_id: u64,
    pub kind: TokenKind,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub cap: Amount,
    pub supply: Amount,
    /// Promised but not yet minted: unclaimed vesting and unminted protocol fee
    pub reserved: Amount,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Account {
    pub balance: Amount,
    /// Rounds that may still hold a lock on part of `balance`
    pub lock_rounds: Vec<u64>,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Checkpoint {
    pub block: BlockNumber,
    pub value: Amount,
}

// ==================== Rounds ====================

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum RoundState {
    Active = 0,
    Failed = 1,
    Successful = 2,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum RoundKind {
    Primary = 0,
    Secondary = 1,
    Peer = 2,
    MultiId = 3,
}

/// Per-account purchase limits; zero falls back to the round defaults.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Allocation {
    pub account: Address,
    pub min: Amount,
    pub max: Amount,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VestingParams {
    /// Share of each purchase (ppm) released through the schedule
    pub vested_share: u32,
    pub cliff: BlockNumber,
    /// Share of the vested total (ppm) released at the cliff
    pub cliff_share: u32,
    pub spans: u32,
    pub span_duration: BlockNumber,
    /// Share of the vested total (ppm) released after each span
    pub span_share: u32,
    pub claim_tvl: Amount,
    pub resolvers: Vec<Address>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoundParams {
    pub unit_of_account: Address,
    pub price: Amount,
    pub softcap: Amount,
    pub hardcap: Amount,
    pub min_purchase: Amount,
    pub max_purchase: Amount,
    pub duration: BlockNumber,
    pub lockup_duration: BlockNumber,
    pub lockup_tvl: Amount,
    pub vesting: VestingParams,
    pub whitelist: Vec<Allocation>,
}

/// A holder selling part of their own unlocked balance.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PeerRoundParams {
    pub amount: Amount,
    pub unit_of_account: Address,
    pub price: Amount,
    pub softcap: Amount,
    pub min_purchase: Amount,
    pub max_purchase: Amount,
    pub duration: BlockNumber,
    pub whitelist: Vec<Allocation>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Round {
    pub id: u64,
    pub pool_id: u64,
    pub token: u32,
    pub kind: RoundKind,
    /// Initiator of a peer round
    pub seller: Option<Address>,
    pub params: RoundParams,
    pub start_block: BlockNumber,
    pub end_block: BlockNumber,
    /// Block at which the hardcap was reached
    pub completed_at: Option<BlockNumber>,
    pub purchased: Amount,
    /// Part of `purchased` reserved for the vesting schedule
    pub vested: Amount,
    /// Total payment received
    pub raised: Amount,
    /// Payment still held by the contract
    pub escrow: Amount,
    /// Accrued protocol fee, in tokens
    pub protocol_fee: Amount,
    pub fee_rate: u32,
    pub state: RoundState,
    pub transfer_unlocked: bool,
    pub claim_unlocked: bool,
    pub funds_released: bool,
}

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Purchase {
    pub amount: Amount,
    pub paid: Amount,
    /// Protocol fee tokens reserved against this purchase
    pub fee: Amount,
    pub redeemed: bool,
}

// ==================== Vesting ====================

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VestingEntry {
    pub vested: Amount,
    pub claimed: Amount,
    pub resolved: Amount,
    pub cancelled: bool,
}

// ==================== Governance ====================

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ProposalKind {
    Transfer = 0,
    NewRound = 1,
    Settings = 2,
    Roles = 3,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TransferAction {
    pub asset: Address,
    pub recipients: Vec<Address>,
    pub amounts: Vec<Amount>,
}

/// Token a round proposed by governance sells.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RoundTarget {
    Governance,
    Preference(u32),
    NewPreference(TokenSpec),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewRoundAction {
    pub target: RoundTarget,
    pub params: RoundParams,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleChange {
    pub executors: Vec<Address>,
    pub secretaries: Vec<Address>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProposalAction {
    Transfer(TransferAction),
    NewRound(NewRoundAction),
    Settings(GovernanceSettings),
    Roles(RoleChange),
}

/// Stored execution state; `ProposalState` is derived from it and the block.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ExecutionState {
    Initialized = 0,
    Rejected = 1,
    Accepted = 2,
    Executed = 3,
    Cancelled = 4,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum ProposalState {
    Pending = 0,
    Active = 1,
    Rejected = 2,
    Accepted = 3,
    Executed = 4,
    Cancelled = 5,
}

/// Governance parameters snapshotted at proposal creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalCore {
    pub quorum_threshold: u32,
    pub decision_threshold: u32,
    pub execution_delay: BlockNumber,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalVote {
    pub start_block: BlockNumber,
    pub end_block: BlockNumber,
    pub for_votes: Amount,
    pub against_votes: Amount,
    /// Block at which acceptance first held, when decided before `end_block`
    pub accepted_at: Option<BlockNumber>,
    pub execution: ExecutionState,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Proposal {
    pub id: u32,
    pub pool_id: u64,
    pub global_id: u64,
    pub proposer: Address,
    pub kind: ProposalKind,
    pub action: ProposalAction,
    pub core: ProposalCore,
    pub vote: ProposalVote,
    pub description: String,
    pub meta_hash: String,
}

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Ballot {
    pub cast: bool,
    pub support: bool,
    pub weight: Amount,
}
