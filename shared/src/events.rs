use soroban_sdk::{symbol_short, Symbol};

// Protocol
pub const INITIALIZED: Symbol = symbol_short!("init");
pub const CONFIG_UPDATED: Symbol = symbol_short!("cfg_upd");
pub const CONTRACT_PAUSED: Symbol = symbol_short!("paused");
pub const CONTRACT_RESUMED: Symbol = symbol_short!("resumed");
pub const FEES_WITHDRAWN: Symbol = symbol_short!("fee_out");

// Pools
pub const POOL_CREATED: Symbol = symbol_short!("pool_new");
pub const TREASURY_DEPOSIT: Symbol = symbol_short!("tr_dep");
pub const SETTINGS_UPDATED: Symbol = symbol_short!("set_upd");
pub const ROLES_UPDATED: Symbol = symbol_short!("role_upd");

// Ledger
pub const TOKEN_CREATED: Symbol = symbol_short!("tok_new");
pub const MINT: Symbol = symbol_short!("mint");
pub const BURN: Symbol = symbol_short!("burn");
pub const TRANSFER: Symbol = symbol_short!("transfer");
pub const DELEGATE_CHANGED: Symbol = symbol_short!("del_chg");
pub const LOCK_RELEASED: Symbol = symbol_short!("unlock");

// Rounds
pub const ROUND_CREATED: Symbol = symbol_short!("rnd_new");
pub const PURCHASE: Symbol = symbol_short!("purchase");
pub const EXTERNAL_PURCHASE: Symbol = symbol_short!("ext_buy");
pub const REDEEM: Symbol = symbol_short!("redeem");
pub const FUNDS_TRANSFERRED: Symbol = symbol_short!("funds_out");
pub const ROUND_FINISHED: Symbol = symbol_short!("rnd_end");

// Vesting
pub const CLAIM_UNLOCKED: Symbol = symbol_short!("claim_tvl");
pub const CLAIM: Symbol = symbol_short!("claim");
pub const VESTING_CANCELLED: Symbol = symbol_short!("v_cancel");

// Governance
pub const PROPOSAL_CREATED: Symbol = symbol_short!("prop_new");
pub const VOTE_CAST: Symbol = symbol_short!("vote");
pub const PROPOSAL_ACCEPTED: Symbol = symbol_short!("prop_acc");
pub const PROPOSAL_REJECTED: Symbol = symbol_short!("prop_rej");
pub const PROPOSAL_EXECUTED: Symbol = symbol_short!("prop_exec");
pub const PROPOSAL_CANCELLED: Symbol = symbol_short!("prop_can");
