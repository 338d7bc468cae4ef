/// Denominator for every share, threshold and fee expressed in parts per million.
pub const DENOMINATOR: u32 = 1_000_000;

/// Prices are unit-of-account amounts per whole token, scaled by 1e7.
pub const PRICE_SCALE: i128 = 10_000_000;

/// 1% protocol fee on every minting round.
pub const DEFAULT_PROTOCOL_FEE: u32 = 10_000;
/// 10% cap on the protocol fee.
pub const MAX_PROTOCOL_FEE: u32 = 100_000;

/// Number of proposal kinds; `GovernanceSettings::execution_delays` is indexed by kind.
pub const PROPOSAL_KINDS: u32 = 4;

pub const MAX_WHITELIST: u32 = 100;
pub const MAX_RESOLVERS: u32 = 10;
pub const MAX_RECIPIENTS: u32 = 20;
pub const MAX_ROLE_MEMBERS: u32 = 20;

// Storage TTL management, in ledgers
pub const INSTANCE_TTL_THRESHOLD: u32 = 17_280;
pub const INSTANCE_TTL_EXTEND: u32 = 518_400;
pub const PERSISTENT_TTL_THRESHOLD: u32 = 17_280;
pub const PERSISTENT_TTL_EXTEND: u32 = 518_400;
