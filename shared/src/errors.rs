use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInit = 1,
    AlreadyInit = 2,
    Unauthorized = 3,
    InvInput = 4,
    NotFound = 5,
    Paused = 6,

    // Invariant errors: only reachable through an implementation bug
    Overflow = 10,
    InvariantViolation = 11,
    CapExceeded = 12,

    // Ledger errors
    InsufficientUnlocked = 20,
    NotGovernanceToken = 21,

    // Round admission errors
    InvalidPurchaseAmount = 30,
    IncorrectPayment = 31,
    NotWhitelisted = 32,
    TokenNotAllowed = 33,
    HardcapOverflow = 34,

    // Round state errors
    WrongState = 40,
    ActiveRoundExists = 41,
    GovernanceTokenExists = 42,
    AlreadyRedeemed = 43,
    NothingToRedeem = 44,
    LockupNotReached = 45,

    // Vesting errors
    ClaimNotAvailable = 50,

    // Governance errors
    ZeroVotes = 60,
    AlreadyVoted = 61,
    VotingNotActive = 62,
    ActiveProposalExists = 63,
    NotValidProposer = 64,
    NotDao = 65,
    InsufficientTreasury = 66,
    InvalidSettings = 67,
}
