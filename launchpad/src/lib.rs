#![no_std]

#[cfg(test)]
extern crate std;

use shared::{
    errors::Error,
    events::*,
    types::{
        Amount, Ballot, BlockNumber, GovernanceSettings, PeerRoundParams, Pool, Proposal,
        ProposalAction, ProposalState, ProtocolConfig, Purchase, Role, Round, RoundParams,
        RoundState, RoundTarget, TokenInfo, TokenSpec, VestingEntry,
    },
    MAX_PROTOCOL_FEE,
};
use soroban_sdk::{
    contract, contractimpl, symbol_short, token::TokenClient, Address, Env, String, Vec,
};
use soroban_token_sdk::metadata::TokenMetadata;

mod checkpoints;
mod governor;
mod pool;
mod registry;
mod round;
mod storage;
mod token;
mod validation;
mod vesting;

#[cfg(test)]
mod tests;

use storage::*;
use validation::require_not_paused;

#[contract]
pub struct LaunchpadContract;

fn require_admin(env: &Env, admin: &Address) -> Result<(), Error> {
    if get_admin(env)? != *admin {
        return Err(Error::Unauthorized);
    }
    admin.require_auth();
    Ok(())
}

#[contractimpl]
impl LaunchpadContract {
    // ---------- Protocol administration ----------

    /// Initialize the protocol configuration
    ///
    /// # Arguments
    /// * `admin` - Protocol administrator
    /// * `registry` - Directory contract issuing global ids and the unit-of-account allow-list
    /// * `protocol_treasury` - Receiver of protocol fee tokens
    /// * `protocol_fee` - Fee in ppm taken from every minting round
    pub fn initialize(
        env: Env,
        admin: Address,
        registry: Address,
        protocol_treasury: Address,
        protocol_fee: u32,
    ) -> Result<(), Error> {
        if has_admin(&env) {
            return Err(Error::AlreadyInit);
        }
        admin.require_auth();
        if protocol_fee > MAX_PROTOCOL_FEE {
            return Err(Error::InvInput);
        }

        set_admin(&env, &admin);
        storage::set_registry(&env, &registry);
        storage::set_protocol_treasury(&env, &protocol_treasury);
        storage::set_protocol_fee(&env, protocol_fee);
        set_paused(&env, false);

        env.events()
            .publish((INITIALIZED,), (admin, registry, protocol_treasury, protocol_fee));
        Ok(())
    }

    pub fn set_protocol_treasury(env: Env, admin: Address, treasury: Address) -> Result<(), Error> {
        require_admin(&env, &admin)?;
        storage::set_protocol_treasury(&env, &treasury);
        env.events()
            .publish((CONFIG_UPDATED, symbol_short!("treasury")), treasury);
        Ok(())
    }

    /// Change the fee applied to rounds created from now on
    pub fn set_protocol_fee(env: Env, admin: Address, fee: u32) -> Result<(), Error> {
        require_admin(&env, &admin)?;
        if fee > MAX_PROTOCOL_FEE {
            return Err(Error::InvInput);
        }
        storage::set_protocol_fee(&env, fee);
        env.events().publish((CONFIG_UPDATED, symbol_short!("fee")), fee);
        Ok(())
    }

    pub fn set_registry(env: Env, admin: Address, registry: Address) -> Result<(), Error> {
        require_admin(&env, &admin)?;
        storage::set_registry(&env, &registry);
        env.events()
            .publish((CONFIG_UPDATED, symbol_short!("registry")), registry);
        Ok(())
    }

    /// Pause purchases, creations, proposals and votes
    pub fn pause(env: Env, admin: Address) -> Result<(), Error> {
        require_admin(&env, &admin)?;
        set_paused(&env, true);
        env.events()
            .publish((CONTRACT_PAUSED,), (admin, env.ledger().sequence()));
        Ok(())
    }

    pub fn unpause(env: Env, admin: Address) -> Result<(), Error> {
        require_admin(&env, &admin)?;
        set_paused(&env, false);
        env.events()
            .publish((CONTRACT_RESUMED,), (admin, env.ledger().sequence()));
        Ok(())
    }

    /// Withdraw the protocol's share of round proceeds in `asset`
    ///
    /// # Arguments
    /// * `admin` - Must be the protocol admin
    /// * `asset` - Unit of account the fees were collected in
    /// * `to` - Receiver of the withdrawn fees
    pub fn transfer_collected_fees(
        env: Env,
        admin: Address,
        asset: Address,
        to: Address,
    ) -> Result<Amount, Error> {
        require_admin(&env, &admin)?;

        let amount = get_collected_fees(&env, &asset);
        set_collected_fees(&env, &asset, 0);
        if amount > 0 {
            TokenClient::new(&env, &asset).transfer(&env.current_contract_address(), &to, &amount);
        }

        env.events().publish((FEES_WITHDRAWN,), (asset, to, amount));
        Ok(amount)
    }

    pub fn protocol_config(env: Env) -> Result<ProtocolConfig, Error> {
        Ok(ProtocolConfig {
            admin: get_admin(&env)?,
            registry: get_registry(&env)?,
            treasury: get_protocol_treasury(&env)?,
            fee: get_protocol_fee(&env),
        })
    }

    pub fn collected_fees(env: Env, asset: Address) -> Amount {
        get_collected_fees(&env, &asset)
    }

    pub fn is_paused(env: Env) -> bool {
        storage::is_paused(&env)
    }

    // ---------- Pools ----------

    /// Create an organization
    ///
    /// # Arguments
    /// * `owner` - Creator, allowed to open the primary round
    /// * `name` - Display name
    /// * `settings` - Initial governance settings
    pub fn create_pool(
        env: Env,
        owner: Address,
        name: String,
        settings: GovernanceSettings,
    ) -> Result<u64, Error> {
        require_not_paused(&env)?;
        owner.require_auth();
        pool::create(&env, &owner, name, settings)
    }

    pub fn get_pool(env: Env, pool_id: u64) -> Result<Pool, Error> {
        pool::view(&env, pool_id)
    }

    pub fn get_role_members(env: Env, pool_id: u64, role: Role) -> Vec<Address> {
        storage::get_role_members(&env, pool_id, role)
    }

    pub fn pool_tokens(env: Env, pool_id: u64) -> Vec<u32> {
        get_pool_tokens(&env, pool_id)
    }

    /// Move `amount` of `asset` from `from` into the pool treasury
    pub fn deposit_treasury(
        env: Env,
        pool_id: u64,
        from: Address,
        asset: Address,
        amount: Amount,
    ) -> Result<(), Error> {
        from.require_auth();
        pool::deposit(&env, pool_id, &from, &asset, amount)
    }

    pub fn treasury_balance(env: Env, pool_id: u64, asset: Address) -> Amount {
        get_treasury(&env, pool_id, &asset)
    }

    // ---------- Token ledger ----------

    /// Transfer unlocked tokens
    ///
    /// # Errors
    /// * `InsufficientUnlocked` - `amount` exceeds the sender's unlocked balance
    pub fn transfer(
        env: Env,
        token_id: u32,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), Error> {
        from.require_auth();
        token::transfer(&env, token_id, &from, &to, amount)
    }

    pub fn burn(env: Env, token_id: u32, from: Address, amount: Amount) -> Result<(), Error> {
        from.require_auth();
        token::burn(&env, token_id, &from, amount)
    }

    /// Delegate the holder's governance votes. Takes effect in the current block.
    pub fn delegate(
        env: Env,
        token_id: u32,
        holder: Address,
        delegatee: Address,
    ) -> Result<(), Error> {
        holder.require_auth();
        token::delegate(&env, token_id, &holder, &delegatee)
    }

    pub fn balance(env: Env, token_id: u32, holder: Address) -> Amount {
        token::balance(&env, token_id, &holder)
    }

    pub fn locked_balance(env: Env, token_id: u32, holder: Address) -> Result<Amount, Error> {
        token::locked(&env, token_id, &holder)
    }

    pub fn unlocked_balance(env: Env, token_id: u32, holder: Address) -> Result<Amount, Error> {
        token::unlocked(&env, token_id, &holder)
    }

    pub fn votes(env: Env, token_id: u32, account: Address) -> Amount {
        token::votes(&env, token_id, &account)
    }

    pub fn votes_at(env: Env, token_id: u32, account: Address, block: BlockNumber) -> Amount {
        token::votes_at(&env, token_id, &account, block)
    }

    pub fn delegates(env: Env, token_id: u32, holder: Address) -> Address {
        token::delegates(&env, token_id, &holder)
    }

    pub fn total_supply(env: Env, token_id: u32) -> Result<Amount, Error> {
        Ok(get_token(&env, token_id)?.supply)
    }

    pub fn supply_at(env: Env, token_id: u32, block: BlockNumber) -> Amount {
        token::supply_at(&env, token_id, block)
    }

    pub fn token_info(env: Env, token_id: u32) -> Result<TokenInfo, Error> {
        get_token(&env, token_id)
    }

    pub fn token_metadata(env: Env, token_id: u32) -> Result<TokenMetadata, Error> {
        token::metadata(&env, token_id)
    }

    pub fn token_rounds(env: Env, token_id: u32) -> Vec<u64> {
        get_token_rounds(&env, token_id)
    }

    // ---------- Rounds ----------

    /// Open the primary round of a pool, issuing its governance token
    ///
    /// # Arguments
    /// * `pool_id` - Pool identifier
    /// * `owner` - Must be the pool owner
    /// * `token` - Governance token metadata and cap
    /// * `params` - Sale parameters
    pub fn create_primary_round(
        env: Env,
        pool_id: u64,
        owner: Address,
        token: TokenSpec,
        params: RoundParams,
    ) -> Result<u64, Error> {
        require_not_paused(&env)?;
        if storage::get_pool(&env, pool_id)?.owner != owner {
            return Err(Error::Unauthorized);
        }
        owner.require_auth();
        round::create_primary(&env, pool_id, &token, params)
    }

    /// Open a minting round on an existing token of a DAO
    ///
    /// # Arguments
    /// * `pool_id` - Pool identifier
    /// * `caller` - Pool owner or executor
    /// * `token_id` - Governance token or preference series of the pool
    /// * `params` - Sale parameters
    pub fn create_secondary_round(
        env: Env,
        pool_id: u64,
        caller: Address,
        token_id: u32,
        params: RoundParams,
    ) -> Result<u64, Error> {
        require_not_paused(&env)?;
        caller.require_auth();
        let org = pool::load(&env, pool_id)?;
        pool::require_operator(&env, &org, &caller)?;
        let target = round::target_for_token(&env, &org, token_id)?;
        round::create_for_target(&env, &org, &target, params)
    }

    /// Issue a new preference series for a DAO and open its first round
    pub fn create_preference_round(
        env: Env,
        pool_id: u64,
        caller: Address,
        token: TokenSpec,
        params: RoundParams,
    ) -> Result<u64, Error> {
        require_not_paused(&env)?;
        caller.require_auth();
        let org = pool::load(&env, pool_id)?;
        pool::require_operator(&env, &org, &caller)?;
        round::create_for_target(&env, &org, &RoundTarget::NewPreference(token), params)
    }

    /// Sell part of the seller's own unlocked balance
    ///
    /// # Arguments
    /// * `seller` - Holder initiating the round; `params.amount` moves into the contract
    /// * `token_id` - Token being sold
    /// * `params` - Sale parameters
    pub fn create_peer_round(
        env: Env,
        seller: Address,
        token_id: u32,
        params: PeerRoundParams,
    ) -> Result<u64, Error> {
        require_not_paused(&env)?;
        seller.require_auth();
        round::create_peer(&env, &seller, token_id, params)
    }

    /// Buy `amount` tokens paying exactly `amount * price` in the unit of account
    ///
    /// # Errors
    /// * `WrongState` - The round is not active
    /// * `InvalidPurchaseAmount` - Below the minimum, above the buyer's maximum or the hardcap
    /// * `NotWhitelisted` - The round has a whitelist without the buyer
    /// * `IncorrectPayment` - `payment` differs from the price of `amount`
    pub fn purchase(
        env: Env,
        round_id: u64,
        buyer: Address,
        amount: Amount,
        payment: Amount,
    ) -> Result<(), Error> {
        require_not_paused(&env)?;
        buyer.require_auth();
        round::purchase(&env, round_id, &buyer, amount, payment)
    }

    /// Record an allocation paid outside the contract
    pub fn external_purchase(
        env: Env,
        round_id: u64,
        operator: Address,
        beneficiary: Address,
        amount: Amount,
    ) -> Result<(), Error> {
        require_not_paused(&env)?;
        operator.require_auth();
        round::external_purchase(&env, round_id, &operator, &beneficiary, amount)
    }

    /// Refund a purchaser of a failed round; returns the refunded payment
    pub fn redeem(env: Env, round_id: u64, account: Address) -> Result<Amount, Error> {
        account.require_auth();
        round::redeem(&env, round_id, &account)
    }

    pub fn set_lockup_tvl_reached(env: Env, round_id: u64) -> Result<(), Error> {
        round::set_lockup_tvl_reached(&env, round_id)
    }

    /// Release the proceeds of a successful round to the pool treasury
    pub fn transfer_funds(env: Env, round_id: u64) -> Result<(), Error> {
        round::transfer_funds(&env, round_id)
    }

    /// Settle a peer round with its seller; the seller may close it before its end
    pub fn finish_peer_round(env: Env, round_id: u64, caller: Address) -> Result<(), Error> {
        caller.require_auth();
        round::finish_peer(&env, round_id, &caller)
    }

    pub fn get_round(env: Env, round_id: u64) -> Result<Round, Error> {
        round::view(&env, round_id)
    }

    pub fn round_state(env: Env, round_id: u64) -> Result<RoundState, Error> {
        Ok(round::view(&env, round_id)?.state)
    }

    pub fn purchase_of(env: Env, round_id: u64, account: Address) -> Purchase {
        storage::get_purchase(&env, round_id, &account)
    }

    pub fn redeemable_balance_of(env: Env, round_id: u64, account: Address) -> Result<Amount, Error> {
        round::redeemable_balance_of(&env, round_id, &account)
    }

    // ---------- Vesting ----------

    pub fn set_claim_tvl_reached(env: Env, round_id: u64) -> Result<(), Error> {
        vesting::set_claim_tvl_reached(&env, round_id)
    }

    /// Mint the vested tokens released since the last claim
    ///
    /// # Errors
    /// * `ClaimNotAvailable` - Nothing new is released, or claiming is still locked
    pub fn claim(env: Env, round_id: u64, account: Address) -> Result<Amount, Error> {
        account.require_auth();
        vesting::claim(&env, round_id, &account)
    }

    /// Forfeit the unclaimed allocation of `account`
    ///
    /// # Arguments
    /// * `resolver` - One of the round's resolvers
    pub fn cancel_vesting(
        env: Env,
        round_id: u64,
        resolver: Address,
        account: Address,
    ) -> Result<Amount, Error> {
        resolver.require_auth();
        vesting::cancel(&env, round_id, &resolver, &account)
    }

    pub fn vesting_entry(env: Env, round_id: u64, account: Address) -> VestingEntry {
        storage::get_vesting_entry(&env, round_id, &account)
    }

    pub fn vested(env: Env, round_id: u64, account: Address) -> Result<Amount, Error> {
        vesting::vested(&env, round_id, &account)
    }

    pub fn claimable(env: Env, round_id: u64, account: Address) -> Result<Amount, Error> {
        vesting::claimable(&env, round_id, &account)
    }

    // ---------- Governance ----------

    /// Submit a proposal to a DAO
    ///
    /// # Arguments
    /// * `pool_id` - Pool identifier
    /// * `proposer` - Needs `proposal_threshold` of the supply in votes at the previous block
    /// * `action` - Effect applied on execution
    /// * `description` - Free-form text
    /// * `meta_hash` - Hash of off-chain metadata
    pub fn create_proposal(
        env: Env,
        pool_id: u64,
        proposer: Address,
        action: ProposalAction,
        description: String,
        meta_hash: String,
    ) -> Result<u32, Error> {
        require_not_paused(&env)?;
        proposer.require_auth();
        governor::create(&env, pool_id, &proposer, action, description, meta_hash)
    }

    /// Vote with the checkpointed weight from the block before voting opened
    pub fn cast_vote(
        env: Env,
        pool_id: u64,
        proposal_id: u32,
        voter: Address,
        support: bool,
    ) -> Result<Amount, Error> {
        require_not_paused(&env)?;
        voter.require_auth();
        governor::cast_vote(&env, pool_id, proposal_id, &voter, support)
    }

    /// Apply an accepted proposal once its execution delay has passed
    pub fn execute_proposal(
        env: Env,
        pool_id: u64,
        proposal_id: u32,
        caller: Address,
    ) -> Result<(), Error> {
        require_not_paused(&env)?;
        caller.require_auth();
        governor::execute(&env, pool_id, proposal_id, &caller)
    }

    pub fn cancel_proposal(
        env: Env,
        pool_id: u64,
        proposal_id: u32,
        caller: Address,
    ) -> Result<(), Error> {
        caller.require_auth();
        governor::cancel(&env, pool_id, proposal_id, &caller)
    }

    pub fn get_proposal(env: Env, pool_id: u64, proposal_id: u32) -> Result<Proposal, Error> {
        storage::get_proposal(&env, pool_id, proposal_id)
    }

    pub fn proposal_state(env: Env, pool_id: u64, proposal_id: u32) -> Result<ProposalState, Error> {
        governor::state_of(&env, &storage::get_proposal(&env, pool_id, proposal_id)?)
    }

    pub fn get_ballot(env: Env, pool_id: u64, proposal_id: u32, voter: Address) -> Ballot {
        storage::get_ballot(&env, pool_id, proposal_id, &voter)
    }

    pub fn available_votes(
        env: Env,
        pool_id: u64,
        proposal_id: u32,
        voter: Address,
    ) -> Result<Amount, Error> {
        governor::available_votes(&env, pool_id, proposal_id, &voter)
    }
}
