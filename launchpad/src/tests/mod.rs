#![cfg(test)]

use shared::{
    types::{GovernanceSettings, RecordKind, RoundParams, TokenSpec, VestingParams},
    DEFAULT_PROTOCOL_FEE,
};
use soroban_sdk::{
    contract, contractimpl, contracttype,
    testutils::{Address as _, Ledger},
    token::{StellarAssetClient, TokenClient},
    vec, Address, Env, String, Vec,
};

use crate::{LaunchpadContract, LaunchpadContractClient};

mod token;
mod vesting;

/// One whole token or unit of account (7 decimals).
pub const UNIT: i128 = 10_000_000;
/// 0.01 unit of account per token.
pub const CENT_PRICE: i128 = 100_000;
pub const START: u32 = 100;

// ==================== Registry stand-in ====================

#[contracttype]
enum RegistryKey {
    Counter,
    Allowed(Address),
}

#[contract]
pub struct MockRegistry;

#[contractimpl]
impl MockRegistry {
    pub fn add_record(env: Env, _kind: RecordKind, _pool_id: u64) -> u64 {
        Self::next_id(&env)
    }

    pub fn add_proposal(env: Env, _pool_id: u64, _proposal_id: u32) -> u64 {
        Self::next_id(&env)
    }

    pub fn is_token_allowed(env: Env, token: Address) -> bool {
        env.storage().instance().has(&RegistryKey::Allowed(token))
    }

    pub fn allow_token(env: Env, token: Address) {
        env.storage().instance().set(&RegistryKey::Allowed(token), &true);
    }
}

impl MockRegistry {
    fn next_id(env: &Env) -> u64 {
        let next: u64 = env
            .storage()
            .instance()
            .get(&RegistryKey::Counter)
            .unwrap_or(0)
            + 1;
        env.storage().instance().set(&RegistryKey::Counter, &next);
        next
    }
}

// ==================== Environment ====================

pub struct Setup {
    pub env: Env,
    pub client: LaunchpadContractClient<'static>,
    pub admin: Address,
    pub protocol_treasury: Address,
    pub registry: MockRegistryClient<'static>,
    pub usdc: Address,
}

impl Setup {
    pub fn new() -> Self {
        let env = Env::default();
        env.mock_all_auths();
        env.budget().reset_unlimited();
        env.ledger().with_mut(|li| li.sequence_number = START);

        let admin = Address::generate(&env);
        let protocol_treasury = Address::generate(&env);

        let registry_id = env.register_contract(None, MockRegistry);
        let registry = MockRegistryClient::new(&env, &registry_id);

        let usdc_admin = Address::generate(&env);
        let usdc = env.register_stellar_asset_contract_v2(usdc_admin).address();
        registry.allow_token(&usdc);

        let contract_id = env.register_contract(None, LaunchpadContract);
        let client = LaunchpadContractClient::new(&env, &contract_id);
        client.initialize(&admin, &registry_id, &protocol_treasury, &DEFAULT_PROTOCOL_FEE);

        Setup {
            env,
            client,
            admin,
            protocol_treasury,
            registry,
            usdc,
        }
    }

    pub fn now(&self) -> u32 {
        self.env.ledger().sequence()
    }

    pub fn advance(&self, blocks: u32) {
        self.env
            .ledger()
            .with_mut(|li| li.sequence_number += blocks);
    }

    /// A fresh account holding `amount` of the unit of account.
    pub fn funded_account(&self, amount: i128) -> Address {
        let account = Address::generate(&self.env);
        StellarAssetClient::new(&self.env, &self.usdc).mint(&account, &amount);
        account
    }

    pub fn usdc_balance(&self, account: &Address) -> i128 {
        TokenClient::new(&self.env, &self.usdc).balance(account)
    }

    pub fn settings(&self) -> GovernanceSettings {
        GovernanceSettings {
            proposal_threshold: 10_000,
            quorum_threshold: 400_000,
            decision_threshold: 500_000,
            voting_duration: 100,
            voting_start_delay: 0,
            transfer_value_for_delay: 0,
            execution_delays: vec![&self.env, 2u32, 2, 2, 2],
        }
    }

    pub fn create_pool(&self, owner: &Address) -> u64 {
        self.client.create_pool(
            owner,
            &String::from_str(&self.env, "Nova Collective"),
            &self.settings(),
        )
    }

    pub fn token_spec(&self, cap: i128) -> TokenSpec {
        TokenSpec {
            name: String::from_str(&self.env, "Nova Governance"),
            symbol: String::from_str(&self.env, "NOVA"),
            decimals: 7,
            cap,
        }
    }

    pub fn no_vesting(&self) -> VestingParams {
        VestingParams {
            vested_share: 0,
            cliff: 0,
            cliff_share: 0,
            spans: 0,
            span_duration: 0,
            span_share: 0,
            claim_tvl: 0,
            resolvers: Vec::new(&self.env),
        }
    }

    /// 100-block round at 0.01 per token with open admission.
    pub fn round_params(&self, softcap: i128, hardcap: i128) -> RoundParams {
        RoundParams {
            unit_of_account: self.usdc.clone(),
            price: CENT_PRICE,
            softcap,
            hardcap,
            min_purchase: 1,
            max_purchase: hardcap,
            duration: 100,
            lockup_duration: 0,
            lockup_tvl: 0,
            vesting: self.no_vesting(),
            whitelist: Vec::new(&self.env),
        }
    }

    /// Pool with an open primary round; returns (pool, round, token).
    pub fn primary(&self, owner: &Address, cap: i128, params: RoundParams) -> (u64, u64, u32) {
        let pool_id = self.create_pool(owner);
        let round_id = self
            .client
            .create_primary_round(&pool_id, owner, &self.token_spec(cap), &params);
        let token_id = self.client.get_round(&round_id).token;
        (pool_id, round_id, token_id)
    }

    /// Buy `amount` tokens at the round price with a freshly funded account.
    pub fn buyer(&self, round_id: u64, amount: i128) -> Address {
        let payment = self.price_of(round_id, amount);
        let buyer = self.funded_account(payment);
        self.client.purchase(&round_id, &buyer, &amount, &payment);
        buyer
    }

    pub fn price_of(&self, round_id: u64, amount: i128) -> i128 {
        amount * self.client.get_round(&round_id).params.price / shared::PRICE_SCALE
    }
}
