use common::types::MarketId;
use common::utils::{mul_div, FIXED_POINT_SCALE};
use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::json_types::{U128, U64};
use near_sdk::serde::{Deserialize, Serialize};
use near_sdk::{AccountId, Balance};

use crate::utils::gas;

/// Largest precision representable in a u128 amount.
const MAX_CURRENCY_DECIMALS: u8 = 38;

/// Provider parameters forwarded with every randomness request.
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct RandomnessConfig {
    /// Blocks the provider waits before the value may be fulfilled.
    pub min_confirmations: u16,
    /// Gas the provider attaches to `on_randomness_delivered`.
    pub callback_gas: U64,
}

/// Market parameters. Fixed at construction, never mutated.
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct MarketConfig {
    pub market_id: U128,
    pub liquidity_pool: AccountId,
    pub randomness_provider: AccountId,
    /// NEP-141 token used for tickets, payouts and pool reconciliation.
    pub settlement_token: AccountId,
    pub currency_decimals: u8,
    pub jackpot: U128,
    pub ticket_cost: U128,
    /// Fixed point with `FIXED_POINT_SCALE` as 100%.
    pub fee_rate: U128,
    pub randomness: RandomnessConfig,
}

impl MarketConfig {
    pub fn assert_valid(&self) {
        assert!(self.ticket_cost.0 > 0, "Ticket cost must be positive");
        assert!(
            self.jackpot.0 >= self.ticket_cost.0,
            "Jackpot {} must not be lower than the ticket cost {}", self.jackpot.0, self.ticket_cost.0
        );
        assert!(self.currency_decimals <= MAX_CURRENCY_DECIMALS, "Currency decimals must not exceed {}", MAX_CURRENCY_DECIMALS);
        assert!(
            self.randomness.callback_gas.0 >= gas::MIN_SETTLEMENT_CALLBACK.0,
            "Randomness callback gas must be at least {}", gas::MIN_SETTLEMENT_CALLBACK.0
        );
        assert!(
            bucket_count(self.jackpot.0, self.ticket_cost.0, self.fee_rate.0).is_some(),
            "Fee rate {} overflows the bucket count", self.fee_rate.0
        );
    }

    pub fn market_id(&self) -> MarketId {
        self.market_id.0
    }

    pub fn jackpot(&self) -> Balance {
        self.jackpot.0
    }

    pub fn ticket_cost(&self) -> Balance {
        self.ticket_cost.0
    }
}

/// `base + floor(base * fee_rate / scale)` where `base = floor(jackpot / ticket_cost)`.
pub fn bucket_count(jackpot: Balance, ticket_cost: Balance, fee_rate: u128) -> Option<u128> {
    if ticket_cost == 0 {
        return None;
    }

    let base_buckets = jackpot / ticket_cost;
    let fee_buckets = mul_div(base_buckets, fee_rate, FIXED_POINT_SCALE)?;
    let total = base_buckets.checked_add(fee_buckets)?;

    if total == 0 {
        return None;
    }
    Some(total)
}
