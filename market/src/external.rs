use common::types::{EpochId, MarketId};
use near_sdk::json_types::{U128, U64};
use near_sdk::serde_json::json;
use near_sdk::{ext_contract, AccountId, PromiseError, PromiseOrValue};

// Callback
#[ext_contract(this_contract)]
pub trait ExtSelf {
    fn on_capacity_checked(&mut self, buyer: AccountId, number: U128, epoch: U64, amount: U128, #[callback_result] withdrawable: Result<U128, PromiseError>) -> U128;
    fn on_randomness_requested(&mut self, caller: AccountId, request_id: U64, randomness_cost: U128, #[callback_result] result: Result<(), PromiseError>);
    fn on_shortfall_withdrawn(&mut self, request_id: U64, shortfall: U128, requested_at: U64, #[callback_result] result: Result<(), PromiseError>);
    fn on_payout_transferred(&mut self, winner: AccountId, amount: U128, #[callback_result] result: Result<(), PromiseError>);
    fn on_surplus_deposited(&mut self, epoch: U64, amount: U128, #[callback_result] used: Result<U128, PromiseError>);
}

#[ext_contract(ext_liquidity_pool)]
pub trait LiquidityPool {
    fn get_withdrawable_market_usd(&self, market_id: U128) -> U128;
    /// Moves `amount` of the settlement token to `target`, booked as debt of the market.
    fn withdraw_market_usd(&mut self, market_id: U128, target: AccountId, amount: U128);
}

#[ext_contract(ext_randomness)]
pub trait RandomnessProvider {
    fn request_random_value(&mut self, request_id: U64, min_confirmations: u16, callback_gas: U64, num_values: u32);
}

#[ext_contract(ext_fungible_token)]
pub trait FungibleTokenContract {
    fn ft_transfer(&mut self, receiver_id: AccountId, amount: U128, memo: Option<String>);

    fn ft_transfer_call(
        &mut self,
        receiver_id: AccountId,
        amount: U128,
        memo: Option<String>,
        msg: String,
    ) -> PromiseOrValue<U128>;
}

/// `ft_transfer_call` message the pool routes into the market's deposit account.
pub(crate) fn deposit_message(market_id: MarketId) -> String{
    json!({ "deposit_market_usd": { "market_id": U128(market_id) } }).to_string()
}

pub(crate) fn deposit_memo(epoch: EpochId) -> Option<String>{
    Some(format!("Surplus of epoch {}", epoch))
}
