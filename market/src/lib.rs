use common::generic_ring_buffer::{GenericRingBuffer, RingBuffer};
use common::types::{BucketKey, EpochId, RequestId};
use config::MarketConfig;
use coordinator::DrawState;
use errors::OrPanic;
use interfaces::ledger::TicketLedger;
use interfaces::market::{CollateralHost, MarketView};
use ledger::BucketLedger;
use near_contract_standards::fungible_token::receiver::FungibleTokenReceiver;
use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::collections::LookupMap;
use near_sdk::json_types::{U128, U64};
use near_sdk::{env, log, near_bindgen, AccountId, Balance, PanicOnDefault, PromiseError, PromiseOrValue};
use settlement::{DrawResult, PayoutCursor};
use utils::gas;
use utils::storage_keys::StorageKeys;
use utils::utils::{bucket_key, format_amount};

pub mod external;
pub use crate::external::*;

mod config;
mod coordinator;
mod errors;
mod events;
mod interfaces;
mod ledger;
mod settlement;
mod utils;
#[cfg(test)]
mod test_utils;

const DRAW_HISTORY_CAPACITY: usize = 16;

#[near_bindgen]
#[derive(BorshDeserialize, BorshSerialize, PanicOnDefault)]
pub struct Contract {
    config: MarketConfig,
    // derived once from the config
    bucket_count: u128,
    current_epoch: EpochId,
    next_request_id: RequestId,
    draw_state: DrawState,
    /// Settlement token the market holds for the next settlement.
    held_balance: Balance,
    ledger: BucketLedger,
    pending_requests: LookupMap<RequestId, EpochId>,
    unclaimed_winnings: LookupMap<AccountId, Balance>,
    /// Settled epochs whose winners are not all credited yet.
    undistributed: LookupMap<EpochId, PayoutCursor>,
    draw_history: GenericRingBuffer<DrawResult, EpochId, DRAW_HISTORY_CAPACITY>,
}

#[near_bindgen]
impl Contract {
    #[init]
    pub fn new(config: MarketConfig) -> Self {
        assert!(!env::state_exists(), "Already initialized");
        config.assert_valid();

        let bucket_count = config::bucket_count(config.jackpot(), config.ticket_cost(), config.fee_rate.0)
            .unwrap_or_else(|| env::panic_str("Invalid bucket count"));

        log!("Market {} opened with {} buckets", config.market_id(), bucket_count);

        Self {
            config,
            bucket_count,
            current_epoch: 0,
            next_request_id: 1,
            draw_state: DrawState::Idle,
            held_balance: 0,
            ledger: BucketLedger::default(),
            pending_requests: LookupMap::new(StorageKeys::PendingRequests),
            unclaimed_winnings: LookupMap::new(StorageKeys::UnclaimedWinnings),
            undistributed: LookupMap::new(StorageKeys::UndistributedWinners),
            draw_history: GenericRingBuffer::new(StorageKeys::DrawHistory),
        }
    }
}

#[near_bindgen]
impl FungibleTokenReceiver for Contract {
    /// Buys a ticket. `msg` is a `TicketRequest`, e.g. `{"number":"42"}`.
    fn ft_on_transfer(
        &mut self,
        sender_id: AccountId,
        amount: U128,
        msg: String,
    ) -> PromiseOrValue<U128> {
        let (buyer, number, epoch) = self
            .prepare_ticket(&env::predecessor_account_id(), sender_id, amount.0, &msg)
            .or_panic();

        let promise = ext_liquidity_pool::get_withdrawable_market_usd(
            U128(self.config.market_id()),
            self.config.liquidity_pool.clone(),
            0,
            gas::GET_WITHDRAWABLE,
        )
        .then(this_contract::on_capacity_checked(buyer, U128(number), U64(epoch), amount, env::current_account_id(), 0, gas::ON_CAPACITY_CHECKED));

        PromiseOrValue::Promise(promise)
    }
}

#[near_bindgen]
impl CollateralHost for Contract {
    /// Shortfalls are booked by the pool itself when it pays out.
    fn reported_debt(&self, _market_id: U128) -> U128 {
        U128(0)
    }

    /// All of the pool's liquidity is locked while a draw is in progress.
    fn locked_capacity(&self, _market_id: U128) -> U128 {
        if self.draw_state.is_drawing() {
            U128(u128::MAX)
        } else {
            U128(0)
        }
    }

    fn display_name(&self, _market_id: U128) -> String {
        format!(
            "Lotto Market ({} per ticket, {} jackpot)",
            format_amount(self.config.ticket_cost(), self.config.currency_decimals),
            format_amount(self.config.jackpot(), self.config.currency_decimals),
        )
    }
}

#[near_bindgen]
impl MarketView for Contract {
    fn get_config(&self) -> MarketConfig {
        self.config.clone()
    }

    fn get_jackpot(&self) -> U128 {
        self.config.jackpot
    }

    fn get_ticket_cost(&self) -> U128 {
        self.config.ticket_cost
    }

    fn get_fee_rate(&self) -> U128 {
        self.config.fee_rate
    }

    fn get_bucket_count(&self) -> U128 {
        U128(self.bucket_count)
    }

    fn get_current_epoch(&self) -> U64 {
        U64(self.current_epoch)
    }

    fn get_held_balance(&self) -> U128 {
        U128(self.held_balance)
    }

    fn get_draw_state(&self) -> DrawState {
        self.draw_state
    }

    fn is_drawing(&self) -> bool {
        self.draw_state.is_drawing()
    }

    fn get_request_epoch(&self, request_id: U64) -> Option<U64> {
        self.pending_requests.get(&request_id.0).map(U64)
    }

    fn get_bucket_participants(&self, epoch: U64, number: U128) -> Vec<AccountId> {
        self.ledger.participants(epoch.0, self.bucket_of(number.0))
    }

    fn get_bucket_size(&self, epoch: U64, number: U128) -> U64 {
        U64(self.ledger.bucket_len(epoch.0, self.bucket_of(number.0)))
    }

    fn get_unclaimed_winnings(&self, account_id: AccountId) -> U128 {
        U128(self.unclaimed_winnings.get(&account_id).unwrap_or(0))
    }

    fn get_draw_result(&self, epoch: U64) -> Option<DrawResult> {
        self.draw_history.get_by_identifier(&epoch.0)
    }

    fn get_draw_results(&self, from_index: usize, limit: usize) -> Vec<DrawResult> {
        self.draw_history.latest(from_index, limit)
    }

    fn get_undistributed_winners(&self, epoch: U64) -> Option<PayoutCursor> {
        self.undistributed.get(&epoch.0)
    }
}

impl Contract {
    fn bucket_of(&self, number: u128) -> BucketKey {
        bucket_key(number, self.bucket_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crate::test_utils::tests::*;
    use common::utils::FIXED_POINT_SCALE;

    #[test]
    fn test_new_market() {
        let emulator = Emulator::new(default_config());
        let contract = &emulator.contract;

        assert_eq!(contract.get_config(), default_config());
        assert_eq!(contract.get_jackpot(), U128(1000));
        assert_eq!(contract.get_ticket_cost(), U128(1));
        assert_eq!(contract.get_fee_rate(), U128(0));
        assert_eq!(contract.get_bucket_count(), U128(1000));
        assert_eq!(contract.get_current_epoch(), U64(0));
        assert_eq!(contract.get_held_balance(), U128(0));
        assert_eq!(contract.get_draw_state(), DrawState::Idle);
        assert!(contract.get_draw_results(0, 10).is_empty());
    }

    #[test]
    fn test_bucket_count_with_fee() {
        let mut config = default_config();
        config.fee_rate = U128(FIXED_POINT_SCALE / 4);
        let emulator = Emulator::new(config);
        assert_eq!(emulator.contract.get_bucket_count(), U128(1250));
    }

    #[test]
    #[should_panic(expected = "must not be lower than the ticket cost")]
    fn test_invalid_config() {
        let mut config = default_config();
        config.ticket_cost = U128(1001);
        Emulator::new(config);
    }

    #[test]
    fn test_host_surface() {
        let mut emulator = Emulator::new(default_config());
        assert_eq!(emulator.contract.reported_debt(U128(1)), U128(0));
        assert_eq!(emulator.contract.locked_capacity(U128(1)), U128(0));
        assert_eq!(emulator.contract.display_name(U128(1)), "Lotto Market (1 per ticket, 1000 jackpot)");

        emulator.start_draw(operator());
        assert_eq!(emulator.contract.locked_capacity(U128(1)), U128(u128::MAX));
        // pure reads
        assert_eq!(emulator.contract.locked_capacity(U128(2)), U128(u128::MAX));
        assert_eq!(emulator.contract.display_name(U128(1)), emulator.contract.display_name(U128(1)));
        assert_eq!(emulator.contract.reported_debt(U128(1)), U128(0));
    }

    #[test]
    fn test_display_name_uses_decimals() {
        let mut config = default_config();
        config.currency_decimals = 6;
        config.ticket_cost = U128(2_500_000);
        config.jackpot = U128(5_000_000_000);
        let emulator = Emulator::new(config);

        assert_eq!(emulator.contract.display_name(U128(1)), "Lotto Market (2.5 per ticket, 5000 jackpot)");
    }
}
