pub mod ledger {
    use common::types::{BucketKey, EpochId};
    use near_sdk::AccountId;

    pub trait TicketLedger{
        fn bucket_len(&self, epoch: EpochId, bucket: BucketKey) -> u64;
        /// Participants in insertion order.
        fn participants(&self, epoch: EpochId, bucket: BucketKey) -> Vec<AccountId>;
        /// At most `limit` participants starting at position `from`.
        fn participants_range(&self, epoch: EpochId, bucket: BucketKey, from: u64, limit: u64) -> Vec<AccountId>;
        fn append(&mut self, epoch: EpochId, bucket: BucketKey, participant: &AccountId);
    }
}

pub mod market {
    use common::types::RandomValue;
    use near_sdk::json_types::{U128, U64};
    use near_sdk::{AccountId, Promise};

    use crate::config::MarketConfig;
    use crate::coordinator::DrawState;
    use crate::settlement::{DrawResult, PayoutCursor};

    pub trait DrawCoordinator{
        /// Opens a new epoch and asks the provider for one random value covering the closed one.
        /// Attach at least `max_randomness_cost`, the excess is refunded.
        fn start_draw(&mut self, max_randomness_cost: U128) -> U64;
        /// Asks the provider again for the epoch whose randomness request failed, under a fresh request id.
        fn reissue_randomness_request(&mut self, max_randomness_cost: U128) -> U64;
        /// Restarts a stalled settlement, or one whose pool withdrawal never reported back.
        fn retry_settlement(&mut self);
    }

    pub trait RandomnessConsumer{
        fn on_randomness_delivered(&mut self, request_id: U64, random_value: RandomValue);
    }

    pub trait WinningsClaimer{
        fn claim_winnings(&mut self) -> Promise;
        /// Credits up to `limit` winners of `epoch` left over by the settlement. Returns how many are still left.
        fn distribute_winnings(&mut self, epoch: U64, limit: U64) -> U64;
    }

    /// Surface the registration host reads to account for this market.
    pub trait CollateralHost{
        fn reported_debt(&self, market_id: U128) -> U128;
        fn locked_capacity(&self, market_id: U128) -> U128;
        fn display_name(&self, market_id: U128) -> String;
    }

    pub trait MarketView{
        fn get_config(&self) -> MarketConfig;
        fn get_jackpot(&self) -> U128;
        fn get_ticket_cost(&self) -> U128;
        fn get_fee_rate(&self) -> U128;
        fn get_bucket_count(&self) -> U128;
        fn get_current_epoch(&self) -> U64;
        fn get_held_balance(&self) -> U128;
        fn get_draw_state(&self) -> DrawState;
        fn is_drawing(&self) -> bool;
        fn get_request_epoch(&self, request_id: U64) -> Option<U64>;
        fn get_bucket_participants(&self, epoch: U64, number: U128) -> Vec<AccountId>;
        fn get_bucket_size(&self, epoch: U64, number: U128) -> U64;
        fn get_unclaimed_winnings(&self, account_id: AccountId) -> U128;
        fn get_draw_result(&self, epoch: U64) -> Option<DrawResult>;
        fn get_draw_results(&self, from_index: usize, limit: usize) -> Vec<DrawResult>;
        fn get_undistributed_winners(&self, epoch: U64) -> Option<PayoutCursor>;
    }
}
