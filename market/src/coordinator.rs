use common::types::{EpochId, RandomValue, RequestId};
use near_sdk::json_types::{U128, U64};
use near_sdk::serde::{Deserialize, Serialize};
use near_sdk::{BlockHeight, Promise};

use crate::*;
use crate::errors::{MarketError, OrPanic};
use crate::interfaces::market::DrawCoordinator;
use crate::utils::gas;

/// Blocks after which a pool withdrawal that never reported back may be retried.
pub(crate) const LIQUIDITY_RETRY_BLOCKS: BlockHeight = 100;

/// Every state but `Idle` means a draw is in progress and blocks the next one.
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(crate = "near_sdk::serde", tag = "state", rename_all = "snake_case")]
pub enum DrawState{
    Idle,
    AwaitingRandomness { epoch: EpochId, request_id: RequestId },
    /// The provider refused the request. See `reissue_randomness_request`.
    RequestFailed { epoch: EpochId, request_id: RequestId },
    /// Pool withdrawal covering the payout shortfall is in flight since `requested_at`.
    AwaitingLiquidity { epoch: EpochId, request_id: RequestId, random_value: RandomValue, requested_at: BlockHeight },
    /// Shortfall withdrawal failed, nothing was paid. See `retry_settlement`.
    SettlementStalled { epoch: EpochId, request_id: RequestId, random_value: RandomValue },
}

impl DrawState{
    pub fn is_drawing(&self) -> bool{
        !matches!(self, DrawState::Idle)
    }
}

impl Contract{
    /// Closes the current epoch and binds it to a fresh request id. State only, no promises.
    pub(crate) fn open_draw(&mut self, attached: Balance, randomness_cost: Balance) -> Result<(EpochId, RequestId), MarketError>{
        if self.draw_state.is_drawing() {
            return Err(MarketError::DrawAlreadyInProgress);
        }

        if attached < randomness_cost {
            return Err(MarketError::InsufficientRandomnessFee { attached, required: randomness_cost });
        }

        let epoch = self.current_epoch;
        let request_id = self.bind_request(epoch);
        self.current_epoch += 1;

        Ok((epoch, request_id))
    }

    /// Replaces the failed request of the closed epoch. The epoch counter does not move.
    pub(crate) fn reopen_draw(&mut self, attached: Balance, randomness_cost: Balance) -> Result<(EpochId, RequestId), MarketError>{
        let (epoch, failed) = match self.draw_state {
            DrawState::RequestFailed { epoch, request_id } => (epoch, request_id),
            _ => return Err(MarketError::NoFailedRequest),
        };

        if attached < randomness_cost {
            return Err(MarketError::InsufficientRandomnessFee { attached, required: randomness_cost });
        }

        self.pending_requests.remove(&failed);
        Ok((epoch, self.bind_request(epoch)))
    }

    fn bind_request(&mut self, epoch: EpochId) -> RequestId{
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.pending_requests.insert(&request_id, &epoch);
        self.draw_state = DrawState::AwaitingRandomness { epoch, request_id };
        request_id
    }

    /// Refunds whatever `caller` attached above the cost and sends the request to the provider.
    fn request_randomness(&self, caller: AccountId, request_id: RequestId, attached: Balance, randomness_cost: Balance){
        let excess = attached - randomness_cost;
        if excess > 0 {
            Promise::new(caller.clone()).transfer(excess);
        }

        let randomness = &self.config.randomness;
        ext_randomness::request_random_value(
            U64(request_id),
            randomness.min_confirmations,
            randomness.callback_gas,
            1,
            self.config.randomness_provider.clone(),
            randomness_cost,
            gas::REQUEST_RANDOMNESS,
        )
        .then(this_contract::on_randomness_requested(caller, U64(request_id), U128(randomness_cost), env::current_account_id(), 0, gas::ON_RANDOMNESS_REQUESTED));
    }
}

#[near_bindgen]
impl DrawCoordinator for Contract{
    #[payable]
    fn start_draw(&mut self, max_randomness_cost: U128) -> U64{
        let caller = env::predecessor_account_id();
        let attached = env::attached_deposit();
        let (epoch, request_id) = self.open_draw(attached, max_randomness_cost.0).or_panic();

        log!("Draw of epoch {} started by {} with request {}", epoch, caller, request_id);
        events::events::draw_started(&caller, epoch, request_id, max_randomness_cost.0);

        self.request_randomness(caller, request_id, attached, max_randomness_cost.0);
        U64(request_id)
    }

    #[payable]
    fn reissue_randomness_request(&mut self, max_randomness_cost: U128) -> U64{
        let caller = env::predecessor_account_id();
        let attached = env::attached_deposit();
        let (epoch, request_id) = self.reopen_draw(attached, max_randomness_cost.0).or_panic();

        log!("Randomness for epoch {} requested again by {} with request {}", epoch, caller, request_id);
        events::events::draw_started(&caller, epoch, request_id, max_randomness_cost.0);

        self.request_randomness(caller, request_id, attached, max_randomness_cost.0);
        U64(request_id)
    }

    fn retry_settlement(&mut self){
        match self.draw_state {
            DrawState::SettlementStalled { epoch, request_id, random_value } => {
                log!("Retrying settlement of epoch {}", epoch);
                self.settle(epoch, request_id, random_value);
            },
            DrawState::AwaitingLiquidity { epoch, request_id, random_value, requested_at } => {
                let retry_at = requested_at + LIQUIDITY_RETRY_BLOCKS;
                if env::block_height() < retry_at {
                    MarketError::SettlementInFlight { epoch, retry_at }.panic();
                }

                log!("Pool withdrawal for epoch {} unanswered since block {}, retrying", epoch, requested_at);
                self.settle(epoch, request_id, random_value);
            },
            _ => MarketError::NothingToRetry.panic(),
        }
    }
}

#[near_bindgen]
impl Contract{
    /// On failure the draw waits for `reissue_randomness_request`, the fee goes back to the caller.
    #[private]
    pub fn on_randomness_requested(&mut self, caller: AccountId, request_id: U64, randomness_cost: U128, #[callback_result] result: Result<(), PromiseError>){
        if result.is_ok() {
            return;
        }

        match self.draw_state {
            DrawState::AwaitingRandomness { epoch, request_id: awaited } if awaited == request_id.0 => {
                log!("Randomness request {} for epoch {} failed", request_id.0, epoch);
                self.draw_state = DrawState::RequestFailed { epoch, request_id: awaited };
                events::events::randomness_request_failed(&caller, epoch, request_id.0, randomness_cost.0);
            },
            _ => log!("Randomness request {} failed but is no longer awaited", request_id.0),
        }

        if randomness_cost.0 > 0 {
            Promise::new(caller).transfer(randomness_cost.0);
        }
    }
}
