use std::collections::hash_map::Entry;
use std::collections::HashMap;

use common::generic_ring_buffer::{Identifier, RingBuffer};
use common::types::{BucketKey, EpochId, RandomValue, RequestId};
use near_sdk::json_types::{U128, U64};
use near_sdk::serde::{Deserialize, Serialize};
use near_sdk::{assert_one_yocto, BlockHeight, Promise};

use crate::*;
use crate::coordinator::DrawState;
use crate::errors::{MarketError, OrPanic};
use crate::external::{deposit_memo, deposit_message};
use crate::interfaces::ledger::TicketLedger;
use crate::interfaces::market::{RandomnessConsumer, WinningsClaimer};
use crate::utils::gas;
use crate::utils::utils::winning_bucket;

/// Winners paid with a pushed transfer during settlement, the rest claim with `claim_winnings`.
pub(crate) const MAX_PUSHED_PAYOUTS: usize = 3;
/// Bucket entries a single receipt reads and credits.
pub(crate) const MAX_WINNERS_PER_RECEIPT: u64 = 20;

#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct DrawResult{
    pub epoch: EpochId,
    pub request_id: RequestId,
    pub random_value: RandomValue,
    pub winning_bucket: U128,
    pub winners: u64,
    pub total_payout: U128,
    pub pool_withdrawn: U128,
    /// Sent to the pool, before the pool returned any unused part.
    pub pool_deposited: U128,
    pub settled_at: u64,
}

impl Identifier<EpochId> for DrawResult{
    fn id(&self) -> EpochId {
        self.epoch
    }
}

/// Position in the winning bucket of a settled epoch up to which winners were credited.
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(crate = "near_sdk::serde")]
pub struct PayoutCursor{
    pub bucket: U128,
    pub next_index: u64,
    pub winners: u64,
}

#[derive(Debug, PartialEq)]
pub(crate) struct SettlementPlan{
    pub epoch: EpochId,
    pub request_id: RequestId,
    pub random_value: RandomValue,
    pub winning_bucket: BucketKey,
    pub winners: u64,
    pub total_payout: Balance,
    /// Part of the payout custody cannot cover.
    pub shortfall: Balance,
}

/// Sums the jackpots of winners holding several tickets, keeping first-seen order.
fn group_payouts(winners: &[AccountId], jackpot: Balance) -> Vec<(AccountId, Balance)>{
    let mut positions: HashMap<&AccountId, usize> = HashMap::with_capacity(winners.len());
    let mut payouts: Vec<(AccountId, Balance)> = Vec::new();
    for winner in winners {
        match positions.entry(winner) {
            Entry::Occupied(position) => payouts[*position.get()].1 += jackpot,
            Entry::Vacant(position) => {
                position.insert(payouts.len());
                payouts.push((winner.clone(), jackpot));
            },
        }
    }
    payouts
}

impl Contract{
    pub(crate) fn plan_settlement(&self, epoch: EpochId, request_id: RequestId, random_value: RandomValue) -> Result<SettlementPlan, MarketError>{
        let winning_bucket = winning_bucket(&random_value, self.bucket_count);
        let winners = self.ledger.bucket_len(epoch, winning_bucket);
        let total_payout = self.config.jackpot()
            .checked_mul(u128::from(winners))
            .ok_or(MarketError::PayoutOverflow { winners })?;

        Ok(SettlementPlan {
            epoch,
            request_id,
            random_value,
            winning_bucket,
            shortfall: total_payout.saturating_sub(self.held_balance),
            winners,
            total_payout,
        })
    }

    /// Runs the whole settlement of `epoch`, first pulling the shortfall from the pool if there is one.
    pub(crate) fn settle(&mut self, epoch: EpochId, request_id: RequestId, random_value: RandomValue){
        let plan = self.plan_settlement(epoch, request_id, random_value).or_panic();

        if plan.shortfall == 0 {
            self.finalize_settlement(plan, 0).or_panic();
            return;
        }

        let requested_at = env::block_height();
        log!("Withdrawing shortfall {} from the pool for epoch {}", plan.shortfall, epoch);
        self.draw_state = DrawState::AwaitingLiquidity { epoch, request_id, random_value, requested_at };

        ext_liquidity_pool::withdraw_market_usd(
            U128(self.config.market_id()),
            env::current_account_id(),
            U128(plan.shortfall),
            self.config.liquidity_pool.clone(),
            0,
            gas::WITHDRAW_FROM_POOL,
        )
        .then(this_contract::on_shortfall_withdrawn(U64(request_id), U128(plan.shortfall), U64(requested_at), env::current_account_id(), 0, gas::ON_SHORTFALL_WITHDRAWN));
    }

    /// Commits the outcome and only then schedules payouts and the surplus deposit.
    pub(crate) fn finalize_settlement(&mut self, plan: SettlementPlan, pool_withdrawn: Balance) -> Result<DrawResult, MarketError>{
        if self.held_balance < plan.total_payout {
            return Err(MarketError::InsufficientCustody { held: self.held_balance, payout: plan.total_payout });
        }

        let remaining = self.held_balance - plan.total_payout;
        self.held_balance = 0;

        let result = DrawResult {
            epoch: plan.epoch,
            request_id: plan.request_id,
            random_value: plan.random_value,
            winning_bucket: U128(plan.winning_bucket),
            winners: plan.winners,
            total_payout: U128(plan.total_payout),
            pool_withdrawn: U128(pool_withdrawn),
            pool_deposited: U128(remaining),
            settled_at: env::block_timestamp(),
        };
        self.draw_history.add(&result);
        self.draw_state = DrawState::Idle;
        events::events::draw_settled(&result);

        let first = self.ledger.participants_range(plan.epoch, plan.winning_bucket, 0, MAX_WINNERS_PER_RECEIPT);
        for (idx, (winner, amount)) in group_payouts(&first, self.config.jackpot()).into_iter().enumerate() {
            if idx < MAX_PUSHED_PAYOUTS {
                self.transfer_winnings(winner, amount);
            } else {
                self.credit_winnings(&winner, amount);
            }
        }

        let credited = first.len() as u64;
        if credited < plan.winners {
            log!("{} winners of epoch {} left for distribution", plan.winners - credited, plan.epoch);
            self.undistributed.insert(&plan.epoch, &PayoutCursor {
                bucket: U128(plan.winning_bucket),
                next_index: credited,
                winners: plan.winners,
            });
        }

        if remaining > 0 {
            self.deposit_surplus(plan.epoch, remaining);
        }

        Ok(result)
    }

    fn book_superseded_withdrawal(&mut self, request_id: RequestId, shortfall: Balance, requested_at: BlockHeight, received: bool){
        if !received {
            log!("Superseded pool withdrawal of request {} from block {} failed", request_id, requested_at);
            return;
        }

        log!("Superseded pool withdrawal of {} for request {} kept in custody", shortfall, request_id);
        self.held_balance += shortfall;
    }

    pub(crate) fn credit_winnings(&mut self, account_id: &AccountId, amount: Balance){
        let unclaimed = self.unclaimed_winnings.get(account_id).unwrap_or(0);
        self.unclaimed_winnings.insert(account_id, &(unclaimed + amount));
    }

    fn transfer_winnings(&self, winner: AccountId, amount: Balance) -> Promise{
        ext_fungible_token::ft_transfer(winner.clone(), U128(amount), None, self.config.settlement_token.clone(), 1, gas::GAS_FOR_FT_TRANSFER)
            .then(this_contract::on_payout_transferred(winner, U128(amount), env::current_account_id(), 0, gas::ON_PAYOUT_TRANSFERRED))
    }

    fn deposit_surplus(&self, epoch: EpochId, amount: Balance){
        ext_fungible_token::ft_transfer_call(
            self.config.liquidity_pool.clone(),
            U128(amount),
            deposit_memo(epoch),
            deposit_message(self.config.market_id()),
            self.config.settlement_token.clone(),
            1,
            gas::GAS_FOR_FT_TRANSFER_CALL,
        )
        .then(this_contract::on_surplus_deposited(U64(epoch), U128(amount), env::current_account_id(), 0, gas::ON_SURPLUS_DEPOSITED));
    }
}

#[near_bindgen]
impl RandomnessConsumer for Contract{
    fn on_randomness_delivered(&mut self, request_id: U64, random_value: RandomValue){
        let provider = env::predecessor_account_id();
        if provider != self.config.randomness_provider {
            MarketError::UnauthorizedProvider(provider).panic();
        }

        let epoch = self.pending_requests
            .get(&request_id.0)
            .unwrap_or_else(|| MarketError::UnknownRequest(request_id.0).panic());

        match self.draw_state {
            DrawState::AwaitingRandomness { epoch: drawn_epoch, request_id: awaited } if awaited == request_id.0 && drawn_epoch == epoch => {
                log!("Random value for request {} delivered, settling epoch {}", request_id.0, epoch);
                self.settle(epoch, request_id.0, random_value);
            },
            _ => MarketError::UnexpectedDelivery(request_id.0).panic(),
        }
    }
}

#[near_bindgen]
impl WinningsClaimer for Contract{
    #[payable]
    fn claim_winnings(&mut self) -> Promise{
        assert_one_yocto();
        let account_id = env::predecessor_account_id();
        let amount = self.unclaimed_winnings
            .remove(&account_id)
            .ok_or_else(|| MarketError::NoUnclaimedWinnings(account_id.clone()))
            .or_panic();

        log!("{} claims {}", account_id, amount);
        self.transfer_winnings(account_id, amount)
    }

    fn distribute_winnings(&mut self, epoch: U64, limit: U64) -> U64{
        let mut cursor = self.undistributed
            .get(&epoch.0)
            .ok_or(MarketError::NothingToDistribute(epoch.0))
            .or_panic();

        let limit = limit.0.min(MAX_WINNERS_PER_RECEIPT);
        let batch = self.ledger.participants_range(epoch.0, cursor.bucket.0, cursor.next_index, limit);
        for (winner, amount) in group_payouts(&batch, self.config.jackpot()) {
            self.credit_winnings(&winner, amount);
        }

        cursor.next_index += batch.len() as u64;
        let left = cursor.winners.saturating_sub(cursor.next_index);
        if left == 0 || batch.is_empty() {
            self.undistributed.remove(&epoch.0);
            return U64(0);
        }

        self.undistributed.insert(&epoch.0, &cursor);
        U64(left)
    }
}

#[near_bindgen]
impl Contract{
    /// A withdrawal superseded by `retry_settlement` only has its funds booked into custody.
    #[private]
    pub fn on_shortfall_withdrawn(&mut self, request_id: U64, shortfall: U128, requested_at: U64, #[callback_result] result: Result<(), PromiseError>){
        let (epoch, random_value) = match self.draw_state {
            DrawState::AwaitingLiquidity { epoch, request_id: awaited, random_value, requested_at: awaited_at }
                if awaited == request_id.0 && awaited_at == requested_at.0 => (epoch, random_value),
            _ => {
                self.book_superseded_withdrawal(request_id.0, shortfall.0, requested_at.0, result.is_ok());
                return;
            },
        };

        if result.is_err() {
            log!("Pool withdrawal of {} failed, settlement of epoch {} stalled", shortfall.0, epoch);
            self.draw_state = DrawState::SettlementStalled { epoch, request_id: request_id.0, random_value };
            events::events::settlement_stalled(epoch, request_id.0, shortfall.0);
            return;
        }

        self.held_balance += shortfall.0;
        let plan = self.plan_settlement(epoch, request_id.0, random_value).or_panic();
        self.finalize_settlement(plan, shortfall.0).or_panic();
    }

    #[private]
    pub fn on_payout_transferred(&mut self, winner: AccountId, amount: U128, #[callback_result] result: Result<(), PromiseError>){
        if result.is_ok() {
            events::events::winner_paid(&winner, amount.0);
            return;
        }

        log!("Transfer of {} to {} failed, kept as unclaimed winnings", amount.0, winner);
        self.credit_winnings(&winner, amount.0);
        events::events::payout_failed(&winner, amount.0);
    }

    /// Whatever the pool did not take back returns to custody.
    #[private]
    pub fn on_surplus_deposited(&mut self, epoch: U64, amount: U128, #[callback_result] used: Result<U128, PromiseError>){
        let returned = match used {
            Ok(used) => amount.0.saturating_sub(used.0),
            Err(_) => amount.0,
        };

        if returned > 0 {
            log!("Pool returned {} of the surplus of epoch {}", returned, epoch.0);
            self.held_balance += returned;
        }
        events::events::surplus_deposited(epoch.0, amount.0, returned);
    }
}
