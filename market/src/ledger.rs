use common::types::{BucketKey, EpochId};
use near_sdk::collections::{LookupMap, Vector};
use near_sdk::json_types::{U128, U64};
use near_sdk::serde::Deserialize;
use near_sdk::serde_json;

use crate::*;
use crate::errors::MarketError;
use crate::interfaces::ledger::TicketLedger;
use crate::utils::storage_keys::StorageKeys;
use crate::utils::utils::{bucket_capacity, bucket_key};

/// Bucket participants of every epoch. Buckets are created on first purchase and never deleted.
#[derive(BorshDeserialize, BorshSerialize)]
pub struct BucketLedger{
    buckets: LookupMap<(EpochId, BucketKey), Vector<AccountId>>,
}

impl Default for BucketLedger{
    fn default() -> Self {
        BucketLedger { buckets: LookupMap::new(StorageKeys::Buckets) }
    }
}

impl BucketLedger{
    fn get_bucket(&self, epoch: EpochId, bucket: BucketKey) -> Vector<AccountId>{
        self.buckets.get(&(epoch, bucket)).unwrap_or_else(|| {
            Vector::new(StorageKeys::BucketParticipants { epoch, bucket })
        })
    }
}

impl TicketLedger for BucketLedger{
    fn bucket_len(&self, epoch: EpochId, bucket: BucketKey) -> u64{
        self.buckets.get(&(epoch, bucket)).map(|participants| participants.len()).unwrap_or(0)
    }

    fn participants(&self, epoch: EpochId, bucket: BucketKey) -> Vec<AccountId>{
        self.buckets.get(&(epoch, bucket)).map(|participants| participants.to_vec()).unwrap_or_default()
    }

    fn participants_range(&self, epoch: EpochId, bucket: BucketKey, from: u64, limit: u64) -> Vec<AccountId>{
        match self.buckets.get(&(epoch, bucket)) {
            Some(participants) => {
                let to = participants.len().min(from.saturating_add(limit));
                (from..to).filter_map(|index| participants.get(index)).collect()
            },
            None => Vec::new(),
        }
    }

    fn append(&mut self, epoch: EpochId, bucket: BucketKey, participant: &AccountId){
        let mut participants = self.get_bucket(epoch, bucket);
        participants.push(participant);
        self.buckets.insert(&(epoch, bucket), &participants);
    }
}

/// Message attached to the settlement token's `ft_transfer_call` when buying a ticket.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(crate = "near_sdk::serde", deny_unknown_fields)]
pub struct TicketRequest{
    pub number: U128,
    /// Epoch the buyer expects to enter, defaults to the current one.
    #[serde(default)]
    pub epoch: Option<U64>,
    /// Account entered into the bucket, defaults to the sender.
    #[serde(default)]
    pub beneficiary: Option<AccountId>,
}

impl TicketRequest{
    pub fn parse(msg: &str) -> Result<Self, MarketError>{
        serde_json::from_str(msg).map_err(|err| MarketError::InvalidTicketMessage(err.to_string()))
    }
}

impl Contract{
    pub(crate) fn assert_current_epoch(&self, epoch: EpochId) -> Result<(), MarketError>{
        if epoch != self.current_epoch {
            return Err(MarketError::StaleEpoch { requested: epoch, current: self.current_epoch });
        }
        Ok(())
    }

    /// Synchronous part of a purchase, everything that can be checked before asking the pool for capacity.
    pub(crate) fn prepare_ticket(&self, token_id: &AccountId, sender_id: AccountId, amount: Balance, msg: &str) -> Result<(AccountId, u128, EpochId), MarketError>{
        if token_id != &self.config.settlement_token {
            return Err(MarketError::WrongSettlementToken(token_id.clone()));
        }

        if amount != self.config.ticket_cost() {
            return Err(MarketError::IncorrectTicketPayment { expected: self.config.ticket_cost(), received: amount });
        }

        let request = TicketRequest::parse(msg)?;
        let epoch = request.epoch.map(|epoch| epoch.0).unwrap_or(self.current_epoch);
        self.assert_current_epoch(epoch)?;

        Ok((request.beneficiary.unwrap_or(sender_id), request.number.0, epoch))
    }

    /// Enters `buyer` into the bucket of `number` if the pool can still cover one more jackpot there.
    pub(crate) fn admit_ticket(&mut self, epoch: EpochId, number: u128, buyer: &AccountId, withdrawable: Balance) -> Result<BucketKey, MarketError>{
        self.assert_current_epoch(epoch)?;

        let bucket = bucket_key(number, self.bucket_count);
        let capacity = bucket_capacity(withdrawable, self.config.jackpot());

        if u128::from(self.ledger.bucket_len(epoch, bucket)) >= capacity {
            return Err(MarketError::InsufficientLiquidity { number, capacity });
        }

        self.ledger.append(epoch, bucket, buyer);
        Ok(bucket)
    }
}

#[near_bindgen]
impl Contract{
    /// Completes a purchase once the pool reported its withdrawable liquidity.
    /// Returns the unused part of `amount`, all of it when the ticket is rejected.
    #[private]
    pub fn on_capacity_checked(&mut self, buyer: AccountId, number: U128, epoch: U64, amount: U128, #[callback_result] withdrawable: Result<U128, PromiseError>) -> U128{
        let admission = withdrawable
            .map_err(|_| MarketError::CapacityUnavailable { number: number.0 })
            .and_then(|withdrawable| self.admit_ticket(epoch.0, number.0, &buyer, withdrawable.0));

        match admission {
            Ok(bucket) => {
                self.held_balance += amount.0;
                events::events::ticket_purchased(&buyer, epoch.0, number.0, bucket);
                U128(0)
            },
            Err(err) => {
                log!("Ticket of {} rejected: {}", buyer, err);
                events::events::ticket_rejected(&buyer, number.0, amount.0, &err);
                amount
            }
        }
    }
}
