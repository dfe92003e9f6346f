pub mod events{
    use common::types::{BucketKey, EpochId, RequestId};
    use near_sdk::json_types::{U128, U64};
    use near_sdk::{AccountId, Balance, log};
    use near_sdk::serde::Serialize;
    use near_sdk::serde_json::json;

    use crate::errors::MarketError;
    use crate::settlement::DrawResult;

    #[derive(Serialize)]
    #[serde(crate = "near_sdk::serde")]
    struct TicketEvent<'a> {
        pub account_id: &'a AccountId,
        pub epoch: U64,
        pub number: U128,
        pub bucket: U128,
    }

    #[derive(Serialize)]
    #[serde(crate = "near_sdk::serde")]
    struct TicketRejectedEvent<'a> {
        pub account_id: &'a AccountId,
        pub number: U128,
        pub amount: U128,
        pub reason: String,
    }

    #[derive(Serialize)]
    #[serde(crate = "near_sdk::serde")]
    struct DrawEvent<'a> {
        pub caller: &'a AccountId,
        pub epoch: U64,
        pub request_id: U64,
        pub randomness_cost: U128,
    }

    #[derive(Serialize)]
    #[serde(crate = "near_sdk::serde")]
    struct StalledEvent {
        pub epoch: U64,
        pub request_id: U64,
        pub shortfall: U128,
    }

    #[derive(Serialize)]
    #[serde(crate = "near_sdk::serde")]
    struct TransferEvent<'a> {
        pub account_id: &'a AccountId,
        pub amount: U128,
    }

    #[derive(Serialize)]
    #[serde(crate = "near_sdk::serde")]
    struct DepositEvent {
        pub epoch: U64,
        pub amount: U128,
        pub returned: U128,
    }

    fn log_event<T: Serialize>(event: &str, data: T) {
        let event = json!({
            "standard": "lotto-market",
            "version": "1.0.0",
            "event": event,
            "data": [data]
        });

        log!("EVENT_JSON:{}", event.to_string());
    }

    pub fn ticket_purchased(account_id: &AccountId, epoch: EpochId, number: u128, bucket: BucketKey){
        log_event(
            "ticket_purchased",
            TicketEvent {
                account_id,
                epoch: U64(epoch),
                number: U128(number),
                bucket: U128(bucket),
            }
        );
    }

    pub fn ticket_rejected(account_id: &AccountId, number: u128, amount: Balance, reason: &MarketError){
        log_event(
            "ticket_rejected",
            TicketRejectedEvent {
                account_id,
                number: U128(number),
                amount: U128(amount),
                reason: reason.to_string(),
            }
        );
    }

    pub fn draw_started(caller: &AccountId, epoch: EpochId, request_id: RequestId, randomness_cost: Balance){
        log_event(
            "draw_started",
            DrawEvent {
                caller,
                epoch: U64(epoch),
                request_id: U64(request_id),
                randomness_cost: U128(randomness_cost),
            }
        );
    }

    pub fn randomness_request_failed(caller: &AccountId, epoch: EpochId, request_id: RequestId, randomness_cost: Balance){
        log_event(
            "randomness_request_failed",
            DrawEvent {
                caller,
                epoch: U64(epoch),
                request_id: U64(request_id),
                randomness_cost: U128(randomness_cost),
            }
        );
    }

    pub fn draw_settled(result: &DrawResult){
        log_event("draw_settled", result);
    }

    pub fn settlement_stalled(epoch: EpochId, request_id: RequestId, shortfall: Balance){
        log_event(
            "settlement_stalled",
            StalledEvent {
                epoch: U64(epoch),
                request_id: U64(request_id),
                shortfall: U128(shortfall),
            }
        );
    }

    pub fn winner_paid(account_id: &AccountId, amount: Balance){
        log_event("winner_paid", TransferEvent { account_id, amount: U128(amount) });
    }

    pub fn payout_failed(account_id: &AccountId, amount: Balance){
        log_event("payout_failed", TransferEvent { account_id, amount: U128(amount) });
    }

    pub fn surplus_deposited(epoch: EpochId, amount: Balance, returned: Balance){
        log_event(
            "surplus_deposited",
            DepositEvent {
                epoch: U64(epoch),
                amount: U128(amount),
                returned: U128(returned),
            }
        );
    }
}
