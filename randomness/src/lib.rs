use common::types::{RandomValue, RequestId};
use common::utils::random_u256;
use near_sdk::collections::LookupMap;
use near_sdk::json_types::{U128, U64};
use near_sdk::{env, ext_contract, log, near_bindgen, AccountId, Balance, BorshStorageKey, Gas, PanicOnDefault, Promise};
use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use interfaces::randomness::{RandomnessCoordinator, RandomnessRequest, RequestRegister};

mod interfaces;

/// Only single-value requests are served.
const MAX_VALUES_PER_REQUEST: u32 = 1;

#[cfg(test)]
mod test_utils;

#[derive(BorshStorageKey, BorshSerialize)]
enum StorageKeys {
    Requests,
}

#[ext_contract(ext_consumer)]
pub trait RandomnessConsumer {
    fn on_randomness_delivered(&mut self, request_id: U64, random_value: RandomValue);
}

#[near_bindgen]
#[derive(BorshDeserialize, BorshSerialize, PanicOnDefault)]
pub struct Contract{
    requests: LookupMap<(AccountId, RequestId), RandomnessRequest>,
    request_fee: Balance,
    /// The only account allowed to trigger fulfillment, and so to pick the block whose seed is used.
    operator: AccountId,
}

#[near_bindgen]
impl Contract{
    #[init]
    pub fn new(request_fee: U128, operator: AccountId) -> Self{
        assert!(!env::state_exists(), "Already initialized");

        Self {
            requests: LookupMap::new(StorageKeys::Requests),
            request_fee: request_fee.0,
            operator,
        }
    }
}

impl Contract{
    fn assert_operator(&self){
        assert_eq!(env::predecessor_account_id(), self.operator, "Only the operator can fulfill requests");
    }
}

#[near_bindgen]
impl RequestRegister for Contract{
    fn get_request(&self, consumer: AccountId, request_id: U64) -> Option<RandomnessRequest>{
        self.requests.get(&(consumer, request_id.0))
    }

    fn get_request_fee(&self) -> U128{
        U128(self.request_fee)
    }

    fn get_operator(&self) -> AccountId{
        self.operator.clone()
    }
}

#[near_bindgen]
impl RandomnessCoordinator for Contract{
    #[payable]
    fn request_random_value(&mut self, request_id: U64, min_confirmations: u16, callback_gas: U64, num_values: u32) {
        assert_eq!(num_values, MAX_VALUES_PER_REQUEST, "Only {} random value per request is supported", MAX_VALUES_PER_REQUEST);
        assert!(callback_gas.0 > 0, "Callback gas must be positive");

        let deposit = env::attached_deposit();
        assert!(
            deposit >= self.request_fee,
            "Attached deposit {} does not cover the request fee {}", deposit, self.request_fee
        );

        let consumer = env::predecessor_account_id();
        let key = (consumer.clone(), request_id.0);
        assert!(self.requests.get(&key).is_none(), "Request {} from {} already registered", request_id.0, consumer);

        let request = RandomnessRequest {
            consumer: consumer.clone(),
            request_id: request_id.0,
            requested_at_block: env::block_height(),
            min_confirmations,
            callback_gas: callback_gas.0,
            fulfilled: false,
        };
        self.requests.insert(&key, &request);
        log!("Registered request {} from {} at block {}", request_id.0, consumer, request.requested_at_block);

        let excess = deposit - self.request_fee;
        if excess > 0 {
            Promise::new(env::signer_account_id()).transfer(excess);
        }
    }

    fn can_fulfill(&self, consumer: AccountId, request_id: U64) -> bool{
        match self.requests.get(&(consumer, request_id.0)){
            Some(request) => !request.fulfilled
                && env::block_height() >= request.requested_at_block + u64::from(request.min_confirmations),
            None => false,
        }
    }

    fn fulfill(&mut self, consumer: AccountId, request_id: U64) -> Promise {
        self.assert_operator();
        assert!(self.can_fulfill(consumer.clone(), request_id), "Request {} from {} cannot be fulfilled yet", request_id.0, consumer);

        let key = (consumer.clone(), request_id.0);
        let mut request = self.requests.get(&key).unwrap_or_else(|| env::panic_str("Request not found"));
        request.fulfilled = true;
        self.requests.insert(&key, &request);

        let random_value = random_u256();
        log!("Fulfilling request {} for {} with {}", request_id.0, consumer, random_value);

        ext_consumer::on_randomness_delivered(request_id, random_value, consumer, 0, Gas(request.callback_gas))
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::test_utils::tests::*;
    use crate::test_utils::*;

    use rand::Rng;

    const FEE: Balance = 1_000;
    const CALLBACK_GAS: u64 = 50_000_000_000_000;

    fn generate_random_seed() -> [u8; 32]{
        rand::thread_rng().gen::<[u8; 32]>()
    }

    fn register(emulator: &mut Emulator, request_id: u64, confirmations: u16){
        emulator.call_from(market(), FEE);
        emulator.contract.request_random_value(U64(request_id), confirmations, U64(CALLBACK_GAS), 1);
    }

    #[test]
    fn test_request_is_recorded(){
        let mut emulator = Emulator::new(FEE);
        register(&mut emulator, 7, 3);

        let request = emulator.contract.get_request(market(), U64(7)).unwrap();
        assert_eq!(request.consumer, market());
        assert_eq!(request.request_id, 7);
        assert_eq!(request.min_confirmations, 3);
        assert!(!request.fulfilled);
        assert_eq!(emulator.contract.get_request(alice(), U64(7)), None);
    }

    #[test]
    #[should_panic(expected = "does not cover the request fee")]
    fn test_request_requires_fee(){
        let mut emulator = Emulator::new(FEE);
        emulator.call_from(market(), FEE - 1);
        emulator.contract.request_random_value(U64(1), 1, U64(10), 1);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_duplicate_request_rejected(){
        let mut emulator = Emulator::new(FEE);
        register(&mut emulator, 1, 0);
        register(&mut emulator, 1, 0);
    }

    #[test]
    #[should_panic(expected = "Only 1 random value per request is supported")]
    fn test_multiple_values_rejected(){
        let mut emulator = Emulator::new(FEE);
        emulator.call_from(market(), FEE);
        emulator.contract.request_random_value(U64(1), 1, U64(10), 2);
    }

    #[test]
    fn test_same_id_from_different_consumers(){
        let mut emulator = Emulator::new(FEE);
        register(&mut emulator, 1, 0);
        emulator.call_from(alice(), FEE);
        emulator.contract.request_random_value(U64(1), 0, U64(10), 1);

        assert!(emulator.contract.get_request(market(), U64(1)).is_some());
        assert!(emulator.contract.get_request(alice(), U64(1)).is_some());
    }

    #[test]
    fn test_fulfillment_waits_for_confirmations(){
        let mut emulator = Emulator::new(FEE);
        register(&mut emulator, 1, 3);

        assert!(!emulator.contract.can_fulfill(market(), U64(1)));
        emulator.skip_blocks(2, generate_random_seed());
        assert!(!emulator.contract.can_fulfill(market(), U64(1)));
        emulator.skip_blocks(1, generate_random_seed());
        assert!(emulator.contract.can_fulfill(market(), U64(1)));
        assert!(!emulator.contract.can_fulfill(market(), U64(2)));
    }

    #[test]
    fn test_fulfill_exactly_once(){
        let mut emulator = Emulator::new(FEE);
        register(&mut emulator, 1, 1);
        emulator.skip_blocks(1, generate_random_seed());

        emulator.call_from(operator(), 0);
        emulator.contract.fulfill(market(), U64(1));
        assert!(emulator.contract.get_request(market(), U64(1)).unwrap().fulfilled);
        assert!(!emulator.contract.can_fulfill(market(), U64(1)));
    }

    #[test]
    #[should_panic(expected = "cannot be fulfilled yet")]
    fn test_second_fulfillment_rejected(){
        let mut emulator = Emulator::new(FEE);
        register(&mut emulator, 1, 0);

        emulator.call_from(operator(), 0);
        emulator.contract.fulfill(market(), U64(1));
        emulator.contract.fulfill(market(), U64(1));
    }

    #[test]
    #[should_panic(expected = "Only the operator can fulfill requests")]
    fn test_fulfill_by_stranger_rejected(){
        let mut emulator = Emulator::new(FEE);
        register(&mut emulator, 1, 0);

        emulator.call_from(alice(), 0);
        emulator.contract.fulfill(market(), U64(1));
    }

    #[test]
    fn test_operator_is_recorded(){
        let emulator = Emulator::new(FEE);
        assert_eq!(emulator.contract.get_operator(), operator());
    }
}
