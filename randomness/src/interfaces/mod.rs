pub mod randomness {
    use common::types::RequestId;
    use near_sdk::json_types::{U128, U64};
    use near_sdk::{AccountId, Promise};
    use near_sdk::{borsh::{self, BorshDeserialize, BorshSerialize}, serde::{Serialize, Deserialize}};

    #[derive(Clone, Debug, PartialEq)]
    #[derive(BorshDeserialize, BorshSerialize)]
    #[derive(Serialize, Deserialize)]
    #[serde(crate = "near_sdk::serde")]
    pub struct RandomnessRequest {
        pub consumer: AccountId,
        pub request_id: RequestId,
        pub requested_at_block: u64,
        pub min_confirmations: u16,
        pub callback_gas: u64,
        pub fulfilled: bool,
    }

    pub trait RandomnessCoordinator{
        /// Registers a request for one random value, paid with the attached deposit.
        /// `request_id` is chosen by the consumer and must be unique per consumer.
        fn request_random_value(&mut self, request_id: U64, min_confirmations: u16, callback_gas: U64, num_values: u32);
        fn can_fulfill(&self, consumer: AccountId, request_id: U64) -> bool;
        /// Operator only. Delivers the value to the consumer once the confirmations passed.
        fn fulfill(&mut self, consumer: AccountId, request_id: U64) -> Promise;
    }

    pub trait RequestRegister{
        fn get_request(&self, consumer: AccountId, request_id: U64) -> Option<RandomnessRequest>;
        fn get_request_fee(&self) -> U128;
        fn get_operator(&self) -> AccountId;
    }
}
