use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Serialize, Deserialize};
use uint::construct_uint;

pub type EpochId = u64;
pub type RequestId = u64;
pub type MarketId = u128;
pub type BucketKey = u128;

construct_uint!{
    /// 256-bit unsigned integer
    #[derive(Serialize, Deserialize, BorshDeserialize, BorshSerialize)]
    pub struct U256(4);
}

pub type RandomValue = U256;
