pub mod storage_keys{
    use common::types::{BucketKey, EpochId};
    use near_sdk::BorshStorageKey;
    use near_sdk::borsh::{self, BorshSerialize};

    #[derive(BorshStorageKey, BorshSerialize)]
    pub enum StorageKeys {
        Buckets,
        BucketParticipants {epoch: EpochId, bucket: BucketKey},
        PendingRequests,
        UnclaimedWinnings,
        DrawHistory,
        UndistributedWinners,
    }
}

pub mod utils{
    use common::types::{BucketKey, RandomValue, U256};
    use near_sdk::Balance;

    pub(crate) fn bucket_key(number: u128, bucket_count: u128) -> BucketKey{
        number % bucket_count
    }

    pub(crate) fn winning_bucket(random_value: &RandomValue, bucket_count: u128) -> BucketKey{
        (*random_value % U256::from(bucket_count)).as_u128()
    }

    /// Number of participants a single bucket can take given the liquidity the pool lets us withdraw.
    pub(crate) fn bucket_capacity(withdrawable: Balance, jackpot: Balance) -> u128{
        withdrawable / jackpot
    }

    /// Renders a token amount with its fixed decimal precision, trailing zeros trimmed.
    pub(crate) fn format_amount(amount: Balance, decimals: u8) -> String{
        let scale = 10u128.pow(u32::from(decimals));
        let whole = amount / scale;
        let fraction = amount % scale;

        if fraction == 0 {
            return whole.to_string();
        }

        let fraction = format!("{:0width$}", fraction, width = decimals as usize);
        format!("{}.{}", whole, fraction.trim_end_matches('0'))
    }
}

pub mod gas{
    use near_sdk::Gas;

    pub const GET_WITHDRAWABLE: Gas = Gas(10_000_000_000_000);
    pub const ON_CAPACITY_CHECKED: Gas = Gas(20_000_000_000_000);
    pub const REQUEST_RANDOMNESS: Gas = Gas(15_000_000_000_000);
    pub const ON_RANDOMNESS_REQUESTED: Gas = Gas(10_000_000_000_000);
    pub const WITHDRAW_FROM_POOL: Gas = Gas(30_000_000_000_000);
    pub const ON_SHORTFALL_WITHDRAWN: Gas = Gas(150_000_000_000_000);
    pub const ON_PAYOUT_TRANSFERRED: Gas = Gas(10_000_000_000_000);
    pub const ON_SURPLUS_DEPOSITED: Gas = Gas(10_000_000_000_000);

    pub const GAS_FOR_FT_TRANSFER: Gas = Gas(Gas::ONE_TERA.0 * 10);
    pub const GAS_FOR_FT_TRANSFER_CALL: Gas = Gas(Gas::ONE_TERA.0 * 50);

    /// Left to `on_randomness_delivered` itself after it attached the settlement promises.
    pub const SETTLEMENT_HEADROOM: Gas = Gas(Gas::ONE_TERA.0 * 20);
    /// Least gas the provider has to attach to `on_randomness_delivered`, the shortfall path being the costliest.
    pub const MIN_SETTLEMENT_CALLBACK: Gas = Gas(WITHDRAW_FROM_POOL.0 + ON_SHORTFALL_WITHDRAWN.0 + SETTLEMENT_HEADROOM.0);
}
