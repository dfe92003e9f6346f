use near_sdk::json_types::{U128, U64};
use near_sdk::AccountId;
use near_sdk::Balance;

use crate::config::{MarketConfig, RandomnessConfig};

pub const RANDOMNESS_FEE: Balance = 1_000;

pub fn market() -> AccountId {
    "market".parse().unwrap()
}

pub fn token() -> AccountId {
    "usdc".parse().unwrap()
}

pub fn pool() -> AccountId {
    "pool".parse().unwrap()
}

pub fn provider() -> AccountId {
    "randomness".parse().unwrap()
}

pub fn operator() -> AccountId {
    "operator".parse().unwrap()
}

pub fn alice() -> AccountId {
    "alice".parse().unwrap()
}
pub fn bob() -> AccountId {
    "bob".parse().unwrap()
}
pub fn charlie() -> AccountId {
    "charlie".parse().unwrap()
}
pub fn dave() -> AccountId {
    "dave".parse().unwrap()
}
pub fn eve() -> AccountId {
    "eve".parse().unwrap()
}
pub fn frank() -> AccountId {
    "frank".parse().unwrap()
}

pub fn ntoy(near_amount: Balance) -> Balance {
    near_amount * 10u128.pow(24)
}

/// 1000 buckets, no fee.
pub fn default_config() -> MarketConfig {
    MarketConfig {
        market_id: U128(1),
        liquidity_pool: pool(),
        randomness_provider: provider(),
        settlement_token: token(),
        currency_decimals: 0,
        jackpot: U128(1_000),
        ticket_cost: U128(1),
        fee_rate: U128(0),
        randomness: RandomnessConfig {
            min_confirmations: 3,
            callback_gas: U64(200_000_000_000_000),
        },
    }
}

#[cfg(test)]
pub mod tests {
    use common::types::RandomValue;
    use near_sdk::mock::VmAction;
    use near_sdk::test_utils::{get_created_receipts, VMContextBuilder};
    use near_sdk::{testing_env, AccountId, Balance, BlockHeight, PromiseError, VMContext};

    use crate::interfaces::market::{DrawCoordinator, RandomnessConsumer};
    use crate::*;

    use super::*;

    /// Plain transfers to `account_id` scheduled by the last call.
    pub fn transfers_to(account_id: &AccountId) -> Vec<Balance> {
        get_created_receipts()
            .into_iter()
            .filter(|receipt| &receipt.receiver_id == account_id)
            .flat_map(|receipt| receipt.actions)
            .filter_map(|action| match action {
                VmAction::Transfer { deposit } => Some(deposit),
                _ => None,
            })
            .collect()
    }

    /// Method names and attached deposits of the calls to `account_id` scheduled by the last call.
    pub fn calls_to(account_id: &AccountId) -> Vec<(String, Balance)> {
        get_created_receipts()
            .into_iter()
            .filter(|receipt| &receipt.receiver_id == account_id)
            .flat_map(|receipt| receipt.actions)
            .filter_map(|action| match action {
                VmAction::FunctionCall { function_name, deposit, .. } => Some((function_name, deposit)),
                _ => None,
            })
            .collect()
    }

    pub struct Emulator {
        pub contract: Contract,
        pub block_index: u64,
        pub context: VMContext,
    }

    impl Emulator {
        pub fn new(config: MarketConfig) -> Self {
            let context = VMContextBuilder::new()
                .current_account_id(market())
                .account_balance(ntoy(10))
                .build();
            testing_env!(context.clone());
            let contract = Contract::new(config);
            Emulator {
                contract,
                block_index: 0,
                context,
            }
        }

        pub fn call_from(&mut self, caller: AccountId, deposit: Balance) {
            self.block_index += 1;
            self.context = VMContextBuilder::new()
                .current_account_id(market())
                .predecessor_account_id(caller.clone())
                .signer_account_id(caller)
                .block_index(self.block_index)
                .attached_deposit(deposit)
                .account_balance(ntoy(10))
                .build();
            testing_env!(self.context.clone());
        }

        pub fn skip_blocks(&mut self, num: BlockHeight) {
            self.block_index += num;
        }

        pub fn as_self(&mut self) {
            self.call_from(market(), 0);
        }

        pub fn as_token(&mut self) {
            self.call_from(token(), 0);
        }

        /// Ticket purchase as seen by the capacity callback, returns the refunded amount.
        pub fn buy_ticket(&mut self, buyer: AccountId, number: u128, withdrawable: Balance) -> U128 {
            let epoch = self.contract.get_current_epoch();
            let amount = self.contract.get_ticket_cost();
            self.as_self();
            self.contract.on_capacity_checked(buyer, U128(number), epoch, amount, Ok::<U128, PromiseError>(U128(withdrawable)))
        }

        pub fn start_draw(&mut self, caller: AccountId) -> u64 {
            self.call_from(caller, RANDOMNESS_FEE);
            self.contract.start_draw(U128(RANDOMNESS_FEE)).0
        }

        pub fn reissue(&mut self, caller: AccountId) -> u64 {
            self.call_from(caller, RANDOMNESS_FEE);
            self.contract.reissue_randomness_request(U128(RANDOMNESS_FEE)).0
        }

        pub fn deliver(&mut self, request_id: u64, random_value: RandomValue) {
            self.call_from(provider(), 0);
            self.contract.on_randomness_delivered(U64(request_id), random_value);
        }
    }
}
