use near_sdk::AccountId;
use near_sdk::Balance;

pub fn coordinator() -> AccountId {
    "randomness".parse().unwrap()
}

pub fn market() -> AccountId {
    "market".parse().unwrap()
}

pub fn operator() -> AccountId {
    "operator".parse().unwrap()
}

pub fn alice() -> AccountId {
    "alice".parse().unwrap()
}

pub fn ntoy(near_amount: Balance) -> Balance {
    near_amount * 10u128.pow(24)
}

#[cfg(test)]
pub mod tests {
    use near_sdk::test_utils::VMContextBuilder;
    use near_sdk::{testing_env, AccountId, Balance, BlockHeight, VMContext};

    use crate::*;

    use super::*;

    pub struct Emulator {
        pub contract: Contract,
        pub block_index: BlockHeight,
        pub context: VMContext,
    }

    impl Emulator {
        pub fn new(request_fee: Balance) -> Self {
            let context = VMContextBuilder::new()
                .current_account_id(coordinator())
                .account_balance(ntoy(10))
                .build();
            testing_env!(context.clone());
            let contract = Contract::new(U128(request_fee), operator());
            Emulator {
                contract,
                block_index: 0,
                context,
            }
        }

        pub fn call_from(&mut self, caller: AccountId, deposit: Balance) {
            self.context = VMContextBuilder::new()
                .current_account_id(coordinator())
                .predecessor_account_id(caller.clone())
                .signer_account_id(caller)
                .block_index(self.block_index)
                .attached_deposit(deposit)
                .account_balance(ntoy(10))
                .build();
            testing_env!(self.context.clone());
        }

        pub fn skip_blocks(&mut self, num: BlockHeight, random_seed: [u8; 32]) {
            self.block_index += num;
            self.context = VMContextBuilder::new()
                .current_account_id(coordinator())
                .block_index(self.block_index)
                .random_seed(random_seed)
                .account_balance(ntoy(10))
                .build();
            testing_env!(self.context.clone());
        }
    }
}
