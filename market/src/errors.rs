use common::types::{EpochId, RequestId};
use near_sdk::{env, AccountId, Balance, BlockHeight};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarketError {
    #[error("Insufficient liquidity for number {number}: bucket capacity is {capacity}")]
    InsufficientLiquidity { number: u128, capacity: u128 },

    #[error("Ticket targets epoch {requested} but the current epoch is {current}")]
    StaleEpoch { requested: EpochId, current: EpochId },

    #[error("Ticket costs {expected}, received {received}")]
    IncorrectTicketPayment { expected: Balance, received: Balance },

    #[error("Token {0} is not the settlement currency of this market")]
    WrongSettlementToken(AccountId),

    #[error("Invalid ticket message: {0}")]
    InvalidTicketMessage(String),

    #[error("Liquidity pool capacity is unavailable for number {number}")]
    CapacityUnavailable { number: u128 },

    #[error("A draw is already in progress")]
    DrawAlreadyInProgress,

    #[error("Attached deposit {attached} does not cover the randomness cost {required}")]
    InsufficientRandomnessFee { attached: Balance, required: Balance },

    #[error("Only the randomness provider can deliver random values, got {0}")]
    UnauthorizedProvider(AccountId),

    #[error("Unknown randomness request {0}")]
    UnknownRequest(RequestId),

    #[error("Randomness request {0} is not awaiting delivery")]
    UnexpectedDelivery(RequestId),

    #[error("Settlement of epoch {epoch} is waiting for pool liquidity until block {retry_at}")]
    SettlementInFlight { epoch: EpochId, retry_at: BlockHeight },

    #[error("There is no stalled settlement to retry")]
    NothingToRetry,

    #[error("There is no failed randomness request to reissue")]
    NoFailedRequest,

    #[error("Winners of epoch {0} are already distributed")]
    NothingToDistribute(EpochId),

    #[error("Account {0} has no unclaimed winnings")]
    NoUnclaimedWinnings(AccountId),

    #[error("Custody balance {held} cannot cover payout {payout}")]
    InsufficientCustody { held: Balance, payout: Balance },

    #[error("Payout of {winners} winners overflows")]
    PayoutOverflow { winners: u64 },
}

impl MarketError {
    /// Aborts the current receipt, reverting every state change made by it.
    pub fn panic(&self) -> ! {
        env::panic_str(&self.to_string())
    }
}

pub trait OrPanic<T> {
    fn or_panic(self) -> T;
}

impl<T> OrPanic<T> for Result<T, MarketError> {
    fn or_panic(self) -> T {
        self.unwrap_or_else(|err| err.panic())
    }
}
