use dtl_store::StoreError;
use dtl_types::PriceError;

/// Coarse classification of contract failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed or missing request fields.
    Validation,
    /// A referenced account, evidence record, listing, or receipt is absent.
    NotFound,
    /// A price, amount, or caller constraint would be violated.
    InvariantViolation,
    /// The payer cannot cover the transfer.
    InsufficientBalance,
    /// The ledger read or write itself failed.
    Store,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not-found"),
            Self::InvariantViolation => write!(f, "invariant-violation"),
            Self::InsufficientBalance => write!(f, "insufficient-balance"),
            Self::Store => write!(f, "store"),
        }
    }
}

/// Errors produced by contract operations.
///
/// None of these leave partial writes behind once the surrounding ledger
/// transaction is discarded.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("[{function}] incorrect number of arguments: expecting {expected}, got {actual}")]
    InvalidArguments {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("account {0} not found")]
    AccountNotFound(String),

    #[error("account {0} already exists")]
    AccountExists(String),

    #[error("account {0} is frozen")]
    AccountFrozen(String),

    #[error("buyer account {0} does not exist")]
    InvalidBuyer(String),

    #[error("no data evidence at {0}")]
    DataNotFound(String),

    #[error("no title listing at {0}")]
    TitleNotFound(String),

    #[error("no purchase record at {0}")]
    NoPurchaseRecord(String),

    #[error("hash mismatch for title {title}: purchased {recorded}, requested {requested}")]
    HashMismatch {
        title: String,
        recorded: String,
        requested: String,
    },

    #[error("invalid price: {0}")]
    InvalidPrice(PriceError),

    #[error("invalid price range: {0}")]
    InvalidRange(PriceError),

    #[error("invalid price value: {0}")]
    InvalidValue(PriceError),

    #[error("invalid amount {amount} owed to {account}")]
    InvalidAmount { account: String, amount: i64 },

    #[error("amount overflow: {0}")]
    AmountOverflow(String),

    #[error("insufficient balance in {account}: has {balance}, needs {required}")]
    InsufficientBalance {
        account: String,
        balance: i64,
        required: i64,
    },

    #[error("transfer details or accounts are empty")]
    EmptyTransfer,

    #[error("one purchase names {title} with two hashes: {first} and {second}")]
    ConflictingHashes {
        title: String,
        first: String,
        second: String,
    },

    #[error("caller identity does not match account {0}")]
    CallerMismatch(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ContractError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_)
            | Self::InvalidArguments { .. }
            | Self::UnknownFunction(_)
            | Self::ConflictingHashes { .. }
            | Self::AccountExists(_) => ErrorCategory::Validation,
            Self::AccountNotFound(_)
            | Self::InvalidBuyer(_)
            | Self::DataNotFound(_)
            | Self::TitleNotFound(_)
            | Self::NoPurchaseRecord(_) => ErrorCategory::NotFound,
            Self::HashMismatch { .. }
            | Self::InvalidPrice(_)
            | Self::InvalidRange(_)
            | Self::InvalidValue(_)
            | Self::InvalidAmount { .. }
            | Self::AmountOverflow(_)
            | Self::EmptyTransfer
            | Self::AccountFrozen(_)
            | Self::CallerMismatch(_) => ErrorCategory::InvariantViolation,
            Self::InsufficientBalance { .. } => ErrorCategory::InsufficientBalance,
            Self::Store(_) => ErrorCategory::Store,
        }
    }
}

pub type ContractResult<T> = Result<T, ContractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(
            ContractError::Validation("x".into()).category(),
            ErrorCategory::Validation
        );
        assert_eq!(
            ContractError::DataNotFound("1/A/T1/h1".into()).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            ContractError::InvalidRange(PriceError::InvalidRange { min: 100, max: 50 }).category(),
            ErrorCategory::InvariantViolation
        );
        assert_eq!(
            ContractError::InsufficientBalance {
                account: "B".into(),
                balance: 1,
                required: 2
            }
            .category(),
            ErrorCategory::InsufficientBalance
        );
        assert_eq!(
            ContractError::from(StoreError::LockPoisoned).category(),
            ErrorCategory::Store
        );
    }

    #[test]
    fn messages_are_human_readable() {
        let err = ContractError::InvalidPrice(PriceError::InvalidRange { min: 100, max: 50 });
        assert_eq!(err.to_string(), "invalid price: price range [100 ~ 50] is invalid");
        let err = ContractError::InvalidArguments {
            function: "setTitle".into(),
            expected: 1,
            actual: 0,
        };
        assert!(err.to_string().starts_with("[setTitle]"));
    }
}
