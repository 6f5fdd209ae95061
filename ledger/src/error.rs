/// Error type shared by the ledger server and the `LedgerClient` used by
/// coordinator and renter binaries.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("insufficient balance: account {address} has {balance}, needs {amount}")]
    InsufficientBalance {
        address: String,
        balance: f64,
        amount: f64,
    },

    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("ledger returned an error: {0}")]
    Remote(String),
}
