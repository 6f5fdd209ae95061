/// Wire types for the ledger's request/reply RPC. Each `Request` is sent as a
/// single newline-terminated JSON object over the connection established at
/// client startup; the server answers with exactly one newline-terminated
/// `Response` per request, in order.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateAccount {
        username: String,
        initial_balance: f64,
    },
    GetBalance {
        address: String,
    },
    SendMoney {
        sender: String,
        receiver: String,
        amount: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub transaction_hash: String,
    pub sender: String,
    pub receiver: String,
    pub amount: f64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Address { address: String },
    Balance { balance: f64 },
    Receipt(Receipt),
    Error { message: String },
}
