/// Library surface for the ledger service: the wire protocol, the
/// in-memory account store, and the `LedgerClient` that the coordinator and
/// renter binaries link against to reach a running ledger process.
pub mod accounts;
pub mod client;
pub mod error;
pub mod protocol;
pub mod server;

pub use client::LedgerClient;
pub use error::LedgerError;
pub use protocol::{Receipt, Request, Response};
