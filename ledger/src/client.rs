/// Client for the ledger's request/reply RPC, used by the coordinator and
/// renter binaries. Holds a single TCP connection established at `connect`
/// time; per the external-interface contract, reconnection after a dropped
/// connection is the caller's responsibility (call `connect` again).
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::error::LedgerError;
use crate::protocol::{Receipt, Request, Response};

pub struct LedgerClient {
    inner: Mutex<ClientConn>,
}

struct ClientConn {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl LedgerClient {
    pub async fn connect(addr: &str) -> Result<Self, LedgerError> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, writer) = stream.into_split();
        Ok(Self {
            inner: Mutex::new(ClientConn {
                reader: BufReader::new(read_half),
                writer,
            }),
        })
    }

    async fn call(&self, request: Request) -> Result<Response, LedgerError> {
        let mut conn = self.inner.lock().await;
        let mut payload = serde_json::to_string(&request)?;
        payload.push('\n');
        conn.writer.write_all(payload.as_bytes()).await?;
        conn.writer.flush().await?;

        let mut line = String::new();
        let bytes_read = conn.reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            return Err(LedgerError::ConnectionClosed);
        }
        let response: Response = serde_json::from_str(line.trim())?;
        Ok(response)
    }

    pub async fn create_account(
        &self,
        username: &str,
        initial_balance: f64,
    ) -> Result<String, LedgerError> {
        match self
            .call(Request::CreateAccount {
                username: username.to_string(),
                initial_balance,
            })
            .await?
        {
            Response::Address { address } => Ok(address),
            Response::Error { message } => Err(LedgerError::Remote(message)),
            _ => Err(LedgerError::Remote("unexpected response".to_string())),
        }
    }

    pub async fn get_balance(&self, address: &str) -> Result<f64, LedgerError> {
        match self
            .call(Request::GetBalance {
                address: address.to_string(),
            })
            .await?
        {
            Response::Balance { balance } => Ok(balance),
            Response::Error { message } => Err(LedgerError::Remote(message)),
            _ => Err(LedgerError::Remote("unexpected response".to_string())),
        }
    }

    pub async fn send_money(
        &self,
        sender: &str,
        receiver: &str,
        amount: f64,
    ) -> Result<Receipt, LedgerError> {
        match self
            .call(Request::SendMoney {
                sender: sender.to_string(),
                receiver: receiver.to_string(),
                amount,
            })
            .await?
        {
            Response::Receipt(receipt) => Ok(receipt),
            Response::Error { message } => Err(LedgerError::Remote(message)),
            _ => Err(LedgerError::Remote("unexpected response".to_string())),
        }
    }
}
