/// TCP front-end for the ledger service. Each connected peer keeps one
/// long-lived connection (the reference transport is "a synchronous
/// request/reply RPC on a single TCP connection established at startup");
/// the server simply serves as many such connections concurrently as
/// connect, each on its own task.
use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::accounts::AccountStore;
use crate::protocol::{Request, Response};

pub async fn run(bind_addr: &str) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!("Ledger service listening on {}", bind_addr);
    let accounts = Arc::new(AccountStore::new());

    loop {
        let (socket, peer_addr) = listener.accept().await?;
        let accounts = accounts.clone();
        info!("Accepted ledger connection from {}", peer_addr);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, accounts).await {
                warn!("Ledger connection {} closed with error: {}", peer_addr, e);
            } else {
                debug!("Ledger connection {} closed", peer_addr);
            }
        });
    }
}

async fn handle_connection(
    socket: TcpStream,
    accounts: Arc<AccountStore>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = socket.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            return Ok(());
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(trimmed) {
            Ok(request) => dispatch(&accounts, request),
            Err(e) => {
                error!("Failed to parse ledger request: {}", e);
                Response::Error {
                    message: format!("malformed request: {}", e),
                }
            }
        };

        let mut payload = serde_json::to_string(&response).unwrap_or_else(|e| {
            error!("Failed to serialize ledger response: {}", e);
            "{\"status\":\"error\",\"message\":\"internal error\"}".to_string()
        });
        payload.push('\n');
        write_half.write_all(payload.as_bytes()).await?;
        write_half.flush().await?;
    }
}

fn dispatch(accounts: &AccountStore, request: Request) -> Response {
    match request {
        Request::CreateAccount {
            username,
            initial_balance,
        } => {
            let address = accounts.create_account(&username, initial_balance);
            info!("Created/looked up account for {}: {}", username, address);
            Response::Address { address }
        }
        Request::GetBalance { address } => match accounts.get_balance(&address) {
            Ok(balance) => Response::Balance { balance },
            Err(e) => Response::Error {
                message: e.to_string(),
            },
        },
        Request::SendMoney {
            sender,
            receiver,
            amount,
        } => match accounts.send_money(&sender, &receiver, amount, Utc::now().timestamp()) {
            Ok(receipt) => {
                info!(
                    "Settled {} from {} to {} (tx {})",
                    amount, sender, receiver, receipt.transaction_hash
                );
                Response::Receipt(receipt)
            }
            Err(e) => {
                warn!("send_money failed ({} -> {}): {}", sender, receiver, e);
                Response::Error {
                    message: e.to_string(),
                }
            }
        },
    }
}
