/// Entry point for the renter process. Initializes local blob storage,
/// reserves advertised capacity, optionally opens a ledger account,
/// registers with the coordinator, starts a heartbeat loop, and serves the
/// store/retrieve/delete shard endpoints over Actix-web.
use actix_web::{web, App, HttpServer};
use chrono::Local;
use colored::Colorize;
use env_logger::Builder;
use ledger::LedgerClient;
use log::{error, info, warn, LevelFilter};
use serde_json::json;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

mod config;
mod coordinator_client;
mod error;
mod handlers;
mod models;
mod storage;

use config::RenterConfig;
use coordinator_client::CoordinatorClient;
use storage::ShardStorage;

fn setup_logging() -> std::io::Result<()> {
    let log_dir = "./logs";
    fs::create_dir_all(log_dir)?;

    let log_path = Path::new(log_dir).join("renter.log.txt");
    let max_size = 10 * 1024 * 1024;
    if log_path.exists() {
        if let Ok(metadata) = fs::metadata(&log_path) {
            if metadata.len() > max_size {
                let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
                let archive_path = Path::new(log_dir).join(format!("renter.log.{}.txt", timestamp));
                fs::rename(&log_path, &archive_path)?;
                info!("Rotated log file to {}", archive_path.display());
            }
        }
    }

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .format(move |buf, record| {
            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            let message = format!("{}", record.args());
            let plain_message = strip_ansi_escapes::strip(&message);
            let plain_message = String::from_utf8(plain_message).unwrap_or(message.clone());

            let log_entry = json!({
                "timestamp": timestamp,
                "level": record.level().to_string(),
                "message": plain_message
            });
            writeln!(log_file.try_clone()?, "{}", log_entry.to_string())?;

            writeln!(
                buf,
                "[{}] {}: {}",
                timestamp.bright_blue(),
                record.level(),
                message
            )
        })
        .write_style(env_logger::WriteStyle::Always)
        .init();

    Ok(())
}

/// Loads a previously-assigned renter id from `<storage_dir>/renter_id.txt`
/// if present, so that a restart re-registers idempotently from the peer's
/// side, or generates and persists a fresh one.
fn load_or_create_renter_id(storage_dir: &str) -> std::io::Result<String> {
    let path = Path::new(storage_dir).join("renter_id.txt");
    if let Ok(existing) = fs::read_to_string(&path) {
        let trimmed = existing.trim().to_string();
        if !trimmed.is_empty() {
            return Ok(trimmed);
        }
    }
    let id = Uuid::new_v4().to_string();
    fs::write(&path, &id)?;
    Ok(id)
}

async fn heartbeat_loop(
    client: Arc<CoordinatorClient>,
    renter_id: String,
    ledger_address: Option<String>,
    interval_secs: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        interval.tick().await;
        client.heartbeat(&renter_id, ledger_address.clone()).await;
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    setup_logging()?;
    info!("Starting renter node");

    let config = RenterConfig::from_env();

    let storage = ShardStorage::new(&config.storage_dir)
        .await
        .expect("failed to initialize shard storage directory");
    storage
        .allocate_placeholder(config.storage_available_bytes)
        .await
        .expect("failed to reserve advertised storage capacity");

    let renter_id =
        load_or_create_renter_id(&config.storage_dir).expect("failed to load/create renter id");
    info!("Renter identity: {}", renter_id);

    let ledger_address = if let Some(ledger_addr) = &config.ledger_addr {
        match LedgerClient::connect(ledger_addr).await {
            Ok(client) => match client.create_account(&format!("renter_{}", renter_id), 0.0).await {
                Ok(address) => {
                    info!("Opened ledger account {}", address);
                    Some(address)
                }
                Err(e) => {
                    error!("Failed to create ledger account: {}", e);
                    None
                }
            },
            Err(e) => {
                warn!("Could not connect to ledger at {}: {}", ledger_addr, e);
                None
            }
        }
    } else {
        info!("No LEDGER_BIND_ADDR configured, continuing without a ledger account");
        None
    };

    let coordinator_client = Arc::new(CoordinatorClient::new(config.coordinator_url.clone()));
    let assigned_id = coordinator_client
        .register(
            Some(renter_id.clone()),
            &config.public_url,
            config.storage_available_bytes,
            ledger_address.clone(),
        )
        .await
        .expect("failed to register with coordinator");

    tokio::spawn(heartbeat_loop(
        coordinator_client.clone(),
        assigned_id.clone(),
        ledger_address,
        config.heartbeat_interval_secs,
    ));

    let bind_addr = config.bind_addr.clone();
    info!("Starting renter HTTP server on {}", bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(storage.clone()))
            .route("/", web::get().to(handlers::health))
            .route("/store-shard/", web::post().to(handlers::store_shard))
            .route("/retrieve-shard/", web::get().to(handlers::retrieve_shard))
            .route("/delete-shard/", web::post().to(handlers::delete_shard))
    })
    .bind(bind_addr)?
    .run()
    .await
}
