/// Entry point for the coordinator process. Initializes logging, loads
/// configuration, opens a ledger connection, constructs the shared
/// membership/placement/challenge/registry components, starts the scratch
/// janitor, and serves the renter-lifecycle, upload/download, and
/// challenge-verification endpoints over Actix-web.
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
use std::time::Duration;

mod challenge;
mod config;
mod error;
mod handlers;
mod membership;
mod models;
mod placement;
mod pubkey_registry;
mod reconstruction;
mod renter_client;
mod scratch;
mod settlement;

use config::CoordinatorConfig;
use handlers::LedgerContext;
use membership::Membership;
use placement::PlacementIndex;
use pubkey_registry::PublicKeyRegistry;
use renter_client::RenterClient;
use scratch::ScratchArea;

const COORDINATOR_ACCOUNT_NAME: &str = "coordinator";

fn setup_logging() -> std::io::Result<()> {
    let log_dir = "./logs";
    fs::create_dir_all(log_dir)?;

    let log_path = Path::new(log_dir).join("coordinator.log.txt");
    let max_size = 10 * 1024 * 1024;
    if log_path.exists() {
        if let Ok(metadata) = fs::metadata(&log_path) {
            if metadata.len() > max_size {
                let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
                let archive_path = Path::new(log_dir).join(format!("coordinator.log.{}.txt", timestamp));
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

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    setup_logging()?;
    info!("Starting coordinator");

    let config = CoordinatorConfig::from_env();

    let ledger_context = match LedgerClient::connect(&config.ledger_addr).await {
        Ok(client) => match client.create_account(COORDINATOR_ACCOUNT_NAME, 0.0).await {
            Ok(address) => {
                info!("Opened coordinator ledger account {}", address);
                Some(LedgerContext {
                    client,
                    coordinator_address: address,
                })
            }
            Err(e) => {
                error!("Failed to open coordinator ledger account: {}", e);
                None
            }
        },
        Err(e) => {
            warn!("Could not connect to ledger at {}: {}", config.ledger_addr, e);
            None
        }
    };

    let membership = web::Data::new(Membership::new(config.rack_count, config.renter_timeout_secs));
    let placement_index = web::Data::new(PlacementIndex::new());
    let pubkey_registry = web::Data::new(PublicKeyRegistry::load(&config.pubkey_registry_path).await);
    let challenges = web::Data::new(challenge::ChallengeTable::new(config.challenge_ttl_secs));
    let renter_client = web::Data::new(RenterClient::new(config.renter_rpc_timeout_secs));
    let scratch = web::Data::new(
        ScratchArea::new(&config.scratch_dir, config.staged_artifact_ttl_secs)
            .await
            .expect("failed to initialize scratch directory"),
    );
    let ledger_data = web::Data::new(ledger_context);
    let config_data = web::Data::new(config.clone());

    let janitor_scratch = scratch.clone();
    tokio::spawn(async move {
        janitor_scratch
            .run_janitor(Duration::from_secs(10))
            .await;
    });

    let bind_addr = config.bind_addr.clone();
    info!("Starting coordinator HTTP server on {}", bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(membership.clone())
            .app_data(placement_index.clone())
            .app_data(pubkey_registry.clone())
            .app_data(challenges.clone())
            .app_data(renter_client.clone())
            .app_data(scratch.clone())
            .app_data(ledger_data.clone())
            .app_data(config_data.clone())
            .route("/", web::get().to(handlers::health))
            .route("/register-renter/", web::post().to(handlers::register_renter))
            .route("/heartbeat/", web::post().to(handlers::heartbeat))
            .route("/get-renters/", web::get().to(handlers::get_renters))
            .route(
                "/register-public-key/",
                web::post().to(handlers::register_public_key),
            )
            .route("/upload/", web::post().to(handlers::upload))
            .route("/download/{filename}", web::get().to(handlers::download))
            .route(
                "/verify-challenge/{filename}",
                web::post().to(handlers::verify_challenge),
            )
            .route("/delete/{filename}", web::post().to(handlers::delete_file))
    })
    .bind(bind_addr)?
    .run()
    .await
}
