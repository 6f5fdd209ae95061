/// Entry point for the ledger service: a synchronous request/reply RPC
/// endpoint offering `create_account`, `get_balance`, and `send_money` over
/// a long-lived TCP connection per client. Durable persistence of the
/// ledger is out of scope for this core; accounts live only for the
/// lifetime of this process.
use chrono::Local;
use colored::Colorize;
use env_logger::Builder;
use log::{info, LevelFilter};
use serde_json::json;
use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

fn setup_logging() -> std::io::Result<()> {
    let log_dir = "./logs";
    fs::create_dir_all(log_dir)?;

    let log_path = Path::new(log_dir).join("ledger.log.txt");
    let max_size = 10 * 1024 * 1024;
    if log_path.exists() {
        if let Ok(metadata) = fs::metadata(&log_path) {
            if metadata.len() > max_size {
                let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
                let archive_path = Path::new(log_dir).join(format!("ledger.log.{}.txt", timestamp));
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

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    setup_logging()?;

    let bind_addr = env::var("LEDGER_BIND_ADDR").unwrap_or_else(|_| {
        info!("LEDGER_BIND_ADDR not set, using default: 127.0.0.1:7575");
        "127.0.0.1:7575".to_string()
    });

    info!("Starting ledger service");
    ledger::server::run(&bind_addr).await
}
