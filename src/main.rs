//! ChainTicket - Solana ticketing client
//!
//! Command-line entry point for operating a ticketed event on-chain:
//! create and amend events, open sales, buy, refund, and burn tickets,
//! withdraw proceeds, and run bulk refund or revoke sweeps across every
//! current ticket holder.

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(dead_code)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chainticket::bulk::BulkReport;
use chainticket::config::Config;
use chainticket::instructions::{
    lamports_to_sol, sol_to_lamports, AmendEventFields, InitEventFields,
};
use chainticket::metrics::metrics;
use chainticket::TicketClient;

const SECONDS_PER_DAY: i64 = 86_400;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", env = "CHAINTICKET_CONFIG")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new event owned by the configured wallet
    InitEvent {
        /// Event name for the ticket collection
        #[arg(long)]
        name: String,

        /// Short token symbol for the tickets
        #[arg(long)]
        symbol: String,

        /// URI of the event image
        #[arg(long)]
        image_uri: String,

        /// URI of the ticket metadata document
        #[arg(long)]
        metadata_uri: String,

        /// Event date, RFC 3339 or YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// Ticket price in SOL
        #[arg(long)]
        price_sol: f64,

        /// Number of tickets on sale
        #[arg(long)]
        tickets: u32,

        /// Days before the event during which refunds stay open
        #[arg(long, default_value = "7")]
        refund_days: i64,
    },

    /// Amend date, price, or capacity of the wallet's event
    AmendEvent {
        /// New event date, RFC 3339 or YYYY-MM-DD
        #[arg(long)]
        date: Option<String>,

        /// New ticket price in SOL
        #[arg(long)]
        price_sol: Option<f64>,

        /// New number of tickets
        #[arg(long)]
        tickets: Option<u32>,
    },

    /// Open the wallet's event for ticket purchases
    StartSale,

    /// Buy one ticket from the given organizer's event
    BuyTicket {
        /// Organizer wallet address
        #[arg(long)]
        organizer: String,
    },

    /// Refund one buyer's ticket from the wallet's event
    RefundTicket {
        /// Buyer wallet address
        #[arg(long)]
        buyer: String,
    },

    /// Burn the wallet's own ticket for the given organizer's event
    BurnTicket {
        /// Organizer wallet address
        #[arg(long)]
        organizer: String,
    },

    /// As the organizer, revoke the ticket held by one wallet
    DelegateBurn {
        /// Holder wallet address
        #[arg(long)]
        holder: String,
    },

    /// Withdraw proceeds from the wallet's event vault
    WithdrawFunds,

    /// Cancel the wallet's event
    CancelEvent,

    /// Close out the wallet's event after it has taken place
    EndEvent,

    /// Refund every current ticket holder of the wallet's event
    RefundAll,

    /// Revoke every outstanding ticket of the wallet's event
    RevokeAll,

    /// Show the on-chain state of an event
    ShowEvent {
        /// Organizer wallet address; defaults to the configured wallet
        #[arg(long)]
        organizer: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose)?;

    info!("🎟️ ChainTicket client");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    info!("📋 Loading configuration from: {}", args.config);
    let config = load_config(&args.config)?;

    let client = TicketClient::from_config(&config).context("Failed to initialize client")?;
    info!("💼 Wallet address: {}", client.wallet().pubkey());

    run_command(&client, args.command).await?;

    if config.monitoring.enable_metrics {
        debug!("metrics snapshot:\n{}", metrics().export()?);
    }

    Ok(())
}

async fn run_command(client: &TicketClient, command: Command) -> Result<()> {
    match command {
        Command::InitEvent {
            name,
            symbol,
            image_uri,
            metadata_uri,
            date,
            price_sol,
            tickets,
            refund_days,
        } => {
            let fields = InitEventFields {
                event_name: name,
                event_symbol: symbol,
                image_uri,
                metadata_uri,
                event_date: parse_date(&date)?,
                ticket_price: sol_to_lamports(price_sol)?,
                num_tickets: tickets,
                refund_period: refund_days
                    .checked_mul(SECONDS_PER_DAY)
                    .context("Refund period overflows")?,
            };
            let signature = client.init_event(fields).await?;
            info!("🎪 Event created: {}", signature);
        }

        Command::AmendEvent {
            date,
            price_sol,
            tickets,
        } => {
            if date.is_none() && price_sol.is_none() && tickets.is_none() {
                anyhow::bail!(
                    "Nothing to amend: provide at least one of --date, --price-sol, --tickets"
                );
            }
            let fields = AmendEventFields {
                event_date: date.as_deref().map(parse_date).transpose()?,
                ticket_price: price_sol.map(sol_to_lamports).transpose()?,
                num_tickets: tickets,
            };
            let signature = client.amend_event(fields).await?;
            info!("✏️ Event amended: {}", signature);
        }

        Command::StartSale => {
            let signature = client.start_sale().await?;
            info!("🟢 Sale opened: {}", signature);
        }

        Command::BuyTicket { organizer } => {
            let organizer = parse_pubkey(&organizer, "organizer")?;
            let signature = client.buy_ticket(&organizer).await?;
            info!("🎫 Ticket bought: {}", signature);
        }

        Command::RefundTicket { buyer } => {
            let buyer = parse_pubkey(&buyer, "buyer")?;
            let signature = client.refund_ticket(&buyer).await?;
            info!("💸 Ticket refunded: {}", signature);
        }

        Command::BurnTicket { organizer } => {
            let organizer = parse_pubkey(&organizer, "organizer")?;
            let signature = client.burn_ticket(&organizer).await?;
            info!("🔥 Ticket burned: {}", signature);
        }

        Command::DelegateBurn { holder } => {
            let holder = parse_pubkey(&holder, "holder")?;
            let signature = client.delegate_burn(&holder).await?;
            info!("🔥 Ticket revoked: {}", signature);
        }

        Command::WithdrawFunds => {
            let signature = client.withdraw_funds().await?;
            info!("🏦 Funds withdrawn: {}", signature);
        }

        Command::CancelEvent => {
            let signature = client.cancel_event().await?;
            info!("🛑 Event cancelled: {}", signature);
        }

        Command::EndEvent => {
            let signature = client.end_event().await?;
            info!("🏁 Event ended: {}", signature);
        }

        Command::RefundAll => {
            let report = client.refund_all().await?;
            print_report("refund", &report);
        }

        Command::RevokeAll => {
            let report = client.revoke_all().await?;
            print_report("revoke", &report);
        }

        Command::ShowEvent { organizer } => {
            let organizer = match organizer {
                Some(raw) => parse_pubkey(&raw, "organizer")?,
                None => client.wallet().pubkey(),
            };
            let event = client.fetch_event(&organizer).await?;
            let when = chrono::DateTime::from_timestamp(event.event_date, 0)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| event.event_date.to_string());
            info!("🎪 Event for organizer {}", organizer);
            info!("   Date: {}", when);
            info!("   Price: {} SOL", lamports_to_sol(event.ticket_price));
            info!("   Tickets: {}", event.num_tickets);
            info!("   Purchases open: {}", event.allow_purchase);
            info!("   Refund period: {}s", event.refund_period);
            info!("   Vault: {}", event.vault);
            info!("   Mint: {}", event.mint);
        }
    }
    Ok(())
}

fn print_report(action: &str, report: &BulkReport) {
    info!(
        "📊 Bulk {} complete ({}): {} confirmed, {} failed",
        action,
        report.correlation_id,
        report.confirmed.len(),
        report.failed.len()
    );
    for failure in &report.failed {
        warn!("   {}: {}", failure.holder, failure.error);
    }
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        "chainticket=debug,info"
    } else {
        "chainticket=info,warn,error"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    Ok(())
}

/// Load configuration from file with fallback to defaults
fn load_config(path: &str) -> Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path))
    } else {
        warn!("Config file '{}' not found, using defaults", path);
        Ok(Config::default())
    }
}

fn parse_date(raw: &str) -> Result<i64> {
    if let Ok(datetime) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(datetime.timestamp());
    }
    let date = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Unrecognized date '{}', expected RFC 3339 or YYYY-MM-DD", raw))?;
    let midnight = date.and_hms_opt(0, 0, 0).context("Invalid midnight")?;
    Ok(midnight.and_utc().timestamp())
}

fn parse_pubkey(raw: &str, what: &str) -> Result<Pubkey> {
    Pubkey::from_str(raw).with_context(|| format!("Invalid {} address: {}", what, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_both_formats() {
        assert_eq!(parse_date("1970-01-02").unwrap(), SECONDS_PER_DAY);
        assert_eq!(
            parse_date("2026-01-01T00:00:00+00:00").unwrap(),
            1_767_225_600
        );
        // Offsets are honored, not stripped.
        assert_eq!(
            parse_date("2026-01-01T02:00:00+02:00").unwrap(),
            1_767_225_600
        );
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("next tuesday").is_err());
        assert!(parse_date("2026-13-01").is_err());
    }

    #[test]
    fn test_parse_pubkey_round_trips() {
        let key = Pubkey::new_unique();
        assert_eq!(parse_pubkey(&key.to_string(), "organizer").unwrap(), key);
        assert!(parse_pubkey("not-a-key", "organizer").is_err());
    }
}
