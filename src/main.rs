#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

mod cli;
mod config;
mod discord;
mod housekeeping;
mod platform;
mod roster;
mod store;
mod utils;

use cli::Cli;
use config::Config;
use discord::DiscordClient;
use housekeeping::{ErrorLog, FaultReporter, Housekeeper, install_panic_hook};
use platform::EventPlatform;
use roster::{RosterCore, RosterSettings};
use store::StateStore;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Arc::new(Config::load_from_file(&cli.config)?);
    if cli.check_config {
        println!("{} is valid", cli.config.display());
        return Ok(());
    }

    utils::logging::init_tracing(&config.logging, &config.storage.error_log_file)?;
    info!("discord-event-roster v{VERSION} starting up");

    let discord = Arc::new(DiscordClient::new(config.clone())?);
    let identity = discord.start().await;
    let platform: Arc<dyn EventPlatform> = discord.clone();
    let log_channel_id = config.discord.log_channel_id.clone();

    let (fault_reporter, faults) = FaultReporter::new(platform.clone(), log_channel_id.clone());
    install_panic_hook(faults);
    let fault_handle = tokio::spawn(fault_reporter.run());

    let online = format!(
        "[{}] {} v{VERSION} is now online!",
        utils::timestamp(),
        identity.mention()
    );
    info!("logged in as {} v{VERSION}", identity.name);
    if let Err(err) = platform.send_message(&log_channel_id, &online).await {
        error!("failed to announce startup: {err}");
    }

    let housekeeper = Housekeeper::new(
        platform.clone(),
        log_channel_id,
        ErrorLog::new(&config.storage.error_log_file),
        config.housekeeping.target_uptime_days,
        identity.online_since,
        config.housekeeping.report_interval(),
    );
    let housekeeping_handle = tokio::spawn(housekeeper.run());

    let roster = Arc::new(RosterCore::new(
        platform.clone(),
        &config.discord.roster_channel_id,
        StateStore::new(&config.storage.data_file),
        RosterSettings::from(config.as_ref()),
    ));
    let roster_handle = tokio::spawn(roster.supervise());

    tokio::select! {
        _ = roster_handle => {},
        _ = housekeeping_handle => {},
        _ = fault_handle => {},
        _ = tokio::signal::ctrl_c() => info!("shutdown signal received"),
    }

    discord.stop().await;
    info!("discord-event-roster shutting down");
    Ok(())
}
