use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "discord-event-roster", version, about)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    pub check_config: bool,
}
