// SPDX-FileCopyrightText: 2026 Grabbit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grabbit - a Telegram media download bot.
//!
//! This is the binary entry point for the Grabbit bot.

mod serve;

use clap::{Parser, Subcommand};

/// Grabbit - a Telegram media download bot.
#[derive(Parser, Debug)]
#[command(name = "grabbit", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the bot (default).
    Serve,
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match grabbit_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            grabbit_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                eprintln!("grabbit: failed to render config: {e}");
                std::process::exit(1);
            }
        },
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("grabbit: {e}");
                std::process::exit(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed)
        let config = grabbit_config::load_and_validate().expect("default config should be valid");
        assert_eq!(config.bot.name, "grabbit");
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = grabbit_config::load_and_validate().unwrap();
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("[download]"));
        assert!(rendered.contains("free_daily_limit"));
    }
}
