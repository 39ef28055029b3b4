// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hearth - a personal AI agent runtime.
//!
//! This is the binary entry point for the Hearth daemon.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hearth_config::{ConfigError, HearthConfig};

/// Hearth - a personal AI agent runtime.
#[derive(Parser, Debug)]
#[command(name = "hearth", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the agent and listen on the IPC socket.
    Serve,
    /// Validate configuration and print the resolved model setup.
    Check,
}

fn load_config(path: Option<&std::path::Path>) -> Result<HearthConfig, Vec<ConfigError>> {
    match path {
        Some(path) => hearth_config::load_and_validate_path(path),
        None => hearth_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            hearth_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Check) => {
            if let Err(e) = check::run_check(&config) {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        None => {
            println!("hearth: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn explicit_config_file_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hearth.toml");
        std::fs::write(&path, "[agent]\nname = \"ember\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.agent.name, "ember");
    }

    #[test]
    fn invalid_config_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hearth.toml");
        std::fs::write(&path, "[models]\ndefault = \"no-slash\"\n").unwrap();

        let errors = load_config(Some(&path)).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn cli_parses_global_config_flag() {
        let cli = Cli::parse_from(["hearth", "serve", "--config", "/tmp/h.toml"]);
        assert!(matches!(cli.command, Some(Commands::Serve)));
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("/tmp/h.toml")));
    }
}
