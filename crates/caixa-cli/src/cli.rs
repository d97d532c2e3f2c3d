//! Command-line arguments.

use clap::{Parser, Subcommand};

/// Spreadsheet-backed bookkeeping for small businesses
#[derive(Parser, Debug)]
#[command(name = "caixa", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "CAIXA_CONFIG")]
    pub config: Option<String>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Listen address, overriding `server.bind`
        #[arg(long)]
        bind: Option<String>,
    },
    /// Find or provision the spreadsheet of a client
    Resolve {
        /// Client name, exactly as typed on the cadastro screen
        name: String,
    },
    /// Print the balance view of a client
    Balance {
        /// Client name
        name: String,
    },
    /// Inspect or edit the configuration file
    Config {
        /// Action
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// `caixa config` actions.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path
    Path,
    /// Print the effective configuration
    Show,
    /// Print one value by dotted key, e.g. `store.backend`
    Get {
        /// Dotted key
        key: String,
    },
    /// Set one value by dotted key in the config file
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },
    /// Write a default config file
    Init {
        /// Target path instead of the default location
        #[arg(long)]
        file: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration as `CAIXA_*` variables
    Export {
        /// Format as `--env KEY=VALUE` for docker run
        #[arg(long)]
        docker_env: bool,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_with_global_config() {
        let cli = Cli::try_parse_from(["caixa", "serve", "--bind", "0.0.0.0:80", "-c", "x.toml"])
            .unwrap();
        assert_eq!(cli.config.as_deref(), Some("x.toml"));
        assert!(matches!(cli.command, Command::Serve { bind: Some(ref b) } if b == "0.0.0.0:80"));
    }

    #[test]
    fn test_parse_config_set() {
        let cli = Cli::try_parse_from(["caixa", "config", "set", "store.backend", "memory"]).unwrap();
        match cli.command {
            Command::Config {
                action: ConfigAction::Set { key, value },
            } => {
                assert_eq!(key, "store.backend");
                assert_eq!(value, "memory");
            }
            other => unreachable!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_resolve_requires_name() {
        assert!(Cli::try_parse_from(["caixa", "resolve"]).is_err());
    }
}
