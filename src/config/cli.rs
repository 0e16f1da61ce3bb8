use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::adapters::http::{ApiConfig, DEFAULT_BASE_URL};
use crate::utils::error::{Result, SyncError};

pub const TOKEN_ENV_VAR: &str = "PURELYMAIL_API_TOKEN";

#[derive(Debug, Parser)]
#[command(name = "purelymail-sync")]
#[command(about = "Reconcile declared Purelymail state against the live account")]
pub struct Cli {
    /// Purelymail API token (falls back to $PURELYMAIL_API_TOKEN)
    #[arg(long)]
    pub api_token: Option<String>,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Skip TLS certificate verification (test endpoints only)
    #[arg(long)]
    pub insecure: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Converge the account to a desired-state file
    Apply {
        /// Path to the TOML desired-state file
        #[arg(long, default_value = "purelymail.toml")]
        state: PathBuf,

        /// Compute and report the plan without mutating anything
        #[arg(long)]
        dry_run: bool,

        /// Include a before/after diff in the report
        #[arg(long)]
        diff: bool,
    },
    /// Print the account's remaining credit
    Credit,
    /// Print the ownership-proof code used for domain DNS setup
    OwnershipCode,
}

impl Cli {
    /// Token resolution happens here, once; nothing downstream reads the
    /// process environment.
    pub fn api_config(&self) -> Result<ApiConfig> {
        let api_token = match &self.api_token {
            Some(token) => token.clone(),
            None => std::env::var(TOKEN_ENV_VAR).map_err(|_| SyncError::ConfigError {
                message: format!("no API token given (use --api-token or ${})", TOKEN_ENV_VAR),
            })?,
        };
        Ok(ApiConfig {
            api_token,
            base_url: self.base_url.clone(),
            api_version: crate::adapters::http::DEFAULT_API_VERSION.to_string(),
            insecure: self.insecure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_token_wins_over_environment() {
        let cli = Cli::parse_from([
            "purelymail-sync",
            "--api-token",
            "from-flag",
            "credit",
        ]);
        assert_eq!(cli.api_config().unwrap().api_token, "from-flag");
    }

    #[test]
    fn apply_defaults() {
        let cli = Cli::parse_from(["purelymail-sync", "--api-token", "t", "apply"]);
        match cli.command {
            Command::Apply {
                state,
                dry_run,
                diff,
            } => {
                assert_eq!(state, PathBuf::from("purelymail.toml"));
                assert!(!dry_run);
                assert!(!diff);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.base_url, DEFAULT_BASE_URL);
        assert!(!cli.insecure);
    }
}
