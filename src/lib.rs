pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::Cli;

pub use crate::adapters::http::{ApiConfig, RestClient};
pub use crate::core::engine::{DesiredResources, Outcome, Reconciler, RunOptions, RunReport};
pub use crate::domain::ports::MailApi;
pub use crate::utils::error::{Result, SyncError};
