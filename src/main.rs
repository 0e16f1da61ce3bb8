use clap::Parser;

use purelymail_sync::config::cli::{Cli, Command};
use purelymail_sync::config::state;
use purelymail_sync::utils::logger;
use purelymail_sync::{MailApi, Reconciler, RestClient, RunOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger::init_cli_logger(cli.verbose);
    tracing::info!("Starting purelymail-sync");

    if let Err(e) = run(&cli).await {
        tracing::error!("Run failed: {e}");
        eprintln!("❌ {e}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: &Cli) -> purelymail_sync::Result<()> {
    let client = RestClient::new(cli.api_config()?)?;

    match &cli.command {
        Command::Apply {
            state,
            dry_run,
            diff,
        } => {
            let desired = state::load_state(state)?;
            let engine = Reconciler::new(
                client,
                RunOptions {
                    dry_run: *dry_run,
                    want_diff: *diff,
                },
            );

            let report = engine.run(&desired).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if *dry_run {
                tracing::info!(changed = report.changed(), "dry run complete, nothing applied");
            } else if report.changed() {
                tracing::info!("✅ account converged to declared state");
            } else {
                tracing::info!("✅ account already matches declared state");
            }
        }
        Command::Credit => {
            let credit = client.check_account_credit().await?;
            println!("{credit}");
        }
        Command::OwnershipCode => {
            let code = client.get_ownership_code().await?;
            println!("{code}");
        }
    }

    Ok(())
}
