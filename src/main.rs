mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
  let cli = Cli::parse();

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
  tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

  match demo_scraper::run(&cli.into_config()).await {
    Ok(summary) if summary.has_failures() => ExitCode::FAILURE,
    Ok(_) => ExitCode::SUCCESS,
    Err(e) => {
      error!(error = %e, "[Error] {e}");
      ExitCode::FAILURE
    }
  }
}
