use clap::Parser;
use ledger_client::cli::{Cli, CliHandler};
use ledger_client::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Quieter than the daemon
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = cli.apply_overrides(AppConfig::load().unwrap_or_default());

    let cli_handler = CliHandler::new(config);
    if let Err(e) = cli_handler.execute_command(&cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
