use ledger_client::config::AppConfig;
use ledger_client::events::{listener, Event};
use ledger_client::logging::init_logging;
use ledger_client::provider::Provider;
use log::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({}), using defaults", e);
        AppConfig::default()
    });
    init_logging(&config.logging)?;

    info!(
        "Starting ledger-watch against {} (group {})",
        config.rpc.endpoint, config.chain.group_id
    );

    let provider = Provider::from_config(&config)?;

    provider.on(
        "block",
        listener(|event| {
            if let Event::Block(number) = event {
                info!("New block {}", number);
            }
        }),
    )?;
    provider.on(
        "error",
        listener(|event| {
            if let Event::Error(e) = event {
                warn!("Poll error: {}", e);
            }
        }),
    )?;
    provider.on(
        "network",
        listener(|event| {
            if let Event::Network { new, .. } = event {
                info!("Connected to {} (chain {})", new.name, new.chain_id);
            }
        }),
    )?;

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Unable to listen for shutdown signal: {}", e),
    }

    provider.stop();
    provider.remove_all_listeners(None);
    info!("ledger-watch stopped");
    Ok(())
}
