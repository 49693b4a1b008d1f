use anyhow::{Context, Result};
use clap::Parser;
use nostr_alert::config::DEFAULT_RELAY;
use nostr_alert::dispatch::sender_keys;
use nostr_alert::{AlertServer, Config, ContentFormat};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "nostr-alert")]
#[command(version, about = "Forward alert webhooks as encrypted Nostr direct messages", long_about = None)]
struct Cli {
    /// Relay URL
    #[arg(long, default_value = DEFAULT_RELAY)]
    relay: String,

    /// Request body format
    #[arg(long, value_enum, default_value_t = ContentFormat::Grafana)]
    format: ContentFormat,

    /// Seconds to wait for the relay to acknowledge an event
    #[arg(long, default_value_t = 7)]
    publish_timeout: u64,

    /// Answer 500 when the relay does not accept the event
    #[arg(long)]
    strict_publish: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nostr_alert=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::from_env(cli.relay)
        .context("Invalid configuration")?
        .with_content_format(cli.format)
        .with_publish_timeout(Duration::from_secs(cli.publish_timeout))
        .with_strict_publish(cli.strict_publish);

    match sender_keys(&config.sender_nsec) {
        Ok(keys) => info!("Sender: {}", keys.public_key().to_hex()),
        Err(e) => warn!("{}; every webhook call will fail", e),
    }
    info!("Relay: {}", config.relay_url);
    info!("Body format: {}", config.content_format);
    if config.auth.is_some() {
        info!("Webhook auth: basic");
    }

    AlertServer::from_config(&config).run().await
}
