use anyhow::Context;
use tracing::info;

pub mod adapters;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod ports;
pub mod push;
pub mod server;
pub mod types;

/// Resolves the topic, connects the push client and serves notify requests
/// until the listener fails. Every error returned here is fatal.
pub async fn run(config: config::AppConfig) -> anyhow::Result<()> {
    info!(certificate = %config.certificate.display(), "loading certificate");
    let topic = identity::load_topic(&config.certificate).context("failed to resolve topic")?;
    info!("UID={topic}");
    info!("make sure the mail server's push topic is set to the same value");

    let sender = adapters::ApnsSender::from_files(
        &config.certificate,
        &config.private_key,
        config.environment,
    )
    .context("failed to set up push client")?;
    let pusher = push::Pusher::new(sender, adapters::SystemTimeProvider, topic);

    let listener = server::bind(&config.socket)?;
    info!(socket = %config.socket.display(), "listening");
    server::serve(listener, pusher, config.concurrency).await?;
    Ok(())
}
