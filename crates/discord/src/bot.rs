//! Gateway client lifecycle.

use {
    anyhow::Context as _,
    secrecy::{ExposeSecret, Secret},
    serenity::Client,
    tracing::{info, warn},
};

use crate::handler::ReactionHandler;

/// Connect to the gateway and process messages until the connection ends or
/// Ctrl-C is received.
pub async fn run(token: &Secret<String>, handler: ReactionHandler) -> anyhow::Result<()> {
    let mut client = Client::builder(token.expose_secret(), ReactionHandler::intents())
        .event_handler(handler)
        .await
        .context("failed to create discord client")?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            return;
        }
        info!("shutting down discord client");
        shard_manager.shutdown_all().await;
    });

    info!("connecting to discord gateway");
    client.start().await.context("discord client error")?;
    info!("discord client stopped");
    Ok(())
}
