//! HexChess Player - headless client.
//!
//! Connects, asks for the current game state and logs every confirmed change
//! until the connection fails for good or Ctrl-C.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hexchess_player::config::{load_dotenv, ClientConfig};
use hexchess_player::infrastructure::messaging::{ConnectionStatus, Step};
use hexchess_player::infrastructure::websocket::WebSocketTransport;
use hexchess_player::GameClient;

enum Exit {
    Idle,
    Interrupted,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hexchess_player=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting HexChess Player");

    let config = ClientConfig::from_env().context("invalid configuration")?;
    let mut client = GameClient::new(WebSocketTransport::new(), &config);

    client.on_state_change(|change, snapshot| {
        tracing::info!(
            ?change,
            round = snapshot.round,
            money = snapshot.money,
            level = snapshot.level,
            "State changed"
        );
    });
    client.connection_mut().on_status_change(|status| {
        tracing::info!(status = status.display_text(), "Connection status");
    });

    client
        .connect()
        .await
        .with_context(|| format!("could not connect to {}", config.server_url))?;
    client.request_state()?;
    client.list_chess()?;

    let exit = loop {
        let exit = tokio::select! {
            step = client.step() => (step == Step::Idle).then_some(Exit::Idle),
            _ = tokio::signal::ctrl_c() => Some(Exit::Interrupted),
        };
        if let Some(exit) = exit {
            break exit;
        }
    };

    match exit {
        Exit::Interrupted => {
            tracing::info!("Interrupted, disconnecting");
            client.disconnect();
        }
        Exit::Idle if client.status() == ConnectionStatus::Failed => {
            anyhow::bail!(
                "gave up on {} after {} attempts",
                config.server_url,
                client.connection().retry_count()
            );
        }
        Exit::Idle => {}
    }

    tracing::info!("HexChess Player stopped");
    Ok(())
}
