//! Startup helpers for the WhatsGPT service.
//!
//! Builds every component once, wires them by handle, and serves until Ctrl+C.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use crate::bot::{BulkIntake, ReplyOrchestrator, run_inbound_loop};
use crate::chat::{BridgeNetwork, ChatNetwork, ChatSession};
use crate::config::AppConfig;
use crate::llm::{CompletionClient, OpenAiChat};
use crate::server::{self, AppState};
use crate::store::{ConversationLocks, ConversationStore, FirebaseStore, MemoryStore};

/// Run the service.
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting WhatsGPT v{}", env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(serve(config)) {
        error!("Server error: {e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Pick the transcript store for `config`.
///
/// # Errors
/// Returns an error if the Firebase client cannot be built.
pub fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ConversationStore>> {
    match config.firebase.resolved_database_url() {
        Some(database_url) => {
            info!(%database_url, namespace = %config.store_namespace, "Using Firebase store");
            let store = FirebaseStore::new(&database_url, &config.store_namespace)
                .context("building Firebase store")?;
            Ok(Arc::new(store))
        }
        None => {
            warn!("DATABASE_URL and PROJECT_ID unset; transcripts are kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Wire the components and serve until a shutdown signal arrives.
///
/// # Errors
/// Returns an error if a component cannot be built or the server fails.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let store = build_store(&config)?;
    let completion: Arc<dyn CompletionClient> =
        Arc::new(OpenAiChat::new(&config.openai).context("building completion client")?);
    let network: Arc<dyn ChatNetwork> =
        Arc::new(BridgeNetwork::new(&config.bridge_url).context("building WhatsApp bridge client")?);
    info!(bridge = %config.bridge_url, model = %config.openai.model, "Components configured");

    let (session, inbound) = ChatSession::new(network);
    let locks = Arc::new(ConversationLocks::new());
    let orchestrator = Arc::new(ReplyOrchestrator::new(
        Arc::clone(&store),
        completion,
        Arc::clone(&session),
        Arc::clone(&locks),
    ));
    let intake = BulkIntake::new(store, Arc::clone(&session), locks);

    std::fs::create_dir_all(&config.upload_dir)
        .with_context(|| format!("creating upload dir {}", config.upload_dir.display()))?;

    let pump = session.spawn();
    let inbound_loop = tokio::spawn(run_inbound_loop(inbound, orchestrator));

    let state = AppState::new(&config, Arc::clone(&session), intake);
    let served = server::run_server_with_shutdown(state, config.port, shutdown_signal()).await;

    session.shutdown_notifier().notify_one();
    if let Err(e) = pump.await {
        warn!("Session pump ended abnormally: {e}");
    }
    inbound_loop.abort();

    served.map_err(|e| anyhow::anyhow!(e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Cannot listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(vars: &[(&str, &str)]) -> AppConfig {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        AppConfig::from_lookup(move |name| {
            vars.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_without_database() {
        let store = build_store(&config(&[("OPEN_AI_KEY", "k")])).unwrap();
        assert!(store.load("15551234567").await.unwrap().is_empty());
    }

    #[test]
    fn test_firebase_store_with_project() {
        let built = build_store(&config(&[("OPEN_AI_KEY", "k"), ("PROJECT_ID", "demo")]));
        assert!(built.is_ok());
    }
}
