mod config;

use anyhow::Result;
use config::Config;
use dotenv::dotenv;
use log::{info, warn};
use sessionwatch_core::{
    ChatApi, MessageIdStore, MessageReconciler, MonitoringApi, ReportBuilder,
    SessionHistoryStore, TautulliClient, TelegramClient,
};
use std::future::Future;
use std::time::Duration;

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    info!("Starting session status sync...");

    let cfg = Config::from_env()?;
    info!(
        "Config: destinations={} interval={}s timeout={}s max_bandwidth={}kbps",
        cfg.destinations.len(),
        cfg.poll_interval.as_secs(),
        cfg.http_timeout.as_secs(),
        cfg.max_bandwidth_kbps,
    );

    let tautulli = TautulliClient::new(
        cfg.tautulli_base_url.clone(),
        cfg.tautulli_api_key.clone(),
        cfg.http_timeout,
    )?;
    let telegram = TelegramClient::new(
        cfg.telegram_api_base.clone(),
        cfg.telegram_bot_token.clone(),
        cfg.http_timeout,
    )?;

    let history = SessionHistoryStore::open(&cfg.history_path);
    info!(
        "Loaded {} history entries from {}",
        history.len(),
        cfg.history_path.display()
    );

    let mut builder = ReportBuilder::new(tautulli, history, cfg.max_bandwidth_kbps);
    let mut reconciler = MessageReconciler::new(
        telegram,
        MessageIdStore::new(&cfg.message_ids_path),
        cfg.destinations.clone(),
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    status_loop(&mut builder, &mut reconciler, cfg.poll_interval, shutdown).await;

    info!("Session status sync stopped");
    Ok(())
}

/// Rebuild and sync the report every poll interval until `shutdown` resolves.
///
/// A shutdown requested mid-cycle lets that cycle finish before returning.
async fn status_loop<M, C, S>(
    builder: &mut ReportBuilder<M>,
    reconciler: &mut MessageReconciler<C>,
    poll_interval: Duration,
    shutdown: S,
) where
    M: MonitoringApi,
    C: ChatApi,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        let report = builder.build().await;
        let summary = reconciler.sync(&report).await;

        if !summary.unchanged {
            info!(
                "Status sync: sent={} edited={} recreated={} failed={}",
                summary.sent, summary.edited, summary.recreated, summary.failed
            );
        }
        if summary.failed > 0 {
            warn!("{} destination(s) not synced; retrying next cycle", summary.failed);
        }

        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            _ = &mut shutdown => {
                info!("Shutdown requested");
                return;
            }
        }
    }
}
