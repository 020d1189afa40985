//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run the daemon.
//! No business logic here.

use counsel_queue::adapters::ai::{MockAiAdapter, OpenAiAdapter};
use counsel_queue::adapters::clock::SystemClock;
use counsel_queue::adapters::persistence::SqliteStore;
use counsel_queue::ports::{Clock, CounselorQueue, LanguageModelPort, QueueStore};
use counsel_queue::shared::AppConfig;
use counsel_queue::usecases::{
    AnalysisDispatcher, AnalysisService, ClaimManager, MaintenanceWorker, QueueService,
    SubmissionService,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv::dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "config load failed; using defaults");
            AppConfig::default()
        }
    };

    let data_path = PathBuf::from(cfg.data_dir_or_default());
    info!(path = %data_path.display(), "data directory");

    // --- Persistence + clock ---
    let store: Arc<dyn QueueStore> = Arc::new(
        SqliteStore::connect(&data_path)
            .await
            .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // --- Language model ---
    let llm: Arc<dyn LanguageModelPort> = if cfg.is_ai_configured() {
        info!(
            model = %cfg.ai_model_or_default(),
            url = %cfg.ai_api_url_or_default(),
            "AI analysis enabled with OpenAI adapter"
        );
        Arc::new(OpenAiAdapter::new(
            cfg.ai_api_url_or_default(),
            cfg.ai_api_key().unwrap_or_default(),
            cfg.ai_model_or_default(),
        ))
    } else {
        warn!("COUNSEL_QUEUE_AI_API_KEY not set, using mock AI adapter");
        Arc::new(MockAiAdapter::new())
    };

    // --- Services ---
    let shutdown = CancellationToken::new();
    let analysis_timeout = Duration::from_secs(cfg.analysis_timeout_secs_or_default());
    let analysis = Arc::new(AnalysisService::new(
        llm,
        Arc::clone(&store),
        Arc::clone(&clock),
        analysis_timeout,
    ));
    let dispatcher = Arc::new(AnalysisDispatcher::new(analysis, shutdown.child_token()));
    let claims = Arc::new(ClaimManager::new(Arc::clone(&store), Arc::clone(&clock)));
    let submissions = Arc::new(SubmissionService::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        Some(Arc::clone(&dispatcher)),
    ));
    let queue: Arc<dyn CounselorQueue> =
        Arc::new(QueueService::new(Arc::clone(&claims), submissions));

    let pending = queue
        .list_available(Default::default())
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    info!(pending = pending.len(), "queue ready");

    // --- Maintenance daemon ---
    let cooldown = i64::try_from(cfg.archive_cooldown_secs_or_default())
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| anyhow::anyhow!("archive cooldown out of range"))?;
    let worker = MaintenanceWorker::new(
        claims,
        Duration::from_secs(cfg.sweep_interval_secs_or_default()),
        cooldown,
    );
    let worker_token = shutdown.child_token();
    let worker_handle = tokio::spawn(async move { worker.run_loop(worker_token).await });

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    shutdown.cancel();
    dispatcher.shutdown().await;
    if let Err(e) = worker_handle.await {
        warn!(error = %e, "maintenance task ended abnormally");
    }
    info!("stopped");
    Ok(())
}
