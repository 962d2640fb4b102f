use std::sync::Arc;

use anyhow::Context;
use parley_config::load as load_config;
use parley_database::{
    prepare_database, run_migrations, MemberRepository, MessageRepository,
    ScheduledMessageRepository,
};
use parley_gateway::{create_router, GatewayState};
use parley_realtime::DeliveryHub;
use parley_scheduler::{MessageDispatcher, SchedulerLoop};
use tokio::{net::TcpListener, signal};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(env_filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    info!("starting Parley backend");

    let config = load_config().context("failed to load configuration")?;

    let db_pool = prepare_database(&config.database)
        .await
        .context("failed to prepare database")?;
    run_migrations(&db_pool).await?;

    let hub = Arc::new(DeliveryHub::new(MemberRepository::new(db_pool.clone())));

    let dispatcher = MessageDispatcher::new(
        ScheduledMessageRepository::new(db_pool.clone()),
        MessageRepository::new(db_pool.clone()),
        hub.clone(),
    );
    let scheduler = SchedulerLoop::from_config(
        ScheduledMessageRepository::new(db_pool.clone()),
        dispatcher,
        &config.scheduler,
    );
    let scheduler_task = tokio::spawn(scheduler.run());
    info!(
        tick_interval_seconds = config.scheduler.tick_interval_seconds,
        "scheduled-message loop running"
    );

    let state = Arc::new(GatewayState::new(db_pool, hub));
    let app = create_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server error")?;

    scheduler_task.abort();
    info!("backend shut down");
    Ok(())
}

fn shutdown_signal() -> impl std::future::Future<Output = ()> {
    async {
        if let Err(error) = signal::ctrl_c().await {
            error!(?error, "failed to listen for shutdown signal");
        }
        info!("shutdown signal received");
    }
}
