use healthwatch_server::engine::notify::Notifier;
use healthwatch_server::engine::scheduler::{Scheduler, SchedulerSettings};
use healthwatch_server::engine::source::SeaOrmMetricSource;
use healthwatch_server::engine::store::seaorm::SeaOrmStore;
use sea_orm::Database;
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    healthwatch_server::telemetry::init_telemetry("healthwatch-scheduler");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    // Metrics sidecar so Prometheus can scrape the scheduler process too.
    tokio::spawn(async move {
        let app = axum::Router::new()
            .route(
                "/metrics",
                axum::routing::get(|| async move { metric_handle.render() }),
            )
            .layer(prometheus_layer);
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], 9091));
        tracing::info!("Metrics server listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        axum::serve(listener, app).await.unwrap();
    });

    // Database Connection
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Redis Connection (cross-instance evaluation lease)
    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    let redis_client = redis::Client::open(redis_url).expect("Invalid Redis URL");

    let store = Arc::new(SeaOrmStore::new(db.clone()));
    let source = Arc::new(SeaOrmMetricSource::new(db));

    let mut scheduler = Scheduler::new(store, source, SchedulerSettings::from_env())
        .with_redis(redis_client);
    if let Some(notifier) = Notifier::from_env() {
        scheduler = scheduler.with_notifier(notifier);
    } else {
        tracing::info!("DOCTOR_WEBHOOK_URL not set, webhook notifications disabled");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutting down scheduler"),
            Err(err) => tracing::error!("Unable to listen for shutdown signal: {}", err),
        }
        let _ = shutdown_tx.send(true);
    });

    scheduler.run(shutdown_rx).await;
}
