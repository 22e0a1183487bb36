use axum::{
    routing::{get, post},
    Extension, Router,
};
use healthwatch_server::engine::lifecycle::AlertLifecycle;
use healthwatch_server::engine::store::seaorm::SeaOrmStore;
use healthwatch_server::{api, migrator};
use sea_orm::{Database, DatabaseConnection};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    healthwatch_server::telemetry::init_telemetry("healthwatch-server");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    // Database Connection
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    use sea_orm_migration::MigratorTrait;
    migrator::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    // Initialize Metrics
    healthwatch_server::metrics::init_metrics(&db).await;

    let app = app(db, prometheus_layer, metric_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], 8000));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

async fn health_check() -> &'static str {
    "OK"
}

fn app(
    db: DatabaseConnection,
    prometheus_layer: axum_prometheus::PrometheusMetricLayer<'static>,
    metric_handle: metrics_exporter_prometheus::PrometheusHandle,
) -> Router {
    let store = Arc::new(SeaOrmStore::new(db));
    let lifecycle = AlertLifecycle::new(store.clone());

    let cors_origin =
        std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3003".to_string());

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/configurations",
            post(api::configurations::create_configuration),
        )
        .route(
            "/configurations/:id",
            get(api::configurations::get_configuration)
                .patch(api::configurations::update_configuration),
        )
        .route(
            "/configurations/:id/toggle",
            post(api::configurations::toggle_configuration),
        )
        .route("/patients/:id/alerts", get(api::alerts::list_patient_alerts))
        .route("/doctors/:id/alerts", get(api::alerts::list_doctor_alerts))
        .route(
            "/alerts/:id",
            get(api::alerts::get_alert).delete(api::alerts::purge_alert),
        )
        .route(
            "/alerts/:id/acknowledge",
            post(api::alerts::acknowledge_alert),
        )
        .route(
            "/alerts/:id/actions",
            post(api::alerts::create_action).get(api::alerts::list_actions),
        )
        .route("/alerts/:id/resolve", post(api::alerts::resolve_alert))
        .route("/alerts/:id/dismiss", post(api::alerts::dismiss_alert))
        .route("/alerts/:id/context", get(api::alerts::get_context))
        .route(
            "/alerts/:id/context/versions",
            get(api::alerts::list_context_versions),
        )
        .layer(Extension(store))
        .layer(Extension(lifecycle))
        .layer(prometheus_layer)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    // Span name "METHOD /path" so traces group by route.
                    let span_name = if let Some(path) = matched_path {
                        format!("{} {}", request.method(), path)
                    } else {
                        format!("{} {}", request.method(), request.uri().path())
                    };

                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        patient_id = tracing::field::Empty,
                        alert_id = tracing::field::Empty,
                        configuration_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(
                    |_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {},
                )
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(
                    cors_origin
                        .parse::<axum::http::HeaderValue>()
                        .expect("invalid CORS_ORIGIN"),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PATCH,
                    axum::http::Method::DELETE,
                ])
                .allow_headers([axum::http::header::CONTENT_TYPE])
                .allow_credentials(true),
        )
        .route("/metrics", get(|| async move { metric_handle.render() }))
}
