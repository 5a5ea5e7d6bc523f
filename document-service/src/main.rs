use document_service::{
    api::{
        router::{build_router, rate_limit_response},
        state::DocumentServiceAppState,
    },
    config::AppConfig,
    infrastructure::{
        attachment::PgAttachmentRepository,
        cache::{client::RedisCache, department::CachedDepartmentRepository},
        department::PgDepartmentRepository,
        document::PgDocumentRepository,
        signature::PgSignatureRepository,
        token::TokenService,
        user::PgUserRepository,
    },
};
use shared::pagination::Paginator;
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[tokio::main]
async fn main() {
    // A missing .env is normal outside local development.
    let _ = dotenvy::dotenv();
    let _guard = shared::telemetry::init_telemetry("document-service");

    let config = AppConfig::from_env().expect("Invalid configuration");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to establish connection into Postgres");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let cache = RedisCache::connect(&config.redis_url)
        .await
        .expect("Failed to connect to Redis");

    let state = Arc::new(DocumentServiceAppState {
        paginator: Paginator::new(config.pagination),
        tokens: TokenService::new(&config.jwt),
        public_base_url: config.public_base_url.clone(),
        user_repo: Arc::new(PgUserRepository::new(pool.clone())),
        document_repo: Arc::new(PgDocumentRepository::new(pool.clone())),
        attachment_repo: Arc::new(PgAttachmentRepository::new(pool.clone())),
        signature_repo: Arc::new(PgSignatureRepository::new(pool.clone())),
        department_repo: Arc::new(CachedDepartmentRepository::new(
            Arc::new(PgDepartmentRepository::new(pool)),
            cache,
        )),
    });

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(20)
        .key_extractor(SmartIpKeyExtractor)
        .use_headers()
        .finish()
        .expect("Failed to build governor config");

    let app = build_router(state)
        // Rate limiting (per-IP, 2 req/s with burst of 20)
        .layer(GovernorLayer::new(governor_conf).error_handler(rate_limit_response))
        // tracing log (turn request into info level)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(tower_http::LatencyUnit::Millis),
                ),
        );

    let port = config.port;
    tracing::info!(
        page_size = config.pagination.default_page_size,
        max_page_size = config.pagination.max_page_size,
        "document-service listening on 0.0.0.0:{port}"
    );

    let listener = TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("Failed to bind");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shared::shutdown::shutdown_signal())
    .await
    .expect("Oppsie! Server crashed!");

    tracing::info!("document-service shut down");
}
