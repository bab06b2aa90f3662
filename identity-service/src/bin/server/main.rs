use std::sync::Arc;

use identity_service::config::Config;
use identity_service::domain::identity::ports::AuthServicePort;
use identity_service::domain::identity::service::AuthService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::clock::SystemClock;
use identity_service::outbound::tokens::JwtTokenIssuer;
use identity_service::repositories::InMemoryUserRepository;
use identity_service::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::oneshot;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        persistent_store = config.database.url.is_some(),
        token_issuer = %config.token.issuer,
        token_audience = %config.token.audience,
        expiration_hours = config.token.expiration_hours,
        "Configuration loaded"
    );

    let hasher = Arc::new(auth::PasswordHasher::new((&config.hashing).into())?);
    let work_factor = hasher.work_factor();
    tracing::info!(
        memory_kib = work_factor.memory_kib,
        iterations = work_factor.iterations,
        parallelism = work_factor.parallelism,
        "Password hasher ready"
    );

    let issuer = Arc::new(JwtTokenIssuer::new(
        config.token.secret.as_bytes(),
        config.token.issuer.clone(),
        config.token.audience.clone(),
    )?);
    let clock = Arc::new(SystemClock);
    let policy = config.auth_policy();
    let http_options = config.http_options()?;

    let auth_service: Arc<dyn AuthServicePort> = match &config.database.url {
        Some(url) => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let repository = Arc::new(PostgresUserRepository::new(pg_pool));
            Arc::new(AuthService::new(repository, hasher, issuer, clock, policy))
        }
        None => {
            tracing::warn!("No database url configured, users are kept in memory");
            let repository = Arc::new(InMemoryUserRepository::new());
            Arc::new(AuthService::new(repository, hasher, issuer, clock, policy))
        }
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let mut http_server = tokio::spawn(async move {
        axum::serve(http_listener, create_router(auth_service, http_options))
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut http_server => {
            result??;
            tracing::info!("Server exited successfully");
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    let _ = shutdown_tx.send(());
    let deadline = config.server.shutdown_deadline();
    match tokio::time::timeout(deadline, &mut http_server).await {
        Ok(result) => {
            result??;
            tracing::info!("Server stopped gracefully");
        }
        Err(_) => {
            tracing::warn!(
                deadline_secs = deadline.as_secs(),
                "Shutdown deadline exceeded, dropping open connections"
            );
            http_server.abort();
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
