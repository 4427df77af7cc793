use std::sync::Arc;

use auth::Authenticator;
use auth::PasswordHasher;
use sqlx::postgres::PgPoolOptions;
use task_service::config::Config;
use task_service::config::StorageBackend;
use task_service::domain::identity::models::Password;
use task_service::domain::identity::models::RegisterCommand;
use task_service::domain::identity::models::Username;
use task_service::domain::identity::ports::IdentityServicePort;
use task_service::domain::identity::service::IdentityService;
use task_service::inbound::http::router::create_router;
use task_service::outbound::repositories::InMemoryIdentityRepository;
use task_service::outbound::repositories::PostgresIdentityRepository;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "task_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "task-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        storage = ?config.storage.backend,
        token_ttl_seconds = config.jwt.ttl_seconds,
        hashing_cost = config.hashing.cost,
        "Configuration loaded"
    );

    let authenticator = Arc::new(
        Authenticator::new(config.jwt.secret.as_bytes(), config.token_ttl())
            .with_password_hasher(PasswordHasher::with_cost(config.hashing.cost)?),
    );
    // Computed before serving so unknown-username logins all cost one verification
    authenticator.decoy_hash()?;

    let identity_service: Arc<dyn IdentityServicePort> = match config.storage.backend {
        StorageBackend::Postgres => {
            let pg_pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .connect(&config.database.url)
                .await?;
            tracing::info!(
                max_connections = config.database.max_connections,
                database = "postgresql",
                "Database connection pool created"
            );

            sqlx::migrate!("./migrations").run(&pg_pool).await?;
            tracing::info!(database = "postgresql", "Database migrations completed");

            let repository = Arc::new(PostgresIdentityRepository::new(pg_pool));
            Arc::new(IdentityService::new(repository, Arc::clone(&authenticator)))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory credential store, identities are lost on restart");
            let repository = Arc::new(InMemoryIdentityRepository::new());
            Arc::new(IdentityService::new(repository, Arc::clone(&authenticator)))
        }
    };

    if let Some((username, password)) = config.seed.credentials() {
        let command = RegisterCommand::new(
            Username::new(username.to_string())?,
            Password::new(password.to_string())?,
        );
        if let Some(identity) = identity_service.seed(command).await? {
            tracing::info!(
                identity_id = %identity.id,
                username = %identity.username,
                "Seed identity created"
            );
        }
    }

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(identity_service, config.cors.origin()?);
    axum::serve(http_listener, http_application).await?;

    tracing::info!("Server exited");

    Ok(())
}
