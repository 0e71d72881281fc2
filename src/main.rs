use online_store::configuration::{get_configuration, RepositoryKind, Settings};
use online_store::repository::{InMemoryRepository, PostgresRepository, StoreRepository};
use online_store::startup::run;
use online_store::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;
use std::io::{Error, ErrorKind};
use std::net::TcpListener;
use std::sync::Arc;

async fn build_repository(configuration: &Settings) -> std::io::Result<Arc<dyn StoreRepository>> {
    match configuration.application.repository {
        RepositoryKind::Memory => {
            tracing::warn!("Using the in-memory repository; data is lost on restart");
            let repository = InMemoryRepository::with_fixtures().map_err(|e| {
                tracing::error!("Failed to seed in-memory repository: {}", e);
                Error::new(ErrorKind::Other, "Repository seeding error")
            })?;
            Ok(Arc::new(repository))
        }
        RepositoryKind::Postgres => {
            let database = &configuration.database;
            tracing::info!(host = %database.host, database = %database.database_name, "Connecting to database");

            let pool = PgPoolOptions::new()
                .max_connections(database.max_connections)
                .acquire_timeout(database.timeout())
                .connect(&database.connection_string())
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create connection pool: {}", e);
                    Error::new(ErrorKind::ConnectionRefused, "Database connection error")
                })?;

            sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                Error::new(ErrorKind::Other, "Database migration error")
            })?;

            tracing::info!("Database connection pool created and migrations applied");
            Ok(Arc::new(PostgresRepository::new(pool, database.timeout())))
        }
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(Error::new(ErrorKind::InvalidInput, "Configuration error"));
        }
    };

    let repository = build_repository(&configuration).await?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, repository, configuration)?;
    server.await
}
