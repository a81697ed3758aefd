use std::{sync::Arc, time::Duration};

use anyhow::Result;
use common::{
    AppRepository, MemoryStore, SessionRepository,
    cache::{RedisConfig, RedisPool, RedisStore},
    database::{self, DatabaseConfig, PgStore},
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use web::{
    AppState, AuthGateway, GatewayConfig,
    config::{ServiceConfig, StoreBackend},
    routes,
    service::InstanceService,
};

type Stores = (Arc<dyn SessionRepository>, Arc<dyn AppRepository>);

async fn init_stores(backend: StoreBackend) -> Result<Stores> {
    match backend {
        StoreBackend::Memory => {
            info!("Using in-memory session store");
            let store = MemoryStore::new();
            Ok((Arc::new(store.clone()), Arc::new(store)))
        }
        StoreBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = database::init_pool(&db_config).await?;

            if database::health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            let store = PgStore::new(pool);
            store.ensure_schema().await?;
            Ok((Arc::new(store.clone()), Arc::new(store)))
        }
        StoreBackend::Redis => {
            let redis_config = RedisConfig::from_env()?;
            let pool = RedisPool::new(&redis_config)?;

            if !pool.health_check().await? {
                anyhow::bail!("Failed to connect to Redis");
            }

            let store = RedisStore::new(pool);
            Ok((Arc::new(store.clone()), Arc::new(store)))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting web client service");

    let config = ServiceConfig::from_env()?;
    let (sessions, apps) = init_stores(config.store_backend).await?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()?;

    let gateway = AuthGateway::new(
        sessions.clone(),
        apps,
        http,
        GatewayConfig::from(&config),
        InstanceService::new(sessions),
    );

    let app_state = AppState {
        gateway: Arc::new(gateway),
        secure_cookies: config.client_website.starts_with("https://"),
    };

    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.listen_address).await?;
    info!("Web client listening on {}", config.listen_address);

    axum::serve(listener, app).await?;

    Ok(())
}
