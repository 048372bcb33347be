use crate::config::AppConfig;
use crate::store::{AccountStore, MemoryStore, PgStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn AccountStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match &config.database_url {
            Some(url) => {
                let pg = PgStore::connect(url, config.database_max_connections).await?;
                if let Err(e) = pg.migrate().await {
                    tracing::warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(pg) as Arc<dyn AccountStore>
            }
            None => {
                tracing::warn!("DATABASE_URL not set; accounts are kept in memory only");
                Arc::new(MemoryStore::new()) as Arc<dyn AccountStore>
            }
        };

        Ok(Self { config, store })
    }

    /// Test configuration over a fresh in-memory store.
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn AccountStore>) -> Self {
        Self {
            config: Arc::new(AppConfig::for_tests()),
            store,
        }
    }
}
