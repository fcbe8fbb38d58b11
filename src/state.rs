use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{Clock, SeaOrmTrendService, SystemClock, TrendService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub clock: Arc<dyn Clock>,

    pub trend_service: Arc<dyn TrendService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn with_clock(config: Config, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let trend_service = Arc::new(SeaOrmTrendService::new(
            store.clone(),
            config.trends.clone(),
            clock.clone(),
        )) as Arc<dyn TrendService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            clock,
            trend_service,
        })
    }
}
