use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::mail::Mailer;

/// Per-request application context, passed to handlers through the axum
/// `State` extractor. Holds the storage handle and the outbound mailer;
/// nothing here is process-global.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub mailer: Mailer,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_url,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let mailer = Mailer::from_config(&config.mail)?;

        Ok(Self {
            config,
            store,
            mailer,
        })
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub const fn mailer(&self) -> &Mailer {
        &self.mailer
    }
}

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState::new(config).await?))
}
