use std::sync::Arc;

use anyhow::Context;

use myshop_infra::{InMemoryProductStore, ProductStore, seed::seed_reference_data};
use myshop_products::Currency;

use crate::app::serializers::ProductSummarySerializer;
use crate::config::AppConfig;

/// Shared state handed to every handler.
pub struct AppServices {
    store: Arc<dyn ProductStore>,
    pub currency: Currency,
    pub product_url_prefix: String,
}

impl AppServices {
    pub fn new(store: Arc<dyn ProductStore>, config: &AppConfig) -> Self {
        Self {
            store,
            currency: config.currency,
            product_url_prefix: config.product_url_prefix.clone(),
        }
    }

    pub fn store(&self) -> &dyn ProductStore {
        self.store.as_ref()
    }

    pub fn summary_serializer(&self) -> ProductSummarySerializer {
        ProductSummarySerializer::new(self.currency, self.product_url_prefix.clone())
    }
}

/// Pick the store from the config and seed reference data when asked.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store = open_store(config).await?;
    if config.seed {
        seed_reference_data(store.as_ref())
            .await
            .context("failed to seed reference data")?;
    }
    Ok(AppServices::new(store, config))
}

#[cfg(feature = "postgres")]
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ProductStore>> {
    use myshop_infra::PostgresProductStore;

    match &config.database_url {
        Some(url) => {
            let store = PostgresProductStore::connect(url)
                .await
                .context("failed to connect to postgres")?;
            store.migrate().await.context("failed to run migrations")?;
            tracing::info!("using postgres product store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::info!("DATABASE_URL not set; using in-memory product store");
            Ok(Arc::new(InMemoryProductStore::new()))
        }
    }
}

#[cfg(not(feature = "postgres"))]
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ProductStore>> {
    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but the postgres feature is disabled; using in-memory store");
    }
    Ok(Arc::new(InMemoryProductStore::new()))
}
