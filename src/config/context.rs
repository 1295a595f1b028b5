use std::sync::Arc;

use tracing::info;

use crate::{
    codec::ContainerCodec,
    pagination::LiteralPaginator,
    store::{
        interface::{Executor, Result},
        sqlite::SqliteStore,
    },
};

#[cfg(feature = "store-postgres")]
use crate::store::postgres::PostgresStore;

use super::schema;

/// Everything a command needs, built once from the config.
#[derive(Debug, Clone)]
pub struct ContainerContext {
    pub codec: ContainerCodec,
    pub paginator: LiteralPaginator,
}

impl ContainerContext {
    pub fn new(executor: Arc<dyn Executor>, config: &schema::FmContainerConfig) -> Self {
        let codec = ContainerCodec::new(executor.clone())
            .with_default_filename(config.container.default_filename.clone());
        let paginator = LiteralPaginator::new(executor).with_limits(
            config.pagination.default_size,
            config.pagination.max_size,
        );
        Self { codec, paginator }
    }

    pub fn executor(&self) -> Arc<dyn Executor> {
        self.codec.executor()
    }
}

pub async fn build_executor(config: &schema::FmContainerConfig) -> Result<Arc<dyn Executor>> {
    let executor: Arc<dyn Executor> = match &config.store {
        #[cfg(feature = "store-postgres")]
        schema::Store::Postgres(schema::Postgres {
            dsn,
            schema,
            max_connections,
        }) => {
            info!("Connecting to the Postgres store");
            Arc::new(
                PostgresStore::try_new(dsn.to_string(), schema.to_string(), *max_connections)
                    .await?,
            )
        }
        schema::Store::Sqlite(schema::Sqlite {
            dsn,
            max_connections,
        }) => {
            info!("Opening the SQLite store at {dsn}");
            Arc::new(SqliteStore::try_new(dsn, *max_connections).await?)
        }
    };

    Ok(executor)
}

pub async fn build_context(config: &schema::FmContainerConfig) -> Result<ContainerContext> {
    let executor = build_executor(config).await?;
    Ok(ContainerContext::new(executor, config))
}
