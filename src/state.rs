use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, SeaOrmAuthService, SeaOrmTodoService, TodoService};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub todo_service: Arc<dyn TodoService>,
}

impl SharedState {
    /// Opens the database (running migrations) and wires up the services.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let auth_service = Arc::new(SeaOrmAuthService::from_config(store.clone(), &config)?)
            as Arc<dyn AuthService>;
        let todo_service = Arc::new(SeaOrmTodoService::new(store.clone())) as Arc<dyn TodoService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            auth_service,
            todo_service,
        })
    }
}
