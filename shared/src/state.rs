use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoClient;
use board_block::{Clipboard, Dashboard, TaskDetail};
use tarefas_atoms::comments::Comment;
use tarefas_atoms::store::{DocumentStore, DynamoStore, MemoryStore};
use tarefas_atoms::users::SessionState;

use crate::config::{Config, ConfigError};

/// Process-wide state, built once per cold start and shared by every
/// request and view.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: Config) -> Self {
        Self { store, config }
    }

    /// DynamoDB-backed state configured from the environment.
    pub async fn from_env() -> Result<Self, ConfigError> {
        let config = Config::from_env()?;
        let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let store = DynamoStore::new(DynamoClient::new(&aws), config.table_name.clone())
            .with_poll_interval(config.snapshot_poll_interval);
        tracing::info!("Using DynamoDB table {}", config.table_name);
        Ok(Self::new(Arc::new(store), config))
    }

    pub fn in_memory(config: Config) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }

    pub fn dashboard(&self, clipboard: Arc<dyn Clipboard>) -> Dashboard {
        Dashboard::new(self.store.clone(), clipboard, self.config.public_url.clone())
    }

    pub fn task_detail(
        &self,
        task_id: impl Into<String>,
        session: SessionState,
        initial_comments: Vec<Comment>,
    ) -> TaskDetail {
        TaskDetail::new(self.store.clone(), task_id, session, initial_comments)
    }
}
