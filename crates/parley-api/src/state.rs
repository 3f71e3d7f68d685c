//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both the CLI and
//! the REST API. Services are generic over repository traits; AppState pins
//! them to the SQLite implementations.

use std::path::PathBuf;
use std::sync::Arc;

use parley_core::chat::regenerate::EngineConfig;
use parley_core::chat::service::ChatService;
use parley_core::gateway::box_gateway::BoxAiGateway;
use parley_core::service::user::UserService;
use parley_infra::config::{load_global_config, resolve_api_key};
use parley_infra::filesystem::{ensure_data_dir, resolve_data_dir};
use parley_infra::llm::create_gateway;
use parley_infra::sqlite::chat::SqliteChatRepository;
use parley_infra::sqlite::pool::{DatabasePool, database_url};
use parley_infra::sqlite::user::SqliteUserRepository;
use parley_types::config::GlobalConfig;

pub type ConcreteChatService = ChatService<SqliteChatRepository>;
pub type ConcreteUserService = UserService<SqliteUserRepository>;

/// Shared application state holding all services.
///
/// Cheap to clone: every service sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub user_service: Arc<ConcreteUserService>,
    pub config: Arc<GlobalConfig>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Resolve the data directory, load config, open the database and
    /// build the configured gateway.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        ensure_data_dir(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let api_key = resolve_api_key(&config);
        let gateway = create_gateway(&config.gateway, api_key)?;

        Self::build(data_dir, config, gateway).await
    }

    /// Wire services over an existing data directory and gateway.
    pub async fn build(
        data_dir: PathBuf,
        config: GlobalConfig,
        gateway: BoxAiGateway,
    ) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;

        let chat_service = ChatService::new(
            SqliteChatRepository::new(db_pool.clone()),
            gateway,
            EngineConfig::from(&config),
        );
        let user_service = UserService::new(SqliteUserRepository::new(db_pool.clone()));

        tracing::debug!(
            data_dir = %data_dir.display(),
            model = %chat_service.gateway().model(),
            history_limit = config.history_limit,
            "Application state initialized"
        );

        Ok(Self {
            chat_service: Arc::new(chat_service),
            user_service: Arc::new(user_service),
            config: Arc::new(config),
            data_dir,
            db_pool,
        })
    }
}
