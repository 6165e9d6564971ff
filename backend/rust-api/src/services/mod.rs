use crate::config::{Config, StorageBackend};
use std::sync::Arc;

use self::{
    id_generator::{IdGenerator, UuidGenerator},
    mongo_quiz_store::MongoQuizStore,
    quiz_service::QuizService,
    quiz_store::{MemoryQuizStore, QuizStore},
};

pub struct AppState {
    pub config: Config,
    pub quizzes: QuizService,
    pub store: Arc<dyn QuizStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn QuizStore>) -> Self {
        Self::with_id_generator(config, store, Arc::new(UuidGenerator))
    }

    pub fn with_id_generator(
        config: Config,
        store: Arc<dyn QuizStore>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let quizzes = QuizService::new(store.clone(), ids);
        Self {
            config,
            quizzes,
            store,
        }
    }

    /// Builds the state with the store selected by `config.storage`.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn QuizStore> = match config.storage {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory quiz storage; data is lost on restart");
                Arc::new(MemoryQuizStore::new())
            }
            StorageBackend::Mongo => {
                let client = mongodb::Client::with_uri_str(&config.mongo_uri).await?;
                let store = MongoQuizStore::new(client.database(&config.mongo_database));

                tracing::info!("Attempting to reach MongoDB...");
                tokio::time::timeout(std::time::Duration::from_secs(10), store.ping())
                    .await
                    .map_err(|_| anyhow::anyhow!("MongoDB ping timeout after 10s"))??;
                tracing::info!(database = %config.mongo_database, "MongoDB connection established");

                Arc::new(store)
            }
        };

        Ok(Self::new(config, store))
    }
}

pub mod id_generator;
pub mod mongo_quiz_store;
pub mod normalizer;
pub mod quiz_service;
pub mod quiz_store;
