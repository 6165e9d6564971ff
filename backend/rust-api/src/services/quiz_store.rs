use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::models::quiz::{NewQuiz, StoredQuiz};

/// Persistence collaborator for quizzes.
///
/// Stored `questions` are opaque to the store; all shape checks happen before
/// a write and after a read. Ids the store cannot interpret are reported as
/// absent rather than as errors.
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn insert(&self, quiz: NewQuiz) -> Result<StoredQuiz>;

    async fn get_by_id(&self, id: &str) -> Result<Option<StoredQuiz>>;

    /// Overwrites title and questions. `None` when the record no longer exists.
    async fn replace(&self, id: &str, quiz: NewQuiz) -> Result<Option<StoredQuiz>>;

    /// `false` when nothing was deleted.
    async fn delete_by_id(&self, id: &str) -> Result<bool>;

    async fn list_all(&self) -> Result<Vec<StoredQuiz>>;

    async fn ping(&self) -> Result<()>;
}

/// Process-local store, used for tests and `QUIZ_STORAGE=memory`.
#[derive(Debug, Default)]
pub struct MemoryQuizStore {
    records: RwLock<Vec<StoredQuiz>>,
}

impl MemoryQuizStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizStore for MemoryQuizStore {
    async fn insert(&self, quiz: NewQuiz) -> Result<StoredQuiz> {
        let now = Utc::now();
        let record = StoredQuiz {
            id: ObjectId::new().to_hex(),
            title: quiz.title,
            questions: quiz.questions,
            created_at: now,
            updated_at: now,
        };
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<StoredQuiz>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|record| record.id == id).cloned())
    }

    async fn replace(&self, id: &str, quiz: NewQuiz) -> Result<Option<StoredQuiz>> {
        let mut records = self.records.write().await;
        let Some(record) = records.iter_mut().find(|record| record.id == id) else {
            return Ok(None);
        };
        record.title = quiz.title;
        record.questions = quiz.questions;
        record.updated_at = Utc::now();
        Ok(Some(record.clone()))
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|record| record.id != id);
        Ok(records.len() != before)
    }

    async fn list_all(&self) -> Result<Vec<StoredQuiz>> {
        Ok(self.records.read().await.clone())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_quiz(title: &str) -> NewQuiz {
        NewQuiz {
            title: title.to_string(),
            questions: json!([]),
        }
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryQuizStore::new();
        let created = store.insert(new_quiz("First")).await.unwrap();
        assert_eq!(created.created_at, created.updated_at);

        let fetched = store.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let replaced = store
            .replace(
                &created.id,
                NewQuiz {
                    title: "Renamed".into(),
                    questions: json!([{ "id": "q1" }]),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.title, "Renamed");
        assert_eq!(replaced.created_at, created.created_at);
        assert!(replaced.updated_at >= created.updated_at);

        assert!(store.delete_by_id(&created.id).await.unwrap());
        assert!(!store.delete_by_id(&created.id).await.unwrap());
        assert!(store.get_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_store_lists_in_insertion_order() {
        let store = MemoryQuizStore::new();
        for title in ["a", "b", "c"] {
            store.insert(new_quiz(title)).await.unwrap();
        }
        let titles: Vec<_> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.title)
            .collect();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn replace_of_missing_record_is_none() {
        let store = MemoryQuizStore::new();
        assert!(store
            .replace("missing", new_quiz("x"))
            .await
            .unwrap()
            .is_none());
    }
}
