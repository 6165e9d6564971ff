use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, to_bson},
    options::ReturnDocument,
    Collection, Database,
};

use crate::metrics::track_db_operation;
use crate::models::quiz::{chrono_to_bson, NewQuiz, QuizDocument, StoredQuiz};
use crate::services::quiz_store::QuizStore;

const COLLECTION: &str = "quizzes";

pub struct MongoQuizStore {
    mongo: Database,
    collection: Collection<QuizDocument>,
}

impl MongoQuizStore {
    pub fn new(mongo: Database) -> Self {
        let collection = mongo.collection::<QuizDocument>(COLLECTION);
        Self { mongo, collection }
    }
}

/// Ids that are not ObjectIds cannot exist in the collection.
fn parse_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

#[async_trait]
impl QuizStore for MongoQuizStore {
    async fn insert(&self, quiz: NewQuiz) -> Result<StoredQuiz> {
        track_db_operation("insert", COLLECTION, async move {
            let now = Utc::now();
            let document = QuizDocument {
                id: ObjectId::new(),
                title: quiz.title,
                questions: to_bson(&quiz.questions).context("Failed to encode questions")?,
                created_at: now,
                updated_at: now,
            };
            self.collection
                .insert_one(&document)
                .await
                .context("Failed to insert quiz")?;
            tracing::debug!(quiz_id = %document.id, "Quiz document inserted");
            Ok(StoredQuiz::from(document))
        })
        .await
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<StoredQuiz>> {
        let Some(object_id) = parse_id(id) else {
            return Ok(None);
        };
        track_db_operation("find_one", COLLECTION, async move {
            let document = self
                .collection
                .find_one(doc! { "_id": object_id })
                .await
                .context("Failed to fetch quiz")?;
            Ok(document.map(StoredQuiz::from))
        })
        .await
    }

    async fn replace(&self, id: &str, quiz: NewQuiz) -> Result<Option<StoredQuiz>> {
        let Some(object_id) = parse_id(id) else {
            return Ok(None);
        };
        track_db_operation("update", COLLECTION, async move {
            let questions = to_bson(&quiz.questions).context("Failed to encode questions")?;
            let document = self
                .collection
                .find_one_and_update(
                    doc! { "_id": object_id },
                    doc! {
                        "$set": {
                            "title": quiz.title,
                            "questions": questions,
                            "updatedAt": chrono_to_bson(Utc::now()),
                        }
                    },
                )
                .return_document(ReturnDocument::After)
                .await
                .context("Failed to update quiz")?;
            Ok(document.map(StoredQuiz::from))
        })
        .await
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let Some(object_id) = parse_id(id) else {
            return Ok(false);
        };
        track_db_operation("delete", COLLECTION, async move {
            let result = self
                .collection
                .delete_one(doc! { "_id": object_id })
                .await
                .context("Failed to delete quiz")?;
            Ok(result.deleted_count > 0)
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<StoredQuiz>> {
        track_db_operation("find", COLLECTION, async move {
            let cursor = self
                .collection
                .find(doc! {})
                .sort(doc! { "createdAt": 1 })
                .await
                .context("Failed to list quizzes")?;
            let documents: Vec<QuizDocument> = cursor
                .try_collect()
                .await
                .context("Failed to collect quiz documents")?;
            Ok(documents.into_iter().map(StoredQuiz::from).collect())
        })
        .await
    }

    async fn ping(&self) -> Result<()> {
        self.mongo
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }
}
