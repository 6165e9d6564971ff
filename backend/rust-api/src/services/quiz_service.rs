use serde_json::Value;
use std::sync::Arc;

use crate::error::QuizError;
use crate::models::question::{first_violation, Question};
use crate::models::quiz::{NewQuiz, Quiz, QuizSummary, StoredQuiz};
use crate::services::{
    id_generator::IdGenerator, normalizer::normalize, quiz_store::QuizStore,
};

/// Quiz aggregate operations.
///
/// Every write normalizes the whole incoming question array before touching
/// the store, so a failed call leaves stored data unchanged. Updates are
/// fetch-then-replace without version checks: concurrent updates to the same
/// quiz are last-write-wins.
#[derive(Clone)]
pub struct QuizService {
    store: Arc<dyn QuizStore>,
    ids: Arc<dyn IdGenerator>,
}

impl QuizService {
    pub fn new(store: Arc<dyn QuizStore>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { store, ids }
    }

    pub async fn create(&self, title: Option<&str>, questions: &Value) -> Result<Quiz, QuizError> {
        let title = required_title(title)?;
        let questions = self.normalize_all(questions)?;

        let record = self
            .store
            .insert(NewQuiz {
                title,
                questions: encode_questions(&questions)?,
            })
            .await?;
        Ok(Quiz::from_stored(record, questions))
    }

    /// Replaces the title and/or the question array. A missing (or null)
    /// array keeps the stored questions as they are.
    pub async fn update(
        &self,
        id: &str,
        title: Option<&str>,
        questions: Option<&Value>,
    ) -> Result<Quiz, QuizError> {
        let existing = self.store.get_by_id(id).await?.ok_or(QuizError::NotFound)?;

        let title = match title {
            Some(title) => required_title(Some(title))?,
            None => existing.title.clone(),
        };
        let questions = match questions {
            Some(raw) if !raw.is_null() => self.normalize_all(raw)?,
            _ => decode_questions(&existing)?,
        };

        let record = self
            .store
            .replace(
                id,
                NewQuiz {
                    title,
                    questions: encode_questions(&questions)?,
                },
            )
            .await?
            .ok_or(QuizError::NotFound)?;
        Ok(Quiz::from_stored(record, questions))
    }

    pub async fn remove(&self, id: &str) -> Result<(), QuizError> {
        if self.store.delete_by_id(id).await? {
            Ok(())
        } else {
            Err(QuizError::NotFound)
        }
    }

    pub async fn find_one(&self, id: &str) -> Result<Quiz, QuizError> {
        let record = self.store.get_by_id(id).await?.ok_or(QuizError::NotFound)?;
        let questions = decode_questions(&record)?;
        Ok(Quiz::from_stored(record, questions))
    }

    pub async fn find_all(&self) -> Result<Vec<QuizSummary>, QuizError> {
        let records = self.store.list_all().await?;
        Ok(records.iter().map(QuizSummary::project).collect())
    }

    fn normalize_all(&self, raw: &Value) -> Result<Vec<Question>, QuizError> {
        let items = raw.as_array().ok_or(QuizError::QuestionsNotArray)?;
        if items.is_empty() {
            return Err(QuizError::EmptyQuiz);
        }
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                normalize(item, self.ids.as_ref())
                    .map_err(|rejection| QuizError::InvalidQuestion { index, rejection })
            })
            .collect()
    }
}

fn required_title(title: Option<&str>) -> Result<String, QuizError> {
    match title.map(str::trim) {
        Some(title) if !title.is_empty() => Ok(title.to_string()),
        _ => Err(QuizError::TitleRequired),
    }
}

fn encode_questions(questions: &[Question]) -> Result<Value, QuizError> {
    serde_json::to_value(questions).map_err(|e| QuizError::Storage(e.into()))
}

/// Reads stored questions back into typed form, re-checking their invariants.
fn decode_questions(record: &StoredQuiz) -> Result<Vec<Question>, QuizError> {
    let corrupt = |reason: String| QuizError::CorruptRecord {
        id: record.id.clone(),
        reason,
    };
    let questions: Vec<Question> =
        serde_json::from_value(record.questions.clone()).map_err(|e| corrupt(e.to_string()))?;
    for question in &questions {
        question
            .check()
            .map_err(|errors| corrupt(first_violation(&errors)))?;
    }
    Ok(questions)
}
