use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, Bson};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::question::Question;

/// Full quiz as returned by single-item fetch, create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub title: String,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quiz {
    pub fn from_stored(record: StoredQuiz, questions: Vec<Question>) -> Self {
        Self {
            id: record.id,
            title: record.title,
            questions,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// List view of a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: String,
    pub title: String,
    pub question_count: usize,
}

impl QuizSummary {
    /// Counts stored questions without decoding them. Anything that is not an
    /// array (legacy or corrupt records) counts as zero.
    pub fn project(record: &StoredQuiz) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            question_count: record.questions.as_array().map_or(0, Vec::len),
        }
    }
}

/// Payload handed to the store. `questions` is opaque to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewQuiz {
    pub title: String,
    pub questions: Value,
}

/// Record as the store returns it, with id and timestamps assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredQuiz {
    pub id: String,
    pub title: String,
    pub questions: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateQuizRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub questions: Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuizRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub questions: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct DeleteQuizResponse {
    pub success: bool,
}

/// Quiz document stored in MongoDB "quizzes" collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub questions: Bson,
    #[serde(rename = "createdAt", alias = "created_at", with = "bson_datetime_as_chrono")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", alias = "updated_at", with = "bson_datetime_as_chrono")]
    pub updated_at: DateTime<Utc>,
}

impl From<QuizDocument> for StoredQuiz {
    fn from(doc: QuizDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            title: doc.title,
            questions: doc.questions.into_relaxed_extjson(),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

pub fn chrono_to_bson(dt: DateTime<Utc>) -> mongodb::bson::DateTime {
    mongodb::bson::DateTime::from_millis(dt.timestamp_millis())
}

// Serde converters for chrono::DateTime <-> mongodb::bson::DateTime
mod bson_datetime_as_chrono {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        super::chrono_to_bson(*date).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bson_dt = bson::DateTime::deserialize(deserializer)?;
        DateTime::from_timestamp_millis(bson_dt.timestamp_millis())
            .ok_or_else(|| D::Error::custom("timestamp out of range"))
    }
}
