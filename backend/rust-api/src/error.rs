use thiserror::Error;

use crate::services::normalizer::Rejection;

/// Failure of a quiz operation. Nothing is persisted when one is returned.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("title is required")]
    TitleRequired,

    #[error("questions must be an array")]
    QuestionsNotArray,

    #[error("a quiz must contain at least one question")]
    EmptyQuiz,

    #[error("{rejection}")]
    InvalidQuestion {
        index: usize,
        #[source]
        rejection: Rejection,
    },

    #[error("quiz not found")]
    NotFound,

    #[error("stored quiz {id} is malformed: {reason}")]
    CorruptRecord { id: String, reason: String },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl QuizError {
    pub fn kind(&self) -> &'static str {
        match self {
            QuizError::TitleRequired | QuizError::QuestionsNotArray | QuizError::EmptyQuiz => {
                "structural"
            }
            QuizError::InvalidQuestion { rejection, .. } if rejection.is_structural() => {
                "structural"
            }
            QuizError::InvalidQuestion { .. } => "variant",
            QuizError::NotFound => "not_found",
            QuizError::CorruptRecord { .. } | QuizError::Storage(_) => "collaborator",
        }
    }

    /// Errors caused by the caller's input, as opposed to the store.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            QuizError::CorruptRecord { .. } | QuizError::Storage(_)
        )
    }
}
