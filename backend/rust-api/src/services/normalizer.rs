//! Turns untrusted question payloads into canonical [`Question`] records.
//!
//! Every rejection is returned as a value; nothing here panics on bad input
//! and nothing is coerced into a different type (a `"true"` string is not a
//! boolean answer).

use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;

use crate::models::question::{
    first_violation, BooleanQuestion, CheckboxOption, CheckboxQuestion, InputQuestion, Question,
    QuestionKind, QuestionType, MAX_INPUT_LENGTH,
};
use crate::services::id_generator::IdGenerator;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("each question must have a \"type\" field")]
    MissingType,
    #[error("unknown question type: {0}")]
    UnknownType(String),
    #[error("boolean question requires boolean correctAnswer")]
    BooleanAnswer,
    #[error("input question requires string correctAnswer")]
    InputAnswer,
    #[error("input question maxLength must be an integer between 1 and 2000")]
    MaxLength,
    #[error("checkbox question requires a non-empty options array")]
    CheckboxOptions,
    #[error("checkbox option must be an object")]
    OptionShape,
    #[error("duplicate option id: {0}")]
    DuplicateOption(String),
    #[error("checkbox question requires correctAnswer array")]
    CheckboxAnswers,
    #[error("invalid correctAnswer option id: {0}")]
    UnknownOption(String),
    #[error("single-answer checkbox question accepts at most one correctAnswer")]
    TooManyAnswers,
    #[error("{0}")]
    Constraint(String),
}

impl Rejection {
    /// Stable label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::MissingType => "missing_type",
            Rejection::UnknownType(_) => "unknown_type",
            Rejection::BooleanAnswer => "boolean_answer",
            Rejection::InputAnswer => "input_answer",
            Rejection::MaxLength => "max_length",
            Rejection::CheckboxOptions => "checkbox_options",
            Rejection::OptionShape => "option_shape",
            Rejection::DuplicateOption(_) => "duplicate_option",
            Rejection::CheckboxAnswers => "checkbox_answers",
            Rejection::UnknownOption(_) => "unknown_option",
            Rejection::TooManyAnswers => "too_many_answers",
            Rejection::Constraint(_) => "constraint",
        }
    }

    /// Structural rejections concern the envelope, not the variant contract.
    pub fn is_structural(&self) -> bool {
        matches!(self, Rejection::MissingType | Rejection::UnknownType(_))
    }
}

/// Validates one raw payload and builds its canonical form.
pub fn normalize(raw: &Value, ids: &dyn IdGenerator) -> Result<Question, Rejection> {
    let fields = raw.as_object().ok_or(Rejection::MissingType)?;
    let declared = fields
        .get("type")
        .and_then(Value::as_str)
        .ok_or(Rejection::MissingType)?;

    let id = string_field(fields, "id").unwrap_or_else(|| ids.next_id());
    let title = string_field(fields, "title")
        .map(|title| title.trim().to_string())
        .unwrap_or_default();
    let required = fields.get("required").is_some_and(is_truthy);
    let metadata = fields.get("metadata").and_then(Value::as_object).cloned();

    let question_type: QuestionType = declared
        .parse()
        .map_err(|_| Rejection::UnknownType(declared.to_string()))?;
    let kind = match question_type {
        QuestionType::Boolean => QuestionKind::Boolean(boolean_question(fields)?),
        QuestionType::Input => QuestionKind::Input(input_question(fields)?),
        QuestionType::Checkbox => QuestionKind::Checkbox(checkbox_question(fields, ids)?),
    };

    let question = Question {
        id,
        title,
        required,
        metadata,
        kind,
    };
    question
        .check()
        .map_err(|errors| Rejection::Constraint(first_violation(&errors)))?;
    Ok(question)
}

fn boolean_question(fields: &Map<String, Value>) -> Result<BooleanQuestion, Rejection> {
    let correct_answer = fields
        .get("correctAnswer")
        .and_then(Value::as_bool)
        .ok_or(Rejection::BooleanAnswer)?;
    Ok(BooleanQuestion { correct_answer })
}

fn input_question(fields: &Map<String, Value>) -> Result<InputQuestion, Rejection> {
    let correct_answer = fields
        .get("correctAnswer")
        .and_then(Value::as_str)
        .ok_or(Rejection::InputAnswer)?
        .trim()
        .to_string();

    let max_length = match fields.get("maxLength") {
        None | Some(Value::Null) => None,
        Some(value) => {
            let length = value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .filter(|n| (1..=MAX_INPUT_LENGTH).contains(n))
                .ok_or(Rejection::MaxLength)?;
            Some(length)
        }
    };

    Ok(InputQuestion {
        correct_answer,
        placeholder: string_field(fields, "placeholder"),
        max_length,
    })
}

fn checkbox_question(
    fields: &Map<String, Value>,
    ids: &dyn IdGenerator,
) -> Result<CheckboxQuestion, Rejection> {
    let raw_options = fields
        .get("options")
        .and_then(Value::as_array)
        .filter(|options| !options.is_empty())
        .ok_or(Rejection::CheckboxOptions)?;
    let raw_answers = fields
        .get("correctAnswer")
        .and_then(Value::as_array)
        .ok_or(Rejection::CheckboxAnswers)?;

    let mut seen = HashSet::with_capacity(raw_options.len());
    let mut options = Vec::with_capacity(raw_options.len());
    for raw in raw_options {
        let option = raw.as_object().ok_or(Rejection::OptionShape)?;
        let id = string_field(option, "id").unwrap_or_else(|| ids.next_id());
        if !seen.insert(id.clone()) {
            return Err(Rejection::DuplicateOption(id));
        }
        options.push(CheckboxOption {
            id,
            text: coerce_text(option.get("text")),
        });
    }

    let mut correct_answer = Vec::with_capacity(raw_answers.len());
    for raw in raw_answers {
        match raw.as_str() {
            Some(id) if seen.contains(id) => correct_answer.push(id.to_string()),
            Some(id) => return Err(Rejection::UnknownOption(id.to_string())),
            None => return Err(Rejection::UnknownOption(raw.to_string())),
        }
    }

    let allow_multiple = match fields.get("allowMultiple") {
        None | Some(Value::Null) => true,
        Some(value) => is_truthy(value),
    };
    if !allow_multiple && correct_answer.len() > 1 {
        return Err(Rejection::TooManyAnswers);
    }

    Ok(CheckboxQuestion {
        options,
        correct_answer,
        allow_multiple,
    })
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Loose truthiness as used by browser clients for flag fields.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn coerce_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}
