use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::HashSet, str::FromStr};
use validator::{Validate, ValidationError, ValidationErrors};

/// Upper bound accepted for `maxLength` on short-text questions.
pub const MAX_INPUT_LENGTH: u32 = 2000;

/// Discriminant carried in the `type` field of every question payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuestionType {
    Boolean,
    Input,
    Checkbox,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Boolean => "BOOLEAN",
            QuestionType::Input => "INPUT",
            QuestionType::Checkbox => "CHECKBOX",
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    /// Discriminants are matched exactly; `"boolean"` is not a valid type.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "BOOLEAN" => Ok(QuestionType::Boolean),
            "INPUT" => Ok(QuestionType::Input),
            "CHECKBOX" => Ok(QuestionType::Checkbox),
            _ => Err(format!("unknown question type: {}", value)),
        }
    }
}

/// A canonical question as stored inside a quiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub required: bool,
    /// Free-form extension data, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl Question {
    pub fn question_type(&self) -> QuestionType {
        match self.kind {
            QuestionKind::Boolean(_) => QuestionType::Boolean,
            QuestionKind::Input(_) => QuestionType::Input,
            QuestionKind::Checkbox(_) => QuestionType::Checkbox,
        }
    }

    /// Runs the declarative constraints of the variant.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        match &self.kind {
            QuestionKind::Boolean(_) => Ok(()),
            QuestionKind::Input(input) => input.validate(),
            QuestionKind::Checkbox(checkbox) => checkbox.validate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum QuestionKind {
    Boolean(BooleanQuestion),
    Input(InputQuestion),
    Checkbox(CheckboxQuestion),
}

/// True / false question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanQuestion {
    pub correct_answer: bool,
}

/// Short text answer. The expected answer is stored trimmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InputQuestion {
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[validate(range(
        min = 1,
        max = 2000,
        message = "input question maxLength must be an integer between 1 and 2000"
    ))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxOption {
    pub id: String,
    pub text: String,
}

/// Multiple choice question; `correct_answer` holds option ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_checkbox_answers"))]
pub struct CheckboxQuestion {
    #[validate(length(min = 1, message = "checkbox question requires a non-empty options array"))]
    pub options: Vec<CheckboxOption>,
    pub correct_answer: Vec<String>,
    #[serde(default = "default_allow_multiple")]
    pub allow_multiple: bool,
}

fn default_allow_multiple() -> bool {
    true
}

impl CheckboxQuestion {
    /// First option id that appears more than once.
    pub fn duplicate_option(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.options
            .iter()
            .map(|option| option.id.as_str())
            .find(|id| !seen.insert(*id))
    }

    /// First correct answer that does not name one of the options.
    pub fn unknown_answer(&self) -> Option<&str> {
        self.correct_answer
            .iter()
            .map(String::as_str)
            .find(|answer| !self.options.iter().any(|option| option.id == *answer))
    }

    pub fn exceeds_single_answer(&self) -> bool {
        !self.allow_multiple && self.correct_answer.len() > 1
    }
}

fn validate_checkbox_answers(question: &CheckboxQuestion) -> Result<(), ValidationError> {
    if let Some(id) = question.duplicate_option() {
        return Err(ValidationError::new("duplicate_option")
            .with_message(format!("duplicate option id: {}", id).into()));
    }
    if let Some(id) = question.unknown_answer() {
        return Err(ValidationError::new("unknown_option")
            .with_message(format!("invalid correctAnswer option id: {}", id).into()));
    }
    if question.exceeds_single_answer() {
        return Err(ValidationError::new("single_answer").with_message(
            "single-answer checkbox question accepts at most one correctAnswer".into(),
        ));
    }
    Ok(())
}

/// Picks one human readable message out of a validator report.
pub fn first_violation(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .into_values()
        .flat_map(|errs| errs.iter())
        .map(|err| {
            err.message
                .as_ref()
                .map(|message| message.to_string())
                .unwrap_or_else(|| err.code.to_string())
        })
        .next()
        .unwrap_or_else(|| errors.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn checkbox(options: &[&str], answers: &[&str], allow_multiple: bool) -> CheckboxQuestion {
        CheckboxQuestion {
            options: options
                .iter()
                .map(|id| CheckboxOption {
                    id: id.to_string(),
                    text: id.to_uppercase(),
                })
                .collect(),
            correct_answer: answers.iter().map(|id| id.to_string()).collect(),
            allow_multiple,
        }
    }

    #[test]
    fn question_type_parses_exact_discriminants() {
        assert_eq!("BOOLEAN".parse::<QuestionType>(), Ok(QuestionType::Boolean));
        assert_eq!("CHECKBOX".parse::<QuestionType>(), Ok(QuestionType::Checkbox));
        assert!("boolean".parse::<QuestionType>().is_err());
        assert_eq!(QuestionType::Input.as_str(), "INPUT");
    }

    #[test]
    fn question_serializes_with_type_tag_and_camel_case() {
        let question = Question {
            id: "q1".into(),
            title: "Capital of France?".into(),
            required: true,
            metadata: None,
            kind: QuestionKind::Input(InputQuestion {
                correct_answer: "Paris".into(),
                placeholder: None,
                max_length: Some(40),
            }),
        };

        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "q1",
                "title": "Capital of France?",
                "required": true,
                "type": "INPUT",
                "correctAnswer": "Paris",
                "maxLength": 40
            })
        );

        let parsed: Question = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, question);
    }

    #[test]
    fn checkbox_deserializes_with_default_allow_multiple() {
        let parsed: Question = serde_json::from_value(json!({
            "id": "q3",
            "title": "Pick",
            "type": "CHECKBOX",
            "options": [{ "id": "a", "text": "A" }],
            "correctAnswer": ["a"]
        }))
        .unwrap();

        match parsed.kind {
            QuestionKind::Checkbox(checkbox) => assert!(checkbox.allow_multiple),
            other => panic!("unexpected variant {:?}", other),
        }
        assert!(!parsed.required);
    }

    #[test]
    fn checkbox_constraints_report_first_problem() {
        assert!(checkbox(&["a", "b"], &["a", "b"], true).validate().is_ok());

        let errors = checkbox(&["a", "b"], &["c"], true).validate().unwrap_err();
        assert_eq!(first_violation(&errors), "invalid correctAnswer option id: c");

        let errors = checkbox(&["a", "a"], &[], true).validate().unwrap_err();
        assert_eq!(first_violation(&errors), "duplicate option id: a");

        let errors = checkbox(&["a", "b"], &["a", "b"], false).validate().unwrap_err();
        assert_eq!(
            first_violation(&errors),
            "single-answer checkbox question accepts at most one correctAnswer"
        );
    }

    #[test]
    fn empty_options_violate_length_constraint() {
        let errors = checkbox(&[], &[], true).validate().unwrap_err();
        assert_eq!(
            first_violation(&errors),
            "checkbox question requires a non-empty options array"
        );
    }

    #[test]
    fn input_max_length_is_bounded() {
        let mut input = InputQuestion {
            correct_answer: "x".into(),
            placeholder: None,
            max_length: Some(MAX_INPUT_LENGTH),
        };
        assert!(input.validate().is_ok());

        input.max_length = Some(MAX_INPUT_LENGTH + 1);
        assert!(input.validate().is_err());

        input.max_length = Some(0);
        assert!(input.validate().is_err());
    }
}
