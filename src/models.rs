use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/**
 * Upper bound on the length of question and choice text
 */
pub const MAX_TEXT_LENGTH: usize = 200;

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
}

impl Question {
    /**
     * A question is visible once its publication time has arrived
     */
    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.pub_date <= now
    }

    /**
     * Published within the last day, both ends inclusive.
     *
     * Questions scheduled for the future are never recent.
     */
    pub fn is_recent(&self, now: DateTime<Utc>) -> bool {
        now - Duration::days(1) <= self.pub_date && self.pub_date <= now
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, sqlx::FromRow)]
pub struct Choice {
    pub id: i64,
    pub question_id: i64,
    pub text: String,
    pub votes: i64,
}

/**
 * User-provided details to create a Question along with its choices
 */
#[derive(Clone, Debug, Deserialize)]
pub struct NewQuestion {
    pub text: String,
    /**
     * Publication time, defaults to the moment of creation
     */
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
    /**
     * Just the text of each choice, blank slots are skipped
     */
    #[serde(default)]
    pub choices: Vec<String>,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} may not be blank")]
    Blank { field: &'static str },
    #[error("{field} is longer than {} characters", MAX_TEXT_LENGTH)]
    TooLong { field: &'static str },
}

impl NewQuestion {
    /**
     * Check the text limits and drop blank choice slots
     */
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        check_text("question text", &self.text)?;

        self.choices.retain(|choice| !choice.trim().is_empty());
        for choice in self.choices.iter() {
            check_text("choice text", choice)?;
        }
        Ok(self)
    }
}

fn check_text(field: &'static str, text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        Err(ValidationError::Blank { field })
    } else if text.chars().count() > MAX_TEXT_LENGTH {
        Err(ValidationError::TooLong { field })
    } else {
        Ok(())
    }
}
