use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::record_id::RecordId;

/// A question saved for the next doctor's appointment.
///
/// `client_ref` is minted by the caller and written to every backend the
/// question lands on, so it addresses the same question on both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorQuestion {
    pub id: RecordId,
    pub client_ref: Uuid,
    pub user_id: String,
    pub question: String,
    pub answer: Option<String>,
    pub category: Option<String>,
    pub answered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl DoctorQuestion {
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

impl fmt::Display for DoctorQuestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.client_ref, self.question)?;
        if let Some(category) = &self.category {
            write!(f, " ({})", category)?;
        }
        if let Some(answer) = &self.answer {
            write!(f, "\n    -> {}", answer)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDoctorQuestion {
    pub client_ref: Uuid,
    pub user_id: String,
    pub question: String,
    pub category: Option<String>,
}

impl NewDoctorQuestion {
    pub fn new(user_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            client_ref: Uuid::new_v4(),
            user_id: user_id.into(),
            question: question.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}
