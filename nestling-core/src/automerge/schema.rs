//! Document-backend record shapes and their mapping to the canonical models.
//!
//! Every collection document is a map of record key -> object. Field names
//! are camelCase and instants are epoch milliseconds.
//!
//! ## babies
//! ```text
//! {
//!   "<key>": {
//!     "_id": "<key>",
//!     "_creationTime": number,
//!     "name": "string",
//!     "birthDate": "YYYY-MM-DD" | absent,
//!     "dueDate": "YYYY-MM-DD" | absent,
//!     "sex": "female" | "male" | "unknown" | absent,
//!     "photoUrl": "string" | absent,
//!     "ownerId": "string",
//!     "memberIds": ["<owner>", "<shared user>", ...],
//!     "updatedAt": number
//!   }
//! }
//! ```
//!
//! ## sleep_entries
//! ```text
//! {
//!   "<key>": {
//!     "_id", "_creationTime",
//!     "babyId": "string", "userId": "string",
//!     "startTime": number, "endTime": number | absent,
//!     "durationMinutes": number | absent, "notes": "string" | absent
//!   }
//! }
//! ```
//!
//! ## doctor_questions
//! ```text
//! {
//!   "<key>": {
//!     "_id", "_creationTime",
//!     "clientRef": "<uuid>", "userId": "string", "question": "string",
//!     "answer": "string" | absent, "category": "string" | absent,
//!     "answeredAt": number | absent
//!   }
//! }
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DataError;
use crate::models::{Baby, DoctorQuestion, RecordId, Sex, SleepEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct BabyObject {
    pub id: String,
    pub creation_time: i64,
    pub name: String,
    pub birth_date: Option<String>,
    pub due_date: Option<String>,
    pub sex: Option<String>,
    pub photo_url: Option<String>,
    pub owner_id: String,
    pub member_ids: Vec<String>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SleepObject {
    pub id: String,
    pub creation_time: i64,
    pub baby_id: String,
    pub user_id: String,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub duration_minutes: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuestionObject {
    pub id: String,
    pub creation_time: i64,
    pub client_ref: String,
    pub user_id: String,
    pub question: String,
    pub answer: Option<String>,
    pub category: Option<String>,
    pub answered_at: Option<i64>,
}

pub fn to_millis(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub fn from_millis(field: &str, ms: i64) -> Result<DateTime<Utc>, DataError> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or_else(|| DataError::InvalidRecord(format!("{} out of range: {}", field, ms)))
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, DataError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|e| DataError::InvalidRecord(format!("{} '{}': {}", field, v, e)))
        })
        .transpose()
}

impl BabyObject {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.owner_id == user_id || self.member_ids.iter().any(|m| m == user_id)
    }
}

impl TryFrom<BabyObject> for Baby {
    type Error = DataError;

    fn try_from(obj: BabyObject) -> Result<Self, Self::Error> {
        let sex = obj
            .sex
            .as_deref()
            .map(|s| s.parse::<Sex>().map_err(DataError::InvalidRecord))
            .transpose()?;
        let shared_with = obj
            .member_ids
            .iter()
            .filter(|m| **m != obj.owner_id)
            .cloned()
            .collect();

        Ok(Baby {
            id: RecordId::new(obj.id),
            name: obj.name,
            birth_date: parse_date("birthDate", obj.birth_date.as_deref())?,
            due_date: parse_date("dueDate", obj.due_date.as_deref())?,
            sex,
            photo_url: obj.photo_url,
            owner_id: obj.owner_id,
            shared_with,
            created_at: from_millis("_creationTime", obj.creation_time)?,
            updated_at: from_millis("updatedAt", obj.updated_at)?,
        })
    }
}

impl From<&Baby> for BabyObject {
    fn from(baby: &Baby) -> Self {
        let mut member_ids = vec![baby.owner_id.clone()];
        member_ids.extend(baby.shared_with.iter().cloned());

        BabyObject {
            id: baby.id.to_string(),
            creation_time: to_millis(&baby.created_at),
            name: baby.name.clone(),
            birth_date: baby.birth_date.map(|d| d.to_string()),
            due_date: baby.due_date.map(|d| d.to_string()),
            sex: baby.sex.map(|s| s.to_string()),
            photo_url: baby.photo_url.clone(),
            owner_id: baby.owner_id.clone(),
            member_ids,
            updated_at: to_millis(&baby.updated_at),
        }
    }
}

impl TryFrom<SleepObject> for SleepEntry {
    type Error = DataError;

    fn try_from(obj: SleepObject) -> Result<Self, Self::Error> {
        Ok(SleepEntry {
            id: RecordId::new(obj.id),
            baby_id: RecordId::new(obj.baby_id),
            user_id: obj.user_id,
            start_time: from_millis("startTime", obj.start_time)?,
            end_time: obj
                .end_time
                .map(|ms| from_millis("endTime", ms))
                .transpose()?,
            duration_minutes: obj.duration_minutes,
            notes: obj.notes,
            created_at: from_millis("_creationTime", obj.creation_time)?,
        })
    }
}

impl From<&SleepEntry> for SleepObject {
    fn from(entry: &SleepEntry) -> Self {
        SleepObject {
            id: entry.id.to_string(),
            creation_time: to_millis(&entry.created_at),
            baby_id: entry.baby_id.to_string(),
            user_id: entry.user_id.clone(),
            start_time: to_millis(&entry.start_time),
            end_time: entry.end_time.as_ref().map(to_millis),
            duration_minutes: entry.duration_minutes,
            notes: entry.notes.clone(),
        }
    }
}

impl TryFrom<QuestionObject> for DoctorQuestion {
    type Error = DataError;

    fn try_from(obj: QuestionObject) -> Result<Self, Self::Error> {
        let client_ref = Uuid::parse_str(&obj.client_ref).map_err(|e| {
            DataError::InvalidRecord(format!("clientRef '{}': {}", obj.client_ref, e))
        })?;

        Ok(DoctorQuestion {
            id: RecordId::new(obj.id),
            client_ref,
            user_id: obj.user_id,
            question: obj.question,
            answer: obj.answer,
            category: obj.category,
            answered_at: obj
                .answered_at
                .map(|ms| from_millis("answeredAt", ms))
                .transpose()?,
            created_at: from_millis("_creationTime", obj.creation_time)?,
        })
    }
}

impl From<&DoctorQuestion> for QuestionObject {
    fn from(q: &DoctorQuestion) -> Self {
        QuestionObject {
            id: q.id.to_string(),
            creation_time: to_millis(&q.created_at),
            client_ref: q.client_ref.to_string(),
            user_id: q.user_id.clone(),
            question: q.question.clone(),
            answer: q.answer.clone(),
            category: q.category.clone(),
            answered_at: q.answered_at.as_ref().map(to_millis),
        }
    }
}
