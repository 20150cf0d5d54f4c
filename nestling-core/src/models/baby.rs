use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::record_id::RecordId;
use super::sex::Sex;
use crate::pregnancy;

/// A baby profile, in the shape both backends are mapped into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Baby {
    pub id: RecordId,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub photo_url: Option<String>,
    pub owner_id: String,
    /// Users other than the owner who can see this profile.
    pub shared_with: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Baby {
    pub fn is_born(&self) -> bool {
        self.birth_date.is_some()
    }

    pub fn is_visible_to(&self, user_id: &str) -> bool {
        self.owner_id == user_id || self.shared_with.iter().any(|u| u == user_id)
    }

    /// Current pregnancy week, for profiles that have a due date and no birth date.
    pub fn pregnancy_week(&self, today: NaiveDate) -> Option<u32> {
        if self.is_born() {
            return None;
        }
        self.due_date
            .map(|due| pregnancy::pregnancy_week(due, today))
    }
}

impl fmt::Display for Baby {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "{}", "=".repeat(self.name.len().max(10)))?;
        writeln!(f, "ID: {}", self.id)?;

        if let Some(birth) = self.birth_date {
            writeln!(f, "Born: {}", birth)?;
        } else if let Some(due) = self.due_date {
            writeln!(f, "Due: {}", due)?;
        }
        if let Some(sex) = self.sex {
            writeln!(f, "Sex: {}", sex)?;
        }
        writeln!(f, "Owner: {}", self.owner_id)?;
        if !self.shared_with.is_empty() {
            writeln!(f, "Shared with: {}", self.shared_with.join(", "))?;
        }

        Ok(())
    }
}

/// Input for creating a baby profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBaby {
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub photo_url: Option<String>,
    pub owner_id: String,
}

impl NewBaby {
    pub fn new(name: impl Into<String>, owner_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            birth_date: None,
            due_date: None,
            sex: None,
            photo_url: None,
            owner_id: owner_id.into(),
        }
    }

    pub fn with_birth_date(mut self, date: NaiveDate) -> Self {
        self.birth_date = Some(date);
        self
    }

    pub fn with_due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = Some(sex);
        self
    }
}

/// Partial update for a baby profile; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BabyPatch {
    pub name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub sex: Option<Sex>,
    pub photo_url: Option<String>,
}

impl BabyPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.birth_date.is_none()
            && self.due_date.is_none()
            && self.sex.is_none()
            && self.photo_url.is_none()
    }

    pub fn apply(&self, baby: &mut Baby) {
        if let Some(name) = &self.name {
            baby.name = name.clone();
        }
        if let Some(date) = self.birth_date {
            baby.birth_date = Some(date);
        }
        if let Some(date) = self.due_date {
            baby.due_date = Some(date);
        }
        if let Some(sex) = self.sex {
            baby.sex = Some(sex);
        }
        if let Some(url) = &self.photo_url {
            baby.photo_url = Some(url.clone());
        }
    }
}
