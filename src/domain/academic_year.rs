//! Academic years; at most one is active at a time.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcademicYear {
    pub id: Uuid,
    pub name: String,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AcademicYear {
    /// Build a new, inactive academic year.
    pub fn new(name: String, starts_on: NaiveDate, ends_on: NaiveDate) -> AppResult<Self> {
        if starts_on >= ends_on {
            return Err(AppError::validation("starts_on must be before ends_on"));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            starts_on,
            ends_on,
            is_active: false,
            created_at: now,
            updated_at: now,
        })
    }
}
