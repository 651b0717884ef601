//! Reservation Model

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::types::EntityId;

/// Reservation status
///
/// Transitions are decided by the server; the client only mirrors them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Approved,
    Confirmed,
    Completed,
    Cancelled,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Approved => "approved",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Rejected => "rejected",
            ReservationStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guest attached to a reservation (backend sends either an id or an object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "GuestRepr")]
pub struct ReservationGuest {
    pub id: EntityId,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GuestRepr {
    Id(EntityId),
    Full {
        #[serde(alias = "_id")]
        id: EntityId,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        email: Option<String>,
    },
}

impl From<GuestRepr> for ReservationGuest {
    fn from(repr: GuestRepr) -> Self {
        match repr {
            GuestRepr::Id(id) => Self {
                id,
                name: None,
                email: None,
            },
            GuestRepr::Full { id, name, email } => Self { id, name, email },
        }
    }
}

/// Reservation entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(alias = "departmentId", alias = "department_id", alias = "dept_id")]
    pub dept_id: EntityId,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    /// Length of stay in nights
    #[serde(default)]
    pub duration: u32,
    #[serde(default)]
    pub status: ReservationStatus,
    #[serde(default)]
    pub amount: f64,
    #[serde(default, alias = "payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub user: Option<ReservationGuest>,
}

impl Reservation {
    pub fn apply(&mut self, update: &ReservationUpdate) {
        if let Some(date) = &update.date {
            self.date = date.clone();
        }
        if let Some(time) = &update.time {
            self.time = time.clone();
        }
        if let Some(duration) = update.duration {
            self.duration = duration;
        }
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(method) = &update.payment_method {
            self.payment_method = method.clone();
        }
        if let Some(notes) = &update.notes {
            self.notes = Some(notes.clone());
        }
    }
}

/// Create reservation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationCreate {
    pub dept_id: EntityId,
    pub date: String,
    pub time: String,
    pub duration: u32,
    pub amount: f64,
    pub payment_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ReservationCreate {
    pub fn validate(&self) -> ValidationResult {
        if self.dept_id.is_empty() {
            return Err(ValidationError::new("deptId", "must reference a department"));
        }
        if self.date.trim().is_empty() {
            return Err(ValidationError::new("date", "must not be empty"));
        }
        if self.duration == 0 {
            return Err(ValidationError::new("duration", "must be at least 1"));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(ValidationError::new("amount", "must be a non-negative number"));
        }
        Ok(())
    }

    /// Pending record carrying the submitted fields
    pub fn into_reservation(self, id: EntityId) -> Reservation {
        Reservation {
            id,
            dept_id: self.dept_id,
            date: self.date,
            time: self.time,
            duration: self.duration,
            status: ReservationStatus::Pending,
            amount: self.amount,
            payment_method: self.payment_method,
            notes: self.notes,
            user: None,
        }
    }
}

/// Update reservation payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ReservationUpdate {
    pub fn validate(&self) -> ValidationResult {
        if self.duration == Some(0) {
            return Err(ValidationError::new("duration", "must be at least 1"));
        }
        if let Some(amount) = self.amount
            && (!amount.is_finite() || amount < 0.0)
        {
            return Err(ValidationError::new("amount", "must be a non-negative number"));
        }
        Ok(())
    }
}

/// Status transition payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: ReservationStatus,
}
