use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::period::{add_months, add_years};
use super::split::Split;
use crate::errors::{CoreError, CoreResult};

/// How often a recurring bill comes due.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Monthly,
    Quarterly,
    Annual,
    Custom,
}

/// Tri-state urgency of a bill relative to a reference day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Upcoming,
    DueSoon,
    Overdue,
}

impl BillStatus {
    /// Total function of (due date, today). Due within a week counts as soon;
    /// the due day itself is still `DueSoon`, not `Overdue`.
    pub fn classify(due_date: NaiveDate, today: NaiveDate) -> (Self, i64) {
        let days_until_due = (due_date - today).num_days();
        let status = if days_until_due < 0 {
            BillStatus::Overdue
        } else if days_until_due <= 7 {
            BillStatus::DueSoon
        } else {
            BillStatus::Upcoming
        };
        (status, days_until_due)
    }
}

/// Advances a due date by one billing cycle. Months and years clamp to the end
/// of shorter target months, so a bill due Jan 31 lands on Feb 28 or 29.
pub fn next_due_date(
    current_due: NaiveDate,
    frequency: Frequency,
    custom_days: Option<u32>,
) -> CoreResult<NaiveDate> {
    match frequency {
        Frequency::Weekly => Ok(current_due + Duration::days(7)),
        Frequency::Monthly => Ok(add_months(current_due, 1)),
        Frequency::Quarterly => Ok(add_months(current_due, 3)),
        Frequency::Annual => Ok(add_years(current_due, 1)),
        Frequency::Custom => {
            let days = custom_days.filter(|days| *days > 0).ok_or_else(|| {
                CoreError::validation("custom frequency requires a positive interval in days")
            })?;
            Ok(current_due + Duration::days(days as i64))
        }
    }
}

/// A recurring obligation. Independent of budget categories; the optional
/// category is a tag, not a foreign key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: Uuid,
    pub couple_id: Uuid,
    pub name: String,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub due_date: NaiveDate,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_frequency_days: Option<u32>,
    pub split: Split,
    /// Days before the due date at which a reminder should fire.
    pub reminder_days: u32,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_paid_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    pub fn new(
        couple_id: Uuid,
        name: impl Into<String>,
        amount: Decimal,
        due_date: NaiveDate,
        frequency: Frequency,
        split: Split,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            couple_id,
            name: name.into(),
            amount,
            category: None,
            due_date,
            frequency,
            custom_frequency_days: None,
            split,
            reminder_days: 3,
            active: true,
            last_paid_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_custom_days(mut self, days: u32) -> Self {
        self.custom_frequency_days = Some(days);
        self
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(CoreError::validation("bill amount must be positive"));
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("bill name must not be empty"));
        }
        self.split.validate()?;
        match (self.frequency, self.custom_frequency_days) {
            (Frequency::Custom, None) => Err(CoreError::validation(
                "custom frequency requires an interval in days",
            )),
            (Frequency::Custom, Some(0)) => Err(CoreError::validation(
                "custom frequency interval must be positive",
            )),
            (Frequency::Custom, Some(_)) => Ok(()),
            (_, Some(_)) => Err(CoreError::validation(
                "interval in days only applies to custom frequency",
            )),
            (_, None) => Ok(()),
        }
    }

    pub fn next_due_date(&self) -> CoreResult<NaiveDate> {
        next_due_date(self.due_date, self.frequency, self.custom_frequency_days)
    }

    pub fn status(&self, today: NaiveDate) -> (BillStatus, i64) {
        BillStatus::classify(self.due_date, today)
    }

    /// True once the reminder window has opened and the bill is unpaid.
    pub fn needs_reminder(&self, today: NaiveDate) -> bool {
        let (_, days_until_due) = self.status(today);
        self.active && days_until_due <= self.reminder_days as i64
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Immutable record of one bill settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillPayment {
    pub id: Uuid,
    pub bill_id: Uuid,
    pub couple_id: Uuid,
    pub amount_paid: Decimal,
    pub payment_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    /// Billing period this payment closes out; the end bound is exclusive and
    /// equals the bill's next due date.
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub recorded_by: Uuid,
    pub created_at: DateTime<Utc>,
}
