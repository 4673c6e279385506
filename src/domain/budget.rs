use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::period::Period;

/// Tri-state health of a budget's current period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    OnTrack,
    Warning,
    Over,
}

impl BudgetStatus {
    /// Classifies spend against a positive limit. The warning band is closed on
    /// both ends: exactly 75% and exactly 100% both classify as `Warning`.
    pub fn classify(spent: Decimal, limit: Decimal) -> Self {
        let warning_floor = limit * Decimal::new(75, 2);
        if spent < warning_floor {
            BudgetStatus::OnTrack
        } else if spent <= limit {
            BudgetStatus::Warning
        } else {
            BudgetStatus::Over
        }
    }
}

/// Length of one budget accumulation window. Only calendar months are
/// supported today; the enum leaves room for other cycles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    #[default]
    Monthly,
}

/// A spending ceiling for one category within one couple.
///
/// `current_spent` is a cached aggregate over the ledger; the service layer
/// keeps it consistent with the expenses posted inside the current period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: Uuid,
    pub couple_id: Uuid,
    pub category: String,
    pub limit: Decimal,
    pub current_spent: Decimal,
    pub period_start: NaiveDate,
    #[serde(default)]
    pub period_kind: PeriodKind,
    pub auto_reset: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(
        couple_id: Uuid,
        category: impl Into<String>,
        limit: Decimal,
        period_start: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            couple_id,
            category: category.into(),
            limit,
            current_spent: Decimal::ZERO,
            period_start,
            period_kind: PeriodKind::default(),
            auto_reset: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn current_period(&self) -> Period {
        Period::from_start(self.period_start)
    }

    pub fn status(&self) -> BudgetStatus {
        BudgetStatus::classify(self.current_spent, self.limit)
    }

    /// Remaining allowance; negative once the limit is exceeded.
    pub fn remaining(&self) -> Decimal {
        self.limit - self.current_spent
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Immutable snapshot of one elapsed budget period. Written exactly once per
/// (budget, period start) by the rollover manager, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetHistory {
    pub id: Uuid,
    pub budget_id: Uuid,
    pub couple_id: Uuid,
    pub category: String,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub limit: Decimal,
    pub total_spent: Decimal,
    pub entry_count: u32,
    pub final_status: BudgetStatus,
    pub archived_at: DateTime<Utc>,
}
