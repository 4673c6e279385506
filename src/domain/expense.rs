use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::split::Split;
use crate::errors::{CoreError, CoreResult};

/// One atomic spend event in the couple's ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub couple_id: Uuid,
    pub author_id: Uuid,
    pub amount: Decimal,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub split: Split,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_bill_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        couple_id: Uuid,
        author_id: Uuid,
        amount: Decimal,
        category: impl Into<String>,
        split: Split,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            couple_id,
            author_id,
            amount,
            category: category.into(),
            note: None,
            split,
            receipt_url: None,
            source_bill_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn from_bill(mut self, bill_id: Uuid) -> Self {
        self.source_bill_id = Some(bill_id);
        self
    }

    /// Calendar date the expense counts against, in the ledger's timeline.
    pub fn posted_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(CoreError::validation("expense amount must be positive"));
        }
        if self.category.trim().is_empty() {
            return Err(CoreError::validation("expense category must not be empty"));
        }
        self.split.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::split::{Split, SplitPolicy};
    use rust_decimal_macros::dec;

    fn sample(amount: Decimal) -> Expense {
        Expense::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            amount,
            "groceries",
            Split::even(),
        )
    }

    #[test]
    fn rejects_non_positive_amounts() {
        assert!(sample(dec!(0)).validate().is_err());
        assert!(sample(dec!(-3)).validate().is_err());
        assert!(sample(dec!(0.01)).validate().is_ok());
    }

    #[test]
    fn rejects_split_not_summing_to_100() {
        let mut expense = sample(dec!(10));
        expense.split = Split {
            policy: SplitPolicy::Custom {
                partner_a: 60,
                partner_b: 30,
            },
            partner_a: 60,
            partner_b: 30,
        };
        assert!(matches!(
            expense.validate(),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn rejects_blank_category() {
        let mut expense = sample(dec!(10));
        expense.category = "  ".into();
        assert!(expense.validate().is_err());
    }
}
