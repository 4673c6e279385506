use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::couple::{Couple, IncomeSource};
use crate::errors::{CoreError, CoreResult};

/// One of the two household partners, in couple slot order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Partner {
    A,
    B,
}

/// Rule deciding what share of a charge each partner owes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SplitPolicy {
    Even,
    SinglePayer { payer: Partner },
    Custom { partner_a: u8, partner_b: u8 },
    Proportional,
}

impl SplitPolicy {
    /// Resolves the policy into the two percentages owed by partners A and B.
    /// The income arguments are consulted only for the proportional case.
    pub fn percentages(&self, income_a: Decimal, income_b: Decimal) -> (u8, u8) {
        match self {
            SplitPolicy::Even => (50, 50),
            SplitPolicy::SinglePayer { payer: Partner::A } => (100, 0),
            SplitPolicy::SinglePayer { payer: Partner::B } => (0, 100),
            SplitPolicy::Custom {
                partner_a,
                partner_b,
            } => (*partner_a, *partner_b),
            SplitPolicy::Proportional => proportional(income_a, income_b),
        }
    }
}

/// A policy together with its resolved percentages, as stored on a row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Split {
    pub policy: SplitPolicy,
    pub partner_a: u8,
    pub partner_b: u8,
}

impl Split {
    pub fn even() -> Self {
        Self {
            policy: SplitPolicy::Even,
            partner_a: 50,
            partner_b: 50,
        }
    }

    /// Checks the row invariant: the two percentages sum to exactly 100.
    pub fn validate(&self) -> CoreResult<()> {
        let sum = self.partner_a as u16 + self.partner_b as u16;
        if sum != 100 {
            return Err(CoreError::validation(format!(
                "split percentages must sum to 100, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Resolves a policy into a concrete split for the couple.
pub fn resolve(policy: SplitPolicy, couple: &Couple, incomes: &[IncomeSource]) -> Split {
    let (income_a, income_b) = monthly_totals(couple, incomes);
    let (partner_a, partner_b) = policy.percentages(income_a, income_b);
    Split {
        policy,
        partner_a,
        partner_b,
    }
}

/// Sums each partner's income sources as monthly equivalents.
pub fn monthly_totals(couple: &Couple, incomes: &[IncomeSource]) -> (Decimal, Decimal) {
    let mut total_a = Decimal::ZERO;
    let mut total_b = Decimal::ZERO;
    for source in incomes {
        if source.profile_id == couple.partner_a.id {
            total_a += source.monthly_equivalent();
        } else if source.profile_id == couple.partner_b.id {
            total_b += source.monthly_equivalent();
        }
    }
    (total_a, total_b)
}

/// Income-proportional percentages. Rounds partner A's share to the nearest
/// whole percent and gives partner B the exact remainder, so the pair always
/// sums to 100. Zero household income falls back to an even split.
fn proportional(income_a: Decimal, income_b: Decimal) -> (u8, u8) {
    let total = income_a + income_b;
    if total <= Decimal::ZERO {
        return (50, 50);
    }
    let share_a = (income_a * Decimal::from(100) / total)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(50)
        .min(100) as u8;
    (share_a, 100 - share_a)
}
