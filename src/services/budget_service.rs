//! Budget CRUD plus the period-aggregation engine that keeps the cached
//! `current_spent` consistent with the ledger.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Budget, Period};
use crate::errors::{CoreError, CoreResult};
use crate::store::{BudgetStore, ExpenseQuery, ExpenseStore};

/// Sums ledger amounts for `category` posted within `period`. Side-effect
/// free; the authoritative fallback for the incrementally maintained cache.
pub fn compute_current_spend<S: ExpenseStore>(
    store: &S,
    couple_id: Uuid,
    category: &str,
    period: Period,
) -> CoreResult<Decimal> {
    let filter = ExpenseQuery::category(category).between(period.start(), period.end_exclusive());
    let expenses = store.query_expenses(couple_id, &filter)?;
    Ok(expenses.iter().map(|expense| expense.amount).sum())
}

pub struct BudgetService;

impl BudgetService {
    /// Creates a category budget for the current period, seeding the cached
    /// spend from expenses already posted in that period.
    pub fn create<S>(
        store: &mut S,
        couple_id: Uuid,
        category: &str,
        limit: Decimal,
        today: NaiveDate,
    ) -> CoreResult<Budget>
    where
        S: ExpenseStore + BudgetStore,
    {
        if limit <= Decimal::ZERO {
            return Err(CoreError::validation("budget limit must be positive"));
        }
        if category.trim().is_empty() {
            return Err(CoreError::validation("budget category must not be empty"));
        }
        if store.budget_by_category(couple_id, category)?.is_some() {
            return Err(CoreError::validation(format!(
                "a budget for '{category}' already exists"
            )));
        }
        let period = Period::containing(today);
        let mut budget = Budget::new(couple_id, category, limit, period.start());
        budget.current_spent = compute_current_spend(store, couple_id, category, period)?;
        store.insert_budget(budget)
    }

    pub fn get<S: BudgetStore>(store: &S, couple_id: Uuid, id: Uuid) -> CoreResult<Budget> {
        store.budget(couple_id, id)
    }

    pub fn list<S: BudgetStore>(store: &S, couple_id: Uuid) -> CoreResult<Vec<Budget>> {
        store.list_budgets(couple_id)
    }

    pub fn set_limit<S: BudgetStore>(
        store: &mut S,
        couple_id: Uuid,
        id: Uuid,
        limit: Decimal,
    ) -> CoreResult<Budget> {
        if limit <= Decimal::ZERO {
            return Err(CoreError::validation("budget limit must be positive"));
        }
        let mut budget = store.budget(couple_id, id)?;
        budget.limit = limit;
        budget.touch();
        store.update_budget(budget)
    }

    pub fn set_auto_reset<S: BudgetStore>(
        store: &mut S,
        couple_id: Uuid,
        id: Uuid,
        auto_reset: bool,
    ) -> CoreResult<Budget> {
        let mut budget = store.budget(couple_id, id)?;
        budget.auto_reset = auto_reset;
        budget.touch();
        store.update_budget(budget)
    }

    /// Removes the budget. Ledger entries in its category are left untouched.
    pub fn delete<S: BudgetStore>(store: &mut S, couple_id: Uuid, id: Uuid) -> CoreResult<()> {
        store.delete_budget(couple_id, id)
    }

    /// Recomputes the cached spend from the ledger, repairing any drift the
    /// incremental path accumulated.
    pub fn recompute<S>(store: &mut S, couple_id: Uuid, id: Uuid) -> CoreResult<Budget>
    where
        S: ExpenseStore + BudgetStore,
    {
        let mut budget = store.budget(couple_id, id)?;
        let actual =
            compute_current_spend(store, couple_id, &budget.category, budget.current_period())?;
        if actual == budget.current_spent {
            return Ok(budget);
        }
        tracing::warn!(
            budget = %budget.id,
            category = %budget.category,
            cached = %budget.current_spent,
            actual = %actual,
            "cached spend drifted from ledger, repairing"
        );
        budget.current_spent = actual;
        budget.touch();
        store.update_budget(budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BudgetStatus, Expense, Split};
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn posted(
        store: &mut MemoryStore,
        couple_id: Uuid,
        category: &str,
        amount: Decimal,
        on: NaiveDate,
    ) -> Expense {
        let created = Utc
            .from_utc_datetime(&on.and_hms_opt(12, 0, 0).unwrap());
        let expense = Expense::new(couple_id, Uuid::new_v4(), amount, category, Split::even())
            .with_created_at(created);
        store.insert_expense(expense).unwrap()
    }

    #[test]
    fn create_seeds_spend_from_existing_entries() {
        let mut store = MemoryStore::new();
        let couple_id = Uuid::new_v4();
        posted(&mut store, couple_id, "groceries", dec!(100), date(2024, 3, 2));
        posted(&mut store, couple_id, "groceries", dec!(150), date(2024, 3, 10));
        posted(&mut store, couple_id, "groceries", dec!(260), date(2024, 3, 28));
        // Outside the period and category, ignored.
        posted(&mut store, couple_id, "groceries", dec!(40), date(2024, 2, 27));
        posted(&mut store, couple_id, "fuel", dec!(55), date(2024, 3, 5));

        let budget =
            BudgetService::create(&mut store, couple_id, "groceries", dec!(500), date(2024, 3, 15))
                .unwrap();
        assert_eq!(budget.current_spent, dec!(510));
        assert_eq!(budget.status(), BudgetStatus::Over);
        assert_eq!(budget.remaining(), dec!(-10));
        assert_eq!(budget.period_start, date(2024, 3, 1));
    }

    #[test]
    fn create_rejects_duplicates_and_bad_limits() {
        let mut store = MemoryStore::new();
        let couple_id = Uuid::new_v4();
        BudgetService::create(&mut store, couple_id, "groceries", dec!(100), date(2024, 3, 1))
            .unwrap();

        assert!(matches!(
            BudgetService::create(&mut store, couple_id, "groceries", dec!(50), date(2024, 3, 1)),
            Err(CoreError::Validation(_))
        ));
        assert!(BudgetService::create(
            &mut store,
            couple_id,
            "fuel",
            dec!(0),
            date(2024, 3, 1)
        )
        .is_err());
    }

    #[test]
    fn recompute_repairs_drift() {
        let mut store = MemoryStore::new();
        let couple_id = Uuid::new_v4();
        let budget =
            BudgetService::create(&mut store, couple_id, "groceries", dec!(300), date(2024, 3, 1))
                .unwrap();
        posted(&mut store, couple_id, "groceries", dec!(80), date(2024, 3, 4));

        // Cache was not maintained for the direct insert above; recompute heals it.
        let repaired = BudgetService::recompute(&mut store, couple_id, budget.id).unwrap();
        assert_eq!(repaired.current_spent, dec!(80));
    }

    #[test]
    fn missing_budget_is_not_found() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            BudgetService::set_limit(&mut store, Uuid::new_v4(), Uuid::new_v4(), dec!(10)),
            Err(CoreError::NotFound { kind: "budget", .. })
        ));
    }
}
