//! Period rollover: archives elapsed budget periods into history and starts
//! the new period. Runs opportunistically whenever budgets are loaded.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Budget, BudgetHistory, BudgetStatus, Period};
use crate::errors::{CoreError, CoreResult};
use crate::store::{BudgetStore, ExpenseQuery, ExpenseStore, HistoryStore};

/// Per-budget outcome of one rollover sweep. Failures are collected here
/// instead of aborting the sweep; one stuck budget never blocks the rest.
#[derive(Debug, Default)]
pub struct RolloverReport {
    pub archived: Vec<Uuid>,
    pub already_archived: Vec<Uuid>,
    /// Elapsed budgets left alone because auto reset is disabled.
    pub skipped: Vec<Uuid>,
    pub failed: Vec<(Uuid, CoreError)>,
}

impl RolloverReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct RolloverService;

impl RolloverService {
    /// Brings every budget of the couple into the current period. A budget
    /// whose period month is strictly before `today`'s month is elapsed and
    /// gets archived and reset.
    pub fn ensure_current<S>(
        store: &mut S,
        couple_id: Uuid,
        today: NaiveDate,
    ) -> CoreResult<RolloverReport>
    where
        S: ExpenseStore + BudgetStore + HistoryStore,
    {
        let mut report = RolloverReport::default();
        for budget in store.list_budgets(couple_id)? {
            if !budget.current_period().elapsed_by(today) {
                continue;
            }
            if !budget.auto_reset {
                report.skipped.push(budget.id);
                continue;
            }
            let budget_id = budget.id;
            match Self::rollover_one(store, budget, today) {
                Ok(true) => report.archived.push(budget_id),
                Ok(false) => report.already_archived.push(budget_id),
                Err(error) => {
                    tracing::error!(budget = %budget_id, %error, "budget rollover failed");
                    report.failed.push((budget_id, error));
                }
            }
        }
        if !report.archived.is_empty() {
            tracing::info!(
                couple = %couple_id,
                archived = report.archived.len(),
                "budget periods rolled over"
            );
        }
        Ok(report)
    }

    /// Closed-month figures come exclusively from history, never recomputed
    /// from the live ledger.
    pub fn history<S: HistoryStore>(
        store: &S,
        couple_id: Uuid,
        budget_id: Option<Uuid>,
    ) -> CoreResult<Vec<BudgetHistory>> {
        store.list_history(couple_id, budget_id)
    }

    /// Archives one elapsed period and resets the budget. Returns `true` when
    /// a new history row was written, `false` when the period had already been
    /// archived (the reset still happens, making the whole operation
    /// idempotent).
    fn rollover_one<S>(store: &mut S, mut budget: Budget, today: NaiveDate) -> CoreResult<bool>
    where
        S: ExpenseStore + BudgetStore + HistoryStore,
    {
        let current = Period::containing(today);
        // The elapsed window runs from the stale period start up to the day
        // before the current month. Months skipped while nobody loaded the
        // budgets are folded into the same archive row.
        let period_start = budget.period_start;
        let period_end = current.start() - Duration::days(1);

        let filter = ExpenseQuery::category(budget.category.as_str())
            .between(period_start, current.start());
        let entries = store.query_expenses(budget.couple_id, &filter)?;
        let total_spent: Decimal = entries.iter().map(|entry| entry.amount).sum();

        let record = BudgetHistory {
            id: Uuid::new_v4(),
            budget_id: budget.id,
            couple_id: budget.couple_id,
            category: budget.category.clone(),
            period_start,
            period_end,
            limit: budget.limit,
            total_spent,
            entry_count: entries.len() as u32,
            final_status: BudgetStatus::classify(total_spent, budget.limit),
            archived_at: Utc::now(),
        };
        let archived = match store.insert_history(record) {
            Ok(_) => true,
            Err(CoreError::AlreadyArchived) => false,
            Err(error) => return Err(error),
        };

        budget.current_spent = Decimal::ZERO;
        budget.period_start = current.start();
        budget.touch();
        store.update_budget(budget)?;
        Ok(archived)
    }
}
