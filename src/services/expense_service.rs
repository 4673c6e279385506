//! Ledger mutations and their budget side effects: every insert charges the
//! matching category budget, every delete refunds it.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Couple, Expense};
use crate::errors::{CoreError, CoreResult};
use crate::store::{BudgetStore, ExpenseQuery, ExpenseStore, ReceiptStore};

pub struct ExpenseService;

impl ExpenseService {
    /// Validates and records a new expense, charging the matching category
    /// budget when the entry falls inside its current period.
    pub fn add<S>(store: &mut S, expense: Expense) -> CoreResult<Expense>
    where
        S: ExpenseStore + BudgetStore,
    {
        expense.validate()?;
        let stored = store.insert_expense(expense)?;
        Self::charge_budget(store, &stored)?;
        Ok(stored)
    }

    /// Replaces an expense. The old entry is refunded and the new one charged,
    /// which also covers category or amount changes.
    pub fn update<S>(
        store: &mut S,
        couple: &Couple,
        actor: Uuid,
        expense: Expense,
    ) -> CoreResult<Expense>
    where
        S: ExpenseStore + BudgetStore,
    {
        expense.validate()?;
        let existing = store.expense(couple.id, expense.id)?;
        Self::ensure_can_modify(couple, actor, &existing)?;
        Self::refund_budget(store, &existing)?;
        let updated = store.update_expense(expense)?;
        Self::charge_budget(store, &updated)?;
        Ok(updated)
    }

    /// Deletes an expense and refunds the owning budget's cached spend.
    pub fn remove<S>(store: &mut S, couple: &Couple, actor: Uuid, id: Uuid) -> CoreResult<Expense>
    where
        S: ExpenseStore + BudgetStore,
    {
        let existing = store.expense(couple.id, id)?;
        Self::ensure_can_modify(couple, actor, &existing)?;
        let removed = store.delete_expense(couple.id, id)?;
        Self::refund_budget(store, &removed)?;
        Ok(removed)
    }

    pub fn list<S: ExpenseStore>(
        store: &S,
        couple_id: Uuid,
        filter: &ExpenseQuery,
    ) -> CoreResult<Vec<Expense>> {
        store.query_expenses(couple_id, filter)
    }

    /// Uploads a receipt image and links it to the expense.
    pub fn attach_receipt<S>(
        store: &mut S,
        couple: &Couple,
        actor: Uuid,
        id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> CoreResult<Expense>
    where
        S: ExpenseStore + ReceiptStore,
    {
        let mut expense = store.expense(couple.id, id)?;
        Self::ensure_can_modify(couple, actor, &expense)?;
        let url = store.upload(file_name, bytes)?;
        expense.receipt_url = Some(url);
        store.update_expense(expense)
    }

    fn ensure_can_modify(couple: &Couple, actor: Uuid, expense: &Expense) -> CoreResult<()> {
        if couple.member(actor).is_none() {
            return Err(CoreError::PermissionDenied(
                "actor is not a member of this couple".into(),
            ));
        }
        if expense.author_id == actor || couple.is_owner(actor) {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied(
                "only the author or an owner may modify this expense".into(),
            ))
        }
    }

    fn charge_budget<S: BudgetStore>(store: &mut S, expense: &Expense) -> CoreResult<()> {
        let Some(mut budget) = store.budget_by_category(expense.couple_id, &expense.category)?
        else {
            return Ok(());
        };
        if !budget.current_period().contains(expense.posted_on()) {
            return Ok(());
        }
        budget.current_spent += expense.amount;
        budget.touch();
        store.update_budget(budget)?;
        Ok(())
    }

    fn refund_budget<S: BudgetStore>(store: &mut S, expense: &Expense) -> CoreResult<()> {
        let Some(mut budget) = store.budget_by_category(expense.couple_id, &expense.category)?
        else {
            return Ok(());
        };
        if !budget.current_period().contains(expense.posted_on()) {
            return Ok(());
        }
        let next = budget.current_spent - expense.amount;
        if next < Decimal::ZERO {
            // Denormalization drift, not a ledger error. Clamp and warn.
            tracing::warn!(
                budget = %budget.id,
                category = %budget.category,
                cached = %budget.current_spent,
                refund = %expense.amount,
                "spend decrement would go negative, clamping cached total to zero"
            );
            budget.current_spent = Decimal::ZERO;
        } else {
            budget.current_spent = next;
        }
        budget.touch();
        store.update_budget(budget)?;
        Ok(())
    }
}
