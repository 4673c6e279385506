//! Backend-agnostic store traits plus the two reference backends: an
//! in-memory mirror and a JSON snapshot on disk.

pub mod json_backend;
pub mod memory;

use std::sync::mpsc::Receiver;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Bill, BillPayment, Budget, BudgetHistory, Expense};
use crate::errors::CoreResult;

pub use json_backend::{Dataset, JsonStore, DATASET_SCHEMA_VERSION};
pub use memory::MemoryStore;

/// Filter for ledger queries. `None` fields match everything; the date range
/// is half open, inclusive of `from` and exclusive of `to`.
#[derive(Debug, Clone, Default)]
pub struct ExpenseQuery {
    pub category: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ExpenseQuery {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        if let Some(category) = &self.category {
            if expense.category != *category {
                return false;
            }
        }
        let posted = expense.posted_on();
        if let Some(from) = self.from {
            if posted < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if posted >= to {
                return false;
            }
        }
        true
    }
}

/// Read/write access to the couple's expense ledger.
pub trait ExpenseStore {
    fn insert_expense(&mut self, expense: Expense) -> CoreResult<Expense>;
    fn update_expense(&mut self, expense: Expense) -> CoreResult<Expense>;
    fn delete_expense(&mut self, couple_id: Uuid, id: Uuid) -> CoreResult<Expense>;
    fn expense(&self, couple_id: Uuid, id: Uuid) -> CoreResult<Expense>;
    fn query_expenses(&self, couple_id: Uuid, filter: &ExpenseQuery) -> CoreResult<Vec<Expense>>;
}

/// Budget rows keyed by couple and category. Updates are full-row replaces.
pub trait BudgetStore {
    fn insert_budget(&mut self, budget: Budget) -> CoreResult<Budget>;
    fn update_budget(&mut self, budget: Budget) -> CoreResult<Budget>;
    fn delete_budget(&mut self, couple_id: Uuid, id: Uuid) -> CoreResult<()>;
    fn budget(&self, couple_id: Uuid, id: Uuid) -> CoreResult<Budget>;
    fn budget_by_category(&self, couple_id: Uuid, category: &str) -> CoreResult<Option<Budget>>;
    fn list_budgets(&self, couple_id: Uuid) -> CoreResult<Vec<Budget>>;
}

/// Append-only archive of elapsed budget periods.
pub trait HistoryStore {
    /// Enforces at most one record per (budget, period start). A duplicate
    /// insert fails with [`crate::errors::CoreError::AlreadyArchived`].
    fn insert_history(&mut self, record: BudgetHistory) -> CoreResult<BudgetHistory>;
    fn list_history(
        &self,
        couple_id: Uuid,
        budget_id: Option<Uuid>,
    ) -> CoreResult<Vec<BudgetHistory>>;
}

pub trait BillStore {
    fn insert_bill(&mut self, bill: Bill) -> CoreResult<Bill>;
    fn update_bill(&mut self, bill: Bill) -> CoreResult<Bill>;
    fn delete_bill(&mut self, couple_id: Uuid, id: Uuid) -> CoreResult<Bill>;
    fn bill(&self, couple_id: Uuid, id: Uuid) -> CoreResult<Bill>;
    fn list_bills(&self, couple_id: Uuid) -> CoreResult<Vec<Bill>>;
}

pub trait PaymentStore {
    fn insert_payment(&mut self, payment: BillPayment) -> CoreResult<BillPayment>;
    fn delete_payment(&mut self, couple_id: Uuid, id: Uuid) -> CoreResult<BillPayment>;
    fn list_payments(&self, couple_id: Uuid, bill_id: Option<Uuid>)
        -> CoreResult<Vec<BillPayment>>;
}

/// Opaque binary storage for receipt images. The core only passes URLs around.
pub trait ReceiptStore {
    fn upload(&mut self, file_name: &str, bytes: &[u8]) -> CoreResult<String>;
    fn delete(&mut self, url: &str) -> CoreResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Expenses,
    Budgets,
    BudgetHistory,
    Bills,
    BillPayments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// Row-level change notification. Consumers treat any event as a cue to
/// re-fetch the affected collection; no fine-grained patching.
#[derive(Debug, Clone, Copy)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub row_id: Uuid,
}

pub trait ChangeFeed {
    fn subscribe(&mut self, couple_id: Uuid, table: Table) -> Receiver<ChangeEvent>;
}
