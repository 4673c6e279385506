//! In-memory backend. Serves as the client-side mirror of the hosted tables
//! and as the store used throughout the service tests.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};

use uuid::Uuid;

use super::{
    BillStore, BudgetStore, ChangeEvent, ChangeFeed, ChangeKind, Dataset, ExpenseQuery,
    ExpenseStore, HistoryStore, PaymentStore, ReceiptStore, Table,
};
use crate::domain::{Bill, BillPayment, Budget, BudgetHistory, Expense};
use crate::errors::{CoreError, CoreResult};

struct Subscriber {
    couple_id: Uuid,
    table: Table,
    sender: Sender<ChangeEvent>,
}

#[derive(Default)]
pub struct MemoryStore {
    expenses: Vec<Expense>,
    budgets: Vec<Budget>,
    history: Vec<BudgetHistory>,
    bills: Vec<Bill>,
    payments: Vec<BillPayment>,
    receipts: HashMap<String, Vec<u8>>,
    subscribers: Vec<Subscriber>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dataset(dataset: Dataset) -> Self {
        Self {
            expenses: dataset.expenses,
            budgets: dataset.budgets,
            history: dataset.history,
            bills: dataset.bills,
            payments: dataset.payments,
            receipts: HashMap::new(),
            subscribers: Vec::new(),
        }
    }

    /// Copies the current rows into a serializable snapshot.
    pub fn snapshot(&self) -> Dataset {
        Dataset {
            expenses: self.expenses.clone(),
            budgets: self.budgets.clone(),
            history: self.history.clone(),
            bills: self.bills.clone(),
            payments: self.payments.clone(),
            schema_version: super::DATASET_SCHEMA_VERSION,
        }
    }

    fn publish(&mut self, couple_id: Uuid, table: Table, kind: ChangeKind, row_id: Uuid) {
        // Dropped receivers are pruned as a side effect of the failed send.
        self.subscribers.retain(|subscriber| {
            if subscriber.couple_id != couple_id || subscriber.table != table {
                return true;
            }
            subscriber
                .sender
                .send(ChangeEvent {
                    table,
                    kind,
                    row_id,
                })
                .is_ok()
        });
    }
}

impl ExpenseStore for MemoryStore {
    fn insert_expense(&mut self, expense: Expense) -> CoreResult<Expense> {
        self.expenses.push(expense.clone());
        self.publish(
            expense.couple_id,
            Table::Expenses,
            ChangeKind::Inserted,
            expense.id,
        );
        Ok(expense)
    }

    fn update_expense(&mut self, expense: Expense) -> CoreResult<Expense> {
        let slot = self
            .expenses
            .iter_mut()
            .find(|row| row.couple_id == expense.couple_id && row.id == expense.id)
            .ok_or_else(|| CoreError::not_found("expense", expense.id))?;
        *slot = expense.clone();
        self.publish(
            expense.couple_id,
            Table::Expenses,
            ChangeKind::Updated,
            expense.id,
        );
        Ok(expense)
    }

    fn delete_expense(&mut self, couple_id: Uuid, id: Uuid) -> CoreResult<Expense> {
        let index = self
            .expenses
            .iter()
            .position(|row| row.couple_id == couple_id && row.id == id)
            .ok_or_else(|| CoreError::not_found("expense", id))?;
        let removed = self.expenses.remove(index);
        self.publish(couple_id, Table::Expenses, ChangeKind::Deleted, id);
        Ok(removed)
    }

    fn expense(&self, couple_id: Uuid, id: Uuid) -> CoreResult<Expense> {
        self.expenses
            .iter()
            .find(|row| row.couple_id == couple_id && row.id == id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("expense", id))
    }

    fn query_expenses(&self, couple_id: Uuid, filter: &ExpenseQuery) -> CoreResult<Vec<Expense>> {
        Ok(self
            .expenses
            .iter()
            .filter(|row| row.couple_id == couple_id && filter.matches(row))
            .cloned()
            .collect())
    }
}

impl BudgetStore for MemoryStore {
    fn insert_budget(&mut self, budget: Budget) -> CoreResult<Budget> {
        self.budgets.push(budget.clone());
        self.publish(
            budget.couple_id,
            Table::Budgets,
            ChangeKind::Inserted,
            budget.id,
        );
        Ok(budget)
    }

    fn update_budget(&mut self, budget: Budget) -> CoreResult<Budget> {
        let slot = self
            .budgets
            .iter_mut()
            .find(|row| row.couple_id == budget.couple_id && row.id == budget.id)
            .ok_or_else(|| CoreError::not_found("budget", budget.id))?;
        *slot = budget.clone();
        self.publish(
            budget.couple_id,
            Table::Budgets,
            ChangeKind::Updated,
            budget.id,
        );
        Ok(budget)
    }

    fn delete_budget(&mut self, couple_id: Uuid, id: Uuid) -> CoreResult<()> {
        let index = self
            .budgets
            .iter()
            .position(|row| row.couple_id == couple_id && row.id == id)
            .ok_or_else(|| CoreError::not_found("budget", id))?;
        self.budgets.remove(index);
        self.publish(couple_id, Table::Budgets, ChangeKind::Deleted, id);
        Ok(())
    }

    fn budget(&self, couple_id: Uuid, id: Uuid) -> CoreResult<Budget> {
        self.budgets
            .iter()
            .find(|row| row.couple_id == couple_id && row.id == id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("budget", id))
    }

    fn budget_by_category(&self, couple_id: Uuid, category: &str) -> CoreResult<Option<Budget>> {
        Ok(self
            .budgets
            .iter()
            .find(|row| row.couple_id == couple_id && row.category == category)
            .cloned())
    }

    fn list_budgets(&self, couple_id: Uuid) -> CoreResult<Vec<Budget>> {
        Ok(self
            .budgets
            .iter()
            .filter(|row| row.couple_id == couple_id)
            .cloned()
            .collect())
    }
}

impl HistoryStore for MemoryStore {
    fn insert_history(&mut self, record: BudgetHistory) -> CoreResult<BudgetHistory> {
        let duplicate = self.history.iter().any(|row| {
            row.budget_id == record.budget_id && row.period_start == record.period_start
        });
        if duplicate {
            return Err(CoreError::AlreadyArchived);
        }
        self.history.push(record.clone());
        self.publish(
            record.couple_id,
            Table::BudgetHistory,
            ChangeKind::Inserted,
            record.id,
        );
        Ok(record)
    }

    fn list_history(
        &self,
        couple_id: Uuid,
        budget_id: Option<Uuid>,
    ) -> CoreResult<Vec<BudgetHistory>> {
        Ok(self
            .history
            .iter()
            .filter(|row| {
                row.couple_id == couple_id
                    && budget_id.map(|id| row.budget_id == id).unwrap_or(true)
            })
            .cloned()
            .collect())
    }
}

impl BillStore for MemoryStore {
    fn insert_bill(&mut self, bill: Bill) -> CoreResult<Bill> {
        self.bills.push(bill.clone());
        self.publish(bill.couple_id, Table::Bills, ChangeKind::Inserted, bill.id);
        Ok(bill)
    }

    fn update_bill(&mut self, bill: Bill) -> CoreResult<Bill> {
        let slot = self
            .bills
            .iter_mut()
            .find(|row| row.couple_id == bill.couple_id && row.id == bill.id)
            .ok_or_else(|| CoreError::not_found("bill", bill.id))?;
        *slot = bill.clone();
        self.publish(bill.couple_id, Table::Bills, ChangeKind::Updated, bill.id);
        Ok(bill)
    }

    fn delete_bill(&mut self, couple_id: Uuid, id: Uuid) -> CoreResult<Bill> {
        let index = self
            .bills
            .iter()
            .position(|row| row.couple_id == couple_id && row.id == id)
            .ok_or_else(|| CoreError::not_found("bill", id))?;
        let removed = self.bills.remove(index);
        self.publish(couple_id, Table::Bills, ChangeKind::Deleted, id);
        Ok(removed)
    }

    fn bill(&self, couple_id: Uuid, id: Uuid) -> CoreResult<Bill> {
        self.bills
            .iter()
            .find(|row| row.couple_id == couple_id && row.id == id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("bill", id))
    }

    fn list_bills(&self, couple_id: Uuid) -> CoreResult<Vec<Bill>> {
        Ok(self
            .bills
            .iter()
            .filter(|row| row.couple_id == couple_id)
            .cloned()
            .collect())
    }
}

impl PaymentStore for MemoryStore {
    fn insert_payment(&mut self, payment: BillPayment) -> CoreResult<BillPayment> {
        self.payments.push(payment.clone());
        self.publish(
            payment.couple_id,
            Table::BillPayments,
            ChangeKind::Inserted,
            payment.id,
        );
        Ok(payment)
    }

    fn delete_payment(&mut self, couple_id: Uuid, id: Uuid) -> CoreResult<BillPayment> {
        let index = self
            .payments
            .iter()
            .position(|row| row.couple_id == couple_id && row.id == id)
            .ok_or_else(|| CoreError::not_found("payment", id))?;
        let removed = self.payments.remove(index);
        self.publish(couple_id, Table::BillPayments, ChangeKind::Deleted, id);
        Ok(removed)
    }

    fn list_payments(
        &self,
        couple_id: Uuid,
        bill_id: Option<Uuid>,
    ) -> CoreResult<Vec<BillPayment>> {
        Ok(self
            .payments
            .iter()
            .filter(|row| {
                row.couple_id == couple_id && bill_id.map(|id| row.bill_id == id).unwrap_or(true)
            })
            .cloned()
            .collect())
    }
}

impl ReceiptStore for MemoryStore {
    fn upload(&mut self, file_name: &str, bytes: &[u8]) -> CoreResult<String> {
        let url = format!("mem://receipts/{}/{file_name}", Uuid::new_v4());
        self.receipts.insert(url.clone(), bytes.to_vec());
        Ok(url)
    }

    fn delete(&mut self, url: &str) -> CoreResult<()> {
        self.receipts
            .remove(url)
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found("receipt", url))
    }
}

impl ChangeFeed for MemoryStore {
    fn subscribe(&mut self, couple_id: Uuid, table: Table) -> Receiver<ChangeEvent> {
        let (sender, receiver) = channel();
        self.subscribers.push(Subscriber {
            couple_id,
            table,
            sender,
        });
        receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Budget, BudgetStatus, Expense, Split};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn expense(couple_id: Uuid) -> Expense {
        Expense::new(couple_id, Uuid::new_v4(), dec!(12.50), "coffee", Split::even())
    }

    #[test]
    fn expense_roundtrip_and_not_found() {
        let mut store = MemoryStore::new();
        let couple_id = Uuid::new_v4();
        let inserted = store.insert_expense(expense(couple_id)).unwrap();
        assert_eq!(store.expense(couple_id, inserted.id).unwrap().id, inserted.id);

        let removed = store.delete_expense(couple_id, inserted.id).unwrap();
        assert_eq!(removed.id, inserted.id);
        assert!(matches!(
            store.expense(couple_id, inserted.id),
            Err(CoreError::NotFound { kind: "expense", .. })
        ));
    }

    #[test]
    fn queries_are_scoped_per_couple() {
        let mut store = MemoryStore::new();
        let ours = Uuid::new_v4();
        let theirs = Uuid::new_v4();
        store.insert_expense(expense(ours)).unwrap();
        store.insert_expense(expense(theirs)).unwrap();

        let rows = store.query_expenses(ours, &ExpenseQuery::default()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].couple_id, ours);
    }

    #[test]
    fn history_rejects_duplicate_period() {
        let mut store = MemoryStore::new();
        let couple_id = Uuid::new_v4();
        let budget_id = Uuid::new_v4();
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let record = BudgetHistory {
            id: Uuid::new_v4(),
            budget_id,
            couple_id,
            category: "groceries".into(),
            period_start: start,
            period_end: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            limit: dec!(400),
            total_spent: dec!(100),
            entry_count: 2,
            final_status: BudgetStatus::OnTrack,
            archived_at: Utc::now(),
        };
        store.insert_history(record.clone()).unwrap();

        let mut duplicate = record;
        duplicate.id = Uuid::new_v4();
        assert!(matches!(
            store.insert_history(duplicate),
            Err(CoreError::AlreadyArchived)
        ));
        assert_eq!(store.list_history(couple_id, None).unwrap().len(), 1);
    }

    #[test]
    fn change_feed_delivers_scoped_events() {
        let mut store = MemoryStore::new();
        let couple_id = Uuid::new_v4();
        let feed = store.subscribe(couple_id, Table::Expenses);

        store.insert_expense(expense(Uuid::new_v4())).unwrap();
        let ours = store.insert_expense(expense(couple_id)).unwrap();

        let event = feed.try_recv().unwrap();
        assert_eq!(event.row_id, ours.id);
        assert_eq!(event.kind, ChangeKind::Inserted);
        assert!(feed.try_recv().is_err());
    }

    #[test]
    fn snapshot_roundtrip_preserves_rows() {
        let mut store = MemoryStore::new();
        let couple_id = Uuid::new_v4();
        store.insert_expense(expense(couple_id)).unwrap();
        store
            .insert_budget(Budget::new(
                couple_id,
                "coffee",
                dec!(80),
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            ))
            .unwrap();

        let restored = MemoryStore::from_dataset(store.snapshot());
        assert_eq!(
            restored
                .query_expenses(couple_id, &ExpenseQuery::default())
                .unwrap()
                .len(),
            1
        );
        assert_eq!(restored.list_budgets(couple_id).unwrap().len(), 1);
    }

    #[test]
    fn receipt_upload_and_delete() {
        let mut store = MemoryStore::new();
        let url = store.upload("receipt.jpg", b"bytes").unwrap();
        store.delete(&url).unwrap();
        assert!(matches!(
            ReceiptStore::delete(&mut store, &url),
            Err(CoreError::NotFound { kind: "receipt", .. })
        ));
    }
}
