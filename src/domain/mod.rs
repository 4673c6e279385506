//! Domain models and pure rules: budgets, the expense ledger, recurring bills,
//! household identity, and split computation.

pub mod bill;
pub mod budget;
pub mod couple;
pub mod expense;
pub mod period;
pub mod split;

pub use bill::{next_due_date, Bill, BillPayment, BillStatus, Frequency};
pub use budget::{Budget, BudgetHistory, BudgetStatus, PeriodKind};
pub use couple::{Couple, IncomeSource, PayCadence, PermissionTier, Profile};
pub use expense::Expense;
pub use period::Period;
pub use split::{Partner, Split, SplitPolicy};
