//! Service layer: validated operations over the store traits. Each service is
//! a stateless namespace; "today" is always an explicit argument so the rules
//! never read the wall clock.

pub mod bill_service;
pub mod budget_service;
pub mod expense_service;
pub mod rollover_service;

pub use bill_service::{BillSchedule, BillService, PaymentInput};
pub use budget_service::{compute_current_spend, BudgetService};
pub use expense_service::ExpenseService;
pub use rollover_service::{RolloverReport, RolloverService};
