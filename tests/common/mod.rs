use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use couple_bucks_core::domain::{Couple, Expense, PermissionTier, Profile, Split};
use couple_bucks_core::store::{ExpenseStore, MemoryStore};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn couple() -> Couple {
    Couple::new(
        Profile::new("Ana", PermissionTier::Owner),
        Profile::new("Ben", PermissionTier::Member),
    )
}

/// Inserts a raw ledger entry dated `on`, bypassing the service layer.
pub fn posted(
    store: &mut MemoryStore,
    couple_id: Uuid,
    author_id: Uuid,
    category: &str,
    amount: Decimal,
    on: NaiveDate,
) -> Expense {
    let created = Utc.from_utc_datetime(&on.and_hms_opt(12, 0, 0).unwrap());
    let expense =
        Expense::new(couple_id, author_id, amount, category, Split::even()).with_created_at(created);
    store.insert_expense(expense).unwrap()
}
