//! Recurring bills: schedule reporting and the compound mark-paid operation.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{Bill, BillPayment, BillStatus, Couple};
use crate::errors::{CoreError, CoreResult};
use crate::store::{BillStore, PaymentStore};

/// Caller-supplied details for settling a bill. A missing amount defaults to
/// the bill's own amount.
#[derive(Debug, Clone, Default)]
pub struct PaymentInput {
    pub amount: Option<Decimal>,
    pub method: Option<String>,
    pub notes: Option<String>,
    pub receipt_url: Option<String>,
}

/// A bill joined with its urgency relative to a reference day.
#[derive(Debug, Clone)]
pub struct BillSchedule {
    pub bill: Bill,
    pub status: BillStatus,
    pub days_until_due: i64,
}

pub struct BillService;

impl BillService {
    pub fn create<S: BillStore>(
        store: &mut S,
        couple: &Couple,
        actor: Uuid,
        bill: Bill,
    ) -> CoreResult<Bill> {
        Self::ensure_owner(couple, actor)?;
        bill.validate()?;
        store.insert_bill(bill)
    }

    pub fn update<S: BillStore>(
        store: &mut S,
        couple: &Couple,
        actor: Uuid,
        bill: Bill,
    ) -> CoreResult<Bill> {
        Self::ensure_owner(couple, actor)?;
        bill.validate()?;
        let mut bill = bill;
        bill.touch();
        store.update_bill(bill)
    }

    /// Soft-deactivates the bill; its history stays queryable.
    pub fn deactivate<S: BillStore>(
        store: &mut S,
        couple: &Couple,
        actor: Uuid,
        id: Uuid,
    ) -> CoreResult<Bill> {
        Self::ensure_owner(couple, actor)?;
        let mut bill = store.bill(couple.id, id)?;
        bill.active = false;
        bill.touch();
        store.update_bill(bill)
    }

    pub fn delete<S: BillStore>(
        store: &mut S,
        couple: &Couple,
        actor: Uuid,
        id: Uuid,
    ) -> CoreResult<Bill> {
        Self::ensure_owner(couple, actor)?;
        store.delete_bill(couple.id, id)
    }

    /// Settles one billing cycle: appends a payment record for the period
    /// ending at the next due date, then advances the bill. The two writes act
    /// as one unit; if the due-date update fails the payment record is undone,
    /// and a failed undo surfaces as an inconsistency instead of silent
    /// partial success.
    pub fn mark_paid<S>(
        store: &mut S,
        couple: &Couple,
        actor: Uuid,
        bill_id: Uuid,
        paid_on: NaiveDate,
        input: PaymentInput,
    ) -> CoreResult<(Bill, BillPayment)>
    where
        S: BillStore + PaymentStore,
    {
        if couple.member(actor).is_none() {
            return Err(CoreError::PermissionDenied(
                "actor is not a member of this couple".into(),
            ));
        }
        let mut bill = store.bill(couple.id, bill_id)?;
        let next_due = bill.next_due_date()?;

        let payment = store.insert_payment(BillPayment {
            id: Uuid::new_v4(),
            bill_id: bill.id,
            couple_id: couple.id,
            amount_paid: input.amount.unwrap_or(bill.amount),
            payment_date: paid_on,
            method: input.method,
            notes: input.notes,
            receipt_url: input.receipt_url,
            period_start: paid_on,
            period_end: next_due,
            recorded_by: actor,
            created_at: Utc::now(),
        })?;

        bill.last_paid_date = Some(paid_on);
        bill.due_date = next_due;
        bill.touch();
        match store.update_bill(bill) {
            Ok(bill) => {
                tracing::info!(bill = %bill.id, due = %bill.due_date, "bill paid, due date advanced");
                Ok((bill, payment))
            }
            Err(error) => {
                if let Err(undo_error) = store.delete_payment(couple.id, payment.id) {
                    tracing::error!(
                        payment = %payment.id,
                        %error,
                        %undo_error,
                        "bill update and payment undo both failed"
                    );
                    return Err(CoreError::Inconsistent(format!(
                        "payment {} recorded but the due date update failed ({error}) and the undo failed ({undo_error})",
                        payment.id
                    )));
                }
                Err(error)
            }
        }
    }

    pub fn payments<S: PaymentStore>(
        store: &S,
        couple_id: Uuid,
        bill_id: Option<Uuid>,
    ) -> CoreResult<Vec<BillPayment>> {
        store.list_payments(couple_id, bill_id)
    }

    /// Active bills with their status, most urgent first.
    pub fn schedule<S: BillStore>(
        store: &S,
        couple_id: Uuid,
        today: NaiveDate,
    ) -> CoreResult<Vec<BillSchedule>> {
        let mut rows: Vec<BillSchedule> = store
            .list_bills(couple_id)?
            .into_iter()
            .filter(|bill| bill.active)
            .map(|bill| {
                let (status, days_until_due) = bill.status(today);
                BillSchedule {
                    bill,
                    status,
                    days_until_due,
                }
            })
            .collect();
        rows.sort_by_key(|row| row.days_until_due);
        Ok(rows)
    }

    /// Active bills whose reminder window has opened.
    pub fn due_for_reminder<S: BillStore>(
        store: &S,
        couple_id: Uuid,
        today: NaiveDate,
    ) -> CoreResult<Vec<Bill>> {
        Ok(store
            .list_bills(couple_id)?
            .into_iter()
            .filter(|bill| bill.needs_reminder(today))
            .collect())
    }

    fn ensure_owner(couple: &Couple, actor: Uuid) -> CoreResult<()> {
        if couple.is_owner(actor) {
            Ok(())
        } else {
            Err(CoreError::PermissionDenied(
                "managing bills requires owner permissions".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Frequency, PermissionTier, Profile, Split};
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn couple() -> Couple {
        Couple::new(
            Profile::new("Ana", PermissionTier::Owner),
            Profile::new("Ben", PermissionTier::Member),
        )
    }

    fn rent(couple: &Couple) -> Bill {
        Bill::new(
            couple.id,
            "Rent",
            dec!(1200),
            date(2024, 1, 15),
            Frequency::Monthly,
            Split::even(),
        )
    }

    #[test]
    fn mark_paid_records_period_and_advances_due_date() {
        let mut store = MemoryStore::new();
        let couple = couple();
        let bill =
            BillService::create(&mut store, &couple, couple.partner_a.id, rent(&couple)).unwrap();

        let (bill, payment) = BillService::mark_paid(
            &mut store,
            &couple,
            couple.partner_b.id,
            bill.id,
            date(2024, 1, 10),
            PaymentInput::default(),
        )
        .unwrap();

        assert_eq!(bill.due_date, date(2024, 2, 15));
        assert_eq!(bill.last_paid_date, Some(date(2024, 1, 10)));
        assert_eq!(payment.amount_paid, dec!(1200));
        assert_eq!(payment.period_start, date(2024, 1, 10));
        assert_eq!(payment.period_end, date(2024, 2, 15));
        assert_eq!(payment.recorded_by, couple.partner_b.id);
        assert_eq!(
            BillService::payments(&store, couple.id, Some(bill.id))
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn mark_paid_missing_bill_is_not_found_and_writes_nothing() {
        let mut store = MemoryStore::new();
        let couple = couple();
        let result = BillService::mark_paid(
            &mut store,
            &couple,
            couple.partner_a.id,
            Uuid::new_v4(),
            date(2024, 1, 10),
            PaymentInput::default(),
        );
        assert!(matches!(result, Err(CoreError::NotFound { kind: "bill", .. })));
        assert!(BillService::payments(&store, couple.id, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn create_requires_owner_and_valid_bill() {
        let mut store = MemoryStore::new();
        let couple = couple();
        assert!(matches!(
            BillService::create(&mut store, &couple, couple.partner_b.id, rent(&couple)),
            Err(CoreError::PermissionDenied(_))
        ));

        let custom_without_days = Bill::new(
            couple.id,
            "Gym",
            dec!(30),
            date(2024, 1, 1),
            Frequency::Custom,
            Split::even(),
        );
        assert!(matches!(
            BillService::create(&mut store, &couple, couple.partner_a.id, custom_without_days),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn schedule_sorts_by_urgency_and_skips_inactive() {
        let mut store = MemoryStore::new();
        let couple = couple();
        let owner = couple.partner_a.id;

        let mut water = rent(&couple);
        water.name = "Water".into();
        water.due_date = date(2024, 1, 25);
        let mut power = rent(&couple);
        power.name = "Power".into();
        power.due_date = date(2024, 1, 12);
        let mut old = rent(&couple);
        old.name = "Old gym".into();
        old.active = false;

        BillService::create(&mut store, &couple, owner, water).unwrap();
        BillService::create(&mut store, &couple, owner, power).unwrap();
        BillService::create(&mut store, &couple, owner, old).unwrap();

        let schedule = BillService::schedule(&store, couple.id, date(2024, 1, 10)).unwrap();
        assert_eq!(schedule.len(), 2);
        assert_eq!(schedule[0].bill.name, "Power");
        assert_eq!(schedule[0].status, BillStatus::DueSoon);
        assert_eq!(schedule[1].bill.name, "Water");
        assert_eq!(schedule[1].status, BillStatus::Upcoming);
    }

    #[test]
    fn deactivate_is_soft() {
        let mut store = MemoryStore::new();
        let couple = couple();
        let bill =
            BillService::create(&mut store, &couple, couple.partner_a.id, rent(&couple)).unwrap();
        let bill =
            BillService::deactivate(&mut store, &couple, couple.partner_a.id, bill.id).unwrap();
        assert!(!bill.active);
        assert!(store.bill(couple.id, bill.id).is_ok());
    }

    #[test]
    fn custom_cycle_keeps_day_arithmetic() {
        let mut store = MemoryStore::new();
        let couple = couple();
        let bill = Bill::new(
            couple.id,
            "Water",
            dec!(60),
            date(2024, 1, 1),
            Frequency::Custom,
            Split::even(),
        )
        .with_custom_days(45);
        let bill =
            BillService::create(&mut store, &couple, couple.partner_a.id, bill).unwrap();

        let (bill, _) = BillService::mark_paid(
            &mut store,
            &couple,
            couple.partner_a.id,
            bill.id,
            date(2024, 1, 1),
            PaymentInput::default(),
        )
        .unwrap();
        assert_eq!(bill.due_date, date(2024, 2, 15));
    }
}
