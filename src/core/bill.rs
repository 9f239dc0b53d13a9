//! Bill business logic - persisting, finding, and editing bills.
//!
//! This module is the storage side of the billing calculator: it validates a
//! submission, runs [`billing::calculate_bills`], refuses periods the tenant
//! already has bills for, and writes the drafts. It also provides the
//! lookups the bulk-payment allocator reads from.

use crate::{
    core::{
        billing::{self, BillDraft, BillingInput},
        calendar::{Period, YearRange},
        money::{PaymentStatus, round2},
    },
    entities::{Bill, Tenant, bill},
    errors::{Error, Result},
};
use sea_orm::{Set, TransactionTrait, Unchanged, prelude::*};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Whether a submission creates new bills or recomputes an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitMode {
    /// Insert one bill per generated month; every period must be free
    Create,
    /// Recompute the given bill in place from a one-month submission
    Edit {
        /// Bill being edited
        bill_id: i64,
    },
}

/// Partial update of a bill's payment fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentUpdate {
    /// New paid amount
    pub paid_amount: f64,
    /// New remaining amount
    pub remaining_amount: f64,
    /// New status
    pub payment_status: PaymentStatus,
    /// Marks the bill as having received a bulk-payment surplus
    pub is_surplus_adjusted: bool,
}

/// Orders bills oldest first by `(year, month)`.
pub fn sort_chronologically(bills: Vec<bill::Model>) -> Result<Vec<bill::Model>> {
    let mut keyed = bills
        .into_iter()
        .map(|b| -> Result<(Period, bill::Model)> { Ok((b.period()?, b)) })
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by_key(|(period, b)| (*period, b.id));
    Ok(keyed.into_iter().map(|(_, b)| b).collect())
}

/// Retrieves a bill by its ID.
pub async fn get_bill_by_id<C>(db: &C, bill_id: i64) -> Result<Option<bill::Model>>
where
    C: ConnectionTrait,
{
    Bill::find_by_id(bill_id).one(db).await.map_err(Into::into)
}

/// All bills of a tenant, newest period first.
pub async fn get_bill_history<C>(db: &C, tenant_id: i64) -> Result<Vec<bill::Model>>
where
    C: ConnectionTrait,
{
    let bills = Bill::find()
        .filter(bill::Column::TenantId.eq(tenant_id))
        .all(db)
        .await?;

    let mut sorted = sort_chronologically(bills)?;
    sorted.reverse();
    Ok(sorted)
}

/// Bills of a tenant that are not fully paid, oldest period first.
pub async fn list_outstanding_bills<C>(db: &C, tenant_id: i64) -> Result<Vec<bill::Model>>
where
    C: ConnectionTrait,
{
    let bills = Bill::find()
        .filter(bill::Column::TenantId.eq(tenant_id))
        .filter(bill::Column::PaymentStatus.ne(PaymentStatus::Paid.as_str()))
        .all(db)
        .await?;

    sort_chronologically(bills)
}

/// The tenant's bill for one period, if any.
pub async fn find_tenant_period_bill<C>(
    db: &C,
    tenant_id: i64,
    period: Period,
) -> Result<Option<bill::Model>>
where
    C: ConnectionTrait,
{
    Bill::find()
        .filter(bill::Column::TenantId.eq(tenant_id))
        .filter(bill::Column::Month.eq(period.month.name()))
        .filter(bill::Column::Year.eq(period.year))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts a drafted bill for a tenant.
pub async fn create_bill<C>(
    db: &C,
    tenant_id: i64,
    draft: &BillDraft,
    is_surplus_adjusted: bool,
) -> Result<bill::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now().naive_utc();
    let model = bill::ActiveModel {
        tenant_id: Set(tenant_id),
        month: Set(draft.period.month.name().to_string()),
        year: Set(draft.period.year),
        rent: Set(round2(draft.rent)),
        prev_unit: Set(round2(draft.prev_unit)),
        curr_unit: Set(round2(draft.curr_unit)),
        electricity_rate: Set(draft.electricity_rate),
        water: Set(round2(draft.water)),
        waste: Set(round2(draft.waste)),
        internet: Set(draft.internet),
        internet_amount: Set(round2(draft.internet_amount)),
        total: Set(round2(draft.total)),
        payment_status: Set(draft.payment_status.as_str().to_string()),
        paid_amount: Set(round2(draft.paid_amount)),
        remaining_amount: Set(round2(draft.remaining_amount)),
        is_surplus_adjusted: Set(is_surplus_adjusted),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    debug!(bill_id = created.id, period = %draft.period, "Inserted bill");
    Ok(created)
}

/// Writes new payment fields to one bill in a single `UPDATE`.
pub async fn update_bill_payment<C>(
    db: &C,
    bill_id: i64,
    update: PaymentUpdate,
) -> Result<bill::Model>
where
    C: ConnectionTrait,
{
    let model = bill::ActiveModel {
        id: Unchanged(bill_id),
        paid_amount: Set(round2(update.paid_amount)),
        remaining_amount: Set(round2(update.remaining_amount)),
        payment_status: Set(update.payment_status.as_str().to_string()),
        is_surplus_adjusted: Set(update.is_surplus_adjusted),
        updated_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };

    model.update(db).await.map_err(Into::into)
}

/// Deletes a single bill.
#[instrument(skip(db))]
pub async fn delete_bill(db: &DatabaseConnection, bill_id: i64) -> Result<()> {
    let result = Bill::delete_by_id(bill_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::BillNotFound { id: bill_id });
    }
    info!(bill_id, "Deleted bill");
    Ok(())
}

/// Validates, calculates, and stores a billing submission for a tenant.
///
/// In [`SubmitMode::Create`] every generated period is checked against the
/// tenant's existing bills before anything is written; the first collision is
/// returned as [`Error::DuplicateEntry`]. The drafts are then inserted in one
/// transaction.
///
/// In [`SubmitMode::Edit`] the submission must cover exactly one month. The
/// edited bill is recomputed in place; moving it onto a period held by a
/// different bill is still a duplicate.
#[instrument(skip(db, input, years), fields(start = %input.start, months = input.months))]
pub async fn submit_bills(
    db: &DatabaseConnection,
    tenant_id: i64,
    input: &BillingInput,
    mode: SubmitMode,
    years: &YearRange,
) -> Result<Vec<bill::Model>> {
    let drafts = billing::calculate_bills(input)?;
    years.check(input.start.year)?;

    if Tenant::find_by_id(tenant_id).one(db).await?.is_none() {
        return Err(Error::TenantNotFound {
            name: tenant_id.to_string(),
        });
    }

    match mode {
        SubmitMode::Create => create_drafts(db, tenant_id, &drafts).await,
        SubmitMode::Edit { bill_id } => {
            let [draft] = drafts.as_slice() else {
                return Err(Error::invalid("Editing covers exactly one month"));
            };
            let updated = edit_bill(db, tenant_id, bill_id, draft).await?;
            Ok(vec![updated])
        }
    }
}

async fn create_drafts(
    db: &DatabaseConnection,
    tenant_id: i64,
    drafts: &[BillDraft],
) -> Result<Vec<bill::Model>> {
    let taken: HashSet<Period> = get_bill_history(db, tenant_id)
        .await?
        .iter()
        .map(bill::Model::period)
        .collect::<Result<_>>()?;

    if let Some(clash) = drafts.iter().find(|d| taken.contains(&d.period)) {
        return Err(Error::DuplicateEntry {
            month: clash.period.month.name().to_string(),
            year: clash.period.year,
        });
    }

    let txn = db.begin().await?;
    let mut created = Vec::with_capacity(drafts.len());
    for draft in drafts {
        created.push(create_bill(&txn, tenant_id, draft, false).await?);
    }
    txn.commit().await?;

    info!(tenant_id, count = created.len(), "Saved bill submission");
    Ok(created)
}

async fn edit_bill(
    db: &DatabaseConnection,
    tenant_id: i64,
    bill_id: i64,
    draft: &BillDraft,
) -> Result<bill::Model> {
    let existing = get_bill_by_id(db, bill_id)
        .await?
        .filter(|b| b.tenant_id == tenant_id)
        .ok_or(Error::BillNotFound { id: bill_id })?;

    let clash = find_tenant_period_bill(db, tenant_id, draft.period).await?;
    if clash.is_some_and(|other| other.id != existing.id) {
        return Err(Error::DuplicateEntry {
            month: draft.period.month.name().to_string(),
            year: draft.period.year,
        });
    }

    let is_surplus_adjusted = existing.is_surplus_adjusted;
    let mut model: bill::ActiveModel = existing.into();
    model.month = Set(draft.period.month.name().to_string());
    model.year = Set(draft.period.year);
    model.rent = Set(round2(draft.rent));
    model.prev_unit = Set(round2(draft.prev_unit));
    model.curr_unit = Set(round2(draft.curr_unit));
    model.electricity_rate = Set(draft.electricity_rate);
    model.water = Set(round2(draft.water));
    model.waste = Set(round2(draft.waste));
    model.internet = Set(draft.internet);
    model.internet_amount = Set(round2(draft.internet_amount));
    model.total = Set(round2(draft.total));
    model.payment_status = Set(draft.payment_status.as_str().to_string());
    model.paid_amount = Set(round2(draft.paid_amount));
    model.remaining_amount = Set(round2(draft.remaining_amount));
    model.is_surplus_adjusted = Set(is_surplus_adjusted);
    model.updated_at = Set(chrono::Utc::now().naive_utc());

    let updated = model.update(db).await?;
    info!(bill_id, period = %draft.period, "Recomputed bill");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::{
        billing::PaymentInput,
        calendar::Month,
    };
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_submit_creates_one_bill_per_month() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;

        let input = test_billing_input(Month::Baisakh, 2081, 3);
        let created =
            submit_bills(&db, tenant.id, &input, SubmitMode::Create, &YearRange::default())
                .await?;

        assert_eq!(created.len(), 3);
        assert_eq!(created[0].month, "Baisakh");
        assert_eq!(created[2].month, "Ashadh");
        assert_eq!(created[2].curr_unit, 130.0);
        assert!(created.iter().all(|b| b.payment_status == "unpaid"));
        assert!(created.iter().all(|b| !b.is_surplus_adjusted));

        assert_eq!(get_bill_history(&db, tenant.id).await?.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_period_rejected_without_writes() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        create_test_bills(&db, tenant.id, Month::Jestha, 2081, 1).await?;

        // Baisakh..Ashadh overlaps the existing Jestha bill
        let input = test_billing_input(Month::Baisakh, 2081, 3);
        let result =
            submit_bills(&db, tenant.id, &input, SubmitMode::Create, &YearRange::default()).await;

        match result {
            Err(Error::DuplicateEntry { month, year }) => {
                assert_eq!(month, "Jestha");
                assert_eq!(year, 2081);
            }
            other => panic!("expected DuplicateEntry, got {other:?}"),
        }

        // Nothing from the rejected submission was stored
        assert_eq!(get_bill_history(&db, tenant.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_same_period_for_other_tenant_is_allowed() -> Result<()> {
        let db = setup_test_db().await?;
        let ram = create_test_tenant(&db, "Ram").await?;
        let sita = create_test_tenant(&db, "Sita").await?;
        create_test_bills(&db, ram.id, Month::Baisakh, 2081, 1).await?;

        let created = create_test_bills(&db, sita.id, Month::Baisakh, 2081, 1).await?;
        assert_eq!(created.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_year_outside_range_rejected() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        let input = test_billing_input(Month::Baisakh, 2095, 1);
        let result =
            submit_bills(&db, tenant.id, &input, SubmitMode::Create, &YearRange::default()).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_for_missing_tenant() -> Result<()> {
        let db = setup_test_db().await?;
        let input = test_billing_input(Month::Baisakh, 2081, 1);
        let result = submit_bills(&db, 42, &input, SubmitMode::Create, &YearRange::default()).await;
        assert!(matches!(result, Err(Error::TenantNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_recomputes_in_place() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        let original = create_test_bills(&db, tenant.id, Month::Magh, 2081, 1).await?;
        let bill_id = original[0].id;

        let mut input = test_billing_input(Month::Magh, 2081, 1);
        input.rent = 6000.0;
        input.payment = PaymentInput::Paid;
        let edited = submit_bills(
            &db,
            tenant.id,
            &input,
            SubmitMode::Edit { bill_id },
            &YearRange::default(),
        )
        .await?;

        assert_eq!(edited.len(), 1);
        assert_eq!(edited[0].id, bill_id);
        assert_eq!(edited[0].rent, 6000.0);
        assert_eq!(edited[0].total, 6600.0);
        assert_eq!(edited[0].payment_status, "paid");
        assert_eq!(edited[0].remaining_amount, 0.0);
        assert_eq!(get_bill_history(&db, tenant.id).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_onto_another_bills_period_rejected() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        let bills = create_test_bills(&db, tenant.id, Month::Magh, 2081, 2).await?;

        // Move the Magh bill onto Falgun, which is already taken
        let input = test_billing_input(Month::Falgun, 2081, 1);
        let result = submit_bills(
            &db,
            tenant.id,
            &input,
            SubmitMode::Edit {
                bill_id: bills[0].id,
            },
            &YearRange::default(),
        )
        .await;
        assert!(matches!(result, Err(Error::DuplicateEntry { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_requires_single_month() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        let bills = create_test_bills(&db, tenant.id, Month::Magh, 2081, 1).await?;

        let input = test_billing_input(Month::Magh, 2081, 2);
        let result = submit_bills(
            &db,
            tenant.id,
            &input,
            SubmitMode::Edit {
                bill_id: bills[0].id,
            },
            &YearRange::default(),
        )
        .await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_missing_bill() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        let input = test_billing_input(Month::Magh, 2081, 1);
        let result = submit_bills(
            &db,
            tenant.id,
            &input,
            SubmitMode::Edit { bill_id: 77 },
            &YearRange::default(),
        )
        .await;
        assert!(matches!(result, Err(Error::BillNotFound { id: 77 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_history_and_outstanding_ordering() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        // Chaitra 2080 .. Jestha 2081 spans a year boundary
        create_test_bills(&db, tenant.id, Month::Chaitra, 2080, 3).await?;

        let history: Vec<String> = get_bill_history(&db, tenant.id)
            .await?
            .into_iter()
            .map(|b| format!("{} {}", b.month, b.year))
            .collect();
        assert_eq!(history, vec!["Jestha 2081", "Baisakh 2081", "Chaitra 2080"]);

        let outstanding: Vec<String> = list_outstanding_bills(&db, tenant.id)
            .await?
            .into_iter()
            .map(|b| format!("{} {}", b.month, b.year))
            .collect();
        assert_eq!(
            outstanding,
            vec!["Chaitra 2080", "Baisakh 2081", "Jestha 2081"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_outstanding_excludes_paid_bills() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        let bills = create_test_bills(&db, tenant.id, Month::Baisakh, 2081, 2).await?;

        update_bill_payment(
            &db,
            bills[0].id,
            PaymentUpdate {
                paid_amount: bills[0].total,
                remaining_amount: 0.0,
                payment_status: PaymentStatus::Paid,
                is_surplus_adjusted: false,
            },
        )
        .await?;

        let outstanding = list_outstanding_bills(&db, tenant.id).await?;
        assert_eq!(outstanding.len(), 1);
        assert_eq!(outstanding[0].id, bills[1].id);
        Ok(())
    }

    #[tokio::test]
    async fn test_find_tenant_period_bill() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        create_test_bills(&db, tenant.id, Month::Poush, 2081, 1).await?;

        let found =
            find_tenant_period_bill(&db, tenant.id, Period::new(Month::Poush, 2081)).await?;
        assert!(found.is_some());
        let missing =
            find_tenant_period_bill(&db, tenant.id, Period::new(Month::Magh, 2081)).await?;
        assert!(missing.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_update_bill_payment_only_touches_payment_fields() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        let bills = create_test_bills(&db, tenant.id, Month::Baisakh, 2081, 1).await?;
        let before = &bills[0];

        let after = update_bill_payment(
            &db,
            before.id,
            PaymentUpdate {
                paid_amount: 100.004,
                remaining_amount: before.total - 100.0,
                payment_status: PaymentStatus::PartiallyPaid,
                is_surplus_adjusted: true,
            },
        )
        .await?;

        assert_eq!(after.paid_amount, 100.0);
        assert_eq!(after.payment_status, "partially_paid");
        assert!(after.is_surplus_adjusted);
        assert_eq!(after.total, before.total);
        assert_eq!(after.rent, before.rent);
        assert_eq!(after.month, before.month);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_bill() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        let bills = create_test_bills(&db, tenant.id, Month::Baisakh, 2081, 1).await?;

        delete_bill(&db, bills[0].id).await?;
        assert!(get_bill_by_id(&db, bills[0].id).await?.is_none());
        assert!(matches!(
            delete_bill(&db, bills[0].id).await,
            Err(Error::BillNotFound { .. })
        ));
        Ok(())
    }
}
