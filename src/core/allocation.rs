//! Bulk payment allocation - spreading one payment across outstanding bills.
//!
//! Allocation is greedy and oldest-first: bills are settled in `(year, month)`
//! order until the payment runs out, and whatever is left once every bill is
//! covered is the surplus. The arithmetic runs in integer minor units so that
//! the applied amounts and the surplus always add back up to the payment.
//!
//! [`plan_allocation`] and [`preview_payment`] never write. [`commit_payment`]
//! writes one update per affected bill, in order, followed by at most one
//! surplus-carry write. The commit is not transactional: a failing write
//! stops the commit, earlier writes stay, and the error reports how many went
//! through.

use crate::{
    core::{
        bill::{self, PaymentUpdate},
        billing::BillDraft,
        calendar::Period,
        money::{self, PaymentStatus, from_minor, to_minor},
    },
    entities::bill as bill_entity,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument, warn};

/// What to do with money left over after every outstanding bill is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurplusDisposition {
    /// Credit it to the bill after the tenant's latest bill, creating that bill if needed
    DeductFromNext,
    /// Hand it back; only reported
    ReturnToPayer,
}

impl fmt::Display for SurplusDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DeductFromNext => "deduct-from-next",
            Self::ReturnToPayer => "return-to-payer",
        })
    }
}

impl FromStr for SurplusDisposition {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "deduct-from-next" | "deduct" => Ok(Self::DeductFromNext),
            "return-to-payer" | "return" => Ok(Self::ReturnToPayer),
            other => Err(Error::invalid(format!(
                "Unknown surplus disposition '{other}'"
            ))),
        }
    }
}

/// How one outstanding bill is affected by a payment.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationResult {
    /// Affected bill
    pub bill_id: i64,
    /// Period of the affected bill
    pub period: Period,
    /// Amount owed before the payment
    pub previous_remaining: f64,
    /// Part of the payment credited to this bill
    pub payment_applied: f64,
    /// Amount owed after the payment
    pub new_remaining: f64,
    /// Paid amount after the payment
    pub new_paid: f64,
    /// Status after the payment
    pub new_status: PaymentStatus,
}

/// Outcome of allocating one payment, before anything is written.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationPlan {
    /// The payment, rounded to two decimals
    pub payment: f64,
    /// Affected bills, oldest first
    pub results: Vec<AllocationResult>,
    /// Money left after every outstanding bill is covered
    pub surplus: f64,
}

impl AllocationPlan {
    /// Sum of the amounts credited to bills.
    #[must_use]
    pub fn applied_total(&self) -> f64 {
        from_minor(
            self.results
                .iter()
                .map(|r| to_minor(r.payment_applied))
                .sum(),
        )
    }

    /// True when the payment left money over.
    #[must_use]
    pub fn has_surplus(&self) -> bool {
        to_minor(self.surplus) > 0
    }
}

/// What a commit did with the surplus.
#[derive(Debug, Clone, PartialEq)]
pub enum SurplusCarry {
    /// The payment was fully absorbed by outstanding bills
    None,
    /// Reported back to the payer; nothing written
    Returned {
        /// Surplus amount
        amount: f64,
    },
    /// Credited to an existing bill
    AppliedToExisting {
        /// The bill after the credit
        bill: bill_entity::Model,
        /// Surplus amount
        amount: f64,
    },
    /// A new bill was created for the next period and credited
    CreatedNext {
        /// The new bill
        bill: bill_entity::Model,
        /// Surplus amount
        amount: f64,
    },
}

/// Result of a committed bulk payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    /// The allocation that was written
    pub plan: AllocationPlan,
    /// Chosen surplus handling
    pub disposition: SurplusDisposition,
    /// What happened to the surplus
    pub carry: SurplusCarry,
}

/// Allocates `payment` across the unpaid bills in `bills`, oldest first.
///
/// `bills` may be a tenant's full history; fully paid bills are skipped.
/// This never writes and gives the same plan for the same inputs.
pub fn plan_allocation(bills: &[bill_entity::Model], payment: f64) -> Result<AllocationPlan> {
    money::ensure_finite("Payment amount", payment)?;
    let mut pool = to_minor(payment);
    if pool <= 0 {
        return Err(Error::invalid("Payment amount must be greater than zero"));
    }
    let payment_minor = pool;

    let mut outstanding = Vec::new();
    for b in bills {
        if b.status()? != PaymentStatus::Paid {
            outstanding.push((b.period()?, b));
        }
    }
    outstanding.sort_by_key(|(period, b)| (*period, b.id));

    let mut results = Vec::new();
    for (period, b) in outstanding {
        if pool <= 0 {
            break;
        }

        let remaining = to_minor(b.remaining_amount).max(0);
        let applied = pool.min(remaining);
        let new_remaining = remaining - applied;
        pool -= applied;

        results.push(AllocationResult {
            bill_id: b.id,
            period,
            previous_remaining: from_minor(remaining),
            payment_applied: from_minor(applied),
            new_remaining: from_minor(new_remaining),
            new_paid: from_minor(to_minor(b.paid_amount) + applied),
            new_status: if new_remaining <= 0 {
                PaymentStatus::Paid
            } else {
                PaymentStatus::PartiallyPaid
            },
        });
    }

    debug!(
        payment = from_minor(payment_minor),
        bills = results.len(),
        surplus = from_minor(pool),
        "Planned bulk payment"
    );

    Ok(AllocationPlan {
        payment: from_minor(payment_minor),
        results,
        surplus: from_minor(pool),
    })
}

/// Plans a payment against a tenant's current outstanding bills without writing.
pub async fn preview_payment(
    db: &DatabaseConnection,
    tenant_id: i64,
    payment: f64,
) -> Result<AllocationPlan> {
    let outstanding = bill::list_outstanding_bills(db, tenant_id).await?;
    plan_allocation(&outstanding, payment)
}

/// Applies a payment to a tenant's outstanding bills and handles the surplus.
///
/// The plan is rebuilt from the current database state, so a stale preview is
/// never written. Each bill update is a single statement; if one fails the
/// commit stops with [`Error::PersistenceFailure`] and earlier updates are kept.
#[instrument(skip(db))]
pub async fn commit_payment(
    db: &DatabaseConnection,
    tenant_id: i64,
    payment: f64,
    disposition: SurplusDisposition,
) -> Result<PaymentReceipt> {
    let outstanding = bill::list_outstanding_bills(db, tenant_id).await?;
    let plan = plan_allocation(&outstanding, payment)?;

    let mut committed = 0;
    for result in &plan.results {
        let is_surplus_adjusted = outstanding
            .iter()
            .find(|b| b.id == result.bill_id)
            .is_some_and(|b| b.is_surplus_adjusted);

        bill::update_bill_payment(
            db,
            result.bill_id,
            PaymentUpdate {
                paid_amount: result.new_paid,
                remaining_amount: result.new_remaining,
                payment_status: result.new_status,
                is_surplus_adjusted,
            },
        )
        .await
        .map_err(|e| persistence_failure(result.period, committed, e))?;
        committed += 1;
    }

    let carry = if !plan.has_surplus() {
        SurplusCarry::None
    } else {
        match disposition {
            SurplusDisposition::ReturnToPayer => SurplusCarry::Returned {
                amount: plan.surplus,
            },
            SurplusDisposition::DeductFromNext => {
                carry_to_next(db, tenant_id, plan.surplus, committed).await?
            }
        }
    };

    info!(
        tenant_id,
        payment = plan.payment,
        bills_updated = committed,
        surplus = plan.surplus,
        %disposition,
        "Committed bulk payment"
    );

    Ok(PaymentReceipt {
        plan,
        disposition,
        carry,
    })
}

async fn carry_to_next(
    db: &DatabaseConnection,
    tenant_id: i64,
    surplus: f64,
    committed: usize,
) -> Result<SurplusCarry> {
    let history = bill::get_bill_history(db, tenant_id).await?;
    let Some(latest) = history.first() else {
        warn!(tenant_id, "No bills to carry the surplus forward from; returning it");
        return Ok(SurplusCarry::Returned { amount: surplus });
    };

    let target = latest.period()?.next();
    apply_surplus_after(db, tenant_id, latest, surplus)
        .await
        .map_err(|e| persistence_failure(target, committed, e))
}

/// Credits `surplus` to the bill in the period after `anchor`.
///
/// An existing bill gets the amount added to its paid total and taken off its
/// remaining amount (never below zero). Otherwise a bill is created for that
/// period carrying forward the anchor's rent, water, waste and electricity
/// rate, with no electricity usage and no internet. Either way the bill is
/// flagged as surplus-adjusted.
pub async fn apply_surplus_after(
    db: &DatabaseConnection,
    tenant_id: i64,
    anchor: &bill_entity::Model,
    surplus: f64,
) -> Result<SurplusCarry> {
    let surplus_minor = to_minor(surplus);
    if surplus_minor <= 0 {
        return Ok(SurplusCarry::None);
    }
    let amount = from_minor(surplus_minor);
    let target = anchor.period()?.next();

    if let Some(next) = bill::find_tenant_period_bill(db, tenant_id, target).await? {
        let remaining = (to_minor(next.remaining_amount) - surplus_minor).max(0);
        let updated = bill::update_bill_payment(
            db,
            next.id,
            PaymentUpdate {
                paid_amount: from_minor(to_minor(next.paid_amount) + surplus_minor),
                remaining_amount: from_minor(remaining),
                payment_status: status_after_credit(remaining),
                is_surplus_adjusted: true,
            },
        )
        .await?;
        info!(bill_id = updated.id, period = %target, amount, "Applied surplus to existing bill");
        return Ok(SurplusCarry::AppliedToExisting {
            bill: updated,
            amount,
        });
    }

    let base = to_minor(anchor.rent) + to_minor(anchor.water) + to_minor(anchor.waste);
    let remaining = (base - surplus_minor).max(0);
    let draft = BillDraft {
        period: target,
        rent: anchor.rent,
        prev_unit: anchor.curr_unit,
        curr_unit: anchor.curr_unit,
        electricity_rate: anchor.electricity_rate,
        water: anchor.water,
        waste: anchor.waste,
        internet: false,
        internet_amount: 0.0,
        total: from_minor(base),
        paid_amount: amount,
        remaining_amount: from_minor(remaining),
        payment_status: status_after_credit(remaining),
    };
    let created = bill::create_bill(db, tenant_id, &draft, true).await?;
    info!(bill_id = created.id, period = %target, amount, "Created next bill from surplus");

    Ok(SurplusCarry::CreatedNext {
        bill: created,
        amount,
    })
}

const fn status_after_credit(remaining_minor: i64) -> PaymentStatus {
    if remaining_minor <= 0 {
        PaymentStatus::Paid
    } else {
        PaymentStatus::PartiallyPaid
    }
}

fn persistence_failure(period: Period, committed: usize, err: Error) -> Error {
    match err {
        Error::Database(source) => Error::PersistenceFailure {
            month: period.month.name().to_string(),
            year: period.year,
            committed,
            source,
        },
        other => other,
    }
}
