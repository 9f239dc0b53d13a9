//! Billing calculator - turns one submission into per-month bill drafts.
//!
//! A submission covers one to twelve consecutive months. Fixed charges (rent,
//! water, waste) repeat every month, the metered electricity delta is spread
//! across the months, and internet is charged only for the calendar months the
//! caller selected. Everything here is pure; persistence lives in
//! [`crate::core::bill`].

use crate::{
    core::{
        calendar::{Month, Period},
        money::{self, PaymentStatus, round2},
    },
    errors::{Error, Result},
};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Largest number of months a single submission may span.
pub const MAX_MONTHS: usize = 12;

/// Allowed drift, in meter units, between the per-month usages and the total reading delta.
pub const USAGE_TOLERANCE: f64 = 0.1;

/// Internet billing for a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct InternetPlan {
    /// Flat charge for each billed month
    pub monthly_rate: f64,
    /// Calendar months that carry the internet charge
    pub months: BTreeSet<Month>,
}

/// What the tenant has paid towards the submitted months.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaymentInput {
    /// Every generated month is settled
    Paid,
    /// Nothing paid yet
    Unpaid,
    /// `amount` paid, credited to the first generated month only
    PartiallyPaid {
        /// Amount received
        amount: f64,
    },
}

impl PaymentInput {
    /// Builds the input from a status plus the optional partial amount.
    pub fn from_status(status: PaymentStatus, paid_amount: Option<f64>) -> Result<Self> {
        match status {
            PaymentStatus::Paid => Ok(Self::Paid),
            PaymentStatus::Unpaid => Ok(Self::Unpaid),
            PaymentStatus::PartiallyPaid => {
                let amount = paid_amount.ok_or_else(|| {
                    Error::invalid("A paid amount is required for partially paid bills")
                })?;
                Ok(Self::PartiallyPaid { amount })
            }
        }
    }
}

/// One submission spanning `months` consecutive months starting at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingInput {
    /// First billed period
    pub start: Period,
    /// Number of consecutive months, 1 to [`MAX_MONTHS`]
    pub months: usize,
    /// Monthly rent
    pub rent: f64,
    /// Monthly water fee
    pub water: f64,
    /// Monthly waste fee
    pub waste: f64,
    /// Price per electricity unit
    pub electricity_rate: f64,
    /// Meter reading at the start of the span
    pub previous_reading: f64,
    /// Meter reading at the end of the span
    pub current_reading: f64,
    /// Optional internet charges
    pub internet: Option<InternetPlan>,
    /// Payment received for the span
    pub payment: PaymentInput,
}

/// A computed, not yet persisted, month of billing.
#[derive(Debug, Clone, PartialEq)]
pub struct BillDraft {
    /// Billed period
    pub period: Period,
    /// Rent for the month
    pub rent: f64,
    /// Meter reading at month start
    pub prev_unit: f64,
    /// Meter reading at month end
    pub curr_unit: f64,
    /// Price per electricity unit
    pub electricity_rate: f64,
    /// Water fee
    pub water: f64,
    /// Waste fee
    pub waste: f64,
    /// Whether internet is billed this month
    pub internet: bool,
    /// Internet charge, zero when not billed
    pub internet_amount: f64,
    /// Sum of all charges
    pub total: f64,
    /// Amount paid
    pub paid_amount: f64,
    /// Amount still owed
    pub remaining_amount: f64,
    /// Status derived from paid vs total
    pub payment_status: PaymentStatus,
}

impl BillDraft {
    /// Metered units for the month, never negative.
    #[must_use]
    pub fn usage(&self) -> f64 {
        (self.curr_unit - self.prev_unit).max(0.0)
    }

    /// Electricity charge for the month.
    #[must_use]
    pub fn electricity_charge(&self) -> f64 {
        round2(self.usage() * self.electricity_rate)
    }
}

/// True when the current reading is below the previous one.
///
/// That usually means the meter was reset or replaced; callers should ask for
/// confirmation before submitting, but the calculator accepts it.
#[must_use]
pub fn needs_reading_confirmation(input: &BillingInput) -> bool {
    input.current_reading < input.previous_reading
}

/// Checks every field of a submission before any computation.
pub fn validate(input: &BillingInput) -> Result<()> {
    if input.months == 0 || input.months > MAX_MONTHS {
        return Err(Error::invalid(format!(
            "Number of months must be between 1 and {MAX_MONTHS}, got {}",
            input.months
        )));
    }
    if input.start.year <= 0 {
        return Err(Error::invalid(format!(
            "Year must be positive, got {}",
            input.start.year
        )));
    }

    money::ensure_non_negative("Rent", input.rent)?;
    money::ensure_non_negative("Water", input.water)?;
    money::ensure_non_negative("Waste", input.waste)?;
    money::ensure_non_negative("Electricity rate", input.electricity_rate)?;
    money::ensure_finite("Previous reading", input.previous_reading)?;
    money::ensure_finite("Current reading", input.current_reading)?;

    if let Some(plan) = &input.internet {
        money::ensure_finite("Internet rate", plan.monthly_rate)?;
        if plan.monthly_rate <= 0.0 {
            return Err(Error::invalid("Internet rate must be greater than zero"));
        }
        if plan.months.is_empty() {
            return Err(Error::invalid(
                "Select at least one month for internet service",
            ));
        }
    }

    if let PaymentInput::PartiallyPaid { amount } = input.payment {
        money::ensure_non_negative("Paid amount", amount)?;
    }

    Ok(())
}

/// Produces one [`BillDraft`] per month of the submission, in order.
///
/// Electricity: a single month takes the whole reading delta. For longer spans
/// every month but the last takes `delta / months`, and the last month ends
/// exactly on the current reading so rounding never compounds. Readings are
/// rounded to two decimals per month.
///
/// Payment: `Paid` settles every month, `Unpaid` none, and a partial amount is
/// credited to the first month only (capped at its total).
pub fn calculate_bills(input: &BillingInput) -> Result<Vec<BillDraft>> {
    validate(input)?;

    let months = input.months;
    let total_delta = input.current_reading - input.previous_reading;
    #[allow(clippy::cast_precision_loss)]
    let per_month_delta = if months == 1 {
        total_delta
    } else {
        total_delta / months as f64
    };
    let fixed = input.rent + input.water + input.waste;

    let mut drafts = Vec::with_capacity(months);
    let mut reading = input.previous_reading;

    for i in 0..months {
        let period = input.start.advance(i);
        let next_reading = if i + 1 == months {
            input.current_reading
        } else {
            reading + per_month_delta
        };

        let prev_unit = round2(reading);
        let curr_unit = round2(next_reading);
        let electricity = (curr_unit - prev_unit).max(0.0) * input.electricity_rate;

        let internet_amount = input
            .internet
            .as_ref()
            .filter(|plan| plan.months.contains(&period.month))
            .map_or(0.0, |plan| plan.monthly_rate);

        let total = round2(fixed + electricity + internet_amount);
        money::ensure_finite("Bill total", total)?;
        let paid_amount = round2(match input.payment {
            PaymentInput::Paid => total,
            PaymentInput::Unpaid => 0.0,
            PaymentInput::PartiallyPaid { amount } if i == 0 => amount.min(total),
            PaymentInput::PartiallyPaid { .. } => 0.0,
        });
        let remaining_amount = round2((total - paid_amount).max(0.0));

        drafts.push(BillDraft {
            period,
            rent: input.rent,
            prev_unit,
            curr_unit,
            electricity_rate: input.electricity_rate,
            water: input.water,
            waste: input.waste,
            internet: internet_amount > 0.0,
            internet_amount,
            total,
            paid_amount,
            remaining_amount,
            payment_status: PaymentStatus::classify(paid_amount, total),
        });

        reading = next_reading;
    }

    let distributed: f64 = drafts.iter().map(|d| d.curr_unit - d.prev_unit).sum();
    if (distributed - total_delta).abs() > USAGE_TOLERANCE {
        warn!(
            distributed,
            expected = total_delta,
            "Electricity usage mismatch across generated months"
        );
    }

    debug!(
        start = %input.start,
        months,
        "Calculated {} bill draft(s)",
        drafts.len()
    );

    Ok(drafts)
}
