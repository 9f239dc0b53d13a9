//! Money helpers and payment-status classification.
//!
//! Amounts are stored as `f64` rounded to two decimals. Anything that must
//! add up exactly (bulk allocation) works in integer minor units instead.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tolerance used when comparing stored amounts.
pub const MONEY_TOLERANCE: f64 = 0.01;

/// Largest amount, reading, or bill total accepted.
///
/// Keeps every value, and any realistic sum of them, far inside `i64` minor units.
pub const MAX_AMOUNT: f64 = 1_000_000_000_000.0;

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Converts an amount to integer minor units (1/100), rounding half away from zero.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_minor(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Converts integer minor units back to an amount.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn from_minor(minor: i64) -> f64 {
    minor as f64 / 100.0
}

/// Rejects NaN, infinities, and magnitudes above [`MAX_AMOUNT`].
pub fn ensure_finite(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::invalid(format!("{field} must be a valid number")));
    }
    if value.abs() > MAX_AMOUNT {
        return Err(Error::invalid(format!(
            "{field} must not exceed {MAX_AMOUNT:.0}"
        )));
    }
    Ok(())
}

/// Adds amounts in minor units, failing instead of overflowing.
pub fn sum_minor(values: impl IntoIterator<Item = f64>) -> Result<i64> {
    values.into_iter().try_fold(0_i64, |acc, v| {
        acc.checked_add(to_minor(v))
            .ok_or_else(|| Error::invalid("Amounts are too large to add up"))
    })
}

/// Rejects non-finite or negative amounts.
pub fn ensure_non_negative(field: &str, value: f64) -> Result<()> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(Error::invalid(format!("{field} cannot be negative")));
    }
    Ok(())
}

/// Payment state of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing outstanding
    Paid,
    /// Nothing paid
    Unpaid,
    /// Something paid, something outstanding
    PartiallyPaid,
}

impl PaymentStatus {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Unpaid => "unpaid",
            Self::PartiallyPaid => "partially_paid",
        }
    }

    /// Derives the status from what was paid against what was billed.
    ///
    /// Compared in minor units so that float noise cannot flip a fully paid
    /// bill to partially paid.
    #[must_use]
    pub fn classify(paid: f64, total: f64) -> Self {
        let paid = to_minor(paid);
        if paid >= to_minor(total) {
            Self::Paid
        } else if paid <= 0 {
            Self::Unpaid
        } else {
            Self::PartiallyPaid
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paid" => Ok(Self::Paid),
            "unpaid" => Ok(Self::Unpaid),
            "partially_paid" | "partial" => Ok(Self::PartiallyPaid),
            other => Err(Error::invalid(format!("Unknown payment status '{other}'"))),
        }
    }
}

/// Formats an amount the way statements and bot replies show it.
#[must_use]
pub fn format_amount(value: f64) -> String {
    format!("Rs. {value:.2}")
}
