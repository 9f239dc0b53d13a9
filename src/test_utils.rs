//! Shared test utilities for `RentBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating tenants and bills with sensible defaults.

use crate::{
    core::{
        bill::{self, SubmitMode},
        billing::{BillDraft, BillingInput, PaymentInput},
        calendar::{Month, Period, YearRange},
        money::{PaymentStatus, round2},
        tenant,
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a tenant with no linked Discord account.
pub async fn create_test_tenant(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::tenant::Model> {
    tenant::create_tenant(db, name, None).await
}

/// Sets up a database with a single tenant named "Test Tenant".
pub async fn setup_with_tenant() -> Result<(DatabaseConnection, entities::tenant::Model)> {
    let db = setup_test_db().await?;
    let tenant = create_test_tenant(&db, "Test Tenant").await?;
    Ok((db, tenant))
}

/// A billing submission with sensible defaults.
///
/// # Defaults
/// * rent 5000, water 200, waste 100
/// * electricity rate 10, readings 100 -> 130
/// * no internet, unpaid
#[must_use]
pub fn test_billing_input(month: Month, year: i32, months: usize) -> BillingInput {
    BillingInput {
        start: Period::new(month, year),
        months,
        rent: 5000.0,
        water: 200.0,
        waste: 100.0,
        electricity_rate: 10.0,
        previous_reading: 100.0,
        current_reading: 130.0,
        internet: None,
        payment: PaymentInput::Unpaid,
    }
}

/// Submits [`test_billing_input`] for a tenant and returns the stored bills.
pub async fn create_test_bills(
    db: &DatabaseConnection,
    tenant_id: i64,
    month: Month,
    year: i32,
    months: usize,
) -> Result<Vec<entities::bill::Model>> {
    let input = test_billing_input(month, year, months);
    bill::submit_bills(db, tenant_id, &input, SubmitMode::Create, &YearRange::default()).await
}

/// Inserts a bill whose whole total is rent, with `paid` already paid.
///
/// Useful when a test cares about remaining amounts rather than how the
/// total was built.
pub async fn create_custom_bill(
    db: &DatabaseConnection,
    tenant_id: i64,
    month: Month,
    year: i32,
    total: f64,
    paid: f64,
) -> Result<entities::bill::Model> {
    let draft = BillDraft {
        period: Period::new(month, year),
        rent: total,
        prev_unit: 0.0,
        curr_unit: 0.0,
        electricity_rate: 0.0,
        water: 0.0,
        waste: 0.0,
        internet: false,
        internet_amount: 0.0,
        total,
        paid_amount: paid,
        remaining_amount: round2((total - paid).max(0.0)),
        payment_status: PaymentStatus::classify(paid, total),
    };
    bill::create_bill(db, tenant_id, &draft, false).await
}
