//! Plain-text statements for bills, bill history, unpaid dues and payment plans.
//!
//! Everything here is pure formatting over stored records; the bot layer wraps
//! the output in code blocks.

use crate::{
    core::{
        allocation::AllocationPlan,
        bill::sort_chronologically,
        calendar::Period,
        money::{PaymentStatus, format_amount, from_minor, sum_minor},
    },
    entities::{bill, tenant},
    errors::Result,
};
use std::fmt::Write;

/// Outstanding amounts of a tenant, oldest period first.
#[derive(Debug, Clone, PartialEq)]
pub struct UnpaidSummary {
    /// Period and remaining amount of each unpaid bill
    pub lines: Vec<(Period, f64)>,
    /// Sum of all remaining amounts
    pub total: f64,
}

impl UnpaidSummary {
    /// True when nothing is owed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Renders a single bill.
pub fn format_bill_statement(bill: &bill::Model) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Rent Statement: {}", bill.period()?)?;
    writeln!(out, "{}", "-".repeat(32))?;
    writeln!(
        out,
        "Units used:       {:.2} ({:.2} -> {:.2})",
        bill.usage(),
        bill.prev_unit,
        bill.curr_unit
    )?;
    writeln!(out, "Rate per unit:    {}", format_amount(bill.electricity_rate))?;
    writeln!(out, "Electricity:      {}", format_amount(bill.electricity_charge()))?;
    writeln!(out, "Rent:             {}", format_amount(bill.rent))?;
    writeln!(out, "Water:            {}", format_amount(bill.water))?;
    writeln!(out, "Waste:            {}", format_amount(bill.waste))?;
    if bill.internet {
        writeln!(out, "Internet:         {}", format_amount(bill.internet_amount))?;
    }
    if bill.is_surplus_adjusted {
        writeln!(out, "Note: includes surplus carried from an earlier payment")?;
    }
    writeln!(out, "{}", "-".repeat(32))?;
    writeln!(out, "Status:           {}", bill.status()?)?;
    writeln!(out, "Paid:             {}", format_amount(bill.paid_amount))?;
    writeln!(out, "Remaining:        {}", format_amount(bill.remaining_amount))?;
    write!(out, "Total:            {}", format_amount(bill.total))?;
    Ok(out)
}

/// Renders a tenant's bills, one line each, with grand totals.
///
/// Bills are listed in the order given.
pub fn format_history_statement(tenant: &tenant::Model, bills: &[bill::Model]) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Bill history for {}", tenant.name)?;

    if bills.is_empty() {
        write!(out, "No bills recorded.")?;
        return Ok(out);
    }

    for b in bills {
        writeln!(
            out,
            "#{:<4} {:<16} total {:>12}  paid {:>12}  {}",
            b.id,
            b.period()?.to_string(),
            format_amount(b.total),
            format_amount(b.paid_amount),
            b.status()?
        )?;
    }

    let billed = sum_minor(bills.iter().map(|b| b.total))?;
    let paid = sum_minor(bills.iter().map(|b| b.paid_amount))?;
    let outstanding = sum_minor(bills.iter().map(|b| b.remaining_amount))?;

    writeln!(out, "Billed:      {}", format_amount(from_minor(billed)))?;
    writeln!(out, "Paid:        {}", format_amount(from_minor(paid)))?;
    write!(out, "Outstanding: {}", format_amount(from_minor(outstanding)))?;
    Ok(out)
}

/// Collects the remaining amounts of every bill that is not fully paid.
pub fn unpaid_summary(bills: &[bill::Model]) -> Result<UnpaidSummary> {
    let mut unpaid = Vec::new();
    for b in bills {
        if b.status()? != PaymentStatus::Paid {
            unpaid.push(b.clone());
        }
    }

    let unpaid = sort_chronologically(unpaid)?;
    let total = sum_minor(unpaid.iter().map(|b| b.remaining_amount))?;
    let lines = unpaid
        .iter()
        .map(|b| -> Result<(Period, f64)> { Ok((b.period()?, b.remaining_amount)) })
        .collect::<Result<Vec<_>>>()?;

    Ok(UnpaidSummary {
        lines,
        total: from_minor(total),
    })
}

/// Renders an [`UnpaidSummary`] for a tenant.
pub fn format_unpaid_summary(tenant_name: &str, summary: &UnpaidSummary) -> Result<String> {
    let mut out = String::new();
    if summary.is_empty() {
        write!(out, "{tenant_name} has no outstanding dues.")?;
        return Ok(out);
    }

    writeln!(out, "Outstanding dues for {tenant_name}")?;
    for (period, remaining) in &summary.lines {
        writeln!(out, "{:<16} {:>12}", period.to_string(), format_amount(*remaining))?;
    }
    write!(out, "Total due:       {:>12}", format_amount(summary.total))?;
    Ok(out)
}

/// Renders how a payment would be (or was) spread across bills.
pub fn format_allocation_plan(plan: &AllocationPlan) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "Payment: {}", format_amount(plan.payment))?;

    if plan.results.is_empty() {
        writeln!(out, "No outstanding bills.")?;
    }
    for r in &plan.results {
        writeln!(
            out,
            "{:<16} owed {:>12}  applied {:>12}  left {:>12}  {}",
            r.period.to_string(),
            format_amount(r.previous_remaining),
            format_amount(r.payment_applied),
            format_amount(r.new_remaining),
            r.new_status
        )?;
    }
    write!(out, "Surplus: {}", format_amount(plan.surplus))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::{allocation, bill::get_bill_history, calendar::Month};
    use crate::errors::Error;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_bill_statement_lists_charges() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        let bills = create_test_bills(&db, tenant.id, Month::Magh, 2081, 1).await?;

        let text = format_bill_statement(&bills[0])?;
        assert!(text.starts_with("Rent Statement: Magh 2081"));
        assert!(text.contains("Units used:       30.00 (100.00 -> 130.00)"));
        assert!(text.contains("Electricity:      Rs. 300.00"));
        assert!(text.contains("Rent:             Rs. 5000.00"));
        assert!(text.contains("Status:           unpaid"));
        assert!(text.contains("Total:            Rs. 5600.00"));
        assert!(!text.contains("Internet"));
        assert!(!text.contains("surplus"));
        Ok(())
    }

    #[tokio::test]
    async fn test_bill_statement_notes_surplus_adjustment() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        create_custom_bill(&db, tenant.id, Month::Baisakh, 2081, 100.0, 0.0).await?;
        let receipt = allocation::commit_payment(
            &db,
            tenant.id,
            150.0,
            allocation::SurplusDisposition::DeductFromNext,
        )
        .await?;
        let allocation::SurplusCarry::CreatedNext { bill, .. } = receipt.carry else {
            panic!("expected a new bill");
        };

        let text = format_bill_statement(&bill)?;
        assert!(text.contains("surplus carried"));
        assert!(text.contains("Paid:             Rs. 50.00"));
        Ok(())
    }

    #[tokio::test]
    async fn test_history_statement_totals() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        create_custom_bill(&db, tenant.id, Month::Baisakh, 2081, 1000.0, 1000.0).await?;
        create_custom_bill(&db, tenant.id, Month::Jestha, 2081, 500.0, 200.0).await?;

        let bills = get_bill_history(&db, tenant.id).await?;
        let text = format_history_statement(&tenant, &bills)?;
        assert!(text.starts_with("Bill history for Test Tenant"));
        assert!(text.contains("Jestha 2081"));
        assert!(text.contains("Billed:      Rs. 1500.00"));
        assert!(text.contains("Paid:        Rs. 1200.00"));
        assert!(text.ends_with("Outstanding: Rs. 300.00"));
        Ok(())
    }

    #[tokio::test]
    async fn test_history_statement_empty() -> Result<()> {
        let (_db, tenant) = setup_with_tenant().await?;
        let text = format_history_statement(&tenant, &[])?;
        assert!(text.ends_with("No bills recorded."));
        Ok(())
    }

    #[tokio::test]
    async fn test_unpaid_summary_skips_paid_and_sorts() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        create_custom_bill(&db, tenant.id, Month::Baisakh, 2082, 100.5, 0.0).await?;
        create_custom_bill(&db, tenant.id, Month::Chaitra, 2081, 200.25, 0.25).await?;
        create_custom_bill(&db, tenant.id, Month::Magh, 2081, 999.0, 999.0).await?;

        let bills = get_bill_history(&db, tenant.id).await?;
        let summary = unpaid_summary(&bills)?;
        assert_eq!(
            summary.lines,
            vec![
                (Period::new(Month::Chaitra, 2081), 200.0),
                (Period::new(Month::Baisakh, 2082), 100.5),
            ]
        );
        assert_eq!(summary.total, 300.5);

        let text = format_unpaid_summary(&tenant.name, &summary)?;
        assert!(text.contains("Chaitra 2081"));
        assert!(text.contains("Rs. 300.50"));
        Ok(())
    }

    #[tokio::test]
    async fn test_totals_too_large_to_add_are_rejected() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        create_custom_bill(&db, tenant.id, Month::Baisakh, 2081, 6e16, 0.0).await?;
        create_custom_bill(&db, tenant.id, Month::Jestha, 2081, 6e16, 0.0).await?;

        let bills = get_bill_history(&db, tenant.id).await?;
        assert!(matches!(
            unpaid_summary(&bills),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            format_history_statement(&tenant, &bills),
            Err(Error::InvalidInput { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_unpaid_summary_empty() {
        let summary = unpaid_summary(&[]).unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary.total, 0.0);
        assert_eq!(
            format_unpaid_summary("Ram", &summary).unwrap(),
            "Ram has no outstanding dues."
        );
    }

    #[tokio::test]
    async fn test_format_allocation_plan() -> Result<()> {
        let (db, tenant) = setup_with_tenant().await?;
        create_custom_bill(&db, tenant.id, Month::Baisakh, 2081, 1000.0, 0.0).await?;
        create_custom_bill(&db, tenant.id, Month::Jestha, 2081, 500.0, 0.0).await?;

        let plan = allocation::preview_payment(&db, tenant.id, 1200.0).await?;
        let text = format_allocation_plan(&plan)?;
        assert!(text.starts_with("Payment: Rs. 1200.00"));
        assert!(text.contains("applied   Rs. 200.00"));
        assert!(text.contains("partially_paid"));
        assert!(text.ends_with("Surplus: Rs. 0.00"));
        Ok(())
    }
}
