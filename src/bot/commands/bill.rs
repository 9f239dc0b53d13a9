//! Bill Discord commands - `/bill add | edit | delete | history | statement` and `/dues`.
//!
//! Arguments the user leaves out fall back to the `[defaults]` section of
//! `config.toml` (for `/bill add`) or to the stored bill (for `/bill edit`).

use crate::{
    config::settings::BillDefaults,
    core::{
        billing::{BillingInput, InternetPlan, PaymentInput},
        calendar::{Month, Period},
    },
    errors::{Error, Result},
};
use std::collections::BTreeSet;

/// Charges given on the command line, before defaults are applied.
#[derive(Debug, Default, Clone)]
struct ChargeArgs {
    rent: Option<f64>,
    water: Option<f64>,
    waste: Option<f64>,
    electricity_rate: Option<f64>,
    internet_rate: Option<f64>,
    internet_months: Option<String>,
}

fn required(field: &str, given: Option<f64>, fallback: Option<f64>) -> Result<f64> {
    given
        .or(fallback)
        .ok_or_else(|| Error::invalid(format!("{field} is required (no default is configured)")))
}

/// Parses a comma-separated month list such as `"Baisakh, Jestha"`; `all` selects every month.
fn parse_month_list(list: &str) -> Result<BTreeSet<Month>> {
    if list.trim().eq_ignore_ascii_case("all") {
        return Ok(Month::ALL.into_iter().collect());
    }
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

fn internet_plan(args: &ChargeArgs, defaults: &BillDefaults) -> Result<Option<InternetPlan>> {
    if args.internet_months.is_none() && args.internet_rate.is_none() {
        return Ok(None);
    }
    let monthly_rate = required("Internet rate", args.internet_rate, defaults.internet_rate)?;
    let months = parse_month_list(args.internet_months.as_deref().unwrap_or_default())?;
    Ok(Some(InternetPlan {
        monthly_rate,
        months,
    }))
}

#[allow(clippy::too_many_arguments)]
fn build_input(
    start: Period,
    months: usize,
    previous_reading: f64,
    current_reading: f64,
    charges: &ChargeArgs,
    defaults: &BillDefaults,
    payment: PaymentInput,
) -> Result<BillingInput> {
    Ok(BillingInput {
        start,
        months,
        rent: required("Rent", charges.rent, defaults.rent)?,
        water: charges.water.or(defaults.water).unwrap_or_default(),
        waste: charges.waste.or(defaults.waste).unwrap_or_default(),
        electricity_rate: required(
            "Electricity rate",
            charges.electricity_rate,
            defaults.electricity_rate,
        )?,
        previous_reading,
        current_reading,
        internet: internet_plan(charges, defaults)?,
        payment,
    })
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{ChargeArgs, build_input};
    use crate::{
        bot::{BotData, commands::is_user_error, handlers::autocomplete},
        config::settings::BillDefaults,
        core::{
            bill::{self as bill_store, SubmitMode},
            billing::{self, BillingInput, PaymentInput},
            calendar::Period,
            money::{PaymentStatus, format_amount},
            statement, tenant,
        },
        entities::bill::Model as BillModel,
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Payment state entered with a bill.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum StatusChoice {
        #[name = "paid"]
        Paid,
        #[name = "unpaid"]
        Unpaid,
        #[name = "partially_paid"]
        PartiallyPaid,
    }

    impl From<StatusChoice> for PaymentStatus {
        fn from(choice: StatusChoice) -> Self {
            match choice {
                StatusChoice::Paid => Self::Paid,
                StatusChoice::Unpaid => Self::Unpaid,
                StatusChoice::PartiallyPaid => Self::PartiallyPaid,
            }
        }
    }

    fn format_saved(bills: &[BillModel]) -> Result<String> {
        let mut response = String::new();
        for b in bills {
            writeln!(
                &mut response,
                "• #{} **{} {}**: {} ({}, {:.2} units)",
                b.id,
                b.month,
                b.year,
                format_amount(b.total),
                b.payment_status,
                b.usage()
            )?;
        }
        Ok(response)
    }

    /// Answers a user error inline; anything else goes to the error hook.
    async fn reply_or_raise(ctx: poise::Context<'_, BotData, Error>, error: Error) -> Result<()> {
        if is_user_error(&error) {
            ctx.say(format!("⚠️ {error}")).await?;
            Ok(())
        } else {
            Err(error)
        }
    }

    async fn confirm_reading(
        ctx: poise::Context<'_, BotData, Error>,
        input: &BillingInput,
        confirmed: Option<bool>,
    ) -> Result<bool> {
        if billing::needs_reading_confirmation(input) && !confirmed.unwrap_or(false) {
            ctx.say(format!(
                "⚠️ The current reading ({:.2}) is below the previous reading ({:.2}). \
                 If the meter was reset, run the command again with `confirm_reset: True`.",
                input.current_reading, input.previous_reading
            ))
            .await?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Parent command for recording and viewing bills.
    #[poise::command(
        slash_command,
        subcommands("bill_add", "bill_edit", "bill_delete", "bill_history", "bill_statement")
    )]
    pub async fn bill(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Bill command. Available subcommands:\n\
            `/bill add` - Record one or more months of rent\n\
            `/bill edit` - Recompute a single bill\n\
            `/bill delete` - Delete a bill\n\
            `/bill history` - List a tenant's bills\n\
            `/bill statement` - Show one bill in full";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Records rent for one or more consecutive months.
    ///
    /// Electricity usage between the two readings is spread across the months.
    /// A partial payment is credited to the first month only.
    #[allow(clippy::too_many_arguments)]
    #[poise::command(slash_command, rename = "add")]
    pub async fn bill_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Tenant"]
        #[autocomplete = "autocomplete::autocomplete_tenant_name"]
        tenant_name: String,
        #[description = "First month billed"]
        #[autocomplete = "autocomplete::autocomplete_month"]
        month: String,
        #[description = "Year of the first month"] year: i32,
        #[description = "Meter reading at the start"] previous_reading: f64,
        #[description = "Meter reading now"] current_reading: f64,
        #[description = "Number of months, 1-12 (default 1)"]
        #[min = 1]
        #[max = 12]
        months: Option<u8>,
        #[description = "Monthly rent"] rent: Option<f64>,
        #[description = "Monthly water fee"] water: Option<f64>,
        #[description = "Monthly waste fee"] waste: Option<f64>,
        #[description = "Price per electricity unit"] electricity_rate: Option<f64>,
        #[description = "Monthly internet charge"] internet_rate: Option<f64>,
        #[description = "Months with internet, comma separated, or 'all'"] internet_months: Option<
            String,
        >,
        #[description = "Payment status (default unpaid)"] status: Option<StatusChoice>,
        #[description = "Amount paid, for partially paid bills"] paid_amount: Option<f64>,
        #[description = "Confirm a meter reset when the current reading is lower"]
        confirm_reset: Option<bool>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let settings = &ctx.data().settings;

        let found = match tenant::require_tenant(db, &tenant_name).await {
            Ok(t) => t,
            Err(e) => return reply_or_raise(ctx, e).await,
        };

        let charges = ChargeArgs {
            rent,
            water,
            waste,
            electricity_rate,
            internet_rate,
            internet_months,
        };
        let built = Period::parse(&month, year).and_then(|start| {
            let status = status.map_or(PaymentStatus::Unpaid, PaymentStatus::from);
            build_input(
                start,
                usize::from(months.unwrap_or(1)),
                previous_reading,
                current_reading,
                &charges,
                &settings.defaults,
                PaymentInput::from_status(status, paid_amount)?,
            )
        });
        let input = match built {
            Ok(input) => input,
            Err(e) => return reply_or_raise(ctx, e).await,
        };

        if !confirm_reading(ctx, &input, confirm_reset).await? {
            return Ok(());
        }

        match bill_store::submit_bills(db, found.id, &input, SubmitMode::Create, &settings.calendar)
            .await
        {
            Ok(saved) => {
                let mut response = format!(
                    "✅ Saved {} bill{} for **{}**:\n",
                    saved.len(),
                    if saved.len() == 1 { "" } else { "s" },
                    found.name
                );
                response.push_str(&format_saved(&saved)?);
                ctx.say(response).await?;
                Ok(())
            }
            Err(e) => reply_or_raise(ctx, e).await,
        }
    }

    /// Recomputes a single bill.
    ///
    /// Anything left out keeps the bill's current value.
    #[allow(clippy::too_many_arguments)]
    #[poise::command(slash_command, rename = "edit")]
    pub async fn bill_edit(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Bill ID (see /bill history)"] bill_id: i64,
        #[description = "Month"]
        #[autocomplete = "autocomplete::autocomplete_month"]
        month: Option<String>,
        #[description = "Year"] year: Option<i32>,
        #[description = "Meter reading at the start of the month"] previous_reading: Option<f64>,
        #[description = "Meter reading at the end of the month"] current_reading: Option<f64>,
        #[description = "Rent"] rent: Option<f64>,
        #[description = "Water fee"] water: Option<f64>,
        #[description = "Waste fee"] waste: Option<f64>,
        #[description = "Price per electricity unit"] electricity_rate: Option<f64>,
        #[description = "Internet charge for this month (0 removes it)"] internet_rate: Option<
            f64,
        >,
        #[description = "Payment status"] status: Option<StatusChoice>,
        #[description = "Amount paid, for partially paid bills"] paid_amount: Option<f64>,
        #[description = "Confirm a meter reset when the current reading is lower"]
        confirm_reset: Option<bool>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let settings = &ctx.data().settings;

        let Some(existing) = bill_store::get_bill_by_id(db, bill_id).await? else {
            ctx.say(format!("❌ Bill #{bill_id} not found.")).await?;
            return Ok(());
        };

        let built = existing.period().and_then(|current| {
            let start = match month.as_deref() {
                Some(m) => Period::parse(m, year.unwrap_or(current.year))?,
                None => Period::new(current.month, year.unwrap_or(current.year)),
            };
            let status = status.map_or(existing.status()?, PaymentStatus::from);
            let paid = paid_amount.unwrap_or(existing.paid_amount);

            let internet_rate = internet_rate.unwrap_or(if existing.internet {
                existing.internet_amount
            } else {
                0.0
            });
            let charges = ChargeArgs {
                rent: rent.or(Some(existing.rent)),
                water: water.or(Some(existing.water)),
                waste: waste.or(Some(existing.waste)),
                electricity_rate: electricity_rate.or(Some(existing.electricity_rate)),
                internet_rate: (internet_rate > 0.0).then_some(internet_rate),
                internet_months: (internet_rate > 0.0).then(|| start.month.name().to_string()),
            };

            build_input(
                start,
                1,
                previous_reading.unwrap_or(existing.prev_unit),
                current_reading.unwrap_or(existing.curr_unit),
                &charges,
                &BillDefaults::default(),
                PaymentInput::from_status(status, Some(paid))?,
            )
        });
        let input = match built {
            Ok(input) => input,
            Err(e) => return reply_or_raise(ctx, e).await,
        };

        if !confirm_reading(ctx, &input, confirm_reset).await? {
            return Ok(());
        }

        match bill_store::submit_bills(
            db,
            existing.tenant_id,
            &input,
            SubmitMode::Edit { bill_id },
            &settings.calendar,
        )
        .await
        {
            Ok(saved) => {
                let mut response = format!("✅ Updated bill #{bill_id}:\n");
                response.push_str(&format_saved(&saved)?);
                ctx.say(response).await?;
                Ok(())
            }
            Err(e) => reply_or_raise(ctx, e).await,
        }
    }

    /// Deletes a bill.
    #[poise::command(slash_command, rename = "delete")]
    pub async fn bill_delete(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Bill ID (see /bill history)"] bill_id: i64,
    ) -> Result<()> {
        let db = &ctx.data().database;
        match bill_store::delete_bill(db, bill_id).await {
            Ok(()) => {
                ctx.say(format!("✅ Deleted bill #{bill_id}.")).await?;
                Ok(())
            }
            Err(e) => reply_or_raise(ctx, e).await,
        }
    }

    /// Lists a tenant's bills, newest first, with totals.
    #[poise::command(slash_command, rename = "history")]
    pub async fn bill_history(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Tenant"]
        #[autocomplete = "autocomplete::autocomplete_tenant_name"]
        tenant_name: String,
        #[description = "Number of bills to show (default 12)"]
        #[min = 1]
        #[max = 24]
        limit: Option<u8>,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let found = match tenant::require_tenant(db, &tenant_name).await {
            Ok(t) => t,
            Err(e) => return reply_or_raise(ctx, e).await,
        };

        let history = bill_store::get_bill_history(db, found.id).await?;
        let shown = history.len().min(usize::from(limit.unwrap_or(12)));
        let text = statement::format_history_statement(&found, &history[..shown])?;

        let mut response = format!("```\n{text}\n```");
        if shown < history.len() {
            write!(
                &mut response,
                "_Showing the latest {shown} of {} bills._",
                history.len()
            )?;
        }
        ctx.say(response).await?;
        Ok(())
    }

    /// Shows the full breakdown of one bill.
    #[poise::command(slash_command, rename = "statement")]
    pub async fn bill_statement(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Bill ID (see /bill history)"] bill_id: i64,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let Some(found) = bill_store::get_bill_by_id(db, bill_id).await? else {
            ctx.say(format!("❌ Bill #{bill_id} not found.")).await?;
            return Ok(());
        };

        let text = statement::format_bill_statement(&found)?;
        ctx.say(format!("```\n{text}\n```")).await?;
        Ok(())
    }

    /// Shows what a tenant still owes, oldest month first.
    #[poise::command(slash_command, prefix_command)]
    pub async fn dues(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Tenant"]
        #[autocomplete = "autocomplete::autocomplete_tenant_name"]
        tenant_name: String,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let found = match tenant::require_tenant(db, &tenant_name).await {
            Ok(t) => t,
            Err(e) => return reply_or_raise(ctx, e).await,
        };

        let outstanding = bill_store::list_outstanding_bills(db, found.id).await?;
        let summary = statement::unpaid_summary(&outstanding)?;
        let text = statement::format_unpaid_summary(&found.name, &summary)?;
        ctx.say(format!("```\n{text}\n```")).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
