//! Payment Discord commands - `/pay preview` and `/pay apply`.
//!
//! A payment is spread across the tenant's unpaid bills, oldest first.
//! Previewing never writes; applying re-reads the bills before writing.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::is_user_error, handlers::autocomplete},
        core::{
            allocation::{self, SurplusCarry, SurplusDisposition},
            money::format_amount,
            statement, tenant,
        },
        errors::{Error, Result},
    };

    /// What to do with money left over once every bill is paid.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum SurplusChoice {
        #[name = "deduct_from_next"]
        DeductFromNext,
        #[name = "return_to_payer"]
        ReturnToPayer,
    }

    impl From<SurplusChoice> for SurplusDisposition {
        fn from(choice: SurplusChoice) -> Self {
            match choice {
                SurplusChoice::DeductFromNext => Self::DeductFromNext,
                SurplusChoice::ReturnToPayer => Self::ReturnToPayer,
            }
        }
    }

    fn describe_carry(carry: &SurplusCarry) -> String {
        match carry {
            SurplusCarry::None => String::new(),
            SurplusCarry::Returned { amount } => {
                format!("\n💵 Return **{}** to the payer.", format_amount(*amount))
            }
            SurplusCarry::AppliedToExisting { bill, amount } => format!(
                "\n➡️ Credited **{}** to {} {} (bill #{}, now {}).",
                format_amount(*amount),
                bill.month,
                bill.year,
                bill.id,
                bill.payment_status
            ),
            SurplusCarry::CreatedNext { bill, amount } => format!(
                "\n🆕 Created bill #{} for {} {} with **{}** already paid ({} remaining).",
                bill.id,
                bill.month,
                bill.year,
                format_amount(*amount),
                format_amount(bill.remaining_amount)
            ),
        }
    }

    /// Parent command for bulk payments.
    #[poise::command(slash_command, subcommands("pay_preview", "pay_apply"))]
    pub async fn pay(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Payment command. Available subcommands:\n\
            `/pay preview` - Show how a payment would be applied\n\
            `/pay apply` - Apply a payment to outstanding bills";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Shows how a payment would be spread across unpaid bills. Nothing is saved.
    #[poise::command(slash_command, rename = "preview")]
    pub async fn pay_preview(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Tenant"]
        #[autocomplete = "autocomplete::autocomplete_tenant_name"]
        tenant_name: String,
        #[description = "Amount received"] amount: f64,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let plan = match tenant::require_tenant(db, &tenant_name).await {
            Ok(found) => allocation::preview_payment(db, found.id, amount).await,
            Err(e) => Err(e),
        };
        let plan = match plan {
            Ok(plan) => plan,
            Err(e) if is_user_error(&e) => {
                ctx.say(format!("⚠️ {e}")).await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let text = statement::format_allocation_plan(&plan)?;
        ctx.say(format!(
            "🔎 **Payment preview for {tenant_name}**\n```\n{text}\n```_Nothing has been saved._"
        ))
        .await?;
        Ok(())
    }

    /// Applies a payment to unpaid bills, oldest first.
    #[poise::command(slash_command, rename = "apply")]
    pub async fn pay_apply(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Tenant"]
        #[autocomplete = "autocomplete::autocomplete_tenant_name"]
        tenant_name: String,
        #[description = "Amount received"] amount: f64,
        #[description = "What to do with any surplus"] surplus: SurplusChoice,
    ) -> Result<()> {
        let db = &ctx.data().database;
        ctx.defer().await?;

        let receipt = match tenant::require_tenant(db, &tenant_name).await {
            Ok(found) => allocation::commit_payment(db, found.id, amount, surplus.into()).await,
            Err(e) => Err(e),
        };
        let receipt = match receipt {
            Ok(receipt) => receipt,
            Err(e) if is_user_error(&e) => {
                ctx.say(format!("⚠️ {e}")).await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let text = statement::format_allocation_plan(&receipt.plan)?;
        ctx.say(format!(
            "✅ **Payment recorded for {tenant_name}**\n```\n{text}\n```{}",
            describe_carry(&receipt.carry)
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
