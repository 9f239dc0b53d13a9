//! General Discord commands - ping and help.
//! This module contains simple commands that don't require database operations
//! and provide basic bot functionality and user assistance.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**RentBuddy Help**\n\
        Here is a summary of all available commands for RentBuddy.\n\n\
        **Tenants**\n\
        • `/tenant add <name> [discord_user]` - Registers a tenant.\n\
        • `/tenant list` - Lists all tenants.\n\
        • `/tenant remove <name>` - Removes a tenant and all of their bills.\n\n\
        **Bills**\n\
        • `/bill add <tenant> <month> <year> <previous> <current> [months] [rent] [water] [waste] [rate] ...` - Records one or more months of rent.\n\
        • `/bill edit <bill_id> ...` - Recomputes a single bill.\n\
        • `/bill delete <bill_id>` - Deletes a bill.\n\
        • `/bill history <tenant>` - Lists a tenant's bills with totals.\n\
        • `/bill statement <bill_id>` - Shows the full breakdown of one bill.\n\
        • `/dues <tenant>` - Shows what a tenant still owes.\n\n\
        **Payments**\n\
        • `/pay preview <tenant> <amount>` - Shows how a payment would be applied.\n\
        • `/pay apply <tenant> <amount> <surplus>` - Applies a payment, oldest bill first.\n\n\
        **Utility**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
