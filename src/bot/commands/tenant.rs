//! Tenant Discord commands - `/tenant add`, `/tenant list`, and `/tenant remove`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::is_user_error, handlers::autocomplete},
        core::tenant,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// Parent command for managing tenants.
    #[poise::command(
        slash_command,
        subcommands("tenant_add", "tenant_list", "tenant_remove")
    )]
    pub async fn tenant(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Tenant management command. Available subcommands:\n\
            `/tenant add` - Register a tenant\n\
            `/tenant list` - List all tenants\n\
            `/tenant remove` - Remove a tenant and their bills";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Registers a new tenant.
    #[poise::command(slash_command, rename = "add")]
    pub async fn tenant_add(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Tenant's display name"] name: String,
        #[description = "Discord account of the tenant (optional)"] discord_user: Option<
            serenity::User,
        >,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let discord_user_id = discord_user.map(|u| u.id.to_string());

        match tenant::create_tenant(db, &name, discord_user_id).await {
            Ok(created) => {
                ctx.say(format!("✅ Added tenant **{}**.", created.name))
                    .await?;
            }
            Err(e) if is_user_error(&e) => {
                ctx.say(format!("⚠️ {e}")).await?;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Lists all tenants.
    #[poise::command(slash_command, rename = "list")]
    pub async fn tenant_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let tenants = tenant::get_all_tenants(db).await?;

        if tenants.is_empty() {
            ctx.say("👥 No tenants yet. Add one with `/tenant add`.")
                .await?;
            return Ok(());
        }

        let mut response = String::from("👥 **Tenants**\n\n");
        for t in tenants {
            match t.discord_user_id {
                Some(uid) => writeln!(&mut response, "• **{}** (<@{uid}>)", t.name)?,
                None => writeln!(&mut response, "• **{}**", t.name)?,
            }
        }

        ctx.say(response).await?;
        Ok(())
    }

    /// Removes a tenant together with all of their bills.
    #[poise::command(slash_command, rename = "remove")]
    pub async fn tenant_remove(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Tenant to remove"]
        #[autocomplete = "autocomplete::autocomplete_tenant_name"]
        name: String,
    ) -> Result<()> {
        let db = &ctx.data().database;

        let Some(found) = tenant::get_tenant_by_name(db, &name).await? else {
            ctx.say(format!("❌ Tenant '{name}' not found.")).await?;
            return Ok(());
        };

        let removed = tenant::delete_tenant(db, found.id).await?;
        ctx.say(format!(
            "✅ Removed tenant **{}** and {removed} bill{}.",
            found.name,
            if removed == 1 { "" } else { "s" }
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
