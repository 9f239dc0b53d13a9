//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggests tenant names and calendar months as the user types, so command
//! arguments match what the core layer expects.

use crate::{
    bot::BotData,
    core::{calendar::Month, tenant},
    errors::Error,
};

/// Discord caps autocomplete suggestions at 25 entries.
const MAX_SUGGESTIONS: usize = 25;

/// Provides autocomplete suggestions for tenant names.
///
/// Matches are case-insensitive substrings of the stored name, sorted
/// alphabetically. A database error yields no suggestions.
pub async fn autocomplete_tenant_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;

    let Ok(tenants) = tenant::get_all_tenants(db).await else {
        return Vec::new();
    };

    filter_names(tenants.into_iter().map(|t| t.name), partial)
}

/// Provides autocomplete suggestions for month labels, in calendar order.
pub async fn autocomplete_month(
    _ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    matching_months(partial)
}

fn matching_months(partial: &str) -> Vec<String> {
    let partial_lower = partial.trim().to_lowercase();
    Month::ALL
        .iter()
        .filter(|m| m.name().to_lowercase().contains(&partial_lower))
        .map(|m| m.name().to_string())
        .collect()
}

fn filter_names(names: impl Iterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.trim().to_lowercase();
    // Already sorted by name from the database
    names
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .take(MAX_SUGGESTIONS)
        .collect()
}
