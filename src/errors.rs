//! Unified error type for `RentBuddy`.
//!
//! Every layer returns [`Result`]; the bot layer renders the `Display` text of
//! these variants straight back to the user.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("An entry for {month} {year} already exists")]
    DuplicateEntry { month: String, year: i32 },

    #[error(
        "Failed to save the bill for {month} {year} ({committed} earlier update(s) were already saved): {source}"
    )]
    PersistenceFailure {
        month: String,
        year: i32,
        committed: usize,
        #[source]
        source: sea_orm::DbErr,
    },

    #[error("Tenant not found: {name}")]
    TenantNotFound { name: String },

    #[error("Tenant already exists: {name}")]
    TenantExists { name: String },

    #[error("Bill not found: {id}")]
    BillNotFound { id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl Error {
    /// Shorthand for building an [`Error::InvalidInput`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_entry_message_names_period() {
        let err = Error::DuplicateEntry {
            month: "Baisakh".to_string(),
            year: 2081,
        };
        assert_eq!(err.to_string(), "An entry for Baisakh 2081 already exists");
    }

    #[test]
    fn test_persistence_failure_reports_committed_count() {
        let err = Error::PersistenceFailure {
            month: "Magh".to_string(),
            year: 2080,
            committed: 2,
            source: sea_orm::DbErr::Custom("disk full".to_string()),
        };
        let text = err.to_string();
        assert!(text.contains("Magh 2080"));
        assert!(text.contains("2 earlier update(s)"));
        assert!(text.contains("disk full"));
    }
}
