//! Application settings loaded from `config.toml`.
//!
//! The file is optional. It sets the accepted year range, default fees used
//! when a bot command leaves them out, and the tenants seeded on startup.
//!
//! ```toml
//! [calendar]
//! first_year = 2080
//! last_year = 2089
//!
//! [defaults]
//! rent = 8000.0
//! water = 300.0
//! waste = 100.0
//! electricity_rate = 12.0
//!
//! [[tenants]]
//! name = "Ram"
//! ```

use crate::core::calendar::YearRange;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Accepted billing years
    #[serde(default)]
    pub calendar: YearRange,
    /// Fallback charges for bill submissions
    #[serde(default)]
    pub defaults: BillDefaults,
    /// Tenants to create on startup
    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
}

/// Default charges applied when a submission omits them.
#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct BillDefaults {
    /// Monthly rent
    pub rent: Option<f64>,
    /// Monthly water fee
    pub water: Option<f64>,
    /// Monthly waste fee
    pub waste: Option<f64>,
    /// Price per electricity unit
    pub electricity_rate: Option<f64>,
    /// Monthly internet charge
    pub internet_rate: Option<f64>,
}

/// Configuration for a single seeded tenant
#[derive(Debug, Deserialize, Clone)]
pub struct TenantConfig {
    /// Display name of the tenant
    pub name: String,
    /// Discord user ID, if the tenant uses the bot
    #[serde(default)]
    pub discord_user_id: Option<String>,
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - The year range is empty
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    debug!("Loading settings from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_settings(&contents)
}

/// Parses settings from TOML text and checks them.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if settings.calendar.first_year > settings.calendar.last_year {
        return Err(Error::Config {
            message: format!(
                "calendar.first_year ({}) is after calendar.last_year ({})",
                settings.calendar.first_year, settings.calendar.last_year
            ),
        });
    }

    Ok(settings)
}

/// Loads settings from the default location (./config.toml)
///
/// A missing file is not an error; built-in defaults are used instead.
pub fn load_default_settings() -> Result<Settings> {
    let path = Path::new("config.toml");
    if !path.exists() {
        info!("No config.toml found, using built-in defaults.");
        return Ok(Settings::default());
    }
    load_settings(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
            [calendar]
            first_year = 2081
            last_year = 2085

            [defaults]
            rent = 8000.0
            water = 300.0
            electricity_rate = 12.5

            [[tenants]]
            name = "Ram"

            [[tenants]]
            name = "Sita"
            discord_user_id = "1234"
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.calendar.first_year, 2081);
        assert_eq!(settings.calendar.last_year, 2085);
        assert_eq!(settings.defaults.rent, Some(8000.0));
        assert_eq!(settings.defaults.waste, None);
        assert_eq!(settings.defaults.electricity_rate, Some(12.5));
        assert_eq!(settings.tenants.len(), 2);
        assert_eq!(settings.tenants[1].discord_user_id.as_deref(), Some("1234"));
    }

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings.calendar, YearRange::default());
        assert_eq!(settings.defaults, BillDefaults::default());
        assert!(settings.tenants.is_empty());
    }

    #[test]
    fn test_inverted_year_range_is_rejected() {
        let toml_str = r"
            [calendar]
            first_year = 2090
            last_year = 2080
        ";
        assert!(matches!(
            parse_settings(toml_str),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        assert!(matches!(
            parse_settings("[calendar\nfirst_year = "),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        assert!(matches!(
            load_settings("definitely/not/here.toml"),
            Err(Error::Config { .. })
        ));
    }
}
