//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Rental engine tuning knobs.
    #[serde(default)]
    pub engine: EngineSettings,
}

/// Rental engine settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Discounts at or below this percentage of the rental subtotal
    /// apply without a privileged approval.
    #[serde(default = "default_discount_auto_approve_percent")]
    pub discount_auto_approve_percent: Decimal,
    /// Multiplier applied to the daily rate when charging late fees.
    #[serde(default = "default_late_fee_multiplier")]
    pub late_fee_multiplier: Decimal,
    /// Prefix for human-facing rental contract numbers.
    #[serde(default = "default_rental_number_prefix")]
    pub rental_number_prefix: String,
}

fn default_discount_auto_approve_percent() -> Decimal {
    Decimal::new(10, 0)
}

fn default_late_fee_multiplier() -> Decimal {
    Decimal::new(15, 1) // 1.5
}

fn default_rental_number_prefix() -> String {
    "R".to_string()
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            discount_auto_approve_percent: default_discount_auto_approve_percent(),
            late_fee_multiplier: default_late_fee_multiplier(),
            rental_number_prefix: default_rental_number_prefix(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("RENTARA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
