use std::{collections::BTreeMap, path::PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fintrack_core::{currency::DEFAULT_BASE_CURRENCY, default_rates, CurrencyConverter, ReminderFilter};
use fintrack_domain::{BudgetPeriod, CurrencyCode};

use crate::ConfigError;

/// Engine-wide settings shared by every component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "Config::default_base_currency")]
    pub base_currency: CurrencyCode,
    /// Units of the base currency per one unit of each code.
    #[serde(default = "default_rates")]
    pub exchange_rates: BTreeMap<CurrencyCode, Decimal>,
    #[serde(default = "Config::default_forecast_horizon")]
    pub forecast_horizon_days: u32,
    #[serde(default)]
    pub budgeting_period: BudgetPeriod,
    #[serde(default = "Config::default_budgeting_start_day")]
    pub budgeting_start_day: u32,
    #[serde(default = "Config::default_allow_backdated_edits")]
    pub allow_backdated_edits: bool,
    #[serde(default)]
    pub reminders: ReminderSettings,
    /// Contact record that represents the current user in contact summaries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_contact_id: Option<Uuid>,
    /// `tracing` filter directive, e.g. `fintrack_engine=debug`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for record files. Defaults to the platform data dir.
    pub data_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_currency: Self::default_base_currency(),
            exchange_rates: default_rates(),
            forecast_horizon_days: Self::default_forecast_horizon(),
            budgeting_period: BudgetPeriod::default(),
            budgeting_start_day: Self::default_budgeting_start_day(),
            allow_backdated_edits: Self::default_allow_backdated_edits(),
            reminders: ReminderSettings::default(),
            self_contact_id: None,
            log_filter: None,
            data_root: None,
        }
    }
}

impl Config {
    pub fn default_base_currency() -> CurrencyCode {
        CurrencyCode::new(DEFAULT_BASE_CURRENCY)
    }

    pub fn default_forecast_horizon() -> u32 {
        30
    }

    pub fn default_budgeting_start_day() -> u32 {
        1
    }

    pub fn default_allow_backdated_edits() -> bool {
        true
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_currency.is_empty() {
            return Err(ConfigError::Invalid("base currency is required".into()));
        }
        if !self.exchange_rates.contains_key(&self.base_currency) {
            return Err(ConfigError::Invalid(format!(
                "base currency {} has no exchange rate",
                self.base_currency
            )));
        }
        if let Some((code, rate)) = self
            .exchange_rates
            .iter()
            .find(|(_, rate)| **rate <= Decimal::ZERO)
        {
            return Err(ConfigError::Invalid(format!(
                "exchange rate for {code} must be positive, got {rate}"
            )));
        }
        if self.forecast_horizon_days == 0 {
            return Err(ConfigError::Invalid("forecast horizon must be at least one day".into()));
        }
        if !(1..=31).contains(&self.budgeting_start_day) {
            return Err(ConfigError::Invalid("budgeting start day must be between 1 and 31".into()));
        }
        Ok(())
    }

    /// Converter over the configured rate table.
    pub fn converter(&self) -> CurrencyConverter {
        CurrencyConverter::new(
            self.base_currency.clone(),
            self.exchange_rates
                .iter()
                .map(|(code, rate)| (code.clone(), *rate)),
        )
    }

    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(path) = &self.data_root {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("fintrack")
    }
}

/// Which upcoming obligations callers should surface as reminders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderSettings {
    #[serde(default = "enabled")]
    pub credit_card_due: bool,
    #[serde(default = "enabled")]
    pub loan_payments: bool,
    #[serde(default = "enabled")]
    pub bill_splits: bool,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            credit_card_due: true,
            loan_payments: true,
            bill_splits: true,
        }
    }
}

impl ReminderSettings {
    pub fn filter(&self) -> ReminderFilter {
        ReminderFilter {
            credit_card_due: self.credit_card_due,
            loan_payments: self.loan_payments,
            bill_splits: self.bill_splits,
        }
    }
}

fn enabled() -> bool {
    true
}
