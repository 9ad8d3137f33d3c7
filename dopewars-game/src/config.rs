//! Session economy configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    CARRY_CAPACITY_KG, DEFAULT_PLAYER_NAME, EVENT_LOG_CAPACITY, STARTING_BANK, STARTING_CASH,
    STARTING_DEBT, TOTAL_DAYS,
};

/// Errors raised when economy configuration invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("a run needs at least one day (got {0})")]
    NoDays(u32),
    #[error("daily interest rate must be between 0 and 1 (got {0})")]
    InterestRate(f64),
    #[error("event log capacity must be at least 1")]
    EventLogCapacity,
    #[error("carry capacity must be positive (got {0:.2} kg)")]
    CarryCapacity(f64),
    #[error("economy config is not valid JSON: {0}")]
    Json(String),
}

/// Starting balances and tuning knobs for a session.
///
/// `daily_interest_rate` is off by default: debt only changes when the player
/// pays it down. Setting it accrues interest on every non-final day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomyConfig {
    #[serde(default = "EconomyConfig::default_starting_cash")]
    pub starting_cash: u64,
    #[serde(default = "EconomyConfig::default_starting_bank")]
    pub starting_bank: u64,
    #[serde(default = "EconomyConfig::default_starting_debt")]
    pub starting_debt: u64,
    #[serde(default = "EconomyConfig::default_total_days")]
    pub total_days: u32,
    #[serde(default)]
    pub daily_interest_rate: Option<f64>,
    #[serde(default = "EconomyConfig::default_event_log_capacity")]
    pub event_log_capacity: usize,
    #[serde(default = "EconomyConfig::default_player_name")]
    pub default_player_name: String,
    #[serde(default = "EconomyConfig::default_carry_capacity_kg")]
    pub carry_capacity_kg: f64,
}

impl EconomyConfig {
    const fn default_starting_cash() -> u64 {
        STARTING_CASH
    }

    const fn default_starting_bank() -> u64 {
        STARTING_BANK
    }

    const fn default_starting_debt() -> u64 {
        STARTING_DEBT
    }

    const fn default_total_days() -> u32 {
        TOTAL_DAYS
    }

    const fn default_event_log_capacity() -> usize {
        EVENT_LOG_CAPACITY
    }

    fn default_player_name() -> String {
        DEFAULT_PLAYER_NAME.to_string()
    }

    const fn default_carry_capacity_kg() -> f64 {
        CARRY_CAPACITY_KG
    }

    /// Same defaults with daily interest accrual switched on.
    #[must_use]
    pub fn with_interest(mut self, daily_rate: f64) -> Self {
        self.daily_interest_rate = Some(daily_rate);
        self
    }

    /// Check every knob against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_days == 0 {
            return Err(ConfigError::NoDays(self.total_days));
        }
        if let Some(rate) = self.daily_interest_rate
            && !(rate.is_finite() && (0.0..=1.0).contains(&rate))
        {
            return Err(ConfigError::InterestRate(rate));
        }
        if self.event_log_capacity == 0 {
            return Err(ConfigError::EventLogCapacity);
        }
        if !(self.carry_capacity_kg.is_finite() && self.carry_capacity_kg > 0.0) {
            return Err(ConfigError::CarryCapacity(self.carry_capacity_kg));
        }
        Ok(())
    }

    /// Parse and validate a config document; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or validation fails.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Json(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_cash: Self::default_starting_cash(),
            starting_bank: Self::default_starting_bank(),
            starting_debt: Self::default_starting_debt(),
            total_days: Self::default_total_days(),
            daily_interest_rate: None,
            event_log_capacity: Self::default_event_log_capacity(),
            default_player_name: Self::default_player_name(),
            carry_capacity_kg: Self::default_carry_capacity_kg(),
        }
    }
}
