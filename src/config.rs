//! Analytics configuration from environment variables

use chrono::NaiveDate;
use std::env;
use std::time::Duration;

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Which providers count as "active" in the system metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveProviderRule {
    /// At least one listing whose status is not Expired
    NonExpiredListing,
    /// At least one listing of any status
    AnyListing,
}

impl ActiveProviderRule {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim() {
            "non_expired_listing" => Ok(ActiveProviderRule::NonExpiredListing),
            "any_listing" => Ok(ActiveProviderRule::AnyListing),
            other => Err(ConfigError::InvalidValue(format!(
                "ACTIVE_PROVIDER_RULE must be non_expired_listing or any_listing, got {}",
                other
            ))),
        }
    }
}

/// Which receivers count as "active" in the system metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveReceiverRule {
    /// At least one claim, all time
    AnyClaim,
    /// At least one claim dated within the last N days of the report date
    ClaimedWithinDays(u32),
}

impl ActiveReceiverRule {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let s = s.trim();
        if s == "any_claim" {
            return Ok(ActiveReceiverRule::AnyClaim);
        }
        if let Some(days) = s.strip_prefix("claimed_within_days:") {
            return days
                .trim()
                .parse()
                .map(ActiveReceiverRule::ClaimedWithinDays)
                .map_err(|_| ConfigError::InvalidValue(format!("invalid day count in {}", s)));
        }
        Err(ConfigError::InvalidValue(format!(
            "ACTIVE_RECEIVER_RULE must be any_claim or claimed_within_days:<N>, got {}",
            s
        )))
    }
}

/// Configuration for the analytics engine
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Busy timeout applied to every store connection
    pub busy_timeout: Duration,

    pub active_provider_rule: ActiveProviderRule,

    pub active_receiver_rule: ActiveReceiverRule,

    /// Allowed drift of a distribution's percentage sum from 100
    pub percentage_sum_tolerance: f64,

    /// Horizon for "expiring soon" in the inventory overview
    pub expiring_soon_days: u32,

    /// Reference date for date-relative predicates
    pub as_of: NaiveDate,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            db_path: "data/food_wastage.db".to_string(),
            busy_timeout: Duration::from_millis(5_000),
            active_provider_rule: ActiveProviderRule::NonExpiredListing,
            active_receiver_rule: ActiveReceiverRule::AnyClaim,
            percentage_sum_tolerance: 0.1,
            expiring_soon_days: 2,
            as_of: chrono::Local::now().date_naive(),
        }
    }
}

fn parsed<T: std::str::FromStr>(var: &str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(format!("{} has invalid value {}", var, raw))),
        Err(_) => Ok(None),
    }
}

impl AnalyticsConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `FOODFLOW_DB_PATH` (default: data/food_wastage.db)
    /// - `STORE_BUSY_TIMEOUT_MS` (default: 5000)
    /// - `ACTIVE_PROVIDER_RULE` (default: non_expired_listing)
    /// - `ACTIVE_RECEIVER_RULE` (default: any_claim)
    /// - `PERCENTAGE_SUM_TOLERANCE` (default: 0.1)
    /// - `EXPIRING_SOON_DAYS` (default: 2)
    /// - `REPORT_AS_OF` as YYYY-MM-DD (default: today, local time)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let active_provider_rule = match env::var("ACTIVE_PROVIDER_RULE") {
            Ok(raw) => ActiveProviderRule::parse(&raw)?,
            Err(_) => defaults.active_provider_rule,
        };

        let active_receiver_rule = match env::var("ACTIVE_RECEIVER_RULE") {
            Ok(raw) => ActiveReceiverRule::parse(&raw)?,
            Err(_) => defaults.active_receiver_rule,
        };

        let percentage_sum_tolerance: f64 =
            parsed("PERCENTAGE_SUM_TOLERANCE")?.unwrap_or(defaults.percentage_sum_tolerance);
        if !percentage_sum_tolerance.is_finite() || percentage_sum_tolerance < 0.0 {
            return Err(ConfigError::InvalidValue(
                "PERCENTAGE_SUM_TOLERANCE must be a non-negative number".to_string(),
            ));
        }

        Ok(Self {
            db_path: env::var("FOODFLOW_DB_PATH").unwrap_or(defaults.db_path),
            busy_timeout: parsed("STORE_BUSY_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.busy_timeout),
            active_provider_rule,
            active_receiver_rule,
            percentage_sum_tolerance,
            expiring_soon_days: parsed("EXPIRING_SOON_DAYS")?.unwrap_or(defaults.expiring_soon_days),
            as_of: parsed("REPORT_AS_OF")?.unwrap_or(defaults.as_of),
        })
    }
}
