use std::{str::FromStr, time::Duration};

use anyhow::Context;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use uuid::{NoContext, Timestamp};

pub mod entities;
pub mod locks;
pub mod services;

pub const ONE_HUNDRED: Decimal = dec!(100);

#[derive(Clone, Debug, Default)]
pub struct MenucostConfig {
    pub pricing: PricingConfig,
    pub price_source: PriceSourceConfig,
}

#[derive(Clone, Debug)]
pub struct PricingConfig {
    /// Upper bound for a single price-source fetch inside a scheduled check.
    pub price_source_timeout: Duration,
    pub max_concurrent_checks: usize,
    pub history_page_size: usize,
    /// Offset of the business time zone used for offer validity, in minutes east of UTC.
    pub business_utc_offset_minutes: i32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            price_source_timeout: Duration::from_secs(10),
            max_concurrent_checks: 4,
            history_page_size: 100,
            business_utc_offset_minutes: 330,
        }
    }
}

impl PricingConfig {
    pub fn business_zone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.business_utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Clone, Debug)]
pub struct PriceSourceConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
}

impl Default for PriceSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(8),
        }
    }
}

impl MenucostConfig {
    /// Builds the configuration from `MENUCOST_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let defaults = Self::default();

        let offset_minutes: i32 = env_or(
            "MENUCOST_UTC_OFFSET_MINUTES",
            defaults.pricing.business_utc_offset_minutes,
        )?;
        if FixedOffset::east_opt(offset_minutes * 60).is_none() {
            anyhow::bail!("MENUCOST_UTC_OFFSET_MINUTES out of range: {offset_minutes}");
        }

        let max_concurrent_checks: usize = env_or(
            "MENUCOST_MAX_CONCURRENT_CHECKS",
            defaults.pricing.max_concurrent_checks,
        )?;
        let history_page_size: usize =
            env_or("MENUCOST_HISTORY_PAGE_SIZE", defaults.pricing.history_page_size)?;

        Ok(Self {
            pricing: PricingConfig {
                price_source_timeout: Duration::from_secs(env_or(
                    "MENUCOST_PRICE_SOURCE_TIMEOUT_SECS",
                    defaults.pricing.price_source_timeout.as_secs(),
                )?),
                max_concurrent_checks: max_concurrent_checks.max(1),
                history_page_size: history_page_size.max(1),
                business_utc_offset_minutes: offset_minutes,
            },
            price_source: PriceSourceConfig {
                endpoint: std::env::var("MENUCOST_PRICE_SOURCE_URL")
                    .unwrap_or(defaults.price_source.endpoint),
                api_key: std::env::var("MENUCOST_PRICE_SOURCE_API_KEY").ok(),
                request_timeout: Duration::from_secs(env_or(
                    "MENUCOST_PRICE_SOURCE_REQUEST_TIMEOUT_SECS",
                    defaults.price_source.request_timeout.as_secs(),
                )?),
            },
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw}")),
        Err(_) => Ok(default),
    }
}

pub fn generate_timestamp() -> (DateTime<Utc>, Timestamp) {
    let now = Utc::now();
    let seconds = now.timestamp().try_into().unwrap_or(0);
    let timestamp = Timestamp::from_unix(NoContext, seconds, now.timestamp_subsec_nanos());

    (now, timestamp)
}

/// Rounds a monetary amount to 2 decimal places, half-up.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a percentage to 2 decimal places, half-up.
pub fn round_percentage(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Percentage change from `old` to `new`, `None` when `old` is zero.
pub fn percentage_change(old: Decimal, new: Decimal) -> Option<Decimal> {
    (new - old)
        .checked_div(old)
        .and_then(|ratio| ratio.checked_mul(ONE_HUNDRED))
}

/// `base * percentage / 100`.
pub fn percentage_of(base: Decimal, percentage: Decimal) -> Decimal {
    base * percentage / ONE_HUNDRED
}
