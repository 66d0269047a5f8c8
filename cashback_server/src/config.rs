use std::{env, time::Duration as StdDuration};

use affiliate_tools::{ShopeeConfig, TikTokConfig};
use cashback_engine::{LedgerConfig, DEFAULT_CASHBACK_RATE, DEFAULT_ESTIMATE_SHARE};
use cbk_common::{helpers::parse_boolean_flag, Rate};
use chrono::Duration;
use log::*;

const DEFAULT_CBK_DATABASE_URL: &str = "sqlite://data/cashback.db";
const DEFAULT_SYNC_INTERVAL: Duration = Duration::minutes(30);
const DEFAULT_SYNC_LOOKBACK: Duration = Duration::hours(7 * 24);
const DEFAULT_HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(15);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub ledger: LedgerConfig,
    /// The share of a product's commission shown to users as the expected cashback when they convert a link.
    pub estimate_share: Rate,
    /// Time between scheduled syncs.
    pub sync_interval: Duration,
    /// How far back each sync asks the marketplaces for orders.
    pub sync_lookback: Duration,
    pub shopee_enabled: bool,
    pub tiktok_enabled: bool,
    pub shopee: ShopeeConfig,
    pub tiktok: TikTokConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_CBK_DATABASE_URL.to_string(),
            ledger: LedgerConfig::default(),
            estimate_share: DEFAULT_ESTIMATE_SHARE,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            sync_lookback: DEFAULT_SYNC_LOOKBACK,
            shopee_enabled: true,
            tiktok_enabled: true,
            shopee: ShopeeConfig::default(),
            tiktok: TikTokConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("CBK_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CBK_DATABASE_URL is not set. Using {DEFAULT_CBK_DATABASE_URL}");
            DEFAULT_CBK_DATABASE_URL.to_string()
        });
        let cashback_rate = rate_from_env("CBK_CASHBACK_RATE", DEFAULT_CASHBACK_RATE);
        let estimate_share = rate_from_env("CBK_ESTIMATE_SHARE", DEFAULT_ESTIMATE_SHARE);
        let sync_interval = duration_from_env("CBK_SYNC_INTERVAL_MINS", DEFAULT_SYNC_INTERVAL, Duration::minutes);
        let sync_lookback = duration_from_env("CBK_SYNC_LOOKBACK_DAYS", DEFAULT_SYNC_LOOKBACK, Duration::days);
        let timeout = env::var("CBK_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ {s} is not a valid value for CBK_HTTP_TIMEOUT_SECS. {e}. Using the default"))
                    .ok()
            })
            .filter(|secs| *secs > 0)
            .map(StdDuration::from_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT);
        let shopee_enabled = parse_boolean_flag(env::var("CBK_SHOPEE_ENABLED").ok(), true);
        let tiktok_enabled = parse_boolean_flag(env::var("CBK_TIKTOK_ENABLED").ok(), true);
        let shopee = ShopeeConfig { timeout, ..ShopeeConfig::new_from_env_or_default() };
        let tiktok = TikTokConfig { timeout, ..TikTokConfig::new_from_env_or_default() };
        info!(
            "🪛️ Cashback rate {cashback_rate}, estimate share {estimate_share}, sync every {} min over the last {} days",
            sync_interval.num_minutes(),
            sync_lookback.num_days()
        );
        Self {
            database_url,
            ledger: LedgerConfig { cashback_rate },
            estimate_share,
            sync_interval,
            sync_lookback,
            shopee_enabled,
            tiktok_enabled,
            shopee,
            tiktok,
        }
    }
}

/// Rates are given as fractions (`0.7`) or percentages (`70%`). They must lie within `[0, 1]`.
fn rate_from_env(name: &str, default: Rate) -> Rate {
    let Ok(value) = env::var(name) else {
        info!("🪛️ {name} is not set. Using the default of {default}");
        return default;
    };
    match value.parse::<Rate>() {
        Ok(rate) if rate.bps() <= cbk_common::BASIS_POINTS_PER_UNIT => rate,
        Ok(rate) => {
            error!("🪛️ {name} must not be more than 100%, but is {rate}. Using the default of {default}");
            default
        },
        Err(e) => {
            error!("🪛️ {value} is not a valid value for {name}. {e}. Using the default of {default}");
            default
        },
    }
}

fn duration_from_env(name: &str, default: Duration, unit: fn(i64) -> Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|s| match s.parse::<i64>() {
            Ok(v) if v > 0 => Some(unit(v)),
            _ => {
                error!("🪛️ {s} is not a valid value for {name}. Using the default");
                None
            },
        })
        .unwrap_or(default)
}
