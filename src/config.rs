use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::utils::calendar::FacilityClock;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_scan_per_min: u32,
    pub rate_protected_per_min: u32,

    /// Minutes east of UTC for the facility's wall clock
    pub facility_utc_offset_minutes: i32,
    /// Facility-local time of the daily absentee sweep
    pub sweep_at: NaiveTime,
    pub person_cache_ttl: Duration,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{} must be set", key))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{} has an invalid value {:?}: {}", key, raw, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let sweep_at = match env::var("SWEEP_AT") {
            Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                .with_context(|| format!("SWEEP_AT must be HH:MM, got {:?}", raw))?,
            Err(_) => NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
        };

        let config = Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_scan_per_min: parsed_or("RATE_SCAN_PER_MIN", 600)?,
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            facility_utc_offset_minutes: parsed_or("FACILITY_UTC_OFFSET_MINUTES", 0)?,
            sweep_at,
            person_cache_ttl: Duration::from_secs(parsed_or("PERSON_CACHE_TTL_SECS", 60)?),
        };

        // fail at startup rather than on the first scan
        config.clock()?;
        Ok(config)
    }

    pub fn clock(&self) -> Result<FacilityClock> {
        FacilityClock::from_offset_minutes(self.facility_utc_offset_minutes).ok_or_else(|| {
            anyhow!(
                "FACILITY_UTC_OFFSET_MINUTES out of range: {}",
                self.facility_utc_offset_minutes
            )
        })
    }
}
