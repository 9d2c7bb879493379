use std::env;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use chrono::{FixedOffset, Offset, Utc};

use crate::constants::{
    DEFAULT_ACCESS_TOKEN_HOURS, DEFAULT_DEMO_CLASSROOM, DEFAULT_REFRESH_TOKEN_HOURS,
    DEFAULT_UTC_OFFSET_MINUTES,
};

#[derive(Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub jwt: JwtConfig,
    pub cors_origin: String,
    pub demo_classroom: String,
    pub metrics_utc_offset_minutes: i32,
}

#[derive(Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_expires_in_hours: u64,
    pub refresh_expires_in_hours: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("enable_file_logs", &self.enable_file_logs)
            .field("log_dir", &self.log_dir)
            .field("sled_path", &self.sled_path)
            .field("jwt", &self.jwt)
            .field("cors_origin", &self.cors_origin)
            .field("demo_classroom", &self.demo_classroom)
            .field("metrics_utc_offset_minutes", &self.metrics_utc_offset_minutes)
            .finish()
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"***REDACTED***")
            .field("refresh_secret", &"***REDACTED***")
            .field("access_expires_in_hours", &self.access_expires_in_hours)
            .field("refresh_expires_in_hours", &self.refresh_expires_in_hours)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/classroom.sled"),
            jwt: JwtConfig {
                access_secret: env_or(
                    "JWT_SECRET",
                    "change_me_to_random_64_chars_change_me_to_random_64_chars",
                ),
                refresh_secret: env_or(
                    "JWT_REFRESH_SECRET",
                    "change_me_to_another_random_64_chars_change_me_to_another",
                ),
                access_expires_in_hours: env_or_parse(
                    "JWT_EXPIRES_IN_HOURS",
                    DEFAULT_ACCESS_TOKEN_HOURS,
                ),
                refresh_expires_in_hours: env_or_parse(
                    "JWT_REFRESH_EXPIRES_IN_HOURS",
                    DEFAULT_REFRESH_TOKEN_HOURS,
                ),
            },
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            demo_classroom: env_or("DEMO_CLASSROOM", DEFAULT_DEMO_CLASSROOM),
            metrics_utc_offset_minutes: env_or_parse(
                "METRICS_UTC_OFFSET_MINUTES",
                DEFAULT_UTC_OFFSET_MINUTES,
            ),
        }
    }

    /// Offset all calendar bucketing happens in. Out-of-range values fall back to UTC.
    pub fn metrics_offset(&self) -> FixedOffset {
        let seconds = self.metrics_utc_offset_minutes.saturating_mul(60);
        match FixedOffset::east_opt(seconds) {
            Some(offset) => offset,
            None => {
                tracing::warn!(
                    minutes = self.metrics_utc_offset_minutes,
                    "Metrics UTC offset out of range, using UTC"
                );
                Utc.fix()
            }
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
