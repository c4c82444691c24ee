use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub request_timeout_secs: u64,
    pub default_availability_days: u32,
    pub max_availability_days: u32,
    pub reminder_interval_secs: u64,
    pub reminder_dispatch_timeout_secs: u64,
    pub reminder_max_attempts: u32,
    pub seed_demo_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 10,
            default_availability_days: 7,
            max_availability_days: 31,
            reminder_interval_secs: 300,
            reminder_dispatch_timeout_secs: 10,
            reminder_max_attempts: 3,
            seed_demo_data: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            bind_addr: env::var("BOOKIT_BIND_ADDR")
                .unwrap_or_else(|_| {
                    warn!("BOOKIT_BIND_ADDR not set, using default {}", defaults.bind_addr);
                    defaults.bind_addr.clone()
                }),
            request_timeout_secs: parse_or(
                "BOOKIT_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            ),
            default_availability_days: parse_or(
                "BOOKIT_DEFAULT_AVAILABILITY_DAYS",
                defaults.default_availability_days,
            ),
            max_availability_days: parse_or(
                "BOOKIT_MAX_AVAILABILITY_DAYS",
                defaults.max_availability_days,
            ),
            reminder_interval_secs: parse_or(
                "BOOKIT_REMINDER_INTERVAL_SECS",
                defaults.reminder_interval_secs,
            ),
            reminder_dispatch_timeout_secs: parse_or(
                "BOOKIT_REMINDER_DISPATCH_TIMEOUT_SECS",
                defaults.reminder_dispatch_timeout_secs,
            ),
            reminder_max_attempts: parse_or(
                "BOOKIT_REMINDER_MAX_ATTEMPTS",
                defaults.reminder_max_attempts,
            ),
            seed_demo_data: parse_or("BOOKIT_SEED_DEMO", defaults.seed_demo_data),
        };

        if !config.is_consistent() {
            warn!(
                "BOOKIT_DEFAULT_AVAILABILITY_DAYS ({}) exceeds BOOKIT_MAX_AVAILABILITY_DAYS ({})",
                config.default_availability_days, config.max_availability_days
            );
        }

        config
    }

    pub fn is_consistent(&self) -> bool {
        self.default_availability_days >= 1
            && self.default_availability_days <= self.max_availability_days
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reminder_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_interval_secs)
    }

    pub fn reminder_dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.reminder_dispatch_timeout_secs)
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
