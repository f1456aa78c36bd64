use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub redis: RedisConfig,
    pub reservation: ReservationRules,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReservationRules {
    /// How long a provisional hold survives without confirmation.
    #[serde(default = "default_hold_ttl")]
    pub hold_ttl_seconds: u64,
    /// Retention of a SOLD record; effectively permanent.
    #[serde(default = "default_sold_ttl")]
    pub sold_ttl_seconds: u64,
    /// Retention of an explicitly released seat before store eviction.
    #[serde(default = "default_release_ttl")]
    pub release_ttl_seconds: u64,
    /// Bounded wait for the seat lock on the pessimistic path.
    #[serde(default = "default_lock_wait")]
    pub lock_wait_seconds: u64,
    /// Lock lease; must exceed the critical-section duration.
    #[serde(default = "default_lock_lease")]
    pub lock_lease_seconds: u64,
    /// "optimistic" or "pessimistic".
    #[serde(default = "default_strategy")]
    pub strategy: String,
}

fn default_hold_ttl() -> u64 { 300 }
fn default_sold_ttl() -> u64 { 31_536_000 } // 1 year
fn default_release_ttl() -> u64 { 600 }
fn default_lock_wait() -> u64 { 5 }
fn default_lock_lease() -> u64 { 10 }
fn default_strategy() -> String { "optimistic".to_string() }

impl Default for ReservationRules {
    fn default() -> Self {
        Self {
            hold_ttl_seconds: default_hold_ttl(),
            sold_ttl_seconds: default_sold_ttl(),
            release_ttl_seconds: default_release_ttl(),
            lock_wait_seconds: default_lock_wait(),
            lock_lease_seconds: default_lock_lease(),
            strategy: default_strategy(),
        }
    }
}

impl ReservationRules {
    pub fn hold_ttl(&self) -> Duration {
        Duration::from_secs(self.hold_ttl_seconds)
    }

    pub fn sold_ttl(&self) -> Duration {
        Duration::from_secs(self.sold_ttl_seconds)
    }

    pub fn release_ttl(&self) -> Duration {
        Duration::from_secs(self.release_ttl_seconds)
    }

    pub fn lock_wait(&self) -> Duration {
        Duration::from_secs(self.lock_wait_seconds)
    }

    pub fn lock_lease(&self) -> Duration {
        Duration::from_secs(self.lock_lease_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_channel")]
    pub channel: String,
}

fn default_channel() -> String {
    "seat.sold".to_string()
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `PARTERRE_REDIS__URL` would set `redis.url`
            .add_source(config::Environment::with_prefix("PARTERRE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
