//! Runtime configuration loaded from environment variables.

use std::time::Duration;

use monitor::MonitorConfig;
use saga::SagaConfig;

/// Timing and logging configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `REFRESH_INTERVAL_SECS` — monitor hub refresh cycle (default: `60`)
/// - `SNAPSHOT_WAIT_SECS` — bounded saga wait for a resolved snapshot
///   (default: `60`)
/// - `IDLE_TIMEOUT_SECS` — how long a subscriber-less hub lingers before
///   shutting itself down (default: `300`)
/// - `SIGNATURE_WAIT_SECS` — how long a bid session waits for the external
///   signer; `0` or unset waits indefinitely
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub refresh_interval: Duration,
    pub snapshot_wait: Duration,
    pub idle_timeout: Duration,
    pub signature_wait: Option<Duration>,
    pub log_level: String,
}

fn env_secs(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            refresh_interval: env_secs("REFRESH_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.refresh_interval),
            snapshot_wait: env_secs("SNAPSHOT_WAIT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.snapshot_wait),
            idle_timeout: env_secs("IDLE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.idle_timeout),
            signature_wait: env_secs("SIGNATURE_WAIT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// The monitor hub timing this configuration implies.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            refresh_interval: self.refresh_interval,
            idle_timeout: self.idle_timeout,
        }
    }

    /// The saga timing this configuration implies.
    pub fn saga_config(&self) -> SagaConfig {
        SagaConfig {
            snapshot_wait: self.snapshot_wait,
            signature_wait: self.signature_wait,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(60),
            snapshot_wait: Duration::from_secs(60),
            idle_timeout: Duration::from_secs(300),
            signature_wait: None,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.refresh_interval, Duration::from_secs(60));
        assert_eq!(config.snapshot_wait, Duration::from_secs(60));
        assert_eq!(config.idle_timeout, Duration::from_secs(300));
        assert!(config.signature_wait.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_derived_configs_carry_the_timings() {
        let config = Config {
            refresh_interval: Duration::from_secs(5),
            snapshot_wait: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(20),
            signature_wait: Some(Duration::from_secs(30)),
            log_level: "debug".to_string(),
        };

        let monitor = config.monitor_config();
        assert_eq!(monitor.refresh_interval, Duration::from_secs(5));
        assert_eq!(monitor.idle_timeout, Duration::from_secs(20));

        let saga = config.saga_config();
        assert_eq!(saga.snapshot_wait, Duration::from_secs(10));
        assert_eq!(saga.signature_wait, Some(Duration::from_secs(30)));
    }
}
