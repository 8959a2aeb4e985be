//! Client configuration.
//!
//! [`ClientConfig`] holds the poll-loop timing and the cloud density
//! strategy used by [`SimService`](crate::SimService). It is built once,
//! from defaults or the environment, and handed to the service.

use std::time::Duration;

use tracing::warn;

/// Default deadline of one poll loop.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default sleep when the host has nothing pending.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How [`SimService::get_cloud_density`](crate::SimService::get_cloud_density)
/// obtains its samples.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumString, strum::EnumIter,
)]
pub enum CloudDensityMode {
    /// Query the cloud grid in 500 ft bands from the surface to 10 000 ft.
    #[default]
    #[strum(serialize = "scan")]
    Scan,
    /// Ask whether the user aircraft is in cloud and synthesise one sample.
    #[strum(serialize = "in-cloud")]
    InCloudFallback,
}

/// Timing and strategy for service calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Deadline for each poll loop.
    pub timeout: Duration,
    /// Sleep between empty polls.
    pub poll_interval: Duration,
    /// Cloud density strategy.
    pub cloud_mode: CloudDensityMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cloud_mode: CloudDensityMode::default(),
        }
    }
}

impl ClientConfig {
    /// Build the configuration from environment variables.
    ///
    /// | Variable                   | Default | Description                      |
    /// |----------------------------|---------|----------------------------------|
    /// | `SIMLINK_TIMEOUT_MS`       | `10000` | Deadline per poll loop           |
    /// | `SIMLINK_POLL_INTERVAL_MS` | `10`    | Sleep when nothing is pending    |
    /// | `SIMLINK_CLOUD_MODE`       | `scan`  | `scan` or `in-cloud`             |
    ///
    /// Unparseable values are logged and replaced by the default.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let millis = |name: &str, default: Duration| {
            lookup(name)
                .and_then(|raw| match raw.trim().parse::<u64>() {
                    Ok(ms) => Some(Duration::from_millis(ms)),
                    Err(_) => {
                        warn!(variable = name, value = %raw, "ignoring invalid duration");
                        None
                    }
                })
                .unwrap_or(default)
        };

        let cloud_mode = lookup("SIMLINK_CLOUD_MODE")
            .and_then(|raw| match raw.trim().parse() {
                Ok(mode) => Some(mode),
                Err(_) => {
                    warn!(variable = "SIMLINK_CLOUD_MODE", value = %raw, "ignoring unknown cloud mode");
                    None
                }
            })
            .unwrap_or(defaults.cloud_mode);

        Self {
            timeout: millis("SIMLINK_TIMEOUT_MS", defaults.timeout),
            poll_interval: millis("SIMLINK_POLL_INTERVAL_MS", defaults.poll_interval),
            cloud_mode,
        }
    }
}
