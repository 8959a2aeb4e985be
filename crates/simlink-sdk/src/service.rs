//! The public query surface.
//!
//! [`SimService`] wraps a [`SimClient`] and a [`ClientConfig`], so callers
//! pass only identifiers: timeouts, poll interval and the cloud strategy
//! come from the configuration.

use std::collections::{BTreeMap, BTreeSet};

use simlink_models::{clean_codes, CloudDensitySample, FacilityCode, FrequencyRecord, Weather};
use tracing::{info, warn};

use crate::client::SimClient;
use crate::clock::{Clock, SystemClock};
use crate::config::{ClientConfig, CloudDensityMode};
use crate::connection::Connection;
use crate::error::SdkError;

/// Facility and weather queries with configured timeouts.
pub struct SimService<C, K = SystemClock> {
    client: SimClient<C, K>,
    config: ClientConfig,
}

impl<C: Connection> SimService<C> {
    /// A service on the wall clock.
    pub fn new(connection: C, config: ClientConfig) -> Self {
        Self::from_client(SimClient::new(connection), config)
    }
}

impl<C: Connection, K: Clock> SimService<C, K> {
    /// Wrap an existing client. The client's poll interval is replaced by
    /// the configured one.
    pub fn from_client(client: SimClient<C, K>, config: ClientConfig) -> Self {
        Self {
            client: client.with_poll_interval(config.poll_interval),
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The wrapped client.
    pub fn client(&self) -> &SimClient<C, K> {
        &self.client
    }

    /// Mutable access to the wrapped client, for operations without a
    /// service-level wrapper.
    pub fn client_mut(&mut self) -> &mut SimClient<C, K> {
        &mut self.client
    }

    /// Give back the connection.
    pub fn into_inner(self) -> C {
        self.client.into_inner()
    }

    /// Radio frequencies of one airport, in the order the host sent them.
    pub fn get_frequency(&mut self, code: &str) -> Result<Vec<FrequencyRecord>, SdkError> {
        self.client.airport_frequencies(code, self.config.timeout)
    }

    /// Current weather for each station.
    pub fn get_weather<S: AsRef<str>>(
        &mut self,
        codes: &[S],
    ) -> Result<BTreeMap<FacilityCode, Weather>, SdkError> {
        self.client.weather(codes, self.config.timeout)
    }

    /// Cloud density samples for each airport, ordered by altitude.
    ///
    /// Airports are first resolved to coordinates; codes the host has no
    /// position for are skipped. Each remaining airport is then sampled
    /// according to [`ClientConfig::cloud_mode`].
    pub fn get_cloud_density<S: AsRef<str>>(
        &mut self,
        codes: &[S],
    ) -> Result<BTreeMap<FacilityCode, Vec<CloudDensitySample>>, SdkError> {
        let codes = clean_codes(codes)?;
        let timeout = self.config.timeout;
        let positions = self.client.waypoint_coordinates(&codes, timeout)?;

        let mut density = BTreeMap::new();
        let mut seen = BTreeSet::new();
        for code in &codes {
            if !seen.insert(code) {
                continue;
            }
            let Some(position) = positions.get(code) else {
                warn!(code = %code, "no coordinates for code; skipping cloud density");
                continue;
            };

            let samples = match self.config.cloud_mode {
                CloudDensityMode::Scan => self.client.cloud_density_scan(*position, timeout)?,
                CloudDensityMode::InCloudFallback => {
                    let in_cloud = self.client.user_aircraft_in_cloud(timeout)?;
                    vec![CloudDensitySample::from_in_cloud(in_cloud)]
                }
            };
            info!(code = %code, mode = %self.config.cloud_mode, samples = samples.len(), "cloud density sampled");
            density.insert(code.clone(), samples);
        }
        Ok(density)
    }
}
