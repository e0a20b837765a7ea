//! Replication runtime configuration.

use std::time::Duration;

use anyerror::AnyError;
use clap::Parser;

use crate::config::errors::ConfigError;

/// The largest accepted `max_backoff_exponent`.
///
/// With the default 50 ms heartbeat this already spans more than 14 hours
/// between two attempts.
const MAX_BACKOFF_EXPONENT: u32 = 20;

/// The runtime configuration shared by all peers of a leader.
///
/// The heartbeat interval is only the *base* interval: a peer that stops
/// answering is retried after `heartbeat_interval * 2^failed_heartbeats`,
/// where the exponent is capped by `max_backoff_exponent`. The first reply
/// from the peer, accepted or rejected, brings it back to the base interval.
///
/// Keep the heartbeat interval well below the election timeout of the
/// followers, or they will start an election between two heartbeats.
#[derive(Clone, Debug, Parser)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Config {
    /// The base heartbeat interval in milliseconds at which a leader
    /// replicates to each peer.
    #[clap(long, default_value = "50")]
    pub heartbeat_interval: u64,

    /// The maximum number of log entries carried by one append-entries
    /// request.
    #[clap(long, default_value = "2000")]
    pub max_payload_entries: u64,

    /// The cap on the exponent of the heartbeat back-off.
    #[clap(long, default_value = "10")]
    pub max_backoff_exponent: u32,

    /// Timeout in milliseconds of a single vote request.
    ///
    /// `0` disables it, and the time a vote may take is then bounded only by
    /// the transport.
    #[clap(long, default_value = "0")]
    pub vote_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        <Self as Parser>::parse_from(Vec::<&'static str>::new())
    }
}

impl Config {
    /// The base heartbeat interval as a `Duration`.
    pub fn heartbeat_duration(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval)
    }

    /// The vote timeout, or `None` if it is disabled.
    pub fn vote_timeout_duration(&self) -> Option<Duration> {
        if self.vote_timeout == 0 {
            None
        } else {
            Some(Duration::from_millis(self.vote_timeout))
        }
    }

    /// Build a `Config` instance from a series of command line arguments.
    ///
    /// The first element in `args` must be the application name.
    pub fn build(args: &[&str]) -> Result<Config, ConfigError> {
        let config = <Self as Parser>::try_parse_from(args).map_err(|e| {
            ConfigError::ParseError {
                source: AnyError::from(&e),
                args: args.iter().map(|x| x.to_string()).collect(),
            }
        })?;
        config.validate()
    }

    /// Validate the state of this config.
    pub fn validate(self) -> Result<Config, ConfigError> {
        if self.heartbeat_interval == 0 {
            return Err(ConfigError::HeartbeatInterval);
        }

        if self.max_payload_entries == 0 {
            return Err(ConfigError::MaxPayloadEntries);
        }

        if self.max_backoff_exponent > MAX_BACKOFF_EXPONENT {
            return Err(ConfigError::MaxBackoffExponent {
                exponent: self.max_backoff_exponent,
                max: MAX_BACKOFF_EXPONENT,
            });
        }

        Ok(self)
    }
}
