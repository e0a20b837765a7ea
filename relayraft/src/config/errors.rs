use anyerror::AnyError;

/// Error variants related to configuration.
#[derive(Debug, thiserror::Error)]
#[derive(PartialEq, Eq)]
pub enum ConfigError {
    #[error("ParseError: {source} while parsing ({args:?})")]
    ParseError { source: AnyError, args: Vec<String> },

    #[error("heartbeat_interval must be > 0")]
    HeartbeatInterval,

    #[error("max_payload_entries must be > 0")]
    MaxPayloadEntries,

    /// The back-off exponent is large enough to make a peer unreachable
    /// for practical purposes.
    #[error("max_backoff_exponent({exponent}) must be <= {max}")]
    MaxBackoffExponent { exponent: u32, max: u32 },
}
