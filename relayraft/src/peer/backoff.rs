use std::time::Duration;

/// Tracks consecutive heartbeats that got no response, and computes the
/// resulting heartbeat period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Backoff {
    failed_heartbeats: u32,
}

impl Backoff {
    pub(crate) fn failed_heartbeats(&self) -> u32 {
        self.failed_heartbeats
    }

    pub(crate) fn is_backing_off(&self) -> bool {
        self.failed_heartbeats > 0
    }

    /// Record one more heartbeat without response.
    pub(crate) fn fail(&mut self) {
        self.failed_heartbeats = self.failed_heartbeats.saturating_add(1);
    }

    pub(crate) fn reset(&mut self) {
        self.failed_heartbeats = 0;
    }

    /// The heartbeat period: `base * 2^failed_heartbeats`.
    ///
    /// The exponent stops growing at `max_exponent`, while the failure count
    /// keeps growing.
    pub(crate) fn interval(&self, base: Duration, max_exponent: u32) -> Duration {
        let exp = self.failed_heartbeats.min(max_exponent);
        base.saturating_mul(2u32.saturating_pow(exp))
    }
}
