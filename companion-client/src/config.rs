//! Runtime configuration. The protocol has no configuration
//! surface of its own beyond these knobs; there is no file or environment
//! format to parse.

use std::time::Duration;

/// Tuning knobs for a [`crate::Service`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Interval between automatic `KEEP_ALIVE` sends. Servers have been
    /// observed to be sensitive to high keepalive rates.
    pub keepalive_interval: Duration,
    /// Bound on the outbound send queue; the wire protocol itself places no
    /// limit, but an implementation SHOULD cap it.
    pub send_queue_capacity: usize,
    /// How many `DATA_UPDATE` records the receive activity decodes before
    /// yielding to the other activities.
    pub yield_every: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            keepalive_interval: Duration::from_secs(30),
            send_queue_capacity: 256,
            yield_every: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = ServiceConfig::default();
        assert_eq!(config.keepalive_interval, Duration::from_secs(30));
        assert_eq!(config.yield_every, 100);
    }
}
