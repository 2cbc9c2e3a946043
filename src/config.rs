//! # Configuration
//!
//! The editor's tunables. There is no configuration file to load (an explicit non-goal); the
//! values below are compiled-in defaults. The struct is still the seam a future loader would
//! populate, so the rest of the crate threads `Config` around rather than using the constants
//! directly.

use std::time::Duration;

/// The global editor configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The size of a tab stop. Must be > 0.
    pub(crate) tab_stop: usize,
    /// The number of confirmations needed before quitting with unsaved changes.
    pub(crate) quit_times: usize,
    /// The duration for which status messages are shown.
    pub(crate) message_duration: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self { tab_stop: 8, quit_times: 3, message_duration: Duration::from_secs(5) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_as_configured() {
        let conf = Config::default();
        assert_eq!(conf.tab_stop, 8);
        assert_eq!(conf.quit_times, 3);
        assert_eq!(conf.message_duration, Duration::from_secs(5));
    }
}
