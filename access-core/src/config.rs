//! Compile-time settings of the access controller.

/// Durations and defaults of the controller. All durations are in
/// milliseconds and must stay below a full wrap of the [`Timer`](crate::Timer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Password restored at every power-up, two ASCII digits
    pub default_password: [u8; 2],
    /// A keypad reading must be stable that long to be taken into account
    pub debounce_ms: u16,
    /// Settle time between driving a keypad row and reading the columns
    pub row_settle_us: u16,
    /// Hold time of the transient messages on the second row
    pub message_hold_ms: u16,
    /// Time the relay stays energized after a granted access
    pub grant_hold_ms: u16,
    /// Number of beeps of the wrong-password tune
    pub deny_beeps: u8,
    /// Duration of one beep (and of the silence after it)
    pub deny_beep_ms: u16,
    /// Duration of the emergency lockdown
    pub lockdown_ms: u16,
}

impl Config {
    /// Timings of the lab board.
    pub const DEFAULT: Config = Config {
        default_password: *b"33",
        debounce_ms: 20,
        row_settle_us: 50,
        message_hold_ms: 1000,
        grant_hold_ms: 5000,
        deny_beeps: 4,
        deny_beep_ms: 125,
        lockdown_ms: 10_000,
    };
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}
