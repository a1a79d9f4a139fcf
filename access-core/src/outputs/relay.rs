//! Relay driving the door actuator.
use embedded_hal::digital::v2::OutputPin;

/// Relay output. The state kept here is the only record of whether the
/// actuator is energized: the modes and the emergency path both go through it.
pub struct Relay<P> {
    /// Pin connected to the relay driver
    pin: P,
    /// Mapping between the electric level of the pin and the logical level
    /// of the relay
    logical_level_high: bool,
    on: bool,
}

impl<P: OutputPin> Relay<P> {
    /// Initialize the relay, released.
    pub fn init(pin: P, logical_level_high: bool) -> Self {
        let mut out = Self {
            pin,
            logical_level_high,
            on: false,
        };
        out.apply();
        out
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Energize or release the relay.
    pub fn set(&mut self, on: bool) {
        self.on = on;
        self.apply();
    }

    /// Release the relay, whatever its state.
    pub fn force_off(&mut self) {
        self.set(false);
    }

    fn apply(&mut self) {
        if self.on == self.logical_level_high {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
    }
}
