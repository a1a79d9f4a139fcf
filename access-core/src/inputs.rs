//! Inputs of the user, besides the keypad
use crate::{control::EmergencySignal, Timer};
use embedded_hal::digital::v2::InputPin;

/// Misc. inputs
pub struct Inputs<P> {
    /// Momentary switch driving the relay in relay mode
    pub relay_switch: EdgeInput<P>,
    /// Up button: counter up, left password digit
    pub up: EdgeInput<P>,
    /// Down button: counter down, right password digit
    pub down: EdgeInput<P>,
    /// Emergency line, also wired to the external interrupt
    pub emergency: BoolInput<P>,
}

/// Transitions seen during one update of the inputs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InputEdges {
    pub relay_switch: Option<Edge>,
    pub up: Option<Edge>,
    pub down: Option<Edge>,
    /// Debounced level of the relay switch after the update
    pub relay_switch_on: bool,
}

impl InputEdges {
    /// No transition at all, switch released.
    pub const NONE: InputEdges = InputEdges {
        relay_switch: None,
        up: None,
        down: None,
        relay_switch_on: false,
    };

    pub fn up_pressed(&self) -> bool {
        self.up == Some(Edge::Rising)
    }

    pub fn down_pressed(&self) -> bool {
        self.down == Some(Edge::Rising)
    }
}

impl<P: InputPin> Inputs<P> {
    /// Wrap the already configured pins.
    pub fn init(
        relay_switch: EdgeInput<P>,
        up: EdgeInput<P>,
        down: EdgeInput<P>,
        emergency: BoolInput<P>,
    ) -> Self {
        Self {
            relay_switch,
            up,
            down,
            emergency,
        }
    }

    /// Update the values of the inputs by reading the electric state of the pins,
    /// returning the transitions since the previous update.
    pub fn update(&mut self, now: Timer) -> InputEdges {
        self.emergency.update();
        InputEdges {
            relay_switch: self.relay_switch.update(now),
            up: self.up.update(now),
            down: self.down.update(now),
            relay_switch_on: self.relay_switch.value(),
        }
    }

    /// Take the notification of the emergency interrupt, then read the inputs.
    /// In that order, an interrupt firing between both reads leaves its
    /// notification for the next call instead of pairing it with a stale level.
    pub fn sample(
        &mut self,
        now: Timer,
        take_notification: impl FnOnce() -> bool,
    ) -> (EmergencySignal, InputEdges) {
        let notified = take_notification();
        let edges = self.update(now);
        let signal = EmergencySignal {
            notified,
            line_asserted: self.emergency.value,
        };
        (signal, edges)
    }
}

/// Generic boolean input.
pub struct BoolInput<P> {
    /// Pin to read the state from.
    pin: P,
    /// Mapping between the electric level of the pin (+3.3V or +5V)
    /// and the logical level of the input.
    logical_level_high: bool,
    /// Logical value of the input:
    /// true for an active state, false for an inactive state.
    pub value: bool,
}

impl<P: InputPin> BoolInput<P> {
    /// Initialize the structure, reading the pin once.
    pub fn init(pin: P, logical_level_high: bool) -> Self {
        let mut out = Self {
            pin,
            logical_level_high,
            value: false,
        };
        out.update();
        out
    }

    /// Update the value by reading the electric state of the pin.
    pub fn update(&mut self) {
        if let Ok(high) = self.pin.is_high() {
            self.value = high == self.logical_level_high;
        }
    }
}

/// Transition of a logical input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Became active
    Rising,
    /// Became inactive
    Falling,
}

/// Boolean input reporting each transition once, however long the level is held.
/// A new level is only accepted once the pin kept it for the debounce time.
pub struct EdgeInput<P> {
    /// Raw reading
    input: BoolInput<P>,
    debounce_ms: u16,
    /// Time of the latest change of the raw reading
    changed_at: Timer,
    /// Debounced logical value
    stable: bool,
}

impl<P: InputPin> EdgeInput<P> {
    /// Initialize the structure. The level at that time is the reference:
    /// a switch already held at boot does not produce an edge.
    pub fn init(pin: P, logical_level_high: bool, debounce_ms: u16) -> Self {
        let input = BoolInput::init(pin, logical_level_high);
        Self {
            stable: input.value,
            input,
            debounce_ms,
            changed_at: Timer::default(),
        }
    }

    /// Current debounced logical value.
    pub fn value(&self) -> bool {
        self.stable
    }

    /// Read the pin, and report the debounced transition since the last call, if any.
    pub fn update(&mut self, now: Timer) -> Option<Edge> {
        let previous = self.input.value;
        self.input.update();
        if self.input.value != previous {
            self.changed_at = now;
        }
        if self.input.value == self.stable || !now.has_elapsed(self.changed_at, self.debounce_ms)
        {
            return None;
        }
        self.stable = self.input.value;
        Some(if self.stable {
            Edge::Rising
        } else {
            Edge::Falling
        })
    }
}
