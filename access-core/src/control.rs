//! One iteration of the controller: emergency first, then the modes.
use crate::{
    emergency::{EmergencyMonitor, Poll},
    inputs::InputEdges,
    modes::ModeController,
    outputs::Outputs,
    Config, Event, Key, Timer,
};
use embedded_hal::digital::v2::OutputPin;

/// What the main loop knows about the emergency line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EmergencySignal {
    /// The interrupt fired since the previous iteration
    pub notified: bool,
    /// Level of the line, read by the main loop
    pub line_asserted: bool,
}

/// The whole logic of the access controller.
pub struct AccessControl {
    pub modes: ModeController,
    pub emergency: EmergencyMonitor,
}

impl AccessControl {
    pub fn new(config: Config) -> Self {
        Self {
            modes: ModeController::new(config),
            emergency: EmergencyMonitor::new(config.lockdown_ms),
        }
    }

    /// Draw the screen of the first mode.
    pub fn start<R: OutputPin, B: OutputPin>(&self, outputs: &mut Outputs<R, B>) {
        self.modes.redraw(outputs);
    }

    /// Run one iteration. During a lockdown, `next_key` is not called at all
    /// and the input edges are dropped: nothing but the emergency runs.
    /// Only the level of the relay switch is recorded in every case.
    /// Every notable event is handed to `log`.
    pub fn step<R, B, K, L>(
        &mut self,
        signal: EmergencySignal,
        edges: InputEdges,
        next_key: K,
        outputs: &mut Outputs<R, B>,
        now: Timer,
        mut log: L,
    ) -> Poll
    where
        R: OutputPin,
        B: OutputPin,
        K: FnOnce() -> Option<Key>,
        L: FnMut(Event),
    {
        self.modes.track_relay_switch(edges.relay_switch_on);
        if signal.notified {
            if let Some(event) =
                self.emergency
                    .trigger(signal.line_asserted, &mut self.modes, outputs, now)
            {
                log(event);
            }
        }

        match self.emergency.poll(&self.modes, outputs, now) {
            Poll::Locked => return Poll::Locked,
            Poll::Released => {
                log(Event::EmergencyEnded);
                return Poll::Released;
            }
            Poll::Idle => {}
        }

        self.modes.tick(outputs, now);
        if let Some(key) = next_key() {
            if let Some(event) = self.modes.handle_key(key, outputs, now) {
                log(event);
            }
        }
        if let Some(event) = self.modes.handle_inputs(edges, outputs) {
            log(event);
        }
        Poll::Idle
    }
}
