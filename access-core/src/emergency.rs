//! Emergency override: lockdown of the whole controller for a fixed time.
//!
//! The interrupt only records that the emergency line fell; the main loop
//! hands that notification to [`EmergencyMonitor::trigger`] together with the
//! current level of the line, so that noise on the line is rejected.
use crate::{
    modes::ModeController,
    outputs::{DisplaySink, Outputs, Row},
    Event, Timer,
};
use embedded_hal::digital::v2::OutputPin;

/// State of the monitor after a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// No lockdown, normal operation
    Idle,
    /// Lockdown running: nothing else may run
    Locked,
    /// The lockdown just ended, the mode screen is back
    Released,
}

pub struct EmergencyMonitor {
    lockdown_ms: u16,
    /// Start of the running lockdown
    lockdown_since: Option<Timer>,
}

impl EmergencyMonitor {
    pub fn new(lockdown_ms: u16) -> Self {
        Self {
            lockdown_ms,
            lockdown_since: None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lockdown_since.is_some()
    }

    /// Handle a notification of the emergency line.
    /// If the line is not asserted anymore, it was noise: nothing happens.
    /// Otherwise the relay is released, the alarm sounds, the banner is shown
    /// and the lockdown starts. Notifications during a lockdown are dropped.
    pub fn trigger<R: OutputPin, B: OutputPin>(
        &mut self,
        line_asserted: bool,
        controller: &mut ModeController,
        outputs: &mut Outputs<R, B>,
        now: Timer,
    ) -> Option<Event> {
        if self.is_locked() {
            return None;
        }
        if !line_asserted {
            return Some(Event::SpuriousTrigger);
        }

        outputs.relay.force_off();
        outputs.buzzer.start();
        controller.abort_hold();

        outputs.display.clear();
        outputs.display.write_at(Row::Top, 0, "!!! EMERGENCY !!");
        outputs.display.write_at(Row::Bottom, 0, "Buzzer 10 Sec");

        self.lockdown_since = Some(now);
        Some(Event::EmergencyStarted)
    }

    /// Let the time run. At the end of the lockdown, the alarm stops and the
    /// screen of the current mode is drawn again; the mode itself was never
    /// touched.
    pub fn poll<R: OutputPin, B: OutputPin>(
        &mut self,
        controller: &ModeController,
        outputs: &mut Outputs<R, B>,
        now: Timer,
    ) -> Poll {
        let Some(since) = self.lockdown_since else {
            return Poll::Idle;
        };
        if !now.has_elapsed(since, self.lockdown_ms) {
            return Poll::Locked;
        }

        self.lockdown_since = None;
        outputs.buzzer.stop();
        controller.redraw(outputs);
        Poll::Released
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        inputs::{Edge, InputEdges},
        outputs::{Buzzer, Relay},
        testing::FakePin,
        Config, Key, Mode,
    };

    fn setup() -> (ModeController, EmergencyMonitor, Outputs<FakePin, FakePin>) {
        let mut outputs = Outputs::init(
            Relay::init(FakePin::default(), true),
            Buzzer::init(FakePin::default(), true),
        );
        let controller = ModeController::new(Config::DEFAULT);
        controller.redraw(&mut outputs);
        (controller, EmergencyMonitor::new(10_000), outputs)
    }

    #[test]
    fn spurious_trigger_is_a_no_op() {
        let (mut controller, mut monitor, mut outputs) = setup();
        outputs.relay.set(true);

        let event = monitor.trigger(false, &mut controller, &mut outputs, Timer(0));
        assert_eq!(event, Some(Event::SpuriousTrigger));
        assert!(!monitor.is_locked());
        assert!(outputs.relay.is_on());
        assert!(!outputs.buzzer.is_active());
        assert_eq!(outputs.display.text(Row::Top), "Relay           ");
        assert_eq!(monitor.poll(&controller, &mut outputs, Timer(1)), Poll::Idle);
    }

    #[test]
    fn lockdown_forces_safe_outputs() {
        let (mut controller, mut monitor, mut outputs) = setup();
        outputs.relay.set(true);

        let event = monitor.trigger(true, &mut controller, &mut outputs, Timer(500));
        assert_eq!(event, Some(Event::EmergencyStarted));
        assert!(!outputs.relay.is_on());
        assert!(outputs.buzzer.is_alarm());
        assert_eq!(outputs.display.text(Row::Top), "!!! EMERGENCY !!");
        assert_eq!(outputs.display.text(Row::Bottom), "Buzzer 10 Sec   ");

        assert_eq!(monitor.poll(&controller, &mut outputs, Timer(10_499)), Poll::Locked);
        assert!(outputs.buzzer.is_alarm());

        // A second notification during the lockdown does not restart it
        assert_eq!(
            monitor.trigger(true, &mut controller, &mut outputs, Timer(5_000)),
            None
        );

        assert_eq!(monitor.poll(&controller, &mut outputs, Timer(10_500)), Poll::Released);
        assert!(!outputs.buzzer.is_active());
        assert_eq!(outputs.display.text(Row::Top), "Relay           ");
        assert_eq!(outputs.display.text(Row::Bottom), "Button: OFF     ");
        assert_eq!(monitor.poll(&controller, &mut outputs, Timer(10_501)), Poll::Idle);
    }

    #[test]
    fn lockdown_aborts_granted_access() {
        let (mut controller, mut monitor, mut outputs) = setup();
        while controller.mode() != Mode::EnterPassword {
            controller.handle_key(Key::A, &mut outputs, Timer(0));
        }
        let dial = InputEdges {
            up: Some(Edge::Rising),
            down: Some(Edge::Rising),
            ..InputEdges::NONE
        };
        for _ in 0..3 {
            controller.handle_inputs(dial, &mut outputs);
        }
        assert_eq!(
            controller.handle_key(Key::Hash, &mut outputs, Timer(0)),
            Some(Event::AccessGranted)
        );
        assert!(outputs.relay.is_on());

        monitor.trigger(true, &mut controller, &mut outputs, Timer(100));
        assert!(!controller.is_busy());
        assert!(!outputs.relay.is_on());

        monitor.poll(&controller, &mut outputs, Timer(10_100));
        controller.tick(&mut outputs, Timer(10_200));
        assert!(!outputs.relay.is_on());
        assert_eq!(outputs.display.text(Row::Top), "Enter: 33       ");
        assert_eq!(outputs.display.text(Row::Bottom), "#: Enter        ");
    }
}
