//! Control the buzzer.
use crate::Timer;
use embedded_hal::digital::v2::OutputPin;

/// Buzzer structure. Either silent, sounding continuously (emergency alarm),
/// or playing a finite beep-beep pattern (wrong password).
pub struct Buzzer<P> {
    /// Pin connected to the digital input of the buzzer
    data_out: P,
    /// Mapping between the electric level of the pin and the logical level
    /// of the buzzer
    logical_level_high: bool,
    /// If Some, the buzzer is active
    sound: Option<Sound>,
}

/// What the buzzer is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sound {
    Continuous,
    Pattern(Pattern),
}

impl<P: OutputPin> Buzzer<P> {
    /// Initialize the object, muted.
    pub fn init(data_out: P, logical_level_high: bool) -> Self {
        let mut out = Self {
            data_out,
            logical_level_high,
            sound: None,
        };
        out.do_mute();
        out
    }

    /// Get the status of the buzzer.
    pub fn is_active(&self) -> bool {
        self.sound.is_some()
    }

    /// Whether the continuous alarm is on.
    pub fn is_alarm(&self) -> bool {
        self.sound == Some(Sound::Continuous)
    }

    /// Sound continuously until stopped.
    pub fn start(&mut self) {
        self.sound = Some(Sound::Continuous);
        self.do_buzz();
    }

    /// Play `beeps` beeps of `beep_ms`, each followed by a silence of the
    /// same duration. The buzzer stops by itself at the end of the pattern.
    pub fn play(&mut self, beeps: u8, beep_ms: u16, now: Timer) {
        self.sound = Some(Sound::Pattern(Pattern {
            start: now,
            beeps,
            beep_ms,
        }));
        self.update(now);
    }

    /// Stop the buzzer.
    pub fn stop(&mut self) {
        self.sound = None;
        self.do_mute();
    }

    /// Update the pin according to the current sound and time.
    pub fn update(&mut self, now: Timer) {
        match self.sound {
            Some(Sound::Continuous) => self.do_buzz(),
            Some(Sound::Pattern(pattern)) => match pattern.level(now) {
                Some(true) => self.do_buzz(),
                Some(false) => self.do_mute(),
                None => self.stop(),
            },
            None => self.do_mute(),
        }
    }

    /// Set the pin to the appropriate electrical level
    /// to actually generate a sound.
    fn do_buzz(&mut self) {
        if self.logical_level_high {
            self.data_out.set_high().ok();
        } else {
            self.data_out.set_low().ok();
        }
    }

    /// Set the pin to the appropriate electrical level
    /// to mute the buzzer.
    fn do_mute(&mut self) {
        if self.logical_level_high {
            self.data_out.set_low().ok();
        } else {
            self.data_out.set_high().ok();
        }
    }
}

/// Finite sequence of beeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pattern {
    /// Start of the first beep
    start: Timer,
    /// Number of beeps
    beeps: u8,
    /// Duration of a beep, and of the silence following it
    beep_ms: u16,
}

impl Pattern {
    /// Logical level of the buzzer at that instant,
    /// None once the pattern is over.
    fn level(&self, now: Timer) -> Option<bool> {
        let period = self.beep_ms.saturating_mul(2).max(1);
        let elapsed = now.elapsed_since(self.start);
        if elapsed / period >= self.beeps as u16 {
            return None;
        }
        Some(elapsed % period < self.beep_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePin;

    #[test]
    fn init_mutes_according_to_logical_level() {
        let pin = FakePin::new(true);
        let _buzzer = Buzzer::init(pin.clone(), true);
        assert!(!pin.is_set_high());

        let pin = FakePin::new(false);
        let _buzzer = Buzzer::init(pin.clone(), false);
        assert!(pin.is_set_high());
    }

    #[test]
    fn continuous_until_stopped() {
        let pin = FakePin::default();
        let mut buzzer = Buzzer::init(pin.clone(), true);
        buzzer.start();
        assert!(buzzer.is_alarm());
        buzzer.update(Timer(40_000));
        assert!(pin.is_set_high());
        buzzer.stop();
        assert!(!buzzer.is_active());
        assert!(!pin.is_set_high());
    }

    #[test]
    fn pattern_beeps_then_stops() {
        let pin = FakePin::default();
        let mut buzzer = Buzzer::init(pin.clone(), true);
        let start = Timer(100);
        buzzer.play(4, 125, start);
        assert!(pin.is_set_high());
        assert!(!buzzer.is_alarm());

        let expected = [
            (124, true),
            (125, false),
            (249, false),
            (250, true),
            (874, true),
            (875, false),
            (999, false),
        ];
        for (offset, high) in expected {
            buzzer.update(start + offset);
            assert_eq!(pin.is_set_high(), high, "at {} ms", offset);
            assert!(buzzer.is_active());
        }

        buzzer.update(start + 1000);
        assert!(!buzzer.is_active());
        assert!(!pin.is_set_high());
    }
}
