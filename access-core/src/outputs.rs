//! Outputs of the access controller: display, relay and buzzer
use crate::Timer;
pub use buzzer::Buzzer;
pub use display::{CharacterLcd, DisplaySink, FrameBuffer, Line, Row, COLUMNS};
use embedded_hal::digital::v2::OutputPin;
pub use relay::Relay;

mod buzzer;
mod display;
mod relay;

pub struct Outputs<R, B> {
    /// Character LCD, through its frame buffer
    pub display: FrameBuffer,
    /// Door actuator
    pub relay: Relay<R>,
    /// Audible alarm
    pub buzzer: Buzzer<B>,
}

impl<R: OutputPin, B: OutputPin> Outputs<R, B> {
    /// Initialize the structure, relay released and buzzer muted.
    pub fn init(relay: Relay<R>, buzzer: Buzzer<B>) -> Self {
        Self {
            display: FrameBuffer::default(),
            relay,
            buzzer,
        }
    }

    /// Render the output.
    /// The display is only written where its content changed: the
    /// controller may redraw the same text at every loop, the LCD bus
    /// only sees the differences. Without LCD, only the buzzer runs.
    pub fn render<L: CharacterLcd>(
        &mut self,
        lcd: Option<&mut L>,
        now: Timer,
    ) -> Result<(), L::Error> {
        self.buzzer.update(now);
        match lcd {
            Some(lcd) => self.display.render(lcd),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeLcd, FakePin};

    #[test]
    fn render_drives_buzzer_and_display() {
        let buzzer_pin = FakePin::default();
        let mut outputs = Outputs::init(
            Relay::init(FakePin::default(), true),
            Buzzer::init(buzzer_pin.clone(), true),
        );
        let mut lcd = FakeLcd::default();

        outputs.buzzer.play(1, 100, Timer(0));
        outputs.display.write_line(Row::Top, "Hello");
        outputs.render(Some(&mut lcd), Timer(50)).unwrap();
        assert!(buzzer_pin.is_set_high());
        assert_eq!(lcd.rows[0], "Hello           ");

        outputs.render(None::<&mut FakeLcd>, Timer(150)).unwrap();
        assert!(!buzzer_pin.is_set_high());
    }
}
