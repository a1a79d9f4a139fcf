//! Operating modes of the controller and their handling of keys and inputs.
use crate::{
    inputs::{Edge, InputEdges},
    outputs::{DisplaySink, Line, Outputs, Row},
    Config, Event, Key, Timer,
};
use embedded_hal::digital::v2::OutputPin;

/// Key switching to the next mode, whatever the current one
pub const MODE_ADVANCE_KEY: Key = Key::A;
/// Key saving the password, or submitting the entered one
const CONFIRM_KEY: Key = Key::Hash;
/// Key clearing the password being typed
const CLEAR_KEY: Key = Key::C;
/// Column of the password on the first row, in password setting mode
const PASSWORD_COLUMN: usize = 14;

/// Operating mode, cycling in the declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// The relay follows the relay switch
    Relay,
    /// Up/down counter
    Counter,
    /// Typing a new password on the keypad
    SetPassword,
    /// Dialing the password with the up/down buttons
    EnterPassword,
}

impl Mode {
    /// Mode active after power-up.
    pub const FIRST: Mode = Mode::Relay;

    /// Successor of the mode, wrapping after the last one.
    pub fn next(self) -> Mode {
        match self {
            Mode::Relay => Mode::Counter,
            Mode::Counter => Mode::SetPassword,
            Mode::SetPassword => Mode::EnterPassword,
            Mode::EnterPassword => Mode::Relay,
        }
    }
}

impl ufmt::uDisplay for Mode {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(match self {
            Mode::Relay => "Relay",
            Mode::Counter => "Counter",
            Mode::SetPassword => "SetPassword",
            Mode::EnterPassword => "EnterPassword",
        })
    }
}

/// Up to two digits typed in password setting mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct PendingPassword {
    digits: [u8; 2],
    len: usize,
}

impl PendingPassword {
    fn push(&mut self, digit: u8) -> bool {
        if self.len >= self.digits.len() {
            return false;
        }
        self.digits[self.len] = digit;
        self.len += 1;
        true
    }

    fn complete(&self) -> Option<[u8; 2]> {
        (self.len == self.digits.len()).then_some(self.digits)
    }

    fn as_slice(&self) -> &[u8] {
        &self.digits[..self.len]
    }
}

/// Transient message on the second row, during which the controller is busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Hold {
    started: Timer,
    /// Total duration, the second row is blanked at the end
    duration_ms: u16,
    /// Release the relay that long after the start, if Some
    relay_release_ms: Option<u16>,
}

/// The state machine of the user interface: current mode and the state
/// of each mode. Talks to the outputs it is given, owns nothing else.
pub struct ModeController {
    config: Config,
    mode: Mode,
    counter: u16,
    /// Digits, 0 to 9
    stored_password: [u8; 2],
    pending_password: PendingPassword,
    /// Left and right digits dialed in password entry mode, 0 to 9
    entry_digits: [u8; 2],
    hold: Option<Hold>,
    /// Latest debounced level of the relay switch, whatever the mode
    relay_switch_on: bool,
}

impl ModeController {
    /// Controller in its power-up state.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            mode: Mode::FIRST,
            counter: 0,
            stored_password: config.default_password.map(|ascii| ascii.wrapping_sub(b'0') % 10),
            pending_password: PendingPassword::default(),
            entry_digits: [0, 0],
            hold: None,
            relay_switch_on: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn counter(&self) -> u16 {
        self.counter
    }

    /// Stored password, as digits.
    pub fn stored_password(&self) -> [u8; 2] {
        self.stored_password
    }

    /// Digits typed so far in password setting mode.
    pub fn pending_password(&self) -> &[u8] {
        self.pending_password.as_slice()
    }

    pub fn entry_digits(&self) -> [u8; 2] {
        self.entry_digits
    }

    /// Whether a transient message is displayed: keys and inputs are
    /// ignored until it expires.
    pub fn is_busy(&self) -> bool {
        self.hold.is_some()
    }

    /// Clear the display and draw the screen of the current mode,
    /// without touching the state of the mode.
    pub fn redraw<R: OutputPin, B: OutputPin>(&self, outputs: &mut Outputs<R, B>) {
        let relay_on = outputs.relay.is_on();
        let display = &mut outputs.display;
        display.clear();
        match self.mode {
            Mode::Relay => {
                display.write_at(Row::Top, 0, "Relay");
                Self::draw_relay(display, relay_on);
            }
            Mode::Counter => {
                display.write_at(Row::Top, 0, "Photo Button U/D");
                self.draw_counter(display);
            }
            Mode::SetPassword => {
                display.write_at(Row::Top, 0, "Set Password:");
                self.draw_password(display);
                display.write_at(Row::Bottom, 0, "#:Save C:Clr");
            }
            Mode::EnterPassword => {
                self.draw_entry(display);
                display.write_at(Row::Bottom, 0, "#: Enter");
            }
        }
    }

    /// Record the level of the relay switch. Called at every iteration, even
    /// when the edges are not handled, so that entering relay mode starts
    /// from the actual position of the switch.
    pub fn track_relay_switch(&mut self, on: bool) {
        self.relay_switch_on = on;
    }

    /// Drop the transient message, if any, without touching the outputs.
    /// The caller takes care of the relay, buzzer and display.
    pub fn abort_hold(&mut self) {
        self.hold = None;
    }

    /// Let the time run for the transient message: release the relay after
    /// a granted access, blank the message once it expired.
    pub fn tick<R: OutputPin, B: OutputPin>(&mut self, outputs: &mut Outputs<R, B>, now: Timer) {
        let Some(hold) = self.hold.as_mut() else {
            return;
        };
        let elapsed = now.elapsed_since(hold.started);
        if let Some(relay_release_ms) = hold.relay_release_ms {
            if elapsed >= relay_release_ms {
                outputs.relay.set(false);
                hold.relay_release_ms = None;
            }
        }
        if elapsed >= hold.duration_ms {
            outputs.display.clear_row(Row::Bottom);
            self.hold = None;
        }
    }

    /// Handle a key of the keypad. The mode-advance key is checked first,
    /// in every mode; other keys are interpreted by the current mode.
    pub fn handle_key<R: OutputPin, B: OutputPin>(
        &mut self,
        key: Key,
        outputs: &mut Outputs<R, B>,
        now: Timer,
    ) -> Option<Event> {
        if self.is_busy() {
            return None;
        }
        if key == MODE_ADVANCE_KEY {
            return Some(self.advance_mode(outputs));
        }
        match self.mode {
            Mode::Relay | Mode::Counter => None,
            Mode::SetPassword => self.set_password_key(key, outputs, now),
            Mode::EnterPassword => self.enter_password_key(key, outputs, now),
        }
    }

    /// Handle the transitions of the relay switch and of the up/down buttons.
    pub fn handle_inputs<R: OutputPin, B: OutputPin>(
        &mut self,
        edges: InputEdges,
        outputs: &mut Outputs<R, B>,
    ) -> Option<Event> {
        self.track_relay_switch(edges.relay_switch_on);
        if self.is_busy() {
            return None;
        }
        match self.mode {
            Mode::Relay => {
                let on = match edges.relay_switch? {
                    Edge::Rising => true,
                    Edge::Falling => false,
                };
                outputs.relay.set(on);
                Self::draw_relay(&mut outputs.display, on);
                Some(Event::RelaySwitched(on))
            }
            Mode::Counter => {
                if !edges.up_pressed() && !edges.down_pressed() {
                    return None;
                }
                if edges.up_pressed() {
                    self.counter = self.counter.saturating_add(1);
                }
                if edges.down_pressed() {
                    self.counter = self.counter.saturating_sub(1);
                }
                self.draw_counter(&mut outputs.display);
                Some(Event::CounterChanged(self.counter))
            }
            Mode::SetPassword => None,
            Mode::EnterPassword => {
                if edges.up_pressed() {
                    self.entry_digits[0] = (self.entry_digits[0] + 1) % 10;
                }
                if edges.down_pressed() {
                    self.entry_digits[1] = (self.entry_digits[1] + 1) % 10;
                }
                self.draw_entry(&mut outputs.display);
                None
            }
        }
    }

    fn advance_mode<R: OutputPin, B: OutputPin>(&mut self, outputs: &mut Outputs<R, B>) -> Event {
        self.mode = self.mode.next();
        match self.mode {
            // The switch may have moved while another mode was active
            Mode::Relay => outputs.relay.set(self.relay_switch_on),
            Mode::SetPassword => self.pending_password = PendingPassword::default(),
            Mode::EnterPassword => self.entry_digits = [0, 0],
            Mode::Counter => {}
        }
        self.redraw(outputs);
        Event::ModeChanged(self.mode)
    }

    fn set_password_key<R: OutputPin, B: OutputPin>(
        &mut self,
        key: Key,
        outputs: &mut Outputs<R, B>,
        now: Timer,
    ) -> Option<Event> {
        match key {
            Key::Digit(digit) => {
                if self.pending_password.push(digit) {
                    self.draw_password(&mut outputs.display);
                }
                None
            }
            CONFIRM_KEY => {
                let password = self.pending_password.complete()?;
                self.stored_password = password;
                self.pending_password = PendingPassword::default();
                self.draw_password(&mut outputs.display);
                self.show_message(outputs, "Password SAVED", now);
                Some(Event::PasswordSaved)
            }
            CLEAR_KEY => {
                self.pending_password = PendingPassword::default();
                outputs.display.write_at(Row::Top, PASSWORD_COLUMN, "  ");
                self.show_message(outputs, "Input cleared", now);
                Some(Event::InputCleared)
            }
            _ => None,
        }
    }

    fn enter_password_key<R: OutputPin, B: OutputPin>(
        &mut self,
        key: Key,
        outputs: &mut Outputs<R, B>,
        now: Timer,
    ) -> Option<Event> {
        if key != CONFIRM_KEY {
            return None;
        }
        let message_hold_ms = self.config.message_hold_ms;
        if self.entry_digits == self.stored_password {
            outputs.relay.set(true);
            outputs.display.write_line(Row::Bottom, "Access Granted");
            self.hold = Some(Hold {
                started: now,
                duration_ms: self.config.grant_hold_ms.saturating_add(message_hold_ms),
                relay_release_ms: Some(self.config.grant_hold_ms),
            });
            Some(Event::AccessGranted)
        } else {
            outputs
                .buzzer
                .play(self.config.deny_beeps, self.config.deny_beep_ms, now);
            outputs.display.write_line(Row::Bottom, "Wrong Password");
            let tune_ms = self
                .config
                .deny_beep_ms
                .saturating_mul(2)
                .saturating_mul(self.config.deny_beeps as u16);
            self.hold = Some(Hold {
                started: now,
                duration_ms: tune_ms.saturating_add(message_hold_ms),
                relay_release_ms: None,
            });
            Some(Event::AccessDenied)
        }
    }

    /// Show the message on the second row for the message hold time.
    fn show_message<R, B>(&mut self, outputs: &mut Outputs<R, B>, message: &str, now: Timer) {
        outputs.display.write_line(Row::Bottom, message);
        self.hold = Some(Hold {
            started: now,
            duration_ms: self.config.message_hold_ms,
            relay_release_ms: None,
        });
    }

    fn draw_relay(display: &mut impl DisplaySink, on: bool) {
        display.write_line(Row::Bottom, if on { "Button: ON" } else { "Button: OFF" });
    }

    fn draw_counter(&self, display: &mut impl DisplaySink) {
        let mut line = Line::default();
        ufmt::uwrite!(&mut line, "Count: {}", self.counter).ok();
        display.write_line(Row::Bottom, line.as_str());
    }

    /// Digits typed so far, or the stored password when nothing is typed.
    fn draw_password(&self, display: &mut impl DisplaySink) {
        let digits = match self.pending_password.len {
            0 => self.stored_password.as_slice(),
            _ => self.pending_password.as_slice(),
        };
        let mut line = Line::default();
        for digit in digits {
            ufmt::uwrite!(&mut line, "{}", digit).ok();
        }
        display.write_at(Row::Top, PASSWORD_COLUMN, "  ");
        display.write_at(Row::Top, PASSWORD_COLUMN, line.as_str());
    }

    fn draw_entry(&self, display: &mut impl DisplaySink) {
        let mut line = Line::default();
        ufmt::uwrite!(
            &mut line,
            "Enter: {}{}",
            self.entry_digits[0],
            self.entry_digits[1]
        )
        .ok();
        display.write_line(Row::Top, line.as_str());
    }
}
