//! 4x4 matrix keypad: scan, debounce and press/release events.
//!
//! Each row is an output idling high, each column an input with a pull-up.
//! Driving one row low makes the columns of its pressed keys read low.
//! The scan never waits for a key to be released: the debounced state of the
//! matrix is compared from one scan to the next, and each transition is
//! queued as an event, so a held (or stuck) key yields a single press.
use crate::Timer;
use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::{InputPin, OutputPin};
use ringbuffer::{ConstGenericRingBuffer, RingBuffer};

/// Number of events kept between two reads. The oldest ones are
/// overwritten when the consumer is late.
const EVENT_QUEUE_SIZE: usize = 8;

/// Key of the keypad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Digit, 0 to 9
    Digit(u8),
    A,
    B,
    C,
    D,
    Star,
    Hash,
}

impl Key {
    /// Map an ascii char to a key, if it is printed on the keypad.
    pub fn from_ascii(symbol: u8) -> Option<Key> {
        match symbol {
            ascii @ b'0'..=b'9' => Some(Key::Digit(ascii - b'0')),
            b'A' | b'a' => Some(Key::A),
            b'B' | b'b' => Some(Key::B),
            b'C' | b'c' => Some(Key::C),
            b'D' | b'd' => Some(Key::D),
            b'*' => Some(Key::Star),
            b'#' => Some(Key::Hash),
            _ => None,
        }
    }

    /// Symbol printed on the key, as ascii.
    pub fn as_ascii(self) -> u8 {
        match self {
            Key::Digit(digit) => b'0' + digit % 10,
            Key::A => b'A',
            Key::B => b'B',
            Key::C => b'C',
            Key::D => b'D',
            Key::Star => b'*',
            Key::Hash => b'#',
        }
    }
}

impl ufmt::uDisplay for Key {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let symbol = [self.as_ascii()];
        f.write_str(core::str::from_utf8(&symbol).unwrap_or("?"))
    }
}

/// Symbols of the keypad, indexed by [row][column]
pub const KEYMAP: [[Key; 4]; 4] = [
    [Key::Digit(1), Key::Digit(4), Key::Digit(7), Key::Star],
    [Key::Digit(2), Key::Digit(5), Key::Digit(8), Key::Digit(0)],
    [Key::Digit(3), Key::Digit(6), Key::Digit(9), Key::Hash],
    [Key::A, Key::B, Key::C, Key::D],
];

/// Position (row, column) of the key in the matrix.
#[cfg(test)]
pub(crate) fn position_of(key: Key) -> Option<(usize, usize)> {
    KEYMAP.iter().enumerate().find_map(|(row, keys)| {
        keys.iter()
            .position(|&candidate| candidate == key)
            .map(|column| (row, column))
    })
}

/// Debounced transition of the keypad
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Pressed(Key),
    Released(Key),
}

/// Keypad scanner
pub struct Keypad<R, C, D> {
    /// Row lines, driven low one at a time
    rows: [R; 4],
    /// Column lines, pulled up
    columns: [C; 4],
    /// Delay provider for the settle time of a row
    delay: D,
    row_settle_us: u16,
    debounce_ms: u16,
    /// Latest raw reading and the time it was first seen
    candidate: Option<Key>,
    candidate_since: Timer,
    /// Debounced state of the matrix
    stable: Option<Key>,
    events: ConstGenericRingBuffer<KeyEvent, EVENT_QUEUE_SIZE>,
}

impl<R: OutputPin, C: InputPin, D: DelayUs<u16>> Keypad<R, C, D> {
    /// Take the pins, all rows inactive.
    pub fn new(
        rows: [R; 4],
        columns: [C; 4],
        delay: D,
        row_settle_us: u16,
        debounce_ms: u16,
    ) -> Self {
        let mut out = Self {
            rows,
            columns,
            delay,
            row_settle_us,
            debounce_ms,
            candidate: None,
            candidate_since: Timer::default(),
            stable: None,
            events: ConstGenericRingBuffer::new(),
        };
        for row in out.rows.iter_mut() {
            row.set_high().ok();
        }
        out
    }

    /// Scan the matrix once, and return the next key pressed, if any.
    /// Never blocks, meant to be called at every loop.
    pub fn scan(&mut self, now: Timer) -> Option<Key> {
        self.poll(now);
        while let Some(event) = self.next_event() {
            if let KeyEvent::Pressed(key) = event {
                return Some(key);
            }
        }
        None
    }

    /// Scan the matrix once, queuing the debounced transitions.
    pub fn poll(&mut self, now: Timer) {
        let raw = self.read_matrix();
        self.debounce(raw, now);
    }

    /// Dequeue the oldest press or release event.
    fn next_event(&mut self) -> Option<KeyEvent> {
        self.events.dequeue()
    }

    /// Read the matrix: the first active column of the first row
    /// having one wins, other simultaneous keys are ignored.
    fn read_matrix(&mut self) -> Option<Key> {
        for (row_index, row) in self.rows.iter_mut().enumerate() {
            row.set_low().ok();
            self.delay.delay_us(self.row_settle_us);
            let column = self
                .columns
                .iter()
                .position(|column| column.is_low().unwrap_or(false));
            row.set_high().ok();

            if let Some(column) = column {
                return Some(KEYMAP[row_index][column]);
            }
        }
        None
    }

    /// Accept the raw reading once it is stable for the debounce time.
    fn debounce(&mut self, raw: Option<Key>, now: Timer) {
        if raw != self.candidate {
            self.candidate = raw;
            self.candidate_since = now;
        }
        if self.candidate != self.stable && now.has_elapsed(self.candidate_since, self.debounce_ms)
        {
            if let Some(key) = self.stable {
                self.events.push(KeyEvent::Released(key));
            }
            self.stable = self.candidate;
            if let Some(key) = self.stable {
                self.events.push(KeyEvent::Pressed(key));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeColumn, FakeMatrix, FakeRow, NoDelay};

    fn keypad(matrix: &FakeMatrix) -> Keypad<FakeRow, FakeColumn, NoDelay> {
        Keypad::new(matrix.rows(), matrix.columns(), NoDelay, 50, 20)
    }

    #[test]
    fn idle_keypad_returns_none() {
        let matrix = FakeMatrix::default();
        let mut keypad = keypad(&matrix);
        for t in 0..100 {
            assert_eq!(keypad.scan(Timer(t * 10)), None);
        }
        assert!(!matrix.any_row_driven());
    }

    #[test]
    fn one_press_per_physical_press() {
        let matrix = FakeMatrix::default();
        let mut keypad = keypad(&matrix);

        matrix.hold(Key::Digit(5));
        assert_eq!(keypad.scan(Timer(0)), None);
        assert_eq!(keypad.scan(Timer(10)), None);
        assert_eq!(keypad.scan(Timer(20)), Some(Key::Digit(5)));
        // Held: the scan keeps returning, without any new press
        for t in 3..50 {
            assert_eq!(keypad.scan(Timer(t * 10)), None);
        }

        matrix.release_all();
        assert_eq!(keypad.scan(Timer(500)), None);
        assert_eq!(keypad.scan(Timer(520)), None);

        matrix.hold(Key::Digit(5));
        assert_eq!(keypad.scan(Timer(600)), None);
        assert_eq!(keypad.scan(Timer(620)), Some(Key::Digit(5)));
    }

    #[test]
    fn bounces_are_filtered() {
        let matrix = FakeMatrix::default();
        let mut keypad = keypad(&matrix);

        for t in 0..5 {
            matrix.hold(Key::Hash);
            assert_eq!(keypad.scan(Timer(t * 8)), None);
            matrix.release_all();
            assert_eq!(keypad.scan(Timer(t * 8 + 4)), None);
        }
        assert_eq!(keypad.scan(Timer(100)), None);
        assert_eq!(keypad.next_event(), None);
    }

    #[test]
    fn events_in_order() {
        let matrix = FakeMatrix::default();
        let mut keypad = keypad(&matrix);

        matrix.hold(Key::C);
        keypad.poll(Timer(0));
        keypad.poll(Timer(25));
        matrix.release_all();
        keypad.poll(Timer(40));
        keypad.poll(Timer(60));

        assert_eq!(keypad.next_event(), Some(KeyEvent::Pressed(Key::C)));
        assert_eq!(keypad.next_event(), Some(KeyEvent::Released(Key::C)));
        assert_eq!(keypad.next_event(), None);
    }

    #[test]
    fn first_key_in_scan_order_wins() {
        let matrix = FakeMatrix::default();
        let mut keypad = keypad(&matrix);

        matrix.hold(Key::Hash);
        matrix.hold(Key::Digit(4));
        keypad.scan(Timer(0));
        assert_eq!(keypad.scan(Timer(20)), Some(Key::Digit(4)));
    }

    #[test]
    fn every_position_maps_to_its_symbol() {
        let matrix = FakeMatrix::default();
        let mut keypad = keypad(&matrix);
        let mut now = Timer(0);

        for &key in KEYMAP.iter().flatten() {
            matrix.hold(key);
            keypad.scan(now);
            assert_eq!(keypad.scan(now + 20), Some(key));
            matrix.release_all();
            keypad.scan(now + 40);
            keypad.scan(now + 60);
            now = now + 100;
        }
    }

    #[test]
    fn ascii_mapping() {
        assert_eq!(Key::from_ascii(b'7'), Some(Key::Digit(7)));
        assert_eq!(Key::from_ascii(b'#'), Some(Key::Hash));
        assert_eq!(Key::from_ascii(b'a'), Some(Key::A));
        assert_eq!(Key::from_ascii(b'E'), None);
        assert_eq!(Key::Star.as_ascii(), b'*');
        assert_eq!(position_of(Key::Digit(0)), Some((1, 3)));
    }
}
