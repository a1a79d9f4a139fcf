//! Serial console: log output and diagnostic commands from the user
use crate::Key;
use ringbuffer::{ConstGenericRingBuffer, RingBuffer};

/// Size, in bytes, of the buffer for serial input
pub const CONSOLE_READ_BUFFER_SIZE: usize = 16;
/// Size, in bytes, of the buffer for serial output
pub const CONSOLE_WRITE_BUFFER_SIZE: usize = 64;

/// Buffers for serial communication, owned by the main loop. The hardware
/// side only pushes received bytes and pops bytes to transmit.
#[derive(Default)]
pub struct Console<const WRITE_BUFFER_SIZE: usize, const READ_BUFFER_SIZE: usize> {
    output: ConstGenericRingBuffer<u8, WRITE_BUFFER_SIZE>,
    input: ConstGenericRingBuffer<u8, READ_BUFFER_SIZE>,
}

/// Implement ufmt::uWrite for the console, to be able to call ufmt::uwriteln
impl<const WRITE_BUFFER_SIZE: usize, const READ_BUFFER_SIZE: usize> ufmt::uWrite
    for Console<WRITE_BUFFER_SIZE, READ_BUFFER_SIZE>
{
    type Error = ();

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        for byte in s.as_bytes() {
            self.output.push(*byte);
        }
        Ok(())
    }
}

/// Commands for the serial interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Query the current mode: ?md
    QueryMode,
    /// Query the counter: ?ct
    QueryCounter,
    /// Query the state of the relay: ?rl
    QueryRelay,
    /// Query whether a lockdown is running: ?em
    QueryEmergency,
    /// Act as if the key was pressed on the keypad: !k X
    PressKey(Key),
}

impl<const WRITE_BUFFER_SIZE: usize, const READ_BUFFER_SIZE: usize>
    Console<WRITE_BUFFER_SIZE, READ_BUFFER_SIZE>
{
    /// Store a byte received on the serial line. Only printable chars and
    /// the \n separator are kept.
    pub fn receive(&mut self, byte: u8) {
        if (0x20..0x7f).contains(&byte) || byte == b'\n' {
            self.input.push(byte);
        }
    }

    /// Next byte to send on the serial line.
    pub fn transmit(&mut self) -> Option<u8> {
        self.output.dequeue()
    }

    /// Try to dequeue a command from the input buffer. Return
    /// - Ok(Some()) when a command is identified
    /// - Err(()) when a \n separator was found, but no valid command
    ///   could be parsed
    /// - Ok(None) most of the time, when there is no/not enough data
    /// Bytes are also removed from the ring buffer.
    pub fn dequeue_command(&mut self) -> Result<Option<Command>, ()> {
        while let Some(&byte) = self.input.peek() {
            if byte == b'!' || byte == b'?' {
                break;
            } else {
                self.input.dequeue();
            }
        }
        match self.input.iter().position(|&b| b == b'\n') {
            Some(3) => match &self.dequeue_to_array() {
                b"?md" => Ok(Some(Command::QueryMode)),
                b"?ct" => Ok(Some(Command::QueryCounter)),
                b"?rl" => Ok(Some(Command::QueryRelay)),
                b"?em" => Ok(Some(Command::QueryEmergency)),
                _ => Err(()),
            },
            Some(4) => match self.dequeue_to_array() {
                [b'!', b'k', b' ', symbol] => Key::from_ascii(symbol)
                    .map(|key| Some(Command::PressKey(key)))
                    .ok_or(()),
                _ => Err(()),
            },
            Some(_) => {
                while Some(b'\n') != self.input.dequeue() {}
                Err(())
            }
            None => Ok(None),
        }
    }

    /// Dequeue from the input buffer to an array of a given size,
    /// dequeing (and dropping) the separator \n
    fn dequeue_to_array<const T: usize>(&mut self) -> [u8; T] {
        let mut array = [0u8; T];
        for byte in array.iter_mut() {
            *byte = self.input.dequeue().unwrap_or_default();
        }
        // Dequeue the next \n
        self.input.dequeue();
        array
    }
}
