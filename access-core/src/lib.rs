//! Logic of the keypad access controller, independent of the microcontroller.
//!
//! Everything here talks to the hardware through the `embedded-hal` traits,
//! and to time through [`Timer`] values given by the caller, so that the
//! whole state machine runs on the host for the tests.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod console;
pub mod control;
pub mod emergency;
pub mod events;
pub mod inputs;
pub mod keypad;
pub mod modes;
pub mod outputs;
pub mod timer;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use control::{AccessControl, EmergencySignal};
pub use emergency::Poll;
pub use events::Event;
pub use keypad::{Key, Keypad};
pub use modes::Mode;
pub use timer::Timer;
