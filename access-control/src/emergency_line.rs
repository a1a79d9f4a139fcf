//! External interrupt on the emergency line (INT0, d2).
//!
//! The interrupt only raises a flag: the lockdown itself runs in the main loop.
use core::cell::Cell;

/// Set by the interrupt, taken by the main loop
static EMERGENCY_PENDING: avr_device::interrupt::Mutex<Cell<bool>> =
    avr_device::interrupt::Mutex::new(Cell::new(false));

#[avr_device::interrupt(atmega328p)]
fn INT0() {
    avr_device::interrupt::free(|cs| EMERGENCY_PENDING.borrow(cs).set(true));
}

/// Fire INT0 on the falling edge of the line (active low, pulled up).
pub fn init(exint: &arduino_hal::pac::EXINT) {
    // 0x02: falling edge
    exint.eicra.modify(|_, w| w.isc0().bits(0x02));
    exint.eimsk.modify(|_, w| w.int0().set_bit());
}

/// Read and clear the flag. A notification is delivered exactly once.
pub fn take_pending() -> bool {
    avr_device::interrupt::free(|cs| EMERGENCY_PENDING.borrow(cs).replace(false))
}
