//! Millisecond timer based on the internal clock, moderately accurate.
use access_core::Timer;
use core::cell::Cell;

/// Prescaler of the internal timer (see the doc of the microprocessor)
const PRESCALER: u16 = 64;
/// Tick counts before raising an interrupt
const TIMER_COUNTS: u8 = 250;
/// Number of milliseconds to increment the counter by at each interrupt.
/// Possible Values:
///
/// ╔═══════════╦══════════════╦═══════════════════╗
/// ║ PRESCALER ║ TIMER_COUNTS ║ Overflow Interval ║
/// ╠═══════════╬══════════════╬═══════════════════╣
/// ║        64 ║          250 ║              1 ms ║
/// ║       256 ║          125 ║              2 ms ║
/// ║       256 ║          250 ║              4 ms ║
/// ║      1024 ║          125 ║              8 ms ║
/// ║      1024 ║          250 ║             16 ms ║
/// ╚═══════════╩══════════════╩═══════════════════╝
///
pub const MILLIS_INCREMENT: u16 = (((PRESCALER as u32) * (TIMER_COUNTS as u32)) / 16000u32) as u16;

/// Global timer, None until the hardware is configured
static TIMER: avr_device::interrupt::Mutex<Cell<Option<Timer>>> =
    avr_device::interrupt::Mutex::new(Cell::new(None));

/// Timer interrupt function: advance the global counter.
#[avr_device::interrupt(atmega328p)]
fn TIMER0_COMPA() {
    avr_device::interrupt::free(|cs| {
        let cell = TIMER.borrow(cs);
        if let Some(mut timer) = cell.get() {
            timer.increment(MILLIS_INCREMENT);
            cell.set(Some(timer));
        }
    })
}

/// Initialize the registers for the hardware timer.
pub fn init(tc0: arduino_hal::pac::TC0) {
    // Configure the timer for the above interval (in CTC mode)
    // and enable its interrupt.
    tc0.tccr0a.write(|w| w.wgm0().ctc());
    tc0.ocr0a.write(|w| w.bits(TIMER_COUNTS));
    tc0.tccr0b.write(|w| match PRESCALER {
        8 => w.cs0().prescale_8(),
        64 => w.cs0().prescale_64(),
        256 => w.cs0().prescale_256(),
        1024 => w.cs0().prescale_1024(),
        _ => w.cs0().direct(),
    });
    tc0.timsk0.write(|w| w.ocie0a().set_bit());

    // Reset the global millisecond counter
    avr_device::interrupt::free(|cs| TIMER.borrow(cs).set(Some(Timer::default())));
}

/// Get the current value of the timer.
pub fn get_timer() -> Timer {
    avr_device::interrupt::free(|cs| TIMER.borrow(cs).get()).unwrap_or_default()
}
