//! Hardware side of the serial console
use access_core::console::Console;
use arduino_hal::hal::usart::Usart0;
use core::cell::RefCell;
use embedded_hal::serial::Read;
use ringbuffer::{ConstGenericRingBuffer, RingBuffer};

/// Size, in bytes, of the buffer filled by the interrupt
const SERIAL_RX_BUFFER_SIZE: usize = 16;

/// Interface with the hardware USART
pub static USART_MUTEX: avr_device::interrupt::Mutex<
    RefCell<Option<Usart0<arduino_hal::DefaultClock>>>,
> = avr_device::interrupt::Mutex::new(RefCell::new(None));
/// Buffer containing the input bytes read on the USART (there is no hardware buffer)
static SERIAL_RX_BUFFER: avr_device::interrupt::Mutex<
    RefCell<ConstGenericRingBuffer<u8, SERIAL_RX_BUFFER_SIZE>>,
> = avr_device::interrupt::Mutex::new(RefCell::new(ConstGenericRingBuffer::new()));

/// Read one byte of the USART into local buffer, via interupt mechanism.
#[avr_device::interrupt(atmega328p)]
unsafe fn USART_RX() {
    avr_device::interrupt::free(|cs| {
        if let Some(ref mut usart) = USART_MUTEX.borrow(cs).borrow_mut().as_mut() {
            let mut rx_buffer = SERIAL_RX_BUFFER.borrow(cs).borrow_mut();
            while let Ok(byte) = usart.read() {
                rx_buffer.push(byte);
            }
        }
    });
}

/// Move the bytes received by the interrupt into the console.
pub fn load<const W: usize, const R: usize>(console: &mut Console<W, R>) {
    avr_device::interrupt::free(|cs| {
        let mut rx_buffer = SERIAL_RX_BUFFER.borrow(cs).borrow_mut();
        while let Some(byte) = rx_buffer.dequeue() {
            console.receive(byte);
        }
    });
}

/// Actually print the pending output of the console on the USART.
pub fn flush<const W: usize, const R: usize>(console: &mut Console<W, R>) {
    avr_device::interrupt::free(|cs| {
        if let Some(ref mut usart) = USART_MUTEX.borrow(cs).borrow_mut().as_mut() {
            while let Some(byte) = console.transmit() {
                usart.write_byte(byte);
            }
        }
    });
}
