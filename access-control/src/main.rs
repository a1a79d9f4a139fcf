//! Keypad access controller for ATMEGA328P microprocessor
// Compiler commands appropriate for bare-metal development
#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

/*
References:
ATMEGA238p: https://www.e-lab.de/downloads/DOCs/mega328P.pdf
Arduino: https://content.arduino.cc/assets/A000066-full-pinout.pdf
Arduino: https://content.arduino.cc/assets/UNO-TH_Rev3e_sch.pdf

          +---O---+
      PC6 |1    28| PC5  I2C.SCL - a5
  RXD PD0 |2    27| PC4  I2C.SDA - a4
  TXD PD1 |3    26| PC3  keypad col 4 - a3
 INT0 PD2 |4    25| PC2  keypad col 3 - a2
      PD3 |5    24| PC1  keypad col 2 - a1
      PD4 |6    23| PC0  keypad col 1 - a0
      VCC |7    22| GND
      GND |8    21| AREF
      PB6 |9    20| AVCC
      PB7 |10   19| PB5
      PD5 |11   18| PB4
      PD6 |12   17| PB3  keypad row 4 - d11
      PD7 |13   16| PB2  keypad row 3 - d10
      PB0 |14   15| PB1  keypad row 2 - d9
          +-------+
*/

// Pinout of the peripherals, arduino labels
// d2: emergency line (INT0)
// d3: relay switch
// d4: up button
// d5: down button
// d6: buzzer
// d7: relay
// d8..d11: keypad rows
// a0..a3: keypad columns
// a4, a5: I2C bus of the LCD

/// Mapping between the electric levels (+3.3V or +5V) and the logical level of the emergency line
const EMERGENCY_LOGICAL_LEVEL_HIGH: bool = false;
/// Mapping between the electric levels (+3.3V or +5V) and the logical level of the relay switch
const RELAY_SWITCH_LOGICAL_LEVEL_HIGH: bool = false;
/// Mapping between the electric levels (+3.3V or +5V) and the logical level of the up/down sensors
const UP_DOWN_LOGICAL_LEVEL_HIGH: bool = true;
/// Mapping between the electric levels (+3.3V or +5V) and the logical level of the relay
const RELAY_LOGICAL_LEVEL_HIGH: bool = true;
/// Mapping between the electric levels (+3.3V or +5V) and the logical level of the buzzer
const BUZZER_LOGICAL_LEVEL_HIGH: bool = true;
/// Address of the PCF8574 expander of the LCD
const LCD_I2C_ADDRESS: u8 = 0x27;
/// Timings and factory password
const CONFIG: Config = Config::DEFAULT;

use access_core::{
    console::{Command, Console, CONSOLE_READ_BUFFER_SIZE, CONSOLE_WRITE_BUFFER_SIZE},
    inputs::{BoolInput, EdgeInput, Inputs},
    outputs::{Buzzer, Outputs, Relay},
    AccessControl, Config, Key, Keypad, Timer,
};
use arduino_hal::{
    hal::{port::Dynamic, wdt},
    port::{
        mode::{Input, Output, PullUp},
        Pin,
    },
};
use core::{
    panic::PanicInfo,
    sync::atomic::{self, Ordering},
};

mod emergency_line;
mod lcd;
mod serial;
mod timer;

type InputLine = Pin<Input<PullUp>, Dynamic>;
type OutputLine = Pin<Output, Dynamic>;

/// The main state of the whole program, updated at every loop,
/// holding the memory.
struct MainState<const WRITE_BUFFER_SIZE: usize, const READ_BUFFER_SIZE: usize> {
    /// Modes and emergency lockdown
    control: AccessControl,
    /// 4x4 matrix keypad
    keypad: Keypad<OutputLine, InputLine, arduino_hal::Delay>,
    /// Buttons, sensors and emergency line
    inputs: Inputs<InputLine>,
    /// Relay, buzzer and display content
    outputs: Outputs<OutputLine, OutputLine>,
    /// None if the LCD did not answer at boot: the controller runs blind
    lcd: Option<lcd::Lcd>,
    /// Serial I/O
    console: Console<WRITE_BUFFER_SIZE, READ_BUFFER_SIZE>,
    /// Key received on the console, handled at the next loop
    injected_key: Option<Key>,
}

impl<const WRITE_BUFFER_SIZE: usize, const READ_BUFFER_SIZE: usize>
    MainState<WRITE_BUFFER_SIZE, READ_BUFFER_SIZE>
{
    /// Run all the tasks needed to update the state/inputs/outputs.
    fn run(&mut self) {
        let now = timer::get_timer();
        self.update_inputs();
        self.process(now);
        self.update_outputs(now);
    }

    /// Update the inputs not tied to the controller, meant to be called before processing.
    fn update_inputs(&mut self) {
        serial::load(&mut self.console);
    }

    /// Update all the outputs for the user.
    fn update_outputs(&mut self, now: Timer) {
        serial::flush(&mut self.console);
        self.outputs.render(self.lcd.as_mut(), now).ok();
    }

    /// One step of the controller, then the console
    fn process(&mut self, now: Timer) {
        let (signal, edges) = self.inputs.sample(now, emergency_line::take_pending);
        let injected_key = self.injected_key.take();
        let keypad = &mut self.keypad;
        let console = &mut self.console;
        self.control.step(
            signal,
            edges,
            || injected_key.or_else(|| keypad.scan(now)),
            &mut self.outputs,
            now,
            |event| {
                ufmt::uwriteln!(&mut *console, "{}", event).ok();
            },
        );
        self.process_command();
    }

    /// Process commands received on serial input, if any
    fn process_command(&mut self) {
        loop {
            match self.console.dequeue_command() {
                Ok(None) => {
                    break;
                }
                Ok(Some(Command::QueryMode)) => {
                    ufmt::uwriteln!(&mut self.console, "{}", self.control.modes.mode()).ok();
                }
                Ok(Some(Command::QueryCounter)) => {
                    ufmt::uwriteln!(&mut self.console, "{}", self.control.modes.counter()).ok();
                }
                Ok(Some(Command::QueryRelay)) => {
                    let state = if self.outputs.relay.is_on() { "On" } else { "Off" };
                    ufmt::uwriteln!(&mut self.console, "{}", state).ok();
                }
                Ok(Some(Command::QueryEmergency)) => {
                    let state = if self.control.emergency.is_locked() {
                        "Locked"
                    } else {
                        "Idle"
                    };
                    ufmt::uwriteln!(&mut self.console, "{}", state).ok();
                }
                Ok(Some(Command::PressKey(key))) => {
                    self.injected_key = Some(key);
                    ufmt::uwriteln!(&mut self.console, "Ack").ok();
                }
                Err(()) => {
                    ufmt::uwriteln!(&mut self.console, "Bad command").ok();
                }
            }
        }
    }
}

/// Entry point: initialization of the devices and endless loop
#[arduino_hal::entry]
fn main() -> ! {
    // Acquire hardware objects
    let dp = arduino_hal::Peripherals::take().unwrap();
    let pins = arduino_hal::pins!(dp);
    let i2c = arduino_hal::I2c::new(
        dp.TWI,
        pins.a4.into_pull_up_input(),
        pins.a5.into_pull_up_input(),
        50000,
    );

    timer::init(dp.TC0);
    emergency_line::init(&dp.EXINT);

    let keypad = Keypad::new(
        [
            pins.d8.into_output().downgrade(),
            pins.d9.into_output().downgrade(),
            pins.d10.into_output().downgrade(),
            pins.d11.into_output().downgrade(),
        ],
        [
            pins.a0.into_pull_up_input().downgrade(),
            pins.a1.into_pull_up_input().downgrade(),
            pins.a2.into_pull_up_input().downgrade(),
            pins.a3.into_pull_up_input().downgrade(),
        ],
        arduino_hal::Delay::new(),
        CONFIG.row_settle_us,
        CONFIG.debounce_ms,
    );
    let inputs = Inputs::init(
        EdgeInput::init(
            pins.d3.into_pull_up_input().downgrade(),
            RELAY_SWITCH_LOGICAL_LEVEL_HIGH,
            CONFIG.debounce_ms,
        ),
        EdgeInput::init(
            pins.d4.into_pull_up_input().downgrade(),
            UP_DOWN_LOGICAL_LEVEL_HIGH,
            CONFIG.debounce_ms,
        ),
        EdgeInput::init(
            pins.d5.into_pull_up_input().downgrade(),
            UP_DOWN_LOGICAL_LEVEL_HIGH,
            CONFIG.debounce_ms,
        ),
        BoolInput::init(
            pins.d2.into_pull_up_input().downgrade(),
            EMERGENCY_LOGICAL_LEVEL_HIGH,
        ),
    );
    let outputs = Outputs::init(
        Relay::init(pins.d7.into_output().downgrade(), RELAY_LOGICAL_LEVEL_HIGH),
        Buzzer::init(pins.d6.into_output().downgrade(), BUZZER_LOGICAL_LEVEL_HIGH),
    );

    // Create main memory structure
    let mut main = MainState::<{ CONSOLE_WRITE_BUFFER_SIZE }, { CONSOLE_READ_BUFFER_SIZE }> {
        control: AccessControl::new(CONFIG),
        keypad,
        inputs,
        outputs,
        lcd: lcd::Lcd::init(i2c, LCD_I2C_ADDRESS).ok(),
        console: Default::default(),
        injected_key: None,
    };

    {
        // Setup the USART for serial in/out
        let mut usart = arduino_hal::default_serial!(dp, pins, 115200);
        usart.listen(arduino_hal::hal::usart::Event::RxComplete);
        avr_device::interrupt::free(|cs| {
            *serial::USART_MUTEX.borrow(cs).borrow_mut() = Some(usart);
        });
    }

    // Setup the hardware watchdog, in case something goes wrong.
    let mut watchdog = wdt::Wdt::new(dp.WDT, &dp.CPU.mcusr);
    watchdog.start(wdt::Timeout::Ms1000).unwrap();
    unsafe { avr_device::interrupt::enable() };

    // Display an init message
    ufmt::uwriteln!(main.console, "Start").ok();
    if main.lcd.is_none() {
        ufmt::uwriteln!(main.console, "No LCD").ok();
    }
    main.control.start(&mut main.outputs);
    main.update_outputs(timer::get_timer());

    loop {
        main.run();
        watchdog.feed();
    }
}

/// Panic handler: do nothing
#[inline(never)]
#[panic_handler]
fn panic(_info: &PanicInfo) -> ! {
    loop {
        atomic::compiler_fence(Ordering::SeqCst);
    }
}
