//! 16x2 character LCD, HD44780 behind a PCF8574 I2C expander
use access_core::outputs::{CharacterLcd, Row, COLUMNS};
use hd44780_driver::{
    bus::I2CBus, error::Error, Cursor, CursorBlink, Display, DisplayMode, HD44780,
};

/// DDRAM address of the first char of each row
const ROW_ADDRESSES: [u8; 2] = [0x00, 0x40];

pub struct Lcd {
    driver: HD44780<I2CBus<arduino_hal::I2c>>,
    delay: arduino_hal::Delay,
}

impl Lcd {
    /// Reset the controller: display on, cursor hidden, screen empty.
    pub fn init(i2c: arduino_hal::I2c, address: u8) -> Result<Self, Error> {
        let mut delay = arduino_hal::Delay::new();
        let mut driver = HD44780::new_i2c(i2c, address, &mut delay)?;
        driver.reset(&mut delay)?;
        driver.clear(&mut delay)?;
        driver.set_display_mode(
            DisplayMode {
                display: Display::On,
                cursor_visibility: Cursor::Invisible,
                cursor_blink: CursorBlink::Off,
            },
            &mut delay,
        )?;
        Ok(Self { driver, delay })
    }
}

impl CharacterLcd for Lcd {
    type Error = Error;

    fn write_row(&mut self, row: Row, text: &[u8; COLUMNS]) -> Result<(), Self::Error> {
        self.driver
            .set_cursor_pos(ROW_ADDRESSES[row.index()], &mut self.delay)?;
        self.driver.write_bytes(text, &mut self.delay)
    }
}
