//! Text sink for a 16x2 character LCD, buffered and rendered on demand.

/// Number of characters per row of the display.
pub const COLUMNS: usize = 16;

/// Row of the two-line display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row {
    /// First (upper) row
    Top,
    /// Second (lower) row, used for the transient messages
    Bottom,
}

impl Row {
    /// Index of the row, 0 for the top one.
    pub fn index(self) -> usize {
        match self {
            Row::Top => 0,
            Row::Bottom => 1,
        }
    }
}

/// Narrow text interface used by the controller to talk to the display.
/// No wrapping: text going beyond the last column is dropped.
pub trait DisplaySink {
    /// Write the text at the given position.
    fn write_at(&mut self, row: Row, column: usize, text: &str);

    /// Blank the whole display.
    fn clear(&mut self);

    /// Blank one row.
    fn clear_row(&mut self, row: Row) {
        self.write_at(row, 0, BLANK_ROW);
    }

    /// Replace the whole row by the text, padded with spaces.
    fn write_line(&mut self, row: Row, text: &str) {
        self.clear_row(row);
        self.write_at(row, 0, text);
    }
}

/// Physical character display, able to overwrite a full row.
pub trait CharacterLcd {
    type Error;

    /// Write the 16 characters of the row.
    fn write_row(&mut self, row: Row, text: &[u8; COLUMNS]) -> Result<(), Self::Error>;
}

const BLANK_ROW: &str = "                ";

/// One row worth of characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowBuffer([u8; COLUMNS]);

impl Default for RowBuffer {
    fn default() -> Self {
        Self([b' '; COLUMNS])
    }
}

/// Frame buffer structure
#[derive(Debug, Default)]
pub struct FrameBuffer {
    /// Actual, known, content of the display.
    /// None until the row has been rendered once.
    current: [Option<RowBuffer>; 2],
    /// Buffered content of the display,
    /// applied at the next call to render
    buffer: [RowBuffer; 2],
}

impl FrameBuffer {
    /// Render buffered rows (if necessary) to the display.
    /// Rows whose buffered and actual content are equal are skipped,
    /// rows that failed to render are retried on the next call.
    pub fn render<L: CharacterLcd>(&mut self, lcd: &mut L) -> Result<(), L::Error> {
        for row in [Row::Top, Row::Bottom] {
            let index = row.index();
            if self.current[index] != Some(self.buffer[index]) {
                lcd.write_row(row, &self.buffer[index].0)?;
                self.current[index] = Some(self.buffer[index]);
            }
        }
        Ok(())
    }

    /// Buffered text of the row, as it will be displayed after the next render.
    pub fn text(&self, row: Row) -> &str {
        core::str::from_utf8(&self.buffer[row.index()].0).unwrap_or("")
    }
}

impl DisplaySink for FrameBuffer {
    fn write_at(&mut self, row: Row, column: usize, text: &str) {
        let cells = &mut self.buffer[row.index()].0;
        for (cell, byte) in cells.iter_mut().skip(column).zip(text.bytes()) {
            // The controller of the LCD only knows ASCII
            *cell = if byte.is_ascii() && !byte.is_ascii_control() {
                byte
            } else {
                b'?'
            };
        }
    }

    fn clear(&mut self) {
        self.buffer = Default::default();
    }
}

/// A line of text built with ufmt, truncated at the width of the display.
#[derive(Debug, Clone, Copy)]
pub struct Line {
    bytes: [u8; COLUMNS],
    len: usize,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            bytes: [b' '; COLUMNS],
            len: 0,
        }
    }
}

impl Line {
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.bytes[..self.len]).unwrap_or("")
    }
}

impl ufmt::uWrite for Line {
    type Error = ();

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        for byte in s.bytes() {
            if self.len == COLUMNS {
                break;
            }
            self.bytes[self.len] = byte;
            self.len += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeLcd;

    #[test]
    fn write_is_truncated_at_last_column() {
        let mut frame = FrameBuffer::default();
        frame.write_at(Row::Top, 10, "ABCDEFGHIJ");
        assert_eq!(frame.text(Row::Top), "          ABCDEF");
        frame.write_at(Row::Top, 20, "lost");
        assert_eq!(frame.text(Row::Top), "          ABCDEF");
    }

    #[test]
    fn write_line_pads_with_spaces() {
        let mut frame = FrameBuffer::default();
        frame.write_at(Row::Bottom, 0, "Wrong Password");
        frame.write_line(Row::Bottom, "Ok");
        assert_eq!(frame.text(Row::Bottom), "Ok              ");
    }

    #[test]
    fn non_ascii_is_replaced() {
        let mut frame = FrameBuffer::default();
        frame.write_at(Row::Top, 0, "é\n");
        assert!(frame.text(Row::Top).starts_with("???"));
    }

    #[test]
    fn render_only_changed_rows() {
        let mut frame = FrameBuffer::default();
        let mut lcd = FakeLcd::default();

        frame.write_at(Row::Top, 0, "Relay");
        frame.render(&mut lcd).unwrap();
        assert_eq!(lcd.row_writes, 2);
        assert_eq!(lcd.rows[0], "Relay           ");

        frame.render(&mut lcd).unwrap();
        assert_eq!(lcd.row_writes, 2);

        frame.write_line(Row::Bottom, "Button: ON");
        frame.render(&mut lcd).unwrap();
        assert_eq!(lcd.row_writes, 3);
        assert_eq!(lcd.rows[1], "Button: ON      ");

        // Same content written again: nothing to do
        frame.write_line(Row::Top, "Relay");
        frame.render(&mut lcd).unwrap();
        assert_eq!(lcd.row_writes, 3);
    }

    #[test]
    fn failed_render_is_retried() {
        let mut frame = FrameBuffer::default();
        let mut lcd = FakeLcd {
            fail: true,
            ..Default::default()
        };
        frame.write_at(Row::Top, 0, "Enter: 00");
        assert!(frame.render(&mut lcd).is_err());

        lcd.fail = false;
        frame.render(&mut lcd).unwrap();
        assert_eq!(lcd.rows[0], "Enter: 00       ");
    }

    #[test]
    fn line_truncates() {
        let mut line = Line::default();
        ufmt::uwrite!(&mut line, "Count: {}", 65535u16).unwrap();
        assert_eq!(line.as_str(), "Count: 65535");
        ufmt::uwrite!(&mut line, "0123456789").unwrap();
        assert_eq!(line.as_str(), "Count: 655350123");
    }
}
