//! Fake peripherals for the host tests.
use crate::outputs::{CharacterLcd, Row, COLUMNS};
use crate::Key;
use core::convert::Infallible;
use embedded_hal::blocking::delay::DelayUs;
use embedded_hal::digital::v2::{InputPin, OutputPin};
use std::{cell::Cell, cell::RefCell, rc::Rc, string::String, vec::Vec};

/// A pin whose electrical level is shared with the test,
/// usable both as input and output.
#[derive(Clone, Default)]
pub struct FakePin(Rc<Cell<bool>>);

impl FakePin {
    pub fn new(high: bool) -> Self {
        Self(Rc::new(Cell::new(high)))
    }

    pub fn is_set_high(&self) -> bool {
        self.0.get()
    }

    pub fn drive(&self, high: bool) {
        self.0.set(high);
    }
}

impl InputPin for FakePin {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}

impl OutputPin for FakePin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set(true);
        Ok(())
    }
}

/// Delay provider returning immediately.
pub struct NoDelay;

impl DelayUs<u16> for NoDelay {
    fn delay_us(&mut self, _us: u16) {}
}

#[derive(Default)]
struct MatrixState {
    /// Rows currently driven low
    driven_low: [bool; 4],
    /// Keys held down, as (row, column)
    held: Vec<(usize, usize)>,
}

/// Electrical model of a 4x4 keypad: a column reads low when a held key
/// connects it to a row driven low.
#[derive(Clone, Default)]
pub struct FakeMatrix(Rc<RefCell<MatrixState>>);

impl FakeMatrix {
    pub fn rows(&self) -> [FakeRow; 4] {
        [0, 1, 2, 3].map(|index| FakeRow {
            index,
            matrix: self.clone(),
        })
    }

    pub fn columns(&self) -> [FakeColumn; 4] {
        [0, 1, 2, 3].map(|index| FakeColumn {
            index,
            matrix: self.clone(),
        })
    }

    /// Hold the key down, at the position given by the symbol table.
    pub fn hold(&self, key: Key) {
        let position = crate::keypad::position_of(key).unwrap();
        self.0.borrow_mut().held.push(position);
    }

    pub fn release_all(&self) {
        self.0.borrow_mut().held.clear();
    }

    pub fn any_row_driven(&self) -> bool {
        self.0.borrow().driven_low.iter().any(|&low| low)
    }
}

pub struct FakeRow {
    index: usize,
    matrix: FakeMatrix,
}

impl OutputPin for FakeRow {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.matrix.0.borrow_mut().driven_low[self.index] = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.matrix.0.borrow_mut().driven_low[self.index] = false;
        Ok(())
    }
}

pub struct FakeColumn {
    index: usize,
    matrix: FakeMatrix,
}

impl InputPin for FakeColumn {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        self.is_low().map(|low| !low)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        let state = self.matrix.0.borrow();
        Ok(state
            .held
            .iter()
            .any(|&(row, column)| column == self.index && state.driven_low[row]))
    }
}

/// LCD remembering its content and the number of row writes.
#[derive(Default)]
pub struct FakeLcd {
    pub rows: [String; 2],
    pub row_writes: usize,
    pub fail: bool,
}

impl CharacterLcd for FakeLcd {
    type Error = ();

    fn write_row(&mut self, row: Row, text: &[u8; COLUMNS]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(());
        }
        self.rows[row.index()] = String::from_utf8(text.to_vec()).unwrap();
        self.row_writes += 1;
        Ok(())
    }
}

/// Collects ufmt output for assertions.
#[derive(Default)]
pub struct TextSink(pub String);

impl ufmt::uWrite for TextSink {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.0.push_str(s);
        Ok(())
    }
}
