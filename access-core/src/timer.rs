//! Millisecond timer values, as produced by the hardware timer interrupt.

/// Milliseconds elapsed since boot, new-type pattern.
/// The value wraps around after about 65 seconds: only differences
/// between two readings are meaningful.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timer(pub u16);

impl ufmt::uDisplay for Timer {
    /// Formatter for the serial output.
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        self.0.fmt(f)
    }
}

impl Timer {
    /// Advance the timer by some milliseconds, wrapping at u16::MAX.
    pub fn increment(&mut self, millis: u16) {
        self.0 = self.0.wrapping_add(millis);
    }

    /// Milliseconds elapsed between `start` and this instant.
    pub fn elapsed_since(self, start: Timer) -> u16 {
        (self - start).0
    }

    /// Whether at least `duration_ms` elapsed between `start` and this instant.
    pub fn has_elapsed(self, start: Timer, duration_ms: u16) -> bool {
        self.elapsed_since(start) >= duration_ms
    }
}

impl core::ops::Sub for Timer {
    type Output = Timer;

    /// Difference of timer, taking into account wrapping.
    /// The result is meaningful only if both arguments are
    /// less than a full wrap apart.
    fn sub(self, rhs: Self) -> Self::Output {
        Timer(self.0.wrapping_sub(rhs.0))
    }
}

impl core::ops::Add<u16> for Timer {
    type Output = Timer;

    fn add(self, rhs: u16) -> Self::Output {
        Timer(self.0.wrapping_add(rhs))
    }
}
