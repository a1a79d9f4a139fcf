//! Notable things happening in the controller, reported for the serial log.
use crate::Mode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The mode-advance key was pressed
    ModeChanged(Mode),
    /// The relay switch changed the relay, new state attached
    RelaySwitched(bool),
    /// Up or down edge in counter mode, new value attached
    CounterChanged(u16),
    PasswordSaved,
    InputCleared,
    AccessGranted,
    AccessDenied,
    /// Confirmed emergency, the lockdown begins
    EmergencyStarted,
    /// The lockdown is over, normal operation resumes
    EmergencyEnded,
    /// Emergency interrupt while the line was not asserted anymore
    SpuriousTrigger,
}

impl ufmt::uDisplay for Event {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        match self {
            Event::ModeChanged(mode) => ufmt::uwrite!(f, "Mode {}", mode),
            Event::RelaySwitched(true) => f.write_str("Relay on"),
            Event::RelaySwitched(false) => f.write_str("Relay off"),
            Event::CounterChanged(count) => ufmt::uwrite!(f, "Count {}", count),
            Event::PasswordSaved => f.write_str("Password saved"),
            Event::InputCleared => f.write_str("Input cleared"),
            Event::AccessGranted => f.write_str("Access granted"),
            Event::AccessDenied => f.write_str("Access denied"),
            Event::EmergencyStarted => f.write_str("Emergency"),
            Event::EmergencyEnded => f.write_str("Emergency over"),
            Event::SpuriousTrigger => f.write_str("Spurious emergency"),
        }
    }
}
