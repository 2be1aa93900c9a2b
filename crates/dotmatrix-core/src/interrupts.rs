/// Interrupt sources in dispatch priority order.
///
/// See: https://gbdev.io/pandocs/Interrupts.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interrupt {
    VBlank,
    LcdStat,
    Timer,
    Serial,
    Joypad,
}

/// Mask of the IF/IE bits that carry meaning.
pub const INTERRUPT_MASK: u8 = 0x1F;

impl Interrupt {
    pub const ALL: [Interrupt; 5] = [
        Interrupt::VBlank,
        Interrupt::LcdStat,
        Interrupt::Timer,
        Interrupt::Serial,
        Interrupt::Joypad,
    ];

    /// Bit in IF/IE.
    pub const fn bit(self) -> u8 {
        match self {
            Interrupt::VBlank => 0x01,
            Interrupt::LcdStat => 0x02,
            Interrupt::Timer => 0x04,
            Interrupt::Serial => 0x08,
            Interrupt::Joypad => 0x10,
        }
    }

    /// Fixed ISR address.
    pub const fn vector(self) -> u16 {
        match self {
            Interrupt::VBlank => 0x0040,
            Interrupt::LcdStat => 0x0048,
            Interrupt::Timer => 0x0050,
            Interrupt::Serial => 0x0058,
            Interrupt::Joypad => 0x0060,
        }
    }

    /// Highest-priority source in `pending` (usually `IE & IF`), scanning from
    /// bit 0 upwards.
    pub fn highest_priority(pending: u8) -> Option<Interrupt> {
        Self::ALL
            .into_iter()
            .find(|interrupt| pending & interrupt.bit() != 0)
    }
}
