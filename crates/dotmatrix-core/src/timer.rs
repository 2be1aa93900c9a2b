use crate::interrupts::Interrupt;

/// DIV increments once every 256 cycles.
pub const DIV_PERIOD: u32 = 256;

/// TIMA periods selected by TAC bits 0-1.
/// See: https://gbdev.io/pandocs/Timer_and_Divider_Registers.html
const TIMA_PERIODS: [u32; 4] = [1024, 16, 64, 256];

pub struct Timer {
    /// Divider register.
    pub div: u8,
    /// Timer counter
    pub tima: u8,
    /// Timer modulo
    pub tma: u8,
    /// Timer control, low three bits.
    pub tac: u8,
    div_counter: u32,
    tima_counter: u32,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            div: 0,
            tima: 0,
            tma: 0,
            tac: 0,
            div_counter: 0,
            tima_counter: 0,
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF04 => self.div,
            0xFF05 => self.tima,
            0xFF06 => self.tma,
            0xFF07 => self.tac | 0xF8,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF04 => self.reset_div(),
            0xFF05 => self.tima = val,
            0xFF06 => self.tma = val,
            0xFF07 => {
                let was_enabled = self.enabled();
                self.tac = val & 0x07;
                if !was_enabled && self.enabled() {
                    self.tima_counter = 0;
                }
            }
            _ => {}
        }
    }

    pub fn enabled(&self) -> bool {
        self.tac & 0x04 != 0
    }

    /// Number of cycles per TIMA increment under the current TAC.
    pub fn period(&self) -> u32 {
        TIMA_PERIODS[(self.tac & 0x03) as usize]
    }

    /// Advance the timer by `cycles` CPU cycles and set the timer bit in IF
    /// when TIMA overflows.
    pub fn step(&mut self, cycles: u32, if_reg: &mut u8) {
        self.div_counter += cycles;
        while self.div_counter >= DIV_PERIOD {
            self.div_counter -= DIV_PERIOD;
            self.div = self.div.wrapping_add(1);
        }

        if !self.enabled() {
            return;
        }

        let period = self.period();
        self.tima_counter += cycles;
        while self.tima_counter >= period {
            self.tima_counter -= period;
            let (next, overflow) = self.tima.overflowing_add(1);
            if overflow {
                self.tima = self.tma;
                *if_reg |= Interrupt::Timer.bit();
            } else {
                self.tima = next;
            }
        }
    }

    /// Writing any value to DIV clears it together with the prescaler that
    /// feeds TIMA.
    pub fn reset_div(&mut self) {
        self.div = 0;
        self.div_counter = 0;
        self.tima_counter = 0;
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_timer_only_ticks_div() {
        let mut t = Timer::new();
        let mut if_reg = 0u8;
        t.step(4096, &mut if_reg);
        assert_eq!(t.div, 16);
        assert_eq!(t.tima, 0);
        assert_eq!(if_reg, 0);
    }

    #[test]
    fn tac_select_changes_period() {
        let mut t = Timer::new();
        t.write(0xFF07, 0x05);
        assert_eq!(t.period(), 16);
        t.write(0xFF07, 0x06);
        assert_eq!(t.period(), 64);
        t.write(0xFF07, 0x07);
        assert_eq!(t.period(), 256);
        t.write(0xFF07, 0x04);
        assert_eq!(t.period(), 1024);
        assert_eq!(t.read(0xFF07), 0xFC);
    }
}
