use crate::interrupts::Interrupt;

/// 8 bits at the 8192 Hz internal clock.
pub const TRANSFER_CYCLES: u32 = 4096;

/// SB/SC registers with no link partner attached.
///
/// Every byte the game shifts out with the internal clock is captured, which
/// is how test ROMs report results. Incoming bits read as 1, so a finished
/// transfer leaves SB at 0xFF.
#[derive(Debug, Default)]
pub struct Serial {
    sb: u8,
    sc: u8,
    remaining: Option<u32>,
    out_buf: Vec<u8>,
}

impl Serial {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF01 => self.sb,
            0xFF02 => self.sc | 0x7E,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF01 => self.sb = val,
            0xFF02 => {
                self.sc = val & 0x81;
                // External clock transfers never complete without a partner.
                if val & 0x81 == 0x81 {
                    self.out_buf.push(self.sb);
                    self.remaining = Some(TRANSFER_CYCLES);
                } else {
                    self.remaining = None;
                }
            }
            _ => {}
        }
    }

    pub fn step(&mut self, cycles: u32, if_reg: &mut u8) {
        let Some(remaining) = self.remaining else {
            return;
        };
        if remaining > cycles {
            self.remaining = Some(remaining - cycles);
            return;
        }
        self.remaining = None;
        self.sb = 0xFF;
        self.sc &= 0x7F;
        *if_reg |= Interrupt::Serial.bit();
    }

    /// Bytes sent so far.
    pub fn output(&self) -> &[u8] {
        &self.out_buf
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out_buf)
    }
}
