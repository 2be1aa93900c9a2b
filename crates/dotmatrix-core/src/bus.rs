use crate::interrupts::Interrupt;

/// The 16-bit address space as seen by the CPU.
///
/// Reads never have side effects; writes may (DIV reset, OAM DMA, bank
/// switching). The 16-bit helpers compose two byte accesses in little-endian
/// order.
pub trait MemoryBus {
    fn read(&self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, val: u8);

    fn read_word(&self, addr: u16) -> u16 {
        u16::from_le_bytes([self.read(addr), self.read(addr.wrapping_add(1))])
    }

    fn write_word(&mut self, addr: u16, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.write(addr, lo);
        self.write(addr.wrapping_add(1), hi);
    }
}

/// Peripheral-side access to video memory and the I/O block.
///
/// `io`/`set_io` touch the raw register storage at 0xFF00-0xFFFF and bypass
/// the CPU write side effects, so the PPU can drive LY and the STAT mode bits
/// that are read-only from the CPU.
pub trait IoBus {
    fn io(&self, addr: u16) -> u8;

    fn set_io(&mut self, addr: u16, val: u8);

    /// 8 KiB of video RAM, indexed from 0x8000.
    fn vram(&self) -> &[u8];

    /// 160 bytes of object attribute memory, indexed from 0xFE00.
    fn oam(&self) -> &[u8];

    fn request_interrupt(&mut self, interrupt: Interrupt);
}
