use log::{debug, info};

use crate::{
    bus::{IoBus, MemoryBus},
    cartridge::{Cartridge, CartridgeEvent},
    input::{Buttons, Joypad},
    interrupts::{INTERRUPT_MASK, Interrupt},
    serial::Serial,
    timer::Timer,
};

pub const VRAM_SIZE: usize = 0x2000;
pub const WRAM_SIZE: usize = 0x2000;
pub const OAM_SIZE: usize = 0xA0;
pub const BOOT_ROM_SIZE: usize = 0x100;

pub const P1: u16 = 0xFF00;
pub const IF: u16 = 0xFF0F;
pub const NR10: u16 = 0xFF10;
pub const NR14: u16 = 0xFF14;
pub const NR24: u16 = 0xFF19;
pub const NR34: u16 = 0xFF1E;
pub const NR44: u16 = 0xFF23;
pub const NR51: u16 = 0xFF25;
pub const NR52: u16 = 0xFF26;
pub const WAVE_RAM: u16 = 0xFF30;
pub const LCDC: u16 = 0xFF40;
pub const STAT: u16 = 0xFF41;
pub const SCY: u16 = 0xFF42;
pub const SCX: u16 = 0xFF43;
pub const LY: u16 = 0xFF44;
pub const LYC: u16 = 0xFF45;
pub const DMA: u16 = 0xFF46;
pub const BGP: u16 = 0xFF47;
pub const OBP0: u16 = 0xFF48;
pub const OBP1: u16 = 0xFF49;
pub const WY: u16 = 0xFF4A;
pub const WX: u16 = 0xFF4B;
pub const BOOT_OFF: u16 = 0xFF50;
pub const IE: u16 = 0xFFFF;

/// Bits that read back as 1 for 0xFF10-0xFF2F.
/// See: https://gbdev.io/pandocs/Audio_Registers.html
const SOUND_READ_MASKS: [u8; 0x20] = [
    0x80, 0x3F, 0x00, 0xFF, 0xBF, // NR10-NR14
    0xFF, 0x3F, 0x00, 0xFF, 0xBF, // unused, NR21-NR24
    0x7F, 0xFF, 0x9F, 0xFF, 0xBF, // NR30-NR34
    0xFF, 0xFF, 0x00, 0x00, 0xBF, // unused, NR41-NR44
    0x00, 0x00, 0x70, // NR50-NR52
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
];

/// I/O state left behind by the DMG boot ROM.
const POST_BOOT_IO: &[(u16, u8)] = &[
    (NR10, 0x80),
    (0xFF11, 0xBF),
    (0xFF12, 0xF3),
    (0xFF13, 0xFF),
    (NR14, 0xBF),
    (0xFF16, 0x3F),
    (0xFF18, 0xFF),
    (NR24, 0xBF),
    (0xFF1A, 0x7F),
    (0xFF1B, 0xFF),
    (0xFF1C, 0x9F),
    (0xFF1D, 0xFF),
    (NR34, 0xBF),
    (0xFF20, 0xFF),
    (NR44, 0xBF),
    (0xFF24, 0x77),
    (NR51, 0xF3),
    (NR52, 0xF1),
    (LCDC, 0x91),
    (STAT, 0x85),
    (DMA, 0xFF),
    (BGP, 0xFC),
    (OBP0, 0xFF),
    (OBP1, 0xFF),
    (BOOT_OFF, 0x01),
];

/// Side effects of CPU writes, drained by the console after every
/// instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusEvents {
    /// Bit n set when channel n+1 was triggered.
    pub sound_triggers: u8,
    /// Bit n set when the length register (NRx1) of channel n+1 was written.
    pub length_loads: u8,
    /// The cartridge RAM-enable latch was written with a disable value.
    pub ram_disabled: bool,
}

impl BusEvents {
    pub fn is_empty(&self) -> bool {
        self.sound_triggers == 0 && self.length_loads == 0 && !self.ram_disabled
    }
}

pub struct Mmu {
    boot_rom: Option<Vec<u8>>,
    booting: bool,
    cart: Option<Cartridge>,
    vram: Box<[u8; VRAM_SIZE]>,
    wram: Box<[u8; WRAM_SIZE]>,
    oam: [u8; OAM_SIZE],
    /// Raw storage for 0xFF00-0xFFFF: named registers without a dedicated
    /// owner, wave RAM, high RAM and IE.
    io: [u8; 0x100],
    pub if_reg: u8,
    pub timer: Timer,
    pub joypad: Joypad,
    pub serial: Serial,
    events: BusEvents,
}

impl Mmu {
    /// Power-on state expected by a boot ROM.
    pub fn new() -> Self {
        Self {
            boot_rom: None,
            booting: false,
            cart: None,
            vram: Box::new([0; VRAM_SIZE]),
            wram: Box::new([0; WRAM_SIZE]),
            oam: [0; OAM_SIZE],
            io: [0; 0x100],
            if_reg: 0,
            timer: Timer::new(),
            joypad: Joypad::new(),
            serial: Serial::new(),
            events: BusEvents::default(),
        }
    }

    /// Register state as the boot ROM leaves it, for running without one.
    pub fn new_post_boot() -> Self {
        let mut mmu = Self::new();
        for &(addr, val) in POST_BOOT_IO {
            mmu.io[(addr & 0xFF) as usize] = val;
        }
        mmu.if_reg = 0x01;
        mmu.timer.div = 0xAB;
        mmu
    }

    pub fn load_cart(&mut self, cart: Cartridge) {
        self.cart = Some(cart);
    }

    pub fn take_cart(&mut self) -> Option<Cartridge> {
        self.cart.take()
    }

    pub fn cart(&self) -> Option<&Cartridge> {
        self.cart.as_ref()
    }

    pub fn cart_mut(&mut self) -> Option<&mut Cartridge> {
        self.cart.as_mut()
    }

    /// Map a boot ROM over 0x0000-0x00FF until PC reaches 0x0100.
    pub fn load_boot_rom(&mut self, data: Vec<u8>) {
        self.boot_rom = Some(data);
        self.booting = true;
        self.io[(BOOT_OFF & 0xFF) as usize] = 0;
    }

    pub fn take_boot_rom(&mut self) -> Option<Vec<u8>> {
        self.booting = false;
        self.boot_rom.take()
    }

    pub fn booting(&self) -> bool {
        self.booting
    }

    /// Unmap the boot ROM. Idempotent.
    pub fn finish_boot(&mut self) {
        if self.booting {
            info!("Boot ROM unmapped");
            self.booting = false;
            self.io[(BOOT_OFF & 0xFF) as usize] = 0x01;
        }
    }

    pub fn take_events(&mut self) -> BusEvents {
        std::mem::take(&mut self.events)
    }

    /// Advance the divider, TIMA and the serial shifter.
    pub fn step_timers(&mut self, cycles: u32) {
        self.timer.step(cycles, &mut self.if_reg);
        self.serial.step(cycles, &mut self.if_reg);
    }

    pub fn set_buttons(&mut self, buttons: Buttons) {
        if self.joypad.update(buttons) {
            self.if_reg |= Interrupt::Joypad.bit();
        }
    }

    pub fn ie(&self) -> u8 {
        self.io[0xFF]
    }

    /// Interrupts both requested and enabled.
    pub fn pending_interrupts(&self) -> u8 {
        self.if_reg & self.ie() & INTERRUPT_MASK
    }

    pub fn clear_interrupt(&mut self, interrupt: Interrupt) {
        self.if_reg &= !interrupt.bit();
    }

    fn apu_powered(&self) -> bool {
        self.io[(NR52 & 0xFF) as usize] & 0x80 != 0
    }

    fn oam_dma(&mut self, page: u8) {
        let src = (page as u16) << 8;
        for i in 0..OAM_SIZE as u16 {
            let byte = self.read(src.wrapping_add(i));
            self.oam[i as usize] = byte;
        }
    }

    fn write_sound(&mut self, addr: u16, val: u8) {
        let idx = (addr & 0xFF) as usize;
        if addr == NR52 {
            let channels = self.io[idx] & 0x0F;
            if val & 0x80 == 0 {
                if self.apu_powered() {
                    debug!("APU powered off");
                }
                for reg in NR10..NR52 {
                    self.io[(reg & 0xFF) as usize] = 0;
                }
                self.io[idx] = 0;
            } else {
                self.io[idx] = 0x80 | channels;
            }
            return;
        }
        if !self.apu_powered() {
            return;
        }
        self.io[idx] = val;

        if let Some(channel) = [0xFF11, 0xFF16, 0xFF1B, 0xFF20].iter().position(|&r| r == addr) {
            self.events.length_loads |= 1 << channel;
            return;
        }

        let channel = match addr {
            NR14 => 0,
            NR24 => 1,
            NR34 => 2,
            NR44 => 3,
            _ => return,
        };
        if val & 0x80 != 0 {
            self.io[(NR52 & 0xFF) as usize] |= 1 << channel;
            self.events.sound_triggers |= 1 << channel;
        }
    }

    fn write_io(&mut self, addr: u16, val: u8) {
        let idx = (addr & 0xFF) as usize;
        match addr {
            P1 => {
                if self.joypad.write(val) {
                    self.if_reg |= Interrupt::Joypad.bit();
                }
            }
            0xFF01 | 0xFF02 => self.serial.write(addr, val),
            0xFF04..=0xFF07 => self.timer.write(addr, val),
            IF => self.if_reg = val & INTERRUPT_MASK,
            NR10..=NR52 => self.write_sound(addr, val),
            LCDC => {
                if val & 0x80 == 0 && self.io[idx] & 0x80 != 0 {
                    self.io[(LY & 0xFF) as usize] = 0;
                    self.io[(STAT & 0xFF) as usize] &= !0x03;
                }
                self.io[idx] = val;
            }
            STAT => self.io[idx] = (self.io[idx] & 0x07) | (val & 0x78),
            LY => {}
            DMA => {
                self.io[idx] = val;
                self.oam_dma(val);
            }
            BOOT_OFF => {
                if val != 0 {
                    self.finish_boot();
                }
            }
            _ => self.io[idx] = val,
        }
    }

    fn read_io(&self, addr: u16) -> u8 {
        let idx = (addr & 0xFF) as usize;
        match addr {
            P1 => self.joypad.read(),
            0xFF01 | 0xFF02 => self.serial.read(addr),
            0xFF04..=0xFF07 => self.timer.read(addr),
            IF => self.if_reg | 0xE0,
            NR10..=0xFF2F => self.io[idx] | SOUND_READ_MASKS[(addr - NR10) as usize],
            STAT => self.io[idx] | 0x80,
            _ => self.io[idx],
        }
    }
}

impl MemoryBus for Mmu {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x00FF if self.booting => self
                .boot_rom
                .as_ref()
                .and_then(|rom| rom.get(addr as usize).copied())
                .unwrap_or(0xFF),
            0x0000..=0x7FFF => self.cart.as_ref().map_or(0xFF, |c| c.read(addr)),
            0x8000..=0x9FFF => self.vram[(addr - 0x8000) as usize],
            0xA000..=0xBFFF => self.cart.as_ref().map_or(0xFF, |c| c.read_ram(addr)),
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize],
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize],
            0xFE00..=0xFE9F => self.oam[(addr - 0xFE00) as usize],
            0xFEA0..=0xFEFF => 0xFF,
            0xFF00..=0xFFFF => self.read_io(addr),
        }
    }

    fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x7FFF => {
                if let Some(cart) = self.cart.as_mut() {
                    if let Some(CartridgeEvent::RamDisabled) = cart.write(addr, val) {
                        self.events.ram_disabled = true;
                    }
                }
            }
            0x8000..=0x9FFF => self.vram[(addr - 0x8000) as usize] = val,
            0xA000..=0xBFFF => {
                if let Some(cart) = self.cart.as_mut() {
                    cart.write_ram(addr, val);
                }
            }
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize] = val,
            0xE000..=0xFDFF => self.wram[(addr - 0xE000) as usize] = val,
            0xFE00..=0xFE9F => self.oam[(addr - 0xFE00) as usize] = val,
            0xFEA0..=0xFEFF => {}
            0xFF00..=0xFFFF => self.write_io(addr, val),
        }
    }
}

impl IoBus for Mmu {
    fn io(&self, addr: u16) -> u8 {
        if addr == IF {
            self.if_reg
        } else {
            self.io[(addr & 0xFF) as usize]
        }
    }

    fn set_io(&mut self, addr: u16, val: u8) {
        if addr == IF {
            self.if_reg = val & INTERRUPT_MASK;
        } else {
            self.io[(addr & 0xFF) as usize] = val;
        }
    }

    fn vram(&self) -> &[u8] {
        &self.vram[..]
    }

    fn oam(&self) -> &[u8] {
        &self.oam
    }

    fn request_interrupt(&mut self, interrupt: Interrupt) {
        self.if_reg |= interrupt.bit();
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}
