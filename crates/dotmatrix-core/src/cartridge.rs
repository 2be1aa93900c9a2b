use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use thiserror::Error;

const ROM_BANK_SIZE: usize = 0x4000;
const RAM_BANK_SIZE: usize = 0x2000;
const HEADER_END: usize = 0x0150;
const MBC2_RAM_SIZE: usize = 0x0200;

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("ROM image is empty")]
    EmptyRom,
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbcType {
    RomOnly,
    Mbc1,
    Mbc2,
    Mbc3,
    Mbc5,
}

/// Signals raised by cartridge writes that the owner should act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartridgeEvent {
    /// The game wrote a disable value to the RAM-enable latch. Usually
    /// happens right after a save, so it is a good time to flush.
    RamDisabled,
}

#[derive(Debug)]
pub struct Cartridge {
    rom: Vec<u8>,
    ram: Vec<u8>,
    mbc: MbcType,
    title: String,
    cart_type: u8,
    rom_bank: u16,
    ram_bank: u8,
    ram_enabled: bool,
    /// MBC1 mode 1: the upper register also drives RAM and the 0x0000 window.
    banking_mode: bool,
    save_path: Option<PathBuf>,
}

impl Cartridge {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, CartridgeError> {
        if data.is_empty() {
            return Err(CartridgeError::EmptyRom);
        }

        let header = Header::parse(&data);
        let cart_type = header.cart_type();
        let mbc = header.mbc_type();
        let ram_size = header.ram_size();
        let title = header.title();

        if let Some(expected) = header.rom_size() {
            if expected != data.len() {
                warn!(
                    "ROM header declares {expected} bytes but image is {} bytes",
                    data.len()
                );
            }
        }

        Ok(Self {
            rom: data,
            ram: vec![0; ram_size],
            mbc,
            title,
            cart_type,
            rom_bank: 1,
            ram_bank: 0,
            ram_enabled: mbc == MbcType::RomOnly,
            banking_mode: false,
            save_path: None,
        })
    }

    /// Load a ROM image and, for battery-backed carts, the `.sav` file that
    /// sits next to it. A missing save leaves RAM zeroed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let mut cart = Self::from_bytes(data)?;

        if cart.has_battery() {
            let save = path.with_extension("sav");
            match fs::read(&save) {
                Ok(bytes) => {
                    for (d, s) in cart.ram.iter_mut().zip(bytes.iter()) {
                        *d = *s;
                    }
                    info!("Loaded save file {}", save.display());
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
            cart.save_path = Some(save);
        }

        info!("Loaded ROM: {} (MBC: {:?})", cart.title, cart.mbc);
        Ok(cart)
    }

    /// Write battery RAM to the save file. Returns whether a file was written;
    /// carts without a battery, without a save path, or with all-zero RAM are
    /// skipped.
    pub fn save_ram(&self) -> Result<bool, CartridgeError> {
        let Some(path) = &self.save_path else {
            return Ok(false);
        };
        if !self.has_battery() || self.ram.iter().all(|&b| b == 0) {
            return Ok(false);
        }
        fs::write(path, &self.ram)?;
        info!("Wrote {} bytes to {}", self.ram.len(), path.display());
        Ok(true)
    }

    pub fn set_save_path(&mut self, path: impl Into<PathBuf>) {
        self.save_path = Some(path.into());
    }

    pub fn save_path(&self) -> Option<&Path> {
        self.save_path.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn mbc(&self) -> MbcType {
        self.mbc
    }

    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut [u8] {
        &mut self.ram
    }

    pub fn rom_bank(&self) -> u16 {
        self.rom_bank
    }

    pub fn ram_bank(&self) -> u8 {
        self.ram_bank
    }

    pub fn ram_enabled(&self) -> bool {
        self.ram_enabled
    }

    pub fn has_battery(&self) -> bool {
        matches!(
            self.cart_type,
            0x03 | 0x06 | 0x09 | 0x0F | 0x10 | 0x13 | 0x1B | 0x1E
        )
    }

    fn rom_bank_count(&self) -> usize {
        (self.rom.len() / ROM_BANK_SIZE).max(1)
    }

    fn ram_bank_count(&self) -> usize {
        (self.ram.len() / RAM_BANK_SIZE).max(1)
    }

    fn rom_byte(&self, bank: usize, addr: u16) -> u8 {
        let bank = bank % self.rom_bank_count();
        let offset = bank * ROM_BANK_SIZE + (addr as usize & (ROM_BANK_SIZE - 1));
        self.rom.get(offset).copied().unwrap_or(0xFF)
    }

    /// Read from the ROM window (0x0000-0x7FFF).
    pub fn read(&self, addr: u16) -> u8 {
        match (self.mbc, addr) {
            (MbcType::Mbc1, 0x0000..=0x3FFF) if self.banking_mode => {
                self.rom_byte((self.ram_bank as usize) << 5, addr)
            }
            (_, 0x0000..=0x3FFF) => self.rom_byte(0, addr),
            (MbcType::RomOnly, 0x4000..=0x7FFF) => self.rom_byte(1, addr),
            (MbcType::Mbc1, 0x4000..=0x7FFF) => {
                let bank = ((self.ram_bank as usize) << 5) | self.rom_bank as usize;
                self.rom_byte(bank, addr)
            }
            (_, 0x4000..=0x7FFF) => self.rom_byte(self.rom_bank as usize, addr),
            _ => 0xFF,
        }
    }

    /// Write to the ROM window, which programs the bank controller.
    pub fn write(&mut self, addr: u16, val: u8) -> Option<CartridgeEvent> {
        match (self.mbc, addr) {
            (MbcType::RomOnly, _) => None,
            (MbcType::Mbc2, 0x0000..=0x3FFF) => {
                // Address bit 8 selects RAM enable (clear) or ROM bank (set).
                if addr & 0x0100 == 0 {
                    self.latch_ram_enable(val)
                } else {
                    self.rom_bank = (val & 0x0F).max(1) as u16;
                    None
                }
            }
            (_, 0x0000..=0x1FFF) => self.latch_ram_enable(val),
            (MbcType::Mbc1, 0x2000..=0x3FFF) => {
                self.rom_bank = (val & 0x1F).max(1) as u16;
                None
            }
            (MbcType::Mbc3, 0x2000..=0x3FFF) => {
                self.rom_bank = (val & 0x7F).max(1) as u16;
                None
            }
            (MbcType::Mbc5, 0x2000..=0x2FFF) => {
                self.rom_bank = (self.rom_bank & 0x100) | val as u16;
                None
            }
            (MbcType::Mbc5, 0x3000..=0x3FFF) => {
                self.rom_bank = (self.rom_bank & 0xFF) | (((val & 0x01) as u16) << 8);
                None
            }
            (MbcType::Mbc1, 0x4000..=0x5FFF) => {
                self.ram_bank = val & 0x03;
                None
            }
            (MbcType::Mbc3, 0x4000..=0x5FFF) => {
                // 0x08-0x0C select RTC registers, which are not modeled.
                self.ram_bank = val & 0x0F;
                None
            }
            (MbcType::Mbc5, 0x4000..=0x5FFF) => {
                self.ram_bank = val & 0x0F;
                None
            }
            (MbcType::Mbc1, 0x6000..=0x7FFF) => {
                self.banking_mode = val & 0x01 != 0;
                None
            }
            _ => None,
        }
    }

    fn latch_ram_enable(&mut self, val: u8) -> Option<CartridgeEvent> {
        self.ram_enabled = val & 0x0F == 0x0A;
        if self.ram_enabled {
            None
        } else {
            debug!("Cartridge RAM disabled");
            Some(CartridgeEvent::RamDisabled)
        }
    }

    fn ram_index(&self, addr: u16) -> Option<usize> {
        if self.ram.is_empty() {
            return None;
        }
        let offset = addr as usize - 0xA000;
        let idx = match self.mbc {
            MbcType::Mbc2 => offset & (MBC2_RAM_SIZE - 1),
            MbcType::RomOnly => offset,
            MbcType::Mbc1 if !self.banking_mode => offset,
            MbcType::Mbc3 if self.ram_bank > 0x03 => return None,
            _ => {
                let bank = self.ram_bank as usize % self.ram_bank_count();
                bank * RAM_BANK_SIZE + offset
            }
        };
        // Carts with 2 KiB of RAM mirror it across the window.
        Some(idx % self.ram.len())
    }

    /// Read from cartridge RAM (0xA000-0xBFFF). 0xFF while RAM is disabled or
    /// absent.
    pub fn read_ram(&self, addr: u16) -> u8 {
        if !self.ram_enabled {
            return 0xFF;
        }
        match self.ram_index(addr) {
            Some(idx) if self.mbc == MbcType::Mbc2 => 0xF0 | (self.ram[idx] & 0x0F),
            Some(idx) => self.ram[idx],
            None => 0xFF,
        }
    }

    pub fn write_ram(&mut self, addr: u16, val: u8) {
        if !self.ram_enabled {
            return;
        }
        if let Some(idx) = self.ram_index(addr) {
            self.ram[idx] = if self.mbc == MbcType::Mbc2 {
                val & 0x0F
            } else {
                val
            };
        }
    }
}

struct Header<'a> {
    data: &'a [u8],
}

impl<'a> Header<'a> {
    fn parse(data: &'a [u8]) -> Self {
        Self { data }
    }

    fn byte(&self, addr: usize) -> u8 {
        self.data.get(addr).copied().unwrap_or(0)
    }

    fn title(&self) -> String {
        let start = 0x0134.min(self.data.len());
        let end = 0x0144.min(self.data.len());
        let mut slice = &self.data[start..end];
        if let Some(pos) = slice.iter().position(|&b| b == 0) {
            slice = &slice[..pos];
        }
        String::from_utf8_lossy(slice).trim().to_string()
    }

    fn cart_type(&self) -> u8 {
        if self.data.len() < HEADER_END {
            return 0x00;
        }
        self.byte(0x0147)
    }

    fn mbc_type(&self) -> MbcType {
        match self.cart_type() {
            0x00 | 0x08 | 0x09 => MbcType::RomOnly,
            0x01..=0x03 => MbcType::Mbc1,
            0x05 | 0x06 => MbcType::Mbc2,
            0x0F..=0x13 => MbcType::Mbc3,
            0x19..=0x1E => MbcType::Mbc5,
            other => {
                warn!("Unsupported cartridge type {other:#04X}, treating as ROM only");
                MbcType::RomOnly
            }
        }
    }

    fn rom_size(&self) -> Option<usize> {
        if self.data.len() < HEADER_END {
            return None;
        }
        match self.byte(0x0148) {
            code @ 0x00..=0x08 => Some(0x8000 << code),
            _ => None,
        }
    }

    fn ram_size(&self) -> usize {
        if self.data.len() < HEADER_END {
            return 0;
        }

        // MBC2 has 512x4-bit internal RAM regardless of the header.
        if matches!(self.cart_type(), 0x05 | 0x06) {
            return MBC2_RAM_SIZE;
        }

        match self.byte(0x0149) {
            0x01 => 0x800,
            0x02 => 0x2000,
            0x03 => 0x8000,
            0x04 => 0x20000,
            0x05 => 0x10000,
            _ => 0,
        }
    }
}
