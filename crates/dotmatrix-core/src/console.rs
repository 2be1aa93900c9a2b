use std::path::Path;

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::{
    apu::Apu,
    cartridge::{Cartridge, CartridgeError},
    cpu::Cpu,
    input::Buttons,
    mmu::{BOOT_ROM_SIZE, BusEvents, Mmu},
    ppu::{CYCLES_PER_FRAME, Layer, Ppu, SpriteOrder},
};

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("boot ROM must be 1..=256 bytes, got {0}")]
    BootRomSize(usize),
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
}

/// Options fixed for the lifetime of a [`Console`].
#[derive(Debug, Clone, Default)]
pub struct ConsoleConfig {
    /// DMG boot ROM. Without one the console starts in the post-boot state.
    pub boot_rom: Option<Vec<u8>>,
    pub sprite_order: SpriteOrder,
    /// Produce stereo samples at this rate.
    pub audio_sample_rate: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    #[default]
    Continuous,
    PauseAfterFrame,
    PauseAfterInstruction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub cycles: u32,
    /// The frame ended because the PPU entered VBlank.
    pub draw_time: bool,
}

pub struct Console {
    pub cpu: Cpu,
    pub mmu: Mmu,
    pub ppu: Ppu,
    pub apu: Apu,
    config: ConsoleConfig,
    powered: bool,
    paused: bool,
    run_mode: RunMode,
    frame_carry: u32,
    ram_flush_requested: bool,
}

fn validate_boot_rom(mut data: Vec<u8>) -> Result<Vec<u8>, ConsoleError> {
    if data.is_empty() || data.len() > BOOT_ROM_SIZE {
        return Err(ConsoleError::BootRomSize(data.len()));
    }
    if data.len() < BOOT_ROM_SIZE {
        warn!(
            "Boot ROM is {} bytes, padding to {BOOT_ROM_SIZE}",
            data.len()
        );
        data.resize(BOOT_ROM_SIZE, 0xFF);
    }
    Ok(data)
}

impl Console {
    pub fn new() -> Self {
        let config = ConsoleConfig::default();
        Self {
            cpu: Cpu::post_boot(),
            mmu: Mmu::new_post_boot(),
            ppu: Ppu::with_sprite_order(config.sprite_order),
            apu: Apu::new(),
            config,
            powered: false,
            paused: false,
            run_mode: RunMode::Continuous,
            frame_carry: 0,
            ram_flush_requested: false,
        }
    }

    pub fn with_config(mut config: ConsoleConfig) -> Result<Self, ConsoleError> {
        config.boot_rom = config.boot_rom.map(validate_boot_rom).transpose()?;
        let mut console = Self::new();
        console.ppu = Ppu::with_sprite_order(config.sprite_order);
        console.config = config;
        Ok(console)
    }

    /// Insert `cart`, flushing the battery RAM of any cartridge it replaces.
    pub fn insert_cartridge(&mut self, cart: Cartridge) -> Result<(), ConsoleError> {
        self.flush_save()?;
        info!("Inserted cartridge \"{}\" ({:?})", cart.title(), cart.mbc());
        self.mmu.load_cart(cart);
        Ok(())
    }

    /// Load a ROM file, together with its `.sav` file for battery carts.
    pub fn load_rom_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConsoleError> {
        let cart = Cartridge::from_file(path)?;
        self.insert_cartridge(cart)
    }

    /// Flush battery RAM and remove the cartridge.
    pub fn eject(&mut self) -> Result<Option<Cartridge>, ConsoleError> {
        self.flush_save()?;
        Ok(self.mmu.take_cart())
    }

    /// Takes effect on the next [`Console::power_on`].
    pub fn set_boot_rom(&mut self, data: Vec<u8>) -> Result<(), ConsoleError> {
        self.config.boot_rom = Some(validate_boot_rom(data)?);
        Ok(())
    }

    /// Reset every subsystem and start executing, keeping the cartridge.
    pub fn power_on(&mut self) {
        let cart = self.mmu.take_cart();
        match &self.config.boot_rom {
            Some(boot) => {
                self.cpu = Cpu::new();
                self.mmu = Mmu::new();
                self.mmu.load_boot_rom(boot.clone());
            }
            None => {
                self.cpu = Cpu::post_boot();
                self.mmu = Mmu::new_post_boot();
            }
        }
        if let Some(cart) = cart {
            self.mmu.load_cart(cart);
        }
        self.ppu = Ppu::with_sprite_order(self.config.sprite_order);
        self.apu = Apu::new();
        if let Some(rate) = self.config.audio_sample_rate {
            self.apu.enable_output(rate);
        }
        self.powered = true;
        self.paused = false;
        self.frame_carry = 0;
        self.ram_flush_requested = false;
        info!("Powered on");
    }

    /// Stop executing and write battery RAM to disk once.
    pub fn power_off(&mut self) -> Result<(), ConsoleError> {
        if !self.powered {
            return Ok(());
        }
        self.powered = false;
        info!("Powered off");
        self.flush_save()
    }

    fn flush_save(&self) -> Result<(), ConsoleError> {
        let Some(cart) = self.mmu.cart() else {
            return Ok(());
        };
        match cart.save_ram() {
            Ok(true) => {
                info!("Saved cartridge RAM for \"{}\"", cart.title());
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => {
                error!("Failed to write save file: {e}");
                Err(e.into())
            }
        }
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn set_run_mode(&mut self, mode: RunMode) {
        self.run_mode = mode;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Set when the game disabled cartridge RAM, a hint that it finished
    /// saving. Stays set until [`Console::clear_ram_flush_request`].
    pub fn ram_flush_requested(&self) -> bool {
        self.ram_flush_requested
    }

    pub fn clear_ram_flush_request(&mut self) {
        self.ram_flush_requested = false;
    }

    /// Run until the PPU reaches VBlank or a frame's worth of cycles has
    /// elapsed. Paused or powered-off consoles return an empty report.
    pub fn run_frame(&mut self, buttons: Buttons) -> FrameReport {
        let mut report = FrameReport::default();
        if !self.powered || self.paused {
            return report;
        }
        self.mmu.set_buttons(buttons);

        if self.run_mode == RunMode::PauseAfterInstruction {
            let (cycles, draw_time) = self.execute();
            self.paused = true;
            return FrameReport { cycles, draw_time };
        }

        let mut counter = self.frame_carry;
        self.frame_carry = 0;
        while counter < CYCLES_PER_FRAME {
            let (cycles, draw_time) = self.execute();
            counter += cycles;
            report.cycles += cycles;
            if draw_time {
                self.frame_carry = self.ppu.mode_clock();
                report.draw_time = true;
                break;
            }
        }

        if self.run_mode == RunMode::PauseAfterFrame {
            self.paused = true;
        }
        report
    }

    /// Execute exactly one instruction, paused or not. Returns its cost.
    pub fn step_instruction(&mut self) -> u32 {
        if !self.powered {
            return 0;
        }
        self.execute().0
    }

    fn execute(&mut self) -> (u32, bool) {
        let cycles = self.cpu.step(&mut self.mmu);
        // The boot ROM disappears as soon as it hands over to the cartridge.
        if self.mmu.booting() && self.cpu.regs.pc == 0x0100 {
            self.mmu.finish_boot();
        }
        let mut draw_time = self.advance(cycles);

        let serviced = self.cpu.handle_interrupts(&mut self.mmu);
        if serviced > 0 {
            draw_time |= self.advance(serviced);
        }
        (cycles + serviced, draw_time)
    }

    fn advance(&mut self, cycles: u32) -> bool {
        self.mmu.step_timers(cycles);
        let draw_time = self.ppu.step(cycles, &mut self.mmu);
        self.apu.step(cycles, &mut self.mmu);

        let events = self.mmu.take_events();
        if !events.is_empty() {
            self.dispatch(events);
        }
        draw_time
    }

    fn dispatch(&mut self, events: BusEvents) {
        for channel in 0..4 {
            if events.length_loads & (1 << channel) != 0 {
                self.apu.load_length(channel, &self.mmu);
            }
            if events.sound_triggers & (1 << channel) != 0 {
                self.apu.trigger(channel, &mut self.mmu);
            }
        }
        if events.ram_disabled {
            debug!("Cartridge RAM disabled, flush requested");
            self.ram_flush_requested = true;
        }
    }

    pub fn screen(&self) -> &Layer {
        self.ppu.screen()
    }

    pub fn background(&self) -> &Layer {
        self.ppu.background()
    }

    pub fn window(&self) -> &Layer {
        self.ppu.window()
    }

    pub fn sprites(&self) -> &Layer {
        self.ppu.sprite_layer()
    }

    pub fn background_map(&self) -> &Layer {
        self.ppu.background_map()
    }

    pub fn window_map(&self) -> &Layer {
        self.ppu.window_map()
    }

    pub fn tileset(&self) -> &Layer {
        self.ppu.tileset()
    }

    pub fn serial_output(&self) -> &[u8] {
        self.mmu.serial.output()
    }

    pub fn take_serial_output(&mut self) -> Vec<u8> {
        self.mmu.serial.take_output()
    }

    pub fn take_audio_samples(&mut self) -> Vec<f32> {
        self.apu.take_samples()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
