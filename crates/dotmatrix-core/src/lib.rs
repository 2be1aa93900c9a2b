//! Game Boy (DMG) emulation core.
//!
//! This crate contains the platform-agnostic emulator logic (CPU/MMU/PPU/APU).
//! Frontends live in separate crates and drive the core through the
//! [`console`] facade, one video frame per call.

/// Audio Processing Unit (APU) emulation.
pub mod apu;

/// Memory bus traits shared by the CPU, PPU and APU.
pub mod bus;

/// Cartridge mappers (MBC) and ROM/RAM handling.
pub mod cartridge;

/// Frame-stepping orchestrator that owns every subsystem.
pub mod console;

/// LR35902 CPU core.
pub mod cpu;

/// Interrupt sources, request bits and vectors.
pub mod interrupts;

/// Joypad register and button snapshots.
pub mod input;

/// Memory map and hardware plumbing.
pub mod mmu;

/// Pixel Processing Unit (PPU) emulation.
pub mod ppu;

/// Serial port without a link partner.
pub mod serial;

/// Divider/timer unit.
pub mod timer;

pub use console::{Console, ConsoleConfig, ConsoleError, FrameReport, RunMode};
pub use input::Buttons;
