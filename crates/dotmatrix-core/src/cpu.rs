mod alu;
mod cb;
mod ops;
mod registers;
mod tables;

#[cfg(feature = "cpu-trace")]
use log::trace;

use crate::{
    bus::MemoryBus,
    interrupts::{INTERRUPT_MASK, Interrupt},
};

pub use registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Registers};
pub use tables::{CB_CYCLES, OPCODE_CYCLES, OPCODE_CYCLES_TAKEN, OPCODE_LENGTHS};

/// Cycles charged for entering an interrupt service routine.
pub const INTERRUPT_CYCLES: u32 = 16;

/// Cycles a halted CPU idles per step.
pub const HALT_CYCLES: u32 = 4;

const IF_ADDR: u16 = 0xFF0F;
const IE_ADDR: u16 = 0xFFFF;

/// How execution continues after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Advance PC by the encoded length; charge the base cost.
    Next,
    /// The handler set PC; charge the taken cost.
    Jump,
    /// Leave PC where it is (HALT).
    Hold,
    /// A CB-prefixed instruction ran; its cost comes from the CB table.
    Prefixed(u8),
}

/// Opcode handler. The bus is reached through the trait object so the same
/// tables drive the real MMU and flat test memories.
pub type Handler = fn(&mut Cpu, &mut dyn MemoryBus) -> Flow;

pub struct Cpu {
    pub regs: Registers,
    pub ime: bool,
    pub halted: bool,
    /// Total cycles executed since power-on.
    pub cycles: u64,
}

impl Cpu {
    /// Zeroed power-on state, for running a boot ROM from 0x0000.
    pub fn new() -> Self {
        Self {
            regs: Registers::default(),
            ime: false,
            halted: false,
            cycles: 0,
        }
    }

    /// Register state the DMG boot ROM hands over at 0x0100.
    /// See: https://gbdev.io/pandocs/Power_Up_Sequence.html#cpu-registers
    pub fn post_boot() -> Self {
        let mut cpu = Self::new();
        cpu.regs.set_af(0x01B0);
        cpu.regs.set_bc(0x0013);
        cpu.regs.set_de(0x00D8);
        cpu.regs.set_hl(0x014D);
        cpu.regs.sp = 0xFFFE;
        cpu.regs.pc = 0x0100;
        cpu
    }

    /// Execute one instruction and return its cost in T-cycles. A halted CPU
    /// idles for [`HALT_CYCLES`] instead.
    pub fn step(&mut self, bus: &mut dyn MemoryBus) -> u32 {
        if self.halted {
            self.cycles += HALT_CYCLES as u64;
            return HALT_CYCLES;
        }

        #[cfg(feature = "cpu-trace")]
        trace!("{}", self.debug_state());

        let opcode = bus.read(self.regs.pc) as usize;
        let cycles = match tables::PRIMARY_OPS[opcode](self, bus) {
            Flow::Next => {
                self.regs.pc = self.regs.pc.wrapping_add(OPCODE_LENGTHS[opcode] as u16);
                OPCODE_CYCLES[opcode]
            }
            Flow::Jump => OPCODE_CYCLES_TAKEN[opcode],
            Flow::Hold => OPCODE_CYCLES[opcode],
            Flow::Prefixed(cb) => {
                self.regs.pc = self.regs.pc.wrapping_add(2);
                CB_CYCLES[cb as usize]
            }
        };
        let cycles = cycles as u32;

        self.cycles += cycles as u64;
        cycles
    }

    /// Leave HALT because an interrupt is pending. PC moves past the HALT
    /// opcode whether or not the interrupt gets serviced.
    pub fn wake(&mut self) {
        if self.halted {
            self.halted = false;
            self.regs.pc = self.regs.pc.wrapping_add(1);
        }
    }

    /// Check IE & IF, wake from HALT and service the highest-priority pending
    /// interrupt if IME allows. Returns the cycles spent.
    pub fn handle_interrupts(&mut self, bus: &mut dyn MemoryBus) -> u32 {
        let if_reg = bus.read(IF_ADDR) & INTERRUPT_MASK;
        let pending = if_reg & bus.read(IE_ADDR);
        let Some(interrupt) = Interrupt::highest_priority(pending) else {
            return 0;
        };

        self.wake();
        if !self.ime {
            return 0;
        }

        bus.write(IF_ADDR, if_reg & !interrupt.bit());
        self.service_interrupt(bus, interrupt)
    }

    /// Push PC and jump to the interrupt vector with IME cleared. The caller
    /// is responsible for acknowledging the IF bit.
    pub fn service_interrupt(&mut self, bus: &mut dyn MemoryBus, interrupt: Interrupt) -> u32 {
        self.ime = false;
        let pc = self.regs.pc;
        self.push_stack(bus, pc);
        self.regs.pc = interrupt.vector();
        self.cycles += INTERRUPT_CYCLES as u64;
        INTERRUPT_CYCLES
    }

    pub fn push_stack(&mut self, bus: &mut dyn MemoryBus, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write(self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        bus.write(self.regs.sp, lo);
    }

    pub fn pop_stack(&mut self, bus: &mut dyn MemoryBus) -> u16 {
        let lo = bus.read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = bus.read(self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    pub fn debug_state(&self) -> String {
        format!(
            "AF:{:04X} BC:{:04X} DE:{:04X} HL:{:04X} SP:{:04X} PC:{:04X} IME:{} HALT:{}",
            self.regs.af(),
            self.regs.bc(),
            self.regs.de(),
            self.regs.hl(),
            self.regs.sp,
            self.regs.pc,
            self.ime as u8,
            self.halted as u8,
        )
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
