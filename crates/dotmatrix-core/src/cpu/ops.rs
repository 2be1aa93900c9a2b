//! Handlers for the primary (unprefixed) opcode table.
//!
//! Every handler reads its operands relative to PC and reports how control
//! flow continues; `Cpu::step` turns that into the PC advance and the cycle
//! cost.

use log::debug;

use super::{Cpu, FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Flow};
use crate::bus::MemoryBus;

/// Operand encoding used by bits 0-2 and 3-5 of most opcodes.
pub const B: u8 = 0;
pub const C: u8 = 1;
pub const D: u8 = 2;
pub const E: u8 = 3;
pub const H: u8 = 4;
pub const L: u8 = 5;
/// Memory at HL.
pub const IND_HL: u8 = 6;
pub const A: u8 = 7;

/// Register pair encoding in bits 4-5. `SP` and `AF` share slot 3 depending
/// on the instruction family.
pub const BC: u8 = 0;
pub const DE: u8 = 1;
pub const HL: u8 = 2;
pub const SP: u8 = 3;
pub const AF: u8 = 3;

pub const COND_NZ: u8 = 0;
pub const COND_Z: u8 = 1;
pub const COND_NC: u8 = 2;
pub const COND_C: u8 = 3;

impl Cpu {
    pub(super) fn imm8(&self, bus: &dyn MemoryBus) -> u8 {
        bus.read(self.regs.pc.wrapping_add(1))
    }

    pub(super) fn imm16(&self, bus: &dyn MemoryBus) -> u16 {
        bus.read_word(self.regs.pc.wrapping_add(1))
    }

    pub(super) fn read_r(&self, bus: &dyn MemoryBus, r: u8) -> u8 {
        match r {
            B => self.regs.b,
            C => self.regs.c,
            D => self.regs.d,
            E => self.regs.e,
            H => self.regs.h,
            L => self.regs.l,
            IND_HL => bus.read(self.regs.hl()),
            _ => self.regs.a,
        }
    }

    pub(super) fn write_r(&mut self, bus: &mut dyn MemoryBus, r: u8, val: u8) {
        match r {
            B => self.regs.b = val,
            C => self.regs.c = val,
            D => self.regs.d = val,
            E => self.regs.e = val,
            H => self.regs.h = val,
            L => self.regs.l = val,
            IND_HL => bus.write(self.regs.hl(), val),
            _ => self.regs.a = val,
        }
    }

    fn read_rr(&self, rr: u8) -> u16 {
        match rr {
            BC => self.regs.bc(),
            DE => self.regs.de(),
            HL => self.regs.hl(),
            _ => self.regs.sp,
        }
    }

    fn write_rr(&mut self, rr: u8, val: u16) {
        match rr {
            BC => self.regs.set_bc(val),
            DE => self.regs.set_de(val),
            HL => self.regs.set_hl(val),
            _ => self.regs.sp = val,
        }
    }

    fn condition(&self, cc: u8) -> bool {
        match cc {
            COND_NZ => !self.regs.flag(FLAG_Z),
            COND_Z => self.regs.flag(FLAG_Z),
            COND_NC => !self.regs.flag(FLAG_C),
            _ => self.regs.flag(FLAG_C),
        }
    }
}

pub fn nop(_cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    Flow::Next
}

/// One of the eleven unused opcodes. Treated as a 4-cycle NOP.
pub fn undefined(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    debug!(
        "Undefined opcode {:02X} at {:04X}",
        bus.read(cpu.regs.pc),
        cpu.regs.pc
    );
    Flow::Next
}

pub fn ld_r_r<const DST: u8, const SRC: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let val = cpu.read_r(bus, SRC);
    cpu.write_r(bus, DST, val);
    Flow::Next
}

pub fn ld_r_d8<const R: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let val = cpu.imm8(bus);
    cpu.write_r(bus, R, val);
    Flow::Next
}

pub fn ld_rr_d16<const RR: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let val = cpu.imm16(bus);
    cpu.write_rr(RR, val);
    Flow::Next
}

/// LD (BC),A / LD (DE),A
pub fn ld_ind_a<const RR: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    bus.write(cpu.read_rr(RR), cpu.regs.a);
    Flow::Next
}

/// LD A,(BC) / LD A,(DE)
pub fn ld_a_ind<const RR: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    cpu.regs.a = bus.read(cpu.read_rr(RR));
    Flow::Next
}

pub fn ld_hli_a(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let hl = cpu.regs.hl();
    bus.write(hl, cpu.regs.a);
    cpu.regs.set_hl(hl.wrapping_add(1));
    Flow::Next
}

pub fn ld_hld_a(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let hl = cpu.regs.hl();
    bus.write(hl, cpu.regs.a);
    cpu.regs.set_hl(hl.wrapping_sub(1));
    Flow::Next
}

pub fn ld_a_hli(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let hl = cpu.regs.hl();
    cpu.regs.a = bus.read(hl);
    cpu.regs.set_hl(hl.wrapping_add(1));
    Flow::Next
}

pub fn ld_a_hld(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let hl = cpu.regs.hl();
    cpu.regs.a = bus.read(hl);
    cpu.regs.set_hl(hl.wrapping_sub(1));
    Flow::Next
}

pub fn ld_a16_sp(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let addr = cpu.imm16(bus);
    bus.write_word(addr, cpu.regs.sp);
    Flow::Next
}

pub fn ld_a16_a(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let addr = cpu.imm16(bus);
    bus.write(addr, cpu.regs.a);
    Flow::Next
}

pub fn ld_a_a16(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let addr = cpu.imm16(bus);
    cpu.regs.a = bus.read(addr);
    Flow::Next
}

/// LDH (a8),A
pub fn ldh_a8_a(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let addr = 0xFF00 | cpu.imm8(bus) as u16;
    bus.write(addr, cpu.regs.a);
    Flow::Next
}

/// LDH A,(a8)
pub fn ldh_a_a8(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let addr = 0xFF00 | cpu.imm8(bus) as u16;
    cpu.regs.a = bus.read(addr);
    Flow::Next
}

/// LD (C),A
pub fn ldh_c_a(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    bus.write(0xFF00 | cpu.regs.c as u16, cpu.regs.a);
    Flow::Next
}

/// LD A,(C)
pub fn ldh_a_c(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    cpu.regs.a = bus.read(0xFF00 | cpu.regs.c as u16);
    Flow::Next
}

pub fn ld_sp_hl(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    cpu.regs.sp = cpu.regs.hl();
    Flow::Next
}

pub fn ld_hl_sp_e8(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let offset = cpu.imm8(bus);
    let val = cpu.sp_offset(offset);
    cpu.regs.set_hl(val);
    Flow::Next
}

pub fn add_sp_e8(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let offset = cpu.imm8(bus);
    cpu.regs.sp = cpu.sp_offset(offset);
    Flow::Next
}

pub fn inc_r<const R: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let val = cpu.read_r(bus, R);
    let res = cpu.inc8(val);
    cpu.write_r(bus, R, res);
    Flow::Next
}

pub fn dec_r<const R: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let val = cpu.read_r(bus, R);
    let res = cpu.dec8(val);
    cpu.write_r(bus, R, res);
    Flow::Next
}

pub fn inc_rr<const RR: u8>(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    let val = cpu.read_rr(RR).wrapping_add(1);
    cpu.write_rr(RR, val);
    Flow::Next
}

pub fn dec_rr<const RR: u8>(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    let val = cpu.read_rr(RR).wrapping_sub(1);
    cpu.write_rr(RR, val);
    Flow::Next
}

pub fn add_hl_rr<const RR: u8>(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    let val = cpu.read_rr(RR);
    cpu.add_hl(val);
    Flow::Next
}

pub fn alu_r<const OP: u8, const R: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let val = cpu.read_r(bus, R);
    cpu.alu(OP, val);
    Flow::Next
}

pub fn alu_d8<const OP: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let val = cpu.imm8(bus);
    cpu.alu(OP, val);
    Flow::Next
}

pub fn rlca(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    cpu.regs.a = cpu.rlc(cpu.regs.a);
    cpu.regs.set_flag(FLAG_Z, false);
    Flow::Next
}

pub fn rrca(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    cpu.regs.a = cpu.rrc(cpu.regs.a);
    cpu.regs.set_flag(FLAG_Z, false);
    Flow::Next
}

pub fn rla(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    cpu.regs.a = cpu.rl(cpu.regs.a);
    cpu.regs.set_flag(FLAG_Z, false);
    Flow::Next
}

pub fn rra(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    cpu.regs.a = cpu.rr(cpu.regs.a);
    cpu.regs.set_flag(FLAG_Z, false);
    Flow::Next
}

pub fn daa(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    cpu.daa();
    Flow::Next
}

pub fn cpl(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    cpu.regs.a = !cpu.regs.a;
    cpu.regs.set_flag(FLAG_N, true);
    cpu.regs.set_flag(FLAG_H, true);
    Flow::Next
}

pub fn scf(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    let z = cpu.regs.flag(FLAG_Z);
    cpu.regs.set_flags(z, false, false, true);
    Flow::Next
}

pub fn ccf(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    let z = cpu.regs.flag(FLAG_Z);
    let c = cpu.regs.flag(FLAG_C);
    cpu.regs.set_flags(z, false, false, !c);
    Flow::Next
}

/// Low-power mode is not modeled.
pub fn stop(_cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    Flow::Next
}

/// PC stays on the HALT opcode until an interrupt wakes the CPU.
pub fn halt(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    cpu.halted = true;
    Flow::Hold
}

pub fn di(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    cpu.ime = false;
    Flow::Next
}

pub fn ei(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    cpu.ime = true;
    Flow::Next
}

pub fn jr(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let offset = cpu.imm8(bus) as i8;
    cpu.regs.pc = cpu
        .regs
        .pc
        .wrapping_add(2)
        .wrapping_add(offset as i16 as u16);
    Flow::Jump
}

pub fn jr_cc<const CC: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    if cpu.condition(CC) { jr(cpu, bus) } else { Flow::Next }
}

pub fn jp(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    cpu.regs.pc = cpu.imm16(bus);
    Flow::Jump
}

pub fn jp_cc<const CC: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    if cpu.condition(CC) { jp(cpu, bus) } else { Flow::Next }
}

pub fn jp_hl(cpu: &mut Cpu, _bus: &mut dyn MemoryBus) -> Flow {
    cpu.regs.pc = cpu.regs.hl();
    Flow::Jump
}

pub fn call(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let target = cpu.imm16(bus);
    let ret = cpu.regs.pc.wrapping_add(3);
    cpu.push_stack(bus, ret);
    cpu.regs.pc = target;
    Flow::Jump
}

pub fn call_cc<const CC: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    if cpu.condition(CC) { call(cpu, bus) } else { Flow::Next }
}

pub fn ret(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    cpu.regs.pc = cpu.pop_stack(bus);
    Flow::Jump
}

pub fn ret_cc<const CC: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    if cpu.condition(CC) { ret(cpu, bus) } else { Flow::Next }
}

pub fn reti(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    cpu.ime = true;
    ret(cpu, bus)
}

pub fn rst<const VECTOR: u16>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let ret = cpu.regs.pc.wrapping_add(1);
    cpu.push_stack(bus, ret);
    cpu.regs.pc = VECTOR;
    Flow::Jump
}

pub fn push<const RR: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let val = match RR {
        AF => cpu.regs.af(),
        _ => cpu.read_rr(RR),
    };
    cpu.push_stack(bus, val);
    Flow::Next
}

pub fn pop<const RR: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let val = cpu.pop_stack(bus);
    match RR {
        AF => cpu.regs.set_af(val),
        _ => cpu.write_rr(RR, val),
    }
    Flow::Next
}

/// 0xCB: run the secondary table entry named by the next byte.
pub fn prefix_cb(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let op = cpu.imm8(bus);
    super::tables::CB_OPS[op as usize](cpu, bus);
    Flow::Prefixed(op)
}
