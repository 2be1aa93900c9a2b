//! CB-prefixed opcodes: rotates, shifts, SWAP and single-bit operations.
//!
//! Bits 0-2 select the operand, bits 3-5 the bit index or shift kind, and
//! bits 6-7 the family. The decode is folded at compile time per table entry.

use super::{Cpu, Flow};
use crate::bus::MemoryBus;

pub fn cb<const OP: u8>(cpu: &mut Cpu, bus: &mut dyn MemoryBus) -> Flow {
    let r = OP & 0x07;
    let bit = (OP >> 3) & 0x07;
    let val = cpu.read_r(bus, r);
    match OP >> 6 {
        0 => {
            let res = match bit {
                0 => cpu.rlc(val),
                1 => cpu.rrc(val),
                2 => cpu.rl(val),
                3 => cpu.rr(val),
                4 => cpu.sla(val),
                5 => cpu.sra(val),
                6 => cpu.swap(val),
                _ => cpu.srl(val),
            };
            cpu.write_r(bus, r, res);
        }
        1 => cpu.bit(bit, val),
        2 => cpu.write_r(bus, r, val & !(1 << bit)),
        _ => cpu.write_r(bus, r, val | (1 << bit)),
    }
    Flow::Next
}
