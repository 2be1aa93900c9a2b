//! Arithmetic and bit helpers shared by the primary and CB-prefixed opcodes.

use super::{Cpu, FLAG_C};

/// ALU operation selectors, matching bits 3-5 of the 0x80-0xBF and 0xC6-0xFE
/// opcode rows.
pub const ADD: u8 = 0;
pub const ADC: u8 = 1;
pub const SUB: u8 = 2;
pub const SBC: u8 = 3;
pub const AND: u8 = 4;
pub const XOR: u8 = 5;
pub const OR: u8 = 6;
pub const CP: u8 = 7;

impl Cpu {
    /// Apply `op` to A and `val`.
    pub(super) fn alu(&mut self, op: u8, val: u8) {
        match op {
            ADD => self.add8(val, false),
            ADC => self.add8(val, self.regs.flag(FLAG_C)),
            SUB => self.a_sub(val, false),
            SBC => self.a_sub(val, self.regs.flag(FLAG_C)),
            AND => {
                self.regs.a &= val;
                self.regs.set_flags(self.regs.a == 0, false, true, false);
            }
            XOR => {
                self.regs.a ^= val;
                self.regs.set_flags(self.regs.a == 0, false, false, false);
            }
            OR => {
                self.regs.a |= val;
                self.regs.set_flags(self.regs.a == 0, false, false, false);
            }
            _ => {
                self.sub8(val, false);
            }
        }
    }

    fn add8(&mut self, val: u8, carry: bool) {
        let a = self.regs.a;
        let c = carry as u16;
        let sum = a as u16 + val as u16 + c;
        let half = (a & 0x0F) as u16 + (val & 0x0F) as u16 + c > 0x0F;
        self.regs.a = sum as u8;
        self.regs.set_flags(sum as u8 == 0, false, half, sum > 0xFF);
    }

    fn a_sub(&mut self, val: u8, carry: bool) {
        self.regs.a = self.sub8(val, carry);
    }

    /// A - val - carry with flags set; A itself is left alone so CP can
    /// share it.
    fn sub8(&mut self, val: u8, carry: bool) -> u8 {
        let a = self.regs.a;
        let c = carry as u16;
        let half = ((a & 0x0F) as u16) < (val & 0x0F) as u16 + c;
        let borrow = (a as u16) < val as u16 + c;
        let res = a.wrapping_sub(val).wrapping_sub(c as u8);
        self.regs.set_flags(res == 0, true, half, borrow);
        res
    }

    pub(super) fn inc8(&mut self, val: u8) -> u8 {
        let res = val.wrapping_add(1);
        let c = self.regs.flag(FLAG_C);
        self.regs.set_flags(res == 0, false, val & 0x0F == 0x0F, c);
        res
    }

    pub(super) fn dec8(&mut self, val: u8) -> u8 {
        let res = val.wrapping_sub(1);
        let c = self.regs.flag(FLAG_C);
        self.regs.set_flags(res == 0, true, val & 0x0F == 0, c);
        res
    }

    /// ADD HL,rr: half-carry out of bit 11, carry out of bit 15, Z kept.
    pub(super) fn add_hl(&mut self, val: u16) {
        let hl = self.regs.hl();
        let sum = hl as u32 + val as u32;
        let half = (hl & 0x0FFF) + (val & 0x0FFF) > 0x0FFF;
        let z = self.regs.flag(super::FLAG_Z);
        self.regs.set_hl(sum as u16);
        self.regs.set_flags(z, false, half, sum > 0xFFFF);
    }

    /// SP + signed offset as used by ADD SP,e8 and LD HL,SP+e8. Flags come
    /// from the unsigned low-byte addition.
    pub(super) fn sp_offset(&mut self, offset: u8) -> u16 {
        let sp = self.regs.sp;
        let half = (sp & 0x0F) + (offset as u16 & 0x0F) > 0x0F;
        let carry = (sp & 0xFF) + offset as u16 > 0xFF;
        self.regs.set_flags(false, false, half, carry);
        sp.wrapping_add(offset as i8 as i16 as u16)
    }

    /// Decimal adjust A after a BCD addition or subtraction.
    pub(super) fn daa(&mut self) {
        let mut a = self.regs.a;
        let n = self.regs.flag(super::FLAG_N);
        let h = self.regs.flag(super::FLAG_H);
        let mut carry = self.regs.flag(FLAG_C);
        if n {
            if carry {
                a = a.wrapping_sub(0x60);
            }
            if h {
                a = a.wrapping_sub(0x06);
            }
        } else {
            if carry || a > 0x99 {
                a = a.wrapping_add(0x60);
                carry = true;
            }
            if h || a & 0x0F > 0x09 {
                a = a.wrapping_add(0x06);
            }
        }
        self.regs.a = a;
        self.regs.set_flags(a == 0, n, false, carry);
    }

    pub(super) fn rlc(&mut self, val: u8) -> u8 {
        let res = val.rotate_left(1);
        self.regs.set_flags(res == 0, false, false, val & 0x80 != 0);
        res
    }

    pub(super) fn rrc(&mut self, val: u8) -> u8 {
        let res = val.rotate_right(1);
        self.regs.set_flags(res == 0, false, false, val & 0x01 != 0);
        res
    }

    pub(super) fn rl(&mut self, val: u8) -> u8 {
        let res = (val << 1) | self.regs.flag(FLAG_C) as u8;
        self.regs.set_flags(res == 0, false, false, val & 0x80 != 0);
        res
    }

    pub(super) fn rr(&mut self, val: u8) -> u8 {
        let res = (val >> 1) | (self.regs.flag(FLAG_C) as u8) << 7;
        self.regs.set_flags(res == 0, false, false, val & 0x01 != 0);
        res
    }

    pub(super) fn sla(&mut self, val: u8) -> u8 {
        let res = val << 1;
        self.regs.set_flags(res == 0, false, false, val & 0x80 != 0);
        res
    }

    pub(super) fn sra(&mut self, val: u8) -> u8 {
        let res = (val >> 1) | (val & 0x80);
        self.regs.set_flags(res == 0, false, false, val & 0x01 != 0);
        res
    }

    pub(super) fn swap(&mut self, val: u8) -> u8 {
        let res = val.rotate_left(4);
        self.regs.set_flags(res == 0, false, false, false);
        res
    }

    pub(super) fn srl(&mut self, val: u8) -> u8 {
        let res = val >> 1;
        self.regs.set_flags(res == 0, false, false, val & 0x01 != 0);
        res
    }

    pub(super) fn bit(&mut self, bit: u8, val: u8) {
        let c = self.regs.flag(FLAG_C);
        self.regs.set_flags(val & (1 << bit) == 0, false, true, c);
    }
}
