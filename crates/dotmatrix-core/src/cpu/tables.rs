//! Dispatch and timing tables, indexed by opcode byte.
//!
//! Cycle counts are T-cycles. See: https://gbdev.io/gb-opcodes/optables/

use super::{
    Handler,
    alu::{ADC, ADD, AND, CP, OR, SBC, SUB, XOR},
    cb::cb,
    ops::*,
};

pub static PRIMARY_OPS: [Handler; 256] = [
    // 0x
    nop,
    ld_rr_d16::<BC>,
    ld_ind_a::<BC>,
    inc_rr::<BC>,
    inc_r::<B>,
    dec_r::<B>,
    ld_r_d8::<B>,
    rlca,
    ld_a16_sp,
    add_hl_rr::<BC>,
    ld_a_ind::<BC>,
    dec_rr::<BC>,
    inc_r::<C>,
    dec_r::<C>,
    ld_r_d8::<C>,
    rrca,
    // 1x
    stop,
    ld_rr_d16::<DE>,
    ld_ind_a::<DE>,
    inc_rr::<DE>,
    inc_r::<D>,
    dec_r::<D>,
    ld_r_d8::<D>,
    rla,
    jr,
    add_hl_rr::<DE>,
    ld_a_ind::<DE>,
    dec_rr::<DE>,
    inc_r::<E>,
    dec_r::<E>,
    ld_r_d8::<E>,
    rra,
    // 2x
    jr_cc::<COND_NZ>,
    ld_rr_d16::<HL>,
    ld_hli_a,
    inc_rr::<HL>,
    inc_r::<H>,
    dec_r::<H>,
    ld_r_d8::<H>,
    daa,
    jr_cc::<COND_Z>,
    add_hl_rr::<HL>,
    ld_a_hli,
    dec_rr::<HL>,
    inc_r::<L>,
    dec_r::<L>,
    ld_r_d8::<L>,
    cpl,
    // 3x
    jr_cc::<COND_NC>,
    ld_rr_d16::<SP>,
    ld_hld_a,
    inc_rr::<SP>,
    inc_r::<IND_HL>,
    dec_r::<IND_HL>,
    ld_r_d8::<IND_HL>,
    scf,
    jr_cc::<COND_C>,
    add_hl_rr::<SP>,
    ld_a_hld,
    dec_rr::<SP>,
    inc_r::<A>,
    dec_r::<A>,
    ld_r_d8::<A>,
    ccf,
    // 4x
    ld_r_r::<B, B>,
    ld_r_r::<B, C>,
    ld_r_r::<B, D>,
    ld_r_r::<B, E>,
    ld_r_r::<B, H>,
    ld_r_r::<B, L>,
    ld_r_r::<B, IND_HL>,
    ld_r_r::<B, A>,
    ld_r_r::<C, B>,
    ld_r_r::<C, C>,
    ld_r_r::<C, D>,
    ld_r_r::<C, E>,
    ld_r_r::<C, H>,
    ld_r_r::<C, L>,
    ld_r_r::<C, IND_HL>,
    ld_r_r::<C, A>,
    // 5x
    ld_r_r::<D, B>,
    ld_r_r::<D, C>,
    ld_r_r::<D, D>,
    ld_r_r::<D, E>,
    ld_r_r::<D, H>,
    ld_r_r::<D, L>,
    ld_r_r::<D, IND_HL>,
    ld_r_r::<D, A>,
    ld_r_r::<E, B>,
    ld_r_r::<E, C>,
    ld_r_r::<E, D>,
    ld_r_r::<E, E>,
    ld_r_r::<E, H>,
    ld_r_r::<E, L>,
    ld_r_r::<E, IND_HL>,
    ld_r_r::<E, A>,
    // 6x
    ld_r_r::<H, B>,
    ld_r_r::<H, C>,
    ld_r_r::<H, D>,
    ld_r_r::<H, E>,
    ld_r_r::<H, H>,
    ld_r_r::<H, L>,
    ld_r_r::<H, IND_HL>,
    ld_r_r::<H, A>,
    ld_r_r::<L, B>,
    ld_r_r::<L, C>,
    ld_r_r::<L, D>,
    ld_r_r::<L, E>,
    ld_r_r::<L, H>,
    ld_r_r::<L, L>,
    ld_r_r::<L, IND_HL>,
    ld_r_r::<L, A>,
    // 7x
    ld_r_r::<IND_HL, B>,
    ld_r_r::<IND_HL, C>,
    ld_r_r::<IND_HL, D>,
    ld_r_r::<IND_HL, E>,
    ld_r_r::<IND_HL, H>,
    ld_r_r::<IND_HL, L>,
    halt,
    ld_r_r::<IND_HL, A>,
    ld_r_r::<A, B>,
    ld_r_r::<A, C>,
    ld_r_r::<A, D>,
    ld_r_r::<A, E>,
    ld_r_r::<A, H>,
    ld_r_r::<A, L>,
    ld_r_r::<A, IND_HL>,
    ld_r_r::<A, A>,
    // 8x
    alu_r::<ADD, B>,
    alu_r::<ADD, C>,
    alu_r::<ADD, D>,
    alu_r::<ADD, E>,
    alu_r::<ADD, H>,
    alu_r::<ADD, L>,
    alu_r::<ADD, IND_HL>,
    alu_r::<ADD, A>,
    alu_r::<ADC, B>,
    alu_r::<ADC, C>,
    alu_r::<ADC, D>,
    alu_r::<ADC, E>,
    alu_r::<ADC, H>,
    alu_r::<ADC, L>,
    alu_r::<ADC, IND_HL>,
    alu_r::<ADC, A>,
    // 9x
    alu_r::<SUB, B>,
    alu_r::<SUB, C>,
    alu_r::<SUB, D>,
    alu_r::<SUB, E>,
    alu_r::<SUB, H>,
    alu_r::<SUB, L>,
    alu_r::<SUB, IND_HL>,
    alu_r::<SUB, A>,
    alu_r::<SBC, B>,
    alu_r::<SBC, C>,
    alu_r::<SBC, D>,
    alu_r::<SBC, E>,
    alu_r::<SBC, H>,
    alu_r::<SBC, L>,
    alu_r::<SBC, IND_HL>,
    alu_r::<SBC, A>,
    // Ax
    alu_r::<AND, B>,
    alu_r::<AND, C>,
    alu_r::<AND, D>,
    alu_r::<AND, E>,
    alu_r::<AND, H>,
    alu_r::<AND, L>,
    alu_r::<AND, IND_HL>,
    alu_r::<AND, A>,
    alu_r::<XOR, B>,
    alu_r::<XOR, C>,
    alu_r::<XOR, D>,
    alu_r::<XOR, E>,
    alu_r::<XOR, H>,
    alu_r::<XOR, L>,
    alu_r::<XOR, IND_HL>,
    alu_r::<XOR, A>,
    // Bx
    alu_r::<OR, B>,
    alu_r::<OR, C>,
    alu_r::<OR, D>,
    alu_r::<OR, E>,
    alu_r::<OR, H>,
    alu_r::<OR, L>,
    alu_r::<OR, IND_HL>,
    alu_r::<OR, A>,
    alu_r::<CP, B>,
    alu_r::<CP, C>,
    alu_r::<CP, D>,
    alu_r::<CP, E>,
    alu_r::<CP, H>,
    alu_r::<CP, L>,
    alu_r::<CP, IND_HL>,
    alu_r::<CP, A>,
    // Cx
    ret_cc::<COND_NZ>,
    pop::<BC>,
    jp_cc::<COND_NZ>,
    jp,
    call_cc::<COND_NZ>,
    push::<BC>,
    alu_d8::<ADD>,
    rst::<0x00>,
    ret_cc::<COND_Z>,
    ret,
    jp_cc::<COND_Z>,
    prefix_cb,
    call_cc::<COND_Z>,
    call,
    alu_d8::<ADC>,
    rst::<0x08>,
    // Dx
    ret_cc::<COND_NC>,
    pop::<DE>,
    jp_cc::<COND_NC>,
    undefined,
    call_cc::<COND_NC>,
    push::<DE>,
    alu_d8::<SUB>,
    rst::<0x10>,
    ret_cc::<COND_C>,
    reti,
    jp_cc::<COND_C>,
    undefined,
    call_cc::<COND_C>,
    undefined,
    alu_d8::<SBC>,
    rst::<0x18>,
    // Ex
    ldh_a8_a,
    pop::<HL>,
    ldh_c_a,
    undefined,
    undefined,
    push::<HL>,
    alu_d8::<AND>,
    rst::<0x20>,
    add_sp_e8,
    jp_hl,
    ld_a16_a,
    undefined,
    undefined,
    undefined,
    alu_d8::<XOR>,
    rst::<0x28>,
    // Fx
    ldh_a_a8,
    pop::<AF>,
    ldh_a_c,
    di,
    undefined,
    push::<AF>,
    alu_d8::<OR>,
    rst::<0x30>,
    ld_hl_sp_e8,
    ld_sp_hl,
    ld_a_a16,
    ei,
    undefined,
    undefined,
    alu_d8::<CP>,
    rst::<0x38>,
];

pub static CB_OPS: [Handler; 256] = [
    cb::<0x00>, cb::<0x01>, cb::<0x02>, cb::<0x03>, cb::<0x04>, cb::<0x05>, cb::<0x06>, cb::<0x07>,
    cb::<0x08>, cb::<0x09>, cb::<0x0A>, cb::<0x0B>, cb::<0x0C>, cb::<0x0D>, cb::<0x0E>, cb::<0x0F>,
    cb::<0x10>, cb::<0x11>, cb::<0x12>, cb::<0x13>, cb::<0x14>, cb::<0x15>, cb::<0x16>, cb::<0x17>,
    cb::<0x18>, cb::<0x19>, cb::<0x1A>, cb::<0x1B>, cb::<0x1C>, cb::<0x1D>, cb::<0x1E>, cb::<0x1F>,
    cb::<0x20>, cb::<0x21>, cb::<0x22>, cb::<0x23>, cb::<0x24>, cb::<0x25>, cb::<0x26>, cb::<0x27>,
    cb::<0x28>, cb::<0x29>, cb::<0x2A>, cb::<0x2B>, cb::<0x2C>, cb::<0x2D>, cb::<0x2E>, cb::<0x2F>,
    cb::<0x30>, cb::<0x31>, cb::<0x32>, cb::<0x33>, cb::<0x34>, cb::<0x35>, cb::<0x36>, cb::<0x37>,
    cb::<0x38>, cb::<0x39>, cb::<0x3A>, cb::<0x3B>, cb::<0x3C>, cb::<0x3D>, cb::<0x3E>, cb::<0x3F>,
    cb::<0x40>, cb::<0x41>, cb::<0x42>, cb::<0x43>, cb::<0x44>, cb::<0x45>, cb::<0x46>, cb::<0x47>,
    cb::<0x48>, cb::<0x49>, cb::<0x4A>, cb::<0x4B>, cb::<0x4C>, cb::<0x4D>, cb::<0x4E>, cb::<0x4F>,
    cb::<0x50>, cb::<0x51>, cb::<0x52>, cb::<0x53>, cb::<0x54>, cb::<0x55>, cb::<0x56>, cb::<0x57>,
    cb::<0x58>, cb::<0x59>, cb::<0x5A>, cb::<0x5B>, cb::<0x5C>, cb::<0x5D>, cb::<0x5E>, cb::<0x5F>,
    cb::<0x60>, cb::<0x61>, cb::<0x62>, cb::<0x63>, cb::<0x64>, cb::<0x65>, cb::<0x66>, cb::<0x67>,
    cb::<0x68>, cb::<0x69>, cb::<0x6A>, cb::<0x6B>, cb::<0x6C>, cb::<0x6D>, cb::<0x6E>, cb::<0x6F>,
    cb::<0x70>, cb::<0x71>, cb::<0x72>, cb::<0x73>, cb::<0x74>, cb::<0x75>, cb::<0x76>, cb::<0x77>,
    cb::<0x78>, cb::<0x79>, cb::<0x7A>, cb::<0x7B>, cb::<0x7C>, cb::<0x7D>, cb::<0x7E>, cb::<0x7F>,
    cb::<0x80>, cb::<0x81>, cb::<0x82>, cb::<0x83>, cb::<0x84>, cb::<0x85>, cb::<0x86>, cb::<0x87>,
    cb::<0x88>, cb::<0x89>, cb::<0x8A>, cb::<0x8B>, cb::<0x8C>, cb::<0x8D>, cb::<0x8E>, cb::<0x8F>,
    cb::<0x90>, cb::<0x91>, cb::<0x92>, cb::<0x93>, cb::<0x94>, cb::<0x95>, cb::<0x96>, cb::<0x97>,
    cb::<0x98>, cb::<0x99>, cb::<0x9A>, cb::<0x9B>, cb::<0x9C>, cb::<0x9D>, cb::<0x9E>, cb::<0x9F>,
    cb::<0xA0>, cb::<0xA1>, cb::<0xA2>, cb::<0xA3>, cb::<0xA4>, cb::<0xA5>, cb::<0xA6>, cb::<0xA7>,
    cb::<0xA8>, cb::<0xA9>, cb::<0xAA>, cb::<0xAB>, cb::<0xAC>, cb::<0xAD>, cb::<0xAE>, cb::<0xAF>,
    cb::<0xB0>, cb::<0xB1>, cb::<0xB2>, cb::<0xB3>, cb::<0xB4>, cb::<0xB5>, cb::<0xB6>, cb::<0xB7>,
    cb::<0xB8>, cb::<0xB9>, cb::<0xBA>, cb::<0xBB>, cb::<0xBC>, cb::<0xBD>, cb::<0xBE>, cb::<0xBF>,
    cb::<0xC0>, cb::<0xC1>, cb::<0xC2>, cb::<0xC3>, cb::<0xC4>, cb::<0xC5>, cb::<0xC6>, cb::<0xC7>,
    cb::<0xC8>, cb::<0xC9>, cb::<0xCA>, cb::<0xCB>, cb::<0xCC>, cb::<0xCD>, cb::<0xCE>, cb::<0xCF>,
    cb::<0xD0>, cb::<0xD1>, cb::<0xD2>, cb::<0xD3>, cb::<0xD4>, cb::<0xD5>, cb::<0xD6>, cb::<0xD7>,
    cb::<0xD8>, cb::<0xD9>, cb::<0xDA>, cb::<0xDB>, cb::<0xDC>, cb::<0xDD>, cb::<0xDE>, cb::<0xDF>,
    cb::<0xE0>, cb::<0xE1>, cb::<0xE2>, cb::<0xE3>, cb::<0xE4>, cb::<0xE5>, cb::<0xE6>, cb::<0xE7>,
    cb::<0xE8>, cb::<0xE9>, cb::<0xEA>, cb::<0xEB>, cb::<0xEC>, cb::<0xED>, cb::<0xEE>, cb::<0xEF>,
    cb::<0xF0>, cb::<0xF1>, cb::<0xF2>, cb::<0xF3>, cb::<0xF4>, cb::<0xF5>, cb::<0xF6>, cb::<0xF7>,
    cb::<0xF8>, cb::<0xF9>, cb::<0xFA>, cb::<0xFB>, cb::<0xFC>, cb::<0xFD>, cb::<0xFE>, cb::<0xFF>,
];

/// Cost of each primary opcode, or the not-taken cost for conditional
/// branches. 0xCB is only the prefix fetch; see [`CB_CYCLES`].
pub const OPCODE_CYCLES: [u8; 256] = [
     4, 12,  8,  8,  4,  4,  8,  4, 20,  8,  8,  8,  4,  4,  8,  4, // 0x
     4, 12,  8,  8,  4,  4,  8,  4, 12,  8,  8,  8,  4,  4,  8,  4, // 1x
     8, 12,  8,  8,  4,  4,  8,  4,  8,  8,  8,  8,  4,  4,  8,  4, // 2x
     8, 12,  8,  8, 12, 12, 12,  4,  8,  8,  8,  8,  4,  4,  8,  4, // 3x
     4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 4x
     4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 5x
     4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 6x
     8,  8,  8,  8,  8,  8,  4,  8,  4,  4,  4,  4,  4,  4,  8,  4, // 7x
     4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 8x
     4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 9x
     4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // Ax
     4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // Bx
     8, 12, 12, 16, 12, 16,  8, 16,  8, 16, 12,  4, 12, 24,  8, 16, // Cx
     8, 12, 12,  4, 12, 16,  8, 16,  8, 16, 12,  4, 12,  4,  8, 16, // Dx
    12, 12,  8,  4,  4, 16,  8, 16, 16,  4, 16,  4,  4,  4,  8, 16, // Ex
    12, 12,  8,  4,  4, 16,  8, 16, 12,  8, 16,  4,  4,  4,  8, 16, // Fx
];

/// Cost when the instruction sets PC itself. Only the conditional branches
/// differ from [`OPCODE_CYCLES`].
pub const OPCODE_CYCLES_TAKEN: [u8; 256] = [
     4, 12,  8,  8,  4,  4,  8,  4, 20,  8,  8,  8,  4,  4,  8,  4, // 0x
     4, 12,  8,  8,  4,  4,  8,  4, 12,  8,  8,  8,  4,  4,  8,  4, // 1x
    12, 12,  8,  8,  4,  4,  8,  4, 12,  8,  8,  8,  4,  4,  8,  4, // 2x
    12, 12,  8,  8, 12, 12, 12,  4, 12,  8,  8,  8,  4,  4,  8,  4, // 3x
     4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 4x
     4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 5x
     4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 6x
     8,  8,  8,  8,  8,  8,  4,  8,  4,  4,  4,  4,  4,  4,  8,  4, // 7x
     4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 8x
     4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // 9x
     4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // Ax
     4,  4,  4,  4,  4,  4,  8,  4,  4,  4,  4,  4,  4,  4,  8,  4, // Bx
    20, 12, 16, 16, 24, 16,  8, 16, 20, 16, 16,  4, 24, 24,  8, 16, // Cx
    20, 12, 16,  4, 24, 16,  8, 16, 20, 16, 16,  4, 24,  4,  8, 16, // Dx
    12, 12,  8,  4,  4, 16,  8, 16, 16,  4, 16,  4,  4,  4,  8, 16, // Ex
    12, 12,  8,  4,  4, 16,  8, 16, 12,  8, 16,  4,  4,  4,  8, 16, // Fx
];

/// Encoded length in bytes, including the opcode.
pub const OPCODE_LENGTHS: [u8; 256] = [
    1, 3, 1, 1, 1, 1, 2, 1, 3, 1, 1, 1, 1, 1, 2, 1, // 0x
    2, 3, 1, 1, 1, 1, 2, 1, 2, 1, 1, 1, 1, 1, 2, 1, // 1x
    2, 3, 1, 1, 1, 1, 2, 1, 2, 1, 1, 1, 1, 1, 2, 1, // 2x
    2, 3, 1, 1, 1, 1, 2, 1, 2, 1, 1, 1, 1, 1, 2, 1, // 3x
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 4x
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 5x
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 6x
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 7x
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 8x
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // 9x
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // Ax
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, // Bx
    1, 1, 3, 3, 3, 1, 2, 1, 1, 1, 3, 2, 3, 3, 2, 1, // Cx
    1, 1, 3, 1, 3, 1, 2, 1, 1, 1, 3, 1, 3, 1, 2, 1, // Dx
    2, 1, 1, 1, 1, 1, 2, 1, 2, 1, 3, 1, 1, 1, 2, 1, // Ex
    2, 1, 1, 1, 1, 1, 2, 1, 2, 1, 3, 1, 1, 1, 2, 1, // Fx
];

/// Total cost of each CB-prefixed instruction, prefix included.
pub const CB_CYCLES: [u8; 256] = [
     8,  8,  8,  8,  8,  8, 16,  8,  8,  8,  8,  8,  8,  8, 16,  8, // 0x
     8,  8,  8,  8,  8,  8, 16,  8,  8,  8,  8,  8,  8,  8, 16,  8, // 1x
     8,  8,  8,  8,  8,  8, 16,  8,  8,  8,  8,  8,  8,  8, 16,  8, // 2x
     8,  8,  8,  8,  8,  8, 16,  8,  8,  8,  8,  8,  8,  8, 16,  8, // 3x
     8,  8,  8,  8,  8,  8, 12,  8,  8,  8,  8,  8,  8,  8, 12,  8, // 4x
     8,  8,  8,  8,  8,  8, 12,  8,  8,  8,  8,  8,  8,  8, 12,  8, // 5x
     8,  8,  8,  8,  8,  8, 12,  8,  8,  8,  8,  8,  8,  8, 12,  8, // 6x
     8,  8,  8,  8,  8,  8, 12,  8,  8,  8,  8,  8,  8,  8, 12,  8, // 7x
     8,  8,  8,  8,  8,  8, 16,  8,  8,  8,  8,  8,  8,  8, 16,  8, // 8x
     8,  8,  8,  8,  8,  8, 16,  8,  8,  8,  8,  8,  8,  8, 16,  8, // 9x
     8,  8,  8,  8,  8,  8, 16,  8,  8,  8,  8,  8,  8,  8, 16,  8, // Ax
     8,  8,  8,  8,  8,  8, 16,  8,  8,  8,  8,  8,  8,  8, 16,  8, // Bx
     8,  8,  8,  8,  8,  8, 16,  8,  8,  8,  8,  8,  8,  8, 16,  8, // Cx
     8,  8,  8,  8,  8,  8, 16,  8,  8,  8,  8,  8,  8,  8, 16,  8, // Dx
     8,  8,  8,  8,  8,  8, 16,  8,  8,  8,  8,  8,  8,  8, 16,  8, // Ex
     8,  8,  8,  8,  8,  8, 16,  8,  8,  8,  8,  8,  8,  8, 16,  8, // Fx
];
