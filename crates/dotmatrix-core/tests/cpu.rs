mod common;

use common::FlatBus;
use dotmatrix_core::{
    bus::MemoryBus,
    cpu::{Cpu, FLAG_C, FLAG_H, FLAG_N, FLAG_Z},
};

// Machine cycles per opcode with conditional branches not taken. HALT, STOP,
// the CB prefix and the undefined opcodes are checked separately.
#[rustfmt::skip]
const EXPECTED_M_CYCLES: [u8; 256] = [
    1,3,2,2,1,1,2,1,5,2,2,2,1,1,2,1,
    1,3,2,2,1,1,2,1,3,2,2,2,1,1,2,1,
    2,3,2,2,1,1,2,1,2,2,2,2,1,1,2,1,
    2,3,2,2,3,3,3,1,2,2,2,2,1,1,2,1,
    1,1,1,1,1,1,2,1,1,1,1,1,1,1,2,1,
    1,1,1,1,1,1,2,1,1,1,1,1,1,1,2,1,
    1,1,1,1,1,1,2,1,1,1,1,1,1,1,2,1,
    2,2,2,2,2,2,1,2,1,1,1,1,1,1,2,1,
    1,1,1,1,1,1,2,1,1,1,1,1,1,1,2,1,
    1,1,1,1,1,1,2,1,1,1,1,1,1,1,2,1,
    1,1,1,1,1,1,2,1,1,1,1,1,1,1,2,1,
    1,1,1,1,1,1,2,1,1,1,1,1,1,1,2,1,
    2,3,3,4,3,4,2,4,2,4,3,1,3,6,2,4,
    2,3,3,1,3,4,2,4,2,4,3,1,3,1,2,4,
    3,3,2,1,1,4,2,4,4,1,4,1,1,1,2,4,
    3,3,2,1,1,4,2,4,3,2,4,1,1,1,2,4,
];

const UNDEFINED: [u8; 11] = [
    0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
];

fn conditional(op: u8) -> bool {
    matches!(
        op,
        0x20 | 0x28 | 0x30 | 0x38 | 0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xC2 | 0xCA | 0xD2 | 0xDA
            | 0xC4 | 0xCC | 0xD4 | 0xDC
    )
}

fn taken_m_cycles(op: u8) -> u8 {
    match op {
        0x20 | 0x28 | 0x30 | 0x38 => 3,
        0xC2 | 0xCA | 0xD2 | 0xDA => 4,
        0xC4 | 0xCC | 0xD4 | 0xDC => 6,
        _ => 5,
    }
}

fn run_one(op: u8, flags: u8) -> (Cpu, u32) {
    let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[op, 0x00, 0x00]);
    cpu.regs.set_hl(0xC800);
    cpu.regs.set_f(flags);
    let cycles = cpu.step(&mut bus);
    (cpu, cycles)
}

#[test]
fn nop_advances_pc_only() {
    let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0x00]);
    let before = cpu.regs;
    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.regs.pc, 0xC001);
    assert_eq!(cpu.regs.af(), before.af());
    assert_eq!(cpu.regs.bc(), before.bc());
    assert_eq!(cpu.regs.de(), before.de());
    assert_eq!(cpu.regs.hl(), before.hl());
    assert_eq!(cpu.regs.sp, before.sp);
}

#[test]
fn ld_a_immediate() {
    let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0x3E, 0x42]);
    assert_eq!(cpu.step(&mut bus), 8);
    assert_eq!(cpu.regs.a, 0x42);
    assert_eq!(cpu.regs.pc, 0xC002);
}

#[test]
fn primary_opcode_cycles_match_timing_table() {
    for op in 0..=255u8 {
        if op == 0x10 || op == 0x76 || op == 0xCB || UNDEFINED.contains(&op) {
            continue;
        }
        for flags in [0x00, FLAG_Z | FLAG_C] {
            let (_, cycles) = run_one(op, flags);
            let cond = (op >> 3) & 0x03;
            let taken = conditional(op)
                && match cond {
                    0 => flags & FLAG_Z == 0,
                    1 => flags & FLAG_Z != 0,
                    2 => flags & FLAG_C == 0,
                    _ => flags & FLAG_C != 0,
                };
            let expected = if taken {
                taken_m_cycles(op)
            } else {
                EXPECTED_M_CYCLES[op as usize]
            };
            assert_eq!(
                cycles,
                expected as u32 * 4,
                "opcode {op:02X} with F={flags:02X}"
            );
        }
    }
}

#[test]
fn cb_opcode_cycles_match_timing_table() {
    for op in 0..=255u8 {
        let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0xCB, op]);
        cpu.regs.set_hl(0xC800);
        let expected = match (op & 0x07, op) {
            (6, 0x40..=0x7F) => 12,
            (6, _) => 16,
            _ => 8,
        };
        assert_eq!(cpu.step(&mut bus), expected, "CB {op:02X}");
        assert_eq!(cpu.regs.pc, 0xC002);
    }
}

#[test]
fn flags_low_nibble_stays_clear() {
    for op in 0..=255u8 {
        if op == 0x76 || op == 0xCB {
            continue;
        }
        let (cpu, _) = run_one(op, 0xF0);
        assert_eq!(cpu.regs.af() & 0x000F, 0, "opcode {op:02X}");
    }
}

#[test]
fn pop_af_masks_low_nibble() {
    let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0xF1]);
    cpu.regs.sp = 0xD000;
    bus.write_word(0xD000, 0x12FF);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.af(), 0x12F0);
}

#[test]
fn af_round_trip_drops_low_nibble() {
    let mut cpu = Cpu::new();
    for a in [0x00u8, 0x5A, 0xFF] {
        for f in [0x00u8, 0x0F, 0xA5, 0xFF] {
            cpu.regs.a = a;
            cpu.regs.set_f(f);
            assert_eq!(cpu.regs.af(), (a as u16) << 8 | (f & 0xF0) as u16);
        }
    }
}

const Z: u8 = FLAG_Z;
const N: u8 = FLAG_N;
const H: u8 = FLAG_H;
const C: u8 = FLAG_C;

#[test]
fn eight_bit_flags() {
    // (program, A, B, F in, A out, F out)
    #[rustfmt::skip]
    let cases: &[(&[u8], u8, u8, u8, u8, u8)] = &[
        // ADD A,B
        (&[0x80], 0x0F, 0x01, 0, 0x10, H),
        (&[0x80], 0xF0, 0x10, 0, 0x00, Z | C),
        (&[0x80], 0xFF, 0x01, 0, 0x00, Z | H | C),
        // ADC A,B
        (&[0x88], 0x0E, 0x01, C, 0x10, H),
        (&[0x88], 0xFF, 0x00, C, 0x00, Z | H | C),
        (&[0x88], 0x01, 0x01, 0, 0x02, 0),
        // SUB B
        (&[0x90], 0x10, 0x01, 0, 0x0F, N | H),
        (&[0x90], 0x00, 0x01, 0, 0xFF, N | H | C),
        (&[0x90], 0x42, 0x42, C, 0x00, Z | N),
        // SBC A,B
        (&[0x98], 0x10, 0x0F, C, 0x00, Z | N | H),
        (&[0x98], 0x00, 0x00, C, 0xFF, N | H | C),
        (&[0x98], 0x05, 0x02, 0, 0x03, N),
        // CP B leaves A alone
        (&[0xB8], 0x3C, 0x40, 0, 0x3C, N | C),
        (&[0xB8], 0x3C, 0x3C, 0, 0x3C, Z | N),
        (&[0xB8], 0x30, 0x01, 0, 0x30, N | H),
        // AND B, XOR A
        (&[0xA0], 0xF0, 0x0F, C, 0x00, Z | H),
        (&[0xAF], 0x55, 0x00, N | H | C, 0x00, Z),
        // INC A, DEC A keep C
        (&[0x3C], 0x0F, 0x00, C, 0x10, H | C),
        (&[0x3C], 0xFF, 0x00, 0, 0x00, Z | H),
        (&[0x3D], 0x10, 0x00, C, 0x0F, N | H | C),
        (&[0x3D], 0x01, 0x00, 0, 0x00, Z | N),
        // RLCA and RLA always clear Z
        (&[0x07], 0x80, 0x00, 0, 0x01, C),
        (&[0x07], 0x00, 0x00, Z, 0x00, 0),
        (&[0x17], 0x80, 0x00, 0, 0x00, C),
        // RLC A sets Z
        (&[0xCB, 0x07], 0x00, 0x00, 0, 0x00, Z),
        (&[0xCB, 0x07], 0x80, 0x00, 0, 0x01, C),
        // BIT 7,A keeps C
        (&[0xCB, 0x7F], 0x7F, 0x00, C, 0x7F, Z | H | C),
        (&[0xCB, 0x7F], 0x80, 0x00, N, 0x80, H),
        // SCF, CCF, CPL
        (&[0x37], 0x00, 0x00, Z | N | H, 0x00, Z | C),
        (&[0x3F], 0x00, 0x00, N | H | C, 0x00, 0),
        (&[0x3F], 0x00, 0x00, Z, 0x00, Z | C),
        (&[0x2F], 0x35, 0x00, Z | C, 0xCA, Z | N | H | C),
    ];

    for &(program, a, b, f, want_a, want_f) in cases {
        let (mut cpu, mut bus) = FlatBus::with_program(0xC000, program);
        cpu.regs.a = a;
        cpu.regs.b = b;
        cpu.regs.set_f(f);
        cpu.step(&mut bus);
        let name = format!("{program:02X?} A={a:02X} B={b:02X} F={f:02X}");
        assert_eq!(cpu.regs.a, want_a, "{name}");
        assert_eq!(cpu.regs.f(), want_f, "{name}");
    }
}

#[test]
fn add_hl_flags() {
    // (HL, BC, F in, HL out, F out)
    let cases = [
        (0x0FFF, 0x0001, Z, 0x1000, Z | H),
        (0xFFFF, 0x0001, N, 0x0000, H | C),
        (0x00FF, 0x0001, 0, 0x0100, 0),
        (0x8000, 0x8000, Z | N, 0x0000, Z | C),
    ];
    for (hl, bc, f, want_hl, want_f) in cases {
        // ADD HL,BC
        let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0x09]);
        cpu.regs.set_hl(hl);
        cpu.regs.set_bc(bc);
        cpu.regs.set_f(f);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.hl(), want_hl, "{hl:04X} + {bc:04X}");
        assert_eq!(cpu.regs.f(), want_f, "{hl:04X} + {bc:04X}");
    }
}

#[test]
fn sp_offset_flags_come_from_low_byte() {
    // (SP, e8, result, F out); Z and N always clear
    let cases = [
        (0x00FF, 0x01, 0x0100, H | C),
        (0x0001, 0xFF, 0x0000, H | C),
        (0x1000, 0xFF, 0x0FFF, 0),
        (0xFFF8, 0x08, 0x0000, H | C),
        (0x0008, 0x08, 0x0010, H),
    ];
    for (sp, offset, want, want_f) in cases {
        // ADD SP,e8
        let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0xE8, offset]);
        cpu.regs.sp = sp;
        cpu.regs.set_f(Z | N);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.sp, want, "ADD SP {sp:04X} {offset:02X}");
        assert_eq!(cpu.regs.f(), want_f, "ADD SP {sp:04X} {offset:02X}");

        // LD HL,SP+e8
        let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0xF8, offset]);
        cpu.regs.sp = sp;
        cpu.regs.set_f(Z | N);
        cpu.step(&mut bus);
        assert_eq!(cpu.regs.hl(), want, "LD HL {sp:04X} {offset:02X}");
        assert_eq!(cpu.regs.sp, sp);
        assert_eq!(cpu.regs.f(), want_f, "LD HL {sp:04X} {offset:02X}");
    }
}

fn bcd(n: u8) -> u8 {
    (n / 10) << 4 | (n % 10)
}

#[test]
fn daa_corrects_bcd_arithmetic() {
    // ADD A,B ; DAA ; SUB B ; DAA
    let mut bus = FlatBus::new();
    bus.load(0xC000, &[0x80, 0x27]);
    bus.load(0xC010, &[0x90, 0x27]);
    let mut cpu = Cpu::new();

    for a in 0..100u8 {
        for b in 0..100u8 {
            cpu.regs.pc = 0xC000;
            cpu.regs.a = bcd(a);
            cpu.regs.b = bcd(b);
            cpu.step(&mut bus);
            cpu.step(&mut bus);
            let sum = a as u16 + b as u16;
            assert_eq!(cpu.regs.a, bcd((sum % 100) as u8), "{a} + {b}");
            assert_eq!(cpu.regs.flag(FLAG_C), sum >= 100, "{a} + {b} carry");

            cpu.regs.pc = 0xC010;
            cpu.regs.a = bcd(a);
            cpu.step(&mut bus);
            cpu.step(&mut bus);
            let diff = (a as i16 - b as i16).rem_euclid(100) as u8;
            assert_eq!(cpu.regs.a, bcd(diff), "{a} - {b}");
            assert_eq!(cpu.regs.flag(FLAG_C), a < b, "{a} - {b} borrow");
        }
    }
}

#[test]
fn undefined_opcodes_are_nops() {
    for op in UNDEFINED {
        let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[op]);
        cpu.regs.a = 0x11;
        assert_eq!(cpu.step(&mut bus), 4);
        assert_eq!(cpu.regs.pc, 0xC001);
        assert_eq!(cpu.regs.a, 0x11);
    }
}

#[test]
fn stop_skips_its_operand() {
    let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0x10, 0x00]);
    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.regs.pc, 0xC002);
}

#[test]
fn halt_waits_then_wakes_without_ime() {
    let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0x76, 0x00]);
    cpu.ime = false;
    cpu.step(&mut bus);
    assert!(cpu.halted);
    assert_eq!(cpu.regs.pc, 0xC000);
    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.handle_interrupts(&mut bus), 0);
    assert!(cpu.halted);

    bus.write(0xFFFF, 0x04);
    bus.write(0xFF0F, 0x04);
    assert_eq!(cpu.handle_interrupts(&mut bus), 0);
    assert!(!cpu.halted);
    assert_eq!(cpu.regs.pc, 0xC001);
    // not serviced
    assert_eq!(bus.read(0xFF0F), 0x04);
}

#[test]
fn halt_wakes_into_interrupt_with_ime() {
    let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0xFB, 0x76]);
    cpu.step(&mut bus);
    assert!(cpu.ime);
    cpu.step(&mut bus);
    assert!(cpu.halted);

    bus.write(0xFFFF, 0x01);
    bus.write(0xFF0F, 0x01);
    assert_eq!(cpu.handle_interrupts(&mut bus), 16);
    assert_eq!(cpu.regs.pc, 0x0040);
    assert!(!cpu.ime);
    assert_eq!(bus.read(0xFF0F), 0x00);
    // return address is the instruction after HALT
    assert_eq!(bus.read_word(cpu.regs.sp), 0xC002);
}

#[test]
fn call_and_ret_round_trip() {
    // CALL 0xC010 ; ... ; 0xC010: RET
    let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0xCD, 0x10, 0xC0]);
    bus.load(0xC010, &[0xC9]);
    let sp = cpu.regs.sp;
    assert_eq!(cpu.step(&mut bus), 24);
    assert_eq!(cpu.regs.pc, 0xC010);
    assert_eq!(cpu.regs.sp, sp - 2);
    assert_eq!(cpu.step(&mut bus), 16);
    assert_eq!(cpu.regs.pc, 0xC003);
    assert_eq!(cpu.regs.sp, sp);
}

#[test]
fn jr_negative_offset() {
    let (mut cpu, mut bus) = FlatBus::with_program(0xC010, &[0x18, 0xFE]);
    assert_eq!(cpu.step(&mut bus), 12);
    assert_eq!(cpu.regs.pc, 0xC010);
}

#[test]
fn post_boot_registers() {
    let cpu = Cpu::post_boot();
    assert_eq!(cpu.regs.af(), 0x01B0);
    assert_eq!(cpu.regs.bc(), 0x0013);
    assert_eq!(cpu.regs.de(), 0x00D8);
    assert_eq!(cpu.regs.hl(), 0x014D);
    assert_eq!(cpu.regs.sp, 0xFFFE);
    assert_eq!(cpu.regs.pc, 0x0100);
}
