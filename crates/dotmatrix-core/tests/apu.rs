mod common;

use common::console_with_program;
use dotmatrix_core::{Buttons, bus::MemoryBus};

/// Power the APU and start channel 2 at full volume, with `nr21` and `nr24`
/// as given. Ends in a JR -2 loop.
fn channel2_program(nr21: u8, nr24: u8) -> Vec<u8> {
    vec![
        0x3E, 0x80, 0xE0, 0x26, // NR52
        0x3E, 0xFF, 0xE0, 0x25, // NR51
        0x3E, 0x77, 0xE0, 0x24, // NR50
        0x3E, nr21, 0xE0, 0x16, // NR21
        0x3E, 0xF0, 0xE0, 0x17, // NR22
        0x3E, 0x00, 0xE0, 0x18, // NR23
        0x3E, nr24, 0xE0, 0x19, // NR24
        0x18, 0xFE,
    ]
}

#[test]
fn triggered_channel_reports_active() {
    let mut console = console_with_program(&channel2_program(0x80, 0x87));
    console.run_frame(Buttons::default());
    assert_eq!(console.mmu.read(0xFF26) & 0x82, 0x82);
    assert!(console.apu.channel_enabled(1));
}

#[test]
fn length_counter_silences_channel() {
    let mut console = console_with_program(&channel2_program(0xBF, 0xC7));
    console.run_frame(Buttons::default());
    assert_eq!(console.mmu.read(0xFF26) & 0x02, 0);
    assert!(!console.apu.channel_enabled(1));
}

#[test]
fn nr52_power_off_clears_registers() {
    let mut program = channel2_program(0x80, 0x87);
    let spin = program.len() - 2;
    // LD A,0 ; LDH (0x26),A before the loop
    program.splice(spin..spin, [0x3E, 0x00, 0xE0, 0x26]);
    let mut console = console_with_program(&program);
    console.run_frame(Buttons::default());
    assert_eq!(console.mmu.read(0xFF26), 0x70);
    assert_eq!(console.mmu.read(0xFF17), 0x00);
    assert!(!console.apu.channel_enabled(1));
}

#[test]
fn wave_ram_is_plain_storage() {
    let mut console = console_with_program(&[0x18, 0xFE]);
    console.mmu.write(0xFF30, 0x12);
    console.mmu.write(0xFF3F, 0xEF);
    assert_eq!(console.mmu.read(0xFF30), 0x12);
    assert_eq!(console.mmu.read(0xFF3F), 0xEF);
}
