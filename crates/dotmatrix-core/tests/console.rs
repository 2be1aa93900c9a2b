mod common;

use std::fs;

use common::{console_with_program, rom_with_program};
use dotmatrix_core::{
    Buttons, Console, ConsoleConfig, ConsoleError, RunMode,
    bus::MemoryBus,
    cartridge::Cartridge,
    ppu::CYCLES_PER_FRAME,
};
use tempfile::tempdir;

// JR -2
const SPIN: [u8; 2] = [0x18, 0xFE];

#[test]
fn powered_off_console_does_nothing() {
    let mut console = Console::new();
    assert!(!console.is_powered());
    let report = console.run_frame(Buttons::default());
    assert_eq!(report.cycles, 0);
    assert!(!report.draw_time);
    assert_eq!(console.step_instruction(), 0);
}

#[test]
fn frames_end_at_draw_time() {
    let mut console = console_with_program(&SPIN);
    let first = console.run_frame(Buttons::default());
    assert!(first.draw_time);
    assert_eq!(first.cycles, 144 * 456);

    for _ in 0..3 {
        let report = console.run_frame(Buttons::default());
        assert!(report.draw_time);
        assert_eq!(report.cycles, CYCLES_PER_FRAME);
    }
}

#[test]
fn lcd_off_frames_run_full_budget() {
    // LD A,0 ; LDH (0x40),A ; JR -2
    let mut console = console_with_program(&[0x3E, 0x00, 0xE0, 0x40, 0x18, 0xFE]);
    console.run_frame(Buttons::default());
    let report = console.run_frame(Buttons::default());
    assert!(!report.draw_time);
    assert!(report.cycles >= CYCLES_PER_FRAME);
    assert!(report.cycles < CYCLES_PER_FRAME + 24);
}

#[test]
fn pause_after_frame() {
    let mut console = console_with_program(&SPIN);
    console.set_run_mode(RunMode::PauseAfterFrame);
    assert!(console.run_frame(Buttons::default()).cycles > 0);
    assert!(console.is_paused());
    assert_eq!(console.run_frame(Buttons::default()).cycles, 0);

    console.resume();
    assert!(console.run_frame(Buttons::default()).cycles > 0);
}

#[test]
fn pause_after_instruction() {
    let mut console = console_with_program(&[0x00, 0x00, 0x18, 0xFE]);
    console.set_run_mode(RunMode::PauseAfterInstruction);
    assert_eq!(console.run_frame(Buttons::default()).cycles, 4);
    assert_eq!(console.cpu.regs.pc, 0x0101);
    assert_eq!(console.run_frame(Buttons::default()).cycles, 0);

    // stepping ignores the pause
    assert_eq!(console.step_instruction(), 4);
    assert_eq!(console.cpu.regs.pc, 0x0102);

    console.resume();
    console.run_frame(Buttons::default());
    assert_eq!(console.cpu.regs.pc, 0x0102);
}

#[test]
fn joypad_press_wakes_halted_cpu() {
    // LD A,0x10 ; LDH (0xFF),A ; LDH (0x00),A ; EI ; HALT ; JR -2
    let mut rom = rom_with_program(&[0x3E, 0x10, 0xE0, 0xFF, 0xE0, 0x00, 0xFB, 0x76, 0x18, 0xFE]);
    // LD A,0x99 ; LD (0xC000),A ; RETI
    rom[0x60..0x66].copy_from_slice(&[0x3E, 0x99, 0xEA, 0x00, 0xC0, 0xD9]);
    let mut console = Console::new();
    console.insert_cartridge(Cartridge::from_bytes(rom).unwrap()).unwrap();
    console.power_on();

    console.run_frame(Buttons::default());
    assert!(console.cpu.halted);
    assert_eq!(console.mmu.read(0xC000), 0x00);

    console.run_frame(Buttons {
        a: true,
        ..Buttons::default()
    });
    assert_eq!(console.mmu.read(0xC000), 0x99);
}

#[test]
fn serial_output_is_captured() {
    let program = [
        0x3E, b'O', 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02, // 'O'
        0x3E, b'K', 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02, // 'K'
        0x18, 0xFE,
    ];
    let mut console = console_with_program(&program);
    console.run_frame(Buttons::default());
    assert_eq!(console.serial_output(), b"OK");
    assert_eq!(console.take_serial_output(), b"OK".to_vec());
    assert!(console.serial_output().is_empty());
}

#[test]
fn ram_disable_requests_flush() {
    // LD A,0x0A ; LD (0x0000),A ; XOR A ; LD (0x0000),A ; JR -2
    let mut rom = rom_with_program(&[0x3E, 0x0A, 0xEA, 0x00, 0x00, 0xAF, 0xEA, 0x00, 0x00, 0x18, 0xFE]);
    rom[0x0147] = 0x03;
    rom[0x0149] = 0x02;
    let mut console = Console::new();
    console.insert_cartridge(Cartridge::from_bytes(rom).unwrap()).unwrap();
    console.power_on();
    console.run_frame(Buttons::default());
    assert!(console.ram_flush_requested());
    console.clear_ram_flush_request();
    assert!(!console.ram_flush_requested());
}

#[test]
fn power_off_writes_battery_save() {
    let dir = tempdir().unwrap();
    let rom_path = dir.path().join("save.gb");
    // LD A,0x0A ; LD (0x0000),A ; LD A,0x42 ; LD (0xA000),A ; JR -2
    let mut rom = rom_with_program(&[0x3E, 0x0A, 0xEA, 0x00, 0x00, 0x3E, 0x42, 0xEA, 0x00, 0xA0, 0x18, 0xFE]);
    rom[0x0147] = 0x03;
    rom[0x0149] = 0x02;
    fs::write(&rom_path, rom).unwrap();

    let mut console = Console::new();
    console.load_rom_file(&rom_path).unwrap();
    console.power_on();
    console.run_frame(Buttons::default());
    console.power_off().unwrap();
    assert!(!console.is_powered());

    let save = fs::read(rom_path.with_extension("sav")).unwrap();
    assert_eq!(save[0], 0x42);

    // the save is restored on the next load
    let mut console = Console::new();
    console.load_rom_file(&rom_path).unwrap();
    assert_eq!(console.mmu.cart().unwrap().ram()[0], 0x42);
}

#[test]
fn replacing_cartridge_flushes_battery_ram() {
    let dir = tempdir().unwrap();
    let rom_path = dir.path().join("swap.gb");
    // LD A,0x0A ; LD (0x0000),A ; LD A,0x5A ; LD (0xA000),A ; JR -2
    let mut rom = rom_with_program(&[0x3E, 0x0A, 0xEA, 0x00, 0x00, 0x3E, 0x5A, 0xEA, 0x00, 0xA0, 0x18, 0xFE]);
    rom[0x0147] = 0x03;
    rom[0x0149] = 0x02;
    fs::write(&rom_path, rom).unwrap();

    let mut console = Console::new();
    console.load_rom_file(&rom_path).unwrap();
    console.power_on();
    console.run_frame(Buttons::default());
    assert!(!rom_path.with_extension("sav").exists());

    let other = Cartridge::from_bytes(rom_with_program(&SPIN)).unwrap();
    console.insert_cartridge(other).unwrap();
    let save = fs::read(rom_path.with_extension("sav")).unwrap();
    assert_eq!(save[0], 0x5A);
    assert_eq!(console.mmu.cart().unwrap().title(), "TEST");
}

#[test]
fn power_cycle_keeps_cartridge() {
    let mut console = console_with_program(&[0x3E, 0x42, 0x18, 0xFE]);
    console.run_frame(Buttons::default());
    assert_eq!(console.cpu.regs.a, 0x42);
    console.power_off().unwrap();
    console.power_on();
    assert_eq!(console.cpu.regs.pc, 0x0100);
    assert_eq!(console.mmu.read(0x0101), 0x42);
}

#[test]
fn eject_removes_cartridge() {
    let mut console = console_with_program(&SPIN);
    let cart = console.eject().unwrap();
    assert_eq!(cart.unwrap().title(), "TEST");
    assert!(console.mmu.cart().is_none());
    assert_eq!(console.mmu.read(0x0100), 0xFF);
}

#[test]
fn boot_rom_size_is_checked() {
    let mut console = Console::new();
    assert!(matches!(
        console.set_boot_rom(Vec::new()),
        Err(ConsoleError::BootRomSize(0))
    ));
    assert!(matches!(
        console.set_boot_rom(vec![0; 0x101]),
        Err(ConsoleError::BootRomSize(0x101))
    ));
    assert!(console.set_boot_rom(vec![0; 0x80]).is_ok());
}

#[test]
fn boot_rom_starts_at_zero() {
    let mut console = Console::with_config(ConsoleConfig {
        boot_rom: Some(vec![0x00; 0x100]),
        ..ConsoleConfig::default()
    })
    .unwrap();
    console.power_on();
    assert_eq!(console.cpu.regs.pc, 0x0000);
    assert!(console.mmu.booting());
}

#[test]
fn audio_samples_follow_sample_rate() {
    let mut console = Console::with_config(ConsoleConfig {
        audio_sample_rate: Some(32_768),
        ..ConsoleConfig::default()
    })
    .unwrap();
    console.insert_cartridge(Cartridge::from_bytes(rom_with_program(&SPIN)).unwrap()).unwrap();
    console.power_on();
    console.run_frame(Buttons::default());
    console.run_frame(Buttons::default());
    let samples = console.take_audio_samples();
    // 32768 Hz is exactly one sample per 128 cycles
    assert_eq!(samples.len(), 2 * ((144 * 456 + CYCLES_PER_FRAME) / 128) as usize);
}

#[test]
fn layers_have_expected_sizes() {
    let console = console_with_program(&SPIN);
    assert_eq!((console.screen().width(), console.screen().height()), (160, 144));
    assert_eq!(console.background().width(), 160);
    assert_eq!(console.window().height(), 144);
    assert_eq!(console.sprites().width(), 160);
    assert_eq!(console.background_map().width(), 256);
    assert_eq!(console.window_map().height(), 256);
    assert_eq!(console.tileset().width(), 256);
}
