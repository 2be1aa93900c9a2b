mod common;

use common::FlatBus;
use dotmatrix_core::{bus::MemoryBus, interrupts::Interrupt};

#[test]
fn simultaneous_requests_serviced_in_priority_order() {
    let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0x00]);
    bus.write(0xFFFF, 0x1F);
    bus.write(0xFF0F, 0x1F);

    let mut order = Vec::new();
    for _ in 0..5 {
        cpu.ime = true;
        assert_eq!(cpu.handle_interrupts(&mut bus), 16);
        order.push(cpu.regs.pc);
    }
    assert_eq!(order, vec![0x40, 0x48, 0x50, 0x58, 0x60]);
    assert_eq!(bus.read(0xFF0F), 0x00);
}

#[test]
fn disabled_sources_are_skipped() {
    let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0x00]);
    cpu.ime = true;
    bus.write(0xFFFF, Interrupt::Serial.bit());
    bus.write(0xFF0F, Interrupt::VBlank.bit() | Interrupt::Serial.bit());
    cpu.handle_interrupts(&mut bus);
    assert_eq!(cpu.regs.pc, Interrupt::Serial.vector());
    assert_eq!(bus.read(0xFF0F), Interrupt::VBlank.bit());
}

#[test]
fn ime_clear_leaves_request_pending() {
    let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0x00]);
    bus.write(0xFFFF, 0x01);
    bus.write(0xFF0F, 0x01);
    assert_eq!(cpu.handle_interrupts(&mut bus), 0);
    assert_eq!(cpu.regs.pc, 0xC000);
    assert_eq!(bus.read(0xFF0F), 0x01);
}

#[test]
fn reti_returns_and_enables_ime() {
    let (mut cpu, mut bus) = FlatBus::with_program(0xC000, &[0x00]);
    bus.load(0x0040, &[0xD9]);
    cpu.ime = true;
    bus.write(0xFFFF, 0x01);
    bus.write(0xFF0F, 0x01);
    cpu.handle_interrupts(&mut bus);
    assert_eq!(cpu.step(&mut bus), 16);
    assert_eq!(cpu.regs.pc, 0xC000);
    assert!(cpu.ime);
}
