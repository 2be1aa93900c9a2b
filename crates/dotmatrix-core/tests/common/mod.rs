#![allow(dead_code)]

use dotmatrix_core::{
    Console,
    bus::MemoryBus,
    cartridge::Cartridge,
    cpu::Cpu,
};

/// 64 KiB of plain RAM with no side effects.
pub struct FlatBus {
    pub mem: Vec<u8>,
}

impl FlatBus {
    pub fn new() -> Self {
        Self {
            mem: vec![0; 0x10000],
        }
    }

    /// Bus with `program` at `origin` and a CPU pointed at it.
    pub fn with_program(origin: u16, program: &[u8]) -> (Cpu, Self) {
        let mut bus = Self::new();
        bus.load(origin, program);
        let mut cpu = Cpu::new();
        cpu.regs.pc = origin;
        cpu.regs.sp = 0xDFF0;
        (cpu, bus)
    }

    pub fn load(&mut self, origin: u16, bytes: &[u8]) {
        let start = origin as usize;
        self.mem[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl MemoryBus for FlatBus {
    fn read(&self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.mem[addr as usize] = val;
    }
}

/// 32 KiB ROM-only image with `program` at the 0x0100 entry point.
pub fn rom_with_program(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0u8; 0x8000];
    rom[0x0134..0x0138].copy_from_slice(b"TEST");
    rom[0x0100..0x0100 + program.len()].copy_from_slice(program);
    rom
}

/// Powered-on console (post-boot state) running `program` from 0x0100.
pub fn console_with_program(program: &[u8]) -> Console {
    let mut console = Console::new();
    let cart = Cartridge::from_bytes(rom_with_program(program)).unwrap();
    console.insert_cartridge(cart).unwrap();
    console.power_on();
    console
}
