#![allow(dead_code)]

use dotclock_core::{GameBoy, cartridge::ROM_BANK_SIZE};

pub const ENTRY: u16 = 0x0100;

/// Two-bank program image with `code` placed at the post-boot entry point.
pub fn rom_with_code(code: &[u8]) -> Vec<u8> {
    let mut rom = vec![0u8; 2 * ROM_BANK_SIZE];
    rom[ENTRY as usize..ENTRY as usize + code.len()].copy_from_slice(code);
    rom
}

/// A post-boot machine about to execute `code` at 0x0100.
pub fn machine_with_code(code: &[u8]) -> GameBoy {
    let mut gb = GameBoy::new_post_boot();
    gb.load_program_image(&rom_with_code(code))
        .expect("test image is well formed");
    gb
}

/// Run one instruction and return how many cycles it took.
pub fn step_cycles(gb: &mut GameBoy) -> u64 {
    let before = gb.cpu.cycles;
    gb.step().expect("instruction is implemented");
    gb.cpu.cycles - before
}
