mod common;

use common::machine_with_code;
use dotclock_core::{
    gameboy::CYCLES_PER_FRAME,
    mmu::Mmu,
    ppu::{CANVAS_SIZE, SHADES},
};

#[test]
fn one_frame_of_cycles_completes_one_frame() {
    let mut gb = machine_with_code(&[]);
    gb.run_until_cycles(CYCLES_PER_FRAME).unwrap();
    assert_eq!(gb.cpu.cycles, CYCLES_PER_FRAME);
    assert_eq!(gb.mmu.ppu.frames(), 1);
    assert_eq!(gb.mmu.ppu.ly(), 0);
    assert_eq!(gb.mmu.ppu.lines_rendered(), 154);
}

#[test]
fn run_frame_stops_at_vblank() {
    let mut gb = machine_with_code(&[]);
    gb.run_frame().unwrap();
    assert_eq!(gb.mmu.ppu.ly(), 144);
    assert!(!gb.mmu.ppu.frame_ready());
    assert_eq!(gb.mmu.if_reg & 0x01, 0x01);
    gb.run_frame().unwrap();
    assert_eq!(gb.mmu.ppu.frames(), 2);
}

#[test]
fn ly_never_exceeds_153() {
    let mut mmu = Mmu::new();
    for _ in 0..(CYCLES_PER_FRAME * 3 / 4) {
        mmu.ppu.step(4, &mut mmu.if_reg);
        assert!(mmu.read_byte(0xFF44) <= 153);
    }
}

#[test]
fn background_tile_written_through_the_bus() {
    let mut mmu = Mmu::new_post_boot();
    // LCDC 0x91 uses unsigned tile data; BGP 0xFC maps color 3 to black
    for row in 0..8u16 {
        mmu.write_byte(0x8010 + row * 2, 0xFF);
        mmu.write_byte(0x8011 + row * 2, 0xFF);
    }
    mmu.write_byte(0x9800, 0x01);
    mmu.ppu.step(456, &mut mmu.if_reg);
    let fb = mmu.ppu.framebuffer();
    assert_eq!(fb.len(), CANVAS_SIZE * CANVAS_SIZE);
    assert_eq!(fb[0], SHADES[3]);
    assert_eq!(fb[7], SHADES[3]);
    assert_eq!(fb[8], SHADES[0]);
}

#[test]
fn vertical_scroll_selects_map_row() {
    let mut mmu = Mmu::new_post_boot();
    for row in 0..8u16 {
        mmu.write_byte(0x8010 + row * 2, 0xFF);
    }
    // tile 1 in map row 1, column 0
    mmu.write_byte(0x9820, 0x01);
    mmu.write_byte(0xFF42, 8);
    mmu.write_byte(0xFF47, 0b1110_0100);
    mmu.ppu.step(456, &mut mmu.if_reg);
    assert_eq!(mmu.ppu.framebuffer()[0], SHADES[1]);
}

#[test]
fn sprite_from_dma_is_drawn() {
    let mut mmu = Mmu::new_post_boot();
    mmu.write_byte(0xFF48, 0b1110_0100);
    for row in 0..8u16 {
        mmu.write_byte(0x8020 + row * 2, 0xFF);
        mmu.write_byte(0x8021 + row * 2, 0xFF);
    }
    // sprite 0: top-left corner of the screen, tile 2
    for (i, b) in [16u8, 8, 2, 0].into_iter().enumerate() {
        mmu.write_byte(0xC000 + i as u16, b);
    }
    mmu.write_byte(0xFF46, 0xC0);
    mmu.ppu.step(456, &mut mmu.if_reg);
    let fb = mmu.ppu.framebuffer();
    assert_eq!(fb[0], SHADES[3]);
    assert_eq!(fb[7], SHADES[3]);
    assert_eq!(fb[8], SHADES[0]);
}
