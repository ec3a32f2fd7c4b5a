mod common;

use common::{ENTRY, machine_with_code, rom_with_code, step_cycles};
use dotclock_core::{
    Error, GameBoy,
    registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z, Reg16},
};

#[test]
fn load_then_xor_clears_accumulator() {
    // LD A,0x42 ; XOR A
    let mut gb = machine_with_code(&[0x3E, 0x42, 0xAF]);
    let start = gb.cpu.cycles;
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.a, 0x42);
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.a, 0);
    assert_eq!(gb.cpu.regs.f(), FLAG_Z);
    assert_eq!(gb.cpu.regs.pc, ENTRY + 3);
    assert_eq!(gb.cpu.cycles - start, 12);
}

#[test]
fn unimplemented_opcode_is_fatal_and_sticky() {
    let mut gb = machine_with_code(&[0x00, 0xD3, 0x00]);
    gb.step().unwrap();
    let err = Error::UnimplementedOpcode {
        opcode: 0xD3,
        address: 0x0101,
    };
    assert_eq!(gb.step(), Err(err));
    let pc = gb.cpu.regs.pc;
    let cycles = gb.cpu.cycles;
    assert_eq!(gb.step(), Err(err));
    assert_eq!(gb.cpu.regs.pc, pc, "a stopped CPU must not advance");
    assert_eq!(gb.cpu.cycles, cycles);
    assert_eq!(gb.cpu.fault(), Some(err));
}

#[test]
fn stop_daa_and_halt_are_not_implemented() {
    for opcode in [0x10, 0x27, 0x76] {
        let mut gb = machine_with_code(&[opcode]);
        assert_eq!(
            gb.step(),
            Err(Error::UnimplementedOpcode {
                opcode,
                address: ENTRY
            }),
            "opcode {opcode:02X}"
        );
    }
}

#[test]
fn call_and_ret_use_the_stack() {
    let mut code = vec![0u8; 0x20];
    code[0..3].copy_from_slice(&[0xCD, 0x10, 0x01]); // CALL 0x0110
    code[0x10] = 0xC9; // RET
    let mut gb = machine_with_code(&code);

    assert_eq!(step_cycles(&mut gb), 24);
    assert_eq!(gb.cpu.regs.pc, 0x0110);
    assert_eq!(gb.cpu.regs.sp, 0xFFFC);
    assert_eq!(gb.mmu.read_byte(0xFFFD), 0x01);
    assert_eq!(gb.mmu.read_byte(0xFFFC), 0x03);

    assert_eq!(step_cycles(&mut gb), 16);
    assert_eq!(gb.cpu.regs.pc, 0x0103);
    assert_eq!(gb.cpu.regs.sp, 0xFFFE);
}

#[test]
fn conditional_branches_cost_extra_when_taken() {
    // XOR A sets Z. JR NZ not taken, JR Z taken over one NOP.
    let mut gb = machine_with_code(&[0xAF, 0x20, 0x05, 0x28, 0x01, 0x00, 0x00]);
    gb.step().unwrap();
    assert_eq!(step_cycles(&mut gb), 8);
    assert_eq!(gb.cpu.regs.pc, 0x0103);
    assert_eq!(step_cycles(&mut gb), 12);
    assert_eq!(gb.cpu.regs.pc, 0x0106);

    // JP NZ not taken, JP Z taken.
    let mut gb = machine_with_code(&[0xAF, 0xC2, 0x00, 0x02, 0xCA, 0x00, 0x02]);
    gb.step().unwrap();
    assert_eq!(step_cycles(&mut gb), 12);
    assert_eq!(step_cycles(&mut gb), 16);
    assert_eq!(gb.cpu.regs.pc, 0x0200);

    // CALL C not taken (XOR A clears carry), CALL NC taken.
    let mut gb = machine_with_code(&[0xAF, 0xDC, 0x00, 0x02, 0xD4, 0x00, 0x02]);
    gb.step().unwrap();
    assert_eq!(step_cycles(&mut gb), 12);
    assert_eq!(gb.cpu.regs.sp, 0xFFFE);
    assert_eq!(step_cycles(&mut gb), 24);
    assert_eq!(gb.cpu.regs.sp, 0xFFFC);
}

#[test]
fn conditional_return_timing() {
    let mut code = vec![0u8; 0x20];
    code[0..4].copy_from_slice(&[0xCD, 0x10, 0x01, 0x00]); // CALL 0x0110
    code[0x10..0x13].copy_from_slice(&[0xAF, 0xC0, 0xC8]); // XOR A ; RET NZ ; RET Z
    let mut gb = machine_with_code(&code);
    gb.step().unwrap();
    gb.step().unwrap();
    assert_eq!(step_cycles(&mut gb), 8);
    assert_eq!(gb.cpu.regs.pc, 0x0112);
    assert_eq!(step_cycles(&mut gb), 20);
    assert_eq!(gb.cpu.regs.pc, 0x0103);
}

#[test]
fn restart_pushes_and_jumps() {
    let mut gb = machine_with_code(&[0xEF]); // RST 28h
    assert_eq!(step_cycles(&mut gb), 16);
    assert_eq!(gb.cpu.regs.pc, 0x0028);
    assert_eq!(gb.mmu.read_byte(0xFFFC), 0x01);
    assert_eq!(gb.mmu.read_byte(0xFFFD), 0x01);
}

#[test]
fn pop_af_masks_low_flag_nibble() {
    // LD BC,0x12FF ; PUSH BC ; POP AF
    let mut gb = machine_with_code(&[0x01, 0xFF, 0x12, 0xC5, 0xF1]);
    gb.step().unwrap();
    assert_eq!(step_cycles(&mut gb), 16);
    assert_eq!(step_cycles(&mut gb), 12);
    assert_eq!(gb.cpu.regs.a, 0x12);
    assert_eq!(gb.cpu.regs.f(), 0xF0);
    assert_eq!(gb.cpu.regs.sp, 0xFFFE);
}

#[test]
fn hl_increment_and_decrement_loads() {
    // LD HL,0xC000 ; LD A,0x11 ; LD (HL+),A ; LD (HL-),A ; LD A,(HL+)
    let mut gb = machine_with_code(&[0x21, 0x00, 0xC0, 0x3E, 0x11, 0x22, 0x32, 0x2A]);
    for _ in 0..4 {
        gb.step().unwrap();
    }
    assert_eq!(gb.mmu.read_byte(0xC000), 0x11);
    assert_eq!(gb.mmu.read_byte(0xC001), 0x11);
    assert_eq!(gb.cpu.regs.read_wide(Reg16::HL), 0xC000);
    gb.mmu.write_byte(0xC000, 0x99);
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.a, 0x99);
    assert_eq!(gb.cpu.regs.read_wide(Reg16::HL), 0xC001);
}

#[test]
fn store_stack_pointer_to_memory() {
    // LD (0xC100),SP
    let mut gb = machine_with_code(&[0x08, 0x00, 0xC1]);
    assert_eq!(step_cycles(&mut gb), 20);
    assert_eq!(gb.mmu.read_byte(0xC100), 0xFE);
    assert_eq!(gb.mmu.read_byte(0xC101), 0xFF);
}

#[test]
fn add_sp_offset_flags_and_timing() {
    // LD SP,0xFFF8 ; ADD SP,8 ; LD HL,SP-1
    let mut gb = machine_with_code(&[0x31, 0xF8, 0xFF, 0xE8, 0x08, 0xF8, 0xFF]);
    gb.step().unwrap();
    assert_eq!(step_cycles(&mut gb), 16);
    assert_eq!(gb.cpu.regs.sp, 0x0000);
    assert_eq!(gb.cpu.regs.f(), FLAG_H | FLAG_C);
    assert_eq!(step_cycles(&mut gb), 12);
    assert_eq!(gb.cpu.regs.read_wide(Reg16::HL), 0xFFFF);
    assert_eq!(gb.cpu.regs.f(), 0);
}

#[test]
fn add_hl_keeps_zero_flag() {
    // XOR A ; LD HL,0x0FFF ; LD BC,0x0001 ; ADD HL,BC
    let mut gb = machine_with_code(&[0xAF, 0x21, 0xFF, 0x0F, 0x01, 0x01, 0x00, 0x09]);
    for _ in 0..3 {
        gb.step().unwrap();
    }
    assert_eq!(step_cycles(&mut gb), 8);
    assert_eq!(gb.cpu.regs.read_wide(Reg16::HL), 0x1000);
    assert_eq!(gb.cpu.regs.f(), FLAG_Z | FLAG_H);
}

#[test]
fn accumulator_rotate_never_sets_zero() {
    // LD A,0x80 ; AND A (clears carry) ; RLA
    let mut gb = machine_with_code(&[0x3E, 0x80, 0xA7, 0x17]);
    for _ in 0..3 {
        gb.step().unwrap();
    }
    assert_eq!(gb.cpu.regs.a, 0);
    assert_eq!(gb.cpu.regs.f(), FLAG_C);

    // Same rotation through the prefix computes Z.
    let mut gb = machine_with_code(&[0x3E, 0x80, 0xA7, 0xCB, 0x17]);
    for _ in 0..2 {
        gb.step().unwrap();
    }
    assert_eq!(step_cycles(&mut gb), 8);
    assert_eq!(gb.cpu.regs.a, 0);
    assert_eq!(gb.cpu.regs.f(), FLAG_Z | FLAG_C);
}

#[test]
fn prefixed_shift_swap_and_bit_ops() {
    // LD B,0x81 ; SRA B ; SWAP B ; BIT 7,B ; BIT 0,B
    let mut gb = machine_with_code(&[0x06, 0x81, 0xCB, 0x28, 0xCB, 0x30, 0xCB, 0x78, 0xCB, 0x40]);
    gb.step().unwrap();
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.b, 0xC0);
    assert_eq!(gb.cpu.regs.f(), FLAG_C);
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.b, 0x0C);
    assert_eq!(gb.cpu.regs.f(), 0);
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.f(), FLAG_Z | FLAG_H, "bit 7 of 0x0C is clear");
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.f(), FLAG_Z | FLAG_H, "bit 0 of 0x0C is clear");
    assert_eq!(gb.cpu.regs.b, 0x0C);
}

#[test]
fn prefixed_ops_on_memory_operand() {
    // LD HL,0xC000 ; SET 3,(HL) ; RES 3,(HL) ; SET 0,(HL) ; BIT 0,(HL)
    let mut gb = machine_with_code(&[
        0x21, 0x00, 0xC0, 0xCB, 0xDE, 0xCB, 0x9E, 0xCB, 0xC6, 0xCB, 0x46,
    ]);
    gb.step().unwrap();
    assert_eq!(step_cycles(&mut gb), 16);
    assert_eq!(gb.mmu.read_byte(0xC000), 0x08);
    gb.step().unwrap();
    assert_eq!(gb.mmu.read_byte(0xC000), 0x00);
    gb.step().unwrap();
    assert_eq!(step_cycles(&mut gb), 12);
    assert!(!gb.cpu.regs.zero());
}

#[test]
fn compare_leaves_accumulator() {
    // LD A,0x10 ; CP 0x20
    let mut gb = machine_with_code(&[0x3E, 0x10, 0xFE, 0x20]);
    gb.step().unwrap();
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.a, 0x10);
    assert_eq!(gb.cpu.regs.f(), FLAG_N | FLAG_C);
}

#[test]
fn complement_and_carry_flag_ops() {
    // LD A,0x0F ; CPL ; SCF ; CCF
    let mut gb = machine_with_code(&[0x3E, 0x0F, 0x2F, 0x37, 0x3F]);
    gb.step().unwrap();
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.a, 0xF0);
    assert!(gb.cpu.regs.subtract() && gb.cpu.regs.half_carry());
    gb.step().unwrap();
    assert!(gb.cpu.regs.carry());
    assert!(!gb.cpu.regs.subtract() && !gb.cpu.regs.half_carry());
    gb.step().unwrap();
    assert!(!gb.cpu.regs.carry());
}

#[test]
fn divider_follows_cpu_cycles() {
    let mut gb = machine_with_code(&[]);
    // 64 NOPs = 256 cycles
    for _ in 0..64 {
        gb.step().unwrap();
    }
    assert_eq!(gb.cpu.cycles, 256);
    assert_eq!(gb.mmu.read_byte(0xFF04), 1);
    assert_eq!(gb.mmu.timer.div_cycles, 0);
}

#[test]
fn serial_output_from_program() {
    // LD A,'O' ; LDH (01),A ; LD A,0x81 ; LDH (02),A
    let mut gb = machine_with_code(&[0x3E, b'O', 0xE0, 0x01, 0x3E, 0x81, 0xE0, 0x02]);
    for _ in 0..4 {
        gb.step().unwrap();
    }
    assert_eq!(gb.mmu.take_serial(), b"O");
    assert_eq!(gb.mmu.if_reg & 0x08, 0x08);
}

#[test]
fn reset_keeps_program_image() {
    let mut gb = machine_with_code(&[0x3E, 0x42]);
    gb.mmu.write_byte(0x2000, 3);
    gb.step().unwrap();
    gb.cpu.regs.a = 0;
    gb.reset();
    assert_eq!(gb.cpu.regs.pc, ENTRY);
    assert_eq!(gb.cpu.cycles, 0);
    assert_eq!(gb.mmu.read_byte(0xFF40), 0x91);
    assert_eq!(gb.mmu.read_byte(0xFF47), 0xFC);
    assert!(!gb.mmu.boot_mapped());
    assert_eq!(gb.mmu.cart.as_ref().map(|c| c.rom_bank()), Some(1));
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.pc, ENTRY + 2);
    assert_eq!(gb.cpu.regs.a, 0x42);
}

#[test]
fn reset_power_on_starts_at_zero() {
    let mut gb = machine_with_code(&[0x3E, 0x42]);
    gb.step().unwrap();
    gb.reset_power_on();
    assert_eq!(gb.cpu.regs, GameBoy::new().cpu.regs);
    assert_eq!(gb.mmu.read_byte(0x0100), 0x3E);
}

#[test]
fn stepping_without_program_image_fails() {
    let mut gb = GameBoy::new_post_boot();
    assert_eq!(gb.step(), Err(Error::ProgramImageMissing));
    assert_eq!(gb.run_frame(), Err(Error::ProgramImageMissing));
    assert_eq!(gb.run_until_cycles(100), Err(Error::ProgramImageMissing));
    assert_eq!(gb.cpu.cycles, 0);
    assert_eq!(gb.cpu.regs.sp, 0xFFFE);
}

#[test]
fn power_on_without_boot_image_fails() {
    let mut gb = GameBoy::new();
    gb.load_program_image(&rom_with_code(&[0x00])).unwrap();
    assert_eq!(gb.step(), Err(Error::BootImageMissing));
    assert_eq!(gb.run_frame(), Err(Error::BootImageMissing));
    assert_eq!(gb.cpu.regs.pc, 0);
    gb.load_boot_image(&[0; 0x100]).unwrap();
    gb.step().unwrap();
    assert_eq!(gb.cpu.regs.pc, 1);
}
