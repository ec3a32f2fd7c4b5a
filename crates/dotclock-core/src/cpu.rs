use crate::{
    alu::{self, ShiftOp},
    error::{Error, Result},
    interrupts,
    mmu::Mmu,
    registers::{FLAG_C, FLAG_H, FLAG_N, Reg16, Registers},
};
#[cfg(feature = "cpu-trace")]
use log::trace;

// Clock cycles per machine cycle
const CYCLES_PER_M_CYCLE: u16 = 4;

/// The eight operand slots encoded in the low three bits of most opcodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    B,
    C,
    D,
    E,
    H,
    L,
    /// The byte addressed by HL.
    HlIndirect,
    A,
}

impl Operand {
    pub fn from_index(index: u8) -> Self {
        match index & 0x07 {
            0 => Self::B,
            1 => Self::C,
            2 => Self::D,
            3 => Self::E,
            4 => Self::H,
            5 => Self::L,
            6 => Self::HlIndirect,
            _ => Self::A,
        }
    }
}

/// Decoded second byte of a 0xCB-prefixed instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CbGroup {
    Shift(ShiftOp),
    Bit(u8),
    Res(u8),
    Set(u8),
}

impl CbGroup {
    /// Split `opcode` into group (bits 6-7), sub-selector (bits 3-5) and
    /// operand (bits 0-2).
    pub fn decode(opcode: u8) -> (Self, Operand) {
        let sel = (opcode >> 3) & 0x07;
        let group = match opcode >> 6 {
            0 => Self::Shift(ShiftOp::from_index(sel)),
            1 => Self::Bit(sel),
            2 => Self::Res(sel),
            _ => Self::Set(sel),
        };
        (group, Operand::from_index(opcode))
    }
}

/// Branch conditions for JP/JR/CALL/RET.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Always,
    NotZero,
    Zero,
    NotCarry,
    Carry,
}

impl Condition {
    /// Condition selected by bits 3-4 of a conditional opcode.
    fn from_opcode(opcode: u8) -> Self {
        match (opcode >> 3) & 0x03 {
            0 => Self::NotZero,
            1 => Self::Zero,
            2 => Self::NotCarry,
            _ => Self::Carry,
        }
    }

    pub fn holds(self, regs: &Registers) -> bool {
        match self {
            Self::Always => true,
            Self::NotZero => !regs.zero(),
            Self::Zero => regs.zero(),
            Self::NotCarry => !regs.carry(),
            Self::Carry => regs.carry(),
        }
    }
}

pub struct Cpu {
    pub regs: Registers,
    pub cycles: u64,
    pub ime: bool,
    /// Counts down to the instruction after EI, which turns IME on.
    ime_enable_delay: u8,
    /// Set once an undecodable opcode is hit; the CPU stays stopped.
    fault: Option<Error>,
}

impl Cpu {
    /// Power-on state for executing a boot image from 0x0000.
    pub fn new() -> Self {
        Self::with_registers(Registers::new())
    }

    /// Register state the boot ROM hands over at 0x0100.
    pub fn new_post_boot() -> Self {
        Self::with_registers(Registers::post_boot())
    }

    fn with_registers(regs: Registers) -> Self {
        Self {
            regs,
            cycles: 0,
            ime: false,
            ime_enable_delay: 0,
            fault: None,
        }
    }

    /// The error that stopped the CPU, if any.
    pub fn fault(&self) -> Option<Error> {
        self.fault
    }

    #[inline]
    fn tick(&mut self, mmu: &mut Mmu, m_cycles: u8) {
        for _ in 0..m_cycles {
            self.cycles += CYCLES_PER_M_CYCLE as u64;
            mmu.timer.step(CYCLES_PER_M_CYCLE);
            mmu.ppu.step(CYCLES_PER_M_CYCLE, &mut mmu.if_reg);
        }
    }

    #[inline(always)]
    pub fn fetch8(&mut self, mmu: &mut Mmu) -> u8 {
        let val = mmu.read_byte(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.tick(mmu, 1);
        val
    }

    #[inline(always)]
    pub fn fetch16(&mut self, mmu: &mut Mmu) -> u16 {
        let lo = self.fetch8(mmu);
        let hi = self.fetch8(mmu);
        u16::from_le_bytes([lo, hi])
    }

    #[inline(always)]
    pub fn read8(&mut self, mmu: &mut Mmu, addr: u16) -> u8 {
        let val = mmu.read_byte(addr);
        self.tick(mmu, 1);
        val
    }

    #[inline(always)]
    pub fn read16(&mut self, mmu: &mut Mmu, addr: u16) -> u16 {
        let lo = self.read8(mmu, addr);
        let hi = self.read8(mmu, addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    #[inline(always)]
    pub fn write8(&mut self, mmu: &mut Mmu, addr: u16, val: u8) {
        mmu.write_byte(addr, val);
        self.tick(mmu, 1);
    }

    #[inline(always)]
    pub fn write16(&mut self, mmu: &mut Mmu, addr: u16, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.write8(mmu, addr, lo);
        self.write8(mmu, addr.wrapping_add(1), hi);
    }

    /// High byte goes to --SP first, then the low byte.
    pub fn push(&mut self, mmu: &mut Mmu, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write8(mmu, self.regs.sp, hi);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
        self.write8(mmu, self.regs.sp, lo);
    }

    pub fn pop(&mut self, mmu: &mut Mmu) -> u16 {
        let lo = self.read8(mmu, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        let hi = self.read8(mmu, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(1);
        u16::from_le_bytes([lo, hi])
    }

    /// Formatted CPU state string for debugging.
    pub fn debug_state(&self) -> String {
        format!(
            "AF:{:04X} BC:{:04X} DE:{:04X} HL:{:04X} PC:{:04X} SP:{:04X} CY:{}",
            self.regs.read_wide(Reg16::AF),
            self.regs.read_wide(Reg16::BC),
            self.regs.read_wide(Reg16::DE),
            self.regs.read_wide(Reg16::HL),
            self.regs.pc,
            self.regs.sp,
            self.cycles
        )
    }

    fn read_operand(&mut self, mmu: &mut Mmu, operand: Operand) -> u8 {
        match operand {
            Operand::B => self.regs.b,
            Operand::C => self.regs.c,
            Operand::D => self.regs.d,
            Operand::E => self.regs.e,
            Operand::H => self.regs.h,
            Operand::L => self.regs.l,
            Operand::HlIndirect => self.read8(mmu, self.regs.read_wide(Reg16::HL)),
            Operand::A => self.regs.a,
        }
    }

    fn write_operand(&mut self, mmu: &mut Mmu, operand: Operand, val: u8) {
        match operand {
            Operand::B => self.regs.b = val,
            Operand::C => self.regs.c = val,
            Operand::D => self.regs.d = val,
            Operand::E => self.regs.e = val,
            Operand::H => self.regs.h = val,
            Operand::L => self.regs.l = val,
            Operand::HlIndirect => {
                let addr = self.regs.read_wide(Reg16::HL);
                self.write8(mmu, addr, val);
            }
            Operand::A => self.regs.a = val,
        }
    }

    /// Register pair selected by bits 4-5 of the 16-bit load/arithmetic group.
    fn wide_operand(opcode: u8) -> Reg16 {
        match (opcode >> 4) & 0x03 {
            0 => Reg16::BC,
            1 => Reg16::DE,
            2 => Reg16::HL,
            _ => Reg16::SP,
        }
    }

    /// Register pair selected by bits 4-5 of PUSH/POP, where slot 3 is AF.
    fn stack_operand(opcode: u8) -> Reg16 {
        match Self::wide_operand(opcode) {
            Reg16::SP => Reg16::AF,
            reg => reg,
        }
    }

    /// ADD/ADC/SUB/SBC/AND/XOR/OR/CP selected by bits 3-5.
    fn alu_op(&mut self, opcode: u8, val: u8) {
        let a = self.regs.a;
        let carry = self.regs.carry();
        let (res, f) = match (opcode >> 3) & 0x07 {
            0 => alu::add(a, val, false),
            1 => alu::add(a, val, carry),
            2 => alu::sub(a, val, false),
            3 => alu::sub(a, val, carry),
            4 => alu::and(a, val),
            5 => alu::xor(a, val),
            6 => alu::or(a, val),
            _ => (a, alu::sub(a, val, false).1),
        };
        self.regs.a = res;
        self.regs.set_f(f);
    }

    fn handle_cb(&mut self, mmu: &mut Mmu, opcode: u8) {
        let (group, operand) = CbGroup::decode(opcode);
        let val = self.read_operand(mmu, operand);
        match group {
            CbGroup::Shift(op) => {
                let (res, carry) = op.apply(val, self.regs.carry());
                self.write_operand(mmu, operand, res);
                self.regs.set_f(ShiftOp::flags(res, carry));
            }
            CbGroup::Bit(n) => {
                let f = alu::bit_test(val, n, self.regs.f());
                self.regs.set_f(f);
            }
            CbGroup::Res(n) => self.write_operand(mmu, operand, val & !(1 << n)),
            CbGroup::Set(n) => self.write_operand(mmu, operand, val | (1 << n)),
        }
    }

    fn jump_relative(&mut self, mmu: &mut Mmu, cond: Condition) {
        let offset = self.fetch8(mmu) as i8;
        if cond.holds(&self.regs) {
            self.tick(mmu, 1);
            self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
        }
    }

    fn jump(&mut self, mmu: &mut Mmu, cond: Condition) {
        let addr = self.fetch16(mmu);
        if cond.holds(&self.regs) {
            self.tick(mmu, 1);
            self.regs.pc = addr;
        }
    }

    fn call(&mut self, mmu: &mut Mmu, cond: Condition) {
        let addr = self.fetch16(mmu);
        if cond.holds(&self.regs) {
            self.tick(mmu, 1);
            let ret = self.regs.pc;
            self.push(mmu, ret);
            self.regs.pc = addr;
        }
    }

    fn ret(&mut self, mmu: &mut Mmu) {
        self.regs.pc = self.pop(mmu);
        self.tick(mmu, 1);
    }

    fn restart(&mut self, mmu: &mut Mmu, vector: u16) {
        self.tick(mmu, 1);
        let ret = self.regs.pc;
        self.push(mmu, ret);
        self.regs.pc = vector;
    }

    /// Dispatch the highest-priority pending interrupt. Returns true when a
    /// dispatch took the place of an instruction.
    fn handle_interrupts(&mut self, mmu: &mut Mmu) -> bool {
        if !self.ime {
            return false;
        }
        let Some(interrupt) = interrupts::next_pending(mmu.ie_reg, mmu.if_reg) else {
            return false;
        };
        mmu.if_reg &= !interrupt.bit();
        self.ime = false;
        self.ime_enable_delay = 0;
        #[cfg(feature = "cpu-trace")]
        trace!(target: "cpu", "interrupt {interrupt:?} from PC={:04X}", self.regs.pc);
        self.restart(mmu, interrupt.vector());
        true
    }

    /// Execute one instruction, or dispatch one interrupt in its place.
    pub fn step(&mut self, mmu: &mut Mmu) -> Result<()> {
        if let Some(err) = self.fault {
            return Err(err);
        }
        if self.handle_interrupts(mmu) {
            return Ok(());
        }

        let enable_after = self.ime_enable_delay == 1;
        let pc = self.regs.pc;
        let opcode = self.fetch8(mmu);
        #[cfg(feature = "cpu-trace")]
        trace!(target: "cpu", "{pc:04X}: {opcode:02X} {}", self.debug_state());

        match opcode {
            0x00 => {}
            0x01 | 0x11 | 0x21 | 0x31 => {
                let val = self.fetch16(mmu);
                self.regs.write_wide(Self::wide_operand(opcode), val);
            }
            0x02 | 0x12 => {
                let addr = self.regs.read_wide(Self::wide_operand(opcode));
                self.write8(mmu, addr, self.regs.a);
            }
            0x22 | 0x32 => {
                let addr = self.regs.read_wide(Reg16::HL);
                self.write8(mmu, addr, self.regs.a);
                let next = if opcode == 0x22 {
                    addr.wrapping_add(1)
                } else {
                    addr.wrapping_sub(1)
                };
                self.regs.write_wide(Reg16::HL, next);
            }
            0x0A | 0x1A => {
                let addr = self.regs.read_wide(Self::wide_operand(opcode));
                self.regs.a = self.read8(mmu, addr);
            }
            0x2A | 0x3A => {
                let addr = self.regs.read_wide(Reg16::HL);
                self.regs.a = self.read8(mmu, addr);
                let next = if opcode == 0x2A {
                    addr.wrapping_add(1)
                } else {
                    addr.wrapping_sub(1)
                };
                self.regs.write_wide(Reg16::HL, next);
            }
            0x03 | 0x13 | 0x23 | 0x33 => {
                let reg = Self::wide_operand(opcode);
                let val = self.regs.read_wide(reg).wrapping_add(1);
                self.regs.write_wide(reg, val);
                self.tick(mmu, 1);
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let reg = Self::wide_operand(opcode);
                let val = self.regs.read_wide(reg).wrapping_sub(1);
                self.regs.write_wide(reg, val);
                self.tick(mmu, 1);
            }
            0x09 | 0x19 | 0x29 | 0x39 => {
                let hl = self.regs.read_wide(Reg16::HL);
                let rhs = self.regs.read_wide(Self::wide_operand(opcode));
                let (res, f) = alu::add16(hl, rhs, self.regs.f());
                self.regs.write_wide(Reg16::HL, res);
                self.regs.set_f(f);
                self.tick(mmu, 1);
            }
            // INC r / INC (HL)
            op if op & 0xC7 == 0x04 => {
                let operand = Operand::from_index(op >> 3);
                let val = self.read_operand(mmu, operand);
                let (res, f) = alu::inc(val, self.regs.f());
                self.write_operand(mmu, operand, res);
                self.regs.set_f(f);
            }
            // DEC r / DEC (HL)
            op if op & 0xC7 == 0x05 => {
                let operand = Operand::from_index(op >> 3);
                let val = self.read_operand(mmu, operand);
                let (res, f) = alu::dec(val, self.regs.f());
                self.write_operand(mmu, operand, res);
                self.regs.set_f(f);
            }
            // LD r,n / LD (HL),n
            op if op & 0xC7 == 0x06 => {
                let val = self.fetch8(mmu);
                self.write_operand(mmu, Operand::from_index(op >> 3), val);
            }
            0x07 | 0x0F | 0x17 | 0x1F => {
                let shift = ShiftOp::from_index(opcode >> 3);
                let (res, f) = alu::rotate_accumulator(shift, self.regs.a, self.regs.carry());
                self.regs.a = res;
                self.regs.set_f(f);
            }
            0x08 => {
                let addr = self.fetch16(mmu);
                self.write16(mmu, addr, self.regs.sp);
            }
            0x18 => self.jump_relative(mmu, Condition::Always),
            0x20 | 0x28 | 0x30 | 0x38 => self.jump_relative(mmu, Condition::from_opcode(opcode)),
            0x2F => {
                self.regs.a = !self.regs.a;
                self.regs.set_flag(FLAG_N | FLAG_H, true);
            }
            0x37 => {
                self.regs.set_flag(FLAG_N | FLAG_H, false);
                self.regs.set_flag(FLAG_C, true);
            }
            0x3F => {
                let carry = self.regs.carry();
                self.regs.set_flag(FLAG_N | FLAG_H, false);
                self.regs.set_flag(FLAG_C, !carry);
            }
            // LD r,r' (0x76 is HALT and is not implemented)
            0x40..=0x75 | 0x77..=0x7F => {
                let val = self.read_operand(mmu, Operand::from_index(opcode));
                self.write_operand(mmu, Operand::from_index(opcode >> 3), val);
            }
            0x80..=0xBF => {
                let val = self.read_operand(mmu, Operand::from_index(opcode));
                self.alu_op(opcode, val);
            }
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let val = self.fetch8(mmu);
                self.alu_op(opcode, val);
            }
            0xC0 | 0xC8 | 0xD0 | 0xD8 => {
                self.tick(mmu, 1);
                if Condition::from_opcode(opcode).holds(&self.regs) {
                    self.ret(mmu);
                }
            }
            0xC9 => self.ret(mmu),
            0xD9 => {
                self.ret(mmu);
                self.ime = true;
            }
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let val = self.pop(mmu);
                self.regs.write_wide(Self::stack_operand(opcode), val);
            }
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let val = self.regs.read_wide(Self::stack_operand(opcode));
                self.tick(mmu, 1);
                self.push(mmu, val);
            }
            0xC3 => self.jump(mmu, Condition::Always),
            0xC2 | 0xCA | 0xD2 | 0xDA => self.jump(mmu, Condition::from_opcode(opcode)),
            0xCD => self.call(mmu, Condition::Always),
            0xC4 | 0xCC | 0xD4 | 0xDC => self.call(mmu, Condition::from_opcode(opcode)),
            // RST n
            op if op & 0xC7 == 0xC7 => self.restart(mmu, (op & 0x38) as u16),
            0xCB => {
                let cb = self.fetch8(mmu);
                self.handle_cb(mmu, cb);
            }
            0xE0 => {
                let offset = self.fetch8(mmu);
                self.write8(mmu, 0xFF00 | offset as u16, self.regs.a);
            }
            0xF0 => {
                let offset = self.fetch8(mmu);
                self.regs.a = self.read8(mmu, 0xFF00 | offset as u16);
            }
            0xE2 => self.write8(mmu, 0xFF00 | self.regs.c as u16, self.regs.a),
            0xF2 => self.regs.a = self.read8(mmu, 0xFF00 | self.regs.c as u16),
            0xEA => {
                let addr = self.fetch16(mmu);
                self.write8(mmu, addr, self.regs.a);
            }
            0xFA => {
                let addr = self.fetch16(mmu);
                self.regs.a = self.read8(mmu, addr);
            }
            0xE8 => {
                let offset = self.fetch8(mmu) as i8;
                let (res, f) = alu::add_sp_offset(self.regs.sp, offset);
                self.regs.sp = res;
                self.regs.set_f(f);
                self.tick(mmu, 2);
            }
            0xF8 => {
                let offset = self.fetch8(mmu) as i8;
                let (res, f) = alu::add_sp_offset(self.regs.sp, offset);
                self.regs.write_wide(Reg16::HL, res);
                self.regs.set_f(f);
                self.tick(mmu, 1);
            }
            0xE9 => self.regs.pc = self.regs.read_wide(Reg16::HL),
            0xF9 => {
                self.regs.sp = self.regs.read_wide(Reg16::HL);
                self.tick(mmu, 1);
            }
            0xF3 => {
                self.ime = false;
                self.ime_enable_delay = 0;
            }
            0xFB => {
                self.ime_enable_delay = 2;
            }
            // STOP, DAA, HALT and the unused encodings
            _ => {
                let err = Error::UnimplementedOpcode {
                    opcode,
                    address: pc,
                };
                self.fault = Some(err);
                return Err(err);
            }
        }

        if enable_after && self.ime_enable_delay > 0 {
            self.ime = true;
        }
        if self.ime_enable_delay > 0 {
            self.ime_enable_delay -= 1;
        }
        Ok(())
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
