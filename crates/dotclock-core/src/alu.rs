//! Flag-exact arithmetic helpers shared by the opcode handlers.
//!
//! Every 8-bit helper returns `(result, flags)` where `flags` is the complete
//! new value of F. Helpers that leave a flag unchanged take the previous F.

use crate::registers::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z};

#[inline(always)]
fn z(res: u8) -> u8 {
    if res == 0 { FLAG_Z } else { 0 }
}

#[inline(always)]
fn bit(cond: bool, mask: u8) -> u8 {
    if cond { mask } else { 0 }
}

pub fn add(a: u8, b: u8, carry_in: bool) -> (u8, u8) {
    let cin = carry_in as u8;
    let (res1, carry1) = a.overflowing_add(b);
    let (res, carry2) = res1.overflowing_add(cin);
    let flags = z(res)
        | bit((a & 0x0F) + (b & 0x0F) + cin > 0x0F, FLAG_H)
        | bit(carry1 || carry2, FLAG_C);
    (res, flags)
}

pub fn sub(a: u8, b: u8, carry_in: bool) -> (u8, u8) {
    let cin = carry_in as u8;
    let (res1, borrow1) = a.overflowing_sub(b);
    let (res, borrow2) = res1.overflowing_sub(cin);
    let flags = FLAG_N
        | z(res)
        | bit((a & 0x0F) < (b & 0x0F) + cin, FLAG_H)
        | bit(borrow1 || borrow2, FLAG_C);
    (res, flags)
}

pub fn and(a: u8, b: u8) -> (u8, u8) {
    let res = a & b;
    (res, z(res) | FLAG_H)
}

pub fn or(a: u8, b: u8) -> (u8, u8) {
    let res = a | b;
    (res, z(res))
}

pub fn xor(a: u8, b: u8) -> (u8, u8) {
    let res = a ^ b;
    (res, z(res))
}

pub fn inc(val: u8, f: u8) -> (u8, u8) {
    let res = val.wrapping_add(1);
    let flags = (f & FLAG_C) | z(res) | bit(val & 0x0F == 0x0F, FLAG_H);
    (res, flags)
}

pub fn dec(val: u8, f: u8) -> (u8, u8) {
    let res = val.wrapping_sub(1);
    let flags = (f & FLAG_C) | FLAG_N | z(res) | bit(val & 0x0F == 0, FLAG_H);
    (res, flags)
}

/// `ADD HL,rr`: Z is preserved, H and C come from bits 11 and 15.
pub fn add16(a: u16, b: u16, f: u8) -> (u16, u8) {
    let res = a.wrapping_add(b);
    let flags = (f & FLAG_Z)
        | bit((a & 0x0FFF) + (b & 0x0FFF) > 0x0FFF, FLAG_H)
        | bit(a as u32 + b as u32 > 0xFFFF, FLAG_C);
    (res, flags)
}

/// `ADD SP,e` and `LD HL,SP+e`: Z and N cleared, H and C from the low byte.
pub fn add_sp_offset(sp: u16, offset: i8) -> (u16, u8) {
    let val = offset as i16 as u16;
    let res = sp.wrapping_add(val);
    let flags = bit((sp & 0x0F) + (val & 0x0F) > 0x0F, FLAG_H)
        | bit((sp & 0xFF) + (val & 0xFF) > 0xFF, FLAG_C);
    (res, flags)
}

/// The eight rotate/shift variants selected by group 0 of the 0xCB table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
}

impl ShiftOp {
    pub fn from_index(index: u8) -> Self {
        match index & 0x07 {
            0 => Self::Rlc,
            1 => Self::Rrc,
            2 => Self::Rl,
            3 => Self::Rr,
            4 => Self::Sla,
            5 => Self::Sra,
            6 => Self::Swap,
            _ => Self::Srl,
        }
    }

    /// Apply the operation, returning the result and the carry-out.
    pub fn apply(self, val: u8, carry_in: bool) -> (u8, bool) {
        match self {
            Self::Rlc => (val.rotate_left(1), val & 0x80 != 0),
            Self::Rrc => (val.rotate_right(1), val & 0x01 != 0),
            Self::Rl => ((val << 1) | carry_in as u8, val & 0x80 != 0),
            Self::Rr => ((val >> 1) | ((carry_in as u8) << 7), val & 0x01 != 0),
            Self::Sla => (val << 1, val & 0x80 != 0),
            // Standard arithmetic shift: bit 7 is replicated.
            Self::Sra => ((val >> 1) | (val & 0x80), val & 0x01 != 0),
            Self::Swap => (val.rotate_left(4), false),
            Self::Srl => (val >> 1, val & 0x01 != 0),
        }
    }

    /// Flags for the prefixed form: Z from the result, N and H cleared.
    pub fn flags(res: u8, carry: bool) -> u8 {
        z(res) | bit(carry, FLAG_C)
    }
}

/// `RLCA`/`RRCA`/`RLA`/`RRA`: same rotation as the prefixed form, Z forced off.
pub fn rotate_accumulator(op: ShiftOp, a: u8, carry_in: bool) -> (u8, u8) {
    let (res, carry) = op.apply(a, carry_in);
    (res, bit(carry, FLAG_C))
}

/// `BIT n`: Z is the complement of the tested bit, N cleared, H set, C kept.
pub fn bit_test(val: u8, n: u8, f: u8) -> u8 {
    (f & FLAG_C) | FLAG_H | bit(val & (1 << n) == 0, FLAG_Z)
}
