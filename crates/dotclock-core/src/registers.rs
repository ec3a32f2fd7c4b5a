// CPU flag bits as documented in gbdev.io/pandocs/The_CPU_Flags.html
pub const FLAG_Z: u8 = 0x80; // Zero
pub const FLAG_N: u8 = 0x40; // Subtract
pub const FLAG_H: u8 = 0x20; // Half Carry
pub const FLAG_C: u8 = 0x10; // Carry

// Post-boot DMG register state from gbdev.io/pandocs/Power_Up_State.html
const BOOT_A: u8 = 0x01;
const BOOT_F: u8 = 0xB0;
const BOOT_B: u8 = 0x00;
const BOOT_C: u8 = 0x13;
const BOOT_D: u8 = 0x00;
const BOOT_E: u8 = 0xD8;
const BOOT_H: u8 = 0x01;
const BOOT_L: u8 = 0x4D;
const BOOT_PC: u16 = 0x0100;
const BOOT_SP: u16 = 0xFFFE;

/// 16-bit register pairs addressable by the instruction set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg16 {
    AF,
    BC,
    DE,
    HL,
    SP,
}

/// The LR35902 register file.
///
/// The eight 8-bit registers are stored individually; the 16-bit pairs are
/// composed on demand through [`Registers::read_wide`] and
/// [`Registers::write_wide`]. Only the upper nibble of `f` is ever non-zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub pc: u16,
    pub sp: u16,
}

impl Registers {
    /// Power-on state: everything zero, execution starts in the boot overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register contents left behind by the DMG boot ROM.
    pub fn post_boot() -> Self {
        Self {
            a: BOOT_A,
            f: BOOT_F,
            b: BOOT_B,
            c: BOOT_C,
            d: BOOT_D,
            e: BOOT_E,
            h: BOOT_H,
            l: BOOT_L,
            pc: BOOT_PC,
            sp: BOOT_SP,
        }
    }

    #[inline]
    pub fn f(&self) -> u8 {
        self.f
    }

    #[inline]
    pub fn set_f(&mut self, val: u8) {
        self.f = val & 0xF0;
    }

    pub fn read_wide(&self, reg: Reg16) -> u16 {
        match reg {
            Reg16::AF => u16::from_be_bytes([self.a, self.f]),
            Reg16::BC => u16::from_be_bytes([self.b, self.c]),
            Reg16::DE => u16::from_be_bytes([self.d, self.e]),
            Reg16::HL => u16::from_be_bytes([self.h, self.l]),
            Reg16::SP => self.sp,
        }
    }

    pub fn write_wide(&mut self, reg: Reg16, val: u16) {
        let [hi, lo] = val.to_be_bytes();
        match reg {
            Reg16::AF => {
                self.a = hi;
                self.set_f(lo);
            }
            Reg16::BC => {
                self.b = hi;
                self.c = lo;
            }
            Reg16::DE => {
                self.d = hi;
                self.e = lo;
            }
            Reg16::HL => {
                self.h = hi;
                self.l = lo;
            }
            Reg16::SP => self.sp = val,
        }
    }

    #[inline]
    pub fn flag(&self, mask: u8) -> bool {
        self.f & mask != 0
    }

    #[inline]
    pub fn set_flag(&mut self, mask: u8, on: bool) {
        if on {
            self.f |= mask & 0xF0;
        } else {
            self.f &= !mask;
        }
    }

    pub fn zero(&self) -> bool {
        self.flag(FLAG_Z)
    }

    pub fn subtract(&self) -> bool {
        self.flag(FLAG_N)
    }

    pub fn half_carry(&self) -> bool {
        self.flag(FLAG_H)
    }

    pub fn carry(&self) -> bool {
        self.flag(FLAG_C)
    }
}
