use crate::interrupts::Interrupt;

/// The eight joypad buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Right,
    Left,
    Up,
    Down,
    A,
    B,
    Select,
    Start,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::Right,
        Button::Left,
        Button::Up,
        Button::Down,
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
    ];

    /// Bit in the 8-bit button state: directions in the low nibble, actions
    /// in the high nibble. Each nibble lines up with P10-P13 once shifted.
    const fn mask(self) -> u8 {
        match self {
            Button::Right => 0x01,
            Button::Left => 0x02,
            Button::Up => 0x04,
            Button::Down => 0x08,
            Button::A => 0x10,
            Button::B => 0x20,
            Button::Select => 0x40,
            Button::Start => 0x80,
        }
    }
}

/// Host-side provider of button state, sampled once per host iteration.
pub trait InputSource {
    fn is_pressed(&self, button: Button) -> bool;
}

// P1 select lines (active low)
const SELECT_DPAD: u8 = 0x10;
const SELECT_BUTTONS: u8 = 0x20;

/// Joypad register (P1/JOYP, 0xFF00).
pub struct Input {
    /// Written select bits 4-5.
    select: u8,
    /// 1 = pressed.
    pressed: u8,
}

impl Input {
    pub fn new() -> Self {
        Self {
            select: SELECT_DPAD | SELECT_BUTTONS,
            pressed: 0,
        }
    }

    fn selected_low_nibble(&self) -> u8 {
        let mut active = 0u8;
        if self.select & SELECT_DPAD == 0 {
            active |= self.pressed & 0x0F;
        }
        if self.select & SELECT_BUTTONS == 0 {
            active |= self.pressed >> 4;
        }
        active
    }

    pub fn read(&self) -> u8 {
        0xC0 | self.select | (!self.selected_low_nibble() & 0x0F)
    }

    pub fn write(&mut self, val: u8) {
        self.select = val & (SELECT_DPAD | SELECT_BUTTONS);
    }

    /// Update one button. A press that pulls a selected line low requests
    /// the joypad interrupt.
    pub fn set_button(&mut self, button: Button, pressed: bool, if_reg: &mut u8) {
        let before = self.selected_low_nibble();
        if pressed {
            self.pressed |= button.mask();
        } else {
            self.pressed &= !button.mask();
        }
        let after = self.selected_low_nibble();
        if after & !before != 0 {
            *if_reg |= Interrupt::Joypad.bit();
        }
    }
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}
