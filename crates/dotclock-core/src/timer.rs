/// Cycles between DIV increments (16384 Hz at 4.194304 MHz).
pub const DIV_PERIOD: u16 = 256;

/// Divider and timer registers.
///
/// Only the divider runs: it increments once per [`DIV_PERIOD`] accumulated
/// cycles. TIMA/TMA/TAC are latched so software can read back what it wrote,
/// but no overflow interrupt is generated.
pub struct Timer {
    /// DIV register value.
    pub div: u8,
    /// Cycles accumulated towards the next DIV increment.
    pub div_cycles: u16,
    /// Timer counter
    pub tima: u8,
    /// Timer modulo
    pub tma: u8,
    /// Timer control
    pub tac: u8,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            div: 0,
            div_cycles: 0,
            tima: 0,
            tma: 0,
            tac: 0,
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF04 => self.div,
            0xFF05 => self.tima,
            0xFF06 => self.tma,
            0xFF07 => self.tac | 0xF8,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        match addr {
            0xFF04 => self.reset_div(),
            0xFF05 => self.tima = val,
            0xFF06 => self.tma = val,
            0xFF07 => self.tac = val & 0x07,
            _ => {}
        }
    }

    /// Advance the divider by `cycles` CPU cycles.
    pub fn step(&mut self, cycles: u16) {
        let total = self.div_cycles as u32 + cycles as u32;
        let increments = total / DIV_PERIOD as u32;
        self.div_cycles = (total % DIV_PERIOD as u32) as u16;
        self.div = self.div.wrapping_add(increments as u8);
    }

    /// Any write to DIV clears both the register and its accumulator.
    pub fn reset_div(&mut self) {
        self.div = 0;
        self.div_cycles = 0;
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
