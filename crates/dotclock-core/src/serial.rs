use crate::interrupts::Interrupt;
use log::trace;

/// Represents the serial registers (SB/SC).
///
/// No link partner is attached: a transfer started with the internal clock
/// completes immediately, the outgoing byte is captured in an output buffer
/// and the line reads back as 0xFF, like a cable with nothing plugged in.
pub struct Serial {
    sb: u8,
    sc: u8,
    pub(crate) out_buf: Vec<u8>,
}

impl Serial {
    pub fn new() -> Self {
        Self {
            sb: 0,
            sc: 0,
            out_buf: Vec::new(),
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0xFF01 => self.sb,
            0xFF02 => self.sc | 0x7E,
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8, if_reg: &mut u8) {
        match addr {
            0xFF01 => self.sb = val,
            0xFF02 => {
                self.sc = val & 0x81;
                if self.sc == 0x81 {
                    self.transfer(if_reg);
                }
            }
            _ => {}
        }
    }

    fn transfer(&mut self, if_reg: &mut u8) {
        trace!(target: "serial", "sent {:02X}", self.sb);
        self.out_buf.push(self.sb);
        self.sb = 0xFF;
        self.sc &= !0x80;
        *if_reg |= Interrupt::Serial.bit();
    }

    /// Drain everything sent since the last call.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.out_buf)
    }
}

impl Default for Serial {
    fn default() -> Self {
        Self::new()
    }
}
