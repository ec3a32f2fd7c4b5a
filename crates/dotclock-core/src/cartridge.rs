use crate::error::{Error, Result};
use log::debug;

pub const ROM_BANK_SIZE: usize = 0x4000;
/// The bank-select register is 5 bits wide.
pub const MAX_ROM_BANKS: usize = 32;

/// Program image split into 16 KiB banks with a simple bank-select register.
///
/// Bank 0 is fixed at 0x0000-0x3FFF; 0x4000-0x7FFF shows the bank chosen by
/// writing to 0x2000-0x3FFF. There is no external RAM and no header parsing.
#[derive(Debug)]
pub struct Cartridge {
    banks: Vec<[u8; ROM_BANK_SIZE]>,
    rom_bank: usize,
}

impl Cartridge {
    /// Split `data` into banks. The image must be a non-empty whole number of
    /// 16 KiB banks, at most [`MAX_ROM_BANKS`] of them.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::ProgramImageEmpty);
        }
        if data.len() % ROM_BANK_SIZE != 0 {
            return Err(Error::ProgramImageMisaligned { len: data.len() });
        }
        let count = data.len() / ROM_BANK_SIZE;
        if count > MAX_ROM_BANKS {
            return Err(Error::ProgramImageTooLarge { banks: count });
        }

        let banks = data
            .chunks_exact(ROM_BANK_SIZE)
            .map(|chunk| {
                let mut bank = [0u8; ROM_BANK_SIZE];
                bank.copy_from_slice(chunk);
                bank
            })
            .collect();

        Ok(Self { banks, rom_bank: 1 })
    }

    pub fn bank_count(&self) -> usize {
        self.banks.len()
    }

    /// Currently selected switchable bank.
    pub fn rom_bank(&self) -> usize {
        self.rom_bank
    }

    /// Restore the power-on bank selection.
    pub fn reset(&mut self) {
        self.rom_bank = 1;
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x3FFF => self.banks[0][addr as usize],
            0x4000..=0x7FFF => {
                let bank = self.rom_bank % self.banks.len();
                self.banks[bank][(addr - 0x4000) as usize]
            }
            _ => 0xFF,
        }
    }

    pub fn write(&mut self, addr: u16, val: u8) {
        if let 0x2000..=0x3FFF = addr {
            let mut bank = (val & 0x1F) as usize;
            // Selecting anything that lands on bank 0 maps bank 1 instead.
            if bank % self.banks.len() == 0 {
                bank = 1;
            }
            if bank != self.rom_bank {
                debug!(target: "cartridge", "ROM bank {} -> {}", self.rom_bank, bank);
            }
            self.rom_bank = bank;
        }
    }
}
