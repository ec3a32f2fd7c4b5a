use crate::{
    cartridge::Cartridge,
    error::{Error, Result},
    input::{Button, Input, InputSource},
    ppu::{OAM_SIZE, Ppu},
    serial::Serial,
    timer::Timer,
};
use log::debug;

pub const BOOT_ROM_SIZE: usize = 0x100;
const WRAM_BANK_SIZE: usize = 0x1000;
const HRAM_SIZE: usize = 0x7F;
const SOUND_REGS: usize = 0x30;

/// Memory map of the DMG: every CPU-visible byte is resolved here.
pub struct Mmu {
    pub wram: [[u8; WRAM_BANK_SIZE]; 2],
    pub hram: [u8; HRAM_SIZE],
    pub cart: Option<Cartridge>,
    boot_rom: Option<[u8; BOOT_ROM_SIZE]>,
    /// Set by the first nonzero write to 0xFF50 and never cleared.
    boot_unmapped: bool,
    pub if_reg: u8,
    pub ie_reg: u8,
    pub serial: Serial,
    pub ppu: Ppu,
    pub timer: Timer,
    pub input: Input,
    /// NR10-NR52 and wave RAM, latched without an audio unit behind them.
    sound: [u8; SOUND_REGS],
}

impl Mmu {
    /// Power-on state: everything zeroed, boot overlay mapped.
    pub fn new() -> Self {
        Self {
            wram: [[0; WRAM_BANK_SIZE]; 2],
            hram: [0; HRAM_SIZE],
            cart: None,
            boot_rom: None,
            boot_unmapped: false,
            if_reg: 0,
            ie_reg: 0,
            serial: Serial::new(),
            ppu: Ppu::new(),
            timer: Timer::new(),
            input: Input::new(),
            sound: [0; SOUND_REGS],
        }
    }

    /// State the boot ROM leaves behind, for running a program without one.
    pub fn new_post_boot() -> Self {
        let mut mmu = Self::new();
        mmu.boot_unmapped = true;
        mmu.ppu.apply_boot_state();
        mmu
    }

    /// Install the 256-byte boot image shown at 0x0000-0x00FF until the
    /// boot latch is written.
    pub fn load_boot_image(&mut self, data: &[u8]) -> Result<()> {
        let image: [u8; BOOT_ROM_SIZE] = data
            .try_into()
            .map_err(|_| Error::BootImageSize { actual: data.len() })?;
        self.boot_rom = Some(image);
        debug!(target: "mmu", "boot image loaded");
        Ok(())
    }

    pub fn load_program_image(&mut self, data: &[u8]) -> Result<()> {
        let cart = Cartridge::from_bytes(data)?;
        debug!(target: "mmu", "program image loaded: {} banks", cart.bank_count());
        self.cart = Some(cart);
        Ok(())
    }

    /// Return to power-on state, keeping the loaded images.
    pub fn reset(&mut self) {
        let cart = self.cart.take().map(|mut cart| {
            cart.reset();
            cart
        });
        let boot_rom = self.boot_rom;
        *self = Self::new();
        self.cart = cart;
        self.boot_rom = boot_rom;
    }

    /// Return to the state the boot ROM leaves behind, keeping the loaded
    /// images.
    pub fn reset_post_boot(&mut self) {
        self.reset();
        self.boot_unmapped = true;
        self.ppu.apply_boot_state();
    }

    pub fn has_boot_image(&self) -> bool {
        self.boot_rom.is_some()
    }

    /// Power-on state with nothing to run from 0x0000 until the latch.
    pub fn awaiting_boot_image(&self) -> bool {
        self.boot_rom.is_none() && !self.boot_unmapped
    }

    pub fn boot_mapped(&self) -> bool {
        self.boot_rom.is_some() && !self.boot_unmapped
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x00FF if self.boot_mapped() => match &self.boot_rom {
                Some(boot) => boot[addr as usize],
                None => 0xFF,
            },
            0x0000..=0x7FFF => self.cart.as_ref().map_or(0xFF, |c| c.read(addr)),
            0x8000..=0x9FFF => self.ppu.vram[(addr - 0x8000) as usize],
            // No external RAM
            0xA000..=0xBFFF => 0xFF,
            0xC000..=0xCFFF => self.wram[0][(addr - 0xC000) as usize],
            0xD000..=0xDFFF => self.wram[1][(addr - 0xD000) as usize],
            0xE000..=0xFDFF => self.read_byte(addr - 0x2000),
            0xFE00..=0xFE9F => self.ppu.oam_read((addr - 0xFE00) as usize),
            0xFEA0..=0xFEFF => 0xFF,
            0xFF00 => self.input.read(),
            0xFF01 | 0xFF02 => self.serial.read(addr),
            0xFF04..=0xFF07 => self.timer.read(addr),
            0xFF0F => 0xE0 | self.if_reg,
            0xFF10..=0xFF3F => self.sound[(addr - 0xFF10) as usize],
            0xFF40..=0xFF4B => self.ppu.read_reg(addr),
            0xFF50 => {
                if self.boot_unmapped {
                    0xFF
                } else {
                    0xFE
                }
            }
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize],
            0xFFFF => self.ie_reg,
            _ => 0xFF,
        }
    }

    pub fn write_byte(&mut self, addr: u16, val: u8) {
        match addr {
            0x0000..=0x7FFF => {
                if let Some(cart) = self.cart.as_mut() {
                    cart.write(addr, val);
                }
            }
            0x8000..=0x9FFF => self.ppu.vram[(addr - 0x8000) as usize] = val,
            0xA000..=0xBFFF => {}
            0xC000..=0xCFFF => self.wram[0][(addr - 0xC000) as usize] = val,
            0xD000..=0xDFFF => self.wram[1][(addr - 0xD000) as usize] = val,
            0xE000..=0xFDFF => self.write_byte(addr - 0x2000, val),
            0xFE00..=0xFE9F => self.ppu.oam_write((addr - 0xFE00) as usize, val),
            0xFEA0..=0xFEFF => {}
            0xFF00 => self.input.write(val),
            0xFF01 | 0xFF02 => self.serial.write(addr, val, &mut self.if_reg),
            0xFF04..=0xFF07 => self.timer.write(addr, val),
            0xFF0F => self.if_reg = val & 0x1F,
            0xFF10..=0xFF3F => self.sound[(addr - 0xFF10) as usize] = val,
            0xFF46 => self.oam_dma(val),
            0xFF40..=0xFF4B => self.ppu.write_reg(addr, val),
            0xFF50 => {
                if val != 0 && !self.boot_unmapped {
                    debug!(target: "mmu", "boot overlay unmapped");
                    self.boot_unmapped = true;
                }
            }
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize] = val,
            0xFFFF => self.ie_reg = val,
            _ => {}
        }
    }

    /// Copy 160 bytes from `val << 8` into the sprite attribute table. The
    /// transfer is instantaneous and goes through the regular bus decoding.
    fn oam_dma(&mut self, val: u8) {
        self.ppu.dma = val;
        let src = (val as u16) << 8;
        debug!(target: "mmu", "OAM DMA from {src:04X}");
        for i in 0..OAM_SIZE as u16 {
            let byte = self.read_byte(src.wrapping_add(i));
            self.write_byte(0xFE00 + i, byte);
        }
    }

    pub fn set_button_state(&mut self, button: Button, pressed: bool) {
        self.input.set_button(button, pressed, &mut self.if_reg);
    }

    /// Push the current state of every button from `source`.
    pub fn sample_input(&mut self, source: &dyn InputSource) {
        for button in Button::ALL {
            self.set_button_state(button, source.is_pressed(button));
        }
    }

    pub fn take_serial(&mut self) -> Vec<u8> {
        self.serial.take_output()
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}
