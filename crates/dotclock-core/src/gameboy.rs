use crate::{
    cpu::Cpu,
    error::{Error, Result},
    input::InputSource,
    mmu::Mmu,
};

/// CPU cycles per video frame (154 lines of 456 dots).
pub const CYCLES_PER_FRAME: u64 = 154 * 456;

pub struct GameBoy {
    pub cpu: Cpu,
    pub mmu: Mmu,
}

impl GameBoy {
    /// Power-on state, for running a boot image from 0x0000.
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            mmu: Mmu::new(),
        }
    }

    /// The state the boot ROM leaves behind, for running a program without one.
    pub fn new_post_boot() -> Self {
        Self {
            cpu: Cpu::new_post_boot(),
            mmu: Mmu::new_post_boot(),
        }
    }

    pub fn load_boot_image(&mut self, data: &[u8]) -> Result<()> {
        self.mmu.load_boot_image(data)
    }

    pub fn load_program_image(&mut self, data: &[u8]) -> Result<()> {
        self.mmu.load_program_image(data)
    }

    fn check_images(&self) -> Result<()> {
        if self.mmu.cart.is_none() {
            return Err(Error::ProgramImageMissing);
        }
        if self.mmu.awaiting_boot_image() {
            return Err(Error::BootImageMissing);
        }
        Ok(())
    }

    pub fn step(&mut self) -> Result<()> {
        self.check_images()?;
        self.cpu.step(&mut self.mmu)
    }

    /// Step until the cycle counter reaches `target`. Stops only between
    /// instructions, so the counter may overshoot by one instruction.
    pub fn run_until_cycles(&mut self, target: u64) -> Result<()> {
        self.check_images()?;
        while self.cpu.cycles < target {
            self.cpu.step(&mut self.mmu)?;
        }
        Ok(())
    }

    /// Step until the pixel pipeline enters vertical blank, then clear the
    /// frame flag.
    pub fn run_frame(&mut self) -> Result<()> {
        self.check_images()?;
        while !self.mmu.ppu.frame_ready() {
            self.cpu.step(&mut self.mmu)?;
        }
        self.mmu.ppu.clear_frame_flag();
        Ok(())
    }

    pub fn sample_input(&mut self, source: &dyn InputSource) {
        self.mmu.sample_input(source);
    }

    pub fn framebuffer(&self) -> &[u32] {
        self.mmu.ppu.framebuffer()
    }

    /// Reset CPU and memory, keeping the loaded images. With a boot image
    /// the machine restarts at 0x0000 in power-on state, otherwise at the
    /// post-boot entry point.
    pub fn reset(&mut self) {
        if self.mmu.has_boot_image() {
            self.reset_power_on();
        } else {
            self.cpu = Cpu::new_post_boot();
            self.mmu.reset_post_boot();
        }
    }

    /// Reset to power-on state regardless of how the machine was built.
    pub fn reset_power_on(&mut self) {
        self.cpu = Cpu::new();
        self.mmu.reset();
    }
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}
