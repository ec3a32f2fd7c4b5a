use crate::{
    config::Settings, error::HostError, input::ScriptedInput, pacer::Pacer, screenshot,
};
use dotclock_core::GameBoy;
use log::{debug, error, info, warn};
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub frames: u64,
    pub cycles: u64,
}

pub struct Session {
    gb: GameBoy,
    input: ScriptedInput,
    settings: Settings,
    frames: u64,
    serial_log: Vec<u8>,
}

fn read_file(path: &Path) -> Result<Vec<u8>, HostError> {
    std::fs::read(path).map_err(|source| HostError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn echo_serial(out: &mut impl Write, bytes: &[u8]) -> std::io::Result<()> {
    out.write_all(bytes)?;
    out.flush()
}

impl Session {
    /// Load the images named in `settings`. Without a boot image the machine
    /// starts from the post-boot state at 0x0100.
    pub fn new(settings: Settings) -> Result<Self, HostError> {
        let rom = read_file(&settings.rom)?;
        let mut gb = match &settings.bootrom {
            Some(path) => {
                let boot = read_file(path)?;
                let mut gb = GameBoy::new();
                gb.load_boot_image(&boot)?;
                gb
            }
            None => GameBoy::new_post_boot(),
        };
        gb.load_program_image(&rom)?;
        info!(
            "loaded {} ({} KiB){}",
            settings.rom.display(),
            rom.len() / 1024,
            if settings.bootrom.is_some() {
                " with boot image"
            } else {
                ""
            }
        );

        Ok(Self {
            gb,
            input: ScriptedInput::new(&settings.hold),
            settings,
            frames: 0,
            serial_log: Vec::new(),
        })
    }

    pub fn gameboy(&self) -> &GameBoy {
        &self.gb
    }

    /// Everything the program sent over the serial port so far.
    pub fn serial_log(&self) -> &[u8] {
        &self.serial_log
    }

    fn limit_reached(&self) -> bool {
        self.settings
            .frames
            .is_some_and(|max| self.frames >= max)
            || self
                .settings
                .cycles
                .is_some_and(|max| self.gb.cpu.cycles >= max)
    }

    /// Step until `target` cycles, the cycle limit, or the end of a frame,
    /// whichever comes first. Returns true if a frame completed.
    fn advance(&mut self, target: u64) -> Result<bool, HostError> {
        let target = match self.settings.cycles {
            Some(max) => target.min(max),
            None => target,
        };
        while self.gb.cpu.cycles < target {
            if let Err(e) = self.gb.step() {
                error!("{}", self.gb.cpu.debug_state());
                return Err(e.into());
            }
            if self.gb.mmu.ppu.frame_ready() {
                self.gb.mmu.ppu.clear_frame_flag();
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn end_frame(&mut self) {
        self.frames += 1;
        let serial = self.gb.mmu.take_serial();
        if !serial.is_empty() {
            if self.settings.serial {
                if let Err(e) = echo_serial(&mut std::io::stdout().lock(), &serial) {
                    warn!("serial echo to stdout failed: {e}");
                }
            }
            self.serial_log.extend_from_slice(&serial);
        }
        if self.settings.debug && self.frames.is_multiple_of(60) {
            debug!("frame {}: {}", self.frames, self.gb.cpu.debug_state());
        }
    }

    /// Run until a frame or cycle limit is reached, or forever if neither is
    /// set. Input is sampled once per iteration.
    pub fn run(&mut self) -> Result<Summary, HostError> {
        let mut pacer = self
            .settings
            .realtime
            .then(|| Pacer::new(Instant::now(), self.gb.cpu.cycles));

        while !self.limit_reached() {
            self.gb.sample_input(&self.input);
            let target = match pacer.as_mut() {
                Some(pacer) => pacer.target(Instant::now(), self.gb.cpu.cycles),
                None => u64::MAX,
            };
            if self.advance(target)? {
                self.end_frame();
            } else if let Some(pacer) = &pacer {
                std::thread::sleep(pacer.wait_time(Instant::now(), self.gb.cpu.cycles + 1));
            }
        }

        if let Some(path) = &self.settings.screenshot {
            screenshot::write_png(path, self.gb.framebuffer())?;
        }

        let summary = Summary {
            frames: self.frames,
            cycles: self.gb.cpu.cycles,
        };
        info!("ran {} frames, {} cycles", summary.frames, summary.cycles);
        Ok(summary)
    }
}
