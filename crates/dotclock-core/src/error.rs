use thiserror::Error;

/// Failures surfaced by the emulation core.
///
/// Loading errors are reported before any instruction runs; an
/// [`Error::UnimplementedOpcode`] stops the CPU for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unimplemented opcode {opcode:02X} at PC={address:04X}")]
    UnimplementedOpcode { opcode: u8, address: u16 },

    #[error("boot image must be exactly 256 bytes, got {actual}")]
    BootImageSize { actual: usize },

    #[error("no boot image loaded for a power-on start")]
    BootImageMissing,

    #[error("no program image loaded")]
    ProgramImageMissing,

    #[error("program image is empty")]
    ProgramImageEmpty,

    #[error("program image length {len:#X} is not a whole number of 16 KiB banks")]
    ProgramImageMisaligned { len: usize },

    #[error("program image has {banks} banks, at most 32 are addressable")]
    ProgramImageTooLarge { banks: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
