//! Dot-clock driven DMG Game Boy emulation core.
//!
//! This crate contains the platform-agnostic emulator logic (CPU/MMU/PPU/etc).
//! Hosts live in separate crates and drive the core via the [`gameboy`] facade.

/// Flag-exact 8/16-bit arithmetic helpers.
pub mod alu;

/// ROM bank storage and the bank-select register.
pub mod cartridge;

/// LR35902 CPU core.
pub mod cpu;

/// Error type shared by the loaders and the CPU.
pub mod error;

/// High-level facade that wires the CPU and MMU into a single machine.
pub mod gameboy;

/// Joypad input register and the host input contract.
pub mod input;

/// Interrupt sources and priority.
pub mod interrupts;

/// Memory map and hardware plumbing.
pub mod mmu;

/// Pixel Processing Unit (PPU) emulation.
pub mod ppu;

/// Register file and flag bits.
pub mod registers;

/// Serial unit with an output capture buffer.
pub mod serial;

/// Divider/timer unit.
pub mod timer;

pub use error::{Error, Result};
pub use gameboy::GameBoy;
