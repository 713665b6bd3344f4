// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod audit;
pub mod bus;
pub mod layout;
pub mod machine;
pub mod memory;

pub use audit::{audit_vector_table, AuditReport, Expectations, Finding};
pub use bus::SystemBus;
pub use layout::{check_layout, validate_layout, LayoutError, Region};
pub use machine::{BootReport, Machine};
pub use memory::{LinearMemory, ProgramImage, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Arch {
    Arm,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("Memory access violation at {0:#x}")]
    MemoryViolation(u32),
    #[error("Write to read-only flash at {0:#x}")]
    FlashWrite(u32),
    #[error("Segment at {addr:#x} ({len} bytes) does not fit in flash or ram")]
    UnmappedSegment { addr: u64, len: usize },
    #[error("Exception number {0} is outside the vector table")]
    NoSuchVector(u32),
    #[error("Vector {0} is reserved")]
    ReservedVector(u32),
}

pub type SimResult<T> = Result<T, SimulationError>;
