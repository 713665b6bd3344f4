// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::memory::{LinearMemory, ProgramImage};
use crate::{SimResult, SimulationError};
use f401_boot::Bus;
use f401_config::{ChipDescriptor, MemoryMap};
use tracing::debug;

/// Flash and SRAM of the simulated part.
///
/// Flash is read-only to the core (stores raise [`SimulationError::FlashWrite`])
/// and is aliased at address 0, as when booting from main flash.
#[derive(Debug, Clone)]
pub struct SystemBus {
    pub flash: LinearMemory,
    pub ram: LinearMemory,
    pub alias_flash_at_zero: bool,
    writes: u64,
}

impl Default for SystemBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemBus {
    /// STM32F401RE memories.
    pub fn new() -> Self {
        Self::from_map(&MemoryMap::STM32F401RE)
    }

    pub fn from_config(chip: &ChipDescriptor) -> anyhow::Result<Self> {
        Ok(Self::from_map(&chip.memory_map()?))
    }

    pub fn from_map(map: &MemoryMap) -> Self {
        debug!(
            "SystemBus: flash {:#x}+{:#x}, ram {:#x}+{:#x}",
            map.flash.start,
            map.flash.len(),
            map.ram.start,
            map.ram.len()
        );
        Self {
            flash: LinearMemory::new(map.flash.len() as usize, map.flash.start),
            ram: LinearMemory::new(map.ram.len() as usize, map.ram.start),
            alias_flash_at_zero: true,
            writes: 0,
        }
    }

    /// Programs every segment of the image into flash (or RAM, for images
    /// that carry RAM-resident load addresses).
    pub fn load_image(&mut self, image: &ProgramImage) -> SimResult<()> {
        for segment in &image.segments {
            if self.flash.load_from_segment(segment) || self.ram.load_from_segment(segment) {
                debug!(
                    "Loaded {} bytes at {:#x}",
                    segment.data.len(),
                    segment.start_addr
                );
                continue;
            }
            return Err(SimulationError::UnmappedSegment {
                addr: segment.start_addr,
                len: segment.data.len(),
            });
        }
        Ok(())
    }

    /// Writes `data` without going through the core's access rules (a debugger
    /// or flash programmer view). Not counted in [`SystemBus::writes`].
    pub fn poke(&mut self, addr: u32, data: &[u8]) -> SimResult<()> {
        for (i, &byte) in data.iter().enumerate() {
            let a = addr.wrapping_add(i as u32);
            if !(self.flash.write_u8(a, byte) || self.ram.write_u8(a, byte)) {
                return Err(SimulationError::MemoryViolation(a));
            }
        }
        Ok(())
    }

    pub fn read_bytes(&self, addr: u32, len: usize) -> SimResult<Vec<u8>> {
        (0..len)
            .map(|i| self.read_u8(addr.wrapping_add(i as u32)))
            .collect()
    }

    /// Number of stores the core has performed.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    fn alias(&self, addr: u32) -> Option<u32> {
        if self.alias_flash_at_zero && (addr as usize) < self.flash.data.len() {
            Some(self.flash.base_addr + addr)
        } else {
            None
        }
    }
}

impl Bus for SystemBus {
    type Error = SimulationError;

    fn read_u8(&self, addr: u32) -> SimResult<u8> {
        if let Some(value) = self.ram.read_u8(addr) {
            return Ok(value);
        }
        if let Some(value) = self.flash.read_u8(addr) {
            return Ok(value);
        }
        self.alias(addr)
            .and_then(|a| self.flash.read_u8(a))
            .ok_or(SimulationError::MemoryViolation(addr))
    }

    fn write_u8(&mut self, addr: u32, value: u8) -> SimResult<()> {
        if self.ram.write_u8(addr, value) {
            self.writes += 1;
            return Ok(());
        }
        if self.flash.contains(addr) || self.alias(addr).is_some() {
            return Err(SimulationError::FlashWrite(addr));
        }
        Err(SimulationError::MemoryViolation(addr))
    }
}
