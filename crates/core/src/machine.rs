// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::bus::SystemBus;
use crate::{SimResult, SimulationError};
use f401_boot::{init_image, BootLayout, Bus, Interrupt, VectorTable};
use f401_config::MemoryMap;
use serde::Serialize;
use tracing::{debug, info};

/// What the simulated reset sequence did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BootReport {
    pub initial_sp: u32,
    pub reset_vector: u32,
    pub copied: u32,
    pub zeroed: u32,
}

/// The core's view of reset and exception entry.
///
/// Only the vector fetches are modelled; instructions are never executed.
/// Image initialization runs the same [`init_image`] the firmware runs.
#[derive(Debug)]
pub struct Machine {
    pub bus: SystemBus,
    /// Vector table offset register. Resets to 0, which the bus aliases to
    /// the start of flash.
    pub vtor: u32,
    pub sp: u32,
    pub pc: u32,
    vector_len: usize,
}

impl Machine {
    pub fn new(bus: SystemBus) -> Self {
        Self {
            bus,
            vtor: 0,
            sp: 0,
            pc: 0,
            vector_len: VectorTable::LEN,
        }
    }

    pub fn from_map(map: &MemoryMap) -> Self {
        let mut machine = Self::new(SystemBus::from_map(map));
        machine.vector_len = map.vector_len;
        machine
    }

    /// Loads SP from table entry 0 and PC from entry 1, as the core does on
    /// power-up.
    pub fn reset(&mut self) -> SimResult<()> {
        self.vtor = 0;
        self.sp = self.bus.read_u32(self.vtor)?;
        self.pc = self.bus.read_u32(self.vtor.wrapping_add(4))? & !1;
        debug!("Reset: SP={:#010x} PC={:#010x}", self.sp, self.pc);
        Ok(())
    }

    /// The first `len` words at VTOR.
    pub fn vector_table(&self, len: usize) -> SimResult<Vec<u32>> {
        (0..len as u32)
            .map(|i| self.bus.read_u32(self.vtor.wrapping_add(i * 4)))
            .collect()
    }

    /// Reset, initialize `.data` and `.bss` per `layout`, then hand over to
    /// `entry` exactly once.
    pub fn run_startup<F>(&mut self, layout: &BootLayout, entry: F) -> SimResult<BootReport>
    where
        F: FnOnce(&mut SystemBus),
    {
        self.reset()?;
        let stats = init_image(&mut self.bus, layout)?;
        info!(
            "Startup: copied {} bytes of .data, zeroed {} bytes of .bss",
            stats.copied, stats.zeroed
        );
        entry(&mut self.bus);

        Ok(BootReport {
            initial_sp: self.sp,
            reset_vector: self.pc,
            copied: stats.copied,
            zeroed: stats.zeroed,
        })
    }

    /// Takes exception `number` and returns the handler address the core
    /// branches to.
    pub fn raise(&mut self, number: u32) -> SimResult<u32> {
        let index = number as usize;
        if index == 0 || index >= self.vector_len {
            return Err(SimulationError::NoSuchVector(number));
        }
        if VectorTable::is_reserved(index) {
            return Err(SimulationError::ReservedVector(number));
        }
        let handler = self.bus.read_u32(self.vtor.wrapping_add(number * 4))? & !1;
        debug!("Exception {} -> {:#010x}", number, handler);
        self.pc = handler;
        Ok(handler)
    }

    pub fn raise_irq(&mut self, interrupt: Interrupt) -> SimResult<u32> {
        self.raise(interrupt.exception_number() as u32)
    }
}
