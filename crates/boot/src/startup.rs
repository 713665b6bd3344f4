// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Image initialization performed by the reset handler.
//!
//! Both loops move one byte at a time in increasing address order; nothing
//! about the alignment of the linker symbols is assumed.

use crate::bus::Bus;
use crate::layout::{BootLayout, MemoryRegion};

/// Bytes touched by [`init_image`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InitStats {
    pub copied: u32,
    pub zeroed: u32,
}

/// Copies `data.len()` bytes from `load` into the `.data` run region.
pub fn copy_data<B: Bus>(bus: &mut B, load: u32, data: MemoryRegion) -> Result<u32, B::Error> {
    let size = data.len();
    for offset in 0..size {
        let byte = bus.read_u8(load.wrapping_add(offset))?;
        bus.write_u8(data.start.wrapping_add(offset), byte)?;
    }
    Ok(size)
}

/// Clears every byte of the `.bss` region.
pub fn zero_bss<B: Bus>(bus: &mut B, bss: MemoryRegion) -> Result<u32, B::Error> {
    let size = bss.len();
    for offset in 0..size {
        bus.write_u8(bss.start.wrapping_add(offset), 0)?;
    }
    Ok(size)
}

/// Brings SRAM to the state the application expects: `.data` holds its
/// initializers and `.bss` is zero.
pub fn init_image<B: Bus>(bus: &mut B, layout: &BootLayout) -> Result<InitStats, B::Error> {
    let copied = copy_data(bus, layout.data_load, layout.data)?;
    let zeroed = zero_bss(bus, layout.bss)?;
    Ok(InitStats { copied, zeroed })
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
extern "C" {
    // Exported by `entry!`.
    fn __f401_boot_entry();
}

/// First instruction executed after reset (vector table entry 1).
///
/// Interrupts are not masked here unless the `mask-interrupts` feature is
/// enabled; the routine relies on no interrupt source being enabled at reset.
///
/// # Safety
///
/// Only the core may call this, through the vector table.
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[no_mangle]
pub unsafe extern "C" fn Reset() -> ! {
    #[cfg(feature = "mask-interrupts")]
    cortex_m::interrupt::disable();

    let layout = BootLayout::from_linker();
    let mut bus = crate::bus::Physical::new();
    match init_image(&mut bus, &layout) {
        Ok(_) => {}
        Err(never) => match never {},
    }

    #[cfg(feature = "mask-interrupts")]
    cortex_m::interrupt::enable();

    __f401_boot_entry();

    // The entry point is not supposed to return.
    loop {
        core::hint::spin_loop();
    }
}
