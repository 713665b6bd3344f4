// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Startup core for STM32F401 firmware.
//!
//! The crate provides the pieces that run before (and underneath) an
//! application:
//!
//! - [`vectors::VectorTable`]: the 101-entry exception table the core reads at
//!   reset and on every exception.
//! - [`startup`]: `.data` copy and `.bss` clear, generic over a [`Bus`] so the
//!   same routine runs on hardware and in the host simulator.
//! - [`regs`] and [`blink`]: volatile register overlays for RCC/GPIO and the
//!   one application pattern the firmware uses.
//!
//! On `thumbv7em-none-eabihf` the crate also exports the `Reset` symbol and
//! expects the application to register its entry point with [`entry!`].
#![cfg_attr(not(test), no_std)]

pub mod blink;
pub mod bus;
pub mod delay;
pub mod layout;
pub mod regs;
pub mod startup;
pub mod vectors;

pub use bus::{Bus, Physical};
pub use layout::{BootLayout, MemoryRegion};
pub use startup::{copy_data, init_image, zero_bss, InitStats};
pub use vectors::{DefaultHandler, Exception, Handler, Interrupt, ResetHandler, VectorTable};

#[cfg(all(target_arch = "arm", target_os = "none"))]
pub use startup::Reset;

pub const FLASH_BASE: u32 = 0x0800_0000;
pub const SRAM_START: u32 = 0x2000_0000;
pub const SRAM_SIZE: u32 = 96 * 1024;
pub const SRAM_END: u32 = SRAM_START + SRAM_SIZE;

/// Initial main stack pointer: the stack grows down from the end of SRAM.
pub const STACK_TOP: u32 = SRAM_END;

/// Registers the application entry point called by the reset handler.
///
/// The function may return `()` or diverge; if it returns, the reset handler
/// parks the core in an idle loop.
///
/// ```ignore
/// f401_boot::entry!(main);
///
/// fn main() -> ! {
///     loop {}
/// }
/// ```
#[macro_export]
macro_rules! entry {
    ($path:path) => {
        #[export_name = "__f401_boot_entry"]
        pub unsafe extern "C" fn __f401_boot_entry() {
            let f = $path;
            f();
        }
    };
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};

    static CALLS: AtomicUsize = AtomicUsize::new(0);

    fn app() {
        CALLS.fetch_add(1, Ordering::SeqCst);
    }

    crate::entry!(app);

    #[test]
    fn test_entry_calls_registered_function_once() {
        unsafe { __f401_boot_entry() };
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
