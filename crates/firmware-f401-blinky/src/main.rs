#![no_std]
// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.
#![no_main]
#![allow(clippy::empty_loop)]

use f401_boot::blink::{Led, DEFAULT_DELAY, LD2_PIN, LD2_PORT};
use f401_boot::{regs, Exception, VectorTable, STACK_TOP};
use panic_halt as _;

#[link_section = ".isr_vector"]
#[no_mangle]
#[used]
pub static VECTORS: VectorTable =
    VectorTable::standard(STACK_TOP).with_exception(Exception::HardFault, hard_fault);

f401_boot::entry!(main);

// NUCLEO-F401RE: LD2 is wired to PA5.
fn main() -> ! {
    let (rcc, gpio) = unsafe { (regs::rcc(), regs::gpio(LD2_PORT)) };
    let led = Led::new(gpio, LD2_PORT, LD2_PIN, DEFAULT_DELAY);

    led.enable_port_clock(rcc);
    led.configure();
    led.run()
}

/// Leaves LD2 lit so a fault is distinguishable from the blink loop.
unsafe extern "C" fn hard_fault() {
    let led = Led::new(regs::gpio(LD2_PORT), LD2_PORT, LD2_PIN, 0);
    led.set();
    loop {
        cortex_m::asm::nop();
    }
}
