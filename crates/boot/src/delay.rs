// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::regs::Volatile;

/// Busy-waits for `count` loop iterations.
///
/// The counter lives in a volatile cell so the optimizer cannot collapse the
/// loop. Duration depends on the core clock; at the 16 MHz HSI reset clock
/// 100_000 iterations are a visible blink period.
pub fn spin(count: u32) -> u32 {
    let counter = Volatile::new(0u32);
    while counter.read() < count {
        counter.write(counter.read() + 1);
        core::hint::spin_loop();
    }
    counter.read()
}
