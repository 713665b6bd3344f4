// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! "Toggle a pin with a delay loop", parameterized over port, pin and delay.

use crate::delay;
use crate::regs::{GpioRegisters, Port, RccRegisters};

/// NUCLEO-F401RE user LED LD2.
pub const LD2_PORT: Port = Port::A;
pub const LD2_PIN: u8 = 5;
pub const DEFAULT_DELAY: u32 = 100_000;

pub struct Led<'a> {
    gpio: &'a GpioRegisters,
    port: Port,
    pin: u8,
    delay: u32,
}

impl<'a> Led<'a> {
    /// `gpio` must be the register block of `port`.
    pub const fn new(gpio: &'a GpioRegisters, port: Port, pin: u8, delay: u32) -> Self {
        assert!(pin < 16, "GPIO ports have 16 pins");
        Self {
            gpio,
            port,
            pin,
            delay,
        }
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Gates the port clock on AHB1.
    pub fn enable_port_clock(&self, rcc: &RccRegisters) {
        rcc.ahb1enr.set_bits(1 << self.port.index());
    }

    /// General-purpose push-pull output, low speed, no pull resistor.
    pub fn configure(&self) {
        let shift = u32::from(self.pin) * 2;
        self.gpio.moder.write_field(shift, 2, 0b01);
        self.gpio.otyper.clear_bits(self.mask());
        self.gpio.ospeedr.write_field(shift, 2, 0b00);
        self.gpio.pupdr.write_field(shift, 2, 0b00);
    }

    pub fn set(&self) {
        self.gpio.bsrr.write(self.mask());
    }

    pub fn clear(&self) {
        self.gpio.bsrr.write(self.mask() << 16);
    }

    pub fn is_set(&self) -> bool {
        self.gpio.odr.read() & self.mask() != 0
    }

    pub fn toggle(&self) {
        if self.is_set() {
            self.clear();
        } else {
            self.set();
        }
    }

    /// One half period: flip the pin, then wait.
    pub fn step(&self) {
        self.toggle();
        delay::spin(self.delay);
    }

    pub fn run(&self) -> ! {
        loop {
            self.step();
        }
    }

    fn mask(&self) -> u32 {
        1 << self.pin
    }
}
