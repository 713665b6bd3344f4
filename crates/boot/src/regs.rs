// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Memory-mapped register overlays for the two peripherals the firmware
//! touches: RCC (clock gating) and GPIO.

use core::cell::UnsafeCell;

pub const RCC_BASE: u32 = 0x4002_3800;
pub const GPIOA_BASE: u32 = 0x4002_0000;
pub const GPIO_PORT_STRIDE: u32 = 0x400;

/// A register cell whose every access is a volatile load or store.
#[repr(transparent)]
pub struct Volatile<T: Copy> {
    value: UnsafeCell<T>,
}

// Register blocks are shared between the application and interrupt handlers;
// each access is a single volatile load or store.
unsafe impl<T: Copy + Send> Sync for Volatile<T> {}

impl<T: Copy> Volatile<T> {
    pub const fn new(value: T) -> Self {
        Self {
            value: UnsafeCell::new(value),
        }
    }

    #[inline(always)]
    pub fn read(&self) -> T {
        unsafe { core::ptr::read_volatile(self.value.get()) }
    }

    #[inline(always)]
    pub fn write(&self, value: T) {
        unsafe { core::ptr::write_volatile(self.value.get(), value) }
    }

    /// Read-modify-write. Not atomic with respect to interrupts.
    #[inline(always)]
    pub fn modify(&self, f: impl FnOnce(T) -> T) {
        self.write(f(self.read()));
    }
}

impl Volatile<u32> {
    #[inline(always)]
    pub fn set_bits(&self, mask: u32) {
        self.modify(|v| v | mask);
    }

    #[inline(always)]
    pub fn clear_bits(&self, mask: u32) {
        self.modify(|v| v & !mask);
    }

    #[inline(always)]
    pub fn toggle_bits(&self, mask: u32) {
        self.modify(|v| v ^ mask);
    }

    /// Replaces the `width`-bit field at `shift` with `value`.
    #[inline(always)]
    pub fn write_field(&self, shift: u32, width: u32, value: u32) {
        let mask = ((1u32 << width) - 1) << shift;
        self.modify(|v| (v & !mask) | ((value << shift) & mask));
    }
}

/// RCC register block, up to AHB1ENR.
#[repr(C)]
pub struct RccRegisters {
    pub cr: Volatile<u32>,
    pub pllcfgr: Volatile<u32>,
    pub cfgr: Volatile<u32>,
    pub cir: Volatile<u32>,
    pub ahb1rstr: Volatile<u32>,
    pub ahb2rstr: Volatile<u32>,
    _reserved0: [u32; 2],
    pub apb1rstr: Volatile<u32>,
    pub apb2rstr: Volatile<u32>,
    _reserved1: [u32; 2],
    pub ahb1enr: Volatile<u32>,
}

/// GPIO port register block.
#[repr(C)]
pub struct GpioRegisters {
    pub moder: Volatile<u32>,
    pub otyper: Volatile<u32>,
    pub ospeedr: Volatile<u32>,
    pub pupdr: Volatile<u32>,
    pub idr: Volatile<u32>,
    pub odr: Volatile<u32>,
    pub bsrr: Volatile<u32>,
    pub lckr: Volatile<u32>,
    pub afrl: Volatile<u32>,
    pub afrh: Volatile<u32>,
}

impl RccRegisters {
    /// A detached, all-zero block (reset values are irrelevant off-target).
    pub const fn detached() -> Self {
        Self {
            cr: Volatile::new(0),
            pllcfgr: Volatile::new(0),
            cfgr: Volatile::new(0),
            cir: Volatile::new(0),
            ahb1rstr: Volatile::new(0),
            ahb2rstr: Volatile::new(0),
            _reserved0: [0; 2],
            apb1rstr: Volatile::new(0),
            apb2rstr: Volatile::new(0),
            _reserved1: [0; 2],
            ahb1enr: Volatile::new(0),
        }
    }
}

impl GpioRegisters {
    pub const fn detached() -> Self {
        Self {
            moder: Volatile::new(0),
            otyper: Volatile::new(0),
            ospeedr: Volatile::new(0),
            pupdr: Volatile::new(0),
            idr: Volatile::new(0),
            odr: Volatile::new(0),
            bsrr: Volatile::new(0),
            lckr: Volatile::new(0),
            afrl: Volatile::new(0),
            afrh: Volatile::new(0),
        }
    }
}

/// GPIO ports present on STM32F401 packages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
    H,
}

impl Port {
    /// Position of the port on AHB1; also its GPIOxEN bit in RCC_AHB1ENR.
    pub const fn index(self) -> u32 {
        match self {
            Port::A => 0,
            Port::B => 1,
            Port::C => 2,
            Port::D => 3,
            Port::E => 4,
            Port::H => 7,
        }
    }

    pub const fn base(self) -> u32 {
        GPIOA_BASE + self.index() * GPIO_PORT_STRIDE
    }
}

/// # Safety
///
/// Only valid on the target; the returned reference aliases hardware.
pub unsafe fn rcc() -> &'static RccRegisters {
    &*(RCC_BASE as usize as *const RccRegisters)
}

/// # Safety
///
/// Only valid on the target; the returned reference aliases hardware.
pub unsafe fn gpio(port: Port) -> &'static GpioRegisters {
    &*(port.base() as usize as *const GpioRegisters)
}
