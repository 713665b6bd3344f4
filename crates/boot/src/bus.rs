// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use core::convert::Infallible;

/// Byte-addressed view of the 32-bit address space used by the startup routine.
pub trait Bus {
    type Error;

    fn read_u8(&self, addr: u32) -> Result<u8, Self::Error>;
    fn write_u8(&mut self, addr: u32, value: u8) -> Result<(), Self::Error>;

    fn read_u32(&self, addr: u32) -> Result<u32, Self::Error> {
        let b0 = self.read_u8(addr)? as u32;
        let b1 = self.read_u8(addr.wrapping_add(1))? as u32;
        let b2 = self.read_u8(addr.wrapping_add(2))? as u32;
        let b3 = self.read_u8(addr.wrapping_add(3))? as u32;
        // Little Endian
        Ok(b0 | (b1 << 8) | (b2 << 16) | (b3 << 24))
    }

    fn write_u32(&mut self, addr: u32, value: u32) -> Result<(), Self::Error> {
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.write_u8(addr.wrapping_add(i as u32), byte)?;
        }
        Ok(())
    }
}

/// The real address space, accessed with volatile loads and stores.
#[derive(Debug)]
pub struct Physical {
    _private: (),
}

impl Physical {
    /// # Safety
    ///
    /// Every address handed to the bus is dereferenced as-is. The caller must
    /// only pass addresses that are mapped and valid for the access.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl Bus for Physical {
    type Error = Infallible;

    #[inline(always)]
    fn read_u8(&self, addr: u32) -> Result<u8, Infallible> {
        Ok(unsafe { core::ptr::read_volatile(addr as usize as *const u8) })
    }

    #[inline(always)]
    fn write_u8(&mut self, addr: u32, value: u8) -> Result<(), Infallible> {
        unsafe { core::ptr::write_volatile(addr as usize as *mut u8, value) };
        Ok(())
    }
}
