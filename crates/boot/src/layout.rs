// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// Half-open byte range `[start, end)` in the 32-bit address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryRegion {
    pub start: u32,
    pub end: u32,
}

impl MemoryRegion {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub const fn from_len(start: u32, len: u32) -> Self {
        Self {
            start,
            end: start.wrapping_add(len),
        }
    }

    /// Number of bytes in the region. An inverted region (`end < start`) is
    /// empty.
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn is_inverted(&self) -> bool {
        self.end < self.start
    }

    pub const fn contains(&self, addr: u32) -> bool {
        addr >= self.start && addr < self.end
    }

    /// Whether `other` lies entirely inside `self`.
    pub const fn encloses(&self, other: &MemoryRegion) -> bool {
        other.is_empty() || (other.start >= self.start && other.end <= self.end)
    }

    /// Empty regions overlap nothing.
    pub const fn overlaps(&self, other: &MemoryRegion) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }
}

/// The link-time boundary markers the reset handler works from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BootLayout {
    /// End of code and read-only data in flash (`_etext`).
    pub text_end: u32,
    /// Flash address holding the initial `.data` contents (`_sidata`).
    pub data_load: u32,
    /// Run address range of `.data` in SRAM (`_sdata`..`_edata`).
    pub data: MemoryRegion,
    /// Zero-initialized range in SRAM (`_sbss`..`_ebss`).
    pub bss: MemoryRegion,
}

impl BootLayout {
    /// Where the `.data` initializers live in flash.
    pub const fn data_image(&self) -> MemoryRegion {
        MemoryRegion::from_len(self.data_load, self.data.len())
    }

    /// Reads the boundary symbols emitted by `link.x`.
    ///
    /// # Safety
    ///
    /// Must only be called in an image linked with the firmware link script,
    /// which defines all six symbols.
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    pub unsafe fn from_linker() -> Self {
        extern "C" {
            static _etext: u8;
            static _sidata: u8;
            static _sdata: u8;
            static _edata: u8;
            static _sbss: u8;
            static _ebss: u8;
        }

        // Only the symbol addresses matter; the bytes behind them are never read here.
        let addr = |sym: *const u8| sym as usize as u32;
        Self {
            text_end: addr(core::ptr::addr_of!(_etext)),
            data_load: addr(core::ptr::addr_of!(_sidata)),
            data: MemoryRegion::new(
                addr(core::ptr::addr_of!(_sdata)),
                addr(core::ptr::addr_of!(_edata)),
            ),
            bss: MemoryRegion::new(
                addr(core::ptr::addr_of!(_sbss)),
                addr(core::ptr::addr_of!(_ebss)),
            ),
        }
    }
}
