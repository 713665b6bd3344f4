// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

use crate::Arch;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start_addr: u64,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramImage {
    pub entry_point: u64,
    pub segments: Vec<Segment>,
    pub arch: Arch,
}

impl ProgramImage {
    pub fn new(entry_point: u64, arch: Arch) -> Self {
        Self {
            entry_point,
            segments: Vec::new(),
            arch,
        }
    }

    pub fn add_segment(&mut self, start_addr: u64, data: Vec<u8>) {
        self.segments.push(Segment { start_addr, data });
    }

    pub fn total_bytes(&self) -> usize {
        self.segments.iter().map(|s| s.data.len()).sum()
    }
}

/// A simple flat memory storage
#[derive(Debug, Clone)]
pub struct LinearMemory {
    pub data: Vec<u8>,
    pub base_addr: u32,
}

impl LinearMemory {
    pub fn new(size: usize, base_addr: u32) -> Self {
        Self {
            data: vec![0; size],
            base_addr,
        }
    }

    pub fn end_addr(&self) -> u64 {
        u64::from(self.base_addr) + self.data.len() as u64
    }

    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.base_addr && u64::from(addr) < self.end_addr()
    }

    pub fn read_u8(&self, addr: u32) -> Option<u8> {
        if self.contains(addr) {
            Some(self.data[(addr - self.base_addr) as usize])
        } else {
            None
        }
    }

    pub fn write_u8(&mut self, addr: u32, value: u8) -> bool {
        if self.contains(addr) {
            self.data[(addr - self.base_addr) as usize] = value;
            true
        } else {
            false
        }
    }

    pub fn load_from_segment(&mut self, segment: &Segment) -> bool {
        let end_addr = segment.start_addr + segment.data.len() as u64;

        if segment.start_addr >= u64::from(self.base_addr) && end_addr <= self.end_addr() {
            let offset = (segment.start_addr - u64::from(self.base_addr)) as usize;
            self.data[offset..offset + segment.data.len()].copy_from_slice(&segment.data);
            return true;
        }
        false
    }

    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_read_write() {
        let mut mem = LinearMemory::new(1024, 0x2000_0000);

        assert!(mem.write_u8(0x2000_0000, 42));
        assert!(mem.write_u8(0x2000_03FF, 99)); // Last byte

        assert!(!mem.write_u8(0x1FFF_FFFF, 1));
        assert!(!mem.write_u8(0x2000_0400, 1));

        assert_eq!(mem.read_u8(0x2000_0000), Some(42));
        assert_eq!(mem.read_u8(0x2000_03FF), Some(99));
        assert_eq!(mem.read_u8(0x2000_0400), None);
    }

    #[test]
    fn test_memory_at_top_of_address_space() {
        let mut mem = LinearMemory::new(16, 0xFFFF_FFF0);
        assert!(mem.write_u8(0xFFFF_FFFF, 7));
        assert_eq!(mem.read_u8(0xFFFF_FFFF), Some(7));
    }

    #[test]
    fn test_load_from_segment() {
        let mut mem = LinearMemory::new(1024, 0x0800_0000);

        let inside = Segment {
            start_addr: 0x0800_0000,
            data: vec![1, 2, 3],
        };
        assert!(mem.load_from_segment(&inside));
        assert_eq!(mem.read_u8(0x0800_0000), Some(1));

        let straddling = Segment {
            start_addr: 0x0800_03FE,
            data: vec![10, 20, 30],
        };
        assert!(!mem.load_from_segment(&straddling));
        assert_eq!(mem.read_u8(0x0800_03FF), Some(0));

        let exact_fit = Segment {
            start_addr: 0x0800_03FE,
            data: vec![0xAA, 0xBB],
        };
        assert!(mem.load_from_segment(&exact_fit));
        assert_eq!(mem.read_u8(0x0800_03FE), Some(0xAA));
        assert_eq!(mem.read_u8(0x0800_03FF), Some(0xBB));
    }
}
