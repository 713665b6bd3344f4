// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use f401_boot::{MemoryRegion, VectorTable};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Default schema version for YAML configs
fn default_schema_version() -> String {
    "1.0".to_string()
}

fn default_vector_len() -> usize {
    VectorTable::LEN
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    #[serde(alias = "cortex-m4", alias = "cortex-m4f", alias = "thumbv7em")]
    Arm,
    Unknown,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MemoryRange {
    pub base: u64,
    pub size: String, // e.g. "96KiB"
}

impl MemoryRange {
    pub fn size_bytes(&self) -> Result<u64> {
        parse_size(&self.size)
    }

    fn region(&self, what: &str) -> Result<MemoryRegion> {
        let size = self
            .size_bytes()
            .with_context(|| format!("Invalid {} size '{}'", what, self.size))?;
        if size == 0 {
            anyhow::bail!("{} size must be greater than zero", what);
        }
        // `MemoryRegion` holds an exclusive u32 end, so the last byte of the
        // address space cannot be part of a region.
        let end = self
            .base
            .checked_add(size)
            .filter(|&end| end <= u64::from(u32::MAX))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "{} range {:#x}+{:#x} exceeds the 32-bit address space",
                    what,
                    self.base,
                    size
                )
            })?;
        Ok(MemoryRegion::new(self.base as u32, end as u32))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct VectorTableConfig {
    /// Defaults to the flash base.
    #[serde(default)]
    pub base: Option<u64>,
    #[serde(default = "default_vector_len")]
    pub len: usize,
}

impl Default for VectorTableConfig {
    fn default() -> Self {
        Self {
            base: None,
            len: default_vector_len(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChipDescriptor {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub name: String,
    pub arch: Arch,
    pub flash: MemoryRange,
    pub ram: MemoryRange,
    /// Initial main stack pointer. Defaults to the end of RAM.
    #[serde(default)]
    pub stack_top: Option<u64>,
    #[serde(default)]
    pub vector_table: VectorTableConfig,
}

/// Resolved, validated addresses of a [`ChipDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryMap {
    pub flash: MemoryRegion,
    pub ram: MemoryRegion,
    pub vector_table: MemoryRegion,
    pub vector_len: usize,
    pub stack_top: u32,
}

impl MemoryMap {
    /// The map [`ChipDescriptor::stm32f401`] resolves to.
    pub const STM32F401RE: MemoryMap = MemoryMap {
        flash: MemoryRegion::from_len(f401_boot::FLASH_BASE, 512 * 1024),
        ram: MemoryRegion::from_len(f401_boot::SRAM_START, f401_boot::SRAM_SIZE),
        vector_table: MemoryRegion::from_len(f401_boot::FLASH_BASE, (VectorTable::LEN * 4) as u32),
        vector_len: VectorTable::LEN,
        stack_top: f401_boot::STACK_TOP,
    };
}

impl ChipDescriptor {
    /// STM32F401RE (NUCLEO-F401RE): 512 KiB flash, 96 KiB SRAM.
    pub fn stm32f401() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: "stm32f401re".to_string(),
            arch: Arch::Arm,
            flash: MemoryRange {
                base: u64::from(f401_boot::FLASH_BASE),
                size: "512KiB".to_string(),
            },
            ram: MemoryRange {
                base: u64::from(f401_boot::SRAM_START),
                size: "96KiB".to_string(),
            },
            stack_top: Some(u64::from(f401_boot::STACK_TOP)),
            vector_table: VectorTableConfig::default(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read chip descriptor at {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid chip descriptor {:?}", path))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let chip: Self = serde_yaml::from_str(yaml).context("Failed to parse Chip Descriptor YAML")?;
        chip.validate()?;
        Ok(chip)
    }

    pub fn validate(&self) -> Result<()> {
        self.memory_map().map(|_| ())
    }

    pub fn memory_map(&self) -> Result<MemoryMap> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }
        if self.arch != Arch::Arm {
            anyhow::bail!("Chip '{}' is not a Cortex-M part", self.name);
        }

        let flash = self.flash.region("flash")?;
        let ram = self.ram.region("ram")?;
        if flash.overlaps(&ram) {
            anyhow::bail!("flash {:x?} and ram {:x?} overlap", flash, ram);
        }

        let stack_top = match self.stack_top {
            Some(sp) => u32::try_from(sp)
                .with_context(|| format!("stack_top {:#x} is not a 32-bit address", sp))?,
            None => ram.end,
        };
        if stack_top <= ram.start || stack_top > ram.end {
            anyhow::bail!(
                "stack_top {:#x} is outside ram {:#x}..{:#x}",
                stack_top,
                ram.start,
                ram.end
            );
        }
        if stack_top % 8 != 0 {
            anyhow::bail!("stack_top {:#x} is not 8-byte aligned", stack_top);
        }

        let vector_len = self.vector_table.len;
        if vector_len < VectorTable::IRQ_BASE {
            anyhow::bail!(
                "vector_table.len {} is shorter than the {} system entries",
                vector_len,
                VectorTable::IRQ_BASE
            );
        }
        let vector_base = match self.vector_table.base {
            Some(base) => u32::try_from(base)
                .with_context(|| format!("vector_table.base {:#x} is not a 32-bit address", base))?,
            None => flash.start,
        };
        let vector_end = vector_len
            .checked_mul(4)
            .and_then(|bytes| u32::try_from(bytes).ok())
            .and_then(|bytes| vector_base.checked_add(bytes))
            .ok_or_else(|| {
                anyhow::anyhow!("vector_table.len {} exceeds the address space", vector_len)
            })?;
        let vector_table = MemoryRegion::new(vector_base, vector_end);
        if !flash.encloses(&vector_table) {
            anyhow::bail!(
                "vector table {:#x}..{:#x} does not fit in flash",
                vector_table.start,
                vector_table.end
            );
        }

        let map = MemoryMap {
            flash,
            ram,
            vector_table,
            vector_len,
            stack_top,
        };
        debug!("Resolved memory map for {}: {:x?}", self.name, map);
        Ok(map)
    }
}

/// Parses "96KiB", "512 KiB", "0x18000" or "98304" into a byte count.
pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};

    let trimmed = size_str.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16)
            .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e));
    }
    if let Ok(bytes) = trimmed.parse::<u64>() {
        return Ok(bytes);
    }

    let s: Size = trimmed
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}
