// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod fixture;

use anyhow::{anyhow, Context, Result};
use f401_boot::{BootLayout, MemoryRegion};
use f401_core::memory::ProgramImage;
use goblin::elf::program_header::PT_LOAD;
use goblin::elf::sym::{STT_FILE, STT_SECTION};
use goblin::elf::Elf;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// A firmware ELF: what gets programmed into flash plus its symbols.
#[derive(Debug, Clone)]
pub struct FirmwareImage {
    pub image: ProgramImage,
    pub symbols: SymbolTable,
    /// Address and size in bytes of the `.isr_vector` section, if present.
    pub vector_section: Option<(u32, u32)>,
}

pub fn load_elf(path: &Path) -> Result<FirmwareImage> {
    let buffer = fs::read(path).with_context(|| format!("Failed to read ELF file: {:?}", path))?;
    load_elf_bytes(&buffer)
}

pub fn load_elf_bytes(buffer: &[u8]) -> Result<FirmwareImage> {
    let elf = Elf::parse(buffer).context("Failed to parse ELF binary")?;

    info!("ELF Entry Point: {:#x}", elf.entry);

    let arch = match elf.header.e_machine {
        goblin::elf::header::EM_ARM => f401_core::Arch::Arm,
        _ => {
            warn!("Unknown ELF machine type: {}", elf.header.e_machine);
            f401_core::Arch::Unknown
        }
    };

    let mut image = ProgramImage::new(elf.entry, arch);

    for ph in &elf.program_headers {
        if ph.p_type != PT_LOAD {
            continue;
        }
        // Flash contents are placed at the load address; `.data` is stored
        // after the code and only reaches its run address through the copy
        // loop.
        let start_addr = ph.p_paddr;
        let size = ph.p_filesz as usize;
        let offset = ph.p_offset as usize;

        if size == 0 {
            continue;
        }

        debug!(
            "Found Loadable Segment: LMA={:#x} VMA={:#x}, Size={} bytes, Offset={:#x}",
            start_addr, ph.p_vaddr, size, offset
        );

        let bytes = offset
            .checked_add(size)
            .and_then(|end| buffer.get(offset..end))
            .ok_or_else(|| anyhow!("Segment out of bounds in ELF file"))?;
        image.add_segment(start_addr, bytes.to_vec());
    }

    if image.segments.is_empty() {
        warn!("No loadable segments found in ELF file");
    }

    let symbols = SymbolTable::from_elf(&elf);
    debug!("Read {} symbols", symbols.len());

    let vector_section = elf
        .section_headers
        .iter()
        .find(|sh| elf.shdr_strtab.get_at(sh.sh_name) == Some(".isr_vector"))
        .and_then(|sh| Some((u32::try_from(sh.sh_addr).ok()?, u32::try_from(sh.sh_size).ok()?)));
    match vector_section {
        Some((addr, size)) => debug!(".isr_vector: {} bytes at {:#x}", size, addr),
        None => warn!("No .isr_vector section; assuming the table sits at the flash base"),
    }

    Ok(FirmwareImage {
        image,
        symbols,
        vector_section,
    })
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    map: HashMap<String, u64>,
}

impl SymbolTable {
    fn from_elf(elf: &Elf) -> Self {
        let mut map = HashMap::new();
        for sym in elf.syms.iter() {
            let kind = sym.st_type();
            if sym.st_name == 0 || kind == STT_SECTION || kind == STT_FILE {
                continue;
            }
            if let Some(name) = elf.strtab.get_at(sym.st_name) {
                map.insert(name.to_string(), sym.st_value);
            }
        }
        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn resolve(&self, name: &str) -> Option<u32> {
        self.map.get(name).and_then(|&v| u32::try_from(v).ok())
    }

    fn require(&self, name: &str) -> Result<u32> {
        self.resolve(name)
            .ok_or_else(|| anyhow!("Symbol `{}` not found in ELF", name))
    }

    /// Boundary markers, exactly as the linker emitted them.
    pub fn boot_layout(&self) -> Result<BootLayout> {
        Ok(BootLayout {
            text_end: self.require("_etext")?,
            data_load: self.require("_sidata")?,
            data: MemoryRegion::new(self.require("_sdata")?, self.require("_edata")?),
            bss: MemoryRegion::new(self.require("_sbss")?, self.require("_ebss")?),
        })
    }

    pub fn reset_handler(&self) -> Option<u32> {
        self.resolve("Reset")
    }

    pub fn default_handler(&self) -> Option<u32> {
        self.resolve("DefaultHandler")
    }
}
