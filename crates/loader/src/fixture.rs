// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Small ELF32 images for tests, so the host test suite does not depend on
//! a cross toolchain.

use f401_boot::{VectorTable, STACK_TOP};
use object::elf;
use object::write::elf::{FileHeader, ProgramHeader, SectionHeader, Sym, Writer};
use object::write::{Result, StringId};
use object::Endianness;

pub const RESET: u32 = 0x0800_0195;
pub const DEFAULT_HANDLER: u32 = 0x0800_01C1;
pub const MAIN: u32 = 0x0800_0201;
pub const TEXT_END: u32 = 0x0800_0600;
pub const DATA_START: u32 = 0x2000_0000;
pub const DATA_LEN: u32 = 100;
pub const BSS_LEN: u32 = 50;

const EF_ARM_EABI5_HARD_FLOAT: u32 = 0x0500_0400;

struct LoadSegment {
    vaddr: u32,
    paddr: u32,
    data: Vec<u8>,
    memsz: u32,
}

struct Symbol {
    name: String,
    value: u32,
    func: bool,
}

/// Little-endian ARM executable with PT_LOAD segments and a symbol table.
pub struct ElfBuilder {
    entry: u32,
    segments: Vec<LoadSegment>,
    symbols: Vec<Symbol>,
    vector_section: Option<u32>,
}

impl ElfBuilder {
    pub fn new(entry: u32) -> Self {
        Self {
            entry,
            segments: Vec::new(),
            symbols: Vec::new(),
            vector_section: None,
        }
    }

    /// Marks the first `size` bytes of the first segment as `.isr_vector`.
    pub fn vector_section(mut self, size: u32) -> Self {
        self.vector_section = Some(size);
        self
    }

    pub fn segment(mut self, vaddr: u32, paddr: u32, data: Vec<u8>, memsz: u32) -> Self {
        self.segments.push(LoadSegment {
            vaddr,
            paddr,
            data,
            memsz,
        });
        self
    }

    pub fn symbol(mut self, name: &str, value: u32, func: bool) -> Self {
        self.symbols.push(Symbol {
            name: name.to_string(),
            value,
            func,
        });
        self
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut writer = Writer::new(Endianness::Little, false, &mut out);

        writer.reserve_null_section_index();
        let isr_vector = match (self.vector_section, self.segments.first()) {
            (Some(size), Some(first)) => {
                let name = writer.add_section_name(b".isr_vector");
                writer.reserve_section_index();
                Some((name, first.vaddr, size))
            }
            _ => None,
        };

        writer.reserve_null_symbol_index();
        let names: Vec<StringId> = self
            .symbols
            .iter()
            .map(|sym| {
                let name = writer.add_string(sym.name.as_bytes());
                writer.reserve_symbol_index(None);
                name
            })
            .collect();
        writer.reserve_symtab_section_index();
        writer.reserve_strtab_section_index();
        writer.reserve_shstrtab_section_index();

        writer.reserve_file_header();
        writer.reserve_program_headers(self.segments.len() as u32);
        let offsets: Vec<usize> = self
            .segments
            .iter()
            .map(|seg| writer.reserve(seg.data.len(), 4))
            .collect();
        writer.reserve_symtab();
        writer.reserve_strtab();
        writer.reserve_shstrtab();
        writer.reserve_section_headers();

        writer.write_file_header(&FileHeader {
            os_abi: elf::ELFOSABI_NONE,
            abi_version: 0,
            e_type: elf::ET_EXEC,
            e_machine: elf::EM_ARM,
            e_entry: u64::from(self.entry),
            e_flags: EF_ARM_EABI5_HARD_FLOAT,
        })?;

        writer.write_align_program_headers();
        for (seg, &offset) in self.segments.iter().zip(&offsets) {
            writer.write_program_header(&ProgramHeader {
                p_type: elf::PT_LOAD,
                p_flags: elf::PF_R | elf::PF_W,
                p_offset: offset as u64,
                p_vaddr: u64::from(seg.vaddr),
                p_paddr: u64::from(seg.paddr),
                p_filesz: seg.data.len() as u64,
                p_memsz: u64::from(seg.memsz),
                p_align: 4,
            });
        }
        for (seg, &offset) in self.segments.iter().zip(&offsets) {
            if seg.data.is_empty() {
                continue;
            }
            writer.pad_until(offset);
            writer.write(&seg.data);
        }

        writer.write_null_symbol();
        for (sym, &name) in self.symbols.iter().zip(&names) {
            let kind = if sym.func { elf::STT_FUNC } else { elf::STT_NOTYPE };
            writer.write_symbol(&Sym {
                name: Some(name),
                section: None,
                st_info: (elf::STB_GLOBAL << 4) | kind,
                st_other: elf::STV_DEFAULT,
                st_shndx: elf::SHN_ABS,
                st_value: u64::from(sym.value),
                st_size: 0,
            });
        }
        writer.write_strtab();
        writer.write_shstrtab();

        writer.write_null_section_header();
        if let (Some((name, addr, size)), Some(&offset)) = (isr_vector, offsets.first()) {
            writer.write_section_header(&SectionHeader {
                name: Some(name),
                sh_type: elf::SHT_PROGBITS,
                sh_flags: u64::from(elf::SHF_ALLOC),
                sh_addr: u64::from(addr),
                sh_offset: offset as u64,
                sh_size: u64::from(size),
                sh_link: 0,
                sh_info: 0,
                sh_addralign: 4,
                sh_entsize: 0,
            });
        }
        writer.write_symtab_section_header(1);
        writer.write_strtab_section_header();
        writer.write_shstrtab_section_header();

        Ok(out)
    }
}

/// The table a correctly built image carries: every implemented vector on
/// [`DEFAULT_HANDLER`], reserved slots zero.
pub fn vector_table() -> Vec<u32> {
    (0..VectorTable::LEN)
        .map(|i| match i {
            0 => STACK_TOP,
            1 => RESET,
            _ if VectorTable::is_reserved(i) => 0,
            _ => DEFAULT_HANDLER,
        })
        .collect()
}

/// `.data` initial values: 1, 2, .., 100.
pub fn initializers() -> Vec<u8> {
    (1..=DATA_LEN as u8).collect()
}

/// A linked image with `table` at the start of flash, code up to
/// [`TEXT_END`], then `.data` initializers, plus the boundary symbols.
pub fn boot_elf(table: &[u32]) -> Result<Vec<u8>> {
    let mut flash: Vec<u8> = table.iter().flat_map(|w| w.to_le_bytes()).collect();
    let text_len = (TEXT_END - 0x0800_0000) as usize;
    while flash.len() < text_len {
        // Thumb NOP
        flash.extend_from_slice(&[0x00, 0xBF]);
    }

    let data_end = DATA_START + DATA_LEN;
    let bss_end = data_end + BSS_LEN;

    ElfBuilder::new(RESET)
        .vector_section(table.len() as u32 * 4)
        .segment(0x0800_0000, 0x0800_0000, flash, text_len as u32)
        .segment(DATA_START, TEXT_END, initializers(), DATA_LEN)
        .segment(data_end, data_end, Vec::new(), BSS_LEN)
        .symbol("Reset", RESET, true)
        .symbol("DefaultHandler", DEFAULT_HANDLER, true)
        .symbol("main", MAIN, true)
        .symbol("_etext", TEXT_END, false)
        .symbol("_sidata", TEXT_END, false)
        .symbol("_sdata", DATA_START, false)
        .symbol("_edata", data_end, false)
        .symbol("_sbss", data_end, false)
        .symbol("_ebss", bss_end, false)
        .build()
}
