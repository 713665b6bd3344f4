// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use clap::{Parser, Subcommand};
use f401_config::{ChipDescriptor, MemoryMap};
use f401_core::audit::{slot_name, AuditReport, Route};
use f401_core::layout::ram_usage;
use f401_core::{
    audit_vector_table, check_layout, BootReport, Expectations, LayoutError, Machine,
};
use f401_loader::FirmwareImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{error, info, warn};

const EXIT_PASS: u8 = 0;
const EXIT_FINDINGS: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const RESULT_SCHEMA_VERSION: &str = "1.0";

fn parse_u32(s: &str) -> Result<u32, String> {
    let trimmed = s.trim();
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex number '{}': {}", s, e))
    } else {
        u32::from_str(trimmed).map_err(|e| format!("Invalid number '{}': {}", s, e))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "STM32F401 boot image checker", long_about = None)]
struct Cli {
    /// Log at DEBUG instead of INFO
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the linker layout and audit the vector table of an image.
    Check(CheckArgs),

    /// Simulate reset: fetch SP/PC, initialize RAM, reach the entry point.
    Boot(BootArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Path to the firmware ELF file
    #[arg(short, long)]
    firmware: PathBuf,

    /// Chip descriptor (YAML); defaults to the built-in STM32F401RE
    #[arg(short, long)]
    chip: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct BootArgs {
    /// Path to the firmware ELF file
    #[arg(short, long)]
    firmware: PathBuf,

    /// Chip descriptor (YAML); defaults to the built-in STM32F401RE
    #[arg(short, long)]
    chip: Option<PathBuf>,

    /// After boot, report the handler this IRQ number dispatches to
    #[arg(long, value_parser = parse_u32)]
    irq: Option<u32>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    result_schema_version: &'static str,
    firmware: String,
    chip: String,
    passed: bool,
    ram_usage: u32,
    layout: &'a [LayoutError],
    vector_table: &'a AuditReport,
}

#[derive(Serialize)]
struct BootOutput {
    result_schema_version: &'static str,
    firmware: String,
    boot: BootReport,
    entry_reached: bool,
    irq: Option<IrqDispatch>,
}

#[derive(Serialize)]
struct IrqDispatch {
    irq: u32,
    name: String,
    handler: u32,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Check(args) => run_check(args),
        Commands::Boot(args) => run_boot(args),
    }
}

/// Chip map and firmware, or the exit code for a bad input.
fn load_inputs(
    chip: Option<&Path>,
    firmware: &Path,
) -> Result<(String, MemoryMap, FirmwareImage), ExitCode> {
    let descriptor = match chip {
        Some(path) => ChipDescriptor::from_file(path),
        None => Ok(ChipDescriptor::stm32f401()),
    };
    let (name, map) = match descriptor.and_then(|c| Ok((c.name.clone(), c.memory_map()?))) {
        Ok(resolved) => resolved,
        Err(e) => {
            error!("{:#}", e);
            return Err(ExitCode::from(EXIT_CONFIG_ERROR));
        }
    };

    info!("Loading firmware: {:?}", firmware);
    let fw = match f401_loader::load_elf(firmware) {
        Ok(fw) => fw,
        Err(e) => {
            error!("{:#}", e);
            return Err(ExitCode::from(EXIT_CONFIG_ERROR));
        }
    };
    if fw.image.arch != f401_core::Arch::Arm {
        error!("{:?} is not an ARM image", firmware);
        return Err(ExitCode::from(EXIT_CONFIG_ERROR));
    }

    Ok((name, map, fw))
}

fn run_check(args: CheckArgs) -> ExitCode {
    let (chip, map, fw) = match load_inputs(args.chip.as_deref(), &args.firmware) {
        Ok(inputs) => inputs,
        Err(code) => return code,
    };

    let (layout_problems, usage) = match fw.symbols.boot_layout() {
        Ok(layout) => (check_layout(&layout, &map), ram_usage(&layout)),
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let mut machine = Machine::from_map(&map);
    if let Err(e) = machine.bus.load_image(&fw.image) {
        error!("Failed to program image: {}", e);
        return ExitCode::from(EXIT_RUNTIME_ERROR);
    }

    let (table_base, table_len) = match fw.vector_section {
        Some((addr, size)) => (addr, (size / 4) as usize),
        None => (map.vector_table.start, map.vector_len),
    };
    if table_base != map.vector_table.start {
        warn!(
            ".isr_vector is at {:#010x}, the chip boots from {:#010x}",
            table_base, map.vector_table.start
        );
    }
    machine.vtor = table_base;
    let words = match machine.vector_table(table_len) {
        Ok(words) => words,
        Err(e) => {
            error!("Failed to read vector table: {}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    let expectations = Expectations {
        reset_handler: fw.symbols.reset_handler(),
        default_handler: fw.symbols.default_handler(),
        ..Expectations::from_map(&map)
    };
    let audit = audit_vector_table(&words, &expectations);
    let passed = layout_problems.is_empty() && audit.passed();

    if args.json {
        let report = CheckReport {
            result_schema_version: RESULT_SCHEMA_VERSION,
            firmware: args.firmware.display().to_string(),
            chip,
            passed,
            ram_usage: usage,
            layout: &layout_problems,
            vector_table: &audit,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        }
    } else {
        print_check(&chip, usage, &layout_problems, &audit);
    }

    if passed {
        ExitCode::from(EXIT_PASS)
    } else {
        ExitCode::from(EXIT_FINDINGS)
    }
}

fn print_check(chip: &str, usage: u32, layout: &[LayoutError], audit: &AuditReport) {
    println!("Chip: {}", chip);
    println!("RAM used by .data + .bss: {} bytes", usage);
    println!(
        "Vector table: {} entries, {} default, {} overridden, {} reserved",
        audit.slots.len(),
        audit.count(Route::Default),
        audit.count(Route::Override),
        audit.count(Route::Reserved)
    );
    for slot in audit.overrides() {
        println!("  override {:>3} {:<20} {:#010x}", slot.index, slot.name, slot.value);
    }
    for problem in layout {
        println!("FAIL layout: {}", problem);
    }
    for finding in &audit.findings {
        println!("FAIL vector table: {}", finding);
    }
    if layout.is_empty() && audit.passed() {
        println!("PASS");
    }
}

fn run_boot(args: BootArgs) -> ExitCode {
    let (_, map, fw) = match load_inputs(args.chip.as_deref(), &args.firmware) {
        Ok(inputs) => inputs,
        Err(code) => return code,
    };
    let layout = match fw.symbols.boot_layout() {
        Ok(layout) => layout,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let mut machine = Machine::from_map(&map);
    if let Err(e) = machine.bus.load_image(&fw.image) {
        error!("Failed to program image: {}", e);
        return ExitCode::from(EXIT_RUNTIME_ERROR);
    }

    let mut entry_reached = false;
    let boot = match machine.run_startup(&layout, |_| entry_reached = true) {
        Ok(report) => report,
        Err(e) => {
            error!("Startup faulted: {}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    };

    let irq = match args.irq {
        Some(n) => {
            let index = (f401_boot::VectorTable::IRQ_BASE as u32).saturating_add(n);
            match machine.raise(index) {
                Ok(handler) => Some(IrqDispatch {
                    irq: n,
                    name: slot_name(index as usize),
                    handler,
                }),
                Err(e) => {
                    error!("IRQ {}: {}", n, e);
                    return ExitCode::from(EXIT_RUNTIME_ERROR);
                }
            }
        }
        None => None,
    };

    if args.json {
        let output = BootOutput {
            result_schema_version: RESULT_SCHEMA_VERSION,
            firmware: args.firmware.display().to_string(),
            boot,
            entry_reached,
            irq,
        };
        match serde_json::to_string_pretty(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        }
    } else {
        println!("Initial SP:   {:#010x}", boot.initial_sp);
        println!("Reset vector: {:#010x}", boot.reset_vector);
        println!(".data copied: {} bytes", boot.copied);
        println!(".bss zeroed:  {} bytes", boot.zeroed);
        println!("Entry reached: {}", entry_reached);
        if let Some(dispatch) = &irq {
            println!(
                "IRQ {} ({}) -> {:#010x}",
                dispatch.irq, dispatch.name, dispatch.handler
            );
        }
    }

    ExitCode::from(EXIT_PASS)
}
