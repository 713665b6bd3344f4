use f401_boot::{Exception, Interrupt, VectorTable};
use f401_config::MemoryMap;
use f401_core::audit::Route;
use f401_core::{audit_vector_table, validate_layout, Expectations, Finding, Machine};
use f401_loader::{fixture, load_elf_bytes};

fn flashed(table: &[u32]) -> (Machine, f401_loader::FirmwareImage) {
    let fw = load_elf_bytes(&fixture::boot_elf(table).unwrap()).unwrap();
    let mut machine = Machine::from_map(&MemoryMap::STM32F401RE);
    machine.bus.load_image(&fw.image).unwrap();
    (machine, fw)
}

fn expectations(fw: &f401_loader::FirmwareImage) -> Expectations {
    Expectations {
        reset_handler: fw.symbols.reset_handler(),
        default_handler: fw.symbols.default_handler(),
        ..Expectations::from_map(&MemoryMap::STM32F401RE)
    }
}

#[test]
fn test_linked_image_boots_into_main() {
    let (mut machine, fw) = flashed(&fixture::vector_table());
    let layout = fw.symbols.boot_layout().unwrap();
    validate_layout(&layout, &MemoryMap::STM32F401RE).unwrap();

    let mut seen = None;
    let report = machine
        .run_startup(&layout, |bus| {
            seen = Some(bus.read_bytes(fixture::DATA_START, 150).unwrap());
        })
        .unwrap();

    assert_eq!(report.initial_sp, 0x2001_8000);
    assert_eq!(report.reset_vector, fixture::RESET & !1);
    assert_eq!(report.copied, 100);
    assert_eq!(report.zeroed, 50);

    let ram = seen.unwrap();
    assert_eq!(&ram[..100], &fixture::initializers()[..]);
    assert!(ram[100..].iter().all(|&b| b == 0));
}

#[test]
fn test_linked_image_table_audits_clean() {
    let (machine, fw) = flashed(&fixture::vector_table());
    let words = machine.vector_table(VectorTable::LEN).unwrap();
    let report = audit_vector_table(&words, &expectations(&fw));
    assert!(report.passed(), "{:?}", report.findings);
    assert_eq!(report.count(Route::Override), 0);
    assert_eq!(report.count(Route::Reserved), 34);
}

#[test]
fn test_every_unhandled_source_reaches_default_handler() {
    let (mut machine, _) = flashed(&fixture::vector_table());
    machine.reset().unwrap();
    for exception in Exception::ALL {
        assert_eq!(
            machine.raise(exception.number() as u32).unwrap(),
            fixture::DEFAULT_HANDLER & !1,
            "{}",
            exception.name()
        );
    }
    for &irq in Interrupt::ALL {
        assert_eq!(
            machine.raise_irq(irq).unwrap(),
            fixture::DEFAULT_HANDLER & !1,
            "{}",
            irq.name()
        );
    }
}

#[test]
fn test_override_is_reported_and_dispatched() {
    const USART2_HANDLER: u32 = 0x0800_0341;
    let mut table = fixture::vector_table();
    table[Interrupt::USART2.exception_number()] = USART2_HANDLER;

    let (mut machine, fw) = flashed(&table);
    let words = machine.vector_table(VectorTable::LEN).unwrap();
    let report = audit_vector_table(&words, &expectations(&fw));
    assert!(report.passed());
    let overrides: Vec<_> = report.overrides().map(|s| s.name.as_str()).collect();
    assert_eq!(overrides, vec!["USART2"]);

    assert_eq!(machine.raise_irq(Interrupt::USART2).unwrap(), USART2_HANDLER & !1);
    assert_eq!(
        machine.raise_irq(Interrupt::USART1).unwrap(),
        fixture::DEFAULT_HANDLER & !1
    );
}

#[test]
fn test_packed_handler_list_shifts_every_irq_after_the_first_gap() {
    // Handlers listed back to back in an 84-word array: position 16 + k
    // holds the k-th implemented interrupt instead of IRQ k, and the tail
    // is zero-filled.
    let mut packed: Vec<u32> = fixture::vector_table()[..VectorTable::IRQ_BASE].to_vec();
    packed.extend(Interrupt::ALL.iter().map(|_| fixture::DEFAULT_HANDLER));
    packed.resize(84, 0);

    let (_, fw) = flashed(&packed);
    let report = audit_vector_table(&packed, &expectations(&fw));
    assert!(report.findings.contains(&Finding::Length {
        expected: 101,
        found: 84
    }));
    assert!(report
        .findings
        .iter()
        .any(|f| matches!(f, Finding::ReservedSlotUsed { index: 35, .. })));
}
