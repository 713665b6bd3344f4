use f401_boot::{init_image, BootLayout, Bus, MemoryRegion};
use f401_core::SystemBus;
use proptest::prelude::*;

const TEXT_END: u32 = 0x0800_1000;
const RAM: u32 = 0x2000_0000;

fn setup(initializers: &[u8], data_off: u32, bss_len: u32, garbage: u8) -> (SystemBus, BootLayout) {
    let mut bus = SystemBus::new();
    bus.poke(TEXT_END, initializers).unwrap();

    let data_start = RAM + data_off;
    let data_end = data_start + initializers.len() as u32;
    let layout = BootLayout {
        text_end: TEXT_END,
        data_load: TEXT_END,
        data: MemoryRegion::new(data_start, data_end),
        bss: MemoryRegion::new(data_end, data_end + bss_len),
    };

    // RAM comes up holding arbitrary values.
    let span = (layout.bss.end - RAM + 16) as usize;
    bus.poke(RAM, &vec![garbage; span]).unwrap();
    (bus, layout)
}

proptest! {
    #[test]
    fn data_matches_initializers_and_bss_is_zero(
        initializers in prop::collection::vec(any::<u8>(), 0..512),
        data_off in 0u32..64,
        bss_len in 0u32..512,
        garbage in any::<u8>(),
    ) {
        let (mut bus, layout) = setup(&initializers, data_off, bss_len, garbage);
        let stats = init_image(&mut bus, &layout).unwrap();

        prop_assert_eq!(stats.copied as usize, initializers.len());
        prop_assert_eq!(stats.zeroed, bss_len);
        prop_assert_eq!(
            bus.read_bytes(layout.data.start, initializers.len()).unwrap(),
            initializers.clone()
        );
        prop_assert!(bus
            .read_bytes(layout.bss.start, bss_len as usize)
            .unwrap()
            .iter()
            .all(|&b| b == 0));

        // Nothing outside [_sdata, _ebss) is touched.
        for addr in RAM..layout.data.start {
            prop_assert_eq!(bus.read_u8(addr).unwrap(), garbage);
        }
        for addr in layout.bss.end..layout.bss.end + 16 {
            prop_assert_eq!(bus.read_u8(addr).unwrap(), garbage);
        }
        prop_assert_eq!(bus.writes(), u64::from(layout.data.len() + layout.bss.len()));
    }

    #[test]
    fn init_is_idempotent(
        initializers in prop::collection::vec(any::<u8>(), 0..256),
        bss_len in 0u32..256,
    ) {
        let (mut bus, layout) = setup(&initializers, 0, bss_len, 0xA5);
        init_image(&mut bus, &layout).unwrap();
        let first = bus.read_bytes(RAM, (layout.bss.end - RAM) as usize).unwrap();
        init_image(&mut bus, &layout).unwrap();
        let second = bus.read_bytes(RAM, (layout.bss.end - RAM) as usize).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn inverted_regions_touch_nothing(start in 0u32..0x100, shrink in 1u32..0x100) {
        let mut bus = SystemBus::new();
        let begin = RAM + 0x200 + start;
        let layout = BootLayout {
            text_end: TEXT_END,
            data_load: TEXT_END,
            data: MemoryRegion::new(begin, begin - shrink),
            bss: MemoryRegion::new(begin, begin - shrink),
        };
        let stats = init_image(&mut bus, &layout).unwrap();
        prop_assert_eq!(stats.copied, 0);
        prop_assert_eq!(stats.zeroed, 0);
        prop_assert_eq!(bus.writes(), 0);
    }
}
