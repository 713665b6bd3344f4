// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! The Cortex-M4 exception table for STM32F401.
//!
//! Layout (one 32-bit word per entry, 101 entries):
//!
//! | index  | content                                   |
//! |--------|-------------------------------------------|
//! | 0      | initial main stack pointer                |
//! | 1      | reset handler                             |
//! | 2..16  | system exceptions, reserved slots are 0   |
//! | 16..   | peripheral IRQ 0..=84, reserved slots are 0 |
//!
//! Every exception and interrupt slot starts out pointing at
//! [`DefaultHandler`]; individual slots are overridden with
//! [`VectorTable::with_exception`] and [`VectorTable::with_interrupt`] when the
//! firmware composes its table.

/// Exception or interrupt handler.
pub type Handler = unsafe extern "C" fn();

/// Entry 1 of the table.
pub type ResetHandler = unsafe extern "C" fn() -> !;

/// Trap for every slot without a dedicated handler.
#[allow(non_snake_case)]
#[cfg_attr(all(target_arch = "arm", target_os = "none"), no_mangle)]
pub unsafe extern "C" fn DefaultHandler() {
    loop {
        core::hint::spin_loop();
    }
}

/// System exceptions, numbered by their table index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Exception {
    NonMaskableInt = 2,
    HardFault = 3,
    MemoryManagement = 4,
    BusFault = 5,
    UsageFault = 6,
    SVCall = 11,
    DebugMonitor = 12,
    PendSV = 14,
    SysTick = 15,
}

impl Exception {
    pub const ALL: [Exception; 9] = [
        Exception::NonMaskableInt,
        Exception::HardFault,
        Exception::MemoryManagement,
        Exception::BusFault,
        Exception::UsageFault,
        Exception::SVCall,
        Exception::DebugMonitor,
        Exception::PendSV,
        Exception::SysTick,
    ];

    /// Index of the exception in the vector table.
    pub const fn number(self) -> usize {
        self as usize
    }

    /// `None` for 0, 1, reserved slots and anything past the system range.
    pub const fn from_number(n: usize) -> Option<Self> {
        match n {
            2 => Some(Exception::NonMaskableInt),
            3 => Some(Exception::HardFault),
            4 => Some(Exception::MemoryManagement),
            5 => Some(Exception::BusFault),
            6 => Some(Exception::UsageFault),
            11 => Some(Exception::SVCall),
            12 => Some(Exception::DebugMonitor),
            14 => Some(Exception::PendSV),
            15 => Some(Exception::SysTick),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Exception::NonMaskableInt => "NonMaskableInt",
            Exception::HardFault => "HardFault",
            Exception::MemoryManagement => "MemoryManagement",
            Exception::BusFault => "BusFault",
            Exception::UsageFault => "UsageFault",
            Exception::SVCall => "SVCall",
            Exception::DebugMonitor => "DebugMonitor",
            Exception::PendSV => "PendSV",
            Exception::SysTick => "SysTick",
        }
    }
}

macro_rules! interrupts {
    ($($name:ident = $num:literal,)+) => {
        /// STM32F401 peripheral interrupts, numbered by IRQ (table index - 16).
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(u8)]
        pub enum Interrupt {
            $($name = $num,)+
        }

        impl Interrupt {
            pub const ALL: &'static [Interrupt] = &[$(Interrupt::$name,)+];

            pub const fn from_number(n: usize) -> Option<Self> {
                match n {
                    $($num => Some(Interrupt::$name),)+
                    _ => None,
                }
            }

            pub const fn name(self) -> &'static str {
                match self {
                    $(Interrupt::$name => stringify!($name),)+
                }
            }
        }
    };
}

interrupts! {
    WWDG = 0,
    PVD = 1,
    TAMP_STAMP = 2,
    RTC_WKUP = 3,
    FLASH = 4,
    RCC = 5,
    EXTI0 = 6,
    EXTI1 = 7,
    EXTI2 = 8,
    EXTI3 = 9,
    EXTI4 = 10,
    DMA1_STREAM0 = 11,
    DMA1_STREAM1 = 12,
    DMA1_STREAM2 = 13,
    DMA1_STREAM3 = 14,
    DMA1_STREAM4 = 15,
    DMA1_STREAM5 = 16,
    DMA1_STREAM6 = 17,
    ADC = 18,
    EXTI9_5 = 23,
    TIM1_BRK_TIM9 = 24,
    TIM1_UP_TIM10 = 25,
    TIM1_TRG_COM_TIM11 = 26,
    TIM1_CC = 27,
    TIM2 = 28,
    TIM3 = 29,
    TIM4 = 30,
    I2C1_EV = 31,
    I2C1_ER = 32,
    I2C2_EV = 33,
    I2C2_ER = 34,
    SPI1 = 35,
    SPI2 = 36,
    USART1 = 37,
    USART2 = 38,
    EXTI15_10 = 40,
    RTC_ALARM = 41,
    OTG_FS_WKUP = 42,
    DMA1_STREAM7 = 47,
    SDIO = 49,
    TIM5 = 50,
    SPI3 = 51,
    DMA2_STREAM0 = 56,
    DMA2_STREAM1 = 57,
    DMA2_STREAM2 = 58,
    DMA2_STREAM3 = 59,
    DMA2_STREAM4 = 60,
    OTG_FS = 67,
    DMA2_STREAM5 = 68,
    DMA2_STREAM6 = 69,
    DMA2_STREAM7 = 70,
    USART6 = 71,
    I2C3_EV = 72,
    I2C3_ER = 73,
    FPU = 81,
    SPI4 = 84,
}

impl Interrupt {
    /// IRQ slots in the table, reserved ones included.
    pub const SLOTS: usize = 85;

    pub const fn number(self) -> usize {
        self as usize
    }

    /// Table index of the interrupt.
    pub const fn exception_number(self) -> usize {
        VectorTable::IRQ_BASE + self as usize
    }
}

/// One table word.
#[derive(Clone, Copy)]
#[repr(C)]
pub union Vector {
    handler: Handler,
    reserved: usize,
}

impl Vector {
    const RESERVED: Vector = Vector { reserved: 0 };
    const DEFAULT: Vector = Vector {
        handler: DefaultHandler,
    };
}

#[repr(C)]
pub struct VectorTable {
    initial_sp: usize,
    reset: ResetHandler,
    exceptions: [Vector; 14],
    interrupts: [Vector; Interrupt::SLOTS],
}

#[cfg(target_pointer_width = "32")]
const _: () = assert!(core::mem::size_of::<VectorTable>() == VectorTable::LEN * 4);

impl VectorTable {
    pub const LEN: usize = VectorTable::IRQ_BASE + Interrupt::SLOTS;
    pub const IRQ_BASE: usize = 16;

    /// A table with every exception and interrupt routed to [`DefaultHandler`].
    pub const fn new(initial_sp: u32, reset: ResetHandler) -> Self {
        let mut exceptions = [Vector::RESERVED; 14];
        let mut i = 0;
        while i < exceptions.len() {
            if Exception::from_number(i + 2).is_some() {
                exceptions[i] = Vector::DEFAULT;
            }
            i += 1;
        }

        let mut interrupts = [Vector::RESERVED; Interrupt::SLOTS];
        let mut i = 0;
        while i < interrupts.len() {
            if Interrupt::from_number(i).is_some() {
                interrupts[i] = Vector::DEFAULT;
            }
            i += 1;
        }

        Self {
            initial_sp: initial_sp as usize,
            reset,
            exceptions,
            interrupts,
        }
    }

    /// A table whose reset slot is this crate's reset handler.
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    pub const fn standard(initial_sp: u32) -> Self {
        Self::new(initial_sp, crate::startup::Reset)
    }

    pub const fn with_exception(mut self, exception: Exception, handler: Handler) -> Self {
        self.exceptions[exception.number() - 2] = Vector { handler };
        self
    }

    pub const fn with_interrupt(mut self, interrupt: Interrupt, handler: Handler) -> Self {
        self.interrupts[interrupt.number()] = Vector { handler };
        self
    }

    pub fn initial_sp(&self) -> usize {
        self.initial_sp
    }

    /// Whether the slot at `index` is architecturally reserved (and encoded as 0).
    pub const fn is_reserved(index: usize) -> bool {
        match index {
            0 | 1 => false,
            2..=15 => Exception::from_number(index).is_none(),
            _ if index < Self::LEN => Interrupt::from_number(index - Self::IRQ_BASE).is_none(),
            _ => false,
        }
    }

    /// The raw word at `index`, as the core reads it.
    pub fn entry(&self, index: usize) -> Option<usize> {
        let word = match index {
            0 => self.initial_sp,
            1 => self.reset as usize,
            2..=15 => Self::word(&self.exceptions[index - 2]),
            _ if index < Self::LEN => Self::word(&self.interrupts[index - Self::IRQ_BASE]),
            _ => return None,
        };
        Some(word)
    }

    /// The handler exception number `index` dispatches to; `None` for the
    /// stack pointer, the reset slot, reserved slots and out-of-range indices.
    pub fn handler(&self, index: usize) -> Option<Handler> {
        if Self::is_reserved(index) || index < 2 || index >= Self::LEN {
            return None;
        }
        let vector = if index < Self::IRQ_BASE {
            &self.exceptions[index - 2]
        } else {
            &self.interrupts[index - Self::IRQ_BASE]
        };
        // Non-reserved slots are always initialized through the `handler` field.
        Some(unsafe { vector.handler })
    }

    pub fn interrupt_handler(&self, interrupt: Interrupt) -> Handler {
        unsafe { self.interrupts[interrupt.number()].handler }
    }

    pub fn exception_handler(&self, exception: Exception) -> Handler {
        unsafe { self.exceptions[exception.number() - 2].handler }
    }

    fn word(vector: &Vector) -> usize {
        // Same size as the handler pointer; reserved slots read back as 0.
        unsafe { vector.reserved }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    static HITS: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "C" fn reset() -> ! {
        panic!("reset handler is never called on the host");
    }

    unsafe extern "C" fn on_systick() {
        HITS.fetch_add(1, Ordering::SeqCst);
    }

    unsafe extern "C" fn on_tim2() {
        HITS.fetch_add(100, Ordering::SeqCst);
    }

    static TABLE: VectorTable = VectorTable::new(crate::STACK_TOP, reset)
        .with_exception(Exception::SysTick, on_systick)
        .with_interrupt(Interrupt::TIM2, on_tim2);

    #[test]
    fn test_table_length_matches_f401_map() {
        assert_eq!(VectorTable::LEN, 101);
        assert_eq!(Interrupt::ALL.len(), 56);
        assert!(TABLE.entry(VectorTable::LEN - 1).is_some());
        assert!(TABLE.entry(VectorTable::LEN).is_none());
    }

    #[test]
    fn test_stack_pointer_and_reset_slots() {
        assert_eq!(TABLE.entry(0), Some(0x2001_8000));
        assert_eq!(TABLE.initial_sp(), 0x2001_8000);
        assert_eq!(TABLE.entry(1), Some(reset as usize));
        assert!(TABLE.handler(0).is_none());
        assert!(TABLE.handler(1).is_none());
    }

    #[test]
    fn test_reserved_slots_are_zero() {
        let reserved: Vec<usize> = (0..VectorTable::LEN)
            .filter(|&i| VectorTable::is_reserved(i))
            .collect();
        // 5 system slots and 29 IRQ gaps.
        assert_eq!(reserved.len(), 5 + 29);
        for &i in &[7, 8, 9, 10, 13] {
            assert!(reserved.contains(&i), "system slot {} should be reserved", i);
        }
        for &irq in &[19, 20, 21, 22, 39, 48, 82, 83] {
            assert!(reserved.contains(&(16 + irq)), "IRQ {} should be reserved", irq);
        }
        for i in reserved {
            assert_eq!(TABLE.entry(i), Some(0), "slot {}", i);
            assert!(TABLE.handler(i).is_none());
        }
    }

    #[test]
    fn test_unset_slots_share_default_handler() {
        let default = DefaultHandler as usize;
        let overridden = [
            Exception::SysTick.number(),
            Interrupt::TIM2.exception_number(),
        ];
        for i in 2..VectorTable::LEN {
            if VectorTable::is_reserved(i) || overridden.contains(&i) {
                continue;
            }
            assert_eq!(TABLE.entry(i), Some(default), "slot {}", i);
        }
    }

    #[test]
    fn test_overrides_land_in_their_slot() {
        assert_eq!(TABLE.entry(15), Some(on_systick as usize));
        assert_eq!(TABLE.entry(16 + 28), Some(on_tim2 as usize));
        assert_eq!(
            TABLE.exception_handler(Exception::SysTick) as usize,
            on_systick as usize
        );
        assert_eq!(
            TABLE.interrupt_handler(Interrupt::TIM3) as usize,
            DefaultHandler as usize
        );

        let before = HITS.load(Ordering::SeqCst);
        unsafe {
            TABLE.handler(15).unwrap()();
            TABLE.handler(Interrupt::TIM2.exception_number()).unwrap()();
        }
        assert_eq!(HITS.load(Ordering::SeqCst) - before, 101);
    }

    #[test]
    fn test_interrupt_numbers_follow_reference_manual() {
        assert_eq!(Interrupt::WWDG.number(), 0);
        assert_eq!(Interrupt::ADC.number(), 18);
        assert_eq!(Interrupt::EXTI9_5.number(), 23);
        assert_eq!(Interrupt::USART2.number(), 38);
        assert_eq!(Interrupt::EXTI15_10.number(), 40);
        assert_eq!(Interrupt::DMA1_STREAM7.number(), 47);
        assert_eq!(Interrupt::OTG_FS.number(), 67);
        assert_eq!(Interrupt::USART6.number(), 71);
        assert_eq!(Interrupt::FPU.number(), 81);
        assert_eq!(Interrupt::SPI4.number(), 84);
        assert_eq!(Interrupt::SPI4.exception_number(), 100);

        for &irq in Interrupt::ALL {
            assert!(irq.number() < Interrupt::SLOTS);
            assert_eq!(Interrupt::from_number(irq.number()), Some(irq));
        }
        assert_eq!(Interrupt::EXTI9_5.name(), "EXTI9_5");
    }

    #[test]
    fn test_exception_numbering() {
        for &e in Exception::ALL.iter() {
            assert_eq!(Exception::from_number(e.number()), Some(e));
        }
        assert_eq!(Exception::HardFault.number(), 3);
        assert_eq!(Exception::from_number(7), None);
        assert_eq!(Exception::from_number(16), None);
        assert_eq!(Exception::PendSV.name(), "PendSV");
    }
}
