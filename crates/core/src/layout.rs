// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Host-side checks of the boundary markers the reset handler trusts blindly.

use f401_boot::BootLayout;
use f401_config::MemoryMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Region {
    Data,
    Bss,
    DataImage,
    VectorTable,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Region::Data => ".data",
            Region::Bss => ".bss",
            Region::DataImage => ".data initializers",
            Region::VectorTable => "vector table",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum LayoutError {
    #[error("{region} ends at {end:#x}, before its start {start:#x}")]
    Inverted { region: Region, start: u32, end: u32 },
    #[error("{region} {start:#x}..{end:#x} is not inside ram")]
    OutsideRam { region: Region, start: u32, end: u32 },
    #[error(".data initializers {start:#x}..{end:#x} are not inside flash")]
    ImageOutsideFlash { start: u32, end: u32 },
    #[error(".data initializers start at {start:#x}, inside code ending at {text_end:#x}")]
    ImageOverlapsText { start: u32, text_end: u32 },
    #[error("{a} and {b} overlap")]
    Overlap { a: Region, b: Region },
}

/// Every problem with `layout` on the memory map, in a stable order.
pub fn check_layout(layout: &BootLayout, map: &MemoryMap) -> Vec<LayoutError> {
    let mut problems = Vec::new();

    for (region, r) in [(Region::Data, layout.data), (Region::Bss, layout.bss)] {
        if r.is_inverted() {
            problems.push(LayoutError::Inverted {
                region,
                start: r.start,
                end: r.end,
            });
        } else if !map.ram.encloses(&r) {
            problems.push(LayoutError::OutsideRam {
                region,
                start: r.start,
                end: r.end,
            });
        }
    }

    let image = layout.data_image();
    if !image.is_empty() {
        if !map.flash.encloses(&image) || image.end < image.start {
            problems.push(LayoutError::ImageOutsideFlash {
                start: image.start,
                end: image.end,
            });
        }
        if image.start < layout.text_end {
            problems.push(LayoutError::ImageOverlapsText {
                start: image.start,
                text_end: layout.text_end,
            });
        }
    }

    let regions = [
        (Region::Data, layout.data),
        (Region::Bss, layout.bss),
        (Region::DataImage, image),
        (Region::VectorTable, map.vector_table),
    ];
    for (i, (a, ra)) in regions.iter().enumerate() {
        for (b, rb) in &regions[i + 1..] {
            if ra.overlaps(rb) {
                problems.push(LayoutError::Overlap { a: *a, b: *b });
            }
        }
    }

    problems
}

pub fn validate_layout(layout: &BootLayout, map: &MemoryMap) -> Result<(), LayoutError> {
    match check_layout(layout, map).into_iter().next() {
        Some(problem) => Err(problem),
        None => Ok(()),
    }
}

/// `.data` + `.bss` footprint in RAM.
pub fn ram_usage(layout: &BootLayout) -> u32 {
    layout.data.len() + layout.bss.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use f401_boot::MemoryRegion;
    use f401_config::ChipDescriptor;

    fn map() -> MemoryMap {
        ChipDescriptor::stm32f401().memory_map().unwrap()
    }

    fn good() -> BootLayout {
        BootLayout {
            text_end: 0x0800_0800,
            data_load: 0x0800_0800,
            data: MemoryRegion::new(0x2000_0000, 0x2000_0064),
            bss: MemoryRegion::new(0x2000_0064, 0x2000_0096),
        }
    }

    #[test]
    fn test_linker_style_layout_is_valid() {
        assert!(check_layout(&good(), &map()).is_empty());
        assert_eq!(validate_layout(&good(), &map()), Ok(()));
        assert_eq!(ram_usage(&good()), 150);
    }

    #[test]
    fn test_empty_regions_are_valid() {
        let layout = BootLayout {
            text_end: 0x0800_0400,
            data_load: 0x0800_0400,
            data: MemoryRegion::new(0x2000_0000, 0x2000_0000),
            bss: MemoryRegion::new(0x2000_0000, 0x2000_0000),
        };
        assert_eq!(validate_layout(&layout, &map()), Ok(()));
    }

    #[test]
    fn test_inverted_bss_reported() {
        let mut layout = good();
        layout.bss = MemoryRegion::new(0x2000_0100, 0x2000_0064);
        assert_eq!(
            validate_layout(&layout, &map()),
            Err(LayoutError::Inverted {
                region: Region::Bss,
                start: 0x2000_0100,
                end: 0x2000_0064
            })
        );
    }

    #[test]
    fn test_overlapping_data_and_bss_reported() {
        let mut layout = good();
        layout.bss = MemoryRegion::new(0x2000_0060, 0x2000_0096);
        assert_eq!(
            check_layout(&layout, &map()),
            vec![LayoutError::Overlap {
                a: Region::Data,
                b: Region::Bss
            }]
        );
    }

    #[test]
    fn test_initializers_over_vector_table_reported() {
        let mut layout = good();
        layout.text_end = 0x0800_0000;
        layout.data_load = 0x0800_0100;
        let problems = check_layout(&layout, &map());
        assert!(problems.contains(&LayoutError::Overlap {
            a: Region::DataImage,
            b: Region::VectorTable
        }));
    }

    #[test]
    fn test_bss_past_end_of_ram_reported() {
        let mut layout = good();
        layout.bss = MemoryRegion::new(0x2001_7F00, 0x2001_8100);
        let err = validate_layout(&layout, &map()).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::OutsideRam {
                region: Region::Bss,
                ..
            }
        ));
        assert!(err.to_string().contains(".bss"));
    }

    #[test]
    fn test_initializers_inside_text_reported() {
        let mut layout = good();
        layout.text_end = 0x0800_0900;
        assert!(check_layout(&layout, &map()).contains(&LayoutError::ImageOverlapsText {
            start: 0x0800_0800,
            text_end: 0x0800_0900
        }));
    }
}
