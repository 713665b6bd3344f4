// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Static audit of a vector table as it sits in a flashed image.

use f401_boot::{Exception, Interrupt, VectorTable};
use f401_config::MemoryMap;
use serde::Serialize;
use std::collections::HashMap;

/// What a well-formed table must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectations {
    pub len: usize,
    pub stack_top: u32,
    /// Address of `Reset`, if the image has symbols.
    pub reset_handler: Option<u32>,
    /// Address of `DefaultHandler`. When unknown, the most common handler
    /// address in the table is taken as the default.
    pub default_handler: Option<u32>,
}

impl Expectations {
    pub fn from_map(map: &MemoryMap) -> Self {
        Self {
            len: map.vector_len,
            stack_top: map.stack_top,
            reset_handler: None,
            default_handler: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    StackPointer,
    Reset,
    Default,
    Override,
    Reserved,
    /// Past the last slot the core can dispatch; never fetched.
    Extra,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotReport {
    pub index: usize,
    pub name: String,
    pub value: u32,
    pub route: Route,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Finding {
    #[error("table holds {found} entries, expected {expected}")]
    Length { expected: usize, found: usize },
    #[error("entry 0 (initial SP) is {found:#010x}, expected {expected:#010x}")]
    StackPointer { expected: u32, found: u32 },
    #[error("entry 1 (reset) is {found:#010x}, expected {expected:#010x}")]
    ResetVector { expected: u32, found: u32 },
    #[error("reserved slot {index} holds {value:#010x}, expected 0")]
    ReservedSlotUsed { index: usize, value: u32 },
    #[error("slot {index} ({name}) is 0; taking that exception would fault")]
    EmptyHandler { index: usize, name: String },
    #[error("slot {index} ({name}) = {value:#010x} lacks the Thumb bit")]
    NotThumb { index: usize, name: String, value: u32 },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditReport {
    pub slots: Vec<SlotReport>,
    pub findings: Vec<Finding>,
    pub default_handler: Option<u32>,
}

impl AuditReport {
    pub fn passed(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn overrides(&self) -> impl Iterator<Item = &SlotReport> {
        self.slots.iter().filter(|s| s.route == Route::Override)
    }

    pub fn count(&self, route: Route) -> usize {
        self.slots.iter().filter(|s| s.route == route).count()
    }
}

/// Human name of table slot `index`.
pub fn slot_name(index: usize) -> String {
    match index {
        _ if index >= VectorTable::LEN => format!("Extra({})", index),
        0 => "InitialSP".to_string(),
        1 => "Reset".to_string(),
        2..=15 => Exception::from_number(index)
            .map(|e| e.name().to_string())
            .unwrap_or_else(|| "Reserved".to_string()),
        _ => Interrupt::from_number(index - VectorTable::IRQ_BASE)
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| format!("Reserved(IRQ{})", index - VectorTable::IRQ_BASE)),
    }
}

fn same_function(a: u32, b: u32) -> bool {
    a & !1 == b & !1
}

pub fn audit_vector_table(words: &[u32], expect: &Expectations) -> AuditReport {
    let mut report = AuditReport::default();

    if words.len() != expect.len {
        report.findings.push(Finding::Length {
            expected: expect.len,
            found: words.len(),
        });
    }

    let in_table = &words[..words.len().min(expect.len)];
    let default_handler = expect
        .default_handler
        .or_else(|| most_common_handler(in_table));
    report.default_handler = default_handler;

    for (index, &value) in words.iter().enumerate() {
        let name = slot_name(index);
        let route = match index {
            0 => {
                if value != expect.stack_top {
                    report.findings.push(Finding::StackPointer {
                        expected: expect.stack_top,
                        found: value,
                    });
                }
                Route::StackPointer
            }
            1 => {
                if let Some(expected) = expect.reset_handler {
                    if !same_function(value, expected) {
                        report
                            .findings
                            .push(Finding::ResetVector { expected, found: value });
                    }
                }
                check_handler(&mut report.findings, index, &name, value);
                Route::Reset
            }
            _ if index >= expect.len => Route::Extra,
            _ if VectorTable::is_reserved(index) => {
                if value != 0 {
                    report
                        .findings
                        .push(Finding::ReservedSlotUsed { index, value });
                }
                Route::Reserved
            }
            _ => {
                check_handler(&mut report.findings, index, &name, value);
                match default_handler {
                    Some(d) if same_function(value, d) => Route::Default,
                    _ => Route::Override,
                }
            }
        };
        report.slots.push(SlotReport {
            index,
            name,
            value,
            route,
        });
    }

    report
}

fn check_handler(findings: &mut Vec<Finding>, index: usize, name: &str, value: u32) {
    if value == 0 {
        findings.push(Finding::EmptyHandler {
            index,
            name: name.to_string(),
        });
    } else if value & 1 == 0 {
        findings.push(Finding::NotThumb {
            index,
            name: name.to_string(),
            value,
        });
    }
}

fn most_common_handler(words: &[u32]) -> Option<u32> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for (index, &value) in words.iter().enumerate().skip(2) {
        if value != 0 && !VectorTable::is_reserved(index) {
            *counts.entry(value).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter(|&(_, n)| n > 1)
        // Highest count wins; the lower address breaks ties deterministically.
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(value, _)| value)
}
