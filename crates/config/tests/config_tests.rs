// F401 Boot - Bare-metal startup core for STM32F401
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use f401_config::{Arch, ChipDescriptor};
use std::io::Write;
use std::path::PathBuf;

fn chips_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../configs/chips")
}

#[test]
fn test_bundled_f401re_matches_builtin() {
    let chip = ChipDescriptor::from_file(chips_dir().join("stm32f401re.yaml")).unwrap();
    assert_eq!(chip.arch, Arch::Arm);
    assert_eq!(
        chip.memory_map().unwrap(),
        ChipDescriptor::stm32f401().memory_map().unwrap()
    );
}

#[test]
fn test_bundled_f401cc_uses_defaults() {
    let chip = ChipDescriptor::from_file(chips_dir().join("stm32f401cc.yaml")).unwrap();
    let map = chip.memory_map().unwrap();
    assert_eq!(map.stack_top, 0x2001_0000);
    assert_eq!(map.vector_table.start, 0x0800_0000);
    assert_eq!(map.vector_len, 101);
}

#[test]
fn test_minimal_yaml_parses() {
    let yaml = r#"
name: "test-chip"
arch: "cortex-m4"
flash:
  base: 0x08000000
  size: "128KiB"
ram:
  base: 0x20000000
  size: "32KiB"
"#;
    let chip = ChipDescriptor::from_yaml(yaml).unwrap();
    assert_eq!(chip.schema_version, "1.0");
    assert_eq!(chip.stack_top, None);
    assert_eq!(chip.vector_table.base, None);
}

#[test]
fn test_unsupported_schema_rejected() {
    let yaml = r#"
schema_version: "2.0"
name: "test-chip"
arch: "arm"
flash:
  base: 0x08000000
  size: "128KiB"
ram:
  base: 0x20000000
  size: "32KiB"
"#;
    let err = ChipDescriptor::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("schema_version"));
}

#[test]
fn test_from_file_reports_path() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "name: [unterminated").unwrap();

    let err = ChipDescriptor::from_file(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Chip Descriptor"));
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(ChipDescriptor::from_file("/nonexistent/chip.yaml").is_err());
}
