#![no_main]

use driverlog_core::{Component, Level};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(name) = std::str::from_utf8(data) {
        if let Some(level) = Level::from_name(name) {
            assert_eq!(Level::from_name(level.name()), Some(level));
        }
        if let Some(component) = Component::from_name(name) {
            assert!(component.name().is_some());
        }
        let _ = Level::suggest(name);
        let _ = name.parse::<Component>();
    }
    if let Some(&byte) = data.first() {
        assert_eq!(Level::from_repr(byte).is_some(), byte <= 8);
    }
});
