#![no_main]

use std::path::Path;

use driverlog::config::LogSettings;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml) = std::str::from_utf8(data) {
        if let Ok(settings) = LogSettings::from_yaml_str(yaml, Path::new("fuzz.yaml")) {
            let _ = settings.level_plan();
        }
    }
});
