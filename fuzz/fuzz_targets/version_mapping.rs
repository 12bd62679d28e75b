#![no_main]

use kubecis::mapping::load_version_mapping;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(table) = input.parse::<toml::Table>() {
            // Loading and mapping must never panic on arbitrary configuration
            if let Ok(rules) = load_version_mapping(&table) {
                assert!(!rules.is_empty());
                let _ = rules.map_to_specification("1.15");
            }
        }
    }
});
