#![no_main]

use libfuzzer_sys::fuzz_target;
use stickyboard::sync::parse_script;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let _ = parse_script(input);
    }
});
