#![no_main]

use libfuzzer_sys::fuzz_target;
use stickyboard::model::{format_px, parse_px};

fuzz_target!(|input: &str| {
    if let Some(value) = parse_px(input) {
        assert!(value.is_finite());
        assert_eq!(parse_px(&format_px(value)), Some(value));
    }
});
