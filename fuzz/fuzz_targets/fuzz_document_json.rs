#![no_main]

use driverlog_core::{MaxDocumentLength, parse_json_document, relaxed_json_limited};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&limit, rest)) = data.split_first() else {
        return;
    };
    let Ok(json) = std::str::from_utf8(rest) else {
        return;
    };
    if let Ok(doc) = parse_json_document(json) {
        let limited = relaxed_json_limited(&doc, MaxDocumentLength::Limited(usize::from(limit)));
        assert!(limited.len() <= usize::from(limit) + "...".len());
    }
});
