//! Fuzz test for the schedule parser
//!
//! Feeds arbitrary UTF-8 into `parse` looking for panics, hangs and
//! error locations that point outside the input.
//!
//! Run with: cargo +nightly fuzz run parser_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use trialtree_dsl::parse;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        match parse(input) {
            Ok(main) => {
                // A match covers the whole line, minus one optional terminator
                assert!(main.span.end <= input.len());
                assert!(input.len() - main.span.end <= 2);
                assert!(!main.children.is_empty());
            }
            Err(err) => {
                assert!(err.offset <= input.len(), "Error offset past end of input");
                assert!(err.line >= 1, "Error line should be >= 1");
                assert!(err.column >= 1, "Error column should be >= 1");
                assert!(!err.expected.is_empty(), "Error should say what was expected");
            }
        }
    }
});
