//! Fuzz test for the full compile pipeline
//!
//! Anything that parses is pushed through construction, normalization and
//! allocation. Successful schedules must keep their trial count balanced.
//!
//! Run with: cargo +nightly fuzz run compile_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use trialtree_core::CompileOptions;
use trialtree_dsl::{compile_with, round_trip};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(schedule) = compile_with(input, &CompileOptions::lenient()) {
            assert_eq!(
                schedule.allocated() + schedule.remainder,
                schedule.total_trials,
                "Allocation does not add up"
            );
            for scheduled in &schedule.sequences {
                let events = &scheduled.sequence.events;
                if let Some(pos) = events.iter().position(|e| e.is_catch_end()) {
                    assert_eq!(pos + 1, events.len(), "Sequence continues past catch-end");
                }
            }
        }

        // Canonical text must be a fixed point of printing
        if let Ok(printed) = round_trip(input) {
            let again = round_trip(&printed).expect("canonical text must parse");
            assert_eq!(printed, again);
        }
    }
});
