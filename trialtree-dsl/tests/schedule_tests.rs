//! End-to-end compilation tests for the documented schedules.

use trialtree_dsl::{compile, compile_with, BuildError, CompileError, ScheduleCompiler};
use trialtree_test_utils::assertions::*;
use trialtree_test_utils::fixtures::{self, compiled};
use trialtree_test_utils::{init_test_tracing, CompileOptions, EventKind, RemainderPolicy};

// ============================================================================
// DOCUMENTED SCHEDULES
// ============================================================================

#[test]
fn single_event_gets_all_trials() {
    init_test_tracing();
    let schedule = compiled(fixtures::SINGLE_EVENT);
    assert_eq!(schedule.total_duration, 100.0);
    assert_eq!(schedule.total_trials, 10);
    assert_eq!(schedule.sequences.len(), 1);

    let only = &schedule.sequences[0];
    assert_eq!(only.sequence.names(), vec!["test"]);
    assert_close(only.sequence.duration, 1.0);
    assert_close(only.sequence.proportion, 1.0);
    assert_eq!(only.n, 10);
}

#[test]
fn partial_proportion_is_kept() {
    init_test_tracing();
    let schedule = compiled(fixtures::PARTIAL_PROPORTION);
    assert_eq!(schedule.sequences.len(), 1);

    let only = &schedule.sequences[0];
    assert_close(only.sequence.proportion, 0.3);
    assert_close(only.sequence.duration, 2.5);
    assert_eq!(only.sequence.events.len(), 1);
    assert_eq!(only.sequence.events[0].max_repeat, Some(2));
    assert_eq!(only.n, 3);
    assert_eq!(schedule.remainder, 7);
}

#[test]
fn alternatives_split_evenly() {
    init_test_tracing();
    let schedule = compiled(fixtures::TWO_BRANCHES);
    let names: Vec<_> = schedule
        .sequences
        .iter()
        .map(|s| s.sequence.names())
        .collect();
    assert_eq!(names, vec![vec!["one"], vec!["two"]]);
    for scheduled in &schedule.sequences {
        assert_close(scheduled.sequence.proportion, 0.5);
        assert_close(scheduled.sequence.duration, 1.0);
        assert_eq!(scheduled.n, 5);
    }
}

#[test]
fn catch_group_splits_off_early_ending_branch() {
    init_test_tracing();
    let schedule = compiled(fixtures::CATCH_GROUP);
    assert_eq!(schedule.sequences.len(), 2);

    let detour = &schedule.sequences[0].sequence;
    assert_eq!(detour.names(), vec!["A", "B", "C"]);
    assert!(detour.ends_in_catch());
    assert_close(detour.proportion, 0.15);
    assert_close(detour.duration, 2.3);

    let main = &schedule.sequences[1].sequence;
    assert_eq!(main.names(), vec!["A", "D"]);
    assert_eq!(main.events[1].kind, EventKind::FallThrough);
    assert_close(main.proportion, 0.85);
    assert_close(main.duration, 2.5);

    assert_eq!(schedule.sequences[0].n, 1);
    assert_eq!(schedule.sequences[1].n, 8);
    assert_eq!(schedule.remainder, 1);
}

#[test]
fn sequence_then_catch_group() {
    init_test_tracing();
    let schedule = compiled(fixtures::SEQUENCE_THEN_CATCH);
    assert_eq!(schedule.sequences.len(), 2);

    let detour = &schedule.sequences[0];
    assert_eq!(detour.sequence.names(), vec!["A", "D", "B", "C"]);
    assert!(detour.sequence.ends_in_catch());
    assert_close(detour.sequence.proportion, 0.15);
    assert_close(detour.sequence.duration, 3.3);
    assert_eq!(detour.n, 1);

    let main = &schedule.sequences[1];
    assert_eq!(main.sequence.names(), vec!["A", "D", "D"]);
    assert_close(main.sequence.proportion, 0.85);
    assert_close(main.sequence.duration, 3.5);
    assert_eq!(main.n, 8);

    assert_eq!(schedule.remainder, 1);
}

#[test]
fn nested_single_group_joins_its_siblings() {
    init_test_tracing();
    let schedule = compiled(fixtures::NESTED_ALTERNATIVES);
    let names: Vec<_> = schedule
        .sequences
        .iter()
        .map(|s| s.sequence.names())
        .collect();
    assert_eq!(names, vec![vec!["one"], vec!["two"], vec!["three"]]);
    for scheduled in &schedule.sequences {
        assert_close(scheduled.sequence.proportion, 1.0 / 3.0);
        assert_eq!(scheduled.n, 3);
    }
    assert_eq!(schedule.remainder, 1);
}

#[test]
fn alternatives_rejoin_at_following_event() {
    init_test_tracing();
    let schedule = compiled(fixtures::ALTERNATIVES_THEN_EVENT);
    let names: Vec<_> = schedule
        .sequences
        .iter()
        .map(|s| s.sequence.names())
        .collect();
    assert_eq!(names, vec![vec!["one", "three"], vec!["two", "three"]]);
    for scheduled in &schedule.sequences {
        assert_close(scheduled.sequence.proportion, 0.5);
        assert_close(scheduled.sequence.duration, 2.0);
        assert_eq!(scheduled.n, 5);
    }
    assert_eq!(schedule.remainder, 0);
}

#[test]
fn documented_schedules_hold_invariants() {
    init_test_tracing();
    for source in fixtures::all_sources() {
        let schedule = compiled(source);
        assert_allocation_balanced(&schedule);
        assert_sequence_aggregates(&schedule);
        assert_catch_terminates(&schedule);
    }
}

// ============================================================================
// OUTPUT SHAPE
// ============================================================================

#[test]
fn records_list_named_events_with_durations() {
    let records = compiled(fixtures::CATCH_GROUP).records();
    assert_eq!(
        records[0].sequence,
        vec![
            ("A".to_string(), 1.5),
            ("B".to_string(), 0.5),
            ("C".to_string(), 0.3)
        ]
    );
    assert_eq!(
        records[1].sequence,
        vec![("A".to_string(), 1.5), ("D".to_string(), 1.0)]
    );
    assert_eq!(records[1].n, 8);
}

#[test]
fn schedule_serializes_to_json() {
    let schedule = compiled("100/10x A;=2");
    let json = schedule.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["total_duration"], 100.0);
    assert_eq!(value["iti"]["duration"], 2.0);
    assert_eq!(value["sequences"][0]["events"][0]["name"], "A");
    assert_eq!(value["sequences"][0]["n"], 10);
}

// ============================================================================
// POLICIES AND ERRORS
// ============================================================================

#[test]
fn largest_remainder_places_leftover_trials() {
    let options = CompileOptions::default().with_remainder_policy(RemainderPolicy::LargestRemainder);
    let schedule = compile_with(fixtures::CATCH_GROUP, &options).unwrap();
    assert_eq!(schedule.sequences[0].n, 2);
    assert_eq!(schedule.sequences[1].n, 8);
    assert_eq!(schedule.remainder, 0);
    assert_allocation_balanced(&schedule);
}

#[test]
fn options_from_toml_drive_the_compiler() {
    let options = CompileOptions::from_toml_str(
        r#"
proportion_policy = "lenient"
remainder_policy = "largest_remainder"
"#,
    )
    .unwrap();
    let compiler = ScheduleCompiler::new(options).unwrap();
    let schedule = compiler.compile("100/10x {.7*A,.6*B}").unwrap();
    assert_allocation_balanced(&schedule);
}

#[test]
fn excess_proportions_rejected_by_default() {
    assert_normalization_error(&compile("100/10x {.7*A,.6*B}"));
}

#[test]
fn malformed_source_reports_offset() {
    assert_parse_error_at(&compile("100/10x A,{B"), 12);
    assert_parse_error_at(&compile("100/10 A"), 6);
}

#[test]
fn iti_inside_group_rejected() {
    let err = compile("100/10x A,{B,;}").unwrap_err();
    assert_eq!(err, CompileError::Build(BuildError::NestedIti { offset: 13 }));
}

#[test]
fn second_iti_rejected() {
    let err = compile("100/10x A;=1B;=2").unwrap_err();
    assert_eq!(err, CompileError::DuplicateIti { count: 2 });
}
