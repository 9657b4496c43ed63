//! trialtree Test Utilities
//!
//! Shared test infrastructure for the trialtree workspace:
//! - Proptest generators for events and schedule ASTs
//! - Fixture sources for the documented schedules
//! - Assertions for compiled schedule invariants
//! - Tracing setup for tests

// Re-export core types for convenience
pub use trialtree_core::{
    CompileOptions, DurationKind, Event, EventKind, EventTree, Iti, NodeId, ProportionPolicy,
    RemainderPolicy, Schedule, ScheduledSequence, Sequence,
};
pub use trialtree_dsl::{CompileError, CompileResult, Group, Item, ParseError, ScheduleAst};

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber writing through the test harness.
///
/// Honors `RUST_LOG` and falls back to `warn`. Safe to call from every test.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for schedule sources and their parts.

    use super::*;
    use proptest::prelude::*;

    /// Event name. Always starts with a letter so it never reads as a
    /// repeat count or proportion prefix.
    pub fn arb_name() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9_:-]{0,7}"
    }

    /// Proportion in hundredths, strictly between 0 and 1.
    pub fn arb_proportion() -> impl Strategy<Value = f64> {
        (1u32..100).prop_map(|p| p as f64 / 100.0)
    }

    /// Duration in hundredths of a second.
    pub fn arb_duration() -> impl Strategy<Value = f64> {
        (0u32..=5000).prop_map(|d| d as f64 / 100.0)
    }

    pub fn arb_duration_kind() -> impl Strategy<Value = DurationKind> {
        prop_oneof![Just(DurationKind::Fixed), Just(DurationKind::Exponential)]
    }

    /// A named event; `with_proportion` controls whether an explicit
    /// proportion may appear.
    pub fn arb_event(with_proportion: bool) -> impl Strategy<Value = Event> {
        let proportion = if with_proportion {
            prop::option::of(arb_proportion()).boxed()
        } else {
            Just(None).boxed()
        };
        (
            arb_name(),
            prop::option::of(1u32..5),
            proportion,
            0u32..=5000,
            prop::option::of(0u32..500),
            arb_duration_kind(),
            prop::option::of(1u32..5),
        )
            .prop_map(
                |(name, repeat_count, proportion, hundredths, spread, kind, max_repeat)| {
                    let mut event =
                        Event::named(name).with_duration(hundredths as f64 / 100.0);
                    event.repeat_count = repeat_count;
                    event.proportion = proportion;
                    event.duration_range = spread.map(|s| (hundredths + s) as f64 / 100.0);
                    event.duration_kind = kind;
                    event.max_repeat = max_repeat;
                    event
                },
            )
    }

    pub fn arb_iti() -> impl Strategy<Value = Iti> {
        (prop::option::of(arb_duration()), arb_duration_kind()).prop_map(|(duration, kind)| {
            Iti {
                duration,
                duration_range: None,
                duration_kind: if duration.is_some() {
                    kind
                } else {
                    DurationKind::Fixed
                },
            }
        })
    }

    /// Events, catch-ends and nested branch groups of two or more members.
    pub fn arb_item(with_proportion: bool) -> impl Strategy<Value = Item> {
        let leaf = prop_oneof![
            5 => arb_event(with_proportion).prop_map(Item::Event),
            1 => Just(Item::Event(Event::catch_end())),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            (prop::collection::vec(inner, 2..4), prop::option::of(1u32..5)).prop_map(
                |(members, max_repeat)| Item::Group(Group { members, max_repeat }),
            )
        })
    }

    /// A schedule AST as the builder would produce it.
    ///
    /// At most one ITI is generated and it always closes the line, since an
    /// ITI duration directly followed by a numeric event prefix would not
    /// read back the same.
    pub fn arb_schedule_ast(with_proportion: bool) -> impl Strategy<Value = ScheduleAst> {
        (
            (1u32..100_000).prop_map(|d| d as f64 / 10.0),
            1u64..1000,
            prop::collection::vec(arb_item(with_proportion), 1..5),
            prop::option::of(arb_iti()),
        )
            .prop_map(|(total_duration, total_trials, mut items, iti)| {
                items.extend(iti.map(Item::Iti));
                ScheduleAst {
                    total_duration,
                    total_trials,
                    items,
                }
            })
    }

    /// Canonical DSL text for a generated AST.
    pub fn arb_schedule_source(with_proportion: bool) -> impl Strategy<Value = String> {
        arb_schedule_ast(with_proportion).prop_map(|ast| trialtree_dsl::pretty_print(&ast))
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Schedule sources with known compiled results.

    use super::*;

    /// One event, default duration, full mass.
    pub const SINGLE_EVENT: &str = "100/10x test";

    /// Explicit proportion below 1 with no sibling to take the rest.
    pub const PARTIAL_PROPORTION: &str = "100/10x .3*test=2.5<2>";

    /// Two equally likely alternatives.
    pub const TWO_BRANCHES: &str = "100/10x {one,two}";

    /// A 15% detour that ends early; the rest continues to `D`.
    pub const CATCH_GROUP: &str = "100/10x A=1.5,{.15*B=.5,C=.3,$},D";

    /// A two-step run, then the 15% detour, then `D` again.
    pub const SEQUENCE_THEN_CATCH: &str = "100/10x A=1.5,D,{.15*B=.5,C=.3,$},D";

    /// A nested group of one flattens into its parent: three alternatives.
    pub const NESTED_ALTERNATIVES: &str = "100/10x {one,two,{three}}";

    /// Both alternatives continue into the same closing event.
    pub const ALTERNATIVES_THEN_EVENT: &str = "100/10x {one,two},three";

    /// Every documented fixture.
    pub fn all_sources() -> Vec<&'static str> {
        vec![
            SINGLE_EVENT,
            PARTIAL_PROPORTION,
            TWO_BRANCHES,
            CATCH_GROUP,
            SEQUENCE_THEN_CATCH,
            NESTED_ALTERNATIVES,
            ALTERNATIVES_THEN_EVENT,
        ]
    }

    /// Compile a fixture with default options, panicking on failure.
    #[track_caller]
    pub fn compiled(source: &str) -> Schedule {
        match trialtree_dsl::compile(source) {
            Ok(schedule) => schedule,
            Err(e) => panic!("fixture {:?} failed to compile: {}", source, e),
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for compiled schedule invariants.

    use super::*;

    /// Tolerance used when comparing aggregated floats.
    pub const EPSILON: f64 = 1e-9;

    /// Assert two floats agree within [`EPSILON`].
    #[track_caller]
    pub fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "Expected {}, got {}",
            expected,
            actual
        );
    }

    /// Assert that allocated trials plus the remainder give the total.
    #[track_caller]
    pub fn assert_allocation_balanced(schedule: &Schedule) {
        assert_eq!(
            schedule.allocated() + schedule.remainder,
            schedule.total_trials,
            "Allocation does not add up: {} allocated, {} remainder, {} total",
            schedule.allocated(),
            schedule.remainder,
            schedule.total_trials
        );
    }

    /// Assert that every sequence's totals match its events.
    #[track_caller]
    pub fn assert_sequence_aggregates(schedule: &Schedule) {
        for scheduled in &schedule.sequences {
            let sequence = &scheduled.sequence;
            let product: f64 = sequence.events.iter().map(Event::proportion_or_one).product();
            let sum: f64 = sequence.events.iter().map(|e| e.duration).sum();
            assert_close(sequence.proportion, product);
            assert_close(sequence.duration, sum);
        }
    }

    /// Assert that no sequence continues past a catch-end.
    #[track_caller]
    pub fn assert_catch_terminates(schedule: &Schedule) {
        for scheduled in &schedule.sequences {
            let events = &scheduled.sequence.events;
            if let Some(pos) = events.iter().position(Event::is_catch_end) {
                assert_eq!(
                    pos + 1,
                    events.len(),
                    "Sequence continues after catch-end: {:?}",
                    scheduled.sequence.names()
                );
            }
        }
    }

    /// Assert that every set of siblings in `tree` sums to 1.
    #[track_caller]
    pub fn assert_children_sum_to_one(tree: &EventTree) {
        for id in tree.depth_first() {
            let children = tree.children(id);
            if children.is_empty() {
                continue;
            }
            let sum: f64 = children
                .iter()
                .filter_map(|c| tree.event(*c))
                .map(Event::proportion_or_one)
                .sum();
            assert!(
                (sum - 1.0).abs() < EPSILON,
                "Children of {} sum to {}",
                id,
                sum
            );
        }
    }

    /// Assert that compilation failed with a parse error at `offset`.
    #[track_caller]
    pub fn assert_parse_error_at<T: std::fmt::Debug>(result: &CompileResult<T>, offset: usize) {
        match result {
            Err(CompileError::Parse(err)) => {
                assert_eq!(err.offset, offset, "Parse error at wrong offset: {}", err)
            }
            other => panic!("Expected Parse error, got: {:?}", other),
        }
    }

    /// Assert that compilation failed on sibling proportions above 1.
    #[track_caller]
    pub fn assert_normalization_error<T: std::fmt::Debug>(result: &CompileResult<T>) {
        match result {
            Err(CompileError::NormalizationInconsistency { .. }) => {}
            other => panic!("Expected NormalizationInconsistency, got: {:?}", other),
        }
    }
}
