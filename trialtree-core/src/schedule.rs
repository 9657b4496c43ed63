//! Compiled schedule types

use crate::{DurationKind, Event, EventKind};
use serde::{Deserialize, Serialize};

/// Inter-trial interval marker (`;=1.5`).
///
/// The compiler only carries it; the trial emitter decides how it paces
/// consecutive sequences.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Iti {
    pub duration: Option<f64>,
    pub duration_range: Option<f64>,
    pub duration_kind: DurationKind,
}

/// Root-to-leaf run of events with its aggregated weight and length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    /// Events in order, root excluded
    pub events: Vec<Event>,
    /// Product of the proportions along the path
    pub proportion: f64,
    /// Sum of the durations along the path
    pub duration: f64,
}

impl Sequence {
    /// Names of the named events, markers skipped.
    pub fn names(&self) -> Vec<&str> {
        self.events.iter().filter_map(|e| e.name.as_deref()).collect()
    }

    /// Whether the sequence was cut short by a `$`.
    pub fn ends_in_catch(&self) -> bool {
        self.events.last().map(Event::is_catch_end).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// A sequence together with the number of trials it receives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledSequence {
    #[serde(flatten)]
    pub sequence: Sequence,
    pub n: u64,
}

/// Flat record handed to the trial emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// `(name, duration)` per named event
    pub sequence: Vec<(String, f64)>,
    pub proportion: f64,
    pub duration: f64,
    pub n: u64,
}

/// Fully compiled schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub total_duration: f64,
    pub total_trials: u64,
    pub iti: Option<Iti>,
    pub sequences: Vec<ScheduledSequence>,
    /// Trials not assigned to any sequence
    pub remainder: u64,
}

impl Schedule {
    /// Trials assigned to sequences.
    pub fn allocated(&self) -> u64 {
        self.sequences.iter().map(|s| s.n).sum()
    }

    /// Sum of all sequence proportions.
    pub fn total_proportion(&self) -> f64 {
        self.sequences.iter().map(|s| s.sequence.proportion).sum()
    }

    pub fn records(&self) -> Vec<TrialRecord> {
        self.sequences
            .iter()
            .map(|scheduled| TrialRecord {
                sequence: scheduled
                    .sequence
                    .events
                    .iter()
                    .filter(|e| e.kind == EventKind::Task)
                    .filter_map(|e| e.name.clone().map(|name| (name, e.duration)))
                    .collect(),
                proportion: scheduled.sequence.proportion,
                duration: scheduled.sequence.duration,
                n: scheduled.n,
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> Schedule {
        let a = Event::named("A").with_duration(1.5).with_proportion(1.0);
        let b = Event::named("B").with_duration(0.5).with_proportion(0.15);
        let catch = Event::catch_end().with_proportion(1.0);
        let through = Event::fall_through().with_proportion(0.85);
        Schedule {
            total_duration: 100.0,
            total_trials: 10,
            iti: None,
            sequences: vec![
                ScheduledSequence {
                    sequence: Sequence {
                        events: vec![a.clone(), b, catch],
                        proportion: 0.15,
                        duration: 2.0,
                    },
                    n: 1,
                },
                ScheduledSequence {
                    sequence: Sequence {
                        events: vec![a, through],
                        proportion: 0.85,
                        duration: 1.5,
                    },
                    n: 8,
                },
            ],
            remainder: 1,
        }
    }

    #[test]
    fn test_sequence_names_skip_markers() {
        let schedule = schedule();
        assert_eq!(schedule.sequences[0].sequence.names(), vec!["A", "B"]);
        assert!(schedule.sequences[0].sequence.ends_in_catch());
        assert_eq!(schedule.sequences[1].sequence.names(), vec!["A"]);
        assert!(!schedule.sequences[1].sequence.ends_in_catch());
    }

    #[test]
    fn test_allocated_plus_remainder() {
        let schedule = schedule();
        assert_eq!(schedule.allocated() + schedule.remainder, schedule.total_trials);
        assert!((schedule.total_proportion() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_records_keep_only_named_events() {
        let records = schedule().records();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].sequence,
            vec![("A".to_string(), 1.5), ("B".to_string(), 0.5)]
        );
        assert_eq!(records[1].n, 8);
    }

    #[test]
    fn test_to_json_flattens_sequence() {
        let json = schedule().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_trials"], 10);
        assert_eq!(value["remainder"], 1);
        assert_eq!(value["sequences"][0]["n"], 1);
        assert_eq!(value["sequences"][0]["events"][2]["kind"], "catch_end");
    }
}
