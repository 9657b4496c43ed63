//! Event types attached to schedule tree nodes

use serde::{Deserialize, Serialize};
use std::fmt;

/// Duration of an event when the source does not give one.
pub const DEFAULT_DURATION: f64 = 1.0;

/// Name given to the synthetic root event.
pub const ROOT_NAME: &str = "root";

// ============================================================================
// ENUMS
// ============================================================================

/// What a tree node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Synthetic root of every schedule tree
    Root,
    /// A named task event written in the source
    Task,
    /// `$` marker; nothing may be attached below it
    CatchEnd,
    /// Unnamed continuation taking the mass a catch group leaves behind
    FallThrough,
}

/// How an event's duration is meant to be drawn.
///
/// Only `Fixed` has a meaning inside the compiler. `Exponential` and
/// ranged durations are carried through for the trial emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationKind {
    #[default]
    Fixed,
    Exponential,
}

// ============================================================================
// EVENT
// ============================================================================

/// One element of a trial sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    /// `None` for catch-end and fall-through markers
    pub name: Option<String>,
    pub duration: f64,
    /// Upper bound of a `=lo...hi` duration
    pub duration_range: Option<f64>,
    pub duration_kind: DurationKind,
    /// `None` until the normalizer fills it in
    pub proportion: Option<f64>,
    pub repeat_count: Option<u32>,
    /// `None` means unbounded
    pub max_repeat: Option<u32>,
}

impl Event {
    fn marker(kind: EventKind, name: Option<String>, duration: f64) -> Self {
        Self {
            kind,
            name,
            duration,
            duration_range: None,
            duration_kind: DurationKind::Fixed,
            proportion: None,
            repeat_count: None,
            max_repeat: None,
        }
    }

    /// A named task event with the default duration.
    pub fn named(name: impl Into<String>) -> Self {
        Self::marker(EventKind::Task, Some(name.into()), DEFAULT_DURATION)
    }

    /// The synthetic root: proportion 1, no duration.
    pub fn root() -> Self {
        let mut event = Self::marker(EventKind::Root, Some(ROOT_NAME.to_string()), 0.0);
        event.proportion = Some(1.0);
        event
    }

    /// The `$` catch-end marker.
    pub fn catch_end() -> Self {
        Self::marker(EventKind::CatchEnd, None, 0.0)
    }

    /// The implicit continuation of a catch group.
    pub fn fall_through() -> Self {
        Self::marker(EventKind::FallThrough, None, 0.0)
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_proportion(mut self, proportion: f64) -> Self {
        self.proportion = Some(proportion);
        self
    }

    pub fn with_max_repeat(mut self, max_repeat: u32) -> Self {
        self.max_repeat = Some(max_repeat);
        self
    }

    /// Whether children may be attached below this event.
    pub fn descend(&self) -> bool {
        self.kind != EventKind::CatchEnd
    }

    pub fn is_catch_end(&self) -> bool {
        self.kind == EventKind::CatchEnd
    }

    /// Proportion with an unset value read as 1.
    pub fn proportion_or_one(&self) -> f64 {
        self.proportion.unwrap_or(1.0)
    }

    /// Short label for logs and tree dumps.
    pub fn label(&self) -> &str {
        match (&self.name, self.kind) {
            (Some(name), _) => name,
            (None, EventKind::CatchEnd) => "$",
            (None, EventKind::FallThrough) => "~",
            (None, _) => "?",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prop) = self.proportion {
            write!(f, "{}*", prop)?;
        }
        write!(f, "{}={}", self.label(), self.duration)
    }
}
