//! CST to AST conversion
//!
//! A single depth-first pass. Each production maps to its contribution in
//! one exhaustive match, so a new grammar rule cannot be ignored silently.
//! The header parameters travel in an explicit [`BuildContext`].

use super::{shake, Group, Item, ScheduleAst};
use crate::parser::{ParseNode, Rule};
use std::str::FromStr;
use thiserror::Error;
use trialtree_core::{DurationKind, Event, Iti};

// ============================================================================
// BUILD ERRORS
// ============================================================================

/// Errors raised while converting the CST.
///
/// Only `InvalidValue`, `InvalidNumber` and `NestedIti` can come from text
/// the parser accepts; the rest flag a CST that does not follow the grammar.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("unknown event attribute '{attribute}' at offset {offset}")]
    UnknownAttribute { attribute: String, offset: usize },

    #[error("event at offset {offset} has no name")]
    MissingName { offset: usize },

    #[error("'{text}' at offset {offset} is not a valid number")]
    InvalidNumber { text: String, offset: usize },

    #[error("invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("unexpected '{rule}' node at offset {offset}")]
    UnexpectedNode { rule: String, offset: usize },

    #[error("schedule header is missing {field}")]
    MissingHeader { field: String },

    /// The ITI closes a step of the whole schedule, so it cannot sit in a branch
    #[error("inter-trial interval at offset {offset} is inside a group")]
    NestedIti { offset: usize },
}

pub type BuildResult<T> = Result<T, BuildError>;

// ============================================================================
// BUILD CONTEXT
// ============================================================================

/// State threaded through the conversion pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildContext {
    pub total_duration: Option<f64>,
    pub total_trials: Option<u64>,
}

/// Duration attributes shared by events and ITI markers.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DurationSpec {
    value: f64,
    range: Option<f64>,
    kind: DurationKind,
}

// ============================================================================
// BUILDER
// ============================================================================

/// Convert a `Main` node into a cleaned-up [`ScheduleAst`].
pub fn build(root: &ParseNode) -> BuildResult<ScheduleAst> {
    if root.rule != Rule::Main {
        return Err(unexpected(root));
    }

    let mut ctx = BuildContext::default();
    let mut items = Vec::new();
    for child in &root.children {
        items.extend(visit(child, &mut ctx)?);
    }

    let total_duration = ctx.total_duration.ok_or_else(|| BuildError::MissingHeader {
        field: "total duration".to_string(),
    })?;
    let total_trials = ctx.total_trials.ok_or_else(|| BuildError::MissingHeader {
        field: "total trials".to_string(),
    })?;

    Ok(ScheduleAst {
        total_duration,
        total_trials,
        items: shake(items),
    })
}

fn visit(node: &ParseNode, ctx: &mut BuildContext) -> BuildResult<Option<Item>> {
    match node.rule {
        Rule::Info => {
            visit_info(node, ctx)?;
            Ok(None)
        }
        Rule::Event => visit_event(node).map(|e| Some(Item::Event(e))),
        Rule::CatchEnd => Ok(Some(Item::Event(Event::catch_end()))),
        Rule::Children => visit_group(node, ctx).map(|g| Some(Item::Group(g))),
        Rule::Iti => visit_iti(node).map(|i| Some(Item::Iti(i))),
        Rule::Literal | Rule::Sep => Ok(None),
        Rule::Main
        | Rule::TotalDur
        | Rule::TotalTrials
        | Rule::Name
        | Rule::Reps
        | Rule::Prop
        | Rule::Dur
        | Rule::DurRange
        | Rule::DurType
        | Rule::MaxRep
        | Rule::Float
        | Rule::Integer => Err(unexpected(node)),
    }
}

fn visit_info(node: &ParseNode, ctx: &mut BuildContext) -> BuildResult<()> {
    for child in &node.children {
        match child.rule {
            Rule::TotalDur => ctx.total_duration = Some(float_in(child)?),
            Rule::TotalTrials => ctx.total_trials = Some(integer_in(child)?),
            Rule::Literal => {}
            _ => return Err(unexpected(child)),
        }
    }
    Ok(())
}

fn visit_event(node: &ParseNode) -> BuildResult<Event> {
    let mut name = None;
    let mut repeat_count = None;
    let mut proportion = None;
    let mut duration = None;
    let mut max_repeat = None;

    for child in &node.children {
        match child.rule {
            Rule::Reps => repeat_count = Some(integer_in(child)?),
            Rule::Prop => proportion = Some(check_proportion(float_in(child)?)?),
            Rule::Name => name = Some(child.text.clone()),
            Rule::Dur => duration = Some(visit_dur(child)?),
            Rule::MaxRep => max_repeat = Some(integer_in(child)?),
            Rule::Sep => {}
            other => {
                return Err(BuildError::UnknownAttribute {
                    attribute: other.name().to_string(),
                    offset: child.span.start,
                })
            }
        }
    }

    let name = name.ok_or(BuildError::MissingName {
        offset: node.span.start,
    })?;
    let mut event = Event::named(name);
    event.proportion = proportion;
    event.repeat_count = repeat_count;
    event.max_repeat = max_repeat;
    if let Some(spec) = duration {
        event.duration = spec.value;
        event.duration_range = spec.range;
        event.duration_kind = spec.kind;
    }
    Ok(event)
}

fn visit_group(node: &ParseNode, ctx: &mut BuildContext) -> BuildResult<Group> {
    let mut members = Vec::new();
    let mut max_repeat = None;
    for child in &node.children {
        match child.rule {
            Rule::MaxRep => max_repeat = Some(integer_in(child)?),
            Rule::Iti => {
                return Err(BuildError::NestedIti {
                    offset: child.span.start,
                })
            }
            _ => members.extend(visit(child, ctx)?),
        }
    }
    Ok(Group {
        members,
        max_repeat,
    })
}

fn visit_iti(node: &ParseNode) -> BuildResult<Iti> {
    let mut iti = Iti::default();
    for child in &node.children {
        match child.rule {
            Rule::Dur => {
                let spec = visit_dur(child)?;
                iti.duration = Some(spec.value);
                iti.duration_range = spec.range;
                iti.duration_kind = spec.kind;
            }
            Rule::Literal => {}
            _ => return Err(unexpected(child)),
        }
    }
    Ok(iti)
}

fn visit_dur(node: &ParseNode) -> BuildResult<DurationSpec> {
    let mut spec = DurationSpec {
        value: float_in(node)?,
        range: None,
        kind: DurationKind::Fixed,
    };
    for child in &node.children {
        match child.rule {
            Rule::DurRange => spec.range = Some(float_in(child)?),
            Rule::DurType => spec.kind = DurationKind::Exponential,
            Rule::Float | Rule::Literal => {}
            _ => return Err(unexpected(child)),
        }
    }

    if let Some(upper) = spec.range {
        if upper < spec.value {
            return Err(BuildError::InvalidValue {
                field: "duration_range".to_string(),
                value: format!("{}...{}", spec.value, upper),
                reason: "upper bound is below the base duration".to_string(),
            });
        }
    }
    Ok(spec)
}

// ============================================================================
// Helpers
// ============================================================================

fn check_proportion(value: f64) -> BuildResult<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(BuildError::InvalidValue {
            field: "proportion".to_string(),
            value: value.to_string(),
            reason: "must lie within [0, 1]".to_string(),
        })
    }
}

/// Value of the first `Float` child of `node`.
fn float_in(node: &ParseNode) -> BuildResult<f64> {
    number_in(node, Rule::Float)
}

/// Value of the first `Integer` child of `node`.
fn integer_in<T: FromStr>(node: &ParseNode) -> BuildResult<T> {
    number_in(node, Rule::Integer)
}

fn number_in<T: FromStr>(node: &ParseNode, rule: Rule) -> BuildResult<T> {
    let token = node.child(rule).ok_or_else(|| BuildError::UnexpectedNode {
        rule: node.rule.name().to_string(),
        offset: node.span.start,
    })?;
    token.text.parse().map_err(|_| BuildError::InvalidNumber {
        text: token.text.clone(),
        offset: token.span.start,
    })
}

fn unexpected(node: &ParseNode) -> BuildError {
    BuildError::UnexpectedNode {
        rule: node.rule.name().to_string(),
        offset: node.span.start,
    }
}

// ============================================================================
// TESTS
// ============================================================================
