//! TRIALTREE DSL - Parser & Compiler for Trial Schedules
//!
//! A schedule is one line such as `100/10x A=1.5,{.15*B=.5,C=.3,$},D`:
//! total duration, total trial count, then a branching run of named events.
//! This crate compiles it into every root-to-leaf sequence with its
//! probability, duration and trial count.
//!
//! Architecture:
//! ```text
//! DSL Source
//!     ↓
//! Parser (PEG recognizer → concrete syntax tree)
//!     ↓
//! AST Builder (CST → ScheduleAst, cleanup)
//!     ↓
//! Tree Constructor (frontier → EventTree)
//!     ↓
//! Proportion Normalizer
//!     ↓
//! Leaf Enumerator → Trial Allocator
//!     ↓
//! Schedule
//! ```
//!
//! ```
//! let schedule = trialtree_dsl::compile("100/10x {one,two}").unwrap();
//! assert_eq!(schedule.sequences.len(), 2);
//! assert_eq!(schedule.sequences[0].n, 5);
//! ```

pub mod ast;
pub mod compiler;
pub mod parser;
pub mod pretty_printer;

// Re-export key types for convenience
pub use ast::{build, BuildContext, BuildError, Group, Item, ScheduleAst};
pub use compiler::*;
pub use parser::{parse, ParseError, ParseNode, Rule, Span, MAX_NESTING};
pub use pretty_printer::{pretty_print, round_trip};
