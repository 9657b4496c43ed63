//! Abstract syntax tree for schedule sources
//!
//! The builder turns the parser's CST into a [`ScheduleAst`]: the two header
//! parameters plus a nested list of items mirroring the source structure.

pub mod builder;
pub mod shake;

pub use builder::*;
pub use shake::*;

use serde::{Deserialize, Serialize};
use trialtree_core::{Event, Iti};

// ============================================================================
// AST TYPES
// ============================================================================

/// A parsed schedule line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleAst {
    pub total_duration: f64,
    pub total_trials: u64,
    /// Top-level items, applied one after another
    pub items: Vec<Item>,
}

/// One element of a sequence or branch group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    /// A named event or a `$` catch-end marker
    Event(Event),
    Group(Group),
    Iti(Iti),
}

/// A `{...}` branch group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub members: Vec<Item>,
    /// Group-level `<n>`, inherited by members without their own
    pub max_repeat: Option<u32>,
}

impl Group {
    pub fn new(members: Vec<Item>) -> Self {
        Self {
            members,
            max_repeat: None,
        }
    }

    /// Whether the group lists a `$` directly among its members.
    ///
    /// Such a group describes one chain that a trial may enter, with the
    /// rest of the mass falling through past it.
    pub fn is_catch_group(&self) -> bool {
        self.members
            .iter()
            .any(|m| matches!(m, Item::Event(e) if e.is_catch_end()))
    }
}

impl ScheduleAst {
    /// Every ITI marker in source order, nested ones included.
    pub fn itis(&self) -> Vec<&Iti> {
        fn collect<'a>(items: &'a [Item], out: &mut Vec<&'a Iti>) {
            for item in items {
                match item {
                    Item::Iti(iti) => out.push(iti),
                    Item::Group(group) => collect(&group.members, out),
                    Item::Event(_) => {}
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.items, &mut out);
        out
    }
}
