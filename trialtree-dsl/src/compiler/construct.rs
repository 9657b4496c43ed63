//! Tree construction
//!
//! Walks the AST keeping a frontier of node ids to extend. Sequential items
//! replace the frontier with the nodes they attach. Groups branch it:
//!
//! - an alternative group grafts every member from the same pre-branch
//!   frontier and continues from the union of their outputs;
//! - a catch group (one with a direct `$` member) grafts its members as one
//!   chain and gives each pre-branch node a fall-through child that carries
//!   the remaining mass past the group.

use super::{CompileError, CompileResult};
use crate::ast::{Group, Item, ScheduleAst};
use trialtree_core::{Event, EventTree, Iti, NodeId, TreeError};

/// Output of the construction phase.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructedTree {
    pub tree: EventTree,
    pub iti: Option<Iti>,
}

/// Build the schedule tree for `ast`.
///
/// Parsed sources only carry a top-level ITI. A hand-built AST may nest one
/// in a group; it is collected the same way and counts toward the limit of one.
pub fn construct(ast: &ScheduleAst) -> CompileResult<ConstructedTree> {
    let itis = ast.itis();
    if itis.len() > 1 {
        return Err(CompileError::DuplicateIti { count: itis.len() });
    }

    let mut tree = EventTree::new();
    let root = tree.root();
    let frontier = extend_sequence(&mut tree, vec![root], &ast.items, None)?;
    tracing::debug!(
        nodes = tree.len(),
        frontier = frontier.len(),
        "Constructed schedule tree"
    );

    Ok(ConstructedTree {
        tree,
        iti: itis.first().map(|iti| (*iti).clone()),
    })
}

/// Apply `items` one after another starting from `frontier`.
fn extend_sequence(
    tree: &mut EventTree,
    mut frontier: Vec<NodeId>,
    items: &[Item],
    inherited_max_repeat: Option<u32>,
) -> Result<Vec<NodeId>, TreeError> {
    for item in items {
        frontier = match item {
            Item::Event(event) => attach_all(tree, &frontier, event, inherited_max_repeat)?,
            Item::Group(group) => branch(tree, &frontier, group)?,
            Item::Iti(_) => frontier,
        };
    }
    Ok(frontier)
}

fn branch(
    tree: &mut EventTree,
    frontier: &[NodeId],
    group: &Group,
) -> Result<Vec<NodeId>, TreeError> {
    if group.is_catch_group() {
        let chain = extend_sequence(tree, frontier.to_vec(), &group.members, group.max_repeat)?;
        let mut next = Vec::with_capacity(frontier.len());
        for &parent in frontier {
            if tree.can_descend(parent) {
                next.push(tree.attach(parent, Event::fall_through())?);
            }
        }
        next.extend(chain.into_iter().filter(|&id| tree.can_descend(id)));
        return Ok(next);
    }

    let mut next = Vec::new();
    for member in &group.members {
        match member {
            Item::Event(event) => {
                next.extend(attach_all(tree, frontier, event, group.max_repeat)?)
            }
            Item::Group(nested) => next.extend(branch(tree, frontier, nested)?),
            Item::Iti(_) => {}
        }
    }
    Ok(next)
}

/// Attach a copy of `event` below every descending node of `frontier`.
fn attach_all(
    tree: &mut EventTree,
    frontier: &[NodeId],
    event: &Event,
    inherited_max_repeat: Option<u32>,
) -> Result<Vec<NodeId>, TreeError> {
    let mut event = event.clone();
    if event.max_repeat.is_none() && !event.is_catch_end() {
        event.max_repeat = inherited_max_repeat;
    }

    let mut attached = Vec::with_capacity(frontier.len());
    for &parent in frontier {
        if !tree.can_descend(parent) {
            continue;
        }
        let id = tree.attach(parent, event.clone())?;
        tracing::trace!(node = %id, parent = %parent, event = %event, "Attached node");
        attached.push(id);
    }

    if attached.is_empty() {
        tracing::debug!(event = %event, "No open branch left to attach to");
    }
    Ok(attached)
}
