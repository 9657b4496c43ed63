//! Cleanup pass over built items
//!
//! Drops groups left empty and collapses single-member groups into their
//! member. A group of one is not a branch, so keeping it would only add a
//! level of nesting the tree constructor has to see through.

use super::{Group, Item};

/// Clean up a list of items. The list itself is never collapsed.
pub fn shake(items: Vec<Item>) -> Vec<Item> {
    items.into_iter().filter_map(shake_item).collect()
}

fn shake_item(item: Item) -> Option<Item> {
    match item {
        Item::Group(group) => shake_group(group),
        other => Some(other),
    }
}

fn shake_group(group: Group) -> Option<Item> {
    let Group {
        members,
        max_repeat,
    } = group;
    let mut members = shake(members);

    match members.len() {
        0 => None,
        1 => members.pop().map(|member| inherit_max_repeat(member, max_repeat)),
        _ => Some(Item::Group(Group {
            members,
            max_repeat,
        })),
    }
}

/// Hand a collapsed group's `<n>` down to its sole member.
fn inherit_max_repeat(member: Item, max_repeat: Option<u32>) -> Item {
    match member {
        Item::Event(mut event) => {
            if event.max_repeat.is_none() && !event.is_catch_end() {
                event.max_repeat = max_repeat;
            }
            Item::Event(event)
        }
        Item::Group(mut group) => {
            group.max_repeat = group.max_repeat.or(max_repeat);
            Item::Group(group)
        }
        iti @ Item::Iti(_) => iti,
    }
}
