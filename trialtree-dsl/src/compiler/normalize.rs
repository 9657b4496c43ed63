//! Proportion normalization
//!
//! At every node with children, siblings without an explicit proportion
//! share the mass the explicit ones leave over. Already-set proportions are
//! never changed, so running the pass twice is a no-op.

use super::{CompileError, CompileResult};
use trialtree_core::{CompileOptions, EventTree, NodeId, ProportionPolicy};

/// Fill in every unset proportion in `tree`.
pub fn normalize(tree: &mut EventTree, options: &CompileOptions) -> CompileResult<()> {
    for id in tree.depth_first() {
        normalize_children(tree, id, options)?;
    }
    Ok(())
}

fn normalize_children(
    tree: &mut EventTree,
    id: NodeId,
    options: &CompileOptions,
) -> CompileResult<()> {
    let children = tree.children(id).to_vec();
    if children.is_empty() {
        return Ok(());
    }

    let mut explicit = 0.0;
    let mut unset = 0usize;
    for &child in &children {
        match tree.event(child).and_then(|e| e.proportion) {
            Some(p) => explicit += p,
            None => unset += 1,
        }
    }

    let label = tree
        .event(id)
        .map(|e| e.label().to_string())
        .unwrap_or_default();

    if explicit > 1.0 + options.tolerance {
        match options.proportion_policy {
            ProportionPolicy::Strict => {
                return Err(CompileError::NormalizationInconsistency {
                    node: id,
                    label,
                    sum: explicit,
                })
            }
            ProportionPolicy::Lenient => tracing::warn!(
                node = %id,
                label = %label,
                sum = explicit,
                "Explicit proportions exceed 1"
            ),
        }
    }

    if unset == 0 {
        if (explicit - 1.0).abs() > options.tolerance {
            tracing::warn!(
                node = %id,
                label = %label,
                sum = explicit,
                "Explicit proportions do not sum to 1"
            );
        }
        return Ok(());
    }

    let remaining = 1.0 - explicit;
    if remaining < -options.tolerance {
        tracing::warn!(node = %id, remaining, "Negative remaining mass clamped to 0");
    }
    let share = remaining.max(0.0) / unset as f64;

    for &child in &children {
        if let Some(event) = tree.event_mut(child) {
            if event.proportion.is_none() {
                event.proportion = Some(share);
            }
        }
    }
    tracing::trace!(node = %id, unset, share, "Normalized children");
    Ok(())
}
