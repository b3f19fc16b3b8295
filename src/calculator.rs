//! Recursive crafting cost resolution
//!
//! Walks the recipe dependency graph depth-first, rounding every demand up
//! to whole crafting batches and banking the overproduction in a ledger so
//! that a later sibling's demand for the same material can be met from
//! spares instead of extra crafts.

use std::collections::HashMap;

use anyhow::Result;
use thiserror::Error;

use crate::models::{CostNode, Recipe, SpareLedger};

/// Recursion cap guarding against cyclic recipe graphs.
pub const MAX_DEPTH: usize = 64;

/// Read access to stored recipes. Returning `None` marks the material as a
/// raw resource and terminates recursion; it is never an error.
pub trait RecipeSource {
    fn recipe_for(&self, material: &str) -> Result<Option<Recipe>>;
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("recipe lookup for '{material}' failed")]
    Repository {
        material: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("recipe for '{0}' claims a result quantity of zero")]
    ZeroResultQuantity(String),

    #[error("recursion limit ({limit}) exceeded at '{material}' - the recipe graph likely contains a cycle")]
    DepthLimit { material: String, limit: usize },
}

/// Resolve the cost of crafting `quantity` units of `material`.
///
/// In tree mode (`raw_cost_only == false`) the result mirrors the recipe
/// structure: each crafted node carries its batch-rounded quantity, the
/// spares it consumed, and its resolved inputs. In raw-cost mode the
/// top-level node instead lists only the aggregated raw inputs of the whole
/// subtree, and keeps the originally requested quantity.
///
/// Each call owns a fresh spare ledger; spares never leak between calls.
pub fn resolve_cost(
    source: &dyn RecipeSource,
    material: &str,
    quantity: u64,
    raw_cost_only: bool,
) -> Result<CostNode, ResolveError> {
    let mut ledger = SpareLedger::default();
    resolve_recursive(source, &mut ledger, material, quantity, raw_cost_only, 0)
}

fn resolve_recursive(
    source: &dyn RecipeSource,
    ledger: &mut SpareLedger,
    material: &str,
    quantity: u64,
    raw_cost_only: bool,
    depth: usize,
) -> Result<CostNode, ResolveError> {
    if depth > MAX_DEPTH {
        return Err(ResolveError::DepthLimit {
            material: material.to_string(),
            limit: MAX_DEPTH,
        });
    }

    let recipe = source
        .recipe_for(material)
        .map_err(|source| ResolveError::Repository {
            material: material.to_string(),
            source,
        })?;
    let Some(recipe) = recipe else {
        return Ok(CostNode::Leaf {
            material: material.to_string(),
            quantity,
        });
    };
    if recipe.result_quantity == 0 {
        return Err(ResolveError::ZeroResultQuantity(material.to_string()));
    }

    // Only whole batches can be crafted; the excess becomes spare inventory.
    let real_quantity = round_to_batch(quantity, recipe.result_quantity);
    ledger.record_production(material, real_quantity, real_quantity - quantity);
    let batches = real_quantity / recipe.result_quantity;

    // Aggregate demand per input material, preserving the order in which
    // each material first appears in the grid.
    let mut demand: Vec<(String, u64)> = Vec::new();
    for cell in recipe.occupied_cells() {
        match demand.iter_mut().find(|(name, _)| *name == cell.material) {
            Some((_, needed)) => *needed += cell.quantity * batches,
            None => demand.push((cell.material.clone(), cell.quantity * batches)),
        }
    }

    // Settle spares for every input before recursing into any of them, so
    // the decisions reflect the ledger as of this node. Earlier entries win
    // when the pool cannot cover everyone.
    let mut spares_used: Vec<(String, u64)> = Vec::new();
    for (name, needed) in &mut demand {
        let taken = ledger.take_spares(name, *needed);
        if taken > 0 {
            spares_used.push((name.clone(), taken));
            *needed -= taken;
        }
    }

    let mut crafting_time = recipe.time_per_batch() * batches as f64;
    let mut children = Vec::with_capacity(demand.len());
    for (name, needed) in demand {
        let child = resolve_recursive(source, ledger, &name, needed, false, depth + 1)?;
        crafting_time += child.crafting_time();
        children.push(child);
    }

    if raw_cost_only {
        let mut totals: Vec<(String, u64)> = Vec::new();
        for child in &children {
            collect_leaves(child, &mut totals);
        }
        let materials = totals
            .into_iter()
            .map(|(material, quantity)| CostNode::Leaf { material, quantity })
            .collect();
        return Ok(CostNode::Crafted {
            material: material.to_string(),
            quantity,
            crafting_time,
            materials,
            spares_used: Vec::new(),
        });
    }

    Ok(CostNode::Crafted {
        material: material.to_string(),
        quantity: real_quantity,
        crafting_time,
        materials: children,
        spares_used,
    })
}

/// Round `quantity` up to the smallest whole multiple of `batch_size`.
pub fn round_to_batch(quantity: u64, batch_size: u64) -> u64 {
    if quantity % batch_size == 0 {
        quantity
    } else {
        (quantity / batch_size + 1) * batch_size
    }
}

/// Sum every leaf in the subtree into `totals`, keyed by material name in
/// first-encounter order. Crafted nodes contribute only their leaves.
fn collect_leaves(node: &CostNode, totals: &mut Vec<(String, u64)>) {
    match node {
        CostNode::Leaf { material, quantity } => {
            match totals.iter_mut().find(|(name, _)| name == material) {
                Some((_, sum)) => *sum += quantity,
                None => totals.push((material.clone(), *quantity)),
            }
        }
        CostNode::Crafted { materials, .. } => {
            for child in materials {
                collect_leaves(child, totals);
            }
        }
    }
}

/// Format a cost tree as an indented, readable string.
pub fn format_cost_tree(node: &CostNode, indent: usize) -> String {
    let mut output = String::new();
    let prefix = "  ".repeat(indent);

    match node {
        CostNode::Leaf { material, quantity } => {
            output.push_str(&format!("{}{}x {} (raw input)\n", prefix, quantity, material));
        }
        CostNode::Crafted {
            material,
            quantity,
            crafting_time,
            materials,
            spares_used,
        } => {
            output.push_str(&format!(
                "{}{}x {} (crafts in {})\n",
                prefix,
                quantity,
                material,
                format_crafting_time(*crafting_time)
            ));
            for (name, used) in spares_used {
                output.push_str(&format!("{}  reuses {}x spare {}\n", prefix, used, name));
            }
            for child in materials {
                output.push_str(&format_cost_tree(child, indent + 1));
            }
        }
    }

    output
}

/// Render seconds as `1h 2m 3s`, omitting zero hour/minute components.
pub fn format_crafting_time(seconds: f64) -> String {
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds / 60.0).floor() as u64) % 60;
    let secs = seconds % 60.0;

    let mut result = String::new();
    if hours > 0 {
        result.push_str(&format!("{}h ", hours));
    }
    if minutes > 0 {
        result.push_str(&format!("{}m ", minutes));
    }
    if secs.fract() == 0.0 {
        result.push_str(&format!("{}s", secs as u64));
    } else {
        result.push_str(&format!("{:.1}s", secs));
    }
    result
}

/// Aggregate view of a resolved cost tree.
#[derive(Debug)]
pub struct CostSummary {
    pub target_material: String,
    pub requested_quantity: u64,
    pub total_crafting_time: f64,
    /// Total units produced per crafted material, alphabetical.
    pub crafted_counts: Vec<(String, u64)>,
    /// Total units of each raw input required, alphabetical.
    pub raw_inputs: Vec<(String, u64)>,
}

/// Summarize a cost tree: per-material craft totals and raw input totals.
pub fn summarize_cost(node: &CostNode, target_material: &str, requested: u64) -> CostSummary {
    let mut crafted: HashMap<String, u64> = HashMap::new();
    let mut raw: HashMap<String, u64> = HashMap::new();
    collect_summary(node, &mut crafted, &mut raw);

    let mut crafted_counts: Vec<_> = crafted.into_iter().collect();
    crafted_counts.sort_by(|a, b| a.0.cmp(&b.0));

    let mut raw_inputs: Vec<_> = raw.into_iter().collect();
    raw_inputs.sort_by(|a, b| a.0.cmp(&b.0));

    CostSummary {
        target_material: target_material.to_string(),
        requested_quantity: requested,
        total_crafting_time: node.crafting_time(),
        crafted_counts,
        raw_inputs,
    }
}

fn collect_summary(
    node: &CostNode,
    crafted: &mut HashMap<String, u64>,
    raw: &mut HashMap<String, u64>,
) {
    match node {
        CostNode::Leaf { material, quantity } => {
            *raw.entry(material.clone()).or_default() += quantity;
        }
        CostNode::Crafted {
            material,
            quantity,
            materials,
            ..
        } => {
            *crafted.entry(material.clone()).or_default() += quantity;
            for child in materials {
                collect_summary(child, crafted, raw);
            }
        }
    }
}

impl std::fmt::Display for CostSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Crafting Summary ===")?;
        writeln!(
            f,
            "Target: {}x {}",
            self.requested_quantity, self.target_material
        )?;
        writeln!(f)?;

        writeln!(f, "Crafted (including spares):")?;
        for (name, count) in &self.crafted_counts {
            writeln!(f, "  {}x {}", count, name)?;
        }
        writeln!(f)?;

        writeln!(f, "Raw inputs required:")?;
        for (name, count) in &self.raw_inputs {
            writeln!(f, "  {}x {}", count, name)?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "Total crafting time: {}",
            format_crafting_time(self.total_crafting_time)
        )?;

        Ok(())
    }
}
