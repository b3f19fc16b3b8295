//! Data models for materials, recipes, and cost-resolution results

use std::collections::HashMap;

/// Number of cells in the 3x3 crafting grid.
pub const GRID_SLOTS: usize = 9;

/// A material known to the calculator. Materials without a recipe are
/// raw resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    pub name: String,
}

/// One occupied cell of a recipe's crafting grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeCell {
    pub material: String,
    pub quantity: u64,
}

/// A crafting recipe: 3x3 input grid plus the item it produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub result_item: String,
    /// Units produced per craft. Must be >= 1.
    pub result_quantity: u64,
    /// Grid cells in row-major order; `None` is an empty slot.
    pub cells: [Option<RecipeCell>; GRID_SLOTS],
    /// Seconds per craft operation, not per unit produced.
    pub crafting_time: Option<f64>,
}

impl Recipe {
    /// Craft time for a single batch, defaulting to 1 second when unset.
    pub fn time_per_batch(&self) -> f64 {
        self.crafting_time.unwrap_or(1.0)
    }

    /// Iterate the occupied grid cells in slot order.
    pub fn occupied_cells(&self) -> impl Iterator<Item = &RecipeCell> {
        self.cells.iter().flatten()
    }
}

/// Result of resolving the cost of crafting a material.
#[derive(Debug, Clone, PartialEq)]
pub enum CostNode {
    /// A material with no known recipe: a raw input, terminates recursion.
    Leaf { material: String, quantity: u64 },
    /// A crafted material with its resolved inputs.
    Crafted {
        material: String,
        /// Units actually produced after batch rounding. In raw-cost mode
        /// this is instead the originally requested quantity.
        quantity: u64,
        /// Own craft time times batches, plus all crafted descendants.
        crafting_time: f64,
        /// Resolved inputs in recipe cell order. In raw-cost mode, the
        /// flattened leaf totals for the whole subtree.
        materials: Vec<CostNode>,
        /// Units of each direct input satisfied from spare inventory
        /// rather than freshly crafted at this step.
        spares_used: Vec<(String, u64)>,
    },
}

impl CostNode {
    pub fn material(&self) -> &str {
        match self {
            CostNode::Leaf { material, .. } => material,
            CostNode::Crafted { material, .. } => material,
        }
    }

    pub fn quantity(&self) -> u64 {
        match self {
            CostNode::Leaf { quantity, .. } => *quantity,
            CostNode::Crafted { quantity, .. } => *quantity,
        }
    }

    /// Raw inputs cost nothing to craft; only crafted nodes carry time.
    pub fn crafting_time(&self) -> f64 {
        match self {
            CostNode::Leaf { .. } => 0.0,
            CostNode::Crafted { crafting_time, .. } => *crafting_time,
        }
    }
}

/// Per-material production bookkeeping for one top-level resolution.
///
/// `total` counts every unit produced for a material across the whole call;
/// `spares` counts units produced by batch rounding that no demand has
/// claimed yet. A fresh ledger is created per resolution and discarded
/// afterwards, so spares never carry over between independent calculations.
#[derive(Debug, Default)]
pub struct SpareLedger {
    entries: HashMap<String, LedgerEntry>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LedgerEntry {
    pub total: u64,
    pub spares: u64,
}

impl SpareLedger {
    /// Record a batch-rounded production run: `produced` units total, of
    /// which `spare` exceed the quantity that was actually demanded.
    pub fn record_production(&mut self, material: &str, produced: u64, spare: u64) {
        let entry = self.entries.entry(material.to_string()).or_default();
        entry.total += produced;
        entry.spares += spare;
    }

    /// Claim up to `demand` units from the material's spare pool, returning
    /// how many were actually available to claim.
    pub fn take_spares(&mut self, material: &str, demand: u64) -> u64 {
        match self.entries.get_mut(material) {
            Some(entry) if entry.spares > 0 => {
                let taken = entry.spares.min(demand);
                entry.spares -= taken;
                taken
            }
            _ => 0,
        }
    }

    pub fn entry(&self, material: &str) -> Option<LedgerEntry> {
        self.entries.get(material).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_accumulates_production() {
        let mut ledger = SpareLedger::default();
        ledger.record_production("plank", 12, 2);
        ledger.record_production("plank", 4, 3);

        let entry = ledger.entry("plank").unwrap();
        assert_eq!(entry.total, 16);
        assert_eq!(entry.spares, 5);
    }

    #[test]
    fn take_spares_is_capped_by_pool_and_demand() {
        let mut ledger = SpareLedger::default();
        ledger.record_production("stick", 8, 3);

        assert_eq!(ledger.take_spares("stick", 2), 2);
        assert_eq!(ledger.entry("stick").unwrap().spares, 1);

        // Pool smaller than demand: hand out what is left.
        assert_eq!(ledger.take_spares("stick", 10), 1);
        assert_eq!(ledger.entry("stick").unwrap().spares, 0);

        // Empty pool and unknown materials yield nothing.
        assert_eq!(ledger.take_spares("stick", 1), 0);
        assert_eq!(ledger.take_spares("coal", 1), 0);
    }

    #[test]
    fn take_spares_never_touches_totals() {
        let mut ledger = SpareLedger::default();
        ledger.record_production("iron_ingot", 10, 4);
        ledger.take_spares("iron_ingot", 4);
        assert_eq!(ledger.entry("iron_ingot").unwrap().total, 10);
    }

    #[test]
    fn cost_node_accessors() {
        let leaf = CostNode::Leaf {
            material: "log".to_string(),
            quantity: 3,
        };
        assert_eq!(leaf.material(), "log");
        assert_eq!(leaf.quantity(), 3);
        assert_eq!(leaf.crafting_time(), 0.0);

        let crafted = CostNode::Crafted {
            material: "plank".to_string(),
            quantity: 12,
            crafting_time: 3.0,
            materials: vec![leaf],
            spares_used: Vec::new(),
        };
        assert_eq!(crafted.material(), "plank");
        assert_eq!(crafted.quantity(), 12);
        assert_eq!(crafted.crafting_time(), 3.0);
    }
}
