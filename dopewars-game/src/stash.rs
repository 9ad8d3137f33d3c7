//! Stash analytics: carry weight against capacity and the heat a stash
//! draws. Both are informational; no command is blocked by them.
use serde::{Deserialize, Serialize};

use crate::constants::{
    CAPACITY_ALMOST_FULL_PCT, CAPACITY_FILLING_PCT, CAPACITY_FULL_PCT, HEAT_LOW_MAX,
    HEAT_MEDIUM_MAX,
};
use crate::data::{CommodityInfo, CommodityTable};
use crate::numbers::u64_to_f64;
use crate::player::Inventory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityStatus {
    Good,
    Filling,
    AlmostFull,
    Overencumbered,
}

impl CapacityStatus {
    #[must_use]
    pub fn from_usage_pct(pct: f64) -> Self {
        if pct < CAPACITY_FILLING_PCT {
            Self::Good
        } else if pct < CAPACITY_ALMOST_FULL_PCT {
            Self::Filling
        } else if pct < CAPACITY_FULL_PCT {
            Self::AlmostFull
        } else {
            Self::Overencumbered
        }
    }
}

/// Police attention a stash attracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatLevel {
    None,
    Low,
    Medium,
    High,
}

impl HeatLevel {
    #[must_use]
    pub const fn from_score(score: u64) -> Self {
        if score == 0 {
            Self::None
        } else if score <= HEAT_LOW_MAX {
            Self::Low
        } else if score <= HEAT_MEDIUM_MAX {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// Units held across every slot.
#[must_use]
pub fn total_units(inventory: &Inventory) -> u64 {
    inventory.values().map(|qty| u64::from(*qty)).sum()
}

/// Total stash weight in kilograms.
#[must_use]
pub fn carry_weight_kg(inventory: &Inventory, commodities: &CommodityTable<CommodityInfo>) -> f64 {
    inventory
        .iter()
        .map(|(commodity, qty)| commodities[commodity].weight_kg * f64::from(*qty))
        .sum()
}

#[must_use]
pub fn heat_score(inventory: &Inventory, commodities: &CommodityTable<CommodityInfo>) -> u64 {
    inventory
        .iter()
        .map(|(commodity, qty)| u64::from(commodities[commodity].heat) * u64::from(*qty))
        .fold(0_u64, u64::saturating_add)
}

/// Everything the inventory panel shows about the stash, in one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StashReport {
    pub total_units: u64,
    pub weight_kg: f64,
    pub capacity_kg: f64,
    pub usage_pct: f64,
    pub capacity: CapacityStatus,
    pub heat_score: u64,
    pub heat: HeatLevel,
}

impl StashReport {
    #[must_use]
    pub fn build(
        inventory: &Inventory,
        commodities: &CommodityTable<CommodityInfo>,
        capacity_kg: f64,
    ) -> Self {
        let weight_kg = carry_weight_kg(inventory, commodities);
        let usage_pct = if capacity_kg > 0.0 {
            weight_kg / capacity_kg * 100.0
        } else {
            100.0
        };
        let heat_score = heat_score(inventory, commodities);
        Self {
            total_units: total_units(inventory),
            weight_kg,
            capacity_kg,
            usage_pct,
            capacity: CapacityStatus::from_usage_pct(usage_pct),
            heat_score,
            heat: HeatLevel::from_score(heat_score),
        }
    }

    /// Kilograms left before the stash is over capacity.
    #[must_use]
    pub fn remaining_kg(&self) -> f64 {
        (self.capacity_kg - self.weight_kg).max(0.0)
    }

    /// Average heat per unit held; zero for an empty stash.
    #[must_use]
    pub fn heat_per_unit(&self) -> f64 {
        if self.total_units == 0 {
            return 0.0;
        }
        u64_to_f64(self.heat_score) / u64_to_f64(self.total_units)
    }
}
