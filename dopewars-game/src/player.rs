//! Player balances, location and stash.
use serde::{Deserialize, Serialize};

use crate::config::EconomyConfig;
use crate::data::{CommodityTable, ReferenceData};

/// Units held per commodity; one slot for every good, all starting at zero.
pub type Inventory = CommodityTable<u32>;

/// Mutable per-run player state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub cash: u64,
    pub bank: u64,
    pub debt: u64,
    /// Name of the city the player is in
    pub location: String,
    pub inventory: Inventory,
    pub days_left: u32,
}

impl Player {
    /// Fresh player with the configured starting balances, standing in the
    /// first city.
    #[must_use]
    pub fn new(config: &EconomyConfig, data: &ReferenceData) -> Self {
        Self {
            name: String::new(),
            cash: config.starting_cash,
            bank: config.starting_bank,
            debt: config.starting_debt,
            location: data.first_city().name.clone(),
            inventory: Inventory::default(),
            days_left: config.total_days,
        }
    }

    /// Units held across every commodity.
    #[must_use]
    pub fn total_units(&self) -> u64 {
        crate::stash::total_units(&self.inventory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Commodity;

    #[test]
    fn new_player_uses_starting_values() {
        let player = Player::new(&EconomyConfig::default(), &ReferenceData::builtin());
        assert_eq!(player.cash, 2_000);
        assert_eq!(player.bank, 0);
        assert_eq!(player.debt, 5_500);
        assert_eq!(player.days_left, 30);
        assert_eq!(player.location, "Bronx");
        assert!(player.name.is_empty());
        for commodity in Commodity::ALL {
            assert_eq!(player.inventory[commodity], 0);
        }
        assert_eq!(player.total_units(), 0);
    }

    #[test]
    fn total_units_sums_every_slot() {
        let mut player = Player::new(&EconomyConfig::default(), &ReferenceData::builtin());
        player.inventory[Commodity::Weed] = 12;
        player.inventory[Commodity::Acid] = 3;
        assert_eq!(player.total_units(), 15);
    }
}
