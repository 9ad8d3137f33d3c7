//! Market generation: randomized street prices per commodity and their
//! trend buckets.
//!
//! A [`Market`] is always complete. It is backed by a [`CommodityTable`], so
//! every generation covers every commodity in the catalogue and nothing else.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use crate::constants::PRICE_SIGNAL_MARGIN_PCT;
use crate::data::{Commodity, CommodityInfo, CommodityTable};
use crate::numbers::round_f64_to_u32;

/// Expected direction of a price given where it sits in its static range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Cheap now, expected to rise
    Up,
    /// Expensive now, expected to fall
    Down,
    Stable,
}

impl Trend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the current price compares to the midpoint of the static range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSignal {
    Bargain,
    Fair,
    Premium,
}

/// One commodity's price in a market snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketEntry {
    pub price: u32,
    pub min: u32,
    pub max: u32,
    pub trend: Trend,
}

impl MarketEntry {
    /// Build an entry for `price` against the commodity's static range.
    #[must_use]
    pub fn new(price: u32, info: &CommodityInfo) -> Self {
        Self {
            price,
            min: info.min_price,
            max: info.max_price,
            trend: classify_trend(price, info.min_price, info.max_price),
        }
    }

    /// Midpoint of the static range.
    #[must_use]
    pub fn average_price(&self) -> f64 {
        (f64::from(self.min) + f64::from(self.max)) / 2.0
    }

    /// Percentage the current price sits above (+) or below (-) the midpoint.
    #[must_use]
    pub fn profit_margin_pct(&self) -> f64 {
        profit_margin_pct(self.price, self.average_price())
    }

    #[must_use]
    pub fn price_signal(&self) -> PriceSignal {
        price_signal(self.profit_margin_pct())
    }

    /// Return on buying now and selling back at the midpoint, in percent.
    #[must_use]
    pub fn potential_profit_pct(&self) -> f64 {
        if self.price == 0 {
            return 0.0;
        }
        let price = f64::from(self.price);
        (self.average_price() - price) / price * 100.0
    }
}

/// Complete price table for the city the player is standing in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    entries: CommodityTable<MarketEntry>,
}

impl Market {
    #[must_use]
    pub const fn from_entries(entries: CommodityTable<MarketEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub const fn entry(&self, commodity: Commodity) -> &MarketEntry {
        self.entries.get(commodity)
    }

    #[must_use]
    pub const fn price(&self, commodity: Commodity) -> u32 {
        self.entries.get(commodity).price
    }

    #[must_use]
    pub const fn entries(&self) -> &CommodityTable<MarketEntry> {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (Commodity, &MarketEntry)> {
        self.entries.iter()
    }

    /// Override one price, keeping the static range and re-deriving the trend.
    pub fn set_price(&mut self, commodity: Commodity, price: u32) {
        let entry = self.entries.get_mut(commodity);
        entry.price = price;
        entry.trend = classify_trend(price, entry.min, entry.max);
    }

    /// Cheapest entry by current price.
    #[must_use]
    pub fn cheapest(&self) -> Option<(Commodity, &MarketEntry)> {
        self.iter().min_by_key(|(_, entry)| entry.price)
    }
}

impl Index<Commodity> for Market {
    type Output = MarketEntry;

    fn index(&self, commodity: Commodity) -> &Self::Output {
        self.entry(commodity)
    }
}

/// Draw a price uniformly from the commodity's inclusive range, then apply
/// the regional modifier (if any) and round to the nearest dollar.
///
/// The modified price may land outside `[min, max]`; that is how regional
/// discounts and premiums show up.
#[must_use]
pub fn generate_price(info: &CommodityInfo, modifier: Option<f64>, rng: &mut impl Rng) -> u32 {
    let low = info.min_price.min(info.max_price);
    let high = info.min_price.max(info.max_price);
    let base = rng.gen_range(low..=high);
    match modifier {
        Some(multiplier) => round_f64_to_u32(f64::from(base) * multiplier),
        None => base,
    }
}

/// Bucket a price into the low, middle or high third of its static range.
///
/// Lower band is strict (`price < min + range/3` is `Up`), upper band is strict
/// (`price > max - range/3` is `Down`); boundary values fall into `Stable`.
#[must_use]
pub fn classify_trend(price: u32, min: u32, max: u32) -> Trend {
    let price = f64::from(price);
    let (min, max) = (f64::from(min), f64::from(max));
    let third_of_range = (max - min) / 3.0;
    if price < min + third_of_range {
        Trend::Up
    } else if price > max - third_of_range {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Generate a fresh price for every commodity, applying city modifiers
/// where present.
#[must_use]
pub fn generate_market(
    commodities: &CommodityTable<CommodityInfo>,
    modifiers: Option<&BTreeMap<Commodity, f64>>,
    rng: &mut impl Rng,
) -> Market {
    let entries = commodities.map(|commodity, info| {
        let modifier = modifiers.and_then(|mods| mods.get(&commodity).copied());
        let price = generate_price(info, modifier, rng);
        MarketEntry::new(price, info)
    });
    log::debug!(
        "generated market with {} regional modifier(s)",
        modifiers.map_or(0, BTreeMap::len)
    );
    Market::from_entries(entries)
}

/// Percentage difference between a price and a reference average.
#[must_use]
pub fn profit_margin_pct(price: u32, average: f64) -> f64 {
    if average <= 0.0 {
        return 0.0;
    }
    (f64::from(price) - average) / average * 100.0
}

#[must_use]
pub fn price_signal(margin_pct: f64) -> PriceSignal {
    if margin_pct <= -PRICE_SIGNAL_MARGIN_PCT {
        PriceSignal::Bargain
    } else if margin_pct >= PRICE_SIGNAL_MARGIN_PCT {
        PriceSignal::Premium
    } else {
        PriceSignal::Fair
    }
}
