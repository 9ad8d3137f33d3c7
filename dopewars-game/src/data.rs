//! Immutable reference data: the commodity catalogue and the city list.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::{Index, IndexMut};
use thiserror::Error;

use crate::constants::{
    ACID_HEAT, ACID_PRICE_RANGE, ACID_WEIGHT_KG, COCAINE_HEAT, COCAINE_PRICE_RANGE,
    COCAINE_WEIGHT_KG, HEROIN_HEAT, HEROIN_PRICE_RANGE, HEROIN_WEIGHT_KG, LUDES_HEAT,
    LUDES_PRICE_RANGE, LUDES_WEIGHT_KG, RISK_LEVEL_HIGH_ABOVE, RISK_LEVEL_MEDIUM_ABOVE, SPEED_HEAT,
    SPEED_PRICE_RANGE, SPEED_WEIGHT_KG, WEED_HEAT, WEED_PRICE_RANGE, WEED_WEIGHT_KG,
};
use crate::numbers::round_f64_to_u32;

/// A tradable good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Commodity {
    Cocaine,
    Heroin,
    Acid,
    Weed,
    Speed,
    Ludes,
}

impl Commodity {
    pub const COUNT: usize = 6;

    /// Every commodity in canonical order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Cocaine,
        Self::Heroin,
        Self::Acid,
        Self::Weed,
        Self::Speed,
        Self::Ludes,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Cocaine => 0,
            Self::Heroin => 1,
            Self::Acid => 2,
            Self::Weed => 3,
            Self::Speed => 4,
            Self::Ludes => 5,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cocaine => "Cocaine",
            Self::Heroin => "Heroin",
            Self::Acid => "Acid",
            Self::Weed => "Weed",
            Self::Speed => "Speed",
            Self::Ludes => "Ludes",
        }
    }

    /// Case-insensitive lookup by display name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|commodity| commodity.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Commodity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed table holding exactly one value per commodity.
///
/// The backing array is sized by [`Commodity::COUNT`], so a table can never
/// be partial and can never hold a commodity outside the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommodityTable<T>([T; Commodity::COUNT]);

impl<T> CommodityTable<T> {
    /// Build a table by evaluating `f` for every commodity in canonical order.
    pub fn from_fn(mut f: impl FnMut(Commodity) -> T) -> Self {
        Self(Commodity::ALL.map(&mut f))
    }

    #[must_use]
    pub const fn get(&self, commodity: Commodity) -> &T {
        &self.0[commodity.index()]
    }

    pub const fn get_mut(&mut self, commodity: Commodity) -> &mut T {
        &mut self.0[commodity.index()]
    }

    /// Iterate `(commodity, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Commodity, &T)> {
        Commodity::ALL.into_iter().zip(self.0.iter())
    }

    pub fn values(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    #[must_use]
    pub fn map<U>(&self, mut f: impl FnMut(Commodity, &T) -> U) -> CommodityTable<U> {
        CommodityTable::from_fn(|commodity| f(commodity, self.get(commodity)))
    }
}

impl<T: Default> Default for CommodityTable<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Commodity> for CommodityTable<T> {
    type Output = T;

    fn index(&self, commodity: Commodity) -> &Self::Output {
        self.get(commodity)
    }
}

impl<T> IndexMut<Commodity> for CommodityTable<T> {
    fn index_mut(&mut self, commodity: Commodity) -> &mut Self::Output {
        self.get_mut(commodity)
    }
}

/// Static attributes of a commodity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommodityInfo {
    pub min_price: u32,
    pub max_price: u32,
    /// Carry weight per unit in kilograms
    #[serde(default)]
    pub weight_kg: f64,
    /// Police attention drawn per unit held
    #[serde(default)]
    pub heat: u32,
}

impl CommodityInfo {
    #[must_use]
    pub const fn new(range: (u32, u32), weight_kg: f64, heat: u32) -> Self {
        Self {
            min_price: range.0,
            max_price: range.1,
            weight_kg,
            heat,
        }
    }
}

/// Closed set of locations the player can travel between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CityId {
    Bronx,
    Brooklyn,
    Manhattan,
    Queens,
    StatenIsland,
    CentralPark,
}

impl CityId {
    pub const ALL: [Self; 6] = [
        Self::Bronx,
        Self::Brooklyn,
        Self::Manhattan,
        Self::Queens,
        Self::StatenIsland,
        Self::CentralPark,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Bronx => "bronx",
            Self::Brooklyn => "brooklyn",
            Self::Manhattan => "manhattan",
            Self::Queens => "queens",
            Self::StatenIsland => "staten_island",
            Self::CentralPark => "central_park",
        }
    }
}

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Coarse police presence band for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    #[must_use]
    pub fn from_risk(risk: f64) -> Self {
        if risk > RISK_LEVEL_HIGH_ABOVE {
            Self::High
        } else if risk > RISK_LEVEL_MEDIUM_ABOVE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A location with its own regional price modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    /// Display name, also the lookup key for travel
    pub name: String,
    /// Police presence in `[0, 1]`; informational only
    pub risk: f64,
    /// Per-commodity price multipliers (< 1.0 is a discount)
    #[serde(default)]
    pub modifiers: BTreeMap<Commodity, f64>,
}

impl City {
    #[must_use]
    pub fn new(id: CityId, name: &str, risk: f64, modifiers: &[(Commodity, f64)]) -> Self {
        Self {
            id,
            name: name.to_string(),
            risk,
            modifiers: modifiers.iter().copied().collect(),
        }
    }

    #[must_use]
    pub fn modifier(&self, commodity: Commodity) -> Option<f64> {
        self.modifiers.get(&commodity).copied()
    }

    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_risk(self.risk)
    }
}

/// Errors raised while loading or validating reference data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("reference data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("commodity {0} has no price range")]
    MissingCommodity(Commodity),
    #[error("{commodity} price range invalid (min {min}, max {max})")]
    InvalidPriceRange {
        commodity: Commodity,
        min: u32,
        max: u32,
    },
    #[error("{commodity} weight must be finite and non-negative (got {weight})")]
    InvalidWeight { commodity: Commodity, weight: f64 },
    #[error("at least one city is required")]
    NoCities,
    #[error("city {0} is defined more than once")]
    DuplicateCity(String),
    #[error("city {city} risk must be between 0 and 1 (got {risk})")]
    RiskOutOfRange { city: String, risk: f64 },
    #[error("city {city} has invalid {commodity} modifier {modifier}")]
    InvalidModifier {
        city: String,
        commodity: Commodity,
        modifier: f64,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct RawReferenceData {
    commodities: BTreeMap<Commodity, CommodityInfo>,
    cities: Vec<City>,
}

/// Complete reference tables, validated once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceData {
    commodities: CommodityTable<CommodityInfo>,
    cities: Vec<City>,
}

impl ReferenceData {
    /// The stock catalogue: six goods across the five boroughs plus the park.
    #[must_use]
    pub fn builtin() -> Self {
        let commodities = CommodityTable::from_fn(|commodity| match commodity {
            Commodity::Cocaine => {
                CommodityInfo::new(COCAINE_PRICE_RANGE, COCAINE_WEIGHT_KG, COCAINE_HEAT)
            }
            Commodity::Heroin => {
                CommodityInfo::new(HEROIN_PRICE_RANGE, HEROIN_WEIGHT_KG, HEROIN_HEAT)
            }
            Commodity::Acid => CommodityInfo::new(ACID_PRICE_RANGE, ACID_WEIGHT_KG, ACID_HEAT),
            Commodity::Weed => CommodityInfo::new(WEED_PRICE_RANGE, WEED_WEIGHT_KG, WEED_HEAT),
            Commodity::Speed => CommodityInfo::new(SPEED_PRICE_RANGE, SPEED_WEIGHT_KG, SPEED_HEAT),
            Commodity::Ludes => CommodityInfo::new(LUDES_PRICE_RANGE, LUDES_WEIGHT_KG, LUDES_HEAT),
        });
        let cities = vec![
            City::new(CityId::Bronx, "Bronx", 0.3, &[(Commodity::Heroin, 0.8)]),
            City::new(CityId::Brooklyn, "Brooklyn", 0.2, &[(Commodity::Weed, 0.9)]),
            City::new(CityId::Manhattan, "Manhattan", 0.4, &[(Commodity::Cocaine, 0.85)]),
            City::new(CityId::Queens, "Queens", 0.2, &[(Commodity::Ludes, 0.9)]),
            City::new(
                CityId::StatenIsland,
                "Staten Island",
                0.1,
                &[(Commodity::Speed, 0.9)],
            ),
            City::new(
                CityId::CentralPark,
                "Central Park",
                0.5,
                &[(Commodity::Acid, 0.8)],
            ),
        ];
        Self {
            commodities,
            cities,
        }
    }

    /// Build reference data from parts, validating every table.
    ///
    /// # Errors
    ///
    /// Returns an error if any price range, weight, risk or modifier is out of
    /// bounds, or if the city list is empty or contains duplicates.
    pub fn new(
        commodities: CommodityTable<CommodityInfo>,
        cities: Vec<City>,
    ) -> Result<Self, DataError> {
        let data = Self {
            commodities,
            cities,
        };
        data.validate()?;
        Ok(data)
    }

    /// Load reference data from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed, a commodity is missing,
    /// or validation fails.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let raw: RawReferenceData = serde_json::from_str(json)?;
        if let Some(missing) = Commodity::ALL
            .into_iter()
            .find(|commodity| !raw.commodities.contains_key(commodity))
        {
            return Err(DataError::MissingCommodity(missing));
        }
        let commodities = CommodityTable::from_fn(|commodity| raw.commodities[&commodity]);
        Self::new(commodities, raw.cities)
    }

    /// Pretty JSON in the same shape [`ReferenceData::from_json`] reads.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, DataError> {
        let raw = RawReferenceData {
            commodities: self.commodities.iter().map(|(c, info)| (c, *info)).collect(),
            cities: self.cities.clone(),
        };
        Ok(serde_json::to_string_pretty(&raw)?)
    }

    fn validate(&self) -> Result<(), DataError> {
        for (commodity, info) in self.commodities.iter() {
            if info.min_price == 0 || info.min_price >= info.max_price {
                return Err(DataError::InvalidPriceRange {
                    commodity,
                    min: info.min_price,
                    max: info.max_price,
                });
            }
            if !info.weight_kg.is_finite() || info.weight_kg < 0.0 {
                return Err(DataError::InvalidWeight {
                    commodity,
                    weight: info.weight_kg,
                });
            }
        }

        if self.cities.is_empty() {
            return Err(DataError::NoCities);
        }
        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for city in &self.cities {
            if !names.insert(city.name.as_str()) || !ids.insert(city.id) {
                return Err(DataError::DuplicateCity(city.name.clone()));
            }
            if !(0.0..=1.0).contains(&city.risk) {
                return Err(DataError::RiskOutOfRange {
                    city: city.name.clone(),
                    risk: city.risk,
                });
            }
            for (&commodity, &modifier) in &city.modifiers {
                // The cheapest draw must still cost at least a dollar after the discount.
                let floor_price = f64::from(self.commodities[commodity].min_price) * modifier;
                if !modifier.is_finite() || modifier <= 0.0 || round_f64_to_u32(floor_price) == 0 {
                    return Err(DataError::InvalidModifier {
                        city: city.name.clone(),
                        commodity,
                        modifier,
                    });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub const fn commodities(&self) -> &CommodityTable<CommodityInfo> {
        &self.commodities
    }

    #[must_use]
    pub const fn commodity(&self, commodity: Commodity) -> &CommodityInfo {
        self.commodities.get(commodity)
    }

    #[must_use]
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    /// Starting location for every new game.
    #[must_use]
    pub fn first_city(&self) -> &City {
        // Construction guarantees a non-empty city list.
        &self.cities[0]
    }

    #[must_use]
    pub fn city_by_name(&self, name: &str) -> Option<&City> {
        self.cities.iter().find(|city| city.name == name)
    }

    #[must_use]
    pub fn city(&self, id: CityId) -> Option<&City> {
        self.cities.iter().find(|city| city.id == id)
    }
}

impl Default for ReferenceData {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_are_valid() {
        let data = ReferenceData::builtin();
        data.validate().unwrap();
        assert_eq!(data.cities().len(), 6);
        assert_eq!(data.first_city().name, "Bronx");
        assert_eq!(data.commodity(Commodity::Weed).min_price, 300);
        assert_eq!(data.commodity(Commodity::Weed).max_price, 900);
        assert_eq!(
            data.city_by_name("Central Park").unwrap().modifier(Commodity::Acid),
            Some(0.8)
        );
        assert!(data.city_by_name("Hoboken").is_none());
    }

    #[test]
    fn commodity_table_covers_every_commodity() {
        let table = CommodityTable::from_fn(Commodity::index);
        let seen: Vec<_> = table.iter().map(|(commodity, idx)| (commodity, *idx)).collect();
        assert_eq!(seen.len(), Commodity::COUNT);
        for (commodity, idx) in seen {
            assert_eq!(commodity.index(), idx);
        }
    }

    #[test]
    fn commodity_names_parse_case_insensitively() {
        assert_eq!(Commodity::from_name(" weed "), Some(Commodity::Weed));
        assert_eq!(Commodity::from_name("LUDES"), Some(Commodity::Ludes));
        assert_eq!(Commodity::from_name("tea"), None);
    }

    #[test]
    fn reference_data_from_json() {
        let json = r#"{
            "commodities": {
                "Cocaine": { "min_price": 100, "max_price": 400 },
                "Heroin": { "min_price": 50, "max_price": 80, "weight_kg": 0.8, "heat": 10 },
                "Acid": { "min_price": 10, "max_price": 45 },
                "Weed": { "min_price": 3, "max_price": 9 },
                "Speed": { "min_price": 1, "max_price": 2 },
                "Ludes": { "min_price": 1, "max_price": 6 }
            },
            "cities": [
                { "id": "queens", "name": "Queens", "risk": 0.2, "modifiers": { "Ludes": 0.9 } },
                { "id": "bronx", "name": "Bronx", "risk": 0.3 }
            ]
        }"#;
        let data = ReferenceData::from_json(json).unwrap();
        assert_eq!(data.first_city().id, CityId::Queens);
        assert_eq!(data.commodity(Commodity::Cocaine).max_price, 400);
        assert_eq!(data.commodity(Commodity::Heroin).heat, 10);
        assert!(data.city(CityId::Bronx).unwrap().modifiers.is_empty());
    }

    #[test]
    fn reference_data_rejects_missing_commodity() {
        let json = r#"{
            "commodities": { "Cocaine": { "min_price": 100, "max_price": 400 } },
            "cities": [ { "id": "bronx", "name": "Bronx", "risk": 0.3 } ]
        }"#;
        let err = ReferenceData::from_json(json).unwrap_err();
        assert!(matches!(err, DataError::MissingCommodity(Commodity::Heroin)));
    }

    #[test]
    fn reference_data_rejects_bad_tables() {
        let builtin = ReferenceData::builtin();

        let mut ranges = *builtin.commodities();
        ranges[Commodity::Speed].min_price = 300;
        let err = ReferenceData::new(ranges, builtin.cities().to_vec()).unwrap_err();
        assert!(matches!(
            err,
            DataError::InvalidPriceRange {
                commodity: Commodity::Speed,
                ..
            }
        ));

        let err = ReferenceData::new(*builtin.commodities(), Vec::new()).unwrap_err();
        assert!(matches!(err, DataError::NoCities));

        let mut cities = builtin.cities().to_vec();
        cities.push(cities[0].clone());
        let err = ReferenceData::new(*builtin.commodities(), cities).unwrap_err();
        assert!(matches!(err, DataError::DuplicateCity(name) if name == "Bronx"));

        let mut cities = builtin.cities().to_vec();
        cities[1].risk = 1.5;
        let err = ReferenceData::new(*builtin.commodities(), cities).unwrap_err();
        assert!(matches!(err, DataError::RiskOutOfRange { .. }));

        let mut cities = builtin.cities().to_vec();
        cities[2].modifiers.insert(Commodity::Weed, 0.0);
        let err = ReferenceData::new(*builtin.commodities(), cities).unwrap_err();
        assert!(matches!(err, DataError::InvalidModifier { .. }));
    }

    #[test]
    fn risk_levels_band_the_builtin_cities() {
        let data = ReferenceData::builtin();
        let level = |name: &str| data.city_by_name(name).unwrap().risk_level();
        assert_eq!(level("Central Park"), RiskLevel::High);
        assert_eq!(level("Manhattan"), RiskLevel::Medium);
        assert_eq!(level("Bronx"), RiskLevel::Medium);
        assert_eq!(level("Brooklyn"), RiskLevel::Low);
        assert_eq!(level("Queens"), RiskLevel::Low);
        assert_eq!(level("Staten Island"), RiskLevel::Low);
        assert_eq!(RiskLevel::from_risk(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::High.to_string(), "high");
    }

    #[test]
    fn modifiers_that_could_price_goods_at_zero_are_rejected() {
        let builtin = ReferenceData::builtin();

        // Ludes start at $10; 10 * 0.01 rounds to 0.
        let mut cities = builtin.cities().to_vec();
        cities[0].modifiers.insert(Commodity::Ludes, 0.01);
        let err = ReferenceData::new(*builtin.commodities(), cities).unwrap_err();
        assert!(matches!(
            err,
            DataError::InvalidModifier {
                commodity: Commodity::Ludes,
                ref city,
                ..
            } if city == "Bronx"
        ));

        // 10 * 0.05 rounds up to $1, which is still a price.
        let mut cities = builtin.cities().to_vec();
        cities[0].modifiers.insert(Commodity::Ludes, 0.05);
        assert!(ReferenceData::new(*builtin.commodities(), cities).is_ok());
    }
}
