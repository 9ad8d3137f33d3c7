//! Dopewars Game Engine
//!
//! Platform-agnostic economy core for a buy-low, sell-high street trading
//! game: the market price generator and the session state machine, plus the
//! read-only analytics a front end displays. No I/O and no UI dependencies.

pub mod config;
pub mod constants;
pub mod data;
pub mod events;
pub mod invariants;
pub mod ledger;
pub mod market;
pub mod numbers;
pub mod player;
pub mod result;
pub mod rng;
pub mod session;
pub mod stash;

// Re-export commonly used types
pub use config::{ConfigError, EconomyConfig};
pub use data::{
    City, CityId, Commodity, CommodityInfo, CommodityTable, DataError, ReferenceData, RiskLevel,
};
pub use events::{EventFeed, EventKind, GameEvent};
pub use invariants::{InvariantViolation, check_day_step, check_invariants};
pub use ledger::DebtStatus;
pub use market::{
    Market, MarketEntry, PriceSignal, Trend, classify_trend, generate_market, generate_price,
};
pub use player::{Inventory, Player};
pub use result::RunSummary;
pub use rng::MarketRng;
pub use session::{Account, ActionError, DayOutcome, GameSession, TradeReceipt, TradeSide};
pub use stash::{CapacityStatus, HeatLevel, StashReport};

/// Source of reference tables and economy settings.
/// Front ends provide this for wherever they keep their data.
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the commodity and city tables.
    ///
    /// # Errors
    ///
    /// Returns an error if the tables cannot be read or fail validation.
    fn load_reference_data(&self) -> Result<ReferenceData, Self::Error>;

    /// Load the economy configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or fails validation.
    fn load_economy_config(&self) -> Result<EconomyConfig, Self::Error>;
}

/// Loader for the compiled-in tables and stock configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinData;

impl DataLoader for BuiltinData {
    type Error = std::convert::Infallible;

    fn load_reference_data(&self) -> Result<ReferenceData, Self::Error> {
        Ok(ReferenceData::builtin())
    }

    fn load_economy_config(&self) -> Result<EconomyConfig, Self::Error> {
        Ok(EconomyConfig::default())
    }
}

/// Errors raised while assembling a session from a [`DataLoader`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError<E: std::error::Error + Send + Sync + 'static> {
    #[error("failed to load game data: {0}")]
    Load(#[source] E),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Builds sessions from whatever a [`DataLoader`] provides.
pub struct GameEngine<L>
where
    L: DataLoader,
{
    data_loader: L,
}

impl<L> GameEngine<L>
where
    L: DataLoader,
{
    pub const fn new(data_loader: L) -> Self {
        Self { data_loader }
    }

    /// Create a session whose markets follow `seed`, or OS entropy when `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the configuration is invalid.
    pub fn create_session(&self, seed: Option<u64>) -> Result<GameSession, EngineError<L::Error>> {
        let data = self
            .data_loader
            .load_reference_data()
            .map_err(EngineError::Load)?;
        let config = self
            .data_loader
            .load_economy_config()
            .map_err(EngineError::Load)?;
        let rng = seed.map_or_else(MarketRng::from_entropy, MarketRng::from_user_seed);
        Ok(GameSession::with_config(config, data, rng)?)
    }
}
