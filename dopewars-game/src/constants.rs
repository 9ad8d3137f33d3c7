//! Centralized balance and tuning constants for the trading economy.
//!
//! Starting values, reference price ranges and the display thresholds
//! used by the analytics helpers all live here so balance can only be
//! adjusted through reviewed code changes.

// Session defaults ---------------------------------------------------------
pub const STARTING_CASH: u64 = 2_000;
pub const STARTING_BANK: u64 = 0;
pub const STARTING_DEBT: u64 = 5_500;
pub const TOTAL_DAYS: u32 = 30;
pub const DEFAULT_PLAYER_NAME: &str = "Anonymous";
pub const EVENT_LOG_CAPACITY: usize = 20;

// Interest -----------------------------------------------------------------
/// Loan shark terms: 10% per week, quoted per day.
pub const REFERENCE_WEEKLY_INTEREST_RATE: f64 = 0.1;
pub const REFERENCE_DAILY_INTEREST_RATE: f64 = REFERENCE_WEEKLY_INTEREST_RATE / 7.0;

// Reference price ranges (whole dollars) -----------------------------------
pub(crate) const COCAINE_PRICE_RANGE: (u32, u32) = (15_000, 30_000);
pub(crate) const HEROIN_PRICE_RANGE: (u32, u32) = (5_000, 14_000);
pub(crate) const ACID_PRICE_RANGE: (u32, u32) = (1_000, 4_500);
pub(crate) const WEED_PRICE_RANGE: (u32, u32) = (300, 900);
pub(crate) const SPEED_PRICE_RANGE: (u32, u32) = (100, 250);
pub(crate) const LUDES_PRICE_RANGE: (u32, u32) = (10, 60);

// Per-unit carry weight in kilograms ---------------------------------------
pub(crate) const COCAINE_WEIGHT_KG: f64 = 1.0;
pub(crate) const HEROIN_WEIGHT_KG: f64 = 0.8;
pub(crate) const ACID_WEIGHT_KG: f64 = 0.01;
pub(crate) const WEED_WEIGHT_KG: f64 = 0.5;
pub(crate) const SPEED_WEIGHT_KG: f64 = 0.1;
pub(crate) const LUDES_WEIGHT_KG: f64 = 0.05;

// Per-unit heat ------------------------------------------------------------
pub(crate) const COCAINE_HEAT: u32 = 8;
pub(crate) const HEROIN_HEAT: u32 = 10;
pub(crate) const ACID_HEAT: u32 = 6;
pub(crate) const WEED_HEAT: u32 = 3;
pub(crate) const SPEED_HEAT: u32 = 5;
pub(crate) const LUDES_HEAT: u32 = 2;

// Stash thresholds ---------------------------------------------------------
pub const CARRY_CAPACITY_KG: f64 = 50.0;
pub(crate) const CAPACITY_FILLING_PCT: f64 = 50.0;
pub(crate) const CAPACITY_ALMOST_FULL_PCT: f64 = 80.0;
pub(crate) const CAPACITY_FULL_PCT: f64 = 100.0;
pub(crate) const HEAT_LOW_MAX: u64 = 10;
pub(crate) const HEAT_MEDIUM_MAX: u64 = 50;

// Ledger thresholds --------------------------------------------------------
pub(crate) const HIGH_DEBT_THRESHOLD: u64 = 10_000;
pub(crate) const PRICE_SIGNAL_MARGIN_PCT: f64 = 15.0;
/// Cities above this risk warn about police activity in the event feed.
pub(crate) const HIGH_RISK_THRESHOLD: f64 = 0.3;
/// Risk bands shown next to a city: above 0.4 is high, above 0.2 medium.
pub(crate) const RISK_LEVEL_HIGH_ABOVE: f64 = 0.4;
pub(crate) const RISK_LEVEL_MEDIUM_ABOVE: f64 = 0.2;
