//! The game state machine.
//!
//! [`GameSession`] owns the player, the reference tables, the current
//! market and the terminal flag. Every command validates first and only then
//! mutates, so a rejected command leaves the player, market, day counter
//! and terminal flag exactly as they were.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, EconomyConfig};
use crate::constants::HIGH_RISK_THRESHOLD;
use crate::data::{City, CityId, Commodity, ReferenceData};
use crate::events::{EventFeed, EventKind};
use crate::invariants::{self, InvariantViolation};
use crate::ledger::{self, DebtStatus};
use crate::market::{Market, generate_market};
use crate::numbers::{format_money, u64_to_i64};
use crate::player::Player;
use crate::rng::MarketRng;
use crate::stash::StashReport;

/// Why a command was refused. State is untouched whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("amount must be at least $1")]
    InvalidAmount,
    #[error("insufficient funds: need ${needed}, have ${available}")]
    InsufficientFunds { needed: u64, available: u64 },
    #[error("insufficient bank balance: requested ${requested}, balance ${available}")]
    InsufficientBankBalance { requested: u64, available: u64 },
    #[error("insufficient {commodity}: requested {requested}, holding {held}")]
    InsufficientInventory {
        commodity: Commodity,
        requested: u32,
        held: u32,
    },
    #[error("unknown city: {name}")]
    UnknownCity { name: String },
    #[error("cannot hold {requested} more {commodity} on top of {held}")]
    StashLimit {
        commodity: Commodity,
        requested: u32,
        held: u32,
    },
    #[error("{account} balance cannot take another ${amount}")]
    BalanceLimit { account: Account, amount: u64 },
}

/// Money slot a [`ActionError::BalanceLimit`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Account {
    Cash,
    Bank,
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Cash => "cash",
            Self::Bank => "bank",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Settled trade details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub side: TradeSide,
    pub commodity: Commodity,
    pub quantity: u32,
    pub unit_price: u32,
    pub total: u64,
    /// Units held after the trade
    pub held: u32,
}

/// Result of advancing the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayOutcome {
    /// A new day began with fresh prices.
    Advanced { days_left: u32, interest_charged: u64 },
    /// The final day ended. Nothing but the terminal flag changed.
    GameOver,
}

impl DayOutcome {
    #[must_use]
    pub const fn is_game_over(self) -> bool {
        matches!(self, Self::GameOver)
    }
}

#[derive(Debug, Clone)]
pub struct GameSession {
    config: EconomyConfig,
    data: ReferenceData,
    player: Player,
    city_index: usize,
    market: Market,
    game_over: bool,
    rng: MarketRng,
    events: EventFeed,
    markets_generated: u64,
}

impl GameSession {
    /// Stock economy with an unseeded random source.
    #[must_use]
    pub fn new() -> Self {
        Self::build(
            EconomyConfig::default(),
            ReferenceData::builtin(),
            MarketRng::from_entropy(),
        )
    }

    /// Stock economy with a reproducible market stream.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::build(
            EconomyConfig::default(),
            ReferenceData::builtin(),
            MarketRng::from_user_seed(seed),
        )
    }

    /// Custom economy and reference tables.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn with_config(
        config: EconomyConfig,
        data: ReferenceData,
        rng: MarketRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, data, rng))
    }

    fn build(config: EconomyConfig, data: ReferenceData, mut rng: MarketRng) -> Self {
        let player = Player::new(&config, &data);
        let market = generate_market(data.commodities(), Some(&data.first_city().modifiers), &mut rng);
        let events = EventFeed::with_capacity(config.event_log_capacity);
        Self {
            config,
            data,
            player,
            city_index: 0,
            market,
            game_over: false,
            rng,
            events,
            markets_generated: 1,
        }
    }

    // Queries ---------------------------------------------------------------

    #[must_use]
    pub const fn player(&self) -> &Player {
        &self.player
    }

    #[must_use]
    pub fn current_city(&self) -> &City {
        &self.data.cities()[self.city_index]
    }

    #[must_use]
    pub const fn market(&self) -> &Market {
        &self.market
    }

    #[must_use]
    pub const fn game_over(&self) -> bool {
        self.game_over
    }

    #[must_use]
    pub fn cities(&self) -> &[City] {
        self.data.cities()
    }

    #[must_use]
    pub const fn config(&self) -> &EconomyConfig {
        &self.config
    }

    #[must_use]
    pub const fn data(&self) -> &ReferenceData {
        &self.data
    }

    #[must_use]
    pub const fn events(&self) -> &EventFeed {
        &self.events
    }

    #[must_use]
    pub const fn rng(&self) -> &MarketRng {
        &self.rng
    }

    /// Number of markets generated over the session's lifetime.
    #[must_use]
    pub const fn markets_generated(&self) -> u64 {
        self.markets_generated
    }

    #[must_use]
    pub const fn day_number(&self) -> u32 {
        ledger::day_number(self.player.days_left, self.config.total_days)
    }

    #[must_use]
    pub fn net_worth(&self) -> i64 {
        ledger::net_worth(&self.player)
    }

    #[must_use]
    pub fn inventory_value(&self) -> u64 {
        ledger::inventory_value(&self.player.inventory, &self.market)
    }

    #[must_use]
    pub const fn debt_status(&self) -> DebtStatus {
        DebtStatus::from_debt(self.player.debt)
    }

    #[must_use]
    pub fn stash_report(&self) -> StashReport {
        StashReport::build(
            &self.player.inventory,
            self.data.commodities(),
            self.config.carry_capacity_kg,
        )
    }

    /// Most units of `commodity` the player can pay for right now.
    #[must_use]
    pub fn max_affordable(&self, commodity: Commodity) -> u64 {
        ledger::max_affordable(self.player.cash, self.market.price(commodity))
    }

    /// Every state invariant currently broken; empty for a healthy session.
    #[must_use]
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        invariants::check_invariants(self)
    }

    /// Direct access to the player for scenario setup. Bypasses validation.
    #[doc(hidden)]
    pub const fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Direct access to the market for scenario setup. Bypasses validation.
    #[doc(hidden)]
    pub const fn market_mut(&mut self) -> &mut Market {
        &mut self.market
    }

    // Commands --------------------------------------------------------------

    /// Begin a run in the first city with a fresh market.
    ///
    /// Balances, stash and day counter keep whatever values the session
    /// was built with. A blank name falls back to the configured default.
    pub fn start_game(&mut self, name: &str) {
        let name = name.trim();
        self.player.name = if name.is_empty() {
            self.config.default_player_name.clone()
        } else {
            name.to_string()
        };
        self.city_index = 0;
        self.player.location.clone_from(&self.data.first_city().name);
        self.game_over = false;
        self.regenerate_market();
        log::info!(
            "game started for {} in {}",
            self.player.name,
            self.player.location
        );
        self.seed_events();
    }

    /// Advance one day.
    ///
    /// On the last day this only raises the terminal flag: the day counter,
    /// market and balances are left alone.
    pub fn next_day(&mut self) -> DayOutcome {
        if self.player.days_left <= 1 {
            if !self.game_over {
                log::info!("final day over, net worth {}", self.net_worth());
                self.record(
                    EventKind::Alert,
                    format!(
                        "Time's up. Final net worth {}.",
                        format_money(self.net_worth())
                    ),
                );
            }
            self.game_over = true;
            return DayOutcome::GameOver;
        }

        self.player.days_left -= 1;
        self.regenerate_market();
        let interest_charged = self.accrue_interest();
        log::debug!(
            "day {} began, {} day(s) left",
            self.day_number(),
            self.player.days_left
        );
        let message = if interest_charged > 0 {
            format!(
                "New day. Prices updated. Interest added: {}.",
                format_money(u64_to_i64(interest_charged))
            )
        } else {
            "New day. Prices updated.".to_string()
        };
        self.record(EventKind::Info, message);
        DayOutcome::Advanced {
            days_left: self.player.days_left,
            interest_charged,
        }
    }

    /// Buy `quantity` units at the current market price.
    ///
    /// # Errors
    ///
    /// [`ActionError::InvalidQuantity`] for zero units,
    /// [`ActionError::InsufficientFunds`] when cash does not cover the cost
    /// and [`ActionError::StashLimit`] when the slot cannot count that high.
    pub fn buy(&mut self, commodity: Commodity, quantity: u32) -> Result<TradeReceipt, ActionError> {
        let receipt = self.check_buy(commodity, quantity);
        let receipt = self.settle(receipt)?;
        self.player.cash -= receipt.total;
        self.player.inventory[commodity] = receipt.held;
        self.record(
            EventKind::Success,
            format!(
                "Bought {quantity} {commodity} for {}.",
                format_money(u64_to_i64(receipt.total))
            ),
        );
        Ok(receipt)
    }

    /// Sell `quantity` units at the current market price.
    ///
    /// # Errors
    ///
    /// [`ActionError::InvalidQuantity`] for zero units,
    /// [`ActionError::InsufficientInventory`] when the stash is short and
    /// [`ActionError::BalanceLimit`] when cash cannot hold the proceeds.
    pub fn sell(&mut self, commodity: Commodity, quantity: u32) -> Result<TradeReceipt, ActionError> {
        let receipt = self.check_sell(commodity, quantity);
        let receipt = self.settle(receipt)?;
        self.player.cash += receipt.total;
        self.player.inventory[commodity] = receipt.held;
        self.record(
            EventKind::Success,
            format!(
                "Sold {quantity} {commodity} for {}.",
                format_money(u64_to_i64(receipt.total))
            ),
        );
        Ok(receipt)
    }

    /// Travel to the city with exactly this display name.
    ///
    /// # Errors
    ///
    /// [`ActionError::UnknownCity`] when no city carries the name.
    pub fn travel(&mut self, city_name: &str) -> Result<CityId, ActionError> {
        let index = self
            .data
            .cities()
            .iter()
            .position(|city| city.name == city_name)
            .ok_or_else(|| ActionError::UnknownCity {
                name: city_name.to_string(),
            });
        let index = self.settle(index)?;
        Ok(self.move_to(index))
    }

    /// Travel by identifier.
    ///
    /// # Errors
    ///
    /// [`ActionError::UnknownCity`] when the loaded tables lack the city.
    pub fn travel_to(&mut self, id: CityId) -> Result<CityId, ActionError> {
        let index = self
            .data
            .cities()
            .iter()
            .position(|city| city.id == id)
            .ok_or_else(|| ActionError::UnknownCity {
                name: id.key().to_string(),
            });
        let index = self.settle(index)?;
        Ok(self.move_to(index))
    }

    /// Move cash into the bank.
    ///
    /// # Errors
    ///
    /// [`ActionError::InvalidAmount`] for zero,
    /// [`ActionError::InsufficientFunds`] when cash is short and
    /// [`ActionError::BalanceLimit`] when the bank balance would overflow.
    pub fn deposit_cash(&mut self, amount: u64) -> Result<(), ActionError> {
        let checked = Self::check_amount(amount)
            .and_then(|()| self.check_cash(amount))
            .and_then(|()| Self::check_room(self.player.bank, amount, Account::Bank));
        self.settle(checked)?;
        self.player.cash -= amount;
        self.player.bank += amount;
        self.record(
            EventKind::Success,
            format!("Deposited {}.", format_money(u64_to_i64(amount))),
        );
        Ok(())
    }

    /// Move money from the bank into cash.
    ///
    /// # Errors
    ///
    /// [`ActionError::InvalidAmount`] for zero,
    /// [`ActionError::InsufficientBankBalance`] when the balance is short and
    /// [`ActionError::BalanceLimit`] when cash would overflow.
    pub fn withdraw_cash(&mut self, amount: u64) -> Result<(), ActionError> {
        let checked = Self::check_amount(amount).and_then(|()| {
            if self.player.bank < amount {
                Err(ActionError::InsufficientBankBalance {
                    requested: amount,
                    available: self.player.bank,
                })
            } else {
                Self::check_room(self.player.cash, amount, Account::Cash)
            }
        });
        self.settle(checked)?;
        self.player.bank -= amount;
        self.player.cash += amount;
        self.record(
            EventKind::Success,
            format!("Withdrew {}.", format_money(u64_to_i64(amount))),
        );
        Ok(())
    }

    /// Pay down the loan and return how much was applied.
    ///
    /// Cash must cover the full requested `amount`, but only the part that
    /// fits the outstanding debt is taken; the excess stays in cash.
    ///
    /// # Errors
    ///
    /// [`ActionError::InvalidAmount`] for zero and
    /// [`ActionError::InsufficientFunds`] when cash is below `amount`.
    pub fn pay_debt(&mut self, amount: u64) -> Result<u64, ActionError> {
        let checked = Self::check_amount(amount).and_then(|()| self.check_cash(amount));
        self.settle(checked)?;
        let payment = amount.min(self.player.debt);
        self.player.cash -= payment;
        self.player.debt -= payment;
        let message = if self.player.debt == 0 {
            format!(
                "Paid {}. Debt cleared.",
                format_money(u64_to_i64(payment))
            )
        } else {
            format!(
                "Paid {}. Remaining debt {}.",
                format_money(u64_to_i64(payment)),
                format_money(u64_to_i64(self.player.debt))
            )
        };
        self.record(EventKind::Success, message);
        Ok(payment)
    }

    // Internals -------------------------------------------------------------

    fn check_buy(&self, commodity: Commodity, quantity: u32) -> Result<TradeReceipt, ActionError> {
        if quantity == 0 {
            return Err(ActionError::InvalidQuantity);
        }
        let unit_price = self.market.price(commodity);
        let total = u64::from(unit_price) * u64::from(quantity);
        self.check_cash(total)?;
        let held = self.player.inventory[commodity];
        let Some(held_after) = held.checked_add(quantity) else {
            return Err(ActionError::StashLimit {
                commodity,
                requested: quantity,
                held,
            });
        };
        Ok(TradeReceipt {
            side: TradeSide::Buy,
            commodity,
            quantity,
            unit_price,
            total,
            held: held_after,
        })
    }

    fn check_sell(&self, commodity: Commodity, quantity: u32) -> Result<TradeReceipt, ActionError> {
        if quantity == 0 {
            return Err(ActionError::InvalidQuantity);
        }
        let held = self.player.inventory[commodity];
        if held < quantity {
            return Err(ActionError::InsufficientInventory {
                commodity,
                requested: quantity,
                held,
            });
        }
        let unit_price = self.market.price(commodity);
        let total = u64::from(unit_price) * u64::from(quantity);
        Self::check_room(self.player.cash, total, Account::Cash)?;
        Ok(TradeReceipt {
            side: TradeSide::Sell,
            commodity,
            quantity,
            unit_price,
            total,
            held: held - quantity,
        })
    }

    const fn check_amount(amount: u64) -> Result<(), ActionError> {
        if amount == 0 {
            Err(ActionError::InvalidAmount)
        } else {
            Ok(())
        }
    }

    const fn check_room(balance: u64, amount: u64, account: Account) -> Result<(), ActionError> {
        if balance.checked_add(amount).is_none() {
            Err(ActionError::BalanceLimit { account, amount })
        } else {
            Ok(())
        }
    }

    const fn check_cash(&self, needed: u64) -> Result<(), ActionError> {
        if self.player.cash < needed {
            Err(ActionError::InsufficientFunds {
                needed,
                available: self.player.cash,
            })
        } else {
            Ok(())
        }
    }

    /// Log and surface a rejection; pass accepted values through.
    fn settle<T>(&mut self, checked: Result<T, ActionError>) -> Result<T, ActionError> {
        checked.inspect_err(|err| {
            log::warn!("command rejected: {err}");
            self.record(EventKind::Warning, format!("Rejected: {err}."));
        })
    }

    fn move_to(&mut self, index: usize) -> CityId {
        self.city_index = index;
        let city = &self.data.cities()[index];
        let id = city.id;
        self.player.location.clone_from(&city.name);
        self.regenerate_market();
        let message = self.city_greeting();
        self.record(EventKind::Info, message);
        id
    }

    fn regenerate_market(&mut self) {
        let city = &self.data.cities()[self.city_index];
        self.market = generate_market(self.data.commodities(), Some(&city.modifiers), &mut self.rng);
        self.markets_generated = self.markets_generated.saturating_add(1);
        log::debug!(
            "market #{} generated for {}",
            self.markets_generated,
            city.name
        );
    }

    fn accrue_interest(&mut self) -> u64 {
        let Some(rate) = self.config.daily_interest_rate else {
            return 0;
        };
        let interest = ledger::daily_interest(self.player.debt, rate);
        self.player.debt = self.player.debt.saturating_add(interest);
        interest
    }

    fn city_greeting(&self) -> String {
        let city = self.current_city();
        let security = if city.risk > HIGH_RISK_THRESHOLD {
            "CAUTION: High police activity detected."
        } else {
            "Standard security level."
        };
        format!("Connected to {} market. {security}", city.name)
    }

    fn seed_events(&mut self) {
        self.events.clear();
        self.record(
            EventKind::Info,
            "System initialized. Welcome to the street market terminal.",
        );
        let authenticated = format!("User {} authenticated.", self.player.name);
        self.record(EventKind::Info, authenticated);
        let debt = format!(
            "Current debt: {}. Interest accruing at 10% weekly.",
            format_money(u64_to_i64(self.player.debt))
        );
        self.record(EventKind::Warning, debt);
        let greeting = self.city_greeting();
        self.record(EventKind::Info, greeting);
    }

    fn record(&mut self, kind: EventKind, message: impl Into<String>) {
        let day = self.day_number();
        self.events.push(day, kind, message);
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        let mut session = GameSession::with_seed(42);
        session.start_game("tester");
        session
    }

    #[test]
    fn start_game_sets_name_and_first_city() {
        let mut session = GameSession::with_seed(1);
        session.start_game("  ");
        assert_eq!(session.player().name, "Anonymous");
        assert_eq!(session.player().location, "Bronx");
        assert_eq!(session.current_city().id, CityId::Bronx);
        assert!(!session.game_over());
        assert_eq!(session.player().cash, 2_000);
        assert_eq!(session.player().debt, 5_500);
        assert_eq!(session.player().days_left, 30);
        assert_eq!(session.markets_generated(), 2);
    }

    #[test]
    fn start_game_seeds_the_feed() {
        let session = session();
        let messages: Vec<&str> = session.events().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], "Connected to Bronx market. Standard security level.");
        assert_eq!(messages[1], "Current debt: $5,500. Interest accruing at 10% weekly.");
        assert_eq!(messages[2], "User tester authenticated.");
    }

    #[test]
    fn zero_quantities_and_amounts_are_rejected() {
        let mut session = session();
        let before = session.player().clone();
        assert_eq!(session.buy(Commodity::Weed, 0), Err(ActionError::InvalidQuantity));
        assert_eq!(session.sell(Commodity::Weed, 0), Err(ActionError::InvalidQuantity));
        assert_eq!(session.deposit_cash(0), Err(ActionError::InvalidAmount));
        assert_eq!(session.withdraw_cash(0), Err(ActionError::InvalidAmount));
        assert_eq!(session.pay_debt(0), Err(ActionError::InvalidAmount));
        assert_eq!(session.player(), &before);
        assert_eq!(
            session.events().latest().map(|e| e.kind),
            Some(EventKind::Warning)
        );
    }

    #[test]
    fn buy_then_sell_at_the_same_price_is_neutral() {
        let mut session = session();
        session.market_mut().set_price(Commodity::Ludes, 40);
        let bought = session.buy(Commodity::Ludes, 10).unwrap();
        assert_eq!(bought.total, 400);
        assert_eq!(bought.held, 10);
        assert_eq!(session.player().cash, 1_600);
        let sold = session.sell(Commodity::Ludes, 10).unwrap();
        assert_eq!(sold.held, 0);
        assert_eq!(session.player().cash, 2_000);
    }

    #[test]
    fn extreme_cost_is_insufficient_funds() {
        let mut session = session();
        session.market_mut().set_price(Commodity::Cocaine, u32::MAX);
        let err = session.buy(Commodity::Cocaine, u32::MAX).unwrap_err();
        assert!(matches!(err, ActionError::InsufficientFunds { .. }));
    }

    #[test]
    fn bank_round_trip() {
        let mut session = session();
        session.deposit_cash(1_500).unwrap();
        assert_eq!((session.player().cash, session.player().bank), (500, 1_500));
        assert_eq!(
            session.withdraw_cash(2_000),
            Err(ActionError::InsufficientBankBalance {
                requested: 2_000,
                available: 1_500
            })
        );
        session.withdraw_cash(1_500).unwrap();
        assert_eq!((session.player().cash, session.player().bank), (2_000, 0));
        assert_eq!(
            session.deposit_cash(2_001),
            Err(ActionError::InsufficientFunds {
                needed: 2_001,
                available: 2_000
            })
        );
    }

    #[test]
    fn travel_by_id_and_unknown_name() {
        let mut session = session();
        assert_eq!(session.travel_to(CityId::CentralPark), Ok(CityId::CentralPark));
        assert_eq!(session.player().location, "Central Park");
        assert!(
            session
                .events()
                .latest()
                .is_some_and(|e| e.message.contains("CAUTION"))
        );
        let before = (session.player().clone(), *session.market());
        assert_eq!(
            session.travel("Hoboken"),
            Err(ActionError::UnknownCity {
                name: "Hoboken".to_string()
            })
        );
        assert_eq!((session.player().clone(), *session.market()), before);
    }

    #[test]
    fn interest_accrues_only_when_enabled() {
        let config = EconomyConfig::default().with_interest(0.01);
        let mut session = GameSession::with_config(
            config,
            ReferenceData::builtin(),
            MarketRng::from_user_seed(5),
        )
        .unwrap();
        session.start_game("loan");
        let outcome = session.next_day();
        assert_eq!(
            outcome,
            DayOutcome::Advanced {
                days_left: 29,
                interest_charged: 55
            }
        );
        assert_eq!(session.player().debt, 5_555);

        let mut plain = session_with_days(2);
        assert_eq!(
            plain.next_day(),
            DayOutcome::Advanced {
                days_left: 1,
                interest_charged: 0
            }
        );
        assert_eq!(plain.player().debt, 5_500);
    }

    fn session_with_days(days: u32) -> GameSession {
        let mut session = session();
        session.player_mut().days_left = days;
        session
    }

    #[test]
    fn game_over_is_sticky_and_logged_once() {
        let mut session = session_with_days(1);
        assert!(session.next_day().is_game_over());
        assert!(session.next_day().is_game_over());
        let alerts = session
            .events()
            .iter()
            .filter(|e| e.kind == EventKind::Alert)
            .count();
        assert_eq!(alerts, 1);
        assert_eq!(session.player().days_left, 1);
    }

    #[test]
    fn invalid_config_is_refused() {
        let mut config = EconomyConfig::default();
        config.total_days = 0;
        let err = GameSession::with_config(config, ReferenceData::builtin(), MarketRng::from_user_seed(1))
            .unwrap_err();
        assert_eq!(err, ConfigError::NoDays(0));
    }
}
