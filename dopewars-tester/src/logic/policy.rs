use std::fmt;

use dopewars_game::numbers::round_f64_to_u64;
use dopewars_game::{ActionError, Commodity, GameSession, PriceSignal, Trend};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// One command a policy wants to issue against the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeAction {
    Buy { commodity: Commodity, quantity: u32 },
    Sell { commodity: Commodity, quantity: u32 },
    Deposit(u64),
    Withdraw(u64),
    PayDebt(u64),
    Travel(String),
}

impl TradeAction {
    /// Issue the command.
    ///
    /// # Errors
    ///
    /// Returns whatever rejection the session reports.
    pub fn apply(&self, session: &mut GameSession) -> Result<(), ActionError> {
        match self {
            Self::Buy {
                commodity,
                quantity,
            } => session.buy(*commodity, *quantity).map(drop),
            Self::Sell {
                commodity,
                quantity,
            } => session.sell(*commodity, *quantity).map(drop),
            Self::Deposit(amount) => session.deposit_cash(*amount),
            Self::Withdraw(amount) => session.withdraw_cash(*amount),
            Self::PayDebt(amount) => session.pay_debt(*amount).map(drop),
            Self::Travel(city) => session.travel(city).map(drop),
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy {
                commodity,
                quantity,
            } => write!(f, "buy {quantity} {commodity}"),
            Self::Sell {
                commodity,
                quantity,
            } => write!(f, "sell {quantity} {commodity}"),
            Self::Deposit(amount) => write!(f, "deposit ${amount}"),
            Self::Withdraw(amount) => write!(f, "withdraw ${amount}"),
            Self::PayDebt(amount) => write!(f, "pay debt ${amount}"),
            Self::Travel(city) => write!(f, "travel to {city}"),
        }
    }
}

/// Policy interface for automated trading.
pub trait TradingPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Reset any per-day bookkeeping. Called before the first action of a day.
    fn start_day(&mut self, _session: &GameSession) {}

    /// Next command for the current day, or `None` to end the day.
    fn next_action(&mut self, session: &GameSession) -> Option<TradeAction>;
}

/// Built-in trading strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TradingStrategy {
    Idle,
    TrendFollower,
    BargainHunter,
    Random,
}

impl TradingStrategy {
    pub const ALL: [Self; 4] = [
        Self::Idle,
        Self::TrendFollower,
        Self::BargainHunter,
        Self::Random,
    ];

    /// CLI key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::TrendFollower => "trend-follower",
            Self::BargainHunter => "bargain-hunter",
            Self::Random => "random",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::TrendFollower => "Trend Follower",
            Self::BargainHunter => "Bargain Hunter",
            Self::Random => "Random",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Idle => "Never trades; only waits out the clock",
            Self::TrendFollower => "Buys rising goods, dumps falling ones, tours every city",
            Self::BargainHunter => "Buys below-average prices, sells premiums, banks the rest",
            Self::Random => "Issues random commands, many of which get rejected",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key().eq_ignore_ascii_case(key.trim()))
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn TradingPolicy> {
        match self {
            Self::Idle => Box::new(IdlePolicy),
            Self::TrendFollower => Box::new(TrendFollowerPolicy::default()),
            Self::BargainHunter => Box::new(BargainHunterPolicy::default()),
            Self::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for TradingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Units of `commodity` that fit both the wallet and the carry capacity.
fn buyable_units(session: &GameSession, commodity: Commodity) -> u32 {
    let affordable = session.max_affordable(commodity);
    let weight = session.data().commodity(commodity).weight_kg;
    let fits = if weight > 0.0 {
        round_f64_to_u64((session.stash_report().remaining_kg() / weight).floor())
    } else {
        u64::MAX
    };
    u32::try_from(affordable.min(fits)).unwrap_or(u32::MAX)
}

fn next_city(session: &GameSession, offset: usize) -> String {
    let cities = session.cities();
    let here = cities
        .iter()
        .position(|city| city.id == session.current_city().id)
        .unwrap_or(0);
    cities[(here + offset) % cities.len()].name.clone()
}

struct IdlePolicy;

impl TradingPolicy for IdlePolicy {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn next_action(&mut self, _session: &GameSession) -> Option<TradeAction> {
        None
    }
}

#[derive(Default)]
struct TrendFollowerPolicy {
    bought: bool,
    travelled: bool,
}

impl TradingPolicy for TrendFollowerPolicy {
    fn name(&self) -> &'static str {
        "Trend Follower"
    }

    fn start_day(&mut self, _session: &GameSession) {
        self.bought = false;
        self.travelled = false;
    }

    fn next_action(&mut self, session: &GameSession) -> Option<TradeAction> {
        let player = session.player();
        if let Some((commodity, _)) = session
            .market()
            .iter()
            .find(|(c, entry)| entry.trend == Trend::Down && player.inventory[*c] > 0)
        {
            return Some(TradeAction::Sell {
                commodity,
                quantity: player.inventory[commodity],
            });
        }

        if !self.bought {
            self.bought = true;
            let pick = session
                .market()
                .iter()
                .filter(|(_, entry)| entry.trend == Trend::Up)
                .max_by(|(_, a), (_, b)| a.potential_profit_pct().total_cmp(&b.potential_profit_pct()))
                .map(|(commodity, _)| commodity);
            if let Some(commodity) = pick {
                let quantity = buyable_units(session, commodity);
                if quantity > 0 {
                    return Some(TradeAction::Buy {
                        commodity,
                        quantity,
                    });
                }
            }
        }

        if player.debt > 0 && player.cash >= player.debt {
            return Some(TradeAction::PayDebt(player.debt));
        }

        if !self.travelled {
            self.travelled = true;
            return Some(TradeAction::Travel(next_city(session, 1)));
        }
        None
    }
}

/// Cash kept on hand before anything is banked.
const BARGAIN_CASH_RESERVE: u64 = 1_000;

#[derive(Default)]
struct BargainHunterPolicy {
    withdrew: bool,
    bought: bool,
    paid: bool,
    banked: bool,
    travelled: bool,
}

impl TradingPolicy for BargainHunterPolicy {
    fn name(&self) -> &'static str {
        "Bargain Hunter"
    }

    fn start_day(&mut self, _session: &GameSession) {
        *self = Self::default();
    }

    fn next_action(&mut self, session: &GameSession) -> Option<TradeAction> {
        let player = session.player();
        if !self.withdrew {
            self.withdrew = true;
            if player.bank > 0 {
                return Some(TradeAction::Withdraw(player.bank));
            }
        }

        if let Some((commodity, _)) = session.market().iter().find(|(c, entry)| {
            entry.price_signal() == PriceSignal::Premium && player.inventory[*c] > 0
        }) {
            return Some(TradeAction::Sell {
                commodity,
                quantity: player.inventory[commodity],
            });
        }

        if !self.bought {
            self.bought = true;
            let pick = session
                .market()
                .iter()
                .filter(|(_, entry)| entry.price_signal() == PriceSignal::Bargain)
                .min_by(|(_, a), (_, b)| a.profit_margin_pct().total_cmp(&b.profit_margin_pct()))
                .map(|(commodity, _)| commodity);
            if let Some(commodity) = pick {
                let quantity = buyable_units(session, commodity);
                if quantity > 0 {
                    return Some(TradeAction::Buy {
                        commodity,
                        quantity,
                    });
                }
            }
        }

        if !self.paid {
            self.paid = true;
            let payment = (player.cash / 2).min(player.debt);
            if payment > 0 {
                return Some(TradeAction::PayDebt(payment));
            }
        }

        if !self.travelled {
            self.travelled = true;
            return Some(TradeAction::Travel(next_city(session, 2)));
        }

        if !self.banked {
            self.banked = true;
            if player.cash > BARGAIN_CASH_RESERVE {
                return Some(TradeAction::Deposit(player.cash - BARGAIN_CASH_RESERVE));
            }
        }
        None
    }
}

/// Most commands the random policy issues in one day.
const RANDOM_ACTIONS_PER_DAY: u32 = 5;

struct RandomPolicy {
    rng: ChaCha20Rng,
    remaining: u32,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            remaining: 0,
        }
    }

    fn pick_commodity(&mut self) -> Commodity {
        Commodity::ALL[self.rng.gen_range(0..Commodity::COUNT)]
    }

    fn pick_amount(&mut self, around: u64) -> u64 {
        self.rng.gen_range(1..=around.saturating_add(around / 4).max(1))
    }
}

impl TradingPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn start_day(&mut self, _session: &GameSession) {
        self.remaining = self.rng.gen_range(0..=RANDOM_ACTIONS_PER_DAY);
    }

    fn next_action(&mut self, session: &GameSession) -> Option<TradeAction> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let player = session.player();
        let action = match self.rng.gen_range(0..6) {
            0 => {
                let commodity = self.pick_commodity();
                let quantity = self.rng.gen_range(1..=20);
                TradeAction::Buy {
                    commodity,
                    quantity,
                }
            }
            1 => {
                let commodity = self.pick_commodity();
                let held = player.inventory[commodity];
                let quantity = self.rng.gen_range(1..=held.saturating_add(2));
                TradeAction::Sell {
                    commodity,
                    quantity,
                }
            }
            2 => TradeAction::Deposit(self.pick_amount(player.cash)),
            3 => TradeAction::Withdraw(self.pick_amount(player.bank)),
            4 => TradeAction::PayDebt(self.pick_amount(player.cash.min(player.debt))),
            _ => {
                if self.rng.gen_bool(0.1) {
                    TradeAction::Travel("Hoboken".to_string())
                } else {
                    let offset = self.rng.gen_range(0..session.cities().len());
                    TradeAction::Travel(next_city(session, offset))
                }
            }
        };
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        let mut session = GameSession::with_seed(1337);
        session.start_game("policy");
        session
    }

    #[test]
    fn strategy_keys_round_trip() {
        for strategy in TradingStrategy::ALL {
            assert_eq!(TradingStrategy::from_key(strategy.key()), Some(strategy));
        }
        assert_eq!(
            TradingStrategy::from_key(" Trend-Follower "),
            Some(TradingStrategy::TrendFollower)
        );
        assert_eq!(TradingStrategy::from_key("hodl"), None);
    }

    #[test]
    fn idle_policy_never_acts() {
        let session = session();
        let mut policy = TradingStrategy::Idle.create_policy(1);
        policy.start_day(&session);
        assert_eq!(policy.next_action(&session), None);
        assert_eq!(policy.name(), "Idle");
    }

    #[test]
    fn trend_follower_buys_rising_goods_and_travels() {
        let mut session = session();
        let info = *session.data().commodity(Commodity::Ludes);
        for commodity in Commodity::ALL {
            let max = session.data().commodity(commodity).max_price;
            session.market_mut().set_price(commodity, max);
        }
        session.market_mut().set_price(Commodity::Ludes, info.min_price);

        let mut policy = TradingStrategy::TrendFollower.create_policy(1);
        policy.start_day(&session);
        let first = policy.next_action(&session);
        assert!(matches!(
            first,
            Some(TradeAction::Buy {
                commodity: Commodity::Ludes,
                ..
            })
        ));
        first.unwrap().apply(&mut session).unwrap();
        assert_eq!(
            policy.next_action(&session),
            Some(TradeAction::Travel("Brooklyn".to_string()))
        );
        assert_eq!(policy.next_action(&session), None);
    }

    #[test]
    fn purchases_respect_carry_capacity() {
        let mut session = session();
        session.player_mut().cash = 10_000_000;
        session.market_mut().set_price(Commodity::Cocaine, 15_000);
        assert_eq!(buyable_units(&session, Commodity::Cocaine), 50);
        session.player_mut().inventory[Commodity::Cocaine] = 60;
        assert_eq!(buyable_units(&session, Commodity::Cocaine), 0);
    }

    #[test]
    fn random_policy_is_seeded() {
        let session = session();
        let mut a = TradingStrategy::Random.create_policy(99);
        let mut b = TradingStrategy::Random.create_policy(99);
        for _ in 0..10 {
            a.start_day(&session);
            b.start_day(&session);
            loop {
                let (left, right) = (a.next_action(&session), b.next_action(&session));
                assert_eq!(left, right);
                if left.is_none() {
                    break;
                }
            }
        }
    }

    #[test]
    fn actions_render_for_logs() {
        let action = TradeAction::Buy {
            commodity: Commodity::Weed,
            quantity: 3,
        };
        assert_eq!(action.to_string(), "buy 3 Weed");
        assert_eq!(TradeAction::PayDebt(50).to_string(), "pay debt $50");
    }
}
