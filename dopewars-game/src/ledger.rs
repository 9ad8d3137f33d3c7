//! Money analytics derived from the player's balances: net worth, loan
//! interest projections and the day counter display.
use serde::{Deserialize, Serialize};

use crate::constants::HIGH_DEBT_THRESHOLD;
use crate::market::Market;
use crate::numbers::{ceil_f64_to_u32, round_f64_to_u64, u64_to_f64, u64_to_i64};
use crate::player::{Inventory, Player};

/// Headline status shown next to the player's debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    DebtFree,
    Active,
    HighDebt,
}

impl DebtStatus {
    #[must_use]
    pub const fn from_debt(debt: u64) -> Self {
        if debt == 0 {
            Self::DebtFree
        } else if debt > HIGH_DEBT_THRESHOLD {
            Self::HighDebt
        } else {
            Self::Active
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::DebtFree => "DEBT FREE",
            Self::Active => "ACTIVE",
            Self::HighDebt => "HIGH DEBT",
        }
    }
}

/// `cash + bank - debt`; stash value is not included.
#[must_use]
pub fn net_worth(player: &Player) -> i64 {
    u64_to_i64(player.cash)
        .saturating_add(u64_to_i64(player.bank))
        .saturating_sub(u64_to_i64(player.debt))
}

/// Market value of everything in the stash at current prices.
#[must_use]
pub fn inventory_value(inventory: &Inventory, market: &Market) -> u64 {
    inventory
        .iter()
        .map(|(commodity, qty)| u64::from(market.price(commodity)).saturating_mul(u64::from(*qty)))
        .fold(0_u64, u64::saturating_add)
}

/// Largest quantity purchasable with `cash` at `price`.
#[must_use]
pub fn max_affordable(cash: u64, price: u32) -> u64 {
    if price == 0 {
        return 0;
    }
    cash / u64::from(price)
}

/// Largest payment that fully applies to the loan.
#[must_use]
pub fn max_debt_payment(player: &Player) -> u64 {
    player.cash.min(player.debt)
}

/// Interest one day adds to `debt` at `daily_rate`, rounded to the dollar.
#[must_use]
pub fn daily_interest(debt: u64, daily_rate: f64) -> u64 {
    if !daily_rate.is_finite() || daily_rate <= 0.0 {
        return 0;
    }
    round_f64_to_u64(u64_to_f64(debt) * daily_rate)
}

/// Days of compounding at `daily_rate` until a debt doubles.
#[must_use]
pub fn days_until_debt_doubles(daily_rate: f64) -> Option<u32> {
    if !daily_rate.is_finite() || daily_rate <= 0.0 {
        return None;
    }
    Some(ceil_f64_to_u32(2_f64.ln() / daily_rate.ln_1p()))
}

/// One-based day number for display.
#[must_use]
pub const fn day_number(days_left: u32, total_days: u32) -> u32 {
    total_days.saturating_sub(days_left).saturating_add(1)
}

/// Whole-percent progress through the run.
#[must_use]
pub fn progress_pct(days_left: u32, total_days: u32) -> u32 {
    if total_days == 0 {
        return 100;
    }
    let elapsed = u64::from(total_days.saturating_sub(days_left));
    let pct = elapsed * 100 / u64::from(total_days);
    u32::try_from(pct).unwrap_or(100)
}
