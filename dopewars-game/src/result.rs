//! End-of-run summary
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::DebtStatus;
use crate::numbers::{format_money, u64_to_i64};
use crate::session::GameSession;

/// Snapshot of a session's standing, suitable for reports and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub player_name: String,
    pub city: String,
    pub day: u32,
    pub days_left: u32,
    pub cash: u64,
    pub bank: u64,
    pub debt: u64,
    pub inventory_value: u64,
    pub net_worth: i64,
    /// Net worth if the stash were sold at current prices
    pub liquidation_value: i64,
    pub debt_status: DebtStatus,
    pub game_over: bool,
    pub markets_generated: u64,
}

impl RunSummary {
    #[must_use]
    pub fn from_session(session: &GameSession) -> Self {
        let player = session.player();
        let inventory_value = session.inventory_value();
        let net_worth = session.net_worth();
        Self {
            player_name: player.name.clone(),
            city: player.location.clone(),
            day: session.day_number(),
            days_left: player.days_left,
            cash: player.cash,
            bank: player.bank,
            debt: player.debt,
            inventory_value,
            net_worth,
            liquidation_value: net_worth.saturating_add(u64_to_i64(inventory_value)),
            debt_status: session.debt_status(),
            game_over: session.game_over(),
            markets_generated: session.markets_generated(),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on day {} in {}: net worth {} ({}), {}",
            self.player_name,
            self.day,
            self.city,
            format_money(self.net_worth),
            self.debt_status.label(),
            if self.game_over { "finished" } else { "in progress" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Commodity;

    #[test]
    fn summary_reflects_the_session() {
        let mut session = GameSession::with_seed(3);
        session.start_game("Summ");
        session.market_mut().set_price(Commodity::Speed, 100);
        session.buy(Commodity::Speed, 5).unwrap();
        let summary = RunSummary::from_session(&session);
        assert_eq!(summary.player_name, "Summ");
        assert_eq!(summary.day, 1);
        assert_eq!(summary.cash, 1_500);
        assert_eq!(summary.inventory_value, 500);
        assert_eq!(summary.net_worth, 1_500 - 5_500);
        assert_eq!(summary.liquidation_value, -3_500);
        assert_eq!(summary.debt_status, DebtStatus::Active);
        assert!(!summary.game_over);
        assert_eq!(
            summary.to_string(),
            "Summ on day 1 in Bronx: net worth $-4,000 (ACTIVE), in progress"
        );
    }

    #[test]
    fn summary_serializes_debt_status_in_snake_case() {
        let session = GameSession::with_seed(3);
        let json = serde_json::to_value(RunSummary::from_session(&session)).unwrap();
        assert_eq!(json["debt_status"], "active");
        assert_eq!(json["days_left"], 30);
    }
}
