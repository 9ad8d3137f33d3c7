//! Session sanity checks.
//!
//! Commands validate before they mutate, so none of these should ever fire.
//! A violation means a bug in the state machine, not a player mistake.
use std::fmt;

use crate::session::GameSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    pub message: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

impl InvariantViolation {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Every violated invariant in the current session; empty when sound.
///
/// Non-negative balances and complete inventory/market tables are enforced by
/// the types and need no runtime check.
#[must_use]
pub fn check_invariants(session: &GameSession) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let player = session.player();
    let city = session.current_city();
    let total_days = session.config().total_days;

    if city.name != player.location {
        violations.push(InvariantViolation::new(format!(
            "current city {} does not match player location {}",
            city.name, player.location
        )));
    }
    if session.data().city_by_name(&player.location).is_none() {
        violations.push(InvariantViolation::new(format!(
            "player location {} is not a known city",
            player.location
        )));
    }
    if player.days_left > total_days {
        violations.push(InvariantViolation::new(format!(
            "days left {} exceeds run length {total_days}",
            player.days_left
        )));
    }
    if session.game_over() && player.days_left > 1 {
        violations.push(InvariantViolation::new(format!(
            "game over with {} days left",
            player.days_left
        )));
    }

    for (commodity, entry) in session.market().iter() {
        let info = session.data().commodity(commodity);
        if entry.min != info.min_price || entry.max != info.max_price {
            violations.push(InvariantViolation::new(format!(
                "{commodity} market range {}..={} differs from reference {}..={}",
                entry.min, entry.max, info.min_price, info.max_price
            )));
        }
        if entry.price == 0 {
            violations.push(InvariantViolation::new(format!(
                "{commodity} is priced at zero"
            )));
        }
    }

    violations
}

/// Checks that need the previous snapshot: the clock never runs backwards
/// and moves at most one day per step.
#[must_use]
pub fn check_day_step(before_days_left: u32, after_days_left: u32) -> Option<InvariantViolation> {
    if after_days_left > before_days_left {
        return Some(InvariantViolation::new(format!(
            "days left increased from {before_days_left} to {after_days_left}"
        )));
    }
    if before_days_left - after_days_left > 1 {
        return Some(InvariantViolation::new(format!(
            "days left dropped from {before_days_left} to {after_days_left} in one step"
        )));
    }
    None
}
