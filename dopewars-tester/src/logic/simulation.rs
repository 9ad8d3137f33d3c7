use anyhow::{Context, Result};
use colored::Colorize;
use dopewars_game::numbers::i64_to_f64;
use dopewars_game::{DataLoader, GameEngine, GameSession, RunSummary, check_day_step};
use serde::{Deserialize, Serialize};

use super::policy::{TradeAction, TradingPolicy, TradingStrategy};
use super::seeds::SeedInfo;

/// Upper bound on commands per day so a misbehaving policy cannot spin.
const MAX_ACTIONS_PER_DAY: usize = 32;

/// Outcome of one full run of one strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub strategy: String,
    pub seed: u64,
    pub summary: RunSummary,
    pub commands: u32,
    pub rejected: u32,
    pub violations: Vec<String>,
}

impl RunRecord {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Aggregated results for one strategy across every seed and iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyResult {
    pub strategy: String,
    pub label: String,
    pub passed: bool,
    pub runs: usize,
    pub commands: u64,
    pub rejected_commands: u64,
    pub average_net_worth: f64,
    pub best_net_worth: i64,
    pub worst_net_worth: i64,
    pub debt_free_runs: usize,
    pub debt_free_pct: f64,
    pub failures: Vec<String>,
}

impl StrategyResult {
    #[must_use]
    pub fn from_records(strategy: TradingStrategy, records: &[RunRecord]) -> Self {
        let runs = records.len();
        let net_worths: Vec<i64> = records.iter().map(|r| r.summary.net_worth).collect();
        let total: f64 = net_worths.iter().map(|&n| i64_to_f64(n)).sum();
        let debt_free_runs = records.iter().filter(|r| r.summary.debt == 0).count();
        let failures: Vec<String> = records
            .iter()
            .flat_map(|r| {
                r.violations
                    .iter()
                    .map(move |v| format!("seed {}: {v}", r.seed))
            })
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let (average_net_worth, debt_free_pct) = if runs == 0 {
            (0.0, 0.0)
        } else {
            (
                total / runs as f64,
                debt_free_runs as f64 / runs as f64 * 100.0,
            )
        };
        Self {
            strategy: strategy.key().to_string(),
            label: strategy.label().to_string(),
            passed: failures.is_empty(),
            runs,
            commands: records.iter().map(|r| u64::from(r.commands)).sum(),
            rejected_commands: records.iter().map(|r| u64::from(r.rejected)).sum(),
            average_net_worth,
            best_net_worth: net_worths.iter().copied().max().unwrap_or(0),
            worst_net_worth: net_worths.iter().copied().min().unwrap_or(0),
            debt_free_runs,
            debt_free_pct,
            failures,
        }
    }
}

/// Drives sessions built by an engine with scripted policies.
pub struct StrategyRunner<L: DataLoader> {
    engine: GameEngine<L>,
    verbose: bool,
}

impl<L: DataLoader> StrategyRunner<L> {
    pub const fn new(engine: GameEngine<L>, verbose: bool) -> Self {
        Self { engine, verbose }
    }

    /// Run every strategy over every seed for `iterations` iterations each.
    pub fn run_all(
        &self,
        strategies: &[TradingStrategy],
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Result<(Vec<StrategyResult>, Vec<RunRecord>)> {
        let mut results = Vec::with_capacity(strategies.len());
        let mut all_records = Vec::new();
        for &strategy in strategies {
            let mut records = Vec::with_capacity(seeds.len() * iterations);
            for seed_info in seeds {
                for iteration in 0..iterations {
                    let seed = seed_info.iteration_seed(iteration);
                    let record = self.run_once(strategy, seed)?;
                    if self.verbose {
                        let status = if record.passed() {
                            "✅".green()
                        } else {
                            "❌".red()
                        };
                        println!(
                            "{status} [{} seed {seed}] {}",
                            strategy.key().bright_white(),
                            record.summary
                        );
                    }
                    records.push(record);
                }
            }
            results.push(StrategyResult::from_records(strategy, &records));
            all_records.extend(records);
        }
        Ok((results, all_records))
    }

    /// Play one session to the end with `strategy`.
    pub fn run_once(&self, strategy: TradingStrategy, seed: u64) -> Result<RunRecord> {
        let mut session = self
            .engine
            .create_session(Some(seed))
            .with_context(|| format!("failed to create session for seed {seed}"))?;
        let mut policy = strategy.create_policy(seed);
        session.start_game(&format!("{}-bot", strategy.key()));
        log::debug!("{} starting seed {seed}", policy.name());

        let mut record = RunRecord {
            strategy: strategy.key().to_string(),
            seed,
            summary: RunSummary::from_session(&session),
            commands: 0,
            rejected: 0,
            violations: collect_violations(&session, "start"),
        };

        let day_limit = session.config().total_days.saturating_add(1);
        for _ in 0..day_limit {
            play_day(&mut session, policy.as_mut(), &mut record);
            let before = session.player().days_left;
            session.next_day();
            record.commands += 1;
            if let Some(violation) = check_day_step(before, session.player().days_left) {
                record.violations.push(format!("next day: {violation}"));
            }
            record
                .violations
                .extend(collect_violations(&session, "next day"));
            if session.game_over() {
                break;
            }
        }
        if !session.game_over() {
            record
                .violations
                .push(format!("run did not end within {day_limit} days"));
        }

        record.summary = RunSummary::from_session(&session);
        Ok(record)
    }
}

fn play_day(session: &mut GameSession, policy: &mut dyn TradingPolicy, record: &mut RunRecord) {
    policy.start_day(session);
    for _ in 0..MAX_ACTIONS_PER_DAY {
        let Some(action) = policy.next_action(session) else {
            return;
        };
        apply_checked(session, &action, record);
    }
    log::warn!(
        "{} hit the per-day command limit on day {}",
        policy.name(),
        session.day_number()
    );
}

/// Issue `action` and confirm a rejection left the session unchanged.
fn apply_checked(session: &mut GameSession, action: &TradeAction, record: &mut RunRecord) {
    let player = session.player().clone();
    let market = *session.market();
    let location = session.current_city().id;

    record.commands += 1;
    if let Err(err) = action.apply(session) {
        record.rejected += 1;
        log::debug!("{action} rejected: {err}");
        if session.player() != &player
            || session.market() != &market
            || session.current_city().id != location
        {
            record
                .violations
                .push(format!("rejected {action} still changed the session"));
        }
    }
    record
        .violations
        .extend(collect_violations(session, &action.to_string()));
}

fn collect_violations(session: &GameSession, context: &str) -> Vec<String> {
    session
        .check_invariants()
        .into_iter()
        .map(|violation| format!("day {} after {context}: {violation}", session.day_number()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dopewars_game::BuiltinData;

    fn runner() -> StrategyRunner<BuiltinData> {
        StrategyRunner::new(GameEngine::new(BuiltinData), false)
    }

    #[test]
    fn every_strategy_finishes_cleanly() {
        let runner = runner();
        for strategy in TradingStrategy::ALL {
            let record = runner.run_once(strategy, 1337).unwrap();
            assert!(record.passed(), "{strategy}: {:?}", record.violations);
            assert!(record.summary.game_over);
            assert_eq!(record.summary.day, 30);
            assert_eq!(record.strategy, strategy.key());
        }
    }

    #[test]
    fn idle_runs_only_advance_the_clock() {
        let record = runner().run_once(TradingStrategy::Idle, 4).unwrap();
        assert_eq!(record.commands, 30);
        assert_eq!(record.rejected, 0);
        assert_eq!(record.summary.net_worth, 2_000 - 5_500);
        assert_eq!(record.summary.player_name, "idle-bot");
    }

    #[test]
    fn random_runs_exercise_rejections() {
        let seeds = [SeedInfo::from_numeric(7)];
        let (results, records) = runner()
            .run_all(&[TradingStrategy::Random], &seeds, 4)
            .unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(results[0].runs, 4);
        assert!(results[0].passed, "{:?}", results[0].failures);
        assert!(results[0].rejected_commands > 0);
    }

    #[test]
    fn runs_are_reproducible_per_seed() {
        let runner = runner();
        let first = runner.run_once(TradingStrategy::BargainHunter, 21).unwrap();
        let second = runner.run_once(TradingStrategy::BargainHunter, 21).unwrap();
        assert_eq!(first.summary, second.summary);
        assert_eq!(first.commands, second.commands);
    }

    #[test]
    fn aggregation_handles_empty_and_mixed_records() {
        let empty = StrategyResult::from_records(TradingStrategy::Idle, &[]);
        assert_eq!(empty.runs, 0);
        assert!(empty.passed);

        let runner = runner();
        let mut records = vec![
            runner.run_once(TradingStrategy::Idle, 1).unwrap(),
            runner.run_once(TradingStrategy::Idle, 2).unwrap(),
        ];
        records[1].violations.push("synthetic".to_string());
        let result = StrategyResult::from_records(TradingStrategy::Idle, &records);
        assert!(!result.passed);
        assert_eq!(result.failures, vec!["seed 2: synthetic".to_string()]);
        assert_eq!(result.best_net_worth, -3_500);
        assert_eq!(result.debt_free_runs, 0);
    }
}
