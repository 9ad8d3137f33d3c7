use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use dopewars_game::numbers::{format_money, round_f64_to_i64};
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use super::simulation::{RunRecord, StrategyResult};

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: String,
    duration_ms: u128,
    passed: bool,
    strategies: &'a [StrategyResult],
    #[serde(skip_serializing_if = "Option::is_none")]
    runs: Option<&'a [RunRecord]>,
}

fn signed_money(amount: f64) -> String {
    format_money(round_f64_to_i64(amount))
}

pub fn generate_console_report(
    writer: &mut dyn Write,
    results: &[StrategyResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "📊 Strategy Results Summary".bright_cyan().bold())?;
    writeln!(writer, "{}", "===========================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    let runs: usize = results.iter().map(|r| r.runs).sum();
    writeln!(writer, "Strategies: {total}")?;
    writeln!(writer, "Runs: {runs}")?;
    writeln!(writer, "Passed: {}", passed.to_string().green())?;
    writeln!(writer, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(writer, "Total time: {total_duration:?}")?;
    writeln!(writer)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(writer, "{status} {}", result.label.bold())?;
        writeln!(
            writer,
            "   Commands: {} ({} rejected)",
            result.commands, result.rejected_commands
        )?;
        writeln!(
            writer,
            "   Net worth: avg {} / best {} / worst {}",
            signed_money(result.average_net_worth),
            format_money(result.best_net_worth),
            format_money(result.worst_net_worth)
        )?;
        writeln!(
            writer,
            "   Debt free: {}/{} ({:.1}%)",
            result.debt_free_runs, result.runs, result.debt_free_pct
        )?;
        if !result.failures.is_empty() {
            writeln!(writer, "   Invariant failures:")?;
            for failure in &result.failures {
                writeln!(writer, "     • {}", failure.red())?;
            }
        }
        writeln!(writer)?;
    }

    if let Some(best) = results
        .iter()
        .max_by(|a, b| a.average_net_worth.total_cmp(&b.average_net_worth))
    {
        writeln!(writer, "{}", "💰 Best Strategy".bright_yellow().bold())?;
        writeln!(writer, "{}", "================".yellow())?;
        writeln!(
            writer,
            "{} ({} average net worth)",
            best.label.green(),
            signed_money(best.average_net_worth)
        )?;
    }
    Ok(())
}

pub fn generate_json_report(
    writer: &mut dyn Write,
    results: &[StrategyResult],
    runs: Option<&[RunRecord]>,
    total_duration: Duration,
) -> Result<()> {
    let report = JsonReport {
        generated_at: Utc::now().to_rfc3339(),
        duration_ms: total_duration.as_millis(),
        passed: results.iter().all(|r| r.passed),
        strategies: results,
        runs,
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}

pub fn generate_markdown_report(writer: &mut dyn Write, results: &[StrategyResult]) -> Result<()> {
    writeln!(writer, "# Dopewars Strategy Results\n")?;
    writeln!(
        writer,
        "_Generated {}_\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;

    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(writer, "## Summary\n")?;
    writeln!(writer, "- **Strategies**: {}", results.len())?;
    writeln!(writer, "- **Passed**: {passed}")?;
    writeln!(writer, "- **Failed**: {}\n", results.len() - passed)?;

    writeln!(
        writer,
        "| Strategy | Runs | Avg net worth | Best | Worst | Debt free | Rejected |"
    )?;
    writeln!(writer, "|---|---:|---:|---:|---:|---:|---:|")?;
    for result in results {
        writeln!(
            writer,
            "| {} {} | {} | {} | {} | {} | {:.1}% | {} |",
            if result.passed { "✅" } else { "❌" },
            result.label,
            result.runs,
            signed_money(result.average_net_worth),
            format_money(result.best_net_worth),
            format_money(result.worst_net_worth),
            result.debt_free_pct,
            result.rejected_commands
        )?;
    }

    let failing: Vec<&StrategyResult> = results.iter().filter(|r| !r.passed).collect();
    if !failing.is_empty() {
        writeln!(writer, "\n## Invariant Failures\n")?;
        for result in failing {
            writeln!(writer, "### {}\n", result.label)?;
            for failure in &result.failures {
                writeln!(writer, "- {failure}")?;
            }
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(passed: bool) -> StrategyResult {
        StrategyResult {
            strategy: "idle".to_string(),
            label: "Idle".to_string(),
            passed,
            runs: 2,
            commands: 60,
            rejected_commands: 0,
            average_net_worth: -3_500.0,
            best_net_worth: -3_500,
            worst_net_worth: -3_500,
            debt_free_runs: 0,
            debt_free_pct: 0.0,
            failures: if passed {
                Vec::new()
            } else {
                vec!["seed 1: broken".to_string()]
            },
        }
    }

    #[test]
    fn json_report_is_parseable() {
        let mut out = Vec::new();
        generate_json_report(&mut out, &[result(true)], None, Duration::from_millis(5)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["passed"], true);
        assert_eq!(value["strategies"][0]["strategy"], "idle");
        assert!(value.get("runs").is_none());
    }

    #[test]
    fn markdown_lists_failures() {
        let mut out = Vec::new();
        generate_markdown_report(&mut out, &[result(true), result(false)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("# Dopewars Strategy Results"));
        assert!(text.contains("$-3,500"));
        assert!(text.contains("## Invariant Failures"));
        assert!(text.contains("- seed 1: broken"));
    }

    #[test]
    fn console_names_the_best_strategy() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        generate_console_report(&mut out, &[result(true)], Duration::from_secs(1)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("✅ PASS Idle"));
        assert!(text.contains("Idle ($-3,500 average net worth)"));
    }
}
