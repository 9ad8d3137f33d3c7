mod logic;
mod util;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use dopewars_game::GameEngine;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::time::Instant;

use logic::{
    FileLoader, RunRecord, StrategyResult, StrategyRunner, TradingStrategy, resolve_seed_inputs,
};
use util::split_csv;

#[derive(Debug, Parser)]
#[command(name = "dopewars-tester", version)]
#[command(about = "Headless strategy runs and invariant checks for the Dopewars economy core")]
struct Args {
    /// Strategies to run (comma-separated, or `all`)
    #[arg(long, default_value = "all")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Seeds to run (comma-separated integers or phrases)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per seed
    #[arg(long, default_value_t = 5)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json", "markdown"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Charge loan interest at the reference daily rate
    #[arg(long)]
    interest: bool,

    /// Reference data JSON (commodities and cities) to use instead of the builtin tables
    #[arg(long)]
    data: Option<PathBuf>,

    /// Economy config JSON to use instead of the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let strategies = expand_strategies(&args.strategies)?;
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let loader = FileLoader {
        data_path: args.data.clone(),
        config_path: args.config.clone(),
        interest: args.interest,
    };
    let preloaded = loader.preload().context("failed to load game data")?;
    log::info!(
        "running {} strategies over {} seed(s), {} iteration(s) each",
        strategies.len(),
        seeds.len(),
        args.iterations
    );

    let runner = StrategyRunner::new(GameEngine::new(preloaded), args.verbose);
    let (results, records) = runner.run_all(&strategies, &seeds, args.iterations)?;

    write_reports(&args, &results, &records, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in TradingStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:16} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "💊 Dopewars Strategy Tester".bright_cyan().bold());
    println!("{}", "===========================".cyan());
}

fn expand_strategies(arg: &str) -> Result<Vec<TradingStrategy>> {
    let mut strategies = Vec::new();
    for token in split_csv(arg) {
        if token.eq_ignore_ascii_case("all") {
            strategies.extend(TradingStrategy::ALL);
            continue;
        }
        let Some(strategy) = TradingStrategy::from_key(&token) else {
            bail!("Unknown strategy: {token} (try --list-strategies)");
        };
        strategies.push(strategy);
    }
    let mut seen = Vec::with_capacity(strategies.len());
    strategies.retain(|strategy| {
        if seen.contains(strategy) {
            false
        } else {
            seen.push(*strategy);
            true
        }
    });
    if strategies.is_empty() {
        bail!("No strategies selected");
    }
    Ok(strategies)
}

fn write_reports(
    args: &Args,
    results: &[StrategyResult],
    records: &[RunRecord],
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    let duration = start_time.elapsed();

    match args.report.as_str() {
        "json" => {
            let runs = args.verbose.then_some(records);
            logic::reports::generate_json_report(&mut output_target, results, runs, duration)?;
        }
        "markdown" => logic::reports::generate_markdown_report(&mut output_target, results)?,
        _ => {
            logic::reports::generate_console_report(&mut output_target, results, duration)?;
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        self.writer().flush()
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
