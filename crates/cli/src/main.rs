//! Windowed register bank scenario runner.
//!
//! This binary provides a single entry point for the benchmark scenarios. It performs:
//! 1. **Isolation:** `canary` checks callee-saved registers survive a switch.
//! 2. **Cost:** `stress` and `latency` measure switches with the `instret` counter.
//! 3. **Scaling:** `scale` rotates four tasks; `view-regs` drives the window CSRs directly.
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rvwin_core::Config;
use rvwin_core::bench::scenarios::{Scenario, ScenarioReport};

#[derive(Parser, Debug)]
#[command(
    name = "rvwin",
    author,
    version,
    about = "Windowed register bank scenarios",
    long_about = "Run the isolation, cost, and scaling scenarios of the windowed register bank.\n\nExamples:\n  rvwin canary\n  rvwin stress --iterations 5000\n  rvwin --json all\n  RUST_LOG=rvwin_core=debug rvwin scale"
)]
struct Cli {
    /// JSON configuration file; built-in defaults when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print reports as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Print hart statistics after each scenario that has them.
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Callee-saved registers survive a yield to a task that overwrites them.
    Canary,
    /// Average cost of a yield over many round trips.
    Stress {
        /// Round trips; overrides `bench.stress_iterations`.
        #[arg(short = 'n', long)]
        iterations: Option<u64>,
    },
    /// One hardware switch against a software save/restore baseline.
    Latency,
    /// Four tasks in small windows under rotating selection.
    Scale,
    /// Stage and commit windows by hand from Machine mode.
    ViewRegs,
    /// Every scenario in turn.
    All,
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("[!] {}: {e}", path.display());
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let scenarios: Vec<Scenario> = match cli.command {
        Commands::Canary => vec![Scenario::Canary],
        Commands::Stress { iterations } => {
            if let Some(n) = iterations {
                config.bench.stress_iterations = n;
            }
            vec![Scenario::Stress]
        }
        Commands::Latency => vec![Scenario::Latency],
        Commands::Scale => vec![Scenario::Scale],
        Commands::ViewRegs => vec![Scenario::ViewRegs],
        Commands::All => Scenario::ALL.to_vec(),
    };

    if let Err(e) = config.validate() {
        eprintln!("[!] invalid configuration: {e}");
        process::exit(1);
    }

    let mut reports = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        match scenario.run(&config) {
            Ok(report) => reports.push(report),
            Err(e) => {
                eprintln!("\n[!] {scenario}: {e}");
                process::exit(1);
            }
        }
    }

    if cli.json {
        match serde_json::to_string_pretty(&reports) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("[!] cannot serialize reports: {e}");
                process::exit(1);
            }
        }
    } else {
        for report in &reports {
            report.print();
            if cli.stats {
                print_stats(report);
            }
            println!();
        }
    }

    if !reports.iter().all(ScenarioReport::passed) {
        process::exit(1);
    }
}

fn print_stats(report: &ScenarioReport) {
    let stats = match report {
        ScenarioReport::Canary(r) => &r.stats,
        ScenarioReport::Stress(r) => &r.stats,
        ScenarioReport::Scale(r) => &r.stats,
        ScenarioReport::Latency(_) | ScenarioReport::ViewRegs(_) => return,
    };
    stats.print();
}
