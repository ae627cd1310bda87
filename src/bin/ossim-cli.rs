//! ossim-cli - Command-line front end for the simulation engines
//!
//! Usage:
//!   ossim-cli detect --processes 3 --resources 3 --allocations alloc.txt --requests req.txt
//!   ossim-cli bankers --available 3,3,2 --max max.txt --allocation alloc.txt --trace
//!   ossim-cli prevent --policy holdwait --scenario events.txt
//!   ossim-cli schedule --input procs.txt --algorithm rr --quantum 2

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use ossim_core::deadlock::{
    vector, BankersInput, CycleDetector, DetectionInput, Outcome, Policy, PreventionSimulator,
    SafetyEngine,
};
use ossim_core::parse;
use ossim_core::scheduler::{self, AlgorithmKind, SchedulerEngine, SchedulerResult};
use ossim_core::{SimulationSession, SimulatorConfig};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "ossim-cli")]
#[command(about = "Deadlock and CPU scheduling simulator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(short, long, env = "OSSIM_CONFIG", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect deadlock cycles in a resource allocation graph
    Detect {
        /// Number of processes (P1..Pn)
        #[arg(short, long)]
        processes: Option<usize>,

        /// Number of resources (R1..Rm)
        #[arg(short, long)]
        resources: Option<usize>,

        /// File of `process,resource` allocation edges
        #[arg(long)]
        allocations: PathBuf,

        /// File of `process,resource` request edges
        #[arg(long)]
        requests: PathBuf,

        /// Reveal cycles one at a time
        #[arg(long)]
        step: bool,
    },

    /// Run the Banker's safety algorithm
    Bankers {
        /// Available vector, e.g. "3,3,2"
        #[arg(short, long)]
        available: String,

        /// Max matrix file, one row per line
        #[arg(long)]
        max: PathBuf,

        /// Allocation matrix file, one row per line
        #[arg(long)]
        allocation: PathBuf,

        /// Print every step of the safety check
        #[arg(long)]
        trace: bool,
    },

    /// Replay a scenario under a prevention policy
    Prevent {
        /// none, mutex, holdwait, preemption, circular
        #[arg(short, long, default_value = "none")]
        policy: Policy,

        /// File of `process,resource,A|R` events
        #[arg(short, long)]
        scenario: PathBuf,
    },

    /// Run CPU scheduling disciplines over a process list
    Schedule {
        /// File of `name,arrival,burst[,priority]` rows
        #[arg(short, long)]
        input: PathBuf,

        /// fcfs, rr, spn, srt, hrrn, priority (repeatable)
        #[arg(short, long)]
        algorithm: Vec<AlgorithmKind>,

        /// Round Robin quantum
        #[arg(short, long)]
        quantum: Option<u32>,

        /// Priority gained per tick of waiting
        #[arg(long)]
        aging_rate: Option<i64>,

        /// Idle ticks per context switch
        #[arg(long)]
        context_switch: Option<u32>,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Markdown,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SimulatorConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimulatorConfig::from_env()?,
    };
    init_tracing(&config);

    match cli.command {
        Commands::Detect {
            processes,
            resources,
            allocations,
            requests,
            step,
        } => cmd_detect(&config, processes, resources, &allocations, &requests, step)?,
        Commands::Bankers {
            available,
            max,
            allocation,
            trace,
        } => cmd_bankers(&config, &available, &max, &allocation, trace)?,
        Commands::Prevent { policy, scenario } => cmd_prevent(policy, &scenario)?,
        Commands::Schedule {
            input,
            algorithm,
            quantum,
            aging_rate,
            context_switch,
            format,
        } => {
            let mut config = config;
            if let Some(q) = quantum {
                config.scheduler.quantum = q;
            }
            if let Some(a) = aging_rate {
                config.scheduler.aging_rate = a;
            }
            if let Some(c) = context_switch {
                config.scheduler.context_switch_overhead = c;
            }
            if !algorithm.is_empty() {
                config.scheduler.algorithms = algorithm;
            }
            config.validate()?;
            cmd_schedule(&config, &input, format)?
        }
    }

    Ok(())
}

fn init_tracing(config: &SimulatorConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format == "compact" {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
            .init();
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn cmd_detect(
    config: &SimulatorConfig,
    processes: Option<usize>,
    resources: Option<usize>,
    allocations: &Path,
    requests: &Path,
    step: bool,
) -> Result<()> {
    let input = DetectionInput {
        process_count: Some(processes.unwrap_or(config.detection.default_process_count)),
        resource_count: Some(resources.unwrap_or(config.detection.default_resource_count)),
        allocations: parse::parse_edges(&read(allocations)?),
        requests: parse::parse_edges(&read(requests)?),
    };

    let mut session = SimulationSession::new(CycleDetector, input)?;
    info!("Detection session {}", session.signature());

    println!("{}", "Deadlock Detection".cyan().bold());
    println!("{}", "━".repeat(50));

    if step {
        while !session.is_complete() {
            let shown = session.step();
            match session.visible_steps().last() {
                Some(cycle) if session.visible_steps().len() == shown => {
                    println!("Step {}: {}", shown, cycle.to_string().red());
                }
                _ => println!("Step {}: no cycle found", shown),
            }
        }
    } else {
        session.run_to_completion();
        for (i, cycle) in session.visible_steps().iter().enumerate() {
            println!("Cycle {}: {}", i + 1, cycle.to_string().red());
        }
    }

    let detection = session.outcome();
    if detection.is_deadlocked() {
        println!(
            "\n{} Deadlocked processes: {}",
            "✗".red().bold(),
            detection.deadlocked_processes().join(", ")
        );
    } else {
        println!("\n{}", "✓ No deadlock detected".green().bold());
    }

    Ok(())
}

fn cmd_bankers(
    config: &SimulatorConfig,
    available: &str,
    max: &Path,
    allocation: &Path,
    trace: bool,
) -> Result<()> {
    let input = BankersInput::new(
        parse::parse_vector(available),
        parse::parse_matrix(&read(max)?),
        parse::parse_matrix(&read(allocation)?),
    );
    let engine = SafetyEngine::with_max_passes(config.banker.max_passes);
    let mut session = SimulationSession::new(engine, input)?;
    session.run_to_completion();
    let outcome = session.outcome();

    println!("{}", "Banker's Algorithm".cyan().bold());
    println!("{}", "━".repeat(50));

    println!("{}", "Need matrix:".bold());
    for (i, row) in outcome.need.iter().enumerate() {
        println!("  P{}: {}", i, vector::format(row));
    }

    if trace {
        println!("\n{}", "Trace:".bold());
        for step in session.visible_steps() {
            let verdict = if step.finished {
                "granted".green()
            } else {
                "waits".yellow()
            };
            println!(
                "  {} need {} work {} -> {} {}",
                step.label(),
                vector::format(&step.need),
                vector::format(&step.work_before),
                vector::format(&step.work_after),
                verdict
            );
        }
    }

    println!();
    if outcome.safe {
        println!("{}", "✓ System is in a SAFE state".green().bold());
        println!("  Safe sequence: {}", outcome.sequence.join(" -> "));
    } else {
        println!("{}", "✗ System is in an UNSAFE state".red().bold());
        if !outcome.sequence.is_empty() {
            println!("  Partial sequence: {}", outcome.sequence.join(" -> "));
        }
    }
    println!("  Final work: {}", vector::format(&outcome.final_work));

    Ok(())
}

fn cmd_prevent(policy: Policy, scenario: &Path) -> Result<()> {
    let events = parse::parse_events(&read(scenario)?)?;
    let report = PreventionSimulator::simulate(&events, policy);

    println!(
        "{} {}",
        "Deadlock Prevention:".cyan().bold(),
        policy.display_name()
    );
    println!("{}", "━".repeat(50));

    for event in &report.timeline {
        let tag = match event.outcome {
            Outcome::Allowed => "ALLOWED".green(),
            Outcome::Blocked => "BLOCKED".yellow(),
            Outcome::Prevented => "PREVENTED".red(),
        };
        println!("{} [{}] {}", event, tag, event.reason);
    }

    println!(
        "\nAllowed: {}  Blocked: {}  Prevented: {}",
        report.allowed, report.blocked, report.prevented
    );
    Ok(())
}

fn cmd_schedule(config: &SimulatorConfig, input: &Path, format: Format) -> Result<()> {
    let specs = parse::parse_processes(&read(input)?)?;
    let engine = SchedulerEngine::new(specs);
    let results = engine.run_all(&config.scheduler.algorithms());

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        Format::Markdown => print!("{}", scheduler::export_markdown(&results)),
        Format::Text if results.is_empty() => {
            println!("{}", "No scheduling algorithms selected".yellow())
        }
        Format::Text => print_results(&results),
    }
    Ok(())
}

fn print_results(results: &[SchedulerResult]) {
    for result in results {
        println!("\n{}", result.name.cyan().bold());
        println!("{}", "━".repeat(50));
        print!("{}", scheduler::gantt_chart(&result.timeline));
        print!("{}", scheduler::report::process_table(result));

        match &result.stats {
            Some(stats) => {
                println!("  Avg Turnaround: {:.2}", stats.avg_turnaround);
                println!("  Avg Waiting:    {:.2}", stats.avg_waiting);
                println!("  CPU Utilization: {:.2}%", stats.cpu_utilization);
            }
            None => println!("  {}", "No process completed".yellow()),
        }
    }

    if let Some(cmp) = scheduler::compare(results) {
        println!("\n{}", "Comparison".green().bold());
        for row in &cmp.rows {
            let mark = |best: bool| if best { "*" } else { " " };
            println!(
                "  {:<40} {:>8.2}{} {:>8.2}{} {:>7.2}%{}",
                row.name,
                row.stats.avg_turnaround,
                mark(row.best_turnaround),
                row.stats.avg_waiting,
                mark(row.best_waiting),
                row.stats.cpu_utilization,
                mark(row.best_utilization)
            );
        }
    }
}
