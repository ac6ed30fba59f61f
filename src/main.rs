use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use rand::prelude::*;
use sched_model::{
    Policy, PowerProfile, Process, SchedCoreEvent, SimConfig, SimulationResult,
    api::SimulationRequest, compare_all, simulate,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Compare CPU scheduling policies on a workload
#[derive(Parser, Debug)]
#[command(name = "sched_model", version)]
struct Args {
    /// JSON request file: {processes, algorithm?, timeQuantum?, powerProfile?}
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Policy to run (FCFS, SJF, SRTF, "Round Robin", Priority)
    #[arg(short, long)]
    algorithm: Option<String>,

    /// Run every policy and print a comparison
    #[arg(long, conflicts_with = "algorithm")]
    compare: bool,

    /// Round Robin time quantum in ticks
    #[arg(short, long)]
    quantum: Option<u64>,

    /// Active, idle and sleep power in watts
    #[arg(long, num_args = 3, value_names = ["ACTIVE", "IDLE", "SLEEP"])]
    power: Option<Vec<f64>>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Print the core event log
    #[arg(long)]
    events: bool,

    /// Ticks of generated arrivals when no input file is given
    #[arg(long, default_value_t = 40)]
    ticks: u64,

    /// Seed for the generated workload
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let request = match &args.input {
        Some(path) => {
            let body = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            SimulationRequest::from_json(&body)?
        }
        None => SimulationRequest::default(),
    };

    let mut config: SimConfig = request.config();
    if let Some(quantum) = args.quantum {
        config = config.with_time_quantum(quantum);
    }
    if let Some(watts) = &args.power {
        let &[active, idle, sleep] = watts.as_slice() else {
            bail!("--power takes exactly three values");
        };
        config = config.with_power_profile(PowerProfile::new(active, idle, sleep));
    }

    let processes = match request.processes {
        Some(processes) => processes,
        None => {
            let processes = bernoulli_jobs(args.ticks, 0.3, 0.3, 2, 6, args.seed);
            info!(count = processes.len(), seed = args.seed, "generated workload");
            processes
        }
    };

    if args.compare {
        let comparison = compare_all(&processes, &config);
        if args.json {
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        } else {
            print_comparison(&comparison.runs);
            if let Some(best) = comparison.lowest_waiting_time() {
                println!("Lowest average waiting time: {}", best.algorithm);
            }
            if let Some(best) = comparison.most_energy_efficient() {
                println!("Most energy efficient: {}", best.algorithm);
            }
        }
        return Ok(());
    }

    let algorithm = args
        .algorithm
        .or(request.algorithm)
        .unwrap_or_else(|| Policy::Fcfs.as_str().to_string());
    let policy: Policy = algorithm.parse()?;
    let result = simulate(&processes, policy, &config);

    if args.events {
        for event in &result.events {
            println!("t={} {:?}", event.at(), event);
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let use_json = std::env::var("SCHED_MODEL_LOG_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if use_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

fn print_summary(result: &SimulationResult) {
    println!("Algorithm: {}", result.algorithm);
    for segment in &result.timeline {
        println!(
            "  [{:>4}, {:>4})  process {}",
            segment.start_time, segment.end_time, segment.process_id
        );
    }

    let idle_jumps = result
        .events
        .iter()
        .filter(|event| matches!(event, SchedCoreEvent::CpuIdle { .. }))
        .count();

    let m = &result.metrics;
    let e = &result.energy;
    println!("Total execution time: {} ticks", result.total_execution_time);
    println!("Average waiting time: {:.2} ticks", m.average_waiting_time);
    println!("Average turnaround time: {:.2} ticks", m.average_turnaround_time);
    println!("Average response time: {:.2} ticks", m.average_response_time);
    println!("CPU utilization: {:.1}%", m.cpu_utilization);
    println!("Throughput: {:.3} processes/tick", m.throughput);
    println!("Idle periods: {idle_jumps}");
    println!(
        "Energy: {:.1} J (active {:.1}, idle {:.1}, sleep {:.1})",
        e.total_energy, e.active_energy, e.idle_energy, e.sleep_energy
    );
    println!("Average power: {:.2} W", e.average_power);
    println!("Energy efficiency: {:.1}/100", e.energy_efficiency);
}

fn print_comparison(runs: &[SimulationResult]) {
    println!(
        "{:<12} {:>8} {:>11} {:>9} {:>7} {:>10} {:>10}",
        "algorithm", "wait", "turnaround", "response", "util%", "energy J", "efficiency"
    );
    for run in runs {
        println!(
            "{:<12} {:>8.2} {:>11.2} {:>9.2} {:>7.1} {:>10.1} {:>10.1}",
            run.algorithm.as_str(),
            run.metrics.average_waiting_time,
            run.metrics.average_turnaround_time,
            run.metrics.average_response_time,
            run.metrics.cpu_utilization,
            run.energy.total_energy,
            run.energy.energy_efficiency,
        );
    }
}

fn bernoulli_jobs(
    ticks: u64,
    p_arrival: f64,
    p_short: f64,
    short_ticks: i64,
    long_ticks: i64,
    seed: u64,
) -> Vec<Process> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut processes = Vec::new();

    for t in 0..ticks {
        if rng.random::<f64>() < p_arrival {
            let burst_time = if rng.random::<f64>() < p_short {
                short_ticks
            } else {
                long_ticks
            };

            let id = processes.len() as u64 + 1;
            processes.push(
                Process::new(id, t as i64, burst_time).with_priority(rng.random_range(1..=5)),
            );
        }
    }

    processes
}
