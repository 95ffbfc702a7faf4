use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{bail, WrapErr};

use bdd_reach::automaton::Network;
use bdd_reach::bdd::{Bdd, BddConfig};
use bdd_reach::modgraph::{load_automaton, read_sync};
use bdd_reach::reach::{ImageStrategy, LogProgress, ReachConfig, Reachability};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Strategy {
    Monolithic,
    Partitioned,
}

impl From<Strategy> for ImageStrategy {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Monolithic => ImageStrategy::Monolithic,
            Strategy::Partitioned => ImageStrategy::Partitioned,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Synchronization alphabet, one action per line.
    #[arg(long, value_name = "FILE")]
    sync: PathBuf,

    /// Automata in `.modgraph` format, named after their file stems.
    #[arg(value_name = "FILE", required = true)]
    models: Vec<PathBuf>,

    /// Verbosity (-v for per-iteration progress, -vv for debug output).
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// How to compute images.
    #[arg(long, value_enum, default_value = "partitioned")]
    strategy: Strategy,

    /// Maximum number of live nodes.
    #[arg(long, value_name = "INT")]
    node_budget: Option<usize>,

    /// Maximum number of bits per state block.
    #[arg(long, value_name = "INT", default_value = "16")]
    max_width: usize,

    /// Compute images from the whole reachable set instead of the frontier.
    #[arg(long)]
    no_frontier: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    let level = match args.verbose {
        0 => simplelog::LevelFilter::Warn,
        1 => simplelog::LevelFilter::Info,
        2 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;
    log::debug!("args = {:?}", args);

    let time_total = std::time::Instant::now();

    let sync = read_sync(&args.sync).wrap_err_with(|| format!("reading {}", args.sync.display()))?;
    let mut automata = Vec::with_capacity(args.models.len());
    for path in &args.models {
        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            bail!("cannot name automaton after {}", path.display());
        };
        let automaton = load_automaton(id, path, &sync).wrap_err_with(|| format!("reading {}", path.display()))?;
        log::info!("{}", automaton);
        automata.push(automaton);
    }
    let network = Network::new(automata, sync);

    let mut config = BddConfig::default();
    if let Some(budget) = args.node_budget {
        config = config.with_node_budget(budget);
    }
    let bdd = Bdd::with_config(config);

    let reach_config = ReachConfig::default()
        .with_max_state_width(args.max_width)
        .with_strategy(args.strategy.into())
        .with_frontier(!args.no_frontier);
    let mut reach = Reachability::new(&bdd, &network, reach_config)?;
    let outcome = reach.run(&mut LogProgress)?;

    println!("States: {}", outcome.states);
    println!("Transitions: {}", outcome.transitions);
    println!("Iterations: {}", outcome.iterations);
    log::info!("bdd = {:?}", bdd);

    let time_total = time_total.elapsed();
    log::info!("All done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
