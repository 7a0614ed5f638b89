use std::io;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;

use amorphgen::analysis::validation;
use amorphgen::config::RunConfig;
use amorphgen::core::composition::CompositionSpec;
use amorphgen::core::domain::Periodicity;
use amorphgen::engine::external::xyz::XyzTrajectory;
use amorphgen::engine::generator;

// --- CLI Definitions ---

#[derive(Parser, Debug)]
#[command(author, version, about = "Random amorphous structures and quench schedules", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all logging
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a random structure and write it as extended XYZ
    Generate(GenerateArgs),
    /// Write the quench temperature ramp as CSV
    Schedule(ScheduleArgs),
    /// Print the default run configuration as JSON
    Config,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// JSON run configuration; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Species ratios, e.g. "Si=0.5,O=0.5"
    #[arg(long)]
    composition: Option<String>,

    /// Number of atoms to place
    #[arg(short = 'n', long)]
    atoms: Option<usize>,

    /// Cubic box edge (Angstroms)
    #[arg(short, long)]
    box_size: Option<f64>,

    /// Minimum interatomic distance (Angstroms)
    #[arg(short, long)]
    min_distance: Option<f64>,

    /// Placement draws per atom before giving up
    #[arg(long)]
    max_attempts: Option<usize>,

    /// RNG seed for reproducible structures
    #[arg(short, long)]
    seed: Option<u64>,

    /// Disable periodic boundaries on all axes
    #[arg(long)]
    no_pbc: bool,

    /// Output file
    #[arg(short, long, default_value = "structure.xyz")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct ScheduleArgs {
    /// JSON run configuration; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start temperature (K)
    #[arg(long)]
    start: Option<f64>,

    /// End temperature (K)
    #[arg(long)]
    end: Option<f64>,

    /// Number of quench steps
    #[arg(long)]
    steps: Option<usize>,

    /// Output CSV file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct RampRow {
    step: usize,
    target_temperature: f64,
}

// --- Initialization Helpers ---

fn setup_logging(verbosity: u8, quiet: bool) -> Result<()> {
    let level = if quiet {
        LevelFilter::OFF
    } else {
        match verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}

fn load_config(path: Option<&PathBuf>) -> Result<RunConfig> {
    match path {
        Some(p) => RunConfig::from_json_file(p),
        None => Ok(RunConfig::default()),
    }
}

// --- Commands ---

fn run_generate(args: GenerateArgs) -> Result<()> {
    let mut generation = load_config(args.config.as_ref())?.generation;

    if let Some(c) = &args.composition {
        generation.composition = c
            .parse::<CompositionSpec>()
            .context("Invalid --composition")?;
    }
    if let Some(n) = args.atoms {
        generation.total_atoms = n;
    }
    if let Some(b) = args.box_size {
        generation.box_size = b;
    }
    if let Some(d) = args.min_distance {
        generation.min_distance = d;
    }
    if let Some(m) = args.max_attempts {
        generation.max_attempts = m;
    }
    if args.seed.is_some() {
        generation.seed = args.seed;
    }
    if args.no_pbc {
        generation.pbc = Periodicity::NONE;
    }

    let seed = generation.seed.unwrap_or_else(rand::random);
    log::info!("Using seed {seed}");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let atoms = generator::generate(&generation.composition, &generation.params(), &mut rng)?;

    if let Some(pair) = validation::closest_pair(&atoms) {
        log::info!(
            "Closest pair: atoms {} and {} at {:.4} Å",
            pair.i,
            pair.j,
            pair.distance
        );
    }
    for (species, count) in validation::species_counts(&atoms, &generation.composition) {
        log::info!("{species}: {count}");
    }

    let mut out = XyzTrajectory::create(&args.output)?;
    out.write_structure(&atoms)?;
    println!(
        "Wrote {} atoms to {} (seed {seed})",
        atoms.len(),
        args.output.display()
    );
    Ok(())
}

fn run_schedule(args: ScheduleArgs) -> Result<()> {
    let mut quench = load_config(args.config.as_ref())?.quench;
    if let Some(t) = args.start {
        quench.start_temp = t;
    }
    if let Some(t) = args.end {
        quench.end_temp = t;
    }
    if let Some(n) = args.steps {
        quench.total_steps = n;
    }
    // Surfaces a bad thermostat name before anything is written.
    let thermostat = quench.thermostat()?;
    let schedule = quench.schedule()?;
    log::info!(
        "{} ramp {} -> {} K over {} steps",
        thermostat.kind(),
        schedule.start_temperature(),
        schedule.end_temperature(),
        schedule.total_steps()
    );

    let writer: Box<dyn io::Write> = match &args.output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    let mut csv = csv::Writer::from_writer(writer);
    for (step, target_temperature) in schedule.iter() {
        csv.serialize(RampRow {
            step,
            target_temperature,
        })?;
    }
    csv.flush()?;
    Ok(())
}

// --- Main ---

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet)?;

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Schedule(args) => run_schedule(args),
        Command::Config => {
            println!("{}", RunConfig::default().to_json_pretty()?);
            Ok(())
        }
    }
}
