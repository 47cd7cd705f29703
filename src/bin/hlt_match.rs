//! Command-line front end: validate definition files, print their tables,
//! and run the channel evaluator over a JSON-lines event file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hlt_match::{
    Bookkeeper, ChannelEvaluator, DataKind, Event, MatchConfig, ObjectKind, Result,
    TriggerDefinitions, TriggerError, WorkingPointLadder,
};

#[derive(Parser)]
#[command(name = "hlt-match")]
#[command(about = "Trigger-object matching for HLT validation", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a definition file and report whether it is consistent
    Validate {
        /// Definition file
        file: PathBuf,
    },
    /// Print the trigger tables of a definition file
    Summary {
        /// Definition file
        file: PathBuf,
    },
    /// Evaluate channels over a JSON-lines event file
    Check(CheckArgs),
}

#[derive(Args)]
struct CheckArgs {
    /// Definition file
    #[arg(short, long, conflicts_with = "definitions_dir")]
    definitions: Option<PathBuf>,

    /// Directory holding tau_triggers_<year>.json files
    #[arg(long, requires = "year")]
    definitions_dir: Option<PathBuf>,

    /// Data-taking year, used with --definitions-dir
    #[arg(short, long)]
    year: Option<u32>,

    /// Which combination table to use
    #[arg(long, default_value = "mc")]
    data_kind: DataKind,

    /// Event file, one JSON record per line
    #[arg(short, long)]
    events: PathBuf,

    /// Channels to evaluate (default: all)
    #[arg(short, long = "channel")]
    channels: Vec<String>,

    /// ΔR matching cone
    #[arg(long, default_value_t = hlt_match::core::DEFAULT_CONE_RADIUS)]
    cone: f64,

    /// Minimum ΔR between pair members
    #[arg(long, default_value_t = hlt_match::core::DEFAULT_PAIR_SEPARATION)]
    pair_dr: f64,

    /// Minimum ΔR between the trigger objects of a cross pair
    #[arg(long, default_value_t = hlt_match::core::DEFAULT_OBJECT_SEPARATION)]
    object_dr: f64,

    /// Tau MVA working points to count separately
    #[arg(long = "tau-wp", value_delimiter = ',')]
    tau_working_points: Vec<String>,

    /// Apply the legs' offline pT and |η| cuts to candidates
    #[arg(long)]
    offline_cuts: bool,

    /// Stop after this many events
    #[arg(long)]
    max_events: Option<u64>,

    /// Print the results as JSON
    #[arg(long)]
    json: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Validate { file } => validate(&file),
        Commands::Summary { file } => TriggerDefinitions::load(&file).map(|defs| {
            print!("{}", defs.summary());
        }),
        Commands::Check(args) => check(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn validate(file: &Path) -> Result<()> {
    let defs = TriggerDefinitions::load(file)?;
    println!(
        "{}: {} filter bits, {} paths, {} data channels, {} mc channels",
        file.display(),
        defs.filter_bits().len(),
        defs.paths().len(),
        defs.combinations(DataKind::Data).len(),
        defs.combinations(DataKind::Mc).len(),
    );
    Ok(())
}

fn check(args: &CheckArgs) -> Result<()> {
    let defs = match (&args.definitions, &args.definitions_dir, args.year) {
        (Some(file), _, _) => TriggerDefinitions::load(file)?,
        (None, Some(dir), Some(year)) => TriggerDefinitions::for_year(dir, year)?,
        _ => {
            return Err(TriggerError::schema(
                "either --definitions or --definitions-dir with --year is required",
            ))
        }
    };

    let config = match_config(args)?;
    let evaluator = if args.channels.is_empty() {
        ChannelEvaluator::new(&defs, args.data_kind, config)?
    } else {
        ChannelEvaluator::with_channels(&defs, args.data_kind, config, &args.channels)?
    };
    tracing::info!(
        data_kind = %args.data_kind,
        channels = %evaluator.channels().join(", "),
        "Evaluating"
    );

    let file = File::open(&args.events).map_err(|source| TriggerError::Io {
        path: args.events.clone(),
        source,
    })?;
    let mut book = Bookkeeper::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        if args.max_events.is_some_and(|max| book.events() >= max) {
            break;
        }
        let line = line.map_err(|source| TriggerError::Io {
            path: args.events.clone(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(&line).map_err(|e| {
            TriggerError::schema(format!("{}:{}: {e}", args.events.display(), number + 1))
        })?;
        book.record(&evaluator.evaluate_event(&event));

        if book.events() % 100_000 == 0 {
            tracing::info!(events = book.events(), "Progress");
        }
    }
    tracing::info!(events = book.events(), "Done");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&book)?);
    } else {
        print!("{book}");
    }
    Ok(())
}

fn match_config(args: &CheckArgs) -> Result<MatchConfig> {
    if args.cone <= 0.0 {
        return Err(TriggerError::schema(format!(
            "cone radius must be positive, got {}",
            args.cone
        )));
    }
    if args.pair_dr < 0.0 {
        return Err(TriggerError::schema(format!(
            "pair separation must not be negative, got {}",
            args.pair_dr
        )));
    }

    if args.object_dr < 0.0 {
        return Err(TriggerError::schema(format!(
            "object separation must not be negative, got {}",
            args.object_dr
        )));
    }

    let mut config = MatchConfig::new()
        .with_cone_radius(args.cone)
        .with_pair_separation(args.pair_dr)
        .with_object_separation(args.object_dr);
    if !args.tau_working_points.is_empty() {
        let names: Vec<&str> = args.tau_working_points.iter().map(String::as_str).collect();
        let ladder = WorkingPointLadder::tau_mva(&names).map_err(TriggerError::Schema)?;
        config = config.with_working_points(ObjectKind::Tau, ladder);
    }
    if args.offline_cuts {
        config = config.with_offline_cuts();
    }
    Ok(config)
}
