use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use dealer::{DealScheduler, SeatLayout, SimTurret, Strategy};
use dealer_sim::{load_config, run_session, Mode, Recorder, SessionOutcome, SessionSpec};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeArg {
    /// Round-robin, one card per seat visit
    Sequential,
    /// Random seat per card
    Random,
    /// Shuffled deck, dealt in bursts
    Shuffle,
    /// Sort the tray onto the color piles
    Sort,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Sequential => Mode::Deal(Strategy::Sequential),
            ModeArg::Random => Mode::Deal(Strategy::WeightedRandom),
            ModeArg::Shuffle => Mode::Deal(Strategy::ShuffledBursts),
            ModeArg::Sort => Mode::Sort,
        }
    }
}

#[derive(Parser)]
struct Args {
    /// Path to a JSON config file, defaults are used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = ModeArg::Shuffle)]
    mode: ModeArg,

    /// Number of evenly spaced seats
    #[arg(short, long, default_value_t = 4)]
    seats: usize,

    /// Seat headings in degrees, overrides --seats
    #[arg(long, value_delimiter = ',')]
    seat_headings: Vec<f64>,

    #[arg(long, default_value_t = 13)]
    cards_per_seat: usize,

    /// How many deals to run back to back
    #[arg(long, default_value_t = 1)]
    cycles: usize,

    /// Upper bound on cards fed in sort mode
    #[arg(long, default_value_t = 60)]
    max_sort_cards: usize,

    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Record each session's journal as a JSON file into this directory
    #[arg(short, long)]
    record_sessions_to_directory: Option<PathBuf>,

    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,
}

fn print_outcome(outcome: &SessionOutcome) {
    match outcome {
        SessionOutcome::Dealt { cycles } => {
            for (idx, report) in cycles.iter().enumerate() {
                eprintln!(
                    "Deal {}: {} cards {:?}, {} visits, {} missed headings, {} feeder timeouts",
                    idx + 1,
                    report.total(),
                    report.per_seat,
                    report.visits,
                    report.missed_headings,
                    report.dispense_timeouts
                );
            }
        }
        SessionOutcome::Sorted(report) => {
            let reason = if report.stopped_on_empty_tray {
                "tray empty"
            } else {
                "card limit reached"
            };
            eprintln!(
                "Sorted {} cards ({}): piles {:?}, {} unknown",
                report.total(),
                reason,
                report.per_pile,
                report.unknown
            );
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    initialize_logging(args.log_level);

    let config = load_config(args.config.as_deref())?;

    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut recorder = if let Some(dir_path) = args.record_sessions_to_directory {
        Some(Recorder::new(dir_path)?)
    } else {
        None
    };

    let seats = if args.seat_headings.is_empty() {
        SeatLayout::evenly_spaced(args.seats)?
    } else {
        SeatLayout::explicit(&args.seat_headings)?
    };

    let spec = SessionSpec {
        mode: args.mode.into(),
        seats,
        cards_per_seat: args.cards_per_seat,
        cycles: args.cycles,
        max_sort_cards: args.max_sort_cards,
    };

    let mut scheduler = DealScheduler::new(SimTurret::new(), config)?;
    let outcome = run_session(&mut scheduler, &spec, &mut rng, &mut recorder)?;
    print_outcome(&outcome);

    Ok(())
}

fn initialize_logging(level: LevelFilter) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
