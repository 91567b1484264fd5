use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process::exit,
    time::SystemTime,
};

use clap::{Args, Parser, Subcommand};
use kit_chess::{
    board::Board,
    game::{Game, GameConfig, PlayerKind},
    promotion::PromotionKind,
    terminal::TerminalFrontend,
};
use log::{LevelFilter, error, info};
use num_format::{Locale, ToFormattedString};
use rand::{SeedableRng, rngs::StdRng};

build_info::build_info!(fn build_info);

#[derive(Parser, Debug)]
#[command(about = "Chess against a random mover")]
struct Cli {
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    /// Write the log here instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a game in the terminal (default)
    Play(PlayArgs),
    /// Count move paths from the starting position
    Perft {
        #[arg(long, default_value_t = 3)]
        depth: u8,

        /// Print the count below each first move
        #[arg(long)]
        divide: bool,
    },
    /// Print build information
    Version,
}

#[derive(Args, Debug)]
struct PlayArgs {
    #[arg(long, value_enum, default_value_t = PlayerKind::Human)]
    white: PlayerKind,

    #[arg(long, value_enum, default_value_t = PlayerKind::Random)]
    black: PlayerKind,

    /// Seed for the random mover
    #[arg(long)]
    seed: Option<u64>,

    /// Piece a random mover promotes to
    #[arg(long, value_enum, default_value_t = PromotionKind::Queen)]
    auto_promotion: PromotionKind,

    /// Stop a game between two random movers after this many plies
    #[arg(long, default_value_t = 500)]
    max_plies: usize,
}

impl Default for PlayArgs {
    fn default() -> Self {
        Self {
            white: PlayerKind::Human,
            black: PlayerKind::Random,
            seed: None,
            auto_promotion: PromotionKind::Queen,
            max_plies: 500,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = setup_logger(cli.log_level, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
        exit(1);
    }
    log_panics::init();

    let build = build_info();
    info!("Starting {} {}", build.crate_info.name, build.crate_info.version);

    let result = match cli.command.unwrap_or_else(|| Command::Play(PlayArgs::default())) {
        Command::Play(args) => play(args),
        Command::Perft { depth, divide } => {
            let stats = Board::starting_position().start_perft(depth, divide);
            println!(
                "depth {depth}: {} nodes, {} captures, {} checks",
                stats.nodes.to_formatted_string(&Locale::en),
                stats.captures.to_formatted_string(&Locale::en),
                stats.checks.to_formatted_string(&Locale::en)
            );
            Ok(())
        }
        Command::Version => {
            println!("{} {}", build.crate_info.name, build.crate_info.version);
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("Terminal I/O failed: {e}");
        eprintln!("Terminal I/O failed: {e}");
        exit(1);
    }
}

fn play(args: PlayArgs) -> io::Result<()> {
    let config = GameConfig {
        white: args.white,
        black: args.black,
        auto_promotion: args.auto_promotion,
    };
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    info!("Starting game {config:?} seed {:?}", args.seed);

    let mut game = Game::new(config, rng);
    let mut frontend = TerminalFrontend::new(io::stdin().lock(), io::stdout());

    if config.white == PlayerKind::Random && config.black == PlayerKind::Random {
        frontend.run_self_play(&mut game, args.max_plies)?;
    } else {
        frontend.run(&mut game)?;
    }

    frontend.into_output().flush()
}

fn setup_logger(level: LevelFilter, log_file: Option<&Path>) -> Result<(), fern::InitError> {
    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level);

    let dispatch = match log_file {
        Some(path) => dispatch.chain(fern::log_file(path)?),
        None => dispatch.chain(io::stderr()),
    };

    dispatch.apply()?;
    Ok(())
}
