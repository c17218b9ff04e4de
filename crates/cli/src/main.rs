//! Command-line front-end for the tilefall solver.
//!
//! Loads a board file, runs the selected search strategy against the
//! clock, then replays the winning sequence board by board and reports
//! the score and node count.

use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tilefall_board::{Board, Color};
use tilefall_clickomania::ClickBoard;
use tilefall_core::GameState;
use tilefall_mcts::{
    concurrent_search, confident_search, meta_search, new_root, node_count, select_ucb,
    UcbFormula, CMCT_EXPLORATION, DEFAULT_BEST_WEIGHT, DEFAULT_EPSILON, UCT_EXPLORATION,
};
use tilefall_samegame::SameBoard;

/// Tilefall puzzle solver.
#[derive(Parser)]
#[command(name = "tilefall")]
#[command(about = "Solve SameGame and Clickomania boards with Monte-Carlo tree search")]
struct Cli {
    /// Board file: a `H W` header line then H rows of R G Y B V I O -.
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Thinking time, e.g. "90s" or "10m".
    #[arg(short = 't', long = "time", default_value = "1m")]
    time: humantime::Duration,

    /// Search strategy.
    #[arg(long, value_enum, default_value_t = Strategy::Cmct)]
    strategy: Strategy,

    /// Puzzle rules to score under.
    #[arg(long, value_enum, default_value_t = Game::Samegame)]
    game: Game,

    /// Confidence bound formula.
    #[arg(long, value_enum, default_value_t = Formula::Tuned)]
    ucb: Formula,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Classical synchronous UCT.
    Uct,
    /// Concurrent pipelined search.
    Cmct,
    /// Time-sliced concurrent search.
    Meta,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Game {
    Samegame,
    Clickomania,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Formula {
    Ucb1,
    Tuned,
    Ucbv,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    select_ucb(match cli.ucb {
        Formula::Ucb1 => UcbFormula::Ucb1,
        Formula::Tuned => UcbFormula::TunedSp,
        Formula::Ucbv => UcbFormula::UcbV,
    });

    let input = fs::read_to_string(&cli.file)
        .with_context(|| format!("reading {}", cli.file.display()))?;
    let board = Board::parse(&input)
        .with_context(|| format!("parsing {}", cli.file.display()))?;

    match cli.game {
        Game::Samegame => solve(
            SameBoard::from_board(board),
            tilefall_samegame::taboo_color,
            cli.strategy,
            cli.time.into(),
        ),
        Game::Clickomania => solve(
            ClickBoard::from_board(board),
            tilefall_clickomania::taboo_color,
            cli.strategy,
            cli.time.into(),
        ),
    }
}

fn solve<S: GameState>(
    state: S,
    policy: S::Policy,
    strategy: Strategy,
    budget: Duration,
) -> Result<()> {
    println!("{}", paint(&state));

    let exploration = match strategy {
        Strategy::Uct => UCT_EXPLORATION,
        Strategy::Cmct | Strategy::Meta => CMCT_EXPLORATION,
    };
    let root = new_root(
        state.clone(),
        DEFAULT_EPSILON,
        exploration,
        DEFAULT_BEST_WEIGHT,
    );
    let policies = vec![policy];

    info!(?strategy, budget = ?budget, "search starting");
    let start = Instant::now();
    let best = match strategy {
        Strategy::Uct => confident_search(&root, &policies, budget),
        Strategy::Cmct => concurrent_search(&root, &policies, budget),
        Strategy::Meta => meta_search(&root, &policies, budget),
    };
    let elapsed = start.elapsed();
    drop(root);

    if best.moves().is_empty() {
        println!("{}", "no sequence found".yellow());
    }

    let mut replay = state;
    for (i, mv) in best.moves().iter().enumerate() {
        replay = replay.play(mv);
        println!("\n#{} removed: {}", i + 1, mv);
        println!("{}", paint(&replay));
    }

    println!(
        "\n{:?} took {:?}, score {} ({} nodes)",
        strategy,
        elapsed,
        format!("{}", best.score()).green().bold(),
        node_count()
    );

    Ok(())
}

/// Renders a position with its colour letters painted.
fn paint<S: GameState>(state: &S) -> String {
    let plain = state.to_string();
    let mut out = String::with_capacity(plain.len() * 4);

    for ch in plain.chars() {
        let painted = match Color::from_letter(ch) {
            Some(Color::Red) => "R".red().to_string(),
            Some(Color::Green) => "G".green().to_string(),
            Some(Color::Yellow) => "Y".yellow().to_string(),
            Some(Color::Blue) => "B".blue().to_string(),
            Some(Color::Violet) => "V".magenta().to_string(),
            Some(Color::Indigo) => "I".bright_blue().to_string(),
            Some(Color::Orange) => "O".bright_red().to_string(),
            _ => ch.to_string(),
        };
        let _ = write!(out, "{}", painted);
    }

    out
}
