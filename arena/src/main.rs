use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::fs::File;
use std::path::PathBuf;
use ttt_engine::board::{Mark, Outcome};
use ttt_engine::config::{AppConfig, LearnerConfig, RateMode};
use ttt_engine::error::{DecisionError, GameError};
use ttt_engine::learner::QLearner;
use ttt_engine::players::{LearnerPlayer, MinimaxPlayer, Player};
use ttt_engine::q_table::{self, QTable};
use ttt_engine::stats::Tally;
use ttt_engine::Game;

mod human;

use human::HumanPlayer;

#[derive(Parser, Debug)]
#[command(name = "ttt-arena", about = "Tic-tac-toe: a Q-learning agent against minimax (or you)")]
struct Cli {
    /// TOML configuration file; defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train the learner against minimax and print the tally.
    Train {
        #[arg(long)]
        games: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Decay the learner's rates. Without --config this also switches to
        /// the decaying preset's starting rates; with --config only the rate
        /// mode changes.
        #[arg(long)]
        decaying: bool,
        /// Continue from a saved table (.json or .pickle).
        #[arg(long)]
        resume: Option<PathBuf>,
        /// Save the learned table into the archive directory.
        #[arg(long)]
        save: bool,
        /// Write the tally and its per-game history as JSON.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Let minimax play itself from the empty board.
    Oracle,
    /// Play at the terminal.
    Play {
        #[arg(long, value_enum, default_value_t = Opponent::Minimax)]
        opponent: Opponent,
        /// Saved table for the learner opponent.
        #[arg(long)]
        table: Option<PathBuf>,
        /// Your mark; X moves first.
        #[arg(long, default_value = "X")]
        mark: Mark,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Opponent {
    Minimax,
    Learner,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let from_file = cli.config.is_some();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    match cli.command {
        Command::Train {
            games,
            seed,
            decaying,
            resume,
            save,
            report,
        } => {
            let config = train_config(config, from_file, games, seed, decaying);
            train(config, resume, save, report)
        }
        Command::Oracle => oracle(),
        Command::Play {
            opponent,
            table,
            mark,
        } => play(config, opponent, table, mark),
    }
}

/// Applies the `train` flags on top of the loaded (or default) config.
fn train_config(
    mut config: AppConfig,
    from_file: bool,
    games: Option<usize>,
    seed: Option<u64>,
    decaying: bool,
) -> AppConfig {
    if decaying {
        if from_file {
            config.learner.rate_mode = RateMode::Decaying;
        } else {
            config.learner = LearnerConfig {
                seed: config.learner.seed,
                ..LearnerConfig::decaying()
            };
        }
    }
    if let Some(games) = games {
        config.arena.games = games;
    }
    if seed.is_some() {
        config.learner.seed = seed;
    }
    config
}

fn train(
    config: AppConfig,
    resume: Option<PathBuf>,
    save: bool,
    report_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    config.validate()?;

    let table = match &resume {
        Some(path) => q_table::q_table_from_disk(path)
            .with_context(|| format!("loading table from {}", path.display()))?,
        None => QTable::new(),
    };
    let (report, table) = ttt_engine::train_from_table(&config, table)?;

    let learner = config.arena.learner_mark;
    let tally = &report.tally;
    println!("{tally}");
    println!(
        "Q AI ({learner}) win/loss ratio: {} | draw/loss ratio: {} | draw rate: {}",
        format_ratio(tally.win_loss_ratio(learner)),
        format_ratio(tally.draw_loss_ratio(learner)),
        format_ratio(tally.draw_rate()),
    );

    if save {
        let (json, pickle) = q_table::q_table_to_disk(&config.arena.archive_dir, &table)?;
        info!("saved {} and {}", json.display(), pickle.display());
    }
    if let Some(path) = report_path {
        let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(file, &report)?;
        info!("wrote report to {}", path.display());
    }
    Ok(())
}

fn format_ratio(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "n/a".to_owned(), |r| format!("{r:.2}"))
}

fn oracle() -> anyhow::Result<()> {
    let turns = ttt_engine::minimax_self_play()?;
    let mut board = ttt_engine::new_game();
    for turn in &turns {
        board.apply_move(turn.mv, turn.mark)?;
        println!("{} plays {}", turn.player, turn.mv);
        println!("{board}");
    }
    if let Some(last) = turns.last() {
        println!("Result: {}", describe(last.outcome));
    }
    Ok(())
}

fn describe(outcome: Outcome) -> String {
    match outcome {
        Outcome::InProgress => "still in progress".to_owned(),
        Outcome::Win(mark) => format!("{mark} wins"),
        Outcome::Draw => "draw".to_owned(),
    }
}

fn play(config: AppConfig, opponent: Opponent, table: Option<PathBuf>, mark: Mark) -> anyhow::Result<()> {
    let human = Box::new(HumanPlayer::new("You".to_owned(), mark));
    let computer: Box<dyn Player> = match opponent {
        Opponent::Minimax => Box::new(MinimaxPlayer::new("Minimax AI")),
        Opponent::Learner => {
            let table = match &table {
                Some(path) => q_table::q_table_from_disk(path)
                    .with_context(|| format!("loading table from {}", path.display()))?,
                None => QTable::new(),
            };
            info!("learner starts with {} state-action pairs", table.pairs());
            let learner_config = LearnerConfig {
                rate_mode: RateMode::Constant,
                epsilon0: 0.0,
                ..config.learner.clone()
            };
            Box::new(LearnerPlayer::new("Q AI", QLearner::with_table(learner_config, table)))
        }
    };
    let mut game = Game::new(human, computer, config.rewards.clone())
        .with_opponent_terminal_credit(config.arena.credit_opponent_terminal);
    let mut tally = Tally::default();
    loop {
        let outcome = loop {
            match game.step() {
                Ok(turn) if turn.outcome.is_over() => break turn.outcome,
                Ok(turn) if turn.mark != mark => println!("{} plays {}", turn.player, turn.mv + 1),
                Ok(_) => {}
                Err(GameError::Decision(DecisionError::Abandoned)) => {
                    println!("Bye.");
                    return Ok(());
                }
                Err(GameError::IllegalMove(err)) => println!("{err}, try again."),
                Err(err) => return Err(err.into()),
            }
        };
        println!("{}", game.board());
        match outcome {
            Outcome::Win(winner) if winner == mark => println!("Congratulations, you have won!"),
            Outcome::Win(_) => println!("Really sorry, you have lost."),
            _ => println!("The game ended in a draw."),
        }
        tally.record(outcome);
        println!("{tally}");
        if !human::confirm("Play again?")? {
            return Ok(());
        }
        game.reset();
    }
}
