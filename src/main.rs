use std::cell::Cell;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use minesweeper_gym::ai::{FrontierScorer, ScoredSelector};
use minesweeper_gym::interaction::{read_action, Action};
use minesweeper_gym::{
    random_bomb_list, Scoring, Session, SessionState, DEFAULT_MOVE_LIMIT,
};

#[derive(Parser)]
#[command(name = "minesweeper-gym", about = "Minesweeper board engine for agent play")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play a game in the terminal
    Play {
        #[arg(long, default_value_t = 9)]
        rows: usize,
        #[arg(long, default_value_t = 9)]
        columns: usize,
        #[arg(long, default_value_t = 10)]
        bombs: usize,
    },
    /// Watch the bundled heuristic agent play one session
    Watch {
        #[arg(long, default_value_t = 9)]
        rows: usize,
        #[arg(long, default_value_t = 9)]
        columns: usize,
        #[arg(long, default_value_t = 10)]
        bombs: usize,
        #[arg(long, default_value_t = DEFAULT_MOVE_LIMIT)]
        move_limit: u32,
    },
    /// Advance a batch of sessions round-robin and report their fitness
    Batch {
        #[arg(long, default_value_t = 5)]
        rows: usize,
        #[arg(long, default_value_t = 5)]
        columns: usize,
        #[arg(long, default_value_t = 5)]
        bombs: usize,
        #[arg(long, default_value_t = 16)]
        sessions: usize,
        #[arg(long, default_value_t = DEFAULT_MOVE_LIMIT)]
        move_limit: u32,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    match Cli::parse().command {
        Command::Play {
            rows,
            columns,
            bombs,
        } => play(rows, columns, bombs),
        Command::Watch {
            rows,
            columns,
            bombs,
            move_limit,
        } => watch(rows, columns, bombs, move_limit),
        Command::Batch {
            rows,
            columns,
            bombs,
            sessions,
            move_limit,
        } => batch(rows, columns, bombs, sessions, move_limit),
    }
}

fn play(rows: usize, columns: usize, bombs: usize) -> anyhow::Result<()> {
    let bomb_list =
        random_bomb_list(rows, columns, bombs).context("could not lay out the board")?;
    let mut session = Session::new(
        rows,
        columns,
        &bomb_list,
        0,
        ScoredSelector::new(FrontierScorer::default()),
        Box::new(|_, _| {}),
    )
    .context("could not start the session")?;

    while !session.state().is_over() {
        println!("{}", session.board());
        println!("fitness: {}  moves: {}", session.fitness(), session.moves());
        match read_action(rows, columns) {
            Action::Click(point) => {
                session.apply_click(point)?;
            }
            Action::Flag(point) => session.toggle_flag(point),
            Action::Auto => {
                session.step()?;
            }
            Action::Quit => {
                println!("abandoned with fitness {}", session.fitness());
                return Ok(());
            }
        }
    }

    println!("{}", session.board());
    match session.state() {
        SessionState::Won => println!("you win!"),
        SessionState::Lost => println!("you lose"),
        SessionState::MoveLimitExceeded => println!("out of moves"),
        SessionState::Running => {}
    }
    println!("final fitness: {}", session.fitness());
    Ok(())
}

fn watch(rows: usize, columns: usize, bombs: usize, move_limit: u32) -> anyhow::Result<()> {
    let bomb_list =
        random_bomb_list(rows, columns, bombs).context("could not lay out the board")?;
    let mut session = Session::with_rules(
        rows,
        columns,
        &bomb_list,
        0,
        ScoredSelector::new(FrontierScorer::default()),
        Box::new(|_, _| {}),
        Scoring::default(),
        move_limit,
    )
    .context("could not start the session")?;

    while !session.state().is_over() {
        println!("{}", session.board());
        session.step()?;
    }
    println!("{}", session.board());
    println!(
        "{:?} after {} moves, fitness {}",
        session.state(),
        session.moves(),
        session.fitness()
    );
    Ok(())
}

/// Every live session advances one move per round, the way a trainer walks a
/// whole generation over the same bomb layout.
fn batch(
    rows: usize,
    columns: usize,
    bombs: usize,
    count: usize,
    move_limit: u32,
) -> anyhow::Result<()> {
    let bomb_list =
        random_bomb_list(rows, columns, bombs).context("could not lay out the board")?;
    let results: Vec<Cell<Option<i64>>> = (0..count).map(|_| Cell::new(None)).collect();

    let mut sessions = Vec::with_capacity(count);
    for index in 0..count {
        let results = &results;
        let session = Session::with_rules(
            rows,
            columns,
            &bomb_list,
            index,
            ScoredSelector::new(FrontierScorer {
                unseen_prior: prior_for(index, count),
            }),
            Box::new(move |fitness, i| results[i].set(Some(fitness))),
            Scoring::default(),
            move_limit,
        )
        .with_context(|| format!("could not start session {}", index))?;
        sessions.push(session);
    }

    while sessions.iter().any(|s| !s.state().is_over()) {
        for session in &mut sessions {
            if !session.state().is_over() {
                session.step()?;
            }
        }
    }

    for (index, slot) in results.iter().enumerate() {
        match slot.get() {
            Some(fitness) => println!("session {:>3}: fitness {}", index, fitness),
            None => println!("session {:>3}: no result", index),
        }
    }
    Ok(())
}

// spreads the agents' appetite for unexplored cells across the batch so the
// fitness table actually ranks something
fn prior_for(index: usize, count: usize) -> f64 {
    if count <= 1 {
        return 0.5;
    }
    0.1 + 0.8 * index as f64 / (count - 1) as f64
}
