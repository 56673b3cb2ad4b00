//! Game hall CLI
//!
//! Terminal Gomoku against the AI, AI self-play, and the daily card deck.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::Level;

use game_hall::cards::{
    date_seed, CardGame, CardId, DifficultyKey, FileStore, GameConfig, Profile, Status,
};
use game_hall::gomoku::game::Outcome;
use game_hall::{AIEngine, Difficulty, GameMode, GameState, Stone};

#[derive(Parser, Debug)]
#[command(author, version, about = "Gomoku against the AI and the daily card puzzle", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true, action = clap::ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play Gomoku against the AI in the terminal
    Gomoku {
        #[arg(long, default_value_t = Difficulty::Medium)]
        difficulty: Difficulty,
        /// Your color; black moves first
        #[arg(long, value_enum, default_value_t = Side::Black)]
        color: Side,
    },
    /// Let two AIs play each other
    Selfplay {
        #[arg(long, default_value_t = Difficulty::Medium)]
        black: Difficulty,
        #[arg(long, default_value_t = Difficulty::Medium)]
        white: Difficulty,
        #[arg(long, default_value_t = 225)]
        max_moves: usize,
    },
    /// Deal the daily card deck and optionally play it greedily
    Cards {
        #[arg(long, default_value_t = DifficultyKey::Easy)]
        difficulty: DifficultyKey,
        /// Deal for this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Free pyramid sampling instead of the mirrored layout
        #[arg(long, action = clap::ArgAction::SetTrue)]
        pyramid: bool,
        #[arg(long, action = clap::ArgAction::SetTrue)]
        autoplay: bool,
        /// Seed for the type shuffle; random when omitted
        #[arg(long)]
        seed: Option<u64>,
        /// Record the autoplay result in this profile directory
        #[arg(long)]
        profile_dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Side {
    Black,
    White,
}

impl From<Side> for Stone {
    fn from(side: Side) -> Self {
        match side {
            Side::Black => Stone::Black,
            Side::White => Stone::White,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Command::Gomoku { difficulty, color } => play_gomoku(difficulty, color.into()),
        Command::Selfplay {
            black,
            white,
            max_moves,
        } => {
            selfplay(black, white, max_moves);
            Ok(())
        }
        Command::Cards {
            difficulty,
            date,
            pyramid,
            autoplay,
            seed,
            profile_dir,
        } => {
            run_cards(difficulty, date, pyramid, autoplay, seed, profile_dir);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

// ----- Gomoku -----

fn play_gomoku(difficulty: Difficulty, human: Stone) -> io::Result<()> {
    println!("===========================================");
    println!("   Gomoku vs AI ({difficulty}), you play {human}");
    println!("===========================================");
    println!("Enter `row col`, `undo`, `resign` or `quit`.\n");

    let mut engine = AIEngine::new(difficulty);
    let mut game = GameState::new(GameMode::PvE { human_color: human });
    if game.is_ai_turn() {
        game.play_ai_move(&mut engine);
        report_ai(&game);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        println!("{}", game.board);
        if let Some(result) = &game.result {
            match result.outcome {
                Outcome::Won(color) if color == human => println!("You win!"),
                Outcome::Won(color) => println!("{color} wins."),
                Outcome::Draw => println!("Draw."),
            }
            return Ok(());
        }

        print!("{} to move > ", game.current_turn);
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line?;
        let input = line.trim();

        match input {
            "quit" | "q" => return Ok(()),
            "undo" => {
                game.request_undo();
                continue;
            }
            "resign" => {
                game.request_resign();
                continue;
            }
            _ => {}
        }

        let coords: Vec<i32> = input
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect();
        let [row, col] = coords[..] else {
            println!("Expected two numbers, e.g. `7 7`.");
            continue;
        };

        match game.play_human_turn(row, col, &mut engine) {
            Ok(Some(_)) => report_ai(&game),
            Ok(None) => {}
            Err(e) => println!("{e}"),
        }
    }
}

fn report_ai(game: &GameState) {
    if let Some(result) = &game.last_ai_result {
        if let Some(m) = result.best_move {
            println!(
                "AI plays ({}, {})  [{:?}, score {}, {} nodes, {}ms]",
                m.row, m.col, result.search_type, result.score, result.nodes, result.time_ms
            );
        }
    }
}

fn selfplay(black: Difficulty, white: Difficulty, max_moves: usize) {
    println!("--- Self-play: Black {black} vs White {white} ---");
    let mut black_engine = AIEngine::new(black);
    let mut white_engine = AIEngine::new(white);
    let mut game = GameState::new(GameMode::PvP);

    while !game.is_game_over() && game.history.len() < max_moves {
        let engine = match game.current_turn {
            Stone::White => &mut white_engine,
            _ => &mut black_engine,
        };
        let color = game.current_turn;
        let Some(pos) = game.play_ai_move(engine) else {
            break;
        };
        let (kind, ms) = game
            .last_ai_result
            .as_ref()
            .map_or((None, 0), |r| (Some(r.search_type), r.time_ms));
        println!(
            "{:3}. {color} ({:2}, {:2})  {kind:?} {ms}ms",
            game.history.len(),
            pos.row,
            pos.col
        );
    }

    println!("\n{}", game.board);
    match game.outcome() {
        Some(Outcome::Won(color)) => println!("{color} wins after {} moves", game.history.len()),
        Some(Outcome::Draw) => println!("Draw after {} moves", game.history.len()),
        None => println!("Stopped after {} moves", game.history.len()),
    }
}

// ----- Cards -----

fn run_cards(
    difficulty: DifficultyKey,
    date: Option<NaiveDate>,
    pyramid: bool,
    autoplay: bool,
    seed: Option<u64>,
    profile_dir: Option<PathBuf>,
) {
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let config = GameConfig::for_difficulty(difficulty).with_symmetric_layout(!pyramid);
    let rng = seed.map_or_else(ChaCha8Rng::from_entropy, ChaCha8Rng::seed_from_u64);
    let mut game = CardGame::new(config, date_seed(date, Some(difficulty)), rng);

    println!("--- Daily deck {date} ({difficulty}) ---");
    if let Some(report) = game.report() {
        println!("  Layout seed:        {}", report.seed);
        println!("  Layout:             {}", if pyramid { "pyramid" } else { "symmetric" });
        println!("  Available positions: {}", report.available_positions);
        println!("  Cards dealt:        {}", game.deck().len());
        println!("  Trimmed:            {}", report.trimmed);
        println!("  Within 210..=240:   {}", report.meets_range);
    }
    for (layer, n) in game.deck().layer_counts() {
        println!("  layer {layer}: {n} cards");
    }
    for (card_type, n) in game.deck().type_counts() {
        println!("  type {card_type:2}: {n} cards");
    }
    println!("  Selectable now:     {}", game.selectable_cards().len());

    if !autoplay {
        return;
    }

    let status = autoplay_cards(&mut game);
    println!(
        "\nResult: {:?} with {} points in {} moves ({} cards left on the pile)",
        status,
        game.score(),
        game.move_count(),
        game.deck().remaining()
    );

    if let Some(dir) = profile_dir {
        let mut profile = Profile::load(FileStore::new(dir));
        if profile.record_game(status == Status::Victory, game.score()) {
            println!("New high score: {}", profile.high_score.0);
        }
        println!(
            "Games played: {}, won: {} ({}%)",
            profile.stats.games_played,
            profile.stats.games_won,
            profile.stats.win_rate()
        );
    }
}

/// Greedy player: complete the fullest slot group first, fall back on the
/// remove and shuffle tools when stuck.
fn autoplay_cards(game: &mut CardGame) -> Status {
    while !game.is_over() {
        let choice = pick_card(game);
        match choice {
            Some(id) => {
                if game.select_card(id).is_err() {
                    break;
                }
            }
            None => {
                if game.use_remove_tool().is_err() && game.use_shuffle_tool().is_err() {
                    break;
                }
            }
        }
        if game.slot().len() + 1 >= game.config().layout.max_slot && game.tools().remove > 0 {
            let _ = game.use_remove_tool();
        }
    }
    game.status()
}

fn pick_card(game: &CardGame) -> Option<CardId> {
    let slot_types = game.slot_types();
    game.selectable_cards().into_iter().max_by_key(|&id| {
        let t = game.card(id).map(|c| c.card_type);
        let in_slot = slot_types.iter().filter(|&&s| Some(s) == t).count();
        // then the highest layer, which uncovers the most
        (in_slot, game.card(id).map_or(0, |c| c.layer))
    })
}
