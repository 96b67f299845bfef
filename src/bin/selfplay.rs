//! Play random legal games, store them in a library and read them back.
//!
//! Usage: `selfplay [games] [seed]`. The library root comes from
//! `CHESSBOOK_LIBRARY` (default `games/`).

use chessbook::{Color, DomainError, Game, Library, LibraryConfig, Outcome};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const MAX_PLIES: usize = 120;
const VARIATION_CHANCE: f64 = 0.1;
const COMMENT_CHANCE: f64 = 0.05;

fn random_game(rng: &mut StdRng, round: usize) -> Result<Game, DomainError> {
    let mut game = Game::new_empty();
    game.set_tag("Event", "Self-play")?;
    game.set_tag("Site", "chessbook")?;
    game.set_tag("Round", round.to_string())?;
    game.set_tag("White", "Random")?;
    game.set_tag("Black", "Random")?;

    let mut node = game.root();
    for _ in 0..MAX_PLIES {
        let moves = game.node(node).position().legal_moves();
        let Some(&mv) = moves.choose(rng) else {
            break;
        };

        let parent = node;
        node = match game.append(parent, mv) {
            Ok(child) => child,
            Err(err) => {
                error!(%err, "generated move was rejected");
                break;
            }
        };

        if moves.len() > 1 && rng.gen_bool(VARIATION_CHANCE) {
            let alternative = moves
                .iter()
                .copied()
                .find(|m| !m.same_action(&mv))
                .and_then(|m| game.append(parent, m).ok());
            if let Some(alt) = alternative {
                if let Err(err) = game.set_comment(alt, "Alternative") {
                    error!(%err, "cannot comment variation");
                }
            }
        }

        if rng.gen_bool(COMMENT_CHANCE) {
            if let Err(err) = game.set_comment(node, "Interesting") {
                error!(%err, "cannot comment move");
            }
        }
    }

    let result = match game.node(node).position().outcome() {
        Some(Outcome::Checkmate { winner: Color::White }) => "1-0",
        Some(Outcome::Checkmate { winner: Color::Black }) => "0-1",
        Some(Outcome::Stalemate) => "1/2-1/2",
        None => "*",
    };
    game.set_tag("Result", result)?;
    Ok(game)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let games: usize = args.next().and_then(|a| a.parse().ok()).unwrap_or(5);
    let mut rng = match args.next().and_then(|a| a.parse::<u64>().ok()) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut library = match Library::with_config(LibraryConfig::from_env()) {
        Ok(library) => library,
        Err(err) => {
            error!(%err, "cannot open library");
            std::process::exit(1);
        }
    };

    let mut failures = 0;
    for round in 1..=games {
        let game = match random_game(&mut rng, round) {
            Ok(game) => game,
            Err(err) => {
                error!(%err, round, "cannot build game");
                failures += 1;
                continue;
            }
        };
        let plies = game.mainline().len();
        let path = format!("selfplay/game_{round:03}");

        let stored = match library.save(&path, &game) {
            Ok(stored) => stored,
            Err(err) => {
                error!(%err, path = %path, "save failed");
                failures += 1;
                continue;
            }
        };

        match library.load(&stored) {
            Ok(reloaded) if reloaded.mainline().len() == plies && reloaded.len() == game.len() => {
                info!(path = %stored.display(), plies, nodes = game.len(), "round trip ok");
            }
            Ok(reloaded) => {
                error!(
                    path = %stored.display(),
                    expected = game.len(),
                    found = reloaded.len(),
                    "reloaded game differs"
                );
                failures += 1;
            }
            Err(err) => {
                error!(%err, "reload failed");
                failures += 1;
            }
        }
    }

    eprintln!("Played {games} games, {failures} failed the round trip");
    if failures > 0 {
        std::process::exit(1);
    }
}
