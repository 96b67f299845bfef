//! PGN write/read round trips over generated and hand-written games.

use chessbook::{DomainError, Game, NodeId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Build a random game whose nodes branch now and then into short
/// variations, some of them commented.
fn random_game(rng: &mut StdRng, plies: usize) -> Game {
    let mut game = Game::new_empty();
    game.set_tag("Event", "Random \"quoted\" \\ event").unwrap();
    game.set_tag("Annotator", "rng").unwrap();

    let mut frontier = vec![(game.root(), plies)];
    while let Some((node, remaining)) = frontier.pop() {
        if remaining == 0 {
            continue;
        }
        let moves = game.node(node).position().legal_moves();
        if moves.is_empty() {
            continue;
        }
        let branches = if rng.gen_bool(0.2) { 2 } else { 1 };
        for (i, mv) in moves.choose_multiple(rng, branches).enumerate() {
            let child = game.append(node, *mv).unwrap();
            if rng.gen_bool(0.15) {
                game.set_comment(child, "note  with\n spacing").unwrap();
            }
            let budget = if i == 0 { remaining - 1 } else { remaining.min(4) - 1 };
            frontier.push((child, budget));
        }
    }
    game
}

fn assert_isomorphic(a: &Game, a_node: NodeId, b: &Game, b_node: NodeId) {
    let (x, y) = (a.node(a_node), b.node(b_node));
    assert_eq!(x.notation(), y.notation());
    assert_eq!(x.comment(), y.comment());
    assert_eq!(x.position(), y.position());
    assert_eq!(x.children().len(), y.children().len(), "at {:?}", x.notation());
    for (&cx, &cy) in x.children().iter().zip(y.children()) {
        assert_isomorphic(a, cx, b, cy);
    }
}

#[test]
fn random_games_survive_write_then_read() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..20 {
        let game = random_game(&mut rng, 40);
        let written = game.to_pgn();
        let reread = Game::from_pgn(&written).unwrap_or_else(|e| {
            panic!("{e}\n{}", String::from_utf8_lossy(&written))
        });

        assert_isomorphic(&game, game.root(), &reread, reread.root());
        assert_eq!(reread.tag("Event"), game.tag("Event"));
        assert_eq!(reread.tag("Annotator"), Some("rng"));
        assert_eq!(reread.to_pgn(), written);
    }
}

#[test]
fn lichess_export_keeps_clocks_and_drops_graphics() {
    let pgn = "[Event \"Rated Blitz game\"]\n\
               [Site \"https://lichess.org/abcdefgh\"]\n\
               [White \"alice\"]\n\
               [Black \"bob\"]\n\
               [Result \"0-1\"]\n\
               [ECO \"C20\"]\n\
               \n\
               1. e4 { [%clk 0:03:00] } 1... e5 { [%clk 0:03:00] [%cal Rd1h5] } \
               2. Qh5?! $6 { [%cal Gh5f7] } 2... Nc6 3. Bc4 Nf6?? 4. Qxf7# 0-1\n";
    let game = Game::from_pgn(pgn.as_bytes()).unwrap();

    let line = game.mainline();
    assert_eq!(line.len(), 7);
    assert_eq!(game.node(line[0]).comment(), "[%clk 0:03:00]");
    assert_eq!(game.node(line[1]).comment(), "[%clk 0:03:00] [%cal Rd1h5]");
    assert_eq!(game.node(line[2]).comment(), "");
    assert!(game.node(line[6]).mv().unwrap().is_checkmate());
    assert_eq!(game.tag("ECO"), Some("C20"));

    let written = String::from_utf8(game.to_pgn()).unwrap();
    assert!(written.contains("4. Qxf7#"), "{written}");
    assert!(written.starts_with("[Event \"Rated Blitz game\"]\n[Site"));
}

#[test]
fn nested_variations_round_trip_byte_for_byte() {
    let pgn = "[Event \"?\"]\n[Site \"?\"]\n[Date \"?\"]\n[Round \"?\"]\n\
               [White \"?\"]\n[Black \"?\"]\n[Result \"?\"]\n\n\
               {Start} 1. d4 {Queen pawn} (1. e4 e5 (1... c5 2. Nf3 (2. c3)) 2. Nf3) \
               (1. c4) 1... d5 2. c4 e6 (2... c6 3. Nf3) 3. Nc3\n";
    let game = Game::from_pgn(pgn.as_bytes()).unwrap();
    assert_eq!(String::from_utf8(game.to_pgn()).unwrap(), pgn);
}

#[test]
fn tags_set_through_the_api_read_back() {
    let mut game = Game::new_empty();
    game.set_tag("Annotator", "line one\nline two").unwrap();
    assert_eq!(game.tag("Annotator"), Some("line one line two"));
    assert_eq!(
        game.set_tag("Opening Name", "Ruy Lopez"),
        Err(DomainError::InvalidTagKey("Opening Name".to_string()))
    );
    assert_eq!(game.tag("Opening Name"), None);

    let written = game.to_pgn();
    let reread = Game::from_pgn(&written).unwrap();
    assert_eq!(reread.tag("Annotator"), Some("line one line two"));
    assert_eq!(reread.to_pgn(), written);
}
