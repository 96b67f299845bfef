//! End-to-end games played through the public API.

use chessbook::san;
use chessbook::{Color, Game, MoveFlag, NodeId, PieceKind, Position, SanError, Square};

fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

/// Play SAN moves along the mainline starting at `from`.
fn play_san(game: &mut Game, from: NodeId, moves: &[&str]) -> NodeId {
    moves.iter().fold(from, |node, token| {
        let mv = san::parse(token, game.node(node).position())
            .unwrap_or_else(|e| panic!("{token}: {e}"));
        game.append(node, mv).unwrap()
    })
}

#[test]
fn fools_mate() {
    let mut game = Game::new_empty();
    let root = game.root();
    let mate = play_san(&mut game, root, &["f3", "e5", "g4", "Qh4#"]);

    assert_eq!(game.node(mate).notation(), Some("Qh4#"));
    assert!(game.node(mate).mv().unwrap().is_checkmate());
    assert!(game.node(mate).position().legal_moves().is_empty());

    let pgn = String::from_utf8(game.to_pgn()).unwrap();
    assert!(pgn.contains("1. f3 e5 2. g4 Qh4#"), "{pgn}");
}

#[test]
fn en_passant_capture() {
    let mut game = Game::new_empty();
    let root = game.root();
    let node = play_san(&mut game, root, &["e4", "a6", "e5", "d5", "exd6"]);

    let mv = game.node(node).mv().unwrap();
    assert!(mv.has(MoveFlag::EnPassant));
    assert!(mv.has(MoveFlag::Capture));

    let position = game.node(node).position();
    assert!(position.piece_at(sq("d5")).is_none());
    let pawn = position.piece_at(sq("d6")).unwrap();
    assert_eq!((pawn.kind, pawn.color), (PieceKind::Pawn, Color::White));
}

#[test]
fn en_passant_expires_after_one_ply() {
    let mut game = Game::new_empty();
    let root = game.root();
    let node = play_san(&mut game, root, &["e4", "a6", "e5", "d5", "h3", "h6"]);
    assert_eq!(
        san::parse("exd6", game.node(node).position()),
        Err(SanError::NoCandidate)
    );
}

#[test]
fn castling_kingside_then_queenside_refused() {
    let mut game = Game::new_empty();
    let root = game.root();
    let castled = play_san(
        &mut game,
        root,
        &["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5", "O-O"],
    );

    let position = game.node(castled).position();
    let king = position.piece_at(sq("g1")).unwrap();
    let rook = position.piece_at(sq("f1")).unwrap();
    assert_eq!(king.kind, PieceKind::King);
    assert_eq!(rook.kind, PieceKind::Rook);
    assert!(king.has_moved && rook.has_moved);
    assert!(position.piece_at(sq("h1")).is_none());

    let node = play_san(&mut game, castled, &["d6"]);
    assert_eq!(
        san::parse("O-O-O", game.node(node).position()),
        Err(SanError::IllegalCastle)
    );
}

#[test]
fn variation_round_trip() {
    let pgn = b"1. e4 e5 (1... c5 2. Nf3 {Open Sicilian}) 2. Nf3 Nc6";
    let game = Game::from_pgn(pgn).unwrap();

    let line = game.mainline();
    let sans: Vec<_> = line.iter().map(|&id| game.node(id).notation().unwrap()).collect();
    assert_eq!(sans, ["e4", "e5", "Nf3", "Nc6"]);

    let e4 = line[0];
    let children = game.node(e4).children();
    assert_eq!(children.len(), 2);
    let c5 = children[1];
    assert_eq!(game.node(c5).notation(), Some("c5"));
    let nf3 = game.node(c5).children()[0];
    assert_eq!(game.node(nf3).notation(), Some("Nf3"));
    assert_eq!(game.node(nf3).comment(), "Open Sicilian");

    let written = game.to_pgn();
    let reread = Game::from_pgn(&written).unwrap();
    assert_eq!(reread.to_pgn(), written);
    assert_eq!(reread.len(), game.len());
}

#[test]
fn knight_disambiguation() {
    let position = Position::from_fen("4k3/8/8/8/8/8/8/1N1NK3 w - - 0 1").unwrap();
    assert_eq!(san::parse("Nc3", &position), Err(SanError::Ambiguous));

    let from_b1 = san::parse("Nbc3", &position).unwrap();
    assert_eq!(from_b1.from, sq("b1"));
    let from_d1 = san::parse("Ndc3", &position).unwrap();
    assert_eq!(from_d1.from, sq("d1"));

    let mv = position.move_if_valid(sq("b1"), sq("c3")).unwrap();
    assert_eq!(san::encode(&mv, &position), "Nbc3");
}

#[test]
fn promotion_with_check() {
    let position = Position::from_fen("K7/4P3/8/8/8/8/8/4k3 w - - 0 1").unwrap();
    let mv = san::parse("e8=Q+", &position).unwrap();
    assert!(mv.has(MoveFlag::Promotion));
    assert_eq!(mv.promotion, Some(PieceKind::Queen));
    assert!(mv.is_check());
    assert!(!mv.is_checkmate());
    assert_eq!(san::encode(&mv, &position), "e8=Q+");

    let mut game = Game::from_position(position);
    let root = game.root();
    let node = game.append(root, mv).unwrap();
    let reread = Game::from_pgn(&game.to_pgn()).unwrap();
    let tip = reread.last_position();
    assert_eq!(reread.node(tip).notation(), Some("e8=Q+"));
    assert_eq!(
        reread.node(tip).position().to_fen(),
        game.node(node).position().to_fen()
    );
}
