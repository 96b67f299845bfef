use super::tags::{escape, SEVEN_TAG_ROSTER, UNKNOWN_VALUE};
use crate::piece::Color;
use crate::tree::{Game, NodeId};

/// Serialize `game` as PGN: the tag section, a blank line, then the
/// movetext on one line. No result token is written after the moves.
pub fn write(game: &Game) -> Vec<u8> {
    let mut out = String::new();

    for key in SEVEN_TAG_ROSTER {
        let value = game.tag(key).unwrap_or(UNKNOWN_VALUE);
        push_tag(&mut out, key, value);
    }
    for (key, value) in game.tags().iter() {
        if !SEVEN_TAG_ROSTER.contains(&key) {
            push_tag(&mut out, key, value);
        }
    }
    out.push('\n');

    let mut tokens = Vec::new();
    let root = game.node(game.root());
    if !root.comment().is_empty() {
        tokens.push(format!("{{{}}}", root.comment()));
    }
    write_continuation(game, game.root(), true, &mut tokens);

    out.push_str(&join_tokens(&tokens));
    out.push('\n');
    out.into_bytes()
}

fn push_tag(out: &mut String, key: &str, value: &str) {
    out.push('[');
    out.push_str(key);
    out.push_str(" \"");
    out.push_str(&escape(value));
    out.push_str("\"]\n");
}

/// Write the mainline below `parent`, with each node's variations placed
/// right after the mainline move they replace.
fn write_continuation(game: &Game, parent: NodeId, force_number: bool, tokens: &mut Vec<String>) {
    let children = game.node(parent).children();
    let Some((&main, variations)) = children.split_first() else {
        return;
    };

    write_move(game, main, force_number, tokens);
    for &variation in variations {
        tokens.push("(".to_string());
        write_move(game, variation, true, tokens);
        write_continuation(game, variation, false, tokens);
        tokens.push(")".to_string());
    }
    write_continuation(game, main, !variations.is_empty(), tokens);
}

fn write_move(game: &Game, id: NodeId, force_number: bool, tokens: &mut Vec<String>) {
    let node = game.node(id);
    let Some(parent) = node.parent() else {
        return;
    };
    let before = game.node(parent).position();
    let number = before.fullmove_number();
    match before.side_to_play() {
        Color::White => tokens.push(format!("{number}.")),
        Color::Black if force_number => tokens.push(format!("{number}...")),
        Color::Black => {}
    }
    if let Some(san) = node.notation() {
        tokens.push(san.to_string());
    }
    if !node.comment().is_empty() {
        tokens.push(format!("{{{}}}", node.comment()));
    }
}

/// Space-separate tokens, keeping `(` against what follows and `)` against
/// what precedes.
fn join_tokens(tokens: &[String]) -> String {
    let mut line = String::new();
    let mut previous: Option<&str> = None;
    for token in tokens {
        if let Some(prev) = previous {
            if prev != "(" && token != ")" {
                line.push(' ');
            }
        }
        line.push_str(token);
        previous = Some(token);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movetext(game: &Game) -> String {
        let pgn = String::from_utf8(write(game)).unwrap();
        let (_, moves) = pgn.split_once("\n\n").unwrap();
        moves.trim_end().to_string()
    }

    #[test]
    fn roster_defaults_and_extra_tags() {
        let mut game = Game::new_empty();
        game.set_tag("ECO", "B20").unwrap();
        game.set_tag("White", "Fischer \"Bobby\"").unwrap();
        let pgn = String::from_utf8(write(&game)).unwrap();
        let expected = "[Event \"?\"]\n[Site \"?\"]\n[Date \"?\"]\n[Round \"?\"]\n\
                        [White \"Fischer \\\"Bobby\\\"\"]\n[Black \"?\"]\n[Result \"?\"]\n\
                        [ECO \"B20\"]\n\n\n";
        assert_eq!(pgn, expected);
    }

    #[test]
    fn variations_restate_black_move_numbers() {
        let game = Game::from_pgn(b"1. e4 e5 (1... c5 2. Nf3 {Open Sicilian}) 2. Nf3 Nc6").unwrap();
        assert_eq!(
            movetext(&game),
            "1. e4 e5 (1... c5 2. Nf3 {Open Sicilian}) 2. Nf3 Nc6"
        );
    }

    #[test]
    fn white_variation_and_root_comment() {
        let game = Game::from_pgn(b"{Intro} 1. e4 (1. d4 d5) 1... e5").unwrap();
        assert_eq!(movetext(&game), "{Intro} 1. e4 (1. d4 d5) 1... e5");
    }

    #[test]
    fn black_to_move_start_writes_ellipsis() {
        let pgn = b"[FEN \"4k3/8/8/8/8/8/4P3/4K3 b - - 0 7\"]\n\n7... Kd7 8. e4";
        let game = Game::from_pgn(pgn).unwrap();
        assert_eq!(movetext(&game), "7... Kd7 8. e4");
    }
}
