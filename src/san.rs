//! Standard Algebraic Notation.
//!
//! Both directions work against the legal moves of the predecessor
//! position: the encoder to find rival pieces that need disambiguation,
//! the parser to resolve a token to exactly one move.

use crate::error::SanError;
use crate::moves::{Move, MoveFlag};
use crate::piece::PieceKind;
use crate::position::Position;
use crate::square::Square;

/// Render `mv`, a legal move in `position`, as SAN.
pub fn encode(mv: &Move, position: &Position) -> String {
    let mut san = String::with_capacity(8);

    if mv.has(MoveFlag::CastleShort) {
        san.push_str("O-O");
    } else if mv.has(MoveFlag::CastleLong) {
        san.push_str("O-O-O");
    } else {
        if let Some(letter) = mv.kind.letter() {
            san.push(letter);
            push_disambiguation(&mut san, mv, position);
        } else if mv.is_capture() {
            san.push(mv.from.file_char());
        }

        if mv.is_capture() {
            san.push('x');
        }
        san.push_str(&mv.to.to_string());

        if mv.has(MoveFlag::Promotion) {
            let kind = mv.promotion.unwrap_or(PieceKind::Queen);
            san.push('=');
            san.push(kind.letter().unwrap_or('Q'));
        }
    }

    let next = position.apply(mv);
    if next.is_check() {
        san.push(if next.has_legal_move() { '+' } else { '#' });
    }
    san
}

fn push_disambiguation(san: &mut String, mv: &Move, position: &Position) {
    let rivals: Vec<Square> = position
        .legal_moves()
        .into_iter()
        .filter(|m| m.kind == mv.kind && m.to == mv.to)
        .map(|m| m.from)
        .collect();
    if rivals.len() <= 1 {
        return;
    }

    let distinct = |key: fn(Square) -> u8| -> bool {
        rivals
            .iter()
            .enumerate()
            .all(|(i, a)| rivals[i + 1..].iter().all(|b| key(*a) != key(*b)))
    };
    let unique = |key: fn(Square) -> u8| -> bool {
        rivals.iter().filter(|sq| key(**sq) == key(mv.from)).count() == 1
    };

    if distinct(Square::file) {
        san.push(mv.from.file_char());
    } else if distinct(Square::rank) {
        san.push(mv.from.rank_char());
    } else if unique(Square::file) {
        san.push(mv.from.file_char());
    } else if unique(Square::rank) {
        san.push(mv.from.rank_char());
    } else {
        san.push(mv.from.file_char());
        san.push(mv.from.rank_char());
    }
}

/// Resolve a SAN token against the legal moves of `position`.
///
/// Trailing annotation glyphs (`!`, `?` and their pairs) and check marks are
/// ignored; check and checkmate flags on the result come from the position.
pub fn parse(token: &str, position: &Position) -> Result<Move, SanError> {
    let token = token.trim_end_matches(|c| matches!(c, '!' | '?' | '+' | '#'));
    if token.is_empty() {
        return Err(SanError::NoDestination);
    }

    match token {
        "O-O" | "0-0" => return find_castle(position, MoveFlag::CastleShort),
        "O-O-O" | "0-0-0" => return find_castle(position, MoveFlag::CastleLong),
        _ => {}
    }

    let mut chars: Vec<char> = token.chars().collect();
    let promotion = split_promotion(&mut chars)?;

    let kind = match chars.first() {
        Some(&c) if c.is_ascii_uppercase() => {
            let kind = PieceKind::from_letter(c).ok_or(SanError::UnknownPiece)?;
            chars.remove(0);
            kind
        }
        Some('a'..='h') => PieceKind::Pawn,
        Some(_) => return Err(SanError::UnknownPiece),
        None => return Err(SanError::NoDestination),
    };

    if let Some(i) = chars.iter().position(|&c| c == 'x') {
        chars.remove(i);
    }

    if chars.len() < 2 {
        return Err(SanError::NoDestination);
    }
    let split = chars.len() - 2;
    let dest = Square::file_from_char(chars[split])
        .zip(Square::rank_from_char(chars[split + 1]))
        .map(|(file, rank)| Square::new(file, rank))
        .ok_or(SanError::NoDestination)?;

    let mut hint_file = None;
    let mut hint_rank = None;
    for &c in &chars[..split] {
        if let (Some(file), None) = (Square::file_from_char(c), hint_file) {
            hint_file = Some(file);
        } else if let (Some(rank), None) = (Square::rank_from_char(c), hint_rank) {
            hint_rank = Some(rank);
        } else {
            return Err(SanError::NoCandidate);
        }
    }
    // A bare pawn move is a push along its own file
    if kind == PieceKind::Pawn && hint_file.is_none() {
        hint_file = Some(dest.file());
    }

    let mut candidates = position.legal_moves().into_iter().filter(|m| {
        m.kind == kind
            && m.to == dest
            && hint_file.map_or(true, |f| m.from.file() == f)
            && hint_rank.map_or(true, |r| m.from.rank() == r)
    });
    let mv = candidates.next().ok_or(SanError::NoCandidate)?;
    if candidates.next().is_some() {
        return Err(SanError::Ambiguous);
    }

    match (mv.has(MoveFlag::Promotion), promotion) {
        (true, Some(kind)) => position.with_promotion(mv, kind).ok_or(SanError::BadPromotion),
        (true, None) | (false, None) => Ok(mv),
        (false, Some(_)) => Err(SanError::BadPromotion),
    }
}

fn find_castle(position: &Position, flag: MoveFlag) -> Result<Move, SanError> {
    position
        .legal_moves()
        .into_iter()
        .find(|m| m.has(flag))
        .ok_or(SanError::IllegalCastle)
}

/// Remove a trailing `=Q` (or bare `Q` after a back-rank square) and return
/// the promotion kind it named.
fn split_promotion(chars: &mut Vec<char>) -> Result<Option<PieceKind>, SanError> {
    if let Some(eq) = chars.iter().position(|&c| c == '=') {
        let kind = match &chars[eq + 1..] {
            [c] => PieceKind::from_letter(*c).filter(|k| k.is_promotion_target()),
            _ => None,
        };
        chars.truncate(eq);
        return kind.map(Some).ok_or(SanError::BadPromotion);
    }

    let n = chars.len();
    if n >= 3 && matches!(chars[n - 2], '1' | '8') {
        if let Some(kind) = PieceKind::from_letter(chars[n - 1]) {
            if !kind.is_promotion_target() {
                return Err(SanError::BadPromotion);
            }
            chars.truncate(n - 1);
            return Ok(Some(kind));
        }
    }
    Ok(None)
}
