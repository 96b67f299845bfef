use std::fmt;

use serde::{Deserialize, Serialize};

use crate::piece::{Color, PieceKind};
use crate::square::Square;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveFlag {
    Regular,
    Capture,
    CastleShort,
    CastleLong,
    Check,
    Checkmate,
    Promotion,
    DoublePawn,
    EnPassant,
}

impl MoveFlag {
    pub const ALL: [MoveFlag; 9] = [
        MoveFlag::Regular,
        MoveFlag::Capture,
        MoveFlag::CastleShort,
        MoveFlag::CastleLong,
        MoveFlag::Check,
        MoveFlag::Checkmate,
        MoveFlag::Promotion,
        MoveFlag::DoublePawn,
        MoveFlag::EnPassant,
    ];

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// A set of [`MoveFlag`]s packed into one word.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveFlags(u16);

impl MoveFlags {
    pub fn empty() -> Self {
        MoveFlags(0)
    }

    pub fn contains(self, flag: MoveFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn insert(&mut self, flag: MoveFlag) {
        self.0 |= flag.bit();
    }

    pub fn remove(&mut self, flag: MoveFlag) {
        self.0 &= !flag.bit();
    }

    pub fn with(mut self, flag: MoveFlag) -> Self {
        self.insert(flag);
        self
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = MoveFlag> {
        MoveFlag::ALL.into_iter().filter(move |f| self.contains(*f))
    }
}

impl FromIterator<MoveFlag> for MoveFlags {
    fn from_iter<I: IntoIterator<Item = MoveFlag>>(iter: I) -> Self {
        let mut flags = MoveFlags::empty();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl fmt::Debug for MoveFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// A fully described move. Moves produced by [`Position::legal_moves`]
/// carry every flag, including check and checkmate.
///
/// [`Position::legal_moves`]: crate::position::Position::legal_moves
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub kind: PieceKind,
    pub color: Color,
    pub from: Square,
    pub to: Square,
    pub flags: MoveFlags,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn has(&self, flag: MoveFlag) -> bool {
        self.flags.contains(flag)
    }

    pub fn is_capture(&self) -> bool {
        self.has(MoveFlag::Capture) || self.has(MoveFlag::EnPassant)
    }

    pub fn is_castle(&self) -> bool {
        self.has(MoveFlag::CastleShort) || self.has(MoveFlag::CastleLong)
    }

    pub fn is_check(&self) -> bool {
        self.has(MoveFlag::Check)
    }

    pub fn is_checkmate(&self) -> bool {
        self.has(MoveFlag::Checkmate)
    }

    /// Same piece movement, ignoring annotation flags.
    pub fn same_action(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }

    /// Convert to UCI notation, e.g. "e2e4", "a7a8q"
    pub fn to_uci(&self) -> String {
        let promo = match self.promotion {
            Some(PieceKind::Queen) => "q",
            Some(PieceKind::Rook) => "r",
            Some(PieceKind::Bishop) => "b",
            Some(PieceKind::Knight) => "n",
            _ => "",
        };
        format!("{}{}{promo}", self.from, self.to)
    }

    /// Split UCI text into its squares and promotion kind. The result still
    /// has to be matched against a position to become a [`Move`].
    pub fn parse_uci(s: &str) -> Option<(Square, Square, Option<PieceKind>)> {
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return None;
        }
        let from = s[0..2].parse().ok()?;
        let to = s[2..4].parse().ok()?;
        let promotion = match s.as_bytes().get(4) {
            None => None,
            Some(b'q') => Some(PieceKind::Queen),
            Some(b'r') => Some(PieceKind::Rook),
            Some(b'b') => Some(PieceKind::Bishop),
            Some(b'n') => Some(PieceKind::Knight),
            Some(_) => return None,
        };
        Some((from, to, promotion))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uci())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_set_operations() {
        let mut flags: MoveFlags = [MoveFlag::Capture, MoveFlag::Check].into_iter().collect();
        assert!(flags.contains(MoveFlag::Capture));
        assert!(!flags.contains(MoveFlag::Checkmate));
        flags.remove(MoveFlag::Check);
        flags.insert(MoveFlag::Checkmate);
        assert_eq!(
            flags.iter().collect::<Vec<_>>(),
            vec![MoveFlag::Capture, MoveFlag::Checkmate]
        );
        assert!(MoveFlags::empty().is_empty());
    }

    #[test]
    fn uci_text() {
        let mv = Move {
            kind: PieceKind::Pawn,
            color: Color::White,
            from: "a7".parse().unwrap(),
            to: "a8".parse().unwrap(),
            flags: MoveFlags::empty().with(MoveFlag::Promotion),
            promotion: Some(PieceKind::Knight),
        };
        assert_eq!(mv.to_uci(), "a7a8n");
        assert_eq!(
            Move::parse_uci("a7a8n"),
            Some((mv.from, mv.to, Some(PieceKind::Knight)))
        );
        assert_eq!(Move::parse_uci("a7a8k"), None);
        assert_eq!(Move::parse_uci("e2"), None);
    }
}
