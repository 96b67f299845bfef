use crate::movegen::{DIAGONALS, KING_OFFSETS, KNIGHT_OFFSETS, ORTHOGONALS};
use crate::piece::{Color, PieceKind};
use crate::position::Position;
use crate::square::Square;

impl Position {
    /// Whether any piece of color `by` attacks `square`. The square itself
    /// may be empty or hold a piece of either color.
    pub fn attacked(&self, square: Square, by: Color) -> bool {
        let holds = |sq: Option<Square>, kinds: &[PieceKind]| -> bool {
            sq.and_then(|sq| self.piece_at(sq))
                .map_or(false, |p| p.color == by && kinds.contains(&p.kind))
        };

        // A pawn of `by` one rank behind, diagonally adjacent
        let behind = -by.forward();
        if holds(square.offset(-1, behind), &[PieceKind::Pawn])
            || holds(square.offset(1, behind), &[PieceKind::Pawn])
        {
            return true;
        }

        if KNIGHT_OFFSETS
            .iter()
            .any(|&(df, dr)| holds(square.offset(df, dr), &[PieceKind::Knight]))
        {
            return true;
        }

        if KING_OFFSETS
            .iter()
            .any(|&(df, dr)| holds(square.offset(df, dr), &[PieceKind::King]))
        {
            return true;
        }

        self.ray_hits(square, &ORTHOGONALS, by, &[PieceKind::Rook, PieceKind::Queen])
            || self.ray_hits(square, &DIAGONALS, by, &[PieceKind::Bishop, PieceKind::Queen])
    }

    fn ray_hits(
        &self,
        square: Square,
        directions: &[(i32, i32)],
        by: Color,
        kinds: &[PieceKind],
    ) -> bool {
        for &(df, dr) in directions {
            let mut next = square.offset(df, dr);
            while let Some(sq) = next {
                if let Some(p) = self.piece_at(sq) {
                    if p.color == by && kinds.contains(&p.kind) {
                        return true;
                    }
                    break;
                }
                next = sq.offset(df, dr);
            }
        }
        false
    }

    /// A side without a king is never in check.
    pub fn king_in_check(&self, color: Color) -> bool {
        match self.king_slot(color) {
            Some(king) => self.attacked(king, color.opposite()),
            None => false,
        }
    }
}
