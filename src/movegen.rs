//! Pseudo-move generation, one routine per piece kind. Own-king safety is
//! checked afterwards by [`Position::legal_moves`].

use crate::moves::{Move, MoveFlag, MoveFlags};
use crate::piece::{Piece, PieceKind};
use crate::position::Position;
use crate::square::Square;

pub(crate) const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

pub(crate) const KING_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

pub(crate) const ORTHOGONALS: [(i32, i32); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];

pub(crate) const DIAGONALS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

fn make_move(piece: Piece, from: Square, to: Square, flags: MoveFlags) -> Move {
    Move {
        kind: piece.kind,
        color: piece.color,
        from,
        to,
        flags,
        promotion: None,
    }
}

impl Position {
    pub(crate) fn pseudo_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        let side = self.side_to_play();
        for (square, piece) in self.pieces() {
            if piece.color == side {
                self.pseudo_moves_from(square, piece, &mut moves);
            }
        }
        moves
    }

    pub(crate) fn pseudo_moves_from(&self, from: Square, piece: Piece, moves: &mut Vec<Move>) {
        match piece.kind {
            PieceKind::Pawn => self.generate_pawn_moves(from, piece, moves),
            PieceKind::Knight => self.generate_jump_moves(from, piece, &KNIGHT_OFFSETS, moves),
            PieceKind::Bishop => self.generate_sliding_moves(from, piece, &DIAGONALS, moves),
            PieceKind::Rook => self.generate_sliding_moves(from, piece, &ORTHOGONALS, moves),
            PieceKind::Queen => {
                self.generate_sliding_moves(from, piece, &ORTHOGONALS, moves);
                self.generate_sliding_moves(from, piece, &DIAGONALS, moves);
            }
            PieceKind::King => {
                self.generate_jump_moves(from, piece, &KING_OFFSETS, moves);
                self.generate_castling_moves(from, piece, moves);
            }
        }
    }

    fn generate_pawn_moves(&self, from: Square, pawn: Piece, moves: &mut Vec<Move>) {
        let color = pawn.color;
        let dir = color.forward();

        let push = |to: Square, flags: MoveFlags, moves: &mut Vec<Move>| {
            let mut mv = make_move(pawn, from, to, flags);
            if to.rank() == color.promotion_rank() {
                mv.flags.insert(MoveFlag::Promotion);
                mv.promotion = Some(PieceKind::Queen);
            }
            moves.push(mv);
        };

        // Single push, then double push from the starting rank
        if let Some(one) = from.offset(0, dir) {
            if self.piece_at(one).is_none() {
                push(one, MoveFlags::empty().with(MoveFlag::Regular), moves);
                if from.rank() == color.pawn_rank() {
                    if let Some(two) = one.offset(0, dir) {
                        if self.piece_at(two).is_none() {
                            push(two, MoveFlags::empty().with(MoveFlag::DoublePawn), moves);
                        }
                    }
                }
            }
        }

        // Captures, including en passant
        let capture_rank = (color.pawn_rank() as i32 + 3 * dir) as u8;
        for df in [-1, 1] {
            let Some(target) = from.offset(df, dir) else {
                continue;
            };
            match self.piece_at(target) {
                Some(victim) if victim.color != color => {
                    push(target, MoveFlags::empty().with(MoveFlag::Capture), moves);
                }
                None if self.en_passant_target() == Some(target) && from.rank() == capture_rank => {
                    let flags = MoveFlags::empty()
                        .with(MoveFlag::EnPassant)
                        .with(MoveFlag::Capture);
                    push(target, flags, moves);
                }
                _ => {}
            }
        }
    }

    fn generate_jump_moves(
        &self,
        from: Square,
        piece: Piece,
        offsets: &[(i32, i32)],
        moves: &mut Vec<Move>,
    ) {
        for &(df, dr) in offsets {
            let Some(to) = from.offset(df, dr) else {
                continue;
            };
            let flag = match self.piece_at(to) {
                Some(p) if p.color == piece.color => continue,
                Some(_) => MoveFlag::Capture,
                None => MoveFlag::Regular,
            };
            moves.push(make_move(piece, from, to, MoveFlags::empty().with(flag)));
        }
    }

    fn generate_sliding_moves(
        &self,
        from: Square,
        piece: Piece,
        directions: &[(i32, i32)],
        moves: &mut Vec<Move>,
    ) {
        for &(df, dr) in directions {
            let mut next = from.offset(df, dr);
            while let Some(to) = next {
                if let Some(p) = self.piece_at(to) {
                    if p.color != piece.color {
                        let flags = MoveFlags::empty().with(MoveFlag::Capture);
                        moves.push(make_move(piece, from, to, flags));
                    }
                    break;
                }
                let flags = MoveFlags::empty().with(MoveFlag::Regular);
                moves.push(make_move(piece, from, to, flags));
                next = to.offset(df, dr);
            }
        }
    }

    fn generate_castling_moves(&self, from: Square, king: Piece, moves: &mut Vec<Move>) {
        let color = king.color;
        let back_rank = color.back_rank();
        if king.has_moved || from != Square::new(4, back_rank) {
            return;
        }

        let enemy = color.opposite();
        if self.attacked(from, enemy) {
            return;
        }

        for (rook_file, step, flag) in [
            (7u8, 1, MoveFlag::CastleShort),
            (0u8, -1, MoveFlag::CastleLong),
        ] {
            let rook_ready = matches!(
                self.piece_at(Square::new(rook_file, back_rank)),
                Some(p) if p.kind == PieceKind::Rook && p.color == color && !p.has_moved
            );
            if !rook_ready {
                continue;
            }

            // Squares between king and rook must be empty
            let (lo, hi) = if rook_file > 4 { (5, rook_file) } else { (rook_file + 1, 4) };
            if (lo..hi).any(|file| self.piece_at(Square::new(file, back_rank)).is_some()) {
                continue;
            }

            // King must not pass through check or land in check
            let transit = Square::new((4 + step) as u8, back_rank);
            let dest = Square::new((4 + 2 * step) as u8, back_rank);
            if self.attacked(transit, enemy) || self.attacked(dest, enemy) {
                continue;
            }

            moves.push(make_move(king, from, dest, MoveFlags::empty().with(flag)));
        }
    }
}
