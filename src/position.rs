use serde::{Deserialize, Serialize};

use crate::moves::{Move, MoveFlag};
use crate::piece::{Color, Piece, PieceKind};
use crate::square::Square;

/// Castling availability, derived from the has-moved flags of kings and
/// rooks on their home squares.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Checkmate { winner: Color },
    Stalemate,
}

/// An immutable chess position. Successors are produced with [`Position::apply`].
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    squares: [[Option<Piece>; 8]; 8],
    side_to_play: Color,
    en_passant: Option<Square>,
    kings: [Option<Square>; 2],
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    /// An empty board, White to play. Only useful as the start of a
    /// [`Position::with_piece`] chain; it has no kings yet.
    pub fn empty() -> Self {
        Position {
            squares: [[None; 8]; 8],
            side_to_play: Color::White,
            en_passant: None,
            kings: [None, None],
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// The standard initial position.
    pub fn new() -> Self {
        let mut position = Position::empty();
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (file, kind) in back.into_iter().enumerate() {
            let file = file as u8;
            position.put(Square::new(file, 0), Some(Piece::new(kind, Color::White)));
            position.put(Square::new(file, 1), Some(Piece::new(PieceKind::Pawn, Color::White)));
            position.put(Square::new(file, 6), Some(Piece::new(PieceKind::Pawn, Color::Black)));
            position.put(Square::new(file, 7), Some(Piece::new(kind, Color::Black)));
        }
        position
    }

    /// Builder for hand-made positions. Pieces are placed unmoved, so a king
    /// and rook on their home squares can castle.
    pub fn with_piece(mut self, square: Square, piece: Piece) -> Self {
        self.put(square, Some(piece));
        self.refresh_kings();
        self
    }

    pub fn with_side_to_play(mut self, color: Color) -> Self {
        self.side_to_play = color;
        self
    }

    pub(crate) fn put(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.rank() as usize][square.file() as usize] = piece;
        if let Some(p) = piece {
            if p.kind == PieceKind::King {
                self.kings[p.color.index()] = Some(square);
            }
        }
    }

    pub(crate) fn set_side_to_play(&mut self, color: Color) {
        self.side_to_play = color;
    }

    pub(crate) fn set_en_passant(&mut self, square: Option<Square>) {
        self.en_passant = square;
    }

    pub(crate) fn set_clocks(&mut self, halfmove_clock: u32, fullmove_number: u32) {
        self.halfmove_clock = halfmove_clock;
        self.fullmove_number = fullmove_number;
    }

    /// Rescan the board for kings. Returns how many kings of each color were seen.
    pub(crate) fn refresh_kings(&mut self) -> [usize; 2] {
        let mut counts = [0; 2];
        self.kings = [None, None];
        let found: Vec<(Square, Piece)> = self.pieces().collect();
        for (square, piece) in found {
            if piece.kind == PieceKind::King {
                counts[piece.color.index()] += 1;
                self.kings[piece.color.index()] = Some(square);
            }
        }
        counts
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.rank() as usize][square.file() as usize]
    }

    pub fn side_to_play(&self) -> Color {
        self.side_to_play
    }

    /// The square a pawn capturing en passant would move to.
    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub(crate) fn king_slot(&self, color: Color) -> Option<Square> {
        self.kings[color.index()]
    }

    /// # Panics
    ///
    /// If the position has no king of `color`, which no public constructor allows.
    pub fn king_square(&self, color: Color) -> Square {
        self.king_slot(color)
            .expect("every position holds one king per color")
    }

    /// Occupied squares in a1..h8 order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    pub fn castling_rights(&self) -> CastlingRights {
        let side = |color: Color, rook_file: u8| -> bool {
            let back = color.back_rank();
            let king_home = matches!(
                self.piece_at(Square::new(4, back)),
                Some(p) if p.kind == PieceKind::King && p.color == color && !p.has_moved
            );
            let rook_home = matches!(
                self.piece_at(Square::new(rook_file, back)),
                Some(p) if p.kind == PieceKind::Rook && p.color == color && !p.has_moved
            );
            king_home && rook_home
        };
        CastlingRights {
            white_kingside: side(Color::White, 7),
            white_queenside: side(Color::White, 0),
            black_kingside: side(Color::Black, 7),
            black_queenside: side(Color::Black, 0),
        }
    }

    /// Build the successor position. The move is trusted to be legal here.
    pub fn apply(&self, mv: &Move) -> Position {
        let mut next = self.clone();
        let piece = self
            .piece_at(mv.from)
            .expect("move must start on an occupied square");
        let color = piece.color;
        let back = color.back_rank();

        next.en_passant = None;
        if mv.has(MoveFlag::DoublePawn) {
            next.en_passant = mv.from.offset(0, color.forward());
        }

        if mv.has(MoveFlag::EnPassant) {
            // The captured pawn sits beside the mover, one rank behind `to`.
            next.put(Square::new(mv.to.file(), mv.from.rank()), None);
        }

        let rook_hop = if mv.has(MoveFlag::CastleShort) {
            Some((7, 5))
        } else if mv.has(MoveFlag::CastleLong) {
            Some((0, 3))
        } else {
            None
        };
        if let Some((rook_from, rook_to)) = rook_hop {
            let rook_from = Square::new(rook_from, back);
            if let Some(rook) = self.piece_at(rook_from) {
                next.put(rook_from, None);
                next.put(Square::new(rook_to, back), Some(rook.moved()));
            }
        }

        let placed = if mv.has(MoveFlag::Promotion) {
            Piece::new(mv.promotion.unwrap_or(PieceKind::Queen), color)
        } else {
            piece
        };
        next.put(mv.from, None);
        next.put(mv.to, Some(placed.moved()));

        if piece.kind == PieceKind::Pawn || mv.is_capture() {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock = next.halfmove_clock.saturating_add(1);
        }
        if color == Color::Black {
            next.fullmove_number = next.fullmove_number.saturating_add(1);
        }
        next.side_to_play = color.opposite();
        next
    }

    /// All legal moves for the side to play, annotated with check/checkmate.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.legalize(self.pseudo_moves())
    }

    /// Legal moves of the piece standing on `from`.
    pub fn legal_moves_from(&self, from: Square) -> Vec<Move> {
        match self.piece_at(from) {
            Some(piece) if piece.color == self.side_to_play => {
                let mut moves = Vec::new();
                self.pseudo_moves_from(from, piece, &mut moves);
                self.legalize(moves)
            }
            _ => Vec::new(),
        }
    }

    fn legalize(&self, pseudo: Vec<Move>) -> Vec<Move> {
        let mover = self.side_to_play;
        pseudo
            .into_iter()
            .filter_map(|mv| {
                let next = self.apply(&mv);
                if next.king_in_check(mover) {
                    None
                } else {
                    Some(next.mark_check(mv))
                }
            })
            .collect()
    }

    /// Set check/checkmate on a move that produced `self`.
    fn mark_check(&self, mut mv: Move) -> Move {
        mv.flags.remove(MoveFlag::Check);
        mv.flags.remove(MoveFlag::Checkmate);
        if self.is_check() {
            if self.has_legal_move() {
                mv.flags.insert(MoveFlag::Check);
            } else {
                mv.flags.insert(MoveFlag::Checkmate);
            }
        }
        mv
    }

    /// Recompute check flags of `mv` against this position.
    pub(crate) fn annotate(&self, mv: Move) -> Move {
        self.apply(&mv).mark_check(mv)
    }

    /// The unique legal move from `from` to `to`; promotions default to a queen.
    pub fn move_if_valid(&self, from: Square, to: Square) -> Option<Move> {
        self.legal_moves_from(from).into_iter().find(|m| m.to == to)
    }

    /// Re-target a promotion move to another piece kind.
    pub fn with_promotion(&self, mv: Move, kind: PieceKind) -> Option<Move> {
        if !mv.has(MoveFlag::Promotion) || !kind.is_promotion_target() {
            return None;
        }
        let retargeted = Move {
            promotion: Some(kind),
            ..mv
        };
        Some(self.annotate(retargeted))
    }

    /// Resolve UCI text such as "e7e8n" against this position.
    pub fn move_from_uci(&self, uci: &str) -> Option<Move> {
        let (from, to, promotion) = Move::parse_uci(uci)?;
        let mv = self.move_if_valid(from, to)?;
        match promotion {
            Some(kind) => self.with_promotion(mv, kind),
            None => Some(mv),
        }
    }

    pub fn has_legal_move(&self) -> bool {
        let mover = self.side_to_play;
        self.pseudo_moves()
            .iter()
            .any(|mv| !self.apply(mv).king_in_check(mover))
    }

    pub fn is_check(&self) -> bool {
        self.king_in_check(self.side_to_play)
    }

    pub fn is_checkmate(&self) -> bool {
        self.is_check() && !self.has_legal_move()
    }

    pub fn is_stalemate(&self) -> bool {
        !self.is_check() && !self.has_legal_move()
    }

    /// Only checkmate and stalemate are detected.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.has_legal_move() {
            None
        } else if self.is_check() {
            Some(Outcome::Checkmate {
                winner: self.side_to_play.opposite(),
            })
        } else {
            Some(Outcome::Stalemate)
        }
    }
}
