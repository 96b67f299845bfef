//! FEN import and export.
//!
//! Castling availability is not stored on [`Position`]; it is expressed
//! through the has-moved flags of kings and rooks. Importing a FEN marks a
//! king or rook as unmoved exactly when the castling field grants a right
//! that depends on it.

use crate::error::FenError;
use crate::piece::{Color, Piece, PieceKind};
use crate::position::Position;
use crate::square::Square;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(FenError::FieldCount(fields.len()));
        }

        let mut position = Position::empty();
        parse_board(fields[0], &mut position)?;

        let side = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::Side(other.to_string())),
        };
        position.set_side_to_play(side);

        apply_castling(fields[2], &mut position)?;

        let en_passant = match fields[3] {
            "-" => None,
            text => {
                let square: Square = text
                    .parse()
                    .map_err(|_| FenError::EnPassant(text.to_string()))?;
                // The target sits behind a pawn that just advanced two ranks
                let expected_rank = match side {
                    Color::White => 5,
                    Color::Black => 2,
                };
                if square.rank() != expected_rank {
                    return Err(FenError::EnPassant(text.to_string()));
                }
                Some(square)
            }
        };
        position.set_en_passant(en_passant);

        let counter = |index: usize, default: u32| -> Result<u32, FenError> {
            match fields.get(index) {
                None => Ok(default),
                Some(text) => text
                    .parse()
                    .map_err(|_| FenError::Counter(text.to_string())),
            }
        };
        let halfmove = counter(4, 0)?;
        let fullmove = counter(5, 1)?;
        if fullmove == 0 {
            return Err(FenError::Counter("0".to_string()));
        }
        position.set_clocks(halfmove, fullmove);

        if position.refresh_kings() != [1, 1] {
            return Err(FenError::KingCount);
        }
        if position.king_in_check(side.opposite()) {
            return Err(FenError::OpponentInCheck);
        }
        Ok(position)
    }

    pub fn to_fen(&self) -> String {
        let mut board = String::with_capacity(64);
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.piece_at(Square::new(file, rank)) {
                    Some(piece) => {
                        if empty > 0 {
                            board.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        board.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                board.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                board.push('/');
            }
        }

        let side = match self.side_to_play() {
            Color::White => 'w',
            Color::Black => 'b',
        };

        let rights = self.castling_rights();
        let mut castling = String::new();
        for (granted, c) in [
            (rights.white_kingside, 'K'),
            (rights.white_queenside, 'Q'),
            (rights.black_kingside, 'k'),
            (rights.black_queenside, 'q'),
        ] {
            if granted {
                castling.push(c);
            }
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let en_passant = self
            .en_passant_target()
            .map_or_else(|| "-".to_string(), |sq| sq.to_string());

        format!(
            "{board} {side} {castling} {en_passant} {} {}",
            self.halfmove_clock(),
            self.fullmove_number()
        )
    }
}

fn parse_board(text: &str, position: &mut Position) -> Result<(), FenError> {
    let bad = || FenError::Board(text.to_string());
    let rows: Vec<&str> = text.split('/').collect();
    if rows.len() != 8 {
        return Err(bad());
    }

    for (i, row) in rows.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file = 0u8;
        for c in row.chars() {
            if let Some(skip) = c.to_digit(10) {
                if skip == 0 || skip > 8 {
                    return Err(bad());
                }
                file += skip as u8;
            } else {
                let mut piece = Piece::from_fen_char(c).ok_or_else(bad)?;
                if file >= 8 {
                    return Err(bad());
                }
                if piece.kind == PieceKind::Pawn {
                    if rank == 0 || rank == 7 {
                        return Err(FenError::PawnOnBackRank);
                    }
                    piece.has_moved = rank != piece.color.pawn_rank();
                }
                position.put(Square::new(file, rank), Some(piece));
                file += 1;
            }
            if file > 8 {
                return Err(bad());
            }
        }
        if file != 8 {
            return Err(bad());
        }
    }
    Ok(())
}

/// Kings and rooks start out moved; each granted right clears the flag on
/// the pieces it needs.
fn apply_castling(text: &str, position: &mut Position) -> Result<(), FenError> {
    let bad = || FenError::Castling(text.to_string());

    let home: Vec<(Square, Piece)> = position
        .pieces()
        .filter(|(_, p)| matches!(p.kind, PieceKind::King | PieceKind::Rook))
        .collect();
    for (square, piece) in home {
        position.put(square, Some(piece.moved()));
    }

    if text == "-" {
        return Ok(());
    }
    if text.is_empty() {
        return Err(bad());
    }

    for c in text.chars() {
        let (color, rook_file) = match c {
            'K' => (Color::White, 7),
            'Q' => (Color::White, 0),
            'k' => (Color::Black, 7),
            'q' => (Color::Black, 0),
            _ => return Err(bad()),
        };
        let back = color.back_rank();
        for (file, kind) in [(4, PieceKind::King), (rook_file, PieceKind::Rook)] {
            let square = Square::new(file, back);
            match position.piece_at(square) {
                Some(p) if p.kind == kind && p.color == color => {
                    position.put(square, Some(Piece { has_moved: false, ..p }));
                }
                _ => return Err(bad()),
            }
        }
    }
    Ok(())
}
