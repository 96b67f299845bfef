//! Error types for chessbook

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::square::Square;

/// Why a SAN token could not be mapped onto a legal move.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanError {
    #[error("unknown piece letter")]
    UnknownPiece,
    #[error("no destination square")]
    NoDestination,
    #[error("no legal move matches")]
    NoCandidate,
    #[error("more than one legal move matches")]
    Ambiguous,
    #[error("castling is not legal here")]
    IllegalCastle,
    #[error("invalid promotion")]
    BadPromotion,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed tag on line {line}: {text}")]
    BadTag { line: usize, text: String },

    #[error("bad move `{token}` at token {index}: {reason}")]
    BadMove {
        token: String,
        index: usize,
        reason: SanError,
    },

    #[error("unbalanced parentheses at token {index}")]
    UnbalancedParens { index: usize },

    #[error("unterminated comment starting at byte {offset}")]
    UnterminatedComment { offset: usize },

    #[error("invalid FEN tag: {0}")]
    BadFen(#[from] FenError),

    #[error("PGN is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("expected at least 4 fields, found {0}")]
    FieldCount(usize),
    #[error("invalid board field: {0}")]
    Board(String),
    #[error("invalid side to move: {0}")]
    Side(String),
    #[error("invalid castling field: {0}")]
    Castling(String),
    #[error("invalid en passant square: {0}")]
    EnPassant(String),
    #[error("invalid move counter: {0}")]
    Counter(String),
    #[error("expected one king per side")]
    KingCount,
    #[error("pawn on a back rank")]
    PawnOnBackRank,
    #[error("side not to move is in check")]
    OpponentInCheck,
}

/// File system failures, classified so callers can react to the common cases.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied: {}", .0.display())]
    Denied(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Other {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IoError {
    pub fn at(path: impl AsRef<Path>, error: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match error.kind() {
            io::ErrorKind::NotFound => IoError::NotFound(path),
            io::ErrorKind::PermissionDenied => IoError::Denied(path),
            _ => IoError::Other {
                path,
                source: error,
            },
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("illegal move {from}{to}")]
    IllegalMove { from: Square, to: Square },

    #[error("node {0} does not exist in this game")]
    UnknownNode(usize),

    #[error("the root node cannot be removed")]
    RootNode,

    #[error("invalid tag name {0:?}")]
    InvalidTagKey(String),
}

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error("failed to parse {}: {source}", path.display())]
    Parse { path: PathBuf, source: ParseError },

    #[error("invalid library path: {}", .0.display())]
    InvalidPath(PathBuf),

    #[error("invalid library config: {0}")]
    Config(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("PGN parsing error: {0}")]
    Parse(#[from] ParseError),

    #[error("FEN error: {0}")]
    Fen(#[from] FenError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("library error: {0}")]
    Library(#[from] LibraryError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_are_classified_by_kind() {
        let missing = IoError::at("games/a.pgn", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(missing, IoError::NotFound(ref p) if p == Path::new("games/a.pgn")));

        let denied = IoError::at("x", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, IoError::Denied(_)));

        let other = IoError::at("x", io::Error::from(io::ErrorKind::InvalidData));
        assert!(matches!(other, IoError::Other { .. }));
    }

    #[test]
    fn bad_move_message_names_the_token() {
        let err = ParseError::BadMove {
            token: "Nc3".to_string(),
            index: 4,
            reason: SanError::Ambiguous,
        };
        assert_eq!(
            err.to_string(),
            "bad move `Nc3` at token 4: more than one legal move matches"
        );
    }
}
