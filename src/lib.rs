pub mod attacks;
pub mod error;
pub mod fen;
pub mod library;
pub mod movegen;
pub mod moves;
pub mod pgn;
pub mod piece;
pub mod position;
pub mod san;
pub mod square;
pub mod tree;

pub use error::{DomainError, Error, FenError, IoError, LibraryError, ParseError, Result, SanError};
pub use library::{EntryKind, Library, LibraryConfig, LibraryEntry};
pub use moves::{Move, MoveFlag, MoveFlags};
pub use piece::{Color, Piece, PieceKind};
pub use position::{CastlingRights, Outcome, Position};
pub use square::Square;
pub use tree::{Game, Node, NodeId, NodeSnapshot};
