use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A board coordinate. Rank 0 is White's back rank, file 0 is the a-file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Coords")]
pub struct Square {
    file: u8,
    rank: u8,
}

/// Unchecked wire form of a square.
#[derive(Deserialize)]
struct Coords {
    file: u8,
    rank: u8,
}

impl TryFrom<Coords> for Square {
    type Error = ParseSquareError;

    fn try_from(coords: Coords) -> Result<Self, Self::Error> {
        Square::try_new(coords.file.into(), coords.rank.into()).ok_or(ParseSquareError)
    }
}

impl Square {
    /// Panics if either coordinate is off the board.
    pub fn new(file: u8, rank: u8) -> Self {
        assert!(file < 8 && rank < 8, "square out of range: {file},{rank}");
        Square { file, rank }
    }

    /// Like `new`, but for signed coordinates that may fall off the board.
    pub fn try_new(file: i32, rank: i32) -> Option<Self> {
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            None
        }
    }

    pub fn file(self) -> u8 {
        self.file
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    pub fn offset(self, df: i32, dr: i32) -> Option<Self> {
        Self::try_new(self.file as i32 + df, self.rank as i32 + dr)
    }

    pub fn file_char(self) -> char {
        (b'a' + self.file) as char
    }

    pub fn rank_char(self) -> char {
        (b'1' + self.rank) as char
    }

    pub fn file_from_char(c: char) -> Option<u8> {
        match c {
            'a'..='h' => Some(c as u8 - b'a'),
            _ => None,
        }
    }

    pub fn rank_from_char(c: char) -> Option<u8> {
        match c {
            '1'..='8' => Some(c as u8 - b'1'),
            _ => None,
        }
    }

    /// All 64 squares, a1 first, rank by rank.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|rank| (0..8u8).map(move |file| Square { file, rank }))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSquareError;

impl fmt::Display for ParseSquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid square")
    }
}

impl std::error::Error for ParseSquareError {}

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(f), Some(r), None) => {
                let file = Square::file_from_char(f).ok_or(ParseSquareError)?;
                let rank = Square::rank_from_char(r).ok_or(ParseSquareError)?;
                Ok(Square::new(file, rank))
            }
            _ => Err(ParseSquareError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algebraic_form() {
        assert_eq!(Square::new(0, 0).to_string(), "a1");
        assert_eq!(Square::new(4, 3).to_string(), "e4");
        assert_eq!(Square::new(7, 7).to_string(), "h8");
        assert_eq!("d6".parse::<Square>(), Ok(Square::new(3, 5)));
    }

    #[test]
    fn rejects_off_board_text() {
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("a".parse::<Square>().is_err());
        assert!("a10".parse::<Square>().is_err());
    }

    #[test]
    fn offsets_stop_at_the_edge() {
        let h8 = Square::new(7, 7);
        assert_eq!(h8.offset(1, 0), None);
        assert_eq!(h8.offset(-1, -2), Some(Square::new(6, 5)));
        assert_eq!(Square::all().count(), 64);
    }

    #[test]
    fn deserialize_checks_range() {
        let e4: Square = serde_json::from_str(r#"{"file":4,"rank":3}"#).unwrap();
        assert_eq!(e4, Square::new(4, 3));
        assert_eq!(serde_json::to_string(&e4).unwrap(), r#"{"file":4,"rank":3}"#);
        assert!(serde_json::from_str::<Square>(r#"{"file":8,"rank":0}"#).is_err());
        assert!(serde_json::from_str::<Square>(r#"{"file":0,"rank":200}"#).is_err());
    }

    #[test]
    #[should_panic(expected = "square out of range")]
    fn new_rejects_off_board() {
        Square::new(0, 8);
    }
}
