use std::fmt;
use std::str::FromStr;

use cozy_chess::{File, Piece, Rank, Square};

use crate::EngineError;

/// Piece a pawn may promote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Promotion {
    Knight,
    Bishop,
    Rook,
    Queen,
}

impl Promotion {
    pub fn to_char(self) -> char {
        match self {
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'n' => Some(Self::Knight),
            'b' => Some(Self::Bishop),
            'r' => Some(Self::Rook),
            'q' => Some(Self::Queen),
            _ => None,
        }
    }
}

impl From<Promotion> for Piece {
    fn from(promotion: Promotion) -> Self {
        match promotion {
            Promotion::Knight => Piece::Knight,
            Promotion::Bishop => Piece::Bishop,
            Promotion::Rook => Piece::Rook,
            Promotion::Queen => Piece::Queen,
        }
    }
}

/// A move in UCI long algebraic form (`e2e4`, `e7e8q`).
///
/// No legality is implied: this is only the wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Promotion>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, promotion: Promotion) -> Self {
        self.promotion = Some(promotion);
        self
    }
}

impl From<Move> for cozy_chess::Move {
    fn from(mv: Move) -> Self {
        cozy_chess::Move {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion.map(Piece::from),
        }
    }
}

impl FromStr for Move {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_uci_move(s)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_square(f, self.from)?;
        write_square(f, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "{}", promo.to_char())?;
        }
        Ok(())
    }
}

/// Parse UCI move format (e2e4, e7e8q)
pub fn parse_uci_move(s: &str) -> Result<Move, EngineError> {
    let malformed = || EngineError::MalformedMoveText(s.to_string());

    let chars: Vec<char> = s.chars().collect();
    if chars.len() < 4 || chars.len() > 5 {
        return Err(malformed());
    }

    let from = parse_square(chars[0], chars[1]).ok_or_else(malformed)?;
    let to = parse_square(chars[2], chars[3]).ok_or_else(malformed)?;
    let promotion = match chars.get(4) {
        Some(&c) => Some(Promotion::from_char(c).ok_or_else(malformed)?),
        None => None,
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}

fn parse_square(file: char, rank: char) -> Option<Square> {
    let file = match file {
        'a' => File::A,
        'b' => File::B,
        'c' => File::C,
        'd' => File::D,
        'e' => File::E,
        'f' => File::F,
        'g' => File::G,
        'h' => File::H,
        _ => return None,
    };

    let rank = match rank {
        '1' => Rank::First,
        '2' => Rank::Second,
        '3' => Rank::Third,
        '4' => Rank::Fourth,
        '5' => Rank::Fifth,
        '6' => Rank::Sixth,
        '7' => Rank::Seventh,
        '8' => Rank::Eighth,
        _ => return None,
    };

    Some(Square::new(file, rank))
}

fn write_square(f: &mut fmt::Formatter<'_>, sq: Square) -> fmt::Result {
    let file = match sq.file() {
        File::A => 'a',
        File::B => 'b',
        File::C => 'c',
        File::D => 'd',
        File::E => 'e',
        File::F => 'f',
        File::G => 'g',
        File::H => 'h',
    };
    let rank = match sq.rank() {
        Rank::First => '1',
        Rank::Second => '2',
        Rank::Third => '3',
        Rank::Fourth => '4',
        Rank::Fifth => '5',
        Rank::Sixth => '6',
        Rank::Seventh => '7',
        Rank::Eighth => '8',
    };
    write!(f, "{}{}", file, rank)
}
