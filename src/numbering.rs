//! Translation between logical (BCM) and board pin numbers.
//!
//! The crate ships no board pinout. Conversions between schemes need a
//! [`BoardPinMap`] supplied by the caller; without one they fail with
//! [`Error::UnsupportedConversion`].

use crate::consts::PIN_COUNT;
use crate::error::{Error, Result};
use crate::gpio::NumberingScheme;
use std::collections::HashMap;

/// Caller-supplied table of `(board, logical)` pin pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardPinMap {
    board_to_logical: HashMap<u8, u8>,
    logical_to_board: HashMap<u8, u8>,
}

impl BoardPinMap {
    /// Builds a table, rejecting logical pins past the bank and duplicate entries.
    pub fn new(pairs: impl IntoIterator<Item = (u8, u8)>) -> Result<Self> {
        let mut map = BoardPinMap::default();
        for (board, logical) in pairs {
            if logical >= PIN_COUNT {
                return Err(Error::ArgumentOutOfRange(format!(
                    "Board pin {} maps to logical pin {} (max {})",
                    board,
                    logical,
                    PIN_COUNT - 1
                )));
            }
            if map.board_to_logical.insert(board, logical).is_some() {
                return Err(Error::ArgumentOutOfRange(format!(
                    "Board pin {} listed twice",
                    board
                )));
            }
            if map.logical_to_board.insert(logical, board).is_some() {
                return Err(Error::ArgumentOutOfRange(format!(
                    "Logical pin {} listed twice",
                    logical
                )));
            }
        }
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.board_to_logical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.board_to_logical.is_empty()
    }
}

/// Pin number converter used by the driver.
#[derive(Debug, Clone, Default)]
pub struct PinNumbering {
    board: Option<BoardPinMap>,
}

impl PinNumbering {
    pub fn new(board: Option<BoardPinMap>) -> Self {
        PinNumbering { board }
    }

    /// Converts `pin` from one scheme to another. Same-scheme conversion is
    /// the identity and performs no validation.
    pub fn convert(&self, pin: u8, from: NumberingScheme, to: NumberingScheme) -> Result<u8> {
        if from == to {
            return Ok(pin);
        }
        let board = self.board.as_ref().ok_or(Error::UnsupportedConversion {
            pin,
            from,
            to,
        })?;
        let table = match from {
            NumberingScheme::Board => &board.board_to_logical,
            NumberingScheme::Logical => &board.logical_to_board,
        };
        table
            .get(&pin)
            .copied()
            .ok_or(Error::UnmappedPin { pin, scheme: from })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_for_every_scheme() {
        let numbering = PinNumbering::default();
        for scheme in [NumberingScheme::Logical, NumberingScheme::Board] {
            for pin in [0u8, 17, 53, 200] {
                assert_eq!(numbering.convert(pin, scheme, scheme).unwrap(), pin);
            }
        }
    }

    #[test]
    fn test_cross_scheme_without_table_fails() {
        let numbering = PinNumbering::default();
        assert!(matches!(
            numbering.convert(11, NumberingScheme::Board, NumberingScheme::Logical),
            Err(Error::UnsupportedConversion {
                pin: 11,
                from: NumberingScheme::Board,
                to: NumberingScheme::Logical
            })
        ));
    }

    #[test]
    fn test_cross_scheme_with_table() {
        let table = BoardPinMap::new([(11, 17), (12, 18)]).unwrap();
        assert_eq!(table.len(), 2);
        let numbering = PinNumbering::new(Some(table));
        assert_eq!(
            numbering
                .convert(11, NumberingScheme::Board, NumberingScheme::Logical)
                .unwrap(),
            17
        );
        assert_eq!(
            numbering
                .convert(18, NumberingScheme::Logical, NumberingScheme::Board)
                .unwrap(),
            12
        );
        assert!(matches!(
            numbering.convert(1, NumberingScheme::Board, NumberingScheme::Logical),
            Err(Error::UnmappedPin { pin: 1, .. })
        ));
    }

    #[test]
    fn test_board_map_validation() {
        assert!(BoardPinMap::new([(1, 54)]).is_err());
        assert!(BoardPinMap::new([(1, 2), (1, 3)]).is_err());
        assert!(BoardPinMap::new([(1, 2), (5, 2)]).is_err());
        assert!(BoardPinMap::new(Vec::new()).unwrap().is_empty());
    }
}
