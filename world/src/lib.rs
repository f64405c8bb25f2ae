#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! In-memory terrain grid implementing the survey map query capability.
//!
//! The production map collaborator is external; [`GridMap`] mirrors its
//! observable behaviour closely enough for adapters and tests to drive the
//! mission manager and replay engine without it.

use survey_core::{CellCoord, MapQuery};
use thiserror::Error;

/// Glyph marking a traversable cell in the textual grid notation.
pub const OPEN_GLYPH: char = '.';
/// Glyph marking a blocked cell in the textual grid notation.
pub const BLOCKED_GLYPH: char = '#';

/// Dense row-major grid of traversable and blocked cells.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GridMap {
    rows: u32,
    columns: u32,
    cells: Vec<bool>,
}

impl GridMap {
    /// Creates a map of the provided dimensions where every cell is traversable.
    #[must_use]
    pub fn open(rows: u32, columns: u32) -> Self {
        let capacity_u64 = u64::from(rows) * u64::from(columns);
        let capacity = usize::try_from(capacity_u64).unwrap_or(0);
        Self {
            rows,
            columns,
            cells: vec![true; capacity],
        }
    }

    /// Builds a map from textual rows using `.` for open and `#` for blocked cells.
    pub fn from_rows<S: AsRef<str>>(lines: &[S]) -> Result<Self, GridMapError> {
        let Some(first) = lines.first() else {
            return Err(GridMapError::Empty);
        };
        let expected = first.as_ref().chars().count();
        if expected == 0 {
            return Err(GridMapError::Empty);
        }

        let mut cells = Vec::with_capacity(expected * lines.len());
        for (row, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != expected {
                return Err(GridMapError::RaggedRow {
                    row,
                    expected,
                    found,
                });
            }

            for (column, glyph) in line.chars().enumerate() {
                let traversable = match glyph {
                    OPEN_GLYPH => true,
                    BLOCKED_GLYPH => false,
                    _ => {
                        return Err(GridMapError::UnknownGlyph { glyph, row, column });
                    }
                };
                cells.push(traversable);
            }
        }

        Ok(Self {
            rows: u32::try_from(lines.len()).map_err(|_| GridMapError::TooLarge)?,
            columns: u32::try_from(expected).map_err(|_| GridMapError::TooLarge)?,
            cells,
        })
    }

    /// Marks the cell as traversable or blocked. Cells outside the map are ignored.
    pub fn set_traversable(&mut self, cell: CellCoord, traversable: bool) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = traversable;
            }
        }
    }

    /// Number of cells the agent may occupy.
    #[must_use]
    pub fn traversable_count(&self) -> usize {
        self.cells.iter().filter(|open| **open).count()
    }

    /// Iterator over every traversable cell in row-major order.
    pub fn traversable_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        let columns = self.columns;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, open)| **open)
            .filter_map(move |(index, _)| cell_at(index, columns))
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.is_within_bounds(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }
}

impl MapQuery for GridMap {
    fn row_count(&self) -> u32 {
        self.rows
    }

    fn column_count(&self) -> u32 {
        self.columns
    }

    fn is_traversable(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or(false)
    }
}

fn cell_at(index: usize, columns: u32) -> Option<CellCoord> {
    let width = usize::try_from(columns).ok().filter(|width| *width > 0)?;
    let row = i32::try_from(index / width).ok()?;
    let column = i32::try_from(index % width).ok()?;
    Some(CellCoord::new(row, column))
}

/// Errors raised while building a [`GridMap`] from textual rows.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum GridMapError {
    /// No rows, or an empty first row, were supplied.
    #[error("grid map must contain at least one cell")]
    Empty,
    /// A row length differs from the first row.
    #[error("row {row} has {found} cells but the grid is {expected} cells wide")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width established by the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// A character other than the open or blocked glyph was found.
    #[error("unknown glyph '{glyph}' at row {row}, column {column}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Zero-based row of the character.
        row: usize,
        /// Zero-based column of the character.
        column: usize,
    },
    /// The grid dimensions do not fit the coordinate space.
    #[error("grid map dimensions exceed the supported coordinate range")]
    TooLarge,
}
