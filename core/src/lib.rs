#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the survey mission workspace.
//!
//! This crate defines the vocabulary that connects the external map and
//! planning collaborators, the mission state manager, and the route replay
//! engine. Maps are consumed exclusively through the read-only [`MapQuery`]
//! capability, agents and routes are plain values, and the orientation state
//! machine lives here as the pure [`turn`] function so every system agrees on
//! how headings rotate.

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Location of a single grid cell expressed as row and column coordinates.
///
/// Coordinates are signed so that footprint windows reaching past the map
/// edge can be represented before the map rejects them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: i32,
    column: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: i32, column: i32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.column
    }

    /// Returns the cell displaced by the provided row and column deltas.
    #[must_use]
    pub const fn offset(self, rows: i32, columns: i32) -> Self {
        Self {
            row: self.row.saturating_add(rows),
            column: self.column.saturating_add(columns),
        }
    }

    /// Returns the neighbouring cell one step toward the provided heading.
    ///
    /// Yields `None` when the neighbour lies beyond the coordinate limits.
    #[must_use]
    pub const fn step(self, heading: Heading) -> Option<Self> {
        let (rows, columns) = heading.unit_offset();
        let Some(row) = self.row.checked_add(rows) else {
            return None;
        };
        let Some(column) = self.column.checked_add(columns) else {
            return None;
        };
        Some(Self { row, column })
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// Cardinal directions an agent may face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heading {
    /// Facing toward decreasing row indices.
    North,
    /// Facing toward increasing column indices.
    East,
    /// Facing toward increasing row indices.
    South,
    /// Facing toward decreasing column indices.
    West,
}

impl Heading {
    /// Every heading in clockwise order starting from north.
    pub const ALL: [Heading; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Heading reached after a 90° clockwise rotation.
    #[must_use]
    pub const fn clockwise(self) -> Self {
        match self {
            Self::North => Self::East,
            Self::East => Self::South,
            Self::South => Self::West,
            Self::West => Self::North,
        }
    }

    /// Heading reached after a 90° counter-clockwise rotation.
    #[must_use]
    pub const fn counter_clockwise(self) -> Self {
        match self {
            Self::North => Self::West,
            Self::West => Self::South,
            Self::South => Self::East,
            Self::East => Self::North,
        }
    }

    /// Row and column deltas of a single forward step.
    #[must_use]
    pub const fn unit_offset(self) -> (i32, i32) {
        match self {
            Self::North => (-1, 0),
            Self::East => (0, 1),
            Self::South => (1, 0),
            Self::West => (0, -1),
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
        };
        f.write_str(label)
    }
}

/// Atomic instruction emitted by the external route planner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Move {
    /// Advance one cell in the current heading.
    Forward,
    /// Rotate 90° counter-clockwise in place.
    TurnLeft,
    /// Rotate 90° clockwise in place.
    TurnRight,
}

impl Move {
    /// Single-character notation used by the compact route format.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Forward => 'F',
            Self::TurnLeft => 'L',
            Self::TurnRight => 'R',
        }
    }

    /// Parses a move from its single-character notation, ignoring case.
    #[must_use]
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol.to_ascii_uppercase() {
            'F' => Some(Self::Forward),
            'L' => Some(Self::TurnLeft),
            'R' => Some(Self::TurnRight),
            _ => None,
        }
    }
}

/// Orientation state machine: heading reached after applying `command`.
///
/// `TurnRight` advances one step through north, east, south, west and
/// `TurnLeft` regresses one step. `Forward` never changes the heading.
#[must_use]
pub const fn turn(heading: Heading, command: Move) -> Heading {
    match command {
        Move::Forward => heading,
        Move::TurnLeft => heading.counter_clockwise(),
        Move::TurnRight => heading.clockwise(),
    }
}

/// Position and facing of the agent at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pose {
    cell: CellCoord,
    heading: Heading,
}

impl Pose {
    /// Creates a pose at the provided row and column facing `heading`.
    #[must_use]
    pub const fn new(row: i32, column: i32, heading: Heading) -> Self {
        Self {
            cell: CellCoord::new(row, column),
            heading,
        }
    }

    /// Creates a pose anchored at an existing cell coordinate.
    #[must_use]
    pub const fn at(cell: CellCoord, heading: Heading) -> Self {
        Self { cell, heading }
    }

    /// Cell occupied by the agent.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// Row occupied by the agent.
    #[must_use]
    pub const fn row(&self) -> i32 {
        self.cell.row()
    }

    /// Column occupied by the agent.
    #[must_use]
    pub const fn column(&self) -> i32 {
        self.cell.column()
    }

    /// Direction the agent faces.
    #[must_use]
    pub const fn heading(&self) -> Heading {
        self.heading
    }

    /// Pose reached by applying a single move, without consulting any map.
    ///
    /// Yields `None` when a forward move would leave the coordinate space.
    #[must_use]
    pub const fn apply(self, command: Move) -> Option<Self> {
        match command {
            Move::Forward => match self.cell.step(self.heading) {
                Some(cell) => Some(Self {
                    cell,
                    heading: self.heading,
                }),
                None => None,
            },
            Move::TurnLeft | Move::TurnRight => Some(Self {
                cell: self.cell,
                heading: turn(self.heading, command),
            }),
        }
    }
}

impl fmt::Display for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} facing {}", self.cell, self.heading)
    }
}

/// Ordered, immutable sequence of moves produced by a planner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Route {
    moves: Vec<Move>,
}

impl Route {
    /// Creates a route from the provided moves.
    #[must_use]
    pub fn new(moves: Vec<Move>) -> Self {
        Self { moves }
    }

    /// Moves composing the route in execution order.
    #[must_use]
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Number of moves in the route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Reports whether the route contains no moves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Iterator over the moves in execution order.
    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.moves.iter().copied()
    }
}

impl From<Vec<Move>> for Route {
    fn from(moves: Vec<Move>) -> Self {
        Self::new(moves)
    }
}

impl FromIterator<Move> for Route {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl FromStr for Route {
    type Err = RouteParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .chars()
            .enumerate()
            .filter(|(_, symbol)| !symbol.is_whitespace() && *symbol != ',')
            .map(|(position, symbol)| {
                Move::from_symbol(symbol).ok_or(RouteParseError::UnknownMove { symbol, position })
            })
            .collect()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for command in &self.moves {
            write!(f, "{}", command.symbol())?;
        }
        Ok(())
    }
}

/// Agent placed on a map, described by the pose it starts from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Agent {
    start: Pose,
}

impl Agent {
    /// Creates an agent that starts from the provided pose.
    #[must_use]
    pub const fn new(start: Pose) -> Self {
        Self { start }
    }

    /// Pose the agent occupies before executing any route.
    #[must_use]
    pub const fn start(&self) -> Pose {
        self.start
    }
}

/// Read-only query capability offered by the external map collaborator.
pub trait MapQuery {
    /// Number of rows laid out in the map.
    fn row_count(&self) -> u32;

    /// Number of columns laid out in the map.
    fn column_count(&self) -> u32;

    /// Reports whether the agent may occupy the cell.
    ///
    /// Implementations must return `false` for cells outside the map.
    fn is_traversable(&self, cell: CellCoord) -> bool;

    /// Reports whether the cell lies inside the map bounds.
    fn is_within_bounds(&self, cell: CellCoord) -> bool {
        let row_inside = u32::try_from(cell.row()).map_or(false, |row| row < self.row_count());
        let column_inside =
            u32::try_from(cell.column()).map_or(false, |column| column < self.column_count());
        row_inside && column_inside
    }
}

impl<T: MapQuery + ?Sized> MapQuery for &T {
    fn row_count(&self) -> u32 {
        (**self).row_count()
    }

    fn column_count(&self) -> u32 {
        (**self).column_count()
    }

    fn is_traversable(&self, cell: CellCoord) -> bool {
        (**self).is_traversable(cell)
    }

    fn is_within_bounds(&self, cell: CellCoord) -> bool {
        (**self).is_within_bounds(cell)
    }
}

impl<T: MapQuery + ?Sized> MapQuery for Arc<T> {
    fn row_count(&self) -> u32 {
        (**self).row_count()
    }

    fn column_count(&self) -> u32 {
        (**self).column_count()
    }

    fn is_traversable(&self, cell: CellCoord) -> bool {
        (**self).is_traversable(cell)
    }

    fn is_within_bounds(&self, cell: CellCoord) -> bool {
        (**self).is_within_bounds(cell)
    }
}

/// External planner that computes a coverage route for an agent on a map.
pub trait RoutePlanner<M: ?Sized> {
    /// Produces the route the agent should follow from its start pose.
    fn find_route(&self, map: &M, agent: &Agent) -> Route;
}

/// Fields of a mission, ordered by their dependency chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MissionField {
    /// Terrain map the mission operates on.
    Map,
    /// Agent placed on the map.
    Agent,
    /// Planner configured for the agent.
    Router,
    /// Route produced by the planner.
    Route,
}

impl fmt::Display for MissionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Map => "map",
            Self::Agent => "agent",
            Self::Router => "router",
            Self::Route => "route",
        };
        f.write_str(label)
    }
}

/// Reasons an agent placement may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementFault {
    /// The start cell lies outside the map bounds.
    OutOfBounds,
    /// The start cell is inside the map but blocked.
    NotTraversable,
}

impl fmt::Display for PlacementFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds => f.write_str("outside the map bounds"),
            Self::NotTraversable => f.write_str("not traversable"),
        }
    }
}

/// Failures reported by the mission state manager.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MissionError {
    /// An operation requires an upstream field that is not set.
    #[error("cannot {operation}: no {missing} loaded")]
    Precondition {
        /// Operation that was refused.
        operation: &'static str,
        /// Upstream field that must be set first.
        missing: MissionField,
    },
    /// The agent's start cell cannot be occupied on the current map.
    #[error("cannot place agent at {cell}: cell is {reason}")]
    InvalidPlacement {
        /// Requested start cell.
        cell: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementFault,
    },
}

/// Failures reported by the route replay engine.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ReplayError {
    /// A forward move would leave the map, so route and map do not match.
    #[error("route step {step} moves from {from} to {destination}, outside the map")]
    DataConsistency {
        /// Zero-based index of the offending move.
        step: usize,
        /// Pose held before the offending move.
        from: Pose,
        /// Cell the move would have entered, saturated at the coordinate limits.
        destination: CellCoord,
    },
}

/// Failures raised while parsing the compact route notation.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RouteParseError {
    /// A character did not name a known move.
    #[error("unknown move symbol '{symbol}' at position {position}")]
    UnknownMove {
        /// Offending character.
        symbol: char,
        /// Zero-based character position within the input.
        position: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::{turn, CellCoord, Heading, MapQuery, Move, Pose, Route, RouteParseError};
    use serde::{de::DeserializeOwned, Serialize};

    #[test]
    fn turning_left_then_right_restores_heading() {
        for heading in Heading::ALL {
            assert_eq!(turn(turn(heading, Move::TurnLeft), Move::TurnRight), heading);
            assert_eq!(turn(turn(heading, Move::TurnRight), Move::TurnLeft), heading);
        }
    }

    #[test]
    fn four_identical_turns_complete_a_revolution() {
        for heading in Heading::ALL {
            for command in [Move::TurnLeft, Move::TurnRight] {
                let mut current = heading;
                for _ in 0..4 {
                    current = turn(current, command);
                }
                assert_eq!(current, heading, "{command:?} from {heading:?}");
            }
        }
    }

    #[test]
    fn turn_right_follows_clockwise_cycle() {
        assert_eq!(turn(Heading::North, Move::TurnRight), Heading::East);
        assert_eq!(turn(Heading::East, Move::TurnRight), Heading::South);
        assert_eq!(turn(Heading::South, Move::TurnRight), Heading::West);
        assert_eq!(turn(Heading::West, Move::TurnRight), Heading::North);
        assert_eq!(turn(Heading::North, Move::TurnLeft), Heading::West);
    }

    #[test]
    fn forward_leaves_heading_untouched() {
        for heading in Heading::ALL {
            assert_eq!(turn(heading, Move::Forward), heading);
        }
    }

    #[test]
    fn forward_moves_one_cell_along_heading() {
        let origin = Pose::new(5, 5, Heading::North);
        assert_eq!(
            origin.apply(Move::Forward),
            Some(Pose::new(4, 5, Heading::North))
        );
        let east = Pose::new(5, 5, Heading::East);
        assert_eq!(east.apply(Move::Forward), Some(Pose::new(5, 6, Heading::East)));
        let south = Pose::new(5, 5, Heading::South);
        assert_eq!(
            south.apply(Move::Forward),
            Some(Pose::new(6, 5, Heading::South))
        );
        let west = Pose::new(5, 5, Heading::West);
        assert_eq!(west.apply(Move::Forward), Some(Pose::new(5, 4, Heading::West)));
    }

    #[test]
    fn forward_past_coordinate_limits_has_no_pose() {
        assert_eq!(Pose::new(i32::MAX, 0, Heading::South).apply(Move::Forward), None);
        assert_eq!(Pose::new(0, i32::MIN, Heading::West).apply(Move::Forward), None);
        assert_eq!(
            Pose::new(i32::MIN, 0, Heading::North).apply(Move::TurnRight),
            Some(Pose::new(i32::MIN, 0, Heading::East)),
            "turning never moves the agent"
        );
    }

    #[test]
    fn route_parses_compact_notation() {
        let route: Route = "ff r, L".parse().expect("route parses");
        assert_eq!(
            route.moves(),
            &[Move::Forward, Move::Forward, Move::TurnRight, Move::TurnLeft]
        );
        assert_eq!(route.to_string(), "FFRL");
    }

    #[test]
    fn route_parse_reports_unknown_symbol() {
        let error = "FFX".parse::<Route>().expect_err("X is not a move");
        assert_eq!(
            error,
            RouteParseError::UnknownMove {
                symbol: 'X',
                position: 2
            }
        );
    }

    #[test]
    fn empty_notation_yields_empty_route() {
        let route: Route = "".parse().expect("empty route parses");
        assert!(route.is_empty());
    }

    struct Bounds {
        rows: u32,
        columns: u32,
    }

    impl MapQuery for Bounds {
        fn row_count(&self) -> u32 {
            self.rows
        }

        fn column_count(&self) -> u32 {
            self.columns
        }

        fn is_traversable(&self, cell: CellCoord) -> bool {
            self.is_within_bounds(cell)
        }
    }

    #[test]
    fn default_bounds_check_rejects_negative_and_overflowing_cells() {
        let map = Bounds {
            rows: 3,
            columns: 2,
        };
        assert!(map.is_within_bounds(CellCoord::new(0, 0)));
        assert!(map.is_within_bounds(CellCoord::new(2, 1)));
        assert!(!map.is_within_bounds(CellCoord::new(3, 0)));
        assert!(!map.is_within_bounds(CellCoord::new(0, 2)));
        assert!(!map.is_within_bounds(CellCoord::new(-1, 0)));
        assert!(!(&map).is_within_bounds(CellCoord::new(0, -1)));
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn pose_and_route_round_trip_through_bincode() {
        assert_round_trip(&Pose::new(9, 4, Heading::South));
        assert_round_trip(&Route::new(vec![Move::Forward, Move::TurnLeft]));
    }
}
