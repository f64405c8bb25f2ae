#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic route replay engine.
//!
//! Replay interprets an abstract move sequence against the orientation state
//! machine, reconstructing the agent's trajectory together with the sensor
//! footprint observed after every move. The engine never touches the map
//! beyond read-only queries and keeps no state between invocations, so the
//! same start pose, route and map always produce the same step sequence.
//! Whether the caller draws every step at once or paces them for animation
//! is a consumer concern; [`Replay`] is an ordinary lazy iterator either way.

mod coverage;

use std::{collections::HashSet, iter::FusedIterator, ops::RangeInclusive};

use survey_core::{CellCoord, Heading, MapQuery, Move, Pose, ReplayError, Route};

pub use coverage::{summarize, CoverageSummary};

/// Outcome of replaying a single move.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StepResult {
    /// Zero-based position of the move within the route.
    pub index: usize,
    /// Move that produced this step.
    pub command: Move,
    /// Pose held before the move was applied.
    pub pose_before: Pose,
    /// Pose reached after the move was applied.
    pub pose_after: Pose,
    /// Footprint cells in bounds, traversable and not on the agent's trail, in row-major order.
    pub newly_sensed_cells: Vec<CellCoord>,
    /// Indicates whether the move ends on the start cell, regardless of heading.
    pub is_return_to_start: bool,
}

/// Starts a replay of `route` from `start` against `map`.
#[must_use]
pub fn replay<'a, M>(start: Pose, route: &'a Route, map: &'a M) -> Replay<'a, M>
where
    M: MapQuery + ?Sized,
{
    Replay {
        map,
        moves: route.moves(),
        start,
        pose: start,
        cursor: 0,
        trail: HashSet::new(),
        halted: false,
    }
}

/// Eagerly replays the full route, stopping at the first inconsistency.
pub fn trajectory<M>(start: Pose, route: &Route, map: &M) -> Result<Vec<StepResult>, ReplayError>
where
    M: MapQuery + ?Sized,
{
    replay(start, route, map).collect()
}

/// Lazy, finite sequence of [`StepResult`] values.
///
/// After a [`ReplayError`] is yielded the iterator is exhausted.
#[derive(Debug)]
pub struct Replay<'a, M: ?Sized> {
    map: &'a M,
    moves: &'a [Move],
    start: Pose,
    pose: Pose,
    cursor: usize,
    trail: HashSet<CellCoord>,
    halted: bool,
}

impl<'a, M> Replay<'a, M>
where
    M: MapQuery + ?Sized,
{
    /// Rewinds the replay to the start pose so the sequence can be consumed again.
    pub fn restart(&mut self) {
        self.pose = self.start;
        self.cursor = 0;
        self.trail.clear();
        self.halted = false;
    }

    /// Pose the agent holds after the steps consumed so far.
    #[must_use]
    pub fn current_pose(&self) -> Pose {
        self.pose
    }

    fn advance(&mut self, index: usize, command: Move) -> Result<StepResult, ReplayError> {
        let pose_before = self.pose;
        let pose_after = pose_before
            .apply(command)
            .filter(|pose| command != Move::Forward || self.map.is_within_bounds(pose.cell()));
        let Some(pose_after) = pose_after else {
            // Only a forward move can leave the map; past the coordinate
            // limits the reported destination saturates.
            let (rows, columns) = pose_before.heading().unit_offset();
            let destination = pose_before.cell().offset(rows, columns);
            tracing::debug!(
                step = index,
                from = %pose_before,
                %destination,
                "route leaves the map"
            );
            return Err(ReplayError::DataConsistency {
                step: index,
                from: pose_before,
                destination,
            });
        };

        let _ = self.trail.insert(pose_before.cell());
        let newly_sensed_cells: Vec<CellCoord> = SensorWindow::facing(pose_after)
            .cells()
            .filter(|cell| {
                self.map.is_within_bounds(*cell)
                    && self.map.is_traversable(*cell)
                    && !self.trail.contains(cell)
            })
            .collect();

        self.pose = pose_after;
        let is_return_to_start = pose_after.cell() == self.start.cell();
        tracing::trace!(
            step = index,
            pose = %pose_after,
            sensed = newly_sensed_cells.len(),
            "replayed move"
        );

        Ok(StepResult {
            index,
            command,
            pose_before,
            pose_after,
            newly_sensed_cells,
            is_return_to_start,
        })
    }
}

impl<M: ?Sized> Clone for Replay<'_, M> {
    fn clone(&self) -> Self {
        Self {
            map: self.map,
            moves: self.moves,
            start: self.start,
            pose: self.pose,
            cursor: self.cursor,
            trail: self.trail.clone(),
            halted: self.halted,
        }
    }
}

impl<M> Iterator for Replay<'_, M>
where
    M: MapQuery + ?Sized,
{
    type Item = Result<StepResult, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.halted {
            return None;
        }
        let index = self.cursor;
        let command = *self.moves.get(index)?;
        self.cursor += 1;

        let step = self.advance(index, command);
        if step.is_err() {
            self.halted = true;
        }
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.halted {
            return (0, Some(0));
        }
        let remaining = self.moves.len().saturating_sub(self.cursor);
        (0, Some(remaining))
    }
}

impl<M> FusedIterator for Replay<'_, M> where M: MapQuery + ?Sized {}

/// Rectangular window of cells observed ahead of the agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SensorWindow {
    rows: RangeInclusive<i32>,
    columns: RangeInclusive<i32>,
}

impl SensorWindow {
    /// Window observed by an agent holding `pose`.
    ///
    /// The window spans two cells ahead and one cell to either side. Rows and
    /// columns beyond the coordinate limits are left out of the window.
    #[must_use]
    pub fn facing(pose: Pose) -> Self {
        let row = pose.row();
        let column = pose.column();
        let (rows, columns) = match pose.heading() {
            Heading::North => (span(row, -2, -1), span(column, -1, 1)),
            Heading::South => (span(row, 1, 2), span(column, -1, 1)),
            Heading::East => (span(row, -1, 1), span(column, 1, 2)),
            Heading::West => (span(row, -1, 1), span(column, -2, -1)),
        };
        Self { rows, columns }
    }

    /// Rows covered by the window.
    #[must_use]
    pub fn rows(&self) -> RangeInclusive<i32> {
        self.rows.clone()
    }

    /// Columns covered by the window.
    #[must_use]
    pub fn columns(&self) -> RangeInclusive<i32> {
        self.columns.clone()
    }

    /// Cells covered by the window in row-major order, unfiltered.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.rows.clone().flat_map(move |row| {
            self.columns
                .clone()
                .map(move |column| CellCoord::new(row, column))
        })
    }
}

/// Inclusive range `anchor + nearest..=anchor + farthest`, clipped to `i32`.
fn span(anchor: i32, nearest: i32, farthest: i32) -> RangeInclusive<i32> {
    let anchor = i64::from(anchor);
    let low = (anchor + i64::from(nearest)).max(i64::from(i32::MIN));
    let high = (anchor + i64::from(farthest)).min(i64::from(i32::MAX));
    match (i32::try_from(low), i32::try_from(high)) {
        (Ok(low), Ok(high)) => low..=high,
        _ => 1..=0,
    }
}
