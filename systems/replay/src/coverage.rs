use std::collections::BTreeSet;

use survey_core::{CellCoord, MapQuery, Pose, ReplayError, Route};

use crate::replay;

/// Aggregate coverage achieved by replaying a full route.
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageSummary {
    /// Number of moves replayed.
    pub moves: usize,
    /// Distinct cells reported by any step's sensor footprint.
    pub sensed_cells: BTreeSet<CellCoord>,
    /// Distinct cells physically occupied, including the start and final cell.
    pub visited_cells: BTreeSet<CellCoord>,
    /// Number of traversable cells on the map.
    pub traversable_cells: usize,
    /// Pose held after the last move.
    pub final_pose: Pose,
    /// Indicates whether the route ends on the start cell.
    pub closed_loop: bool,
}

impl CoverageSummary {
    /// Distinct traversable cells either sensed or visited.
    #[must_use]
    pub fn covered_count(&self) -> usize {
        self.sensed_cells.union(&self.visited_cells).count()
    }

    /// Fraction of traversable cells covered, in `0.0..=1.0`.
    ///
    /// A map without traversable cells reports zero coverage.
    #[must_use]
    pub fn coverage_ratio(&self) -> f64 {
        if self.traversable_cells == 0 {
            return 0.0;
        }
        let covered = self.covered_count().min(self.traversable_cells);
        covered as f64 / self.traversable_cells as f64
    }
}

/// Replays the whole route and folds every step into a [`CoverageSummary`].
pub fn summarize<M>(start: Pose, route: &Route, map: &M) -> Result<CoverageSummary, ReplayError>
where
    M: MapQuery + ?Sized,
{
    let mut sensed_cells = BTreeSet::new();
    let mut visited_cells = BTreeSet::new();
    if map.is_traversable(start.cell()) {
        let _ = visited_cells.insert(start.cell());
    }

    let mut final_pose = start;
    for step in replay(start, route, map) {
        let step = step?;
        sensed_cells.extend(step.newly_sensed_cells.iter().copied());
        if map.is_traversable(step.pose_after.cell()) {
            let _ = visited_cells.insert(step.pose_after.cell());
        }
        final_pose = step.pose_after;
    }

    Ok(CoverageSummary {
        moves: route.len(),
        sensed_cells,
        visited_cells,
        traversable_cells: count_traversable(map),
        final_pose,
        closed_loop: !route.is_empty() && final_pose.cell() == start.cell(),
    })
}

fn count_traversable<M>(map: &M) -> usize
where
    M: MapQuery + ?Sized,
{
    let rows = i32::try_from(map.row_count()).unwrap_or(i32::MAX);
    let columns = i32::try_from(map.column_count()).unwrap_or(i32::MAX);
    (0..rows)
        .flat_map(|row| (0..columns).map(move |column| CellCoord::new(row, column)))
        .filter(|cell| map.is_traversable(*cell))
        .count()
}
