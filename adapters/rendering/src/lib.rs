#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Text rendering adapter for survey replays.
//!
//! A [`TextCanvas`] mirrors the map as a grid of glyphs and folds replay
//! steps into it one at a time. Frames are handed to a [`Presenter`]; the
//! choice between drawing only the finished trajectory and drawing every
//! intermediate frame with a pause is made by [`ReplayMode`].

use std::{fmt, io::Write, thread, time::Duration};

use anyhow::{Context, Result as AnyResult};
use survey_core::{CellCoord, Heading, MapQuery, Pose, ReplayError};
use survey_system_replay::StepResult;

/// Visual state of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Glyph {
    /// Traversable cell not yet observed.
    Open,
    /// Cell the agent may never occupy.
    Blocked,
    /// Cell the agent physically passed through.
    Trail,
    /// Cell reported by a sensor footprint.
    Sensed,
    /// Cell the agent started from.
    Start,
    /// Start cell after the agent returned to it.
    ClosedLoop,
}

impl Glyph {
    /// Character used to draw the glyph.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Open => '.',
            Self::Blocked => '#',
            Self::Trail => '*',
            Self::Sensed => 'o',
            Self::Start => 'S',
            Self::ClosedLoop => '@',
        }
    }
}

/// Character used to draw the agent facing `heading`.
#[must_use]
pub const fn agent_symbol(heading: Heading) -> char {
    match heading {
        Heading::North => '^',
        Heading::East => '>',
        Heading::South => 'v',
        Heading::West => '<',
    }
}

/// Mutable glyph grid that accumulates replay steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextCanvas {
    rows: u32,
    columns: u32,
    cells: Vec<Glyph>,
    agent: Option<Pose>,
    steps_applied: usize,
}

impl TextCanvas {
    /// Captures the map's traversability as a fresh canvas.
    #[must_use]
    pub fn from_map<M>(map: &M) -> Self
    where
        M: MapQuery + ?Sized,
    {
        let rows = map.row_count();
        let columns = map.column_count();
        let mut cells = Vec::new();
        for row in 0..rows {
            for column in 0..columns {
                let cell = to_cell(row, column);
                let glyph = if cell.map_or(false, |cell| map.is_traversable(cell)) {
                    Glyph::Open
                } else {
                    Glyph::Blocked
                };
                cells.push(glyph);
            }
        }

        Self {
            rows,
            columns,
            cells,
            agent: None,
            steps_applied: 0,
        }
    }

    /// Places the agent at its start pose and marks the start cell.
    pub fn place_agent(&mut self, start: Pose) {
        self.paint(start.cell(), Glyph::Start);
        self.agent = Some(start);
    }

    /// Folds a replay step into the canvas.
    pub fn apply_step(&mut self, step: &StepResult) {
        let before = step.pose_before.cell();
        if self.glyph(before) != Some(Glyph::Start) && self.glyph(before) != Some(Glyph::ClosedLoop)
        {
            self.paint(before, Glyph::Trail);
        }

        for cell in &step.newly_sensed_cells {
            if self.glyph(*cell) == Some(Glyph::Open) {
                self.paint(*cell, Glyph::Sensed);
            }
        }

        if step.is_return_to_start {
            self.paint(step.pose_after.cell(), Glyph::ClosedLoop);
        }
        self.agent = Some(step.pose_after);
        self.steps_applied += 1;
    }

    /// Glyph stored for the cell, ignoring the agent overlay.
    #[must_use]
    pub fn glyph(&self, cell: CellCoord) -> Option<Glyph> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Number of steps folded into the canvas so far.
    #[must_use]
    pub const fn steps_applied(&self) -> usize {
        self.steps_applied
    }

    /// Renders the current canvas, with the agent drawn on top.
    #[must_use]
    pub fn frame(&self) -> Frame {
        let width = usize::try_from(self.columns).unwrap_or(0);
        let agent = self
            .agent
            .and_then(|pose| self.index(pose.cell()).map(|index| (index, pose.heading())));
        let lines: Vec<String> = if width == 0 {
            Vec::new()
        } else {
            self.cells
                .chunks(width)
                .enumerate()
                .map(|(row, glyphs)| {
                    glyphs
                        .iter()
                        .enumerate()
                        .map(|(column, glyph)| match agent {
                            Some((index, heading)) if index == row * width + column => {
                                agent_symbol(heading)
                            }
                            _ => glyph.symbol(),
                        })
                        .collect()
                })
                .collect()
        };

        Frame {
            step: self.steps_applied,
            lines,
        }
    }

    fn paint(&mut self, cell: CellCoord, glyph: Glyph) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = glyph;
            }
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        let row = u32::try_from(cell.row()).ok()?;
        let column = u32::try_from(cell.column()).ok()?;
        if row >= self.rows || column >= self.columns {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        Some(usize::try_from(row).ok()? * width + usize::try_from(column).ok()?)
    }
}

fn to_cell(row: u32, column: u32) -> Option<CellCoord> {
    Some(CellCoord::new(
        i32::try_from(row).ok()?,
        i32::try_from(column).ok()?,
    ))
}

/// Rendered snapshot of the canvas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Number of steps folded into the canvas when the frame was taken.
    pub step: usize,
    /// One string per map row.
    pub lines: Vec<String>,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Destination for rendered frames.
pub trait Presenter {
    /// Presents a single frame.
    fn present(&mut self, frame: &Frame) -> AnyResult<()>;
}

/// Presenter that writes frames to any byte sink.
#[derive(Debug)]
pub struct WriterPresenter<W> {
    writer: W,
}

impl<W: Write> WriterPresenter<W> {
    /// Wraps the provided writer.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the presenter, yielding the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Presenter for WriterPresenter<W> {
    fn present(&mut self, frame: &Frame) -> AnyResult<()> {
        writeln!(self.writer, "step {}", frame.step).context("failed to write frame header")?;
        write!(self.writer, "{frame}").context("failed to write frame")?;
        self.writer.flush().context("failed to flush frame")
    }
}

/// How replay steps are turned into frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayMode {
    /// Fold every step, then present the finished trajectory once.
    Instant,
    /// Present the initial frame and one frame per step, pausing between them.
    Animated {
        /// Delay inserted after each presented step.
        pace: Duration,
    },
}

/// Drives replay steps through the canvas and presenter.
///
/// Returns the number of steps drawn. A replay inconsistency aborts drawing
/// after the frames produced so far have been presented.
pub fn render_replay<I, P>(
    canvas: &mut TextCanvas,
    steps: I,
    presenter: &mut P,
    mode: ReplayMode,
) -> AnyResult<usize>
where
    I: IntoIterator<Item = Result<StepResult, ReplayError>>,
    P: Presenter + ?Sized,
{
    if let ReplayMode::Animated { .. } = mode {
        presenter.present(&canvas.frame())?;
    }

    let mut drawn = 0;
    for step in steps {
        let step = match step {
            Ok(step) => step,
            Err(error) => {
                if mode == ReplayMode::Instant {
                    presenter.present(&canvas.frame())?;
                }
                return Err(error).context("replay halted before the route finished");
            }
        };
        canvas.apply_step(&step);
        drawn += 1;

        if let ReplayMode::Animated { pace } = mode {
            presenter.present(&canvas.frame())?;
            if !pace.is_zero() {
                thread::sleep(pace);
            }
        }
    }

    if mode == ReplayMode::Instant {
        presenter.present(&canvas.frame())?;
    }
    tracing::debug!(drawn, "replay rendered");
    Ok(drawn)
}
