//! Row-by-row step instructions.
//!
//! Rows alternate working direction the way row-built crochet is actually
//! executed: even rows left to right, odd rows right to left. Runs of the
//! same color collapse into one step. All stored columns use the grid's
//! left-to-right coordinate space; the reversal exists only inside the
//! traversal, never in a stored unit.

use serde::Serialize;

use crate::error::PatternError;
use crate::mapper::ColorGrid;
use crate::palette::YarnPalette;

/// Working direction of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    /// Direction of a 0-indexed row: even rows run forward.
    pub fn for_row(row_idx: u32) -> Self {
        if row_idx % 2 == 0 {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Direction::Forward => "to the right",
            Direction::Reverse => "to the left",
        }
    }
}

/// Map a span recorded in traversal order back to left-to-right columns.
///
/// The single place where reverse-row coordinates are converted; stored
/// units only ever carry the result.
pub(crate) fn normalize_span(direction: Direction, start: u32, end: u32, width: u32) -> (u32, u32) {
    match direction {
        Direction::Forward => (start, end),
        Direction::Reverse => (width - end, width - start),
    }
}

/// One run of same-colored stitches within a row.
///
/// `start_col..end_col` is always expressed in the grid's left-to-right
/// coordinate space, regardless of direction. Position fields never change
/// after creation; only `color` and `instruction` are updated by edits.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepUnit {
    /// 1-based sequence number in working order.
    pub number: u32,
    /// 1-based row.
    pub row: u32,
    pub start_col: u32,
    /// Exclusive.
    pub end_col: u32,
    pub color: &'static str,
    /// Run length in stitches.
    pub count: u32,
    pub direction: Direction,
    pub instruction: String,
}

/// The ordered step sequence for one grid, owning the grid it was built
/// from so edits stay consistent with it.
#[derive(Debug)]
pub struct StepSequence {
    grid: ColorGrid,
    steps: Vec<StepUnit>,
}

impl StepSequence {
    /// Build the full instruction sequence for a grid.
    pub fn build(grid: ColorGrid) -> Self {
        let width = grid.width();
        let mut steps = Vec::new();
        let mut number = 1u32;

        for row_idx in 0..grid.height() {
            let direction = Direction::for_row(row_idx);
            let mut traversal: Vec<&'static str> = grid.row(row_idx).to_vec();
            if direction == Direction::Reverse {
                traversal.reverse();
            }

            let mut run_start = 0usize;
            while run_start < traversal.len() {
                let color = traversal[run_start];
                let mut run_end = run_start + 1;
                while run_end < traversal.len() && traversal[run_end] == color {
                    run_end += 1;
                }

                let count = (run_end - run_start) as u32;
                let (start_col, end_col) =
                    normalize_span(direction, run_start as u32, run_end as u32, width);
                let new_row = run_start == 0 && row_idx > 0;

                steps.push(StepUnit {
                    number,
                    row: row_idx + 1,
                    start_col,
                    end_col,
                    color,
                    count,
                    direction,
                    instruction: instruction_text(color, count, direction, new_row),
                });
                number += 1;
                run_start = run_end;
            }
        }

        log::debug!(
            "built {} steps for a {}x{} grid",
            steps.len(),
            grid.width(),
            grid.height()
        );
        Self { grid, steps }
    }

    pub fn steps(&self) -> &[StepUnit] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The grid with all edits applied.
    pub fn grid(&self) -> &ColorGrid {
        &self.grid
    }

    /// Fetch a step by its 1-based number.
    pub fn get(&self, number: u32) -> Result<&StepUnit, PatternError> {
        let total = self.steps.len() as u32;
        if number == 0 || number > total {
            return Err(PatternError::StepOutOfRange {
                requested: number,
                total,
            });
        }
        Ok(&self.steps[(number - 1) as usize])
    }

    /// All steps of a 1-based row, in working order.
    pub fn steps_for_row(&self, row: u32) -> Vec<&StepUnit> {
        self.steps.iter().filter(|s| s.row == row).collect()
    }

    /// Compact per-row instruction lines for document export.
    pub fn row_instructions(&self) -> Vec<String> {
        (1..=self.grid.height())
            .map(|row| {
                let parts: Vec<String> = self
                    .steps
                    .iter()
                    .filter(|s| s.row == row)
                    .map(|s| format!("{}×{}", s.count, s.color))
                    .collect();
                format!("Row {}: {}", row, parts.join(" + "))
            })
            .collect()
    }

    /// Recolor one step.
    ///
    /// Rewrites the step's cells in the grid and regenerates its
    /// instruction; position fields and every other step stay untouched.
    /// Adjacent steps are deliberately NOT merged when the edit makes them
    /// color-identical: merging would renumber later steps and invalidate
    /// step numbers a caller is holding mid-traversal.
    pub fn edit(
        &mut self,
        number: u32,
        new_color: &str,
        palette: &YarnPalette,
    ) -> Result<&StepUnit, PatternError> {
        let total = self.steps.len() as u32;
        if number == 0 || number > total {
            return Err(PatternError::StepOutOfRange {
                requested: number,
                total,
            });
        }
        let entry = palette
            .get(new_color)
            .ok_or_else(|| PatternError::UnknownColor(new_color.to_string()))?;

        let idx = (number - 1) as usize;
        let (row, start_col, end_col, count, direction) = {
            let step = &self.steps[idx];
            (
                step.row,
                step.start_col,
                step.end_col,
                step.count,
                step.direction,
            )
        };

        for col in start_col..end_col {
            self.grid.set(row - 1, col, entry.name);
        }

        let new_row = row > 1 && begins_row(direction, start_col, end_col, self.grid.width());
        let step = &mut self.steps[idx];
        step.color = entry.name;
        step.instruction = instruction_text(entry.name, count, direction, new_row);

        Ok(&self.steps[idx])
    }
}

/// Whether a span is the first run of its row in working order.
fn begins_row(direction: Direction, start_col: u32, end_col: u32, width: u32) -> bool {
    match direction {
        Direction::Forward => start_col == 0,
        Direction::Reverse => end_col == width,
    }
}

fn instruction_text(color: &str, count: u32, direction: Direction, new_row: bool) -> String {
    let noun = if count == 1 { "stitch" } else { "stitches" };
    let base = format!("work {} {} in {}, {}", count, noun, color, direction.marker());
    if new_row {
        format!("new row: {}", base)
    } else {
        base
    }
}
