use crate::{
    batch::image::ImageShape,
    foundation::{
        core::{Extent2, IRect, Point2},
        error::{PasteError, PasteResult},
    },
};

/// A rectangle of one canvas attributed to exactly one source region, or to background.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridCell {
    /// Index of the source image in the input batch. `None` means background.
    pub source: Option<usize>,
    pub cell_start: Point2,
    /// Exclusive.
    pub cell_end: Point2,
    /// Source position matching `cell_start`.
    pub source_anchor: Point2,
}

impl GridCell {
    pub fn background(cell_start: Point2, cell_end: Point2) -> Self {
        Self {
            source: None,
            cell_start,
            cell_end,
            source_anchor: Point2::ZERO,
        }
    }

    pub fn from_source(
        source: usize,
        cell_start: Point2,
        cell_end: Point2,
        source_anchor: Point2,
    ) -> Self {
        Self {
            source: Some(source),
            cell_start,
            cell_end,
            source_anchor,
        }
    }

    pub fn rect(&self) -> IRect {
        IRect::new(self.cell_start, self.cell_end)
    }
}

/// Grid dimensions: `rows` along y, `cols` along x.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GridCounts {
    pub rows: usize,
    pub cols: usize,
}

impl GridCounts {
    pub fn len(self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// Resolved, non-overlapping partition of one canvas.
///
/// Cells are stored row-major. Every row shares its y boundaries and every column shares its
/// x boundaries across all rows, both strictly increasing; the compositor's forward-only cursor
/// depends on that ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleGrid {
    pub counts: GridCounts,
    pub cells: Vec<GridCell>,
}

impl SampleGrid {
    /// Single background cell covering the whole canvas (no cells for an empty canvas).
    pub fn background(canvas: Extent2) -> Self {
        if canvas.is_empty() {
            return Self {
                counts: GridCounts::default(),
                cells: Vec::new(),
            };
        }
        Self {
            counts: GridCounts { rows: 1, cols: 1 },
            cells: vec![GridCell::background(
                Point2::ZERO,
                Point2::new(canvas.width, canvas.height),
            )],
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> &GridCell {
        &self.cells[row * self.counts.cols + col]
    }

    pub fn covered_area(&self) -> i64 {
        self.cells.iter().map(|c| c.rect().area()).sum()
    }

    /// Check the monotonic tensor-grid invariant, full canvas coverage, and that every sourced
    /// cell maps inside its source image.
    pub fn validate(
        &self,
        sample_idx: usize,
        canvas: Extent2,
        sources: &[ImageShape],
    ) -> PasteResult<()> {
        let fail = |msg: String| PasteError::at_sample(sample_idx, format!("grid: {msg}"));
        let GridCounts { rows, cols } = self.counts;

        if self.cells.len() != rows * cols {
            return Err(fail(format!(
                "{} cells for a {rows}x{cols} grid",
                self.cells.len()
            )));
        }
        if canvas.is_empty() {
            return if self.cells.is_empty() {
                Ok(())
            } else {
                Err(fail("cells supplied for an empty canvas".to_string()))
            };
        }
        if rows == 0 || cols == 0 {
            return Err(fail("no cells for a non-empty canvas".to_string()));
        }

        let mut y = 0;
        for r in 0..rows {
            let mut x = 0;
            for c in 0..cols {
                let cell = self.cell(r, c);
                let head = self.cell(r, 0);
                let top = self.cell(0, c);
                if cell.cell_start.y != y || cell.cell_end.y != head.cell_end.y {
                    return Err(fail(format!("cell ({r}, {c}) breaks row boundaries")));
                }
                if cell.cell_start.x != x || cell.cell_end.x != top.cell_end.x {
                    return Err(fail(format!("cell ({r}, {c}) breaks column boundaries")));
                }
                if cell.rect().is_empty() {
                    return Err(fail(format!("cell ({r}, {c}) is empty or inverted")));
                }
                if let Some(src) = cell.source {
                    let Some(shape) = sources.get(src) else {
                        return Err(fail(format!("cell ({r}, {c}) references missing source {src}")));
                    };
                    let mapped = IRect::checked_from_anchor(cell.source_anchor, cell.rect().extent())
                        .filter(|m| {
                            cell.source_anchor.is_non_negative()
                                && IRect::from_extent(shape.extent()).contains_rect(*m)
                        });
                    if mapped.is_none() {
                        return Err(fail(format!(
                            "cell ({r}, {c}) reads from {:?} outside source {src}",
                            cell.source_anchor
                        )));
                    }
                }
                x = cell.cell_end.x;
            }
            if x != canvas.width {
                return Err(fail(format!("row {r} ends at x={x}, canvas width is {}", canvas.width)));
            }
            y = self.cell(r, 0).cell_end.y;
        }
        if y != canvas.height {
            return Err(fail(format!("grid ends at y={y}, canvas height is {}", canvas.height)));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/grid/cell.rs"]
mod tests;
