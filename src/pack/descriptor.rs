use std::ops::Range;

use crate::{
    batch::layout::BatchLayout,
    foundation::error::{PasteError, PasteResult},
};

/// `GridCellDesc::source` value of a background cell.
pub const NO_SOURCE: u32 = u32::MAX;
/// `GridCellDesc::source_pitch` value of a background cell.
pub const NO_PITCH: i32 = -1;

/// Packed per-sample descriptor. Column quantities are in flattened (pixel, channel) elements.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SampleDesc {
    /// Output canvas index.
    pub output: u32,
    /// First cell of this sample in the packed cell array.
    pub grid_cell_start: u32,
    pub cell_rows: u32,
    pub cell_cols: u32,
    pub out_pitch: u32,
}

impl SampleDesc {
    pub fn grid_cells(&self) -> Range<usize> {
        let start = self.grid_cell_start as usize;
        start..start + self.cell_rows as usize * self.cell_cols as usize
    }
}

/// Packed grid cell. `x` quantities are scaled by the channel count.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridCellDesc {
    /// Source image index, or [`NO_SOURCE`].
    pub source: u32,
    /// Source row pitch in elements, or [`NO_PITCH`].
    pub source_pitch: i32,
    pub start_y: i32,
    pub start_x: i32,
    pub end_y: i32,
    pub end_x: i32,
    pub anchor_y: i32,
    pub anchor_x: i32,
}

impl Default for GridCellDesc {
    fn default() -> Self {
        Self {
            source: NO_SOURCE,
            source_pitch: NO_PITCH,
            start_y: 0,
            start_x: 0,
            end_y: 0,
            end_x: 0,
            anchor_y: 0,
            anchor_x: 0,
        }
    }
}

impl GridCellDesc {
    pub fn source(&self) -> Option<usize> {
        (self.source != NO_SOURCE).then_some(self.source as usize)
    }
}

/// Flatten a resolved batch into the packed sample and cell arrays.
///
/// Writes the first `layout.samples.len()` sample descriptors and the first
/// `layout.total_cells()` cell descriptors; the rest of each slice is left untouched.
pub fn pack_descriptors(
    layout: &BatchLayout,
    samples_out: &mut [SampleDesc],
    cells_out: &mut [GridCellDesc],
) -> PasteResult<()> {
    let n = layout.samples.len();
    let total = layout.total_cells();
    if samples_out.len() < n || cells_out.len() < total {
        return Err(PasteError::resource(format!(
            "descriptor arrays hold {} samples / {} cells, batch needs {n} / {total}",
            samples_out.len(),
            cells_out.len()
        )));
    }

    let c = layout.channels as i64;
    let mut cursor = 0usize;
    for (i, (sample, desc)) in layout.samples.iter().zip(samples_out.iter_mut()).enumerate() {
        let counts = sample.grid.counts;
        *desc = SampleDesc {
            output: to_u32(i, i as i64, "sample index")?,
            grid_cell_start: to_u32(i, cursor as i64, "grid cell offset")?,
            cell_rows: to_u32(i, counts.rows as i64, "grid rows")?,
            cell_cols: to_u32(i, counts.cols as i64, "grid columns")?,
            out_pitch: to_u32(i, sample.canvas.row_pitch() as i64, "output row pitch")?,
        };

        for (cell, out) in sample
            .grid
            .cells
            .iter()
            .zip(cells_out[cursor..cursor + counts.len()].iter_mut())
        {
            let (source, source_pitch) = match cell.source {
                Some(src) => {
                    let pitch = layout.input_shapes[src].row_pitch() as i64;
                    (to_u32(i, src as i64, "source index")?, to_i32(i, pitch, "source pitch")?)
                }
                None => (NO_SOURCE, NO_PITCH),
            };
            *out = GridCellDesc {
                source,
                source_pitch,
                start_y: to_i32(i, cell.cell_start.y, "cell start")?,
                start_x: to_i32(i, cell.cell_start.x * c, "cell start")?,
                end_y: to_i32(i, cell.cell_end.y, "cell end")?,
                end_x: to_i32(i, cell.cell_end.x * c, "cell end")?,
                anchor_y: to_i32(i, cell.source_anchor.y, "source anchor")?,
                anchor_x: to_i32(i, cell.source_anchor.x * c, "source anchor")?,
            };
        }
        cursor += counts.len();
    }
    Ok(())
}

fn to_i32(sample: usize, v: i64, what: &str) -> PasteResult<i32> {
    i32::try_from(v)
        .map_err(|_| PasteError::at_sample(sample, format!("{what} {v} exceeds the packed i32 range")))
}

fn to_u32(sample: usize, v: i64, what: &str) -> PasteResult<u32> {
    u32::try_from(v)
        .map_err(|_| PasteError::at_sample(sample, format!("{what} {v} exceeds the packed u32 range")))
}

#[cfg(test)]
#[path = "../../tests/unit/pack/descriptor.rs"]
mod tests;
