use crate::{
    batch::image::ImageShape,
    foundation::error::{PasteError, PasteResult},
};

/// Work-block granularity. `cols` counts flattened (pixel, channel) elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlockShape {
    pub rows: usize,
    pub cols: usize,
}

impl Default for BlockShape {
    fn default() -> Self {
        Self { rows: 32, cols: 256 }
    }
}

impl BlockShape {
    pub fn validate(self) -> PasteResult<Self> {
        if self.rows == 0 || self.cols == 0 {
            return Err(PasteError::validation(format!(
                "block shape must be non-zero, got {}x{}",
                self.rows, self.cols
            )));
        }
        Ok(self)
    }

    fn grid_for(self, canvas: ImageShape) -> (usize, usize) {
        if canvas.is_empty() {
            return (0, 0);
        }
        (
            canvas.height.div_ceil(self.rows),
            canvas.row_pitch().div_ceil(self.cols),
        )
    }
}

/// Rectangular tile of one flattened canvas, assigned to one execution unit.
///
/// `end_*` are exclusive. Blocks of one sample never overlap.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkBlock {
    pub sample: u32,
    pub start_y: u32,
    pub start_x: u32,
    pub end_y: u32,
    pub end_x: u32,
}

/// Number of blocks [`setup_blocks`] emits for these canvases. Allocates nothing.
pub fn count_blocks(canvases: &[ImageShape], shape: BlockShape) -> usize {
    canvases
        .iter()
        .map(|&c| {
            let (by, bx) = shape.grid_for(c);
            by * bx
        })
        .sum()
}

/// Partition every canvas into blocks, ordered by sample, then block row, then block column.
///
/// Returns the number of blocks written to the front of `out`.
pub fn setup_blocks(
    canvases: &[ImageShape],
    shape: BlockShape,
    out: &mut [WorkBlock],
) -> PasteResult<usize> {
    let shape = shape.validate()?;
    let needed = count_blocks(canvases, shape);
    if out.len() < needed {
        return Err(PasteError::resource(format!(
            "work block array holds {} blocks, batch needs {needed}",
            out.len()
        )));
    }

    let mut slots = out.iter_mut();
    for (i, &canvas) in canvases.iter().enumerate() {
        let (by, bx) = shape.grid_for(canvas);
        let pitch = canvas.row_pitch();
        for r in 0..by {
            for c in 0..bx {
                let Some(slot) = slots.next() else {
                    return Err(PasteError::resource("work block array exhausted"));
                };
                *slot = WorkBlock {
                    sample: to_u32(i, i)?,
                    start_y: to_u32(i, r * shape.rows)?,
                    start_x: to_u32(i, c * shape.cols)?,
                    end_y: to_u32(i, ((r + 1) * shape.rows).min(canvas.height))?,
                    end_x: to_u32(i, ((c + 1) * shape.cols).min(pitch))?,
                };
            }
        }
    }
    Ok(needed)
}

fn to_u32(sample: usize, v: usize) -> PasteResult<u32> {
    u32::try_from(v).map_err(|_| {
        PasteError::at_sample(sample, format!("block coordinate {v} exceeds the u32 range"))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/plan/blocks.rs"]
mod tests;
