use rayon::prelude::*;

use crate::{
    batch::image::Image,
    foundation::{
        element::Element,
        error::{PasteError, PasteResult},
    },
    kernel::composite::composite_block,
    pack::descriptor::{GridCellDesc, SampleDesc},
    plan::blocks::WorkBlock,
};

/// One horizontal band of one canvas together with the blocks that tile it.
struct Band<'a, O> {
    sample: usize,
    y0: usize,
    blocks: &'a [WorkBlock],
    rows: &'a mut [O],
}

/// Composite every work block into the output canvases.
///
/// `blocks` must be laid out by [`setup_blocks`](crate::plan::blocks::setup_blocks) with
/// `block_rows` rows per band; `samples` and `cells` are the packed descriptors of the same batch.
pub(crate) fn launch_blocks<O: Element, I: Element>(
    samples: &[SampleDesc],
    cells: &[GridCellDesc],
    blocks: &[WorkBlock],
    block_rows: usize,
    sources: &[Image<I>],
    outputs: &mut [Image<O>],
    pool: Option<&rayon::ThreadPool>,
) -> PasteResult<()> {
    let bands = bind_bands(blocks, block_rows, outputs)?;
    let run = |band: Band<'_, O>| {
        let Band {
            sample,
            y0,
            blocks,
            rows,
        } = band;
        let desc = &samples[sample];
        let sample_cells = &cells[desc.grid_cells()];
        for block in blocks {
            composite_block(block, desc, sample_cells, sources, &mut *rows, y0);
        }
    };
    match pool {
        Some(pool) => pool.install(|| bands.into_par_iter().for_each(run)),
        None => bands.into_iter().for_each(run),
    }
    Ok(())
}

fn bind_bands<'a, O>(
    blocks: &'a [WorkBlock],
    block_rows: usize,
    outputs: &'a mut [Image<O>],
) -> PasteResult<Vec<Band<'a, O>>> {
    let mut groups = blocks.chunk_by(|a, b| a.sample == b.sample && a.start_y == b.start_y);
    let mut bands = Vec::new();
    for (sample, canvas) in outputs.iter_mut().enumerate() {
        let pitch = canvas.shape.row_pitch();
        if canvas.data.is_empty() {
            continue;
        }
        for (i, rows) in canvas.data.chunks_mut(block_rows * pitch).enumerate() {
            let y0 = i * block_rows;
            let group = groups
                .next()
                .filter(|g| g[0].sample as usize == sample && g[0].start_y as usize == y0)
                .ok_or_else(|| {
                    PasteError::resource(format!(
                        "work blocks do not cover sample {sample} rows from {y0}"
                    ))
                })?;
            bands.push(Band {
                sample,
                y0,
                blocks: group,
                rows,
            });
        }
    }
    if groups.next().is_some() {
        return Err(PasteError::resource(
            "work blocks reference rows outside the output canvases",
        ));
    }
    Ok(bands)
}

#[cfg(test)]
#[path = "../../tests/unit/exec/launch.rs"]
mod tests;
