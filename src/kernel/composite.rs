use crate::{
    batch::{image::Image, paste::ResolvedPaste},
    foundation::element::{Element, convert_sat},
    pack::descriptor::{GridCellDesc, SampleDesc},
    plan::blocks::WorkBlock,
};

/// Composite one work block of one sample.
///
/// `cells` is the sample's slice of the packed cell array and `band` holds the canvas rows
/// starting at `band_y0` (the block must lie inside it). The block is scanned row-major with a
/// `(row, col)` cursor into the grid that only ever moves forward, so locating the owning cell
/// costs O(rows + cols + cells) for the whole block instead of a search per element.
pub(crate) fn composite_block<O: Element, I: Element>(
    block: &WorkBlock,
    sample: &SampleDesc,
    cells: &[GridCellDesc],
    sources: &[Image<I>],
    band: &mut [O],
    band_y0: usize,
) {
    let cols = sample.cell_cols as usize;
    let pitch = sample.out_pitch as usize;
    let (x0, x1) = (block.start_x as i32, block.end_x as i32);

    // Column boundaries are shared by every grid row.
    let mut min_col = 0;
    while cells[min_col].end_x <= x0 {
        min_col += 1;
    }

    let mut row = 0;
    for y in block.start_y as i32..block.end_y as i32 {
        while cells[row * cols].end_y <= y {
            row += 1;
        }
        let row_cells = &cells[row * cols..(row + 1) * cols];
        let out_start = (y as usize - band_y0) * pitch;
        let out_row = &mut band[out_start..out_start + pitch];

        let mut col = min_col;
        let mut x = x0;
        while x < x1 {
            while row_cells[col].end_x <= x {
                col += 1;
            }
            let cell = &row_cells[col];
            let run_end = cell.end_x.min(x1);
            let dst = &mut out_row[x as usize..run_end as usize];
            match cell.source() {
                None => dst.fill(O::default()),
                Some(src) => {
                    let sy = (y - cell.start_y + cell.anchor_y) as usize;
                    let sx = (x - cell.start_x + cell.anchor_x) as usize;
                    let offset = sy * cell.source_pitch as usize + sx;
                    convert_row(dst, &sources[src].data[offset..offset + dst.len()]);
                }
            }
            x = run_end;
        }
    }
}

/// Copy `paste` into rows that were already cut to its destination columns.
///
/// `rows[i]` is destination row `paste.dest_rect.start.y + i`.
pub(crate) fn paste_segments<O: Element, I: Element>(
    rows: &mut [&mut [O]],
    source: &Image<I>,
    paste: &ResolvedPaste,
) {
    let c = source.shape.channels;
    let sx0 = paste.source_rect.start.x as usize * c;
    let sx1 = paste.source_rect.end.x as usize * c;
    let sy0 = paste.source_rect.start.y as usize;
    for (i, dst) in rows.iter_mut().enumerate() {
        convert_row(dst, &source.row(sy0 + i)[sx0..sx1]);
    }
}

/// Copy `paste` straight into a whole canvas.
pub(crate) fn paste_into<O: Element, I: Element>(
    canvas: &mut Image<O>,
    source: &Image<I>,
    paste: &ResolvedPaste,
) {
    if paste.dest_rect.is_empty() {
        return;
    }
    let c = canvas.shape.channels;
    let pitch = canvas.row_pitch();
    let dx0 = paste.dest_rect.start.x as usize * c;
    let dx1 = paste.dest_rect.end.x as usize * c;
    let sx0 = paste.source_rect.start.x as usize * c;
    let sy0 = paste.source_rect.start.y as usize;
    for (i, y) in (paste.dest_rect.start.y as usize..paste.dest_rect.end.y as usize).enumerate() {
        let dst = &mut canvas.data[y * pitch + dx0..y * pitch + dx1];
        let src = &source.row(sy0 + i)[sx0..sx0 + (dx1 - dx0)];
        convert_row(dst, src);
    }
}

#[inline]
pub(crate) fn convert_row<O: Element, I: Element>(dst: &mut [O], src: &[I]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = convert_sat(*s);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/composite.rs"]
mod tests;
