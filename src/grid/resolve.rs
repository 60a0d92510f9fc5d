use smallvec::SmallVec;

use crate::{
    batch::paste::ResolvedPaste,
    foundation::core::{Extent2, IRect, Point2},
    grid::cell::{GridCell, GridCounts, SampleGrid},
};

/// Build the monotonic grid for one canvas from its ordered paste list.
///
/// Breakpoints are placed at every destination edge, so each grid cell is either fully inside or
/// fully outside every destination rectangle. A cell is attributed to the last paste covering it,
/// which bakes the painter's-algorithm order into the grid.
pub fn resolve_grid(canvas: Extent2, pastes: &[ResolvedPaste]) -> SampleGrid {
    if canvas.is_empty() {
        return SampleGrid::background(canvas);
    }

    let visible = pastes
        .iter()
        .filter(|p| !p.dest_rect.is_empty())
        .collect::<SmallVec<[&ResolvedPaste; 8]>>();
    let ys = breakpoints(canvas.height, visible.iter().map(|p| (p.dest_rect.start.y, p.dest_rect.end.y)));
    let xs = breakpoints(canvas.width, visible.iter().map(|p| (p.dest_rect.start.x, p.dest_rect.end.x)));

    let counts = GridCounts {
        rows: ys.len() - 1,
        cols: xs.len() - 1,
    };
    let mut cells = Vec::with_capacity(counts.len());
    for yw in ys.windows(2) {
        for xw in xs.windows(2) {
            let start = Point2::new(xw[0], yw[0]);
            let end = Point2::new(xw[1], yw[1]);
            let top = visible.iter().rev().find(|p| p.dest_rect.contains(start));
            cells.push(match top {
                Some(p) => GridCell::from_source(
                    p.source,
                    start,
                    end,
                    p.source_rect.start + (start - p.dest_rect.start),
                ),
                None => GridCell::background(start, end),
            });
        }
    }
    SampleGrid { counts, cells }
}

fn breakpoints(extent: i64, edges: impl Iterator<Item = (i64, i64)>) -> Vec<i64> {
    let mut out = vec![0, extent];
    for (a, b) in edges {
        out.push(a);
        out.push(b);
    }
    out.sort_unstable();
    out.dedup();
    out
}

/// `true` when no two non-empty destination rectangles overlap.
///
/// Such a sample can be pasted iteration-by-iteration in any order, concurrently.
pub fn destinations_disjoint(rects: &[IRect]) -> bool {
    rects
        .iter()
        .enumerate()
        .all(|(i, a)| rects[i + 1..].iter().all(|b| !a.intersects(*b)))
}

#[cfg(test)]
#[path = "../../tests/unit/grid/resolve.rs"]
mod tests;
