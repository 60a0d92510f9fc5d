use std::ops::Range;

use rayon::prelude::*;
use smallvec::SmallVec;

use crate::{
    batch::{image::Image, layout::BatchLayout},
    exec::schedule::{Schedule, WorkItem},
    foundation::{
        core::IRect,
        element::Element,
        error::{PasteError, PasteResult},
    },
    grid::resolve::destinations_disjoint,
    kernel::composite::{paste_into, paste_segments},
};

/// A schedule item bound to the canvas memory it writes.
enum BoundTask<'a, O> {
    /// Row segments cut out of a canvas, one per destination row.
    Segments {
        sample: usize,
        iteration: usize,
        rows: Vec<&'a mut [O]>,
        cost: u64,
    },
    Canvas {
        sample: usize,
        iterations: Range<usize>,
        canvas: &'a mut Image<O>,
        cost: u64,
    },
}

impl<O: Element> BoundTask<'_, O> {
    fn cost(&self) -> u64 {
        match self {
            Self::Segments { cost, .. } | Self::Canvas { cost, .. } => *cost,
        }
    }

    fn execute<I: Element>(self, layout: &BatchLayout, sources: &[Image<I>]) {
        match self {
            Self::Segments {
                sample,
                iteration,
                mut rows,
                ..
            } => {
                let paste = &layout.samples[sample].pastes[iteration];
                paste_segments(&mut rows, &sources[paste.source], paste);
            }
            Self::Canvas {
                sample,
                iterations,
                canvas,
                ..
            } => {
                for paste in &layout.samples[sample].pastes[iterations] {
                    paste_into(canvas, &sources[paste.source], paste);
                }
            }
        }
    }
}

/// Run a two-phase schedule: zero every listed canvas, then apply the paste items.
///
/// With a pool, each phase fans out over it; otherwise items run in schedule order on the
/// calling thread.
pub(crate) fn run_schedule<O: Element, I: Element>(
    schedule: &Schedule,
    layout: &BatchLayout,
    sources: &[Image<I>],
    outputs: &mut [Image<O>],
    pool: Option<&rayon::ThreadPool>,
) -> PasteResult<()> {
    check_schedule(schedule, layout, outputs.len())?;

    let n = outputs.len();
    let mut zero = vec![false; n];
    for item in &schedule.zero {
        zero[item.sample()] = true;
    }
    let targets = outputs
        .iter_mut()
        .zip(&zero)
        .filter_map(|(canvas, &z)| z.then_some(canvas))
        .collect::<Vec<_>>();
    match pool {
        Some(pool) => pool.install(|| {
            targets
                .into_par_iter()
                .for_each(|canvas| canvas.data.fill(O::default()))
        }),
        None => targets
            .into_iter()
            .for_each(|canvas| canvas.data.fill(O::default())),
    }

    let mut tasks = bind_tasks(schedule, layout, outputs)?;
    tasks.sort_by_key(|t| std::cmp::Reverse(t.cost()));
    match pool {
        Some(pool) => pool.install(|| {
            tasks
                .into_par_iter()
                .for_each(|task| task.execute(layout, sources))
        }),
        None => tasks
            .into_iter()
            .for_each(|task| task.execute(layout, sources)),
    }
    Ok(())
}

/// Reject schedules that [`bind_tasks`] could not split, before any canvas is touched.
fn check_schedule(schedule: &Schedule, layout: &BatchLayout, samples: usize) -> PasteResult<()> {
    let mut dests: Vec<SmallVec<[IRect; 8]>> = vec![SmallVec::new(); samples];
    let mut ordered = vec![0usize; samples];
    for item in schedule.zero.iter().chain(&schedule.paste) {
        let sample = item.sample();
        let Some(sample_layout) = layout.samples.get(sample).filter(|_| sample < samples) else {
            return Err(PasteError::validation(format!(
                "work item for sample {sample} with {samples} outputs"
            )));
        };
        let pastes = sample_layout.pastes.len();
        let in_range = match item {
            WorkItem::Paste {
                iteration, dest, ..
            } => sample_layout
                .pastes
                .get(*iteration)
                .is_some_and(|p| p.dest_rect == *dest),
            WorkItem::Ordered { iterations, .. } => iterations.end <= pastes,
            WorkItem::Zero { .. } => true,
        };
        if !in_range {
            return Err(PasteError::at_sample(
                sample,
                format!("work item {item:?} does not match the {pastes} resolved pastes"),
            ));
        }
        match item {
            WorkItem::Paste { sample, dest, .. } => dests[*sample].push(*dest),
            WorkItem::Ordered { sample, .. } => ordered[*sample] += 1,
            WorkItem::Zero { .. } => {}
        }
    }
    for (sample, rects) in dests.iter().enumerate() {
        if ordered[sample] > 1 || (ordered[sample] == 1 && !rects.is_empty()) {
            return Err(PasteError::at_sample(
                sample,
                "ordered work mixed with other paste items",
            ));
        }
        if !destinations_disjoint(rects) {
            return Err(PasteError::at_sample(
                sample,
                "destinations scheduled in parallel overlap",
            ));
        }
    }
    Ok(())
}

fn bind_tasks<'a, O: Element>(
    schedule: &Schedule,
    layout: &BatchLayout,
    outputs: &'a mut [Image<O>],
) -> PasteResult<Vec<BoundTask<'a, O>>> {
    let mut per_sample: Vec<SmallVec<[&WorkItem; 4]>> = vec![SmallVec::new(); outputs.len()];
    for item in &schedule.paste {
        per_sample[item.sample()].push(item);
    }

    let mut tasks = Vec::with_capacity(schedule.paste.len());
    for (sample, canvas) in outputs.iter_mut().enumerate() {
        let items = &per_sample[sample];
        match items.as_slice() {
            [] => {}
            [WorkItem::Ordered { iterations, .. }] => tasks.push(BoundTask::Canvas {
                sample,
                iterations: iterations.clone(),
                canvas,
                cost: items[0].cost(layout),
            }),
            _ => {
                let mut pastes = SmallVec::<[(usize, IRect, u64); 8]>::new();
                for item in items {
                    let WorkItem::Paste {
                        iteration, dest, ..
                    } = item
                    else {
                        return Err(PasteError::validation(format!(
                            "sample {sample}: ordered work mixed with disjoint pastes"
                        )));
                    };
                    pastes.push((*iteration, *dest, item.cost(layout)));
                }
                let rects = pastes
                    .iter()
                    .map(|&(_, r, _)| r)
                    .collect::<SmallVec<[IRect; 8]>>();
                let segments = split_disjoint(sample, canvas, &rects)?;
                for ((iteration, _, cost), rows) in pastes.into_iter().zip(segments) {
                    tasks.push(BoundTask::Segments {
                        sample,
                        iteration,
                        rows,
                        cost,
                    });
                }
            }
        }
    }
    Ok(tasks)
}

/// Cut a canvas into the row segments covered by each of `rects`.
///
/// `out[k][i]` is row `rects[k].start.y + i`, columns `rects[k]` scaled by the channel count.
fn split_disjoint<'a, O>(
    sample: usize,
    canvas: &'a mut Image<O>,
    rects: &[IRect],
) -> PasteResult<Vec<Vec<&'a mut [O]>>> {
    let c = canvas.shape.channels;
    let pitch = canvas.shape.row_pitch();
    let mut out = rects
        .iter()
        .map(|r| Vec::with_capacity(r.height() as usize))
        .collect::<Vec<_>>();
    if pitch == 0 {
        return Ok(out);
    }

    let data: &'a mut [O] = &mut canvas.data;
    for (y, row) in data.chunks_mut(pitch).enumerate() {
        let y = y as i64;
        let mut spans = rects
            .iter()
            .enumerate()
            .filter(|(_, r)| r.start.y <= y && y < r.end.y)
            .map(|(k, r)| (r.start.x as usize * c, r.end.x as usize * c, k))
            .collect::<SmallVec<[(usize, usize, usize); 8]>>();
        spans.sort_unstable_by_key(|s| s.0);

        let mut rest = row;
        let mut offset = 0;
        for (x0, x1, k) in spans {
            if x0 < offset {
                return Err(PasteError::at_sample(
                    sample,
                    format!("destinations overlap in row {y}"),
                ));
            }
            let (_, tail) = std::mem::take(&mut rest).split_at_mut(x0 - offset);
            let (segment, tail) = tail.split_at_mut(x1 - x0);
            out[k].push(segment);
            rest = tail;
            offset = x1;
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/exec/cpu.rs"]
mod tests;
