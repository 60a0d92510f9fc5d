use std::{cmp::Reverse, ops::Range};

use crate::{batch::layout::BatchLayout, foundation::core::IRect};

/// One unit of host-scheduled work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkItem {
    /// Fill a whole canvas with the background value.
    Zero { sample: usize },
    /// A single iteration of a sample whose destinations are pairwise disjoint.
    Paste {
        sample: usize,
        iteration: usize,
        dest: IRect,
    },
    /// Every iteration of an overlapping sample, applied in list order by one worker.
    Ordered {
        sample: usize,
        iterations: Range<usize>,
    },
}

impl WorkItem {
    pub fn sample(&self) -> usize {
        match self {
            Self::Zero { sample } | Self::Paste { sample, .. } | Self::Ordered { sample, .. } => {
                *sample
            }
        }
    }

    /// Elements written by this item.
    pub fn cost(&self, layout: &BatchLayout) -> u64 {
        let c = layout.channels as u64;
        match self {
            Self::Zero { sample } => layout.samples[*sample].canvas.len() as u64,
            Self::Paste { dest, .. } => dest.area() as u64 * c,
            Self::Ordered { sample, iterations } => layout.samples[*sample].pastes
                [iterations.clone()]
            .iter()
            .map(|p| p.dest_rect.area() as u64 * c)
            .sum(),
        }
    }
}

/// Two-phase plan: every `zero` item completes before any `paste` item starts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schedule {
    pub zero: Vec<WorkItem>,
    /// Ordered by cost, largest first.
    pub paste: Vec<WorkItem>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.zero.is_empty() && self.paste.is_empty()
    }
}

/// Build the two-phase schedule for a resolved batch.
pub fn schedule_batch(layout: &BatchLayout) -> Schedule {
    let mut schedule = Schedule::default();
    for (sample, s) in layout.samples.iter().enumerate() {
        if s.canvas.is_empty() {
            continue;
        }
        schedule.zero.push(WorkItem::Zero { sample });
        if s.pastes.is_empty() {
            continue;
        }
        if s.disjoint {
            schedule.paste.extend(
                s.pastes
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| !p.dest_rect.is_empty())
                    .map(|(iteration, p)| WorkItem::Paste {
                        sample,
                        iteration,
                        dest: p.dest_rect,
                    }),
            );
        } else {
            schedule.paste.push(WorkItem::Ordered {
                sample,
                iterations: 0..s.pastes.len(),
            });
        }
    }
    schedule
        .paste
        .sort_by_cached_key(|item| Reverse(item.cost(layout)));
    schedule
}

#[cfg(test)]
#[path = "../../tests/unit/exec/schedule.rs"]
mod tests;
