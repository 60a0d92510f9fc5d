use std::{fmt, marker::PhantomData, mem};

use crate::{
    batch::layout::BatchLayout,
    foundation::error::{PasteError, PasteResult},
    pack::descriptor::{GridCellDesc, SampleDesc},
    plan::blocks::{BlockShape, WorkBlock, count_blocks},
};

/// Typed buffer size primitive.
pub struct BufferSize<T> {
    len: usize,
    _phantom: PhantomData<T>,
}

impl<T> BufferSize<T> {
    /// Creates a new buffer size from number of elements.
    pub const fn new(len: usize) -> Self {
        Self {
            len,
            _phantom: PhantomData,
        }
    }

    /// Returns the number of elements.
    pub fn len(self) -> usize {
        self.len
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Returns the size in bytes.
    pub fn size_in_bytes(self) -> usize {
        mem::size_of::<T>() * self.len
    }
}

// Manual impls: derives would put bounds on `T`.
impl<T> Clone for BufferSize<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BufferSize<T> {}

impl<T> Default for BufferSize<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T> PartialEq for BufferSize<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
    }
}

impl<T> Eq for BufferSize<T> {}

impl<T> fmt::Debug for BufferSize<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferSize({} x {}B)", self.len, mem::size_of::<T>())
    }
}

/// Scratch requirements of one batch: one entry per packed array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScratchSizes {
    pub sample_descs: BufferSize<SampleDesc>,
    pub grid_cells: BufferSize<GridCellDesc>,
    pub work_blocks: BufferSize<WorkBlock>,
}

impl ScratchSizes {
    pub fn new(samples: usize, cells: usize, blocks: usize) -> Self {
        Self {
            sample_descs: BufferSize::new(samples),
            grid_cells: BufferSize::new(cells),
            work_blocks: BufferSize::new(blocks),
        }
    }

    /// Named byte requirements.
    pub fn entries(&self) -> [(&'static str, usize); 3] {
        [
            ("sample_descs", self.sample_descs.size_in_bytes()),
            ("grid_cells", self.grid_cells.size_in_bytes()),
            ("work_blocks", self.work_blocks.size_in_bytes()),
        ]
    }

    pub fn total_bytes(&self) -> usize {
        self.entries().iter().map(|(_, b)| b).sum()
    }

    /// `true` when every buffer of `self` is at least as large as in `required`.
    pub fn covers(&self, required: &ScratchSizes) -> bool {
        self.sample_descs.len() >= required.sample_descs.len()
            && self.grid_cells.len() >= required.grid_cells.len()
            && self.work_blocks.len() >= required.work_blocks.len()
    }
}

/// Scratch sizes for the block launch over `layout`. Pure sizing; touches no pixel data.
pub fn plan_scratch(layout: &BatchLayout, block: BlockShape) -> ScratchSizes {
    ScratchSizes::new(
        layout.samples.len(),
        layout.total_cells(),
        count_blocks(&layout.output_shapes(), block),
    )
}

/// Caller-owned storage for packed descriptors and work blocks.
///
/// Contents are rewritten by every run; only the backing storage is reused.
#[derive(Debug, Default)]
pub struct Scratch {
    pub(crate) sample_descs: Vec<SampleDesc>,
    pub(crate) grid_cells: Vec<GridCellDesc>,
    pub(crate) work_blocks: Vec<WorkBlock>,
}

impl Scratch {
    pub fn with_sizes(sizes: &ScratchSizes) -> Self {
        let mut s = Self::default();
        s.reserve(sizes);
        s
    }

    /// Grow (never shrink) every buffer to at least `sizes`.
    pub fn reserve(&mut self, sizes: &ScratchSizes) {
        grow(&mut self.sample_descs, sizes.sample_descs.len());
        grow(&mut self.grid_cells, sizes.grid_cells.len());
        grow(&mut self.work_blocks, sizes.work_blocks.len());
    }

    pub fn sizes(&self) -> ScratchSizes {
        ScratchSizes::new(
            self.sample_descs.len(),
            self.grid_cells.len(),
            self.work_blocks.len(),
        )
    }

    /// Fail with the first undersized buffer.
    pub fn check(&self, required: &ScratchSizes) -> PasteResult<()> {
        let have = self.sizes();
        let pairs = [
            ("sample_descs", have.sample_descs.len(), required.sample_descs.len()),
            ("grid_cells", have.grid_cells.len(), required.grid_cells.len()),
            ("work_blocks", have.work_blocks.len(), required.work_blocks.len()),
        ];
        for (name, have, need) in pairs {
            if have < need {
                return Err(PasteError::resource(format!(
                    "scratch buffer '{name}' holds {have} entries, setup requires {need}"
                )));
            }
        }
        Ok(())
    }

    pub fn sample_descs(&self) -> &[SampleDesc] {
        &self.sample_descs
    }

    pub fn grid_cells(&self) -> &[GridCellDesc] {
        &self.grid_cells
    }

    pub fn work_blocks(&self) -> &[WorkBlock] {
        &self.work_blocks
    }
}

fn grow<T: Default + Clone>(v: &mut Vec<T>, len: usize) {
    if v.len() < len {
        v.resize(len, T::default());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/scratch.rs"]
mod tests;
