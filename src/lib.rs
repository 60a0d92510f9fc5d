//! Multipaste is a batched image compositor.
//!
//! For every sample of a batch it takes an ordered list of rectangular pastes (a region of one
//! input image copied to a position on a fresh output canvas) and produces the canvas a
//! painter's algorithm would: later pastes win, uncovered pixels are zero, and values are
//! converted to the output element type with rounding and saturation.
//!
//! # Pipeline overview
//!
//! 1. **Resolve**: `PasteArgs + input shapes -> BatchLayout` (bounds-checked rectangles and, per
//!    sample, a monotonic grid whose cells each map to one source or to background)
//! 2. **Setup**: [`MultiPaste::setup`] reports output shapes, output type and scratch sizes
//!    without touching pixels
//! 3. **Run**: [`MultiPaste::run`] composites into caller-owned outputs, either through
//!    host-scheduled work items ([`PasteBackend::Scheduled`]) or a block launch over packed
//!    grid descriptors ([`PasteBackend::Launch`])
//!
//! Design constraints:
//!
//! - **No unsafe**: parallel writes go through disjoint `&mut` splits of the output canvases.
//! - **Validate first**: every error is reported before the first output write.
//! - **Closed types**: inputs and outputs are one of `uint8`, `int16`, `int32`, `float32`.
#![forbid(unsafe_code)]

mod batch;
mod engine;
mod exec;
mod foundation;
mod grid;
mod kernel;
mod pack;
mod plan;

pub use batch::image::{Image, ImageBatch, ImageShape, uniform_channels};
pub use batch::layout::{BatchLayout, SampleLayout};
pub use batch::paste::{
    PasteArgs, PasteIteration, ResolvedPaste, SamplePastes, resolve_iterations,
};
pub use engine::{
    MultiPaste, PasteBackend, PasteOpts, PasteRequirements, PasteSetup, PasteThreading,
};
pub use exec::dispatch::{select_kernel, supported_pairs};
pub use exec::schedule::{Schedule, WorkItem, schedule_batch};
pub use foundation::core::{Extent2, IRect, Point2};
pub use foundation::element::{Element, ElementType, convert_sat};
pub use foundation::error::{PasteError, PasteResult};
pub use grid::cell::{GridCell, GridCounts, SampleGrid};
pub use grid::resolve::{destinations_disjoint, resolve_grid};
pub use pack::descriptor::{GridCellDesc, NO_PITCH, NO_SOURCE, SampleDesc, pack_descriptors};
pub use plan::blocks::{BlockShape, WorkBlock, count_blocks, setup_blocks};
pub use plan::scratch::{BufferSize, Scratch, ScratchSizes, plan_scratch};
