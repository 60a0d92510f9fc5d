use crate::{
    batch::{
        image::{ImageBatch, ImageShape},
        layout::BatchLayout,
        paste::PasteArgs,
    },
    exec::{
        cpu::run_schedule,
        dispatch::{dispatch_pair, select_kernel},
        launch::launch_blocks,
        schedule::{WorkItem, schedule_batch},
    },
    foundation::{
        element::ElementType,
        error::{PasteError, PasteResult},
    },
    pack::descriptor::pack_descriptors,
    plan::{
        blocks::{BlockShape, setup_blocks},
        scratch::{Scratch, ScratchSizes, plan_scratch},
    },
};

/// Execution strategy for [`MultiPaste::run`]. Both backends produce identical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasteBackend {
    /// Zero canvases, then run per-iteration (or per-sample ordered) work items.
    Scheduled,
    /// Pack grid descriptors into scratch and composite fixed-size blocks in parallel.
    #[default]
    Launch,
}

/// Threading controls for [`MultiPaste`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PasteThreading {
    /// Fan work out over a dedicated rayon pool when `true`.
    pub parallel: bool,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

impl Default for PasteThreading {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

impl PasteThreading {
    pub fn validate(&self) -> PasteResult<()> {
        if self.threads == Some(0) {
            return Err(PasteError::validation(
                "paste threading 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }
}

/// Engine options.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PasteOpts {
    pub backend: PasteBackend,
    pub threading: PasteThreading,
    /// Block granularity for [`PasteBackend::Launch`].
    pub block: BlockShape,
    /// Re-validate grids produced by the built-in grid builder during setup.
    pub validate_grids: bool,
}

/// What a caller must provide before [`MultiPaste::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasteRequirements {
    pub output_shapes: Vec<ImageShape>,
    pub output_type: ElementType,
    pub scratch: ScratchSizes,
}

/// Result of [`MultiPaste::setup`]: resolved geometry plus allocation requirements.
///
/// Ties one batch to the backend and block shape it was planned for. Read-only once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PasteSetup {
    layout: BatchLayout,
    input_type: ElementType,
    requirements: PasteRequirements,
    backend: PasteBackend,
    block: BlockShape,
}

impl PasteSetup {
    pub fn layout(&self) -> &BatchLayout {
        &self.layout
    }

    pub fn input_type(&self) -> ElementType {
        self.input_type
    }

    pub fn requirements(&self) -> &PasteRequirements {
        &self.requirements
    }

    pub fn backend(&self) -> PasteBackend {
        self.backend
    }

    pub fn block(&self) -> BlockShape {
        self.block
    }
}

/// Batched multi-paste compositor.
///
/// Usage is two-phase: [`setup`](Self::setup) resolves geometry and reports output shapes and
/// scratch sizes without touching pixels, then [`run`](Self::run) composites into caller-owned
/// outputs using caller-owned scratch.
#[derive(Debug)]
pub struct MultiPaste {
    opts: PasteOpts,
    pool: Option<rayon::ThreadPool>,
    scratch: Scratch,
}

impl MultiPaste {
    pub fn new(opts: PasteOpts) -> PasteResult<Self> {
        opts.block.validate()?;
        opts.threading.validate()?;
        let pool = if opts.threading.parallel {
            Some(build_thread_pool(opts.threading.threads)?)
        } else {
            None
        };
        Ok(Self {
            opts,
            pool,
            scratch: Scratch::default(),
        })
    }

    pub fn opts(&self) -> &PasteOpts {
        &self.opts
    }

    /// Resolve `args` against the input batch and plan the run.
    #[tracing::instrument(
        skip_all,
        fields(samples = args.samples.len(), inputs = input_shapes.len(), backend = ?self.opts.backend)
    )]
    pub fn setup(
        &self,
        input_type: ElementType,
        input_shapes: &[ImageShape],
        args: &PasteArgs,
    ) -> PasteResult<PasteSetup> {
        let output_type = args.dtype.unwrap_or(input_type);
        select_kernel(input_type, output_type)?;
        let layout = BatchLayout::resolve(input_shapes, args)?;
        if self.opts.validate_grids {
            layout.validate_grids()?;
        }
        Ok(self.plan(input_type, output_type, layout))
    }

    /// Plan a run over a layout assembled from externally built grids
    /// (see [`BatchLayout::from_parts`]). The layout is fully re-validated.
    pub fn setup_with_layout(
        &self,
        input_type: ElementType,
        output_type: Option<ElementType>,
        layout: BatchLayout,
    ) -> PasteResult<PasteSetup> {
        let output_type = output_type.unwrap_or(input_type);
        select_kernel(input_type, output_type)?;
        layout.validate()?;
        Ok(self.plan(input_type, output_type, layout))
    }

    fn plan(
        &self,
        input_type: ElementType,
        output_type: ElementType,
        layout: BatchLayout,
    ) -> PasteSetup {
        let scratch = match self.opts.backend {
            PasteBackend::Scheduled => ScratchSizes::default(),
            PasteBackend::Launch => plan_scratch(&layout, self.opts.block),
        };
        tracing::debug!(
            sample_descs = scratch.sample_descs.len(),
            grid_cells = scratch.grid_cells.len(),
            work_blocks = scratch.work_blocks.len(),
            bytes = scratch.total_bytes(),
            "planned scratch"
        );
        PasteSetup {
            requirements: PasteRequirements {
                output_shapes: layout.output_shapes(),
                output_type,
                scratch,
            },
            layout,
            input_type,
            backend: self.opts.backend,
            block: self.opts.block,
        }
    }

    /// Composite `inputs` into `outputs` as planned by `setup`.
    ///
    /// Every check (types, shapes, scratch capacity) runs before the first output write; on error
    /// `outputs` is untouched.
    #[tracing::instrument(skip_all, fields(samples = setup.layout.samples.len(), backend = ?setup.backend))]
    pub fn run(
        &self,
        setup: &PasteSetup,
        scratch: &mut Scratch,
        inputs: &ImageBatch,
        outputs: &mut ImageBatch,
    ) -> PasteResult<()> {
        check_batch("input", inputs, setup.input_type, &setup.layout.input_shapes)?;
        let req = &setup.requirements;
        check_batch("output", outputs, req.output_type, &req.output_shapes)?;
        scratch.check(&req.scratch)?;

        let pool = self.pool.as_ref();
        match setup.backend {
            PasteBackend::Scheduled => {
                let schedule = schedule_batch(&setup.layout);
                tracing::debug!(
                    zero = schedule.zero.len(),
                    paste = schedule.paste.len(),
                    ordered = schedule
                        .paste
                        .iter()
                        .filter(|i| matches!(i, WorkItem::Ordered { .. }))
                        .count(),
                    "scheduled work items"
                );
                dispatch_pair!(inputs, outputs, |i, o| run_schedule(
                    &schedule,
                    &setup.layout,
                    i,
                    o,
                    pool
                ))
            }
            PasteBackend::Launch => {
                let Scratch {
                    sample_descs,
                    grid_cells,
                    work_blocks,
                } = scratch;
                pack_descriptors(&setup.layout, sample_descs, grid_cells)?;
                let blocks = setup_blocks(&req.output_shapes, setup.block, work_blocks)?;
                tracing::debug!(blocks, "launching blocks");
                let blocks = &work_blocks[..blocks];
                dispatch_pair!(inputs, outputs, |i, o| launch_blocks(
                    sample_descs,
                    grid_cells,
                    blocks,
                    setup.block.rows,
                    i,
                    o,
                    pool
                ))
            }
        }
    }

    /// Setup, allocate and run in one call, reusing engine-owned scratch across calls.
    pub fn paste(&mut self, inputs: &ImageBatch, args: &PasteArgs) -> PasteResult<ImageBatch> {
        let setup = self.setup(inputs.element_type(), &inputs.shapes(), args)?;
        let req = &setup.requirements;
        let mut outputs = ImageBatch::zeros(req.output_type, &req.output_shapes)?;
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.reserve(&req.scratch);
        let res = self.run(&setup, &mut scratch, inputs, &mut outputs);
        self.scratch = scratch;
        res.map(|()| outputs)
    }
}

fn check_batch(
    what: &str,
    batch: &ImageBatch,
    ty: ElementType,
    shapes: &[ImageShape],
) -> PasteResult<()> {
    if batch.element_type() != ty {
        return Err(PasteError::validation(format!(
            "{what} batch has type '{}', setup expects '{ty}'",
            batch.element_type()
        )));
    }
    let have = batch.shapes();
    if have.len() != shapes.len() {
        return Err(PasteError::validation(format!(
            "{what} batch has {} samples, setup expects {}",
            have.len(),
            shapes.len()
        )));
    }
    batch.check_data()?;
    if let Some((i, (h, w))) = have
        .iter()
        .zip(shapes)
        .enumerate()
        .find(|(_, (h, w))| h != w)
    {
        return Err(PasteError::at_sample(
            i,
            format!(
                "{what} shape {}x{}x{} differs from setup {}x{}x{}",
                h.height, h.width, h.channels, w.height, w.width, w.channels
            ),
        ));
    }
    Ok(())
}

fn build_thread_pool(threads: Option<usize>) -> PasteResult<rayon::ThreadPool> {
    threads
        .into_iter()
        .fold(
            rayon::ThreadPoolBuilder::new().thread_name(|i| format!("multipaste-{i}")),
            |builder, n| builder.num_threads(n),
        )
        .build()
        .map_err(|e| PasteError::resource(format!("failed to build paste worker pool: {e}")))
}

#[cfg(test)]
#[path = "../tests/unit/engine.rs"]
mod tests;
