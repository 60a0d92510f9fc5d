use crate::{
    batch::{
        image::{ImageShape, uniform_channels},
        paste::{PasteArgs, ResolvedPaste, resolve_iterations},
    },
    foundation::{
        core::IRect,
        error::{PasteError, PasteResult},
    },
    grid::{
        cell::SampleGrid,
        resolve::{destinations_disjoint, resolve_grid},
    },
};

/// Resolved geometry for one output sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleLayout {
    /// Output canvas shape (channels equal to the input batch).
    pub canvas: ImageShape,
    pub pastes: Vec<ResolvedPaste>,
    pub grid: SampleGrid,
    /// Destination rectangles are pairwise disjoint.
    pub disjoint: bool,
}

/// Resolved geometry for a whole batch, produced before any pixel is touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchLayout {
    pub input_shapes: Vec<ImageShape>,
    pub channels: usize,
    pub samples: Vec<SampleLayout>,
}

impl BatchLayout {
    /// Resolve paste arguments against the input shapes and build each sample's grid.
    pub fn resolve(input_shapes: &[ImageShape], args: &PasteArgs) -> PasteResult<Self> {
        let channels = batch_channels(input_shapes)?;
        let mut samples = Vec::with_capacity(args.samples.len());
        for (i, sample) in args.samples.iter().enumerate() {
            let pastes = resolve_iterations(i, sample, input_shapes)?;
            let grid = resolve_grid(sample.output_size, &pastes);
            let rects = pastes.iter().map(|p| p.dest_rect).collect::<Vec<_>>();
            samples.push(SampleLayout {
                canvas: ImageShape::new(
                    sample.output_size.height as usize,
                    sample.output_size.width as usize,
                    channels,
                ),
                disjoint: destinations_disjoint(&rects),
                pastes,
                grid,
            });
        }
        Ok(Self {
            input_shapes: input_shapes.to_vec(),
            channels,
            samples,
        })
    }

    /// Assemble a layout from grids produced by an external grid builder.
    ///
    /// `grids[i]` and `disjoint[i]` describe sample `i`. Pastes are bounds-checked, grids
    /// validated and a disjoint flag is rejected when destinations overlap; grids are never
    /// rebuilt. A `false` flag on disjoint destinations is accepted.
    pub fn from_parts(
        input_shapes: &[ImageShape],
        args: &PasteArgs,
        grids: Vec<SampleGrid>,
        disjoint: Vec<bool>,
    ) -> PasteResult<Self> {
        let n = args.samples.len();
        if grids.len() != n || disjoint.len() != n {
            return Err(PasteError::validation(format!(
                "expected {n} grids and flags, got {} grids and {} flags",
                grids.len(),
                disjoint.len()
            )));
        }
        let channels = batch_channels(input_shapes)?;
        let mut samples = Vec::with_capacity(n);
        for (i, ((sample, grid), disjoint)) in args
            .samples
            .iter()
            .zip(grids)
            .zip(disjoint)
            .enumerate()
        {
            let pastes = resolve_iterations(i, sample, input_shapes)?;
            grid.validate(i, sample.output_size, input_shapes)?;
            check_disjoint_claim(i, &pastes, disjoint)?;
            samples.push(SampleLayout {
                canvas: ImageShape::new(
                    sample.output_size.height as usize,
                    sample.output_size.width as usize,
                    channels,
                ),
                pastes,
                grid,
                disjoint,
            });
        }
        Ok(Self {
            input_shapes: input_shapes.to_vec(),
            channels,
            samples,
        })
    }

    pub fn output_shapes(&self) -> Vec<ImageShape> {
        self.samples.iter().map(|s| s.canvas).collect()
    }

    pub fn total_cells(&self) -> usize {
        self.samples.iter().map(|s| s.grid.cells.len()).sum()
    }

    /// Re-check every grid against its canvas and the input shapes.
    pub fn validate_grids(&self) -> PasteResult<()> {
        for (i, s) in self.samples.iter().enumerate() {
            s.grid.validate(i, s.canvas.extent(), &self.input_shapes)?;
        }
        Ok(())
    }

    /// Check a layout assembled or edited outside [`resolve`](Self::resolve): channel counts,
    /// every resolved paste, every grid and every disjoint flag.
    pub fn validate(&self) -> PasteResult<()> {
        let channels = batch_channels(&self.input_shapes)?;
        if channels != self.channels {
            return Err(PasteError::validation(format!(
                "layout has {} channels, input batch has {channels}",
                self.channels
            )));
        }
        for (i, s) in self.samples.iter().enumerate() {
            if s.canvas.channels != channels {
                return Err(PasteError::at_sample(
                    i,
                    format!("canvas has {} channels, expected {channels}", s.canvas.channels),
                ));
            }
            let canvas = IRect::from_extent(s.canvas.extent());
            for (k, p) in s.pastes.iter().enumerate() {
                let fail = |msg: String| PasteError::at_sample(i, format!("paste {k}: {msg}"));
                let Some(src) = self.input_shapes.get(p.source) else {
                    return Err(fail(format!("missing source {}", p.source)));
                };
                if !IRect::from_extent(src.extent()).contains_rect(p.source_rect) {
                    return Err(fail(format!("{:?} outside source {}", p.source_rect, p.source)));
                }
                if !canvas.contains_rect(p.dest_rect) {
                    return Err(fail(format!("{:?} outside canvas", p.dest_rect)));
                }
                if p.source_rect.extent() != p.dest_rect.extent() {
                    return Err(fail(format!(
                        "source {:?} and destination {:?} differ in size",
                        p.source_rect, p.dest_rect
                    )));
                }
            }
            s.grid.validate(i, s.canvas.extent(), &self.input_shapes)?;
            check_disjoint_claim(i, &s.pastes, s.disjoint)?;
        }
        Ok(())
    }
}

fn check_disjoint_claim(sample: usize, pastes: &[ResolvedPaste], disjoint: bool) -> PasteResult<()> {
    let rects = pastes.iter().map(|p| p.dest_rect).collect::<Vec<_>>();
    if disjoint && !destinations_disjoint(&rects) {
        return Err(PasteError::at_sample(
            sample,
            "flagged disjoint but destination rectangles overlap",
        ));
    }
    Ok(())
}

fn batch_channels(input_shapes: &[ImageShape]) -> PasteResult<usize> {
    uniform_channels(input_shapes)?
        .ok_or_else(|| PasteError::validation("input batch must contain at least one image"))
}

#[cfg(test)]
#[path = "../../tests/unit/batch/layout.rs"]
mod tests;
