use std::path::Path;

use crate::{
    batch::image::ImageShape,
    foundation::{
        core::{Extent2, IRect, Point2},
        element::ElementType,
        error::{PasteError, PasteResult},
    },
};

/// One ordered rectangle copy from a source image into a sample's canvas.
///
/// Later iterations of the same sample occlude earlier ones where destinations overlap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PasteIteration {
    /// Index of the source image in the input batch.
    pub source_sample_index: usize,
    /// Top-left corner of the copied region in the source. Defaults to `(0, 0)`.
    #[serde(default)]
    pub source_anchor: Point2,
    /// Size of the copied region. Defaults to the rest of the source image from the anchor.
    #[serde(default)]
    pub source_shape: Option<Extent2>,
    /// Top-left corner of the paste in the canvas. Defaults to `(0, 0)`.
    #[serde(default)]
    pub dest_anchor: Point2,
}

impl PasteIteration {
    pub fn new(source_sample_index: usize) -> Self {
        Self {
            source_sample_index,
            source_anchor: Point2::ZERO,
            source_shape: None,
            dest_anchor: Point2::ZERO,
        }
    }

    pub fn with_source_anchor(mut self, anchor: Point2) -> Self {
        self.source_anchor = anchor;
        self
    }

    pub fn with_source_shape(mut self, shape: Extent2) -> Self {
        self.source_shape = Some(shape);
        self
    }

    pub fn with_dest_anchor(mut self, anchor: Point2) -> Self {
        self.dest_anchor = anchor;
        self
    }
}

/// Paste list and canvas size for one output sample.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SamplePastes {
    pub output_size: Extent2,
    #[serde(default)]
    pub iterations: Vec<PasteIteration>,
}

impl SamplePastes {
    pub fn new(output_size: Extent2) -> Self {
        Self {
            output_size,
            iterations: Vec::new(),
        }
    }

    pub fn paste(mut self, iteration: PasteIteration) -> Self {
        self.iterations.push(iteration);
        self
    }
}

/// Batch-level paste arguments: one entry per output sample plus the requested output type.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PasteArgs {
    pub samples: Vec<SamplePastes>,
    /// Output element type. `None` keeps the input type.
    #[serde(default)]
    pub dtype: Option<ElementType>,
}

impl PasteArgs {
    pub fn new(samples: Vec<SamplePastes>) -> Self {
        Self {
            samples,
            dtype: None,
        }
    }

    pub fn with_dtype(mut self, dtype: ElementType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn from_json_str(s: &str) -> PasteResult<Self> {
        serde_json::from_str(s).map_err(|e| PasteError::serde(format!("paste args: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> PasteResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PasteError::Other(anyhow::Error::new(e).context(format!("read '{}'", path.display())))
        })?;
        Self::from_json_str(&text)
    }
}

/// A paste iteration with defaults applied and bounds checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedPaste {
    pub source: usize,
    pub source_rect: IRect,
    pub dest_rect: IRect,
}

/// Apply argument defaults and validate every iteration of one sample against the input shapes.
pub fn resolve_iterations(
    sample_idx: usize,
    sample: &SamplePastes,
    input_shapes: &[ImageShape],
) -> PasteResult<Vec<ResolvedPaste>> {
    if !sample.output_size.is_non_negative() {
        return Err(PasteError::at_sample(
            sample_idx,
            format!("negative output size {:?}", sample.output_size),
        ));
    }
    let canvas = IRect::from_extent(sample.output_size);

    let mut out = Vec::with_capacity(sample.iterations.len());
    for (iter, it) in sample.iterations.iter().enumerate() {
        let fail = |msg: String| PasteError::at_sample(sample_idx, format!("iteration {iter}: {msg}"));

        let Some(src_shape) = input_shapes.get(it.source_sample_index) else {
            return Err(fail(format!(
                "source index {} out of range for batch of {}",
                it.source_sample_index,
                input_shapes.len()
            )));
        };
        if !it.source_anchor.is_non_negative() {
            return Err(fail(format!("negative source anchor {:?}", it.source_anchor)));
        }

        let src_extent = src_shape.extent();
        let shape = it.source_shape.unwrap_or(Extent2::new(
            src_extent.width - it.source_anchor.x,
            src_extent.height - it.source_anchor.y,
        ));
        if !shape.is_non_negative() {
            return Err(fail(format!("negative paste shape {shape:?}")));
        }

        let Some(source_rect) = IRect::checked_from_anchor(it.source_anchor, shape) else {
            return Err(fail(format!(
                "source region at {:?} with shape {shape:?} overflows",
                it.source_anchor
            )));
        };
        if !IRect::from_extent(src_extent).contains_rect(source_rect) {
            return Err(fail(format!(
                "source region {source_rect:?} outside source image {} ({}x{})",
                it.source_sample_index, src_extent.width, src_extent.height
            )));
        }

        let Some(dest_rect) = IRect::checked_from_anchor(it.dest_anchor, shape) else {
            return Err(fail(format!(
                "destination at {:?} with shape {shape:?} overflows",
                it.dest_anchor
            )));
        };
        if !canvas.contains_rect(dest_rect) {
            return Err(fail(format!(
                "destination {dest_rect:?} outside canvas {}x{}",
                canvas.width(),
                canvas.height()
            )));
        }

        out.push(ResolvedPaste {
            source: it.source_sample_index,
            source_rect,
            dest_rect,
        });
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/batch/paste.rs"]
mod tests;
