use super::*;
use crate::{
    batch::{
        image::Image,
        paste::{PasteIteration, SamplePastes},
    },
    foundation::core::{Extent2, IRect, Point2},
    grid::cell::{GridCell, GridCounts, SampleGrid},
};

fn sequential(backend: PasteBackend) -> MultiPaste {
    MultiPaste::new(PasteOpts {
        backend,
        threading: PasteThreading {
            parallel: false,
            threads: None,
        },
        ..PasteOpts::default()
    })
    .unwrap()
}

fn inputs() -> ImageBatch {
    let shape = ImageShape::new(4, 4, 1);
    ImageBatch::I32(vec![
        Image::new(shape, (0..16).collect()).unwrap(),
        Image::new(shape, (0..16).map(|v| v * 100).collect()).unwrap(),
    ])
}

fn args() -> PasteArgs {
    PasteArgs::new(vec![
        SamplePastes::new(Extent2::new(6, 5))
            .paste(PasteIteration::new(0))
            .paste(
                PasteIteration::new(1)
                    .with_source_anchor(Point2::new(1, 1))
                    .with_dest_anchor(Point2::new(3, 2)),
            ),
    ])
    .with_dtype(ElementType::U8)
}

#[test]
fn opts_deserialize_with_defaults() {
    let opts: PasteOpts = serde_json::from_str(r#"{"backend":"scheduled"}"#).unwrap();
    assert_eq!(opts.backend, PasteBackend::Scheduled);
    assert_eq!(opts.threading, PasteThreading::default());
    assert_eq!(opts.block, BlockShape::default());
    assert!(!opts.validate_grids);

    let opts: PasteOpts =
        serde_json::from_str(r#"{"threading":{"threads":2},"block":{"rows":8,"cols":64}}"#)
            .unwrap();
    assert!(opts.threading.parallel);
    assert_eq!(opts.threading.threads, Some(2));
    assert_eq!(opts.block, BlockShape { rows: 8, cols: 64 });
}

#[test]
fn invalid_opts_are_rejected() {
    let err = MultiPaste::new(PasteOpts {
        threading: PasteThreading {
            parallel: true,
            threads: Some(0),
        },
        ..PasteOpts::default()
    })
    .unwrap_err();
    assert!(err.to_string().contains("'threads' must be >= 1"));

    let err = MultiPaste::new(PasteOpts {
        block: BlockShape { rows: 0, cols: 4 },
        ..PasteOpts::default()
    })
    .unwrap_err();
    assert!(matches!(err, PasteError::Validation(_)));
}

#[test]
fn setup_reports_outputs_and_backend_scratch() {
    let launch = sequential(PasteBackend::Launch);
    let setup = launch
        .setup(ElementType::I32, &inputs().shapes(), &args())
        .unwrap();
    assert_eq!(setup.requirements.output_shapes, vec![ImageShape::new(5, 6, 1)]);
    assert_eq!(setup.requirements.output_type, ElementType::U8);
    assert_eq!(setup.requirements.scratch, plan_scratch(&setup.layout, BlockShape::default()));
    assert_eq!(setup.backend(), PasteBackend::Launch);

    let scheduled = sequential(PasteBackend::Scheduled);
    let setup = scheduled
        .setup(ElementType::I32, &inputs().shapes(), &args())
        .unwrap();
    assert_eq!(setup.requirements.scratch, ScratchSizes::default());
}

#[test]
fn unsupported_types_fail_at_setup() {
    let engine = sequential(PasteBackend::Launch);
    let err = engine
        .setup(ElementType::F64, &inputs().shapes(), &PasteArgs::default())
        .unwrap_err();
    assert!(matches!(err, PasteError::UnsupportedType(_)));
}

#[test]
fn run_checks_batches_before_writing() {
    let engine = sequential(PasteBackend::Launch);
    let setup = engine
        .setup(ElementType::I32, &inputs().shapes(), &args())
        .unwrap();
    let mut scratch = Scratch::with_sizes(&setup.requirements.scratch);

    let mut wrong_type = ImageBatch::zeros(ElementType::I16, &setup.requirements.output_shapes).unwrap();
    let err = engine
        .run(&setup, &mut scratch, &inputs(), &mut wrong_type)
        .unwrap_err();
    assert!(err.to_string().contains("output batch has type 'int16'"));

    let mut wrong_shape = ImageBatch::U8(vec![Image::filled(ImageShape::new(5, 5, 1), 9)]);
    let err = engine
        .run(&setup, &mut scratch, &inputs(), &mut wrong_shape)
        .unwrap_err();
    assert!(err.to_string().contains("sample 0: output shape 5x5x1"));
    assert_eq!(wrong_shape, ImageBatch::U8(vec![Image::filled(ImageShape::new(5, 5, 1), 9)]));

    let narrower = ImageBatch::I32(vec![Image::zeros(ImageShape::new(4, 4, 1))]);
    let mut outputs = ImageBatch::zeros(ElementType::U8, &setup.requirements.output_shapes).unwrap();
    let err = engine
        .run(&setup, &mut scratch, &narrower, &mut outputs)
        .unwrap_err();
    assert!(err.to_string().contains("input batch has 1 samples"));
}

#[test]
fn paste_composites_and_saturates() {
    let mut engine = sequential(PasteBackend::Launch);
    let out = engine.paste(&inputs(), &args()).unwrap();
    let ImageBatch::U8(images) = out else {
        panic!("expected a uint8 batch");
    };
    let canvas = &images[0];
    // Row 0: source 0 row 0 then background.
    assert_eq!(canvas.row(0), &[0, 1, 2, 3, 0, 0]);
    // Row 2: source 0 row 2 columns 0..3, then source 1 (anchor 1,1) saturated to 255.
    assert_eq!(canvas.row(2), &[8, 9, 10, 255, 255, 255]);
    assert_eq!(canvas.row(4), &[0, 0, 0, 255, 255, 255]);
    assert_eq!(engine.scratch.sizes(), setup_sizes(&engine));
}

fn setup_sizes(engine: &MultiPaste) -> ScratchSizes {
    engine
        .setup(ElementType::I32, &inputs().shapes(), &args())
        .unwrap()
        .requirements
        .scratch
}

#[test]
fn external_layout_runs_like_the_built_in_grid() {
    let shapes = inputs().shapes();
    let built = BatchLayout::resolve(&shapes, &args()).unwrap();
    let layout = BatchLayout::from_parts(
        &shapes,
        &args(),
        vec![built.samples[0].grid.clone()],
        vec![false],
    )
    .unwrap();

    let engine = sequential(PasteBackend::Scheduled);
    let setup = engine
        .setup_with_layout(ElementType::I32, Some(ElementType::F32), layout)
        .unwrap();
    let mut outputs = ImageBatch::zeros(ElementType::F32, &setup.requirements.output_shapes).unwrap();
    engine
        .run(&setup, &mut Scratch::default(), &inputs(), &mut outputs)
        .unwrap();
    let ImageBatch::F32(images) = outputs else {
        panic!("expected a float32 batch");
    };
    assert_eq!(images[0].get(3, 4, 0), Some(1000.0));
}

#[test]
fn edited_layouts_are_rejected_at_setup() {
    let engine = sequential(PasteBackend::Launch);
    let built = BatchLayout::resolve(&inputs().shapes(), &args()).unwrap();

    let mut partial = built.clone();
    partial.samples[0].grid = SampleGrid {
        counts: GridCounts { rows: 1, cols: 1 },
        cells: vec![GridCell::background(Point2::ZERO, Point2::new(6, 2))],
    };
    let err = engine
        .setup_with_layout(ElementType::I32, None, partial)
        .unwrap_err();
    assert!(err.to_string().contains("canvas height"), "{err}");

    let mut overlapping = built.clone();
    overlapping.samples[0].disjoint = true;
    let err = engine
        .setup_with_layout(ElementType::I32, None, overlapping)
        .unwrap_err();
    assert!(err.to_string().contains("flagged disjoint"), "{err}");

    let mut shifted = built.clone();
    shifted.samples[0].pastes[1].dest_rect =
        IRect::from_anchor(Point2::new(4, 2), Extent2::new(3, 3));
    let err = engine
        .setup_with_layout(ElementType::I32, None, shifted)
        .unwrap_err();
    assert!(err.to_string().contains("sample 0: paste 1"), "{err}");

    let mut rechanneled = built;
    rechanneled.channels = 3;
    assert!(engine.setup_with_layout(ElementType::I32, None, rechanneled).is_err());
}

#[test]
fn short_image_data_fails_before_compositing() {
    let shape = ImageShape::new(4, 4, 1);
    let inputs = ImageBatch::U8(vec![Image {
        shape,
        data: vec![1; 3],
    }]);
    let args = PasteArgs::new(vec![
        SamplePastes::new(Extent2::new(4, 4)).paste(PasteIteration::new(0)),
    ]);
    for backend in [PasteBackend::Scheduled, PasteBackend::Launch] {
        let err = sequential(backend).paste(&inputs, &args).unwrap_err();
        assert!(err.to_string().contains("sample 0: image data has 3 elements"), "{err}");
    }
}

#[test]
fn zero_threads_fail_validation() {
    let threading = PasteThreading {
        parallel: false,
        threads: Some(0),
    };
    assert!(threading.validate().is_err());
    assert!(PasteThreading::default().validate().is_ok());
}
