use super::*;

fn inputs() -> Vec<ImageShape> {
    vec![ImageShape::new(32, 32, 3), ImageShape::new(10, 20, 3)]
}

#[test]
fn defaults_take_rest_of_source_from_anchor() {
    let sample = SamplePastes::new(Extent2::new(64, 64))
        .paste(PasteIteration::new(1))
        .paste(
            PasteIteration::new(1)
                .with_source_anchor(Point2::new(5, 2))
                .with_dest_anchor(Point2::new(40, 40)),
        );
    let resolved = resolve_iterations(0, &sample, &inputs()).unwrap();

    assert_eq!(resolved[0].source, 1);
    assert_eq!(resolved[0].source_rect.extent(), Extent2::new(20, 10));
    assert_eq!(resolved[0].dest_rect, IRect::from_extent(Extent2::new(20, 10)));

    assert_eq!(resolved[1].source_rect.start, Point2::new(5, 2));
    assert_eq!(resolved[1].source_rect.extent(), Extent2::new(15, 8));
    assert_eq!(
        resolved[1].dest_rect,
        IRect::from_anchor(Point2::new(40, 40), Extent2::new(15, 8))
    );
}

#[test]
fn destination_outside_canvas_fails_with_context() {
    let sample = SamplePastes::new(Extent2::new(16, 16)).paste(
        PasteIteration::new(0)
            .with_source_shape(Extent2::new(8, 8))
            .with_dest_anchor(Point2::new(10, 0)),
    );
    let err = resolve_iterations(4, &sample, &inputs()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("sample 4"), "{msg}");
    assert!(msg.contains("iteration 0"), "{msg}");
    assert!(msg.contains("outside canvas"), "{msg}");
}

#[test]
fn source_region_and_index_are_checked() {
    let too_big = SamplePastes::new(Extent2::new(64, 64))
        .paste(PasteIteration::new(1).with_source_shape(Extent2::new(21, 1)));
    assert!(
        resolve_iterations(0, &too_big, &inputs())
            .unwrap_err()
            .to_string()
            .contains("outside source image")
    );

    let bad_index = SamplePastes::new(Extent2::new(64, 64)).paste(PasteIteration::new(2));
    assert!(
        resolve_iterations(0, &bad_index, &inputs())
            .unwrap_err()
            .to_string()
            .contains("out of range")
    );

    let negative = SamplePastes::new(Extent2::new(64, 64))
        .paste(PasteIteration::new(0).with_source_anchor(Point2::new(-1, 0)));
    assert!(resolve_iterations(0, &negative, &inputs()).is_err());
}

#[test]
fn empty_paste_is_kept_and_always_fits() {
    let sample = SamplePastes::new(Extent2::new(4, 4)).paste(
        PasteIteration::new(0)
            .with_source_shape(Extent2::new(0, 5))
            .with_dest_anchor(Point2::new(100, 100)),
    );
    let resolved = resolve_iterations(0, &sample, &inputs()).unwrap();
    assert_eq!(resolved.len(), 1);
    assert!(resolved[0].dest_rect.is_empty());
}

#[test]
fn args_parse_from_json_with_defaults() {
    let json = r#"
{
  "dtype": "float32",
  "samples": [
    {
      "output_size": { "width": 64, "height": 48 },
      "iterations": [
        { "source_sample_index": 0 },
        {
          "source_sample_index": 1,
          "source_anchor": { "x": 1, "y": 2 },
          "source_shape": { "width": 4, "height": 4 },
          "dest_anchor": { "x": 8, "y": 8 }
        }
      ]
    },
    { "output_size": { "width": 8, "height": 8 } }
  ]
}
"#;
    let args = PasteArgs::from_json_str(json).unwrap();
    assert_eq!(args.dtype, Some(ElementType::F32));
    assert_eq!(args.samples.len(), 2);
    assert_eq!(args.samples[0].iterations[0], PasteIteration::new(0));
    assert_eq!(
        args.samples[0].iterations[1],
        PasteIteration::new(1)
            .with_source_anchor(Point2::new(1, 2))
            .with_source_shape(Extent2::new(4, 4))
            .with_dest_anchor(Point2::new(8, 8))
    );
    assert!(args.samples[1].iterations.is_empty());

    let err = PasteArgs::from_json_str("{ \"samples\": 3 }").unwrap_err();
    assert!(matches!(err, PasteError::Serde(_)));
}

#[test]
fn anchors_near_i64_max_fail_instead_of_wrapping() {
    let args = PasteArgs::from_json_str(
        r#"{ "samples": [{ "output_size": { "width": 8, "height": 8 },
             "iterations": [{ "source_sample_index": 1,
                              "dest_anchor": { "x": 9223372036854775807, "y": 0 } }] }] }"#,
    )
    .unwrap();
    let msg = resolve_iterations(2, &args.samples[0], &inputs())
        .unwrap_err()
        .to_string();
    assert!(msg.contains("sample 2: iteration 0: destination"), "{msg}");
    assert!(msg.contains("overflows"), "{msg}");

    let sample = SamplePastes::new(Extent2::new(8, 8)).paste(
        PasteIteration::new(0)
            .with_source_anchor(Point2::new(1, i64::MAX))
            .with_source_shape(Extent2::new(1, 1)),
    );
    let msg = resolve_iterations(0, &sample, &inputs())
        .unwrap_err()
        .to_string();
    assert!(msg.contains("source region"), "{msg}");
}
