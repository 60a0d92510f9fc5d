use super::*;

#[test]
fn new_rejects_wrong_data_length() {
    let shape = ImageShape::new(2, 3, 3);
    assert!(Image::<u8>::new(shape, vec![0; 18]).is_ok());
    let err = Image::<u8>::new(shape, vec![0; 17]).unwrap_err();
    assert!(err.to_string().contains("needs 18"));
}

#[test]
fn get_addresses_hwc_layout() {
    let shape = ImageShape::new(2, 2, 3);
    let img = Image::<i16>::new(shape, (0..12).collect()).unwrap();
    assert_eq!(img.get(0, 0, 0), Some(0));
    assert_eq!(img.get(0, 1, 2), Some(5));
    assert_eq!(img.get(1, 0, 1), Some(7));
    assert_eq!(img.get(2, 0, 0), None);
    assert_eq!(img.row(1), &[6, 7, 8, 9, 10, 11]);
}

#[test]
fn zeros_allocates_per_shape_and_rejects_unsupported() {
    let shapes = [ImageShape::new(4, 5, 3), ImageShape::new(1, 1, 3)];
    let batch = ImageBatch::zeros(ElementType::I32, &shapes).unwrap();
    assert_eq!(batch.element_type(), ElementType::I32);
    assert_eq!(batch.len(), 2);
    assert_eq!(batch.shapes(), shapes.to_vec());
    assert!(batch.as_i32().unwrap()[0].data.iter().all(|&v| v == 0));

    let err = ImageBatch::zeros(ElementType::U16, &shapes).unwrap_err();
    assert!(matches!(err, PasteError::UnsupportedType(_)));
}

#[test]
fn uniform_channels_reports_offending_sample() {
    let ok = [ImageShape::new(1, 1, 3), ImageShape::new(5, 2, 3)];
    assert_eq!(uniform_channels(&ok).unwrap(), Some(3));
    assert_eq!(uniform_channels(&[]).unwrap(), None);

    let bad = [
        ImageShape::new(1, 1, 3),
        ImageShape::new(1, 1, 3),
        ImageShape::new(1, 1, 4),
    ];
    let err = uniform_channels(&bad).unwrap_err();
    assert!(err.to_string().contains("sample 2"));
}

#[test]
fn check_data_names_the_short_image() {
    let shape = ImageShape::new(4, 4, 1);
    let batch = ImageBatch::U8(vec![
        Image::zeros(shape),
        Image {
            shape,
            data: vec![1; 3],
        },
    ]);
    let msg = batch.check_data().unwrap_err().to_string();
    assert!(msg.contains("sample 1: image data has 3 elements"), "{msg}");
    assert!(ImageBatch::zeros(ElementType::F32, &[shape]).unwrap().check_data().is_ok());
}
