use super::*;
use crate::{
    batch::image::{Image, ImageBatch, ImageShape},
    foundation::element::{Element, convert_sat},
};

#[test]
fn all_sixteen_pairs_are_selectable() {
    let pairs = supported_pairs().collect::<Vec<_>>();
    assert_eq!(pairs.len(), 16);
    for (i, o) in pairs {
        assert_eq!(select_kernel(i, o).unwrap(), (i, o));
    }
}

#[test]
fn unsupported_side_is_named() {
    let err = select_kernel(ElementType::U8, ElementType::F64).unwrap_err();
    assert!(matches!(err, PasteError::UnsupportedType(_)));
    assert!(err.to_string().contains("output type 'float64'"));

    let err = select_kernel(ElementType::U16, ElementType::U8).unwrap_err();
    assert!(err.to_string().contains("input type 'uint16'"));
}

fn copy_first<O: Element, I: Element>(src: &[Image<I>], dst: &mut [Image<O>]) {
    dst[0].data[0] = convert_sat(src[0].data[0]);
}

#[test]
fn macro_routes_to_typed_slices() {
    let shape = ImageShape::new(1, 1, 1);
    let input = ImageBatch::F32(vec![Image::new(shape, vec![300.4]).unwrap()]);
    for ty in ElementType::SUPPORTED {
        let mut output = ImageBatch::zeros(ty, &[shape]).unwrap();
        dispatch_pair!(&input, &mut output, |i, o| copy_first(i, o));
        let expected = match ty {
            ElementType::U8 => ImageBatch::U8(vec![Image::filled(shape, 255)]),
            ElementType::I16 => ImageBatch::I16(vec![Image::filled(shape, 300)]),
            ElementType::I32 => ImageBatch::I32(vec![Image::filled(shape, 300)]),
            _ => ImageBatch::F32(vec![Image::filled(shape, 300.4)]),
        };
        assert_eq!(output, expected);
    }
}
