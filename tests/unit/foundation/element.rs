use super::*;

#[test]
fn narrowing_saturates_instead_of_wrapping() {
    assert_eq!(convert_sat::<u8, i32>(300), 255);
    assert_eq!(convert_sat::<u8, i16>(-5), 0);
    assert_eq!(convert_sat::<i16, i32>(40_000), i16::MAX);
    assert_eq!(convert_sat::<i16, i32>(-40_000), i16::MIN);
}

#[test]
fn float_to_int_rounds_and_clamps() {
    assert_eq!(convert_sat::<u8, f32>(300.0), 255);
    assert_eq!(convert_sat::<u8, f32>(-1.5), 0);
    assert_eq!(convert_sat::<u8, f32>(9.6), 10);
    assert_eq!(convert_sat::<i32, f32>(f32::NAN), 0);
    assert_eq!(convert_sat::<i32, f32>(1.0e12), i32::MAX);
}

#[test]
fn widening_is_exact() {
    assert_eq!(convert_sat::<i32, u8>(200), 200);
    assert_eq!(convert_sat::<f32, i16>(-7), -7.0);
    assert_eq!(convert_sat::<i32, i32>(i32::MIN), i32::MIN);
}

#[test]
fn supported_set_matches_compositor_instantiations() {
    for ty in ElementType::SUPPORTED {
        assert!(ty.ensure_supported().is_ok());
    }
    let err = ElementType::F64.ensure_supported().unwrap_err();
    assert!(matches!(err, PasteError::UnsupportedType(_)));
    assert!(err.to_string().contains("float64"));
}

#[test]
fn names_parse_back() {
    for ty in [
        ElementType::U8,
        ElementType::I16,
        ElementType::U16,
        ElementType::I32,
        ElementType::F32,
        ElementType::F64,
    ] {
        assert_eq!(ty.name().parse::<ElementType>().unwrap(), ty);
    }
    assert_eq!("float".parse::<ElementType>().unwrap(), ElementType::F32);
    assert!("int8".parse::<ElementType>().is_err());
}

#[test]
fn serde_uses_dtype_names() {
    let json = serde_json::to_string(&ElementType::I16).unwrap();
    assert_eq!(json, "\"int16\"");
    let back: ElementType = serde_json::from_str("\"float32\"").unwrap();
    assert_eq!(back, ElementType::F32);
}
