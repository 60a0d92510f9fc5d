use crate::foundation::{
    element::ElementType,
    error::{PasteError, PasteResult},
};

/// Validate an (input, output) element type pair against the compositor instantiations.
pub fn select_kernel(input: ElementType, output: ElementType) -> PasteResult<(ElementType, ElementType)> {
    if !input.is_supported() {
        return Err(PasteError::unsupported_type(format!(
            "input type '{input}' (supported: uint8, int16, int32, float32)"
        )));
    }
    if !output.is_supported() {
        return Err(PasteError::unsupported_type(format!(
            "output type '{output}' (supported: uint8, int16, int32, float32)"
        )));
    }
    Ok((input, output))
}

/// Every (input, output) pair the compositor is instantiated for.
pub fn supported_pairs() -> impl Iterator<Item = (ElementType, ElementType)> {
    ElementType::SUPPORTED
        .into_iter()
        .flat_map(|i| ElementType::SUPPORTED.into_iter().map(move |o| (i, o)))
}

/// Match an input and an output [`ImageBatch`](crate::ImageBatch) into typed image slices.
///
/// Expands to one arm per supported (input, output) pair, each monomorphizing `$body`.
macro_rules! dispatch_pair {
    ($input:expr, $output:expr, |$i:ident, $o:ident| $body:expr) => {{
        use $crate::batch::image::ImageBatch as B;
        match ($input, $output) {
            (B::U8($i), B::U8($o)) => $body,
            (B::U8($i), B::I16($o)) => $body,
            (B::U8($i), B::I32($o)) => $body,
            (B::U8($i), B::F32($o)) => $body,
            (B::I16($i), B::U8($o)) => $body,
            (B::I16($i), B::I16($o)) => $body,
            (B::I16($i), B::I32($o)) => $body,
            (B::I16($i), B::F32($o)) => $body,
            (B::I32($i), B::U8($o)) => $body,
            (B::I32($i), B::I16($o)) => $body,
            (B::I32($i), B::I32($o)) => $body,
            (B::I32($i), B::F32($o)) => $body,
            (B::F32($i), B::U8($o)) => $body,
            (B::F32($i), B::I16($o)) => $body,
            (B::F32($i), B::I32($o)) => $body,
            (B::F32($i), B::F32($o)) => $body,
        }
    }};
}

pub(crate) use dispatch_pair;

#[cfg(test)]
#[path = "../../tests/unit/exec/dispatch.rs"]
mod tests;
