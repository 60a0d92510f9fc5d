use std::{fmt, str::FromStr};

use crate::foundation::error::{PasteError, PasteResult};

/// Numeric element type of an image buffer.
///
/// `U16` and `F64` are recognized so that a request for them fails with a precise
/// [`PasteError::UnsupportedType`] instead of a parse error; the compositor is only instantiated
/// for [`ElementType::SUPPORTED`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ElementType {
    #[serde(rename = "uint8")]
    U8,
    #[serde(rename = "int16")]
    I16,
    #[serde(rename = "uint16")]
    U16,
    #[serde(rename = "int32")]
    I32,
    #[serde(rename = "float32")]
    F32,
    #[serde(rename = "float64")]
    F64,
}

impl ElementType {
    pub const SUPPORTED: [ElementType; 4] = [Self::U8, Self::I16, Self::I32, Self::F32];

    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::I16 => "int16",
            Self::U16 => "uint16",
            Self::I32 => "int32",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }

    pub fn size_of(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    pub fn is_supported(self) -> bool {
        Self::SUPPORTED.contains(&self)
    }

    pub fn ensure_supported(self) -> PasteResult<Self> {
        if self.is_supported() {
            Ok(self)
        } else {
            Err(PasteError::unsupported_type(format!(
                "element type '{}' is not one of uint8, int16, int32, float32",
                self.name()
            )))
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElementType {
    type Err = PasteError;

    fn from_str(s: &str) -> PasteResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uint8" | "u8" => Ok(Self::U8),
            "int16" | "i16" => Ok(Self::I16),
            "uint16" | "u16" => Ok(Self::U16),
            "int32" | "i32" => Ok(Self::I32),
            "float32" | "float" | "f32" => Ok(Self::F32),
            "float64" | "double" | "f64" => Ok(Self::F64),
            other => Err(PasteError::validation(format!(
                "unknown element type '{other}'"
            ))),
        }
    }
}

/// Pixel element the compositor can read and write.
pub trait Element: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    const TYPE: ElementType;

    fn to_f64(self) -> f64;

    /// Clamp to the representable range. Integer targets round to nearest first and map NaN
    /// to zero.
    fn from_f64_sat(v: f64) -> Self;
}

macro_rules! impl_int_element {
    ($($t:ty => $tag:ident),* $(,)?) => {
        $(
            impl Element for $t {
                const TYPE: ElementType = ElementType::$tag;

                fn to_f64(self) -> f64 {
                    f64::from(self)
                }

                fn from_f64_sat(v: f64) -> Self {
                    // Float-to-int `as` saturates at the bounds and maps NaN to 0.
                    v.round() as $t
                }
            }
        )*
    };
}

impl_int_element!(u8 => U8, i16 => I16, i32 => I32);

impl Element for f32 {
    const TYPE: ElementType = ElementType::F32;

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64_sat(v: f64) -> Self {
        v.clamp(f64::from(f32::MIN), f64::from(f32::MAX)) as f32
    }
}

/// Convert one element with saturation: out-of-range values clamp, they never wrap.
#[inline]
pub fn convert_sat<O: Element, I: Element>(v: I) -> O {
    O::from_f64_sat(v.to_f64())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/element.rs"]
mod tests;
