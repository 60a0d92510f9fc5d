use crate::foundation::{
    core::Extent2,
    element::{Element, ElementType},
    error::{PasteError, PasteResult},
};

/// Shape of one HWC image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ImageShape {
    pub height: usize,
    pub width: usize,
    pub channels: usize,
}

impl ImageShape {
    pub const fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }

    pub fn extent(self) -> Extent2 {
        Extent2::new(self.width as i64, self.height as i64)
    }

    /// Elements per row once channels are flattened into the column axis.
    pub fn row_pitch(self) -> usize {
        self.width * self.channels
    }

    pub fn len(self) -> usize {
        self.height * self.row_pitch()
    }

    pub fn is_empty(self) -> bool {
        self.len() == 0
    }
}

/// Row-major HWC image with tightly packed rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T> {
    pub shape: ImageShape,
    pub data: Vec<T>,
}

impl<T: Element> Image<T> {
    pub fn new(shape: ImageShape, data: Vec<T>) -> PasteResult<Self> {
        if data.len() != shape.len() {
            return Err(PasteError::validation(format!(
                "image data has {} elements, shape {}x{}x{} needs {}",
                data.len(),
                shape.height,
                shape.width,
                shape.channels,
                shape.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn zeros(shape: ImageShape) -> Self {
        Self::filled(shape, T::default())
    }

    pub fn filled(shape: ImageShape, value: T) -> Self {
        Self {
            shape,
            data: vec![value; shape.len()],
        }
    }

    pub fn row_pitch(&self) -> usize {
        self.shape.row_pitch()
    }

    pub fn get(&self, y: usize, x: usize, c: usize) -> Option<T> {
        if y >= self.shape.height || x >= self.shape.width || c >= self.shape.channels {
            return None;
        }
        self.data
            .get(y * self.row_pitch() + x * self.shape.channels + c)
            .copied()
    }

    pub fn row(&self, y: usize) -> &[T] {
        let pitch = self.row_pitch();
        &self.data[y * pitch..(y + 1) * pitch]
    }
}

/// A batch of images sharing one element type.
///
/// The variants are the closed set of element types the compositor is instantiated for.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageBatch {
    U8(Vec<Image<u8>>),
    I16(Vec<Image<i16>>),
    I32(Vec<Image<i32>>),
    F32(Vec<Image<f32>>),
}

impl ImageBatch {
    /// Allocate a zero-filled batch. Fails for element types outside the supported set.
    pub fn zeros(ty: ElementType, shapes: &[ImageShape]) -> PasteResult<Self> {
        fn alloc<T: Element>(shapes: &[ImageShape]) -> Vec<Image<T>> {
            shapes.iter().map(|&s| Image::zeros(s)).collect()
        }

        Ok(match ty.ensure_supported()? {
            ElementType::U8 => Self::U8(alloc(shapes)),
            ElementType::I16 => Self::I16(alloc(shapes)),
            ElementType::I32 => Self::I32(alloc(shapes)),
            ElementType::F32 => Self::F32(alloc(shapes)),
            other => return Err(PasteError::unsupported_type(other.name())),
        })
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            Self::U8(_) => ElementType::U8,
            Self::I16(_) => ElementType::I16,
            Self::I32(_) => ElementType::I32,
            Self::F32(_) => ElementType::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U8(v) => v.len(),
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shapes(&self) -> Vec<ImageShape> {
        fn collect<T>(images: &[Image<T>]) -> Vec<ImageShape> {
            images.iter().map(|i| i.shape).collect()
        }

        match self {
            Self::U8(v) => collect(v),
            Self::I16(v) => collect(v),
            Self::I32(v) => collect(v),
            Self::F32(v) => collect(v),
        }
    }

    /// Check that every image holds exactly `shape.len()` elements.
    pub fn check_data(&self) -> PasteResult<()> {
        fn check<T>(images: &[Image<T>]) -> PasteResult<()> {
            for (i, img) in images.iter().enumerate() {
                if img.data.len() != img.shape.len() {
                    return Err(PasteError::at_sample(
                        i,
                        format!(
                            "image data has {} elements, shape {}x{}x{} needs {}",
                            img.data.len(),
                            img.shape.height,
                            img.shape.width,
                            img.shape.channels,
                            img.shape.len()
                        ),
                    ));
                }
            }
            Ok(())
        }

        match self {
            Self::U8(v) => check(v),
            Self::I16(v) => check(v),
            Self::I32(v) => check(v),
            Self::F32(v) => check(v),
        }
    }

    pub fn as_u8(&self) -> Option<&[Image<u8>]> {
        match self {
            Self::U8(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<&[Image<i16>]> {
        match self {
            Self::I16(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<&[Image<i32>]> {
        match self {
            Self::I32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<&[Image<f32>]> {
        match self {
            Self::F32(v) => Some(v),
            _ => None,
        }
    }
}

/// Channel count shared by every image of the batch, or `None` for an empty batch.
pub fn uniform_channels(shapes: &[ImageShape]) -> PasteResult<Option<usize>> {
    let Some(first) = shapes.first() else {
        return Ok(None);
    };
    for (i, s) in shapes.iter().enumerate() {
        if s.channels != first.channels {
            return Err(PasteError::at_sample(
                i,
                format!(
                    "number of channels must be equal for every image in the batch ({} vs {})",
                    s.channels, first.channels
                ),
            ));
        }
    }
    Ok(Some(first.channels))
}

#[cfg(test)]
#[path = "../../tests/unit/batch/image.rs"]
mod tests;
