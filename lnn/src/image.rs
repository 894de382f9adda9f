use crate::dtype::DType;
use crate::error::{Error, Result, Shape};
use crate::net::{INPUT_CELLS, in_unit_interval};

/// A flattened 28x28 image with one value in [0,1] per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageVector<T> {
    values: Box<[T; INPUT_CELLS]>,
}

impl<T: DType> ImageVector<T> {
    pub fn new(values: Vec<T>) -> Result<Self> {
        let len = values.len();
        if let Some(v) = values.iter().find(|&&v| !in_unit_interval(v)) {
            return Err(Error::InvalidArgument(format!(
                "image value {v} is outside of [0, 1]"
            )));
        }
        let values = values
            .into_boxed_slice()
            .try_into()
            .map_err(|_| Error::shape(Shape::Image, INPUT_CELLS, len))?;
        Ok(ImageVector { values })
    }

    /// Maps every nonzero pixel to 1 and every zero pixel to 0.
    pub fn binarized(pixels: &[u8]) -> Result<Self> {
        if pixels.len() != INPUT_CELLS {
            return Err(Error::shape(Shape::Image, INPUT_CELLS, pixels.len()));
        }
        Self::new(
            pixels
                .iter()
                .map(|&p| if p != 0 { T::ONE } else { T::ZERO })
                .collect(),
        )
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.values.as_slice()
    }
}

impl<T> AsRef<[T]> for ImageVector<T> {
    fn as_ref(&self) -> &[T] {
        self.values.as_slice()
    }
}
