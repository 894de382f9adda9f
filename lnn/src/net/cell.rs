use crate::dtype::DTypeFloat;
use crate::error::{Error, Result, Shape};
use crate::net::INPUT_CELLS;
use std::fmt::{Debug, Formatter};
use std::iter::zip;

/// A single linear output unit: one weight per input pixel, plus the input and output of
/// its most recent forward evaluation.
#[derive(Clone)]
pub struct Cell<T> {
    weights: Box<[T; INPUT_CELLS]>,
    input: Box<[T; INPUT_CELLS]>,
    output: T,
}

impl<T: DTypeFloat> Cell<T> {
    pub fn new(weights: Vec<T>) -> Result<Self> {
        let len = weights.len();
        let weights: Box<[T; INPUT_CELLS]> = weights
            .into_boxed_slice()
            .try_into()
            .map_err(|_| Error::shape(Shape::Weights, INPUT_CELLS, len))?;
        Ok(Cell {
            weights,
            input: Box::new([T::ZERO; INPUT_CELLS]),
            output: T::ZERO,
        })
    }

    /// Normalized dot product of `input` and the weights, without touching cell state.
    pub fn evaluate(&self, input: &[T]) -> Result<T> {
        check_input_len(input)?;
        Ok(normalized_dot(input, self.weights.as_slice()))
    }

    /// Like [`Cell::evaluate`], but remembers `input` and the result for a following
    /// [`Cell::update`].
    pub fn forward(&mut self, input: &[T]) -> Result<T> {
        check_input_len(input)?;
        self.input.copy_from_slice(input);
        self.output = normalized_dot(self.input.as_slice(), self.weights.as_slice());
        Ok(self.output)
    }

    /// Applies the delta rule against the last forward evaluation and returns the error.
    pub fn update(&mut self, target: T, learn_rate: T) -> T {
        let err = target - self.output;
        for (w, &x) in zip(self.weights.iter_mut(), self.input.iter()) {
            *w += learn_rate * x * err;
        }
        err
    }

    #[inline]
    pub fn weights(&self) -> &[T] {
        self.weights.as_slice()
    }

    #[inline]
    pub fn input(&self) -> &[T] {
        self.input.as_slice()
    }

    #[inline]
    pub fn output(&self) -> T {
        self.output
    }
}

#[inline]
fn check_input_len<T>(input: &[T]) -> Result<()> {
    if input.len() != INPUT_CELLS {
        return Err(Error::shape(Shape::Image, INPUT_CELLS, input.len()));
    }
    Ok(())
}

#[inline]
fn normalized_dot<T: DTypeFloat>(input: &[T], weights: &[T]) -> T {
    let sum = zip(input, weights).fold(T::ZERO, |acc, (&x, &w)| acc + x * w);
    sum / T::from_usize(INPUT_CELLS)
}

impl<T: DTypeFloat> Debug for Cell<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}
