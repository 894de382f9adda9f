use crate::dtype::{DType, DTypeFloat};
use crate::error::{Error, Result, Shape};
use log::debug;
use std::fmt::{Debug, Formatter};
use std::iter::zip;

mod cell;
pub mod initializer;

pub use cell::Cell;
use initializer::LayerInitializer;

/// Number of input values per example (28 * 28 pixels).
pub const INPUT_CELLS: usize = 28 * 28;
/// Number of output cells, one per digit.
pub const OUTPUT_CELLS: usize = 10;
/// Step size of the weight update.
pub const LEARNING_RATE: f64 = 0.05;

/// The single trainable layer: cell `i` scores digit `i`.
pub struct Layer<T: DTypeFloat = f64> {
    cells: [Cell<T>; OUTPUT_CELLS],
}

/// Plain copy of a layer's weights, one vector per cell.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerWeights<T> {
    pub cells: Vec<Vec<T>>,
}

impl<T: DTypeFloat> Layer<T> {
    pub fn new(initializer: &mut dyn LayerInitializer<T>) -> Result<Self> {
        let cells: Vec<Vec<T>> = (0..OUTPUT_CELLS)
            .map(|cell_idx| initializer.get_weights(cell_idx, INPUT_CELLS))
            .collect();
        if let Some(v) = cells.iter().flatten().find(|&&v| !in_unit_interval(v)) {
            return Err(Error::InvalidArgument(format!(
                "initial weight {v} is outside of [0, 1]"
            )));
        }
        debug!("initialized layer with {OUTPUT_CELLS} cells of {INPUT_CELLS} weights");
        Self::from_weights(LayerWeights { cells })
    }

    /// Rebuilds a layer from a [`Layer::snapshot`]. Only the shape is checked; trained
    /// weights may lie anywhere.
    pub fn from_weights(weights: LayerWeights<T>) -> Result<Self> {
        let count = weights.cells.len();
        if count != OUTPUT_CELLS {
            return Err(Error::shape(Shape::Layer, OUTPUT_CELLS, count));
        }
        let cells = weights
            .cells
            .into_iter()
            .map(Cell::new)
            .collect::<Result<Vec<_>>>()?;
        let cells = cells
            .try_into()
            .map_err(|c: Vec<_>| Error::shape(Shape::Layer, OUTPUT_CELLS, c.len()))?;
        Ok(Layer { cells })
    }

    pub fn snapshot(&self) -> LayerWeights<T> {
        LayerWeights {
            cells: self.cells.iter().map(|c| c.weights().to_vec()).collect(),
        }
    }

    #[inline]
    pub fn cells(&self) -> &[Cell<T>] {
        &self.cells
    }

    /// Evaluates every cell on `input`, keeping input and output in the cells for
    /// [`Layer::update`].
    pub fn forward(&mut self, input: &[T]) -> Result<()> {
        for cell in self.cells.iter_mut() {
            cell.forward(input)?;
        }
        Ok(())
    }

    /// Evaluates every cell on `input` without modifying the layer.
    pub fn evaluate(&self, input: &[T]) -> Result<[T; OUTPUT_CELLS]> {
        let mut outputs = [T::ZERO; OUTPUT_CELLS];
        for (out, cell) in zip(outputs.iter_mut(), self.cells.iter()) {
            *out = cell.evaluate(input)?;
        }
        Ok(outputs)
    }

    /// Applies the delta rule to every cell against its own component of `target`.
    pub fn update(&mut self, target: &[T], learn_rate: T) -> Result<()> {
        if target.len() != OUTPUT_CELLS {
            return Err(Error::shape(Shape::Target, OUTPUT_CELLS, target.len()));
        }
        for (cell, &t) in zip(self.cells.iter_mut(), target) {
            cell.update(t, learn_rate);
        }
        Ok(())
    }

    /// Outputs of the most recent [`Layer::forward`].
    pub fn outputs(&self) -> [T; OUTPUT_CELLS] {
        std::array::from_fn(|i| self.cells[i].output())
    }

    #[inline]
    pub fn prediction(&self) -> usize {
        prediction(&self.outputs())
    }
}

/// True for values in [0, 1]; false for NaN.
#[inline]
pub(crate) fn in_unit_interval<T: DType>(v: T) -> bool {
    v >= T::ZERO && v <= T::ONE
}

/// Index of the strictly greatest output. Ties go to the lower index, and 0 is returned
/// when no output is above 0.
pub fn prediction<T: DType>(outputs: &[T]) -> usize {
    let mut max_out = T::ZERO;
    let mut max_idx = 0;
    for (i, &out) in outputs.iter().enumerate() {
        if out > max_out {
            max_out = out;
            max_idx = i;
        }
    }
    max_idx
}

impl<T: DTypeFloat> Debug for Layer<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Layer")
            .field("cells", &self.cells)
            .finish()
    }
}
