//! A single-layer linear classifier for 28x28 handwritten digit images, trained with the
//! delta rule.

pub mod dataset;
pub mod dtype;
pub mod error;
pub mod image;
pub mod net;
pub mod scoring;
pub mod target;
mod train;

pub use error::{Error, ErrorKind, Result};
