use crate::dataset::{Split, StreamOp};
use std::fmt::{Display, Formatter};

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Io,
    ShapeMismatch,
    EndOfStream,
    InvalidArgument,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{split} set: failed to {operation}: {source}")]
    Io {
        split: Split,
        operation: StreamOp,
        #[source]
        source: std::io::Error,
    },
    #[error("{split} set: failed to {operation}: {reason}")]
    Format {
        split: Split,
        operation: StreamOp,
        reason: String,
    },
    #[error("{split} set: failed to {operation}: end of stream reached at example {index}")]
    EndOfStream {
        split: Split,
        operation: StreamOp,
        index: usize,
    },
    #[error("shape mismatch for {what}: expected length {expected}, got {actual}")]
    ShapeMismatch {
        what: Shape,
        expected: usize,
        actual: usize,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// The buffer whose length did not match the layer's shape.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Shape {
    Image,
    Target,
    Weights,
    Layer,
}

impl Display for Shape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Shape::Image => "image vector",
            Shape::Target => "target vector",
            Shape::Weights => "cell weights",
            Shape::Layer => "layer cells",
        })
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io { .. } | Error::Format { .. } => ErrorKind::Io,
            Error::EndOfStream { .. } => ErrorKind::EndOfStream,
            Error::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    pub(crate) fn shape(what: Shape, expected: usize, actual: usize) -> Self {
        Error::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }
}
