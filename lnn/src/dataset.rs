use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::image::ImageVector;
use log::debug;
use std::fmt::{Display, Formatter};
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// One of the two fixed dataset partitions.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Split {
    Training,
    Testing,
}

impl Display for Split {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Split::Training => "training",
            Split::Testing => "testing",
        })
    }
}

/// Stream operation that produced an error.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StreamOp {
    OpenImages,
    OpenLabels,
    NextImage,
    NextLabel,
}

impl Display for StreamOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StreamOp::OpenImages => "open image stream",
            StreamOp::OpenLabels => "open label stream",
            StreamOp::NextImage => "read next image",
            StreamOp::NextLabel => "read next label",
        })
    }
}

pub trait DataStream {
    /// Releases the underlying resource. Must be idempotent.
    fn close(&mut self);
}

pub trait ImageStream<T: DType>: DataStream {
    fn next_image(&mut self) -> Result<ImageVector<T>>;
}

pub trait LabelStream: DataStream {
    fn next_label(&mut self) -> Result<usize>;
}

/// Supplies the labeled example streams for each split.
pub trait DatasetSource<T: DType> {
    type Images: ImageStream<T>;
    type Labels: LabelStream;

    /// Number of examples a pass over `split` consumes.
    fn example_count(&self, split: Split) -> usize;
    fn open_images(&mut self, split: Split) -> Result<Self::Images>;
    fn open_labels(&mut self, split: Split) -> Result<Self::Labels>;
}

/// An opened stream that is closed exactly once, when dropped or explicitly closed.
pub struct ScopedStream<S: DataStream> {
    split: Split,
    inner: S,
}

impl<S: DataStream> ScopedStream<S> {
    pub fn new(split: Split, inner: S) -> Self {
        ScopedStream { split, inner }
    }

    #[inline]
    pub fn close(self) {}
}

impl<S: DataStream> Deref for ScopedStream<S> {
    type Target = S;
    fn deref(&self) -> &S {
        &self.inner
    }
}

impl<S: DataStream> DerefMut for ScopedStream<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}

impl<S: DataStream> Drop for ScopedStream<S> {
    fn drop(&mut self) {
        debug!("closing {} stream", self.split);
        self.inner.close();
    }
}

pub type Example<T> = (ImageVector<T>, usize);

/// A dataset held entirely in memory, mostly useful for tests and synthetic runs.
pub struct InMemorySource<T: DType> {
    training: Rc<[Example<T>]>,
    testing: Rc<[Example<T>]>,
    training_count: usize,
    testing_count: usize,
}

impl<T: DType> InMemorySource<T> {
    pub fn new(training: Vec<Example<T>>, testing: Vec<Example<T>>) -> Self {
        InMemorySource {
            training_count: training.len(),
            testing_count: testing.len(),
            training: training.into(),
            testing: testing.into(),
        }
    }

    /// Overrides the number of examples a pass over `split` will request.
    pub fn with_example_count(mut self, split: Split, count: usize) -> Self {
        match split {
            Split::Training => self.training_count = count,
            Split::Testing => self.testing_count = count,
        }
        self
    }

    fn examples(&self, split: Split) -> Rc<[Example<T>]> {
        match split {
            Split::Training => self.training.clone(),
            Split::Testing => self.testing.clone(),
        }
    }
}

pub struct InMemoryImages<T: DType> {
    split: Split,
    examples: Rc<[Example<T>]>,
    pos: usize,
}

pub struct InMemoryLabels<T: DType> {
    split: Split,
    examples: Rc<[Example<T>]>,
    pos: usize,
}

impl<T: DType> DatasetSource<T> for InMemorySource<T> {
    type Images = InMemoryImages<T>;
    type Labels = InMemoryLabels<T>;

    fn example_count(&self, split: Split) -> usize {
        match split {
            Split::Training => self.training_count,
            Split::Testing => self.testing_count,
        }
    }

    fn open_images(&mut self, split: Split) -> Result<Self::Images> {
        Ok(InMemoryImages {
            split,
            examples: self.examples(split),
            pos: 0,
        })
    }

    fn open_labels(&mut self, split: Split) -> Result<Self::Labels> {
        Ok(InMemoryLabels {
            split,
            examples: self.examples(split),
            pos: 0,
        })
    }
}

impl<T: DType> DataStream for InMemoryImages<T> {
    fn close(&mut self) {}
}

impl<T: DType> DataStream for InMemoryLabels<T> {
    fn close(&mut self) {}
}

impl<T: DType> ImageStream<T> for InMemoryImages<T> {
    fn next_image(&mut self) -> Result<ImageVector<T>> {
        let (image, _) = self.examples.get(self.pos).ok_or(Error::EndOfStream {
            split: self.split,
            operation: StreamOp::NextImage,
            index: self.pos,
        })?;
        self.pos += 1;
        Ok(image.clone())
    }
}

impl<T: DType> LabelStream for InMemoryLabels<T> {
    fn next_label(&mut self) -> Result<usize> {
        let &(_, label) = self.examples.get(self.pos).ok_or(Error::EndOfStream {
            split: self.split,
            operation: StreamOp::NextLabel,
            index: self.pos,
        })?;
        self.pos += 1;
        Ok(label)
    }
}
