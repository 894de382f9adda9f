use crate::idx::{IdxImageStream, IdxLabelStream};
use lnn::dataset::{DatasetSource, Split};
use lnn::dtype::DType;
use lnn::error::Result;
use std::path::{Path, PathBuf};

pub const TRAINING_SET_IMAGE_FILE_NAME: &str = "train-images-idx3-ubyte";
pub const TRAINING_SET_LABEL_FILE_NAME: &str = "train-labels-idx1-ubyte";
pub const TESTING_SET_IMAGE_FILE_NAME: &str = "t10k-images-idx3-ubyte";
pub const TESTING_SET_LABEL_FILE_NAME: &str = "t10k-labels-idx1-ubyte";

pub const MAX_TRAINING_IMAGES: usize = 60_000;
pub const MAX_TESTING_IMAGES: usize = 10_000;

/// The MNIST IDX files in a single directory.
#[derive(Clone, Debug)]
pub struct MnistSource {
    data_dir: PathBuf,
    training_count: usize,
    testing_count: usize,
}

impl MnistSource {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        MnistSource {
            data_dir: data_dir.as_ref().to_path_buf(),
            training_count: MAX_TRAINING_IMAGES,
            testing_count: MAX_TESTING_IMAGES,
        }
    }

    pub fn with_counts(mut self, training_count: usize, testing_count: usize) -> Self {
        self.training_count = training_count;
        self.testing_count = testing_count;
        self
    }

    fn path(&self, split: Split, images: bool) -> PathBuf {
        let name = match (split, images) {
            (Split::Training, true) => TRAINING_SET_IMAGE_FILE_NAME,
            (Split::Training, false) => TRAINING_SET_LABEL_FILE_NAME,
            (Split::Testing, true) => TESTING_SET_IMAGE_FILE_NAME,
            (Split::Testing, false) => TESTING_SET_LABEL_FILE_NAME,
        };
        self.data_dir.join(name)
    }
}

impl<T: DType> DatasetSource<T> for MnistSource {
    type Images = IdxImageStream;
    type Labels = IdxLabelStream;

    fn example_count(&self, split: Split) -> usize {
        match split {
            Split::Training => self.training_count,
            Split::Testing => self.testing_count,
        }
    }

    fn open_images(&mut self, split: Split) -> Result<Self::Images> {
        IdxImageStream::open(self.path(split, true), split)
    }

    fn open_labels(&mut self, split: Split) -> Result<Self::Labels> {
        IdxLabelStream::open(self.path(split, false), split)
    }
}
