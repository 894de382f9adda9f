//! Streaming readers for the IDX files of the MNIST distribution.
//!
//! Image files start with a 16-byte big-endian header (magic, image count, rows,
//! columns) followed by one unsigned byte per pixel, row-major. Label files start with an
//! 8-byte header (magic, label count) followed by one byte per label.

use lnn::dataset::{DataStream, ImageStream, LabelStream, Split, StreamOp};
use lnn::dtype::DType;
use lnn::error::{Error, Result};
use lnn::image::ImageVector;
use lnn::net::{INPUT_CELLS, OUTPUT_CELLS};
use log::debug;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

pub const IMAGE_MAGIC: u32 = 2051;
pub const LABEL_MAGIC: u32 = 2049;
pub const IMAGE_ROWS: u32 = 28;
pub const IMAGE_COLS: u32 = 28;

const IMAGE_HEADER_LEN: u64 = 16;
const LABEL_HEADER_LEN: u64 = 8;

pub struct IdxImageStream<R = BufReader<File>> {
    split: Split,
    reader: Option<R>,
    count: usize,
    pos: usize,
}

pub struct IdxLabelStream<R = BufReader<File>> {
    split: Split,
    reader: Option<R>,
    count: usize,
    pos: usize,
}

fn read_u32<R: Read>(reader: &mut R, split: Split, operation: StreamOp) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|e| read_error(e, split, operation))?;
    Ok(u32::from_be_bytes(buf))
}

fn read_error(err: std::io::Error, split: Split, operation: StreamOp) -> Error {
    if err.kind() == ErrorKind::UnexpectedEof {
        Error::Format {
            split,
            operation,
            reason: "unexpected end of file".to_owned(),
        }
    } else {
        Error::Io {
            split,
            operation,
            source: err,
        }
    }
}

fn open_file(path: &Path, split: Split, operation: StreamOp) -> Result<(BufReader<File>, u64)> {
    let file = File::open(path).map_err(|source| Error::Io {
        split,
        operation,
        source,
    })?;
    let len = file
        .metadata()
        .map_err(|source| Error::Io {
            split,
            operation,
            source,
        })?
        .len();
    debug!("opened {} ({len} bytes) for {split} set", path.display());
    Ok((BufReader::new(file), len))
}

fn check_len(
    actual: u64,
    header_len: u64,
    item_len: u64,
    count: usize,
    split: Split,
    operation: StreamOp,
) -> Result<()> {
    let expected = header_len + item_len * count as u64;
    if actual < expected {
        return Err(Error::Format {
            split,
            operation,
            reason: format!(
                "file holds {actual} bytes, header declares {count} items ({expected} bytes)"
            ),
        });
    }
    Ok(())
}

impl IdxImageStream {
    pub fn open<P: AsRef<Path>>(path: P, split: Split) -> Result<Self> {
        let (reader, len) = open_file(path.as_ref(), split, StreamOp::OpenImages)?;
        let stream = Self::from_reader(reader, split)?;
        check_len(len, IMAGE_HEADER_LEN, INPUT_CELLS as u64, stream.count, split, StreamOp::OpenImages)?;
        Ok(stream)
    }
}

impl<R: Read> IdxImageStream<R> {
    /// Reads and validates the header from `reader`.
    pub fn from_reader(mut reader: R, split: Split) -> Result<Self> {
        let op = StreamOp::OpenImages;
        let magic = read_u32(&mut reader, split, op)?;
        if magic != IMAGE_MAGIC {
            return Err(Error::Format {
                split,
                operation: op,
                reason: format!("invalid image file magic number {magic}, expected {IMAGE_MAGIC}"),
            });
        }
        let count = read_u32(&mut reader, split, op)? as usize;
        let rows = read_u32(&mut reader, split, op)?;
        let cols = read_u32(&mut reader, split, op)?;
        if rows != IMAGE_ROWS || cols != IMAGE_COLS {
            return Err(Error::Format {
                split,
                operation: op,
                reason: format!("image size {rows}x{cols}, expected {IMAGE_ROWS}x{IMAGE_COLS}"),
            });
        }
        debug!("{split} image header: {count} images of {rows}x{cols}");
        Ok(IdxImageStream {
            split,
            reader: Some(reader),
            count,
            pos: 0,
        })
    }

    /// Number of images declared by the header.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Reads the raw pixels of the next image.
    pub fn next_pixels(&mut self) -> Result<[u8; INPUT_CELLS]> {
        let op = StreamOp::NextImage;
        let reader = match self.reader.as_mut() {
            Some(reader) if self.pos < self.count => reader,
            _ => {
                return Err(Error::EndOfStream {
                    split: self.split,
                    operation: op,
                    index: self.pos,
                });
            }
        };
        let mut pixels = [0u8; INPUT_CELLS];
        reader
            .read_exact(&mut pixels)
            .map_err(|e| read_error(e, self.split, op))?;
        self.pos += 1;
        Ok(pixels)
    }
}

impl<R> DataStream for IdxImageStream<R> {
    fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!("closed {} image stream after {} images", self.split, self.pos);
        }
    }
}

impl<T: DType, R: Read> ImageStream<T> for IdxImageStream<R> {
    fn next_image(&mut self) -> Result<ImageVector<T>> {
        ImageVector::binarized(&self.next_pixels()?)
    }
}

impl IdxLabelStream {
    pub fn open<P: AsRef<Path>>(path: P, split: Split) -> Result<Self> {
        let (reader, len) = open_file(path.as_ref(), split, StreamOp::OpenLabels)?;
        let stream = Self::from_reader(reader, split)?;
        check_len(len, LABEL_HEADER_LEN, 1, stream.count, split, StreamOp::OpenLabels)?;
        Ok(stream)
    }
}

impl<R: Read> IdxLabelStream<R> {
    pub fn from_reader(mut reader: R, split: Split) -> Result<Self> {
        let op = StreamOp::OpenLabels;
        let magic = read_u32(&mut reader, split, op)?;
        if magic != LABEL_MAGIC {
            return Err(Error::Format {
                split,
                operation: op,
                reason: format!("invalid label file magic number {magic}, expected {LABEL_MAGIC}"),
            });
        }
        let count = read_u32(&mut reader, split, op)? as usize;
        debug!("{split} label header: {count} labels");
        Ok(IdxLabelStream {
            split,
            reader: Some(reader),
            count,
            pos: 0,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl<R> DataStream for IdxLabelStream<R> {
    fn close(&mut self) {
        if self.reader.take().is_some() {
            debug!("closed {} label stream after {} labels", self.split, self.pos);
        }
    }
}

impl<R: Read> LabelStream for IdxLabelStream<R> {
    fn next_label(&mut self) -> Result<usize> {
        let op = StreamOp::NextLabel;
        let reader = match self.reader.as_mut() {
            Some(reader) if self.pos < self.count => reader,
            _ => {
                return Err(Error::EndOfStream {
                    split: self.split,
                    operation: op,
                    index: self.pos,
                });
            }
        };
        let mut buf = [0u8; 1];
        reader
            .read_exact(&mut buf)
            .map_err(|e| read_error(e, self.split, op))?;
        let label = buf[0] as usize;
        if label >= OUTPUT_CELLS {
            return Err(Error::Format {
                split: self.split,
                operation: op,
                reason: format!("label {label} at index {} is not a digit", self.pos),
            });
        }
        self.pos += 1;
        Ok(label)
    }
}
