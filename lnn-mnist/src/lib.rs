//! MNIST file access and terminal reporting for the `lnn` classifier.

pub mod console;
pub mod idx;
pub mod source;
