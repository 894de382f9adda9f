use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::net::OUTPUT_CELLS;

/// One-hot encoding of a class label.
pub type TargetVector<T> = [T; OUTPUT_CELLS];

/// Fails unless `label` is a class index in [0, OUTPUT_CELLS).
pub fn check_label(label: usize) -> Result<()> {
    if label >= OUTPUT_CELLS {
        return Err(Error::InvalidArgument(format!(
            "label {label} is not a class index in [0, {OUTPUT_CELLS})"
        )));
    }
    Ok(())
}

/// Returns a vector with `label` set to 1 and all other entries set to 0.
pub fn target_output<T: DType>(label: usize) -> Result<TargetVector<T>> {
    check_label(label)?;
    Ok(std::array::from_fn(|i| if i == label { T::ONE } else { T::ZERO }))
}
