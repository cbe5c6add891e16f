//! Error types for simjoin.

use crate::{Dataset, Scalar};

/// Errors that can occur while building a dataset or running a join.
#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    /// A parameter or input violates a precondition of the operation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// The two joined datasets have a different number of columns.
    #[error("Dimension mismatch: left has {left} columns, right has {right}")]
    DimensionMismatch {
        /// Columns of the first dataset.
        left: usize,
        /// Columns of the second dataset.
        right: usize,
    },
    /// A row of delimited text could not be parsed.
    #[error("Parse error at line {line}: {message}")]
    Parse {
        /// 1-based line number in the input.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// Reading the input failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, JoinError>;

pub(crate) fn check_radius(eps: Scalar) -> Result<()> {
    if eps.is_finite() && eps > 0. {
        Ok(())
    } else {
        Err(JoinError::InvalidArgument(format!(
            "radius must be a positive finite number, got {}",
            eps
        )))
    }
}

/// Checks that two datasets can be joined and each has at least `min_rows` rows.
pub(crate) fn check_inputs(a: &Dataset, b: &Dataset, min_rows: usize) -> Result<()> {
    for (side, data) in [("left", a), ("right", b)].iter() {
        if data.num_rows() < min_rows {
            return Err(JoinError::InvalidArgument(format!(
                "{} dataset needs at least {} rows, got {}",
                side,
                min_rows,
                data.num_rows()
            )));
        }
    }

    if a.num_cols() != b.num_cols() {
        return Err(JoinError::DimensionMismatch {
            left: a.num_cols(),
            right: b.num_cols(),
        });
    }

    Ok(())
}
