//! Error types for allocation operations

use thiserror::Error;

/// Error type for arena and transaction operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("allocation of {0} bytes failed")]
    AllocationFailed(usize),
    #[error("allocation budget exceeded: requested {requested}, remaining {remaining}")]
    BudgetExceeded { requested: usize, remaining: usize },
    #[error("write out of bounds: {offset}+{len} exceeds size {size}")]
    OutOfBounds {
        offset: usize,
        len: usize,
        size: usize,
    },
}
