use thiserror::Error;

/// Rejection of a computation descriptor at bind time.
///
/// Every variant is fatal for the descriptor as a whole: nothing is
/// installed, and a previously installed program stays active untouched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
    #[error("'{symbol}' takes {expected} argument(s), descriptor provides {given}")]
    ArityMismatch { symbol: String, expected: usize, given: usize },
    #[error("index {index} out of range for a {size}-node computation")]
    OutOfRangeIndex { index: i64, size: usize },
    #[error("cycle through node {node}")]
    CyclicGraph { node: usize },
    #[error("malformed descriptor: {0}")]
    MalformedDescriptor(String),
}
