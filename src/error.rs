use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RopeError {
    /// A position or range fell outside the rope.
    ///
    /// `start..end` is the range the caller asked for. Single position
    /// lookups report `pos..pos + 1`, insertion points report `pos..pos`.
    #[error("{op}: range {start}..{end} out of range for rope of size {size}")]
    OutOfRange { op: &'static str, start: usize, end: usize, size: usize },
}

impl RopeError {
    pub(crate) fn out_of_range(op: &'static str, start: usize, len: usize, size: usize) -> Self {
        Self::OutOfRange { op, start, end: start.saturating_add(len), size }
    }
}

pub type Result<T, E = RopeError> = std::result::Result<T, E>;
