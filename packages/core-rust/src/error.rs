//! Construction-time errors.

/// A composition was requested with a missing constituent.
///
/// Only the `try_*` constructors can observe a missing reference; each
/// variant names the call that rejected it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    #[error("{call}: operation is missing")]
    MissingOperation { call: &'static str },
    #[error("{call}: exception handler is missing")]
    MissingHandler { call: &'static str },
    #[error("{call}: operation list is missing")]
    MissingList { call: &'static str },
    #[error("{call}: operation at index {index} is missing")]
    MissingElement { call: &'static str, index: usize },
}
