use thiserror::Error;

/// Recoverable errors raised by running Epsilon code.
///
/// Every variant names the class and selector it was raised from so the
/// driver can report it once with full context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("{receiver} did not understand {selector}")]
    MessageNotUnderstood {
        receiver: String,
        class: String,
        selector: String,
    },
    #[error("No body defined for method {class}::{selector}")]
    MissingBody { class: String, selector: String },
    #[error("{class}::{selector} applied to illegal object")]
    TypeMismatch { class: String, selector: String },
    #[error("Division by zero in {class}::{selector}")]
    DivisionByZero { class: String, selector: String },
    #[error("Index out of range in {class}::{selector}")]
    IndexOutOfRange { class: String, selector: String },
    #[error("Argument out of domain in {class}::{selector}")]
    Domain { class: String, selector: String },
    #[error("Too many parameters to block")]
    BlockArity {
        class: String,
        selector: String,
        expected: usize,
        given: usize,
    },
    #[error("{message}")]
    Signaled {
        class: String,
        selector: String,
        message: String,
    },
    #[error("{class}::{selector}: {reason}")]
    Failed {
        class: String,
        selector: String,
        reason: &'static str,
    },
}

impl RuntimeError {
    pub fn class(&self) -> &str {
        match self {
            Self::MessageNotUnderstood { class, .. }
            | Self::MissingBody { class, .. }
            | Self::TypeMismatch { class, .. }
            | Self::DivisionByZero { class, .. }
            | Self::IndexOutOfRange { class, .. }
            | Self::Domain { class, .. }
            | Self::BlockArity { class, .. }
            | Self::Signaled { class, .. }
            | Self::Failed { class, .. } => class,
        }
    }

    pub fn selector(&self) -> &str {
        match self {
            Self::MessageNotUnderstood { selector, .. }
            | Self::MissingBody { selector, .. }
            | Self::TypeMismatch { selector, .. }
            | Self::DivisionByZero { selector, .. }
            | Self::IndexOutOfRange { selector, .. }
            | Self::Domain { selector, .. }
            | Self::BlockArity { selector, .. }
            | Self::Signaled { selector, .. }
            | Self::Failed { selector, .. } => selector,
        }
    }
}

/// Raised by the activation stack when asked for a record it does not have.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("Stack underflow")]
pub struct StackUnderflow;

/// Aborts on a violated interpreter invariant. These are bugs in the engine,
/// never errors in the program being run.
#[track_caller]
pub fn internal_error(reason: impl std::fmt::Display) -> ! {
    panic!("internal error: {reason}")
}
