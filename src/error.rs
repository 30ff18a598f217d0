//! Error taxonomy for the programmatic surface.
//!
//! All errors here are raised synchronously at the call that violates a
//! contract; nothing is deferred into propagation. Panics thrown by user
//! productions are not part of this taxonomy — they unwind through the
//! scheduler to the caller (see [`Signal::set`](crate::Signal::set)).

use thiserror::Error;

/// An invalid use of the signal API.
///
/// The original runtime distinguishes four malformed-`link` cases at run
/// time. Against a typed API two of them (a missing production function,
/// inputs that are not a sequence) cannot be expressed at all; the two that
/// remain get a variant each, alongside the write-to-derivation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// `link` was called with an empty input slice.
    #[error("\"inputs\" is empty")]
    EmptyInputs,
    /// An input signal belongs to a different runtime.
    #[error("\"inputs\" contains a signal from a different runtime")]
    ForeignInput,
    /// A write was attempted on a derivation.
    #[error("read-only signal")]
    ReadOnly,
}
