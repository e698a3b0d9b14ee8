//! Error types for Trellis.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`TrellisError`] - Top-level error type
//! - [`BuildError`] - Configuration errors detected when a composite is built
//! - [`DispatchError`] - Errors surfaced by a call on a built composite
//! - [`InvokeError`] - Errors reported by a method invoker
//! - [`ArgumentError`] - Argument list mismatches

use thiserror::Error;

/// Top-level error type for all Trellis operations.
#[derive(Error, Debug)]
pub enum TrellisError {
    /// The routing table could not be turned into a composite.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// A call on a composite could not be dispatched.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Errors raised by [`MethodDispatcher::build`](crate::MethodDispatcher::build).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A routed method is declared on a concrete type rather than an interface.
    #[error("cannot route `{method}`: it is declared on concrete type `{owner}`, not an interface")]
    UnsupportedRouting {
        /// The offending method, rendered as a signature.
        method: String,
        /// The concrete type declaring it.
        owner: &'static str,
    },

    /// The requested interface does not extend the owner of a routed method.
    #[error("`{requested}` does not extend `{owner}`, which declares routed method `{method}`")]
    IncompatibleInterface {
        /// The interface passed to `build`.
        requested: &'static str,
        /// The interface declaring the routed method.
        owner: &'static str,
        /// The routed method.
        method: String,
    },
}

/// Errors surfaced to the caller of a [`Composite`](crate::Composite).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No rule matched and nothing else can answer the call.
    #[error("no route and no fallback for `{owner}::{method}`")]
    NoFallback {
        /// The interface the call arrived on.
        owner: &'static str,
        /// The invoked method.
        method: String,
    },

    /// The selected target does not implement the interface declaring the method.
    #[error("expected a target implementing `{expected}` to invoke `{method}`, got `{actual}`")]
    WrongTarget {
        /// The interface the target should implement.
        expected: &'static str,
        /// The method that was about to be invoked.
        method: String,
        /// Label of the target that was selected.
        actual: String,
    },

    /// The call arrived through an interface the composite was not built for.
    #[error("`{composite}` does not implement `{interface}`")]
    NotImplemented {
        /// The interface of the invoked method.
        interface: &'static str,
        /// The composite's display form.
        composite: String,
    },

    /// A typed call received a value of another type than it declares.
    #[error("`{method}` returned `{actual}` where `{expected}` was declared")]
    ReturnMismatch {
        /// The invoked method.
        method: String,
        /// The declared return type.
        expected: &'static str,
        /// The type actually produced.
        actual: &'static str,
    },

    /// The argument list does not fit the bound method.
    #[error("bad arguments for `{method}`: {source}")]
    Arguments {
        /// The bound method.
        method: String,
        /// The underlying mismatch.
        #[source]
        source: ArgumentError,
    },
}

/// Errors reported by a method invoker or default body.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    /// The target does not carry the capability the method needs.
    #[error("target does not implement the declaring type")]
    Unsupported,

    /// The arguments could not be unpacked.
    #[error(transparent)]
    Arguments(#[from] ArgumentError),
}

/// Mismatches between an argument list and a method's parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// Fewer arguments than parameters.
    #[error("missing argument #{index}")]
    Missing {
        /// Zero-based position of the missing argument.
        index: usize,
    },

    /// An argument of the wrong type.
    #[error("argument #{index} is `{actual}`, expected `{expected}`")]
    TypeMismatch {
        /// Zero-based position of the argument.
        index: usize,
        /// The parameter type.
        expected: &'static str,
        /// The argument's type.
        actual: &'static str,
    },

    /// More arguments than parameters.
    #[error("{count} surplus argument(s)")]
    Surplus {
        /// Number of arguments left over.
        count: usize,
    },
}
