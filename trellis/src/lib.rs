//! # trellis - Method-Dispatch Composer
//!
//! `trellis` builds a single object implementing an arbitrary set of
//! interfaces, whose methods are individually routed to different backing
//! instances, with a fallback instance for anything not routed.
//!
//! Routing is keyed on a method's *structural* signature (name and parameter
//! types), so a method reachable through several interfaces resolves to one
//! rule.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use trellis::{MethodDispatcher, Target, interface};
//!
//! #[interface]
//! pub trait Greeter {
//!     fn greet(&self, whom: String) -> String;
//! }
//!
//! #[interface]
//! pub trait Sink {
//!     fn accept(&self, value: i32);
//! }
//!
//! #[interface]
//! pub trait Console: Greeter + Sink {}
//!
//! let composite = MethodDispatcher::new()
//!     .redirect::<dyn Greeter>(Target::new(English).implementing::<dyn Greeter>())
//!     .fallback_on(Target::new(Stdout).implementing::<dyn Sink>())
//!     .build::<dyn Console>()?;
//!
//! let console = composite.view::<dyn Console>()?;
//! console.greet("world".into()); // answered by `English`
//! console.accept(5);             // answered by `Stdout`
//! ```
//!
//! ## Features
//!
//! - `macros` (default): the `#[interface]` attribute macro.
//! - `tracing`: log registration, builds and dispatch decisions with `tracing`.

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Interfaces
pub use trellis_core::{
    DefaultBody, Interface, InterfaceBuilder, InterfaceDescriptor, Invoker, MethodBuilder,
    MethodDescriptor, MethodFlags, Owner, Signature, TypeKey, Upcast,
};

// Targets and values
pub use trellis_core::{Args, Capabilities, Outcome, Target, TargetBuilder, Value};

// Dispatch
pub use trellis_core::{Composite, FixedValue, MethodDispatcher, ResultPolicy, RoutingRule};

// Errors
pub use trellis_core::{ArgumentError, BuildError, DispatchError, InvokeError, TrellisError};

pub mod testing;

/// Prelude module - common imports for Trellis.
///
/// # Usage
///
/// ```rust,ignore
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BuildError, Composite, DispatchError, Interface, MethodDispatcher, ResultPolicy, Target,
        TrellisError,
    };

    #[cfg(feature = "macros")]
    pub use crate::interface;
}

#[cfg(feature = "macros")]
pub use trellis_macros::interface;
