//! # trellis-core
//!
//! Core model and dispatch engine for the Trellis method-dispatch composer.
//!
//! This crate has minimal dependencies and can be used without the
//! `#[interface]` macro by describing interfaces by hand.
//!
//! # Overview
//!
//! A [`MethodDispatcher`] builds a single [`Composite`] object implementing a
//! set of interfaces, whose methods are individually routed to different
//! backing instances, with a fallback instance for everything not routed.
//!
//! - **Interfaces** ([`Interface`], [`InterfaceDescriptor`]): trait object
//!   types with their methods and super-interfaces described up front.
//! - **Signatures** ([`Signature`]): a method's name and parameter types.
//!   Routing is keyed on signatures, never on the declaring interface, so a
//!   method inherited through several interfaces resolves to one rule.
//! - **Targets** ([`Target`]): instances together with the interfaces they
//!   implement.
//! - **Policies** ([`ResultPolicy`]): what a routed call hands back.
//!
//! # Error Types
//!
//! - [`TrellisError`] - Top-level error type
//! - [`BuildError`] - Invalid routing tables
//! - [`DispatchError`] - Failed calls on a composite

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod composite;
mod dispatcher;
mod error;
mod interface;
mod policy;
mod signature;
mod target;
mod value;

#[cfg(test)]
mod fixtures;

// Re-exports
pub use composite::Composite;
pub use dispatcher::{MethodDispatcher, RoutingRule};
pub use error::{ArgumentError, BuildError, DispatchError, InvokeError, TrellisError};
pub use interface::{
    DefaultBody, Interface, InterfaceBuilder, InterfaceDescriptor, Invoker, MethodBuilder,
    MethodDescriptor, MethodFlags, Owner, Upcast,
};
pub use policy::{FixedValue, ResultPolicy};
pub use signature::{Signature, TypeKey};
pub use target::{Capabilities, Target, TargetBuilder};
pub use value::{Args, Outcome, Value};
