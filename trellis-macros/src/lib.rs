//! Procedural macros for Trellis.
//!
//! - `#[interface]` - Attribute macro turning a trait into a routable interface

use proc_macro::TokenStream;

mod interface;

/// Turn a trait into an interface whose methods a `MethodDispatcher` can route.
///
/// The macro keeps the trait and adds:
///
/// - `Send + Sync` supertraits;
/// - `impl trellis::Interface for dyn Trait`, describing every method;
/// - `impl<T: Trait> trellis::Upcast<T> for dyn Trait`;
/// - `impl Trait for trellis::Composite`, dispatching every call.
///
/// Every other supertrait must itself be an `#[interface]`.
///
/// # Arguments
///
/// - `name = "..."`: the interface name used in diagnostics (defaults to the
///   trait name).
///
/// # Example
///
/// ```rust,ignore
/// #[trellis::interface]
/// pub trait Greeter: Named {
///     fn greet(&self, whom: String) -> String;
///
///     fn shout(&self, whom: String) -> String {
///         self.greet(whom).to_uppercase()
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn interface(attr: TokenStream, item: TokenStream) -> TokenStream {
    interface::interface_impl(attr, item)
}
