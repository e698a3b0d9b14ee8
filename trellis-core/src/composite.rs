//! # Composite
//!
//! The object produced by [`MethodDispatcher::build`]. Every call arriving on
//! one of its interfaces is resolved against a frozen routing table:
//!
//! 1. the call's [`Signature`] selects a [`RoutingRule`], whose bound method
//!    and target answer the call;
//! 2. otherwise the fallback target answers, when it implements the
//!    method's interface;
//! 3. otherwise the interface's default body runs with the composite as
//!    receiver;
//! 4. otherwise the call fails.
//!
//! The rule's result policy is then applied, unless the method reported a
//! failure, which always reaches the caller as-is.
//!
//! [`MethodDispatcher::build`]: crate::MethodDispatcher::build

use crate::{
    dispatcher::RoutingRule,
    error::{DispatchError, InvokeError},
    interface::{Interface, InterfaceDescriptor, MethodDescriptor, Upcast},
    policy::ResultPolicy,
    signature::Signature,
    target::Target,
    value::{Args, Outcome, Value},
};
use std::{any::TypeId, collections::HashMap, fmt, sync::Arc};

/// The frozen state a composite dispatches over.
pub(crate) struct RoutingTable {
    pub(crate) rules: HashMap<Signature, RoutingRule>,
    pub(crate) fallback: Option<Arc<Target>>,
    pub(crate) interfaces: Vec<&'static InterfaceDescriptor>,
}

/// A single object implementing a set of interfaces by routing each call.
///
/// Cloning is cheap; clones share the same routing table.
#[derive(Clone)]
pub struct Composite {
    table: Arc<RoutingTable>,
}

impl Composite {
    pub(crate) fn new(table: RoutingTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    /// Check whether the composite implements interface `I`.
    pub fn implements<I: Interface + ?Sized>(&self) -> bool {
        self.implements_id(TypeId::of::<I>())
    }

    fn implements_id(&self, id: TypeId) -> bool {
        self.table.interfaces.iter().any(|i| i.id() == id)
    }

    /// Names of the implemented interfaces.
    pub fn interfaces(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.interfaces.iter().map(|i| i.name())
    }

    /// The fallback target, if one was set.
    pub fn fallback(&self) -> Option<&Target> {
        self.table.fallback.as_deref()
    }

    /// The rule answering `signature`, if any.
    pub fn rule(&self, signature: &Signature) -> Option<&RoutingRule> {
        self.table.rules.get(signature)
    }

    /// A typed handle on the composite through interface `I`.
    pub fn view<I>(&self) -> Result<Arc<I>, DispatchError>
    where
        I: Upcast<Composite> + ?Sized,
    {
        if !self.implements::<I>() {
            return Err(DispatchError::NotImplemented {
                interface: I::NAME,
                composite: self.to_string(),
            });
        }
        Ok(I::upcast(Arc::new(self.clone())))
    }

    /// Dispatch a call to `method`.
    pub fn call(&self, method: &'static MethodDescriptor, args: Args) -> Result<Value, DispatchError> {
        let result = self.dispatch(method, args);

        #[cfg(feature = "tracing")]
        if let Err(err) = &result {
            tracing::warn!(method = %method, error = %err, "dispatch failed");
        }

        result
    }

    /// Dispatch a call to `method` and return its result as an `R`.
    ///
    /// This is the entry point of the generated interface implementations.
    /// A method declared without a return type discards whatever the routed
    /// call produced.
    ///
    /// # Panics
    ///
    /// Panics with the [`DispatchError`] message if the call cannot be
    /// dispatched or its result is not an `R`. Both indicate a
    /// misconfigured composite; use [`Composite::call`] to handle them.
    pub fn invoke<R: 'static>(&self, method: &'static MethodDescriptor, args: Args) -> R {
        let result = self
            .call(method, args)
            .and_then(|value| typed::<R>(method, value));
        self.expect_typed(result)
    }

    /// Dispatch a call to a method declared to return `Arc<I>`.
    ///
    /// When the result is the composite itself (a [`ResultPolicy::ReturnSelf`]
    /// rule), it is handed back as a view through `I`, so fluent calls keep
    /// dispatching on the composite.
    ///
    /// # Panics
    ///
    /// As [`Composite::invoke`], and when `I` is not implemented by the
    /// returned composite.
    pub fn invoke_view<I>(&self, method: &'static MethodDescriptor, args: Args) -> Arc<I>
    where
        I: Upcast<Composite> + ?Sized,
    {
        let result = self
            .call(method, args)
            .and_then(|value| match value.downcast::<Composite>() {
                Ok(composite) => composite.view::<I>(),
                Err(value) => typed::<Arc<I>>(method, value),
            });
        self.expect_typed(result)
    }

    fn expect_typed<R>(&self, result: Result<R, DispatchError>) -> R {
        match result {
            Ok(value) => value,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::error!(composite = %self, error = %err, "typed call failed");

                panic!("{err}")
            }
        }
    }

    fn dispatch(&self, method: &'static MethodDescriptor, args: Args) -> Result<Value, DispatchError> {
        let owner = method.owner();
        if !self.implements_id(owner.id()) {
            return Err(DispatchError::NotImplemented {
                interface: owner.name(),
                composite: self.to_string(),
            });
        }

        if let Some(rule) = self.table.rules.get(method.signature()) {
            #[cfg(feature = "tracing")]
            tracing::trace!(called = %method, bound = %rule.method(), target = %rule.target(), "routed");

            let outcome = invoke_on(rule.method(), rule.target(), args)?;
            return Ok(self.apply(rule.policy(), outcome));
        }

        self.unrouted(method, args).map(Outcome::into_value)
    }

    fn unrouted(&self, method: &'static MethodDescriptor, args: Args) -> Result<Outcome, DispatchError> {
        let fallback = self.table.fallback.as_deref();

        if let Some(target) = fallback {
            if target.implements(method.owner().id()) || !method.is_provided() {
                #[cfg(feature = "tracing")]
                tracing::trace!(called = %method, target = %target, "fallback");

                return invoke_on(method, target, args);
            }
        }

        match method.invoke_default(self, args) {
            Some(result) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(called = %method, "default body");

                result.map_err(|err| match err {
                    InvokeError::Arguments(source) => DispatchError::Arguments {
                        method: method.to_string(),
                        source,
                    },
                    InvokeError::Unsupported => DispatchError::NoFallback {
                        owner: method.owner().name(),
                        method: method.signature().to_string(),
                    },
                })
            }
            None => Err(DispatchError::NoFallback {
                owner: method.owner().name(),
                method: method.signature().to_string(),
            }),
        }
    }

    fn apply(&self, policy: &ResultPolicy, outcome: Outcome) -> Value {
        match (outcome, policy) {
            (Outcome::Raised(failure), _) => failure,
            (Outcome::Returned(value), ResultPolicy::Passthrough) => value,
            (Outcome::Returned(_), ResultPolicy::ReturnSelf) => Value::new(self.clone()),
            (Outcome::Returned(_), ResultPolicy::ReturnFixed(fixed)) => fixed.get(),
        }
    }
}

/// Unpack a dispatch result as the declared return type `R`.
fn typed<R: 'static>(method: &'static MethodDescriptor, value: Value) -> Result<R, DispatchError> {
    value.downcast::<R>().or_else(|value| {
        Value::unit()
            .downcast::<R>()
            .map_err(|_| DispatchError::ReturnMismatch {
                method: method.to_string(),
                expected: std::any::type_name::<R>(),
                actual: value.type_name(),
            })
    })
}

fn invoke_on(
    method: &'static MethodDescriptor,
    target: &Target,
    args: Args,
) -> Result<Outcome, DispatchError> {
    method.invoke(target, args).map_err(|err| match err {
        InvokeError::Unsupported => DispatchError::WrongTarget {
            expected: method.owner().name(),
            method: method.to_string(),
            actual: target.label().to_string(),
        },
        InvokeError::Arguments(source) => DispatchError::Arguments {
            method: method.to_string(),
            source,
        },
    })
}

impl fmt::Display for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fallback() {
            Some(fallback) => write!(f, "dispatch composite over {fallback}"),
            None => f.write_str("dispatch composite over <none>"),
        }
    }
}

impl fmt::Debug for Composite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("interfaces", &self.interfaces().collect::<Vec<_>>())
            .field("routes", &self.table.rules.len())
            .field("fallback", &self.fallback())
            .finish()
    }
}
