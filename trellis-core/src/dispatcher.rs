//! Registration and build of composites.
//!
//! [`MethodDispatcher`] collects routing rules keyed by [`Signature`] and a
//! fallback target, then validates them and freezes them into a
//! [`Composite`].

use crate::{
    composite::{Composite, RoutingTable},
    error::{BuildError, TrellisError},
    interface::{Interface, InterfaceDescriptor, MethodDescriptor, Upcast},
    policy::ResultPolicy,
    signature::Signature,
    target::Target,
};
use std::{collections::HashMap, fmt, sync::Arc};

/// Binds a signature to the method, target and policy answering it.
#[derive(Clone)]
pub struct RoutingRule {
    method: &'static MethodDescriptor,
    target: Arc<Target>,
    policy: ResultPolicy,
}

impl RoutingRule {
    /// The method actually invoked.
    pub fn method(&self) -> &'static MethodDescriptor {
        self.method
    }

    /// The instance the method is invoked on.
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The post-processing applied to the result.
    pub fn policy(&self) -> &ResultPolicy {
        &self.policy
    }
}

impl fmt::Debug for RoutingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutingRule")
            .field("method", &format_args!("{}", self.method))
            .field("target", &self.target.label())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Builder for [`Composite`]s.
///
/// Register surrogates per interface, optionally set a fallback, then call
/// [`build`](Self::build). A later registration for the same signature
/// replaces the earlier one.
///
/// `build` takes a snapshot: registering more rules afterwards only affects
/// composites built later.
///
/// # Example
///
/// ```rust,ignore
/// let composite = MethodDispatcher::new()
///     .redirect::<dyn Greeter>(Target::new(EnglishGreeter).implementing::<dyn Greeter>())
///     .fallback_on(Target::new(Console).implementing::<dyn Sink>())
///     .build::<dyn Console>()?;
///
/// let console = composite.view::<dyn Console>()?;
/// console.greet("world".into());
/// ```
#[derive(Default)]
pub struct MethodDispatcher {
    rules: HashMap<Signature, RoutingRule>,
    fallback: Option<Arc<Target>>,
}

impl MethodDispatcher {
    /// Create a dispatcher with no rules and no fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route every method of `I` to `surrogate`, passing results through.
    pub fn redirect<I: Interface + ?Sized>(mut self, surrogate: impl Into<Target>) -> Self {
        self.redirect_mut::<I>(surrogate);
        self
    }

    /// Route every method of `I` to `surrogate` (mutable version).
    pub fn redirect_mut<I: Interface + ?Sized>(&mut self, surrogate: impl Into<Target>) {
        self.redirect_with_mut::<I>(surrogate, ResultPolicy::Passthrough);
    }

    /// Route every method of `I` to `surrogate`, returning the composite itself.
    pub fn redirect_returning_self<I: Interface + ?Sized>(
        mut self,
        surrogate: impl Into<Target>,
    ) -> Self {
        self.redirect_returning_self_mut::<I>(surrogate);
        self
    }

    /// Route every method of `I` to `surrogate`, returning the composite
    /// itself (mutable version).
    pub fn redirect_returning_self_mut<I: Interface + ?Sized>(&mut self, surrogate: impl Into<Target>) {
        self.redirect_with_mut::<I>(surrogate, ResultPolicy::ReturnSelf);
    }

    /// Route every method of `I` to `surrogate`, returning a clone of `value`.
    pub fn redirect_returning<I, T>(mut self, surrogate: impl Into<Target>, value: T) -> Self
    where
        I: Interface + ?Sized,
        T: Clone + Send + Sync + 'static,
    {
        self.redirect_returning_mut::<I, T>(surrogate, value);
        self
    }

    /// Route every method of `I` to `surrogate`, returning a clone of `value`
    /// (mutable version).
    pub fn redirect_returning_mut<I, T>(&mut self, surrogate: impl Into<Target>, value: T)
    where
        I: Interface + ?Sized,
        T: Clone + Send + Sync + 'static,
    {
        self.redirect_with_mut::<I>(surrogate, ResultPolicy::fixed(value));
    }

    /// Route every method of `I` to `surrogate` with an explicit policy.
    pub fn redirect_with<I: Interface + ?Sized>(
        mut self,
        surrogate: impl Into<Target>,
        policy: ResultPolicy,
    ) -> Self {
        self.redirect_with_mut::<I>(surrogate, policy);
        self
    }

    /// Route every method of `I` to `surrogate` with an explicit policy
    /// (mutable version).
    pub fn redirect_with_mut<I: Interface + ?Sized>(
        &mut self,
        surrogate: impl Into<Target>,
        policy: ResultPolicy,
    ) {
        let target = Arc::new(surrogate.into());

        #[cfg(feature = "tracing")]
        tracing::debug!(interface = I::NAME, target = %target, ?policy, "redirect");

        for method in I::descriptor().methods() {
            self.insert(method, target.clone(), policy.clone());
        }
    }

    /// Route a single method to `surrogate`.
    pub fn redirect_method(
        mut self,
        method: &'static MethodDescriptor,
        surrogate: impl Into<Target>,
        policy: ResultPolicy,
    ) -> Self {
        self.redirect_method_mut(method, surrogate, policy);
        self
    }

    /// Route a single method to `surrogate` (mutable version).
    pub fn redirect_method_mut(
        &mut self,
        method: &'static MethodDescriptor,
        surrogate: impl Into<Target>,
        policy: ResultPolicy,
    ) {
        self.insert(method, Arc::new(surrogate.into()), policy);
    }

    fn insert(&mut self, method: &'static MethodDescriptor, target: Arc<Target>, policy: ResultPolicy) {
        let rule = RoutingRule {
            method,
            target,
            policy,
        };
        let _replaced = self.rules.insert(method.signature().clone(), rule);

        #[cfg(feature = "tracing")]
        if let Some(replaced) = _replaced {
            tracing::debug!(signature = %method.signature(), previous = %replaced.method, "route replaced");
        }
    }

    /// Answer unrouted calls with `instance`, replacing any previous fallback.
    pub fn fallback_on(mut self, instance: impl Into<Target>) -> Self {
        self.fallback_on_mut(instance);
        self
    }

    /// Answer unrouted calls with `instance` (mutable version).
    pub fn fallback_on_mut(&mut self, instance: impl Into<Target>) {
        self.fallback = Some(Arc::new(instance.into()));
    }

    /// The rule registered for `signature`, if any.
    pub fn rule(&self, signature: &Signature) -> Option<&RoutingRule> {
        self.rules.get(signature)
    }

    /// Check whether a fallback is set.
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validate the rules and build a composite implementing `I`.
    ///
    /// Every routed method must be declared on an interface, and `I` must be
    /// or extend each such interface. The composite implements `I`, its
    /// super-interfaces and the owners of every routed method.
    pub fn build<I: Interface + ?Sized>(&self) -> Result<Composite, BuildError> {
        let requested = I::descriptor();

        for rule in self.rules.values() {
            let owner = rule.method.owner();
            if !owner.is_interface() {
                return Err(BuildError::UnsupportedRouting {
                    method: rule.method.to_string(),
                    owner: owner.name(),
                });
            }
        }

        let mut interfaces = requested.lineage();
        for rule in self.rules.values() {
            let Some(owner) = rule.method.owner().descriptor() else {
                continue;
            };
            if !owner.is_assignable_from(requested) {
                return Err(BuildError::IncompatibleInterface {
                    requested: requested.name(),
                    owner: owner.name(),
                    method: rule.method.to_string(),
                });
            }
            merge(&mut interfaces, owner);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            interface = I::NAME,
            routes = self.rules.len(),
            fallback = self.fallback.is_some(),
            "composite built"
        );

        Ok(Composite::new(RoutingTable {
            rules: self.rules.clone(),
            fallback: self.fallback.clone(),
            interfaces,
        }))
    }

    /// Build a composite implementing `I` and return it viewed through `I`.
    pub fn build_view<I>(&self) -> Result<Arc<I>, TrellisError>
    where
        I: Upcast<Composite> + ?Sized,
    {
        Ok(self.build::<I>()?.view::<I>()?)
    }
}

fn merge(interfaces: &mut Vec<&'static InterfaceDescriptor>, owner: &'static InterfaceDescriptor) {
    for interface in owner.lineage() {
        if !interfaces.iter().any(|known| known.id() == interface.id()) {
            interfaces.push(interface);
        }
    }
}

impl fmt::Debug for MethodDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDispatcher")
            .field("rules", &self.rules.values().collect::<Vec<_>>())
            .field("fallback", &self.fallback)
            .finish()
    }
}
