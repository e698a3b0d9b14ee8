//! Routed and fallback instances.
//!
//! A [`Target`] holds an instance together with the interfaces it was declared
//! to implement. Invokers look the interface up with
//! [`Target::capability`]; a missing capability is what turns into a
//! `WrongTarget` error at call time.

use crate::interface::{Interface, Upcast};
use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::Arc,
};

/// Interface views of one instance, keyed by the interface's `TypeId`.
#[derive(Default)]
pub struct Capabilities {
    views: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    names: Vec<&'static str>,
}

impl Capabilities {
    /// Record `view` as the instance seen through interface `I`.
    ///
    /// Returns `false` if `I` was already recorded.
    pub fn insert<I: Interface + ?Sized>(&mut self, view: Arc<I>) -> bool {
        let id = TypeId::of::<I>();
        if self.views.contains_key(&id) {
            return false;
        }
        self.views.insert(id, Box::new(view));
        self.names.push(I::NAME);
        true
    }

    /// The instance seen through interface `I`.
    pub fn get<I: Interface + ?Sized>(&self) -> Option<&Arc<I>> {
        self.views
            .get(&TypeId::of::<I>())
            .and_then(|view| view.downcast_ref::<Arc<I>>())
    }

    /// Check whether the interface with identity `id` was recorded.
    pub fn contains(&self, id: TypeId) -> bool {
        self.views.contains_key(&id)
    }

    /// Names of the recorded interfaces, in registration order.
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Number of recorded interfaces.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    /// Check if no interface was recorded.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

/// An instance calls can be routed to.
///
/// # Example
///
/// ```rust,ignore
/// let target: Target = Target::new(EnglishGreeter)
///     .implementing::<dyn Greeter>()
///     .into();
///
/// // A bare value is a valid target that implements nothing.
/// let opaque: Target = Target::new(42).into();
/// ```
pub struct Target {
    instance: Arc<dyn Any + Send + Sync>,
    label: String,
    capabilities: Capabilities,
}

impl Target {
    /// Start building a target around `value`.
    #[allow(clippy::new_ret_no_self)]
    pub fn new<T: Send + Sync + 'static>(value: T) -> TargetBuilder<T> {
        TargetBuilder::from_arc(Arc::new(value))
    }

    /// Start building a target around an already shared `value`.
    pub fn shared<T: Send + Sync + 'static>(value: Arc<T>) -> TargetBuilder<T> {
        TargetBuilder::from_arc(value)
    }

    /// The instance seen through interface `I`.
    pub fn capability<I: Interface + ?Sized>(&self) -> Option<&Arc<I>> {
        self.capabilities.get::<I>()
    }

    /// Check whether the target implements the interface with identity `id`.
    pub fn implements(&self, id: TypeId) -> bool {
        self.capabilities.contains(id)
    }

    /// The declared capabilities.
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// The instance as its concrete type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.instance.downcast_ref::<T>()
    }

    /// A short description of the instance, used in diagnostics.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("label", &self.label)
            .field("implements", &self.capabilities.names())
            .finish()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Builder for a [`Target`] wrapping a `T`.
pub struct TargetBuilder<T> {
    value: Arc<T>,
    label: String,
    capabilities: Capabilities,
}

impl<T: Send + Sync + 'static> TargetBuilder<T> {
    fn from_arc(value: Arc<T>) -> Self {
        Self {
            value,
            label: std::any::type_name::<T>().to_string(),
            capabilities: Capabilities::default(),
        }
    }

    /// Declare that the instance implements interface `I` (and its supers).
    pub fn implementing<I>(mut self) -> Self
    where
        I: Upcast<T> + ?Sized,
    {
        I::register(&self.value, &mut self.capabilities);
        self
    }

    /// Override the label shown in diagnostics.
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Finish the target.
    pub fn build(self) -> Target {
        Target {
            instance: self.value,
            label: self.label,
            capabilities: self.capabilities,
        }
    }
}

impl<T: Send + Sync + 'static> From<TargetBuilder<T>> for Target {
    fn from(builder: TargetBuilder<T>) -> Self {
        builder.build()
    }
}
