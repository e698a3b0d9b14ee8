//! # Interface Introspection
//!
//! Rust has no runtime reflection, so the facts the composer needs about an
//! interface are recorded up front in descriptors:
//!
//! - which methods an interface declares, directly or through its supertraits
//!   ([`InterfaceDescriptor::methods`]);
//! - whether one interface extends another
//!   ([`InterfaceDescriptor::is_assignable_from`]);
//! - how to invoke a method on a [`Target`] and how to run its default body on
//!   a [`Composite`] ([`MethodDescriptor`]).
//!
//! An interface is a trait object type such as `dyn Greeter` implementing
//! [`Interface`]. Descriptors are normally generated by the `#[interface]`
//! attribute macro, but can be written by hand.

use crate::{
    composite::Composite,
    error::InvokeError,
    signature::{Signature, TypeKey},
    target::{Capabilities, Target},
    value::{Args, Outcome},
};
use bitflags::bitflags;
use std::{any::TypeId, fmt, sync::Arc};

/// Invokes a method on a target.
pub type Invoker = fn(&Target, Args) -> Result<Outcome, InvokeError>;

/// Runs an interface-supplied default body with a composite as receiver.
pub type DefaultBody = fn(&Composite, Args) -> Result<Outcome, InvokeError>;

/// A trait object type whose methods can be routed.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a routable interface",
    label = "missing `Interface` implementation",
    note = "Annotate the trait with `#[trellis::interface]` and use it as `dyn Trait`."
)]
pub trait Interface: Send + Sync + 'static {
    /// Name of the interface.
    const NAME: &'static str;

    /// The interface's descriptor.
    fn descriptor() -> &'static InterfaceDescriptor;
}

/// Coerces a concrete implementation into the interface's trait object.
///
/// Implemented for `dyn Trait` for every `T: Trait`.
pub trait Upcast<T: ?Sized>: Interface {
    /// Coerce `value` into the trait object.
    fn upcast(value: Arc<T>) -> Arc<Self>;

    /// Record this interface and all of its super-interfaces as capabilities
    /// of `value`.
    fn register(value: &Arc<T>, capabilities: &mut Capabilities);
}

bitflags! {
    /// Properties of a described method.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodFlags: u8 {
        /// The interface supplies a default body.
        const PROVIDED = 1;
        /// The declared return type is a `Result`.
        const FALLIBLE = 1 << 1;
    }
}

/// The type declaring a method.
#[derive(Clone, Copy)]
pub enum Owner {
    /// An interface.
    Interface {
        /// Identity of `dyn Trait`.
        key: TypeKey,
        /// Interface name.
        name: &'static str,
        /// Accessor for the interface's descriptor.
        descriptor: fn() -> &'static InterfaceDescriptor,
    },
    /// A concrete type (an inherent method).
    Concrete {
        /// Identity of the type.
        key: TypeKey,
    },
}

impl Owner {
    /// Owner for interface `I`.
    pub fn interface<I: Interface + ?Sized>() -> Self {
        Owner::Interface {
            key: TypeKey::of::<I>(),
            name: I::NAME,
            descriptor: I::descriptor,
        }
    }

    /// Owner for concrete type `T`.
    pub fn concrete<T: 'static>() -> Self {
        Owner::Concrete {
            key: TypeKey::of::<T>(),
        }
    }

    /// The owner's name.
    pub fn name(&self) -> &'static str {
        match self {
            Owner::Interface { name, .. } => name,
            Owner::Concrete { key } => key.name(),
        }
    }

    /// The owner's identity.
    pub fn id(&self) -> TypeId {
        match self {
            Owner::Interface { key, .. } | Owner::Concrete { key } => key.id(),
        }
    }

    /// The descriptor, if the owner is an interface.
    pub fn descriptor(&self) -> Option<&'static InterfaceDescriptor> {
        match self {
            Owner::Interface { descriptor, .. } => Some(descriptor()),
            Owner::Concrete { .. } => None,
        }
    }

    /// Check whether the owner is an interface.
    pub fn is_interface(&self) -> bool {
        matches!(self, Owner::Interface { .. })
    }
}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Interface { name, .. } => write!(f, "interface {name}"),
            Owner::Concrete { key } => write!(f, "type {}", key.name()),
        }
    }
}

/// A described method.
pub struct MethodDescriptor {
    signature: Signature,
    returns: TypeKey,
    owner: Owner,
    flags: MethodFlags,
    invoker: Invoker,
    default_body: Option<DefaultBody>,
}

impl MethodDescriptor {
    /// Start describing a method declared on interface `I`.
    pub fn builder<I: Interface + ?Sized>(name: &'static str, invoker: Invoker) -> MethodBuilder {
        MethodBuilder::new(name, Owner::interface::<I>(), invoker)
    }

    /// Start describing an inherent method of concrete type `T`.
    ///
    /// Such methods can be described and invoked, but never routed.
    pub fn concrete<T: 'static>(name: &'static str, invoker: Invoker) -> MethodBuilder {
        MethodBuilder::new(name, Owner::concrete::<T>(), invoker)
    }

    /// The method name.
    pub fn name(&self) -> &'static str {
        self.signature.name()
    }

    /// The structural key of the method.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The declared return type.
    pub fn returns(&self) -> TypeKey {
        self.returns
    }

    /// The declaring type.
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// The method's flags.
    pub fn flags(&self) -> MethodFlags {
        self.flags
    }

    /// Check whether the interface supplies a default body.
    pub fn is_provided(&self) -> bool {
        self.flags.contains(MethodFlags::PROVIDED)
    }

    /// Invoke the method on `target`.
    pub fn invoke(&self, target: &Target, args: Args) -> Result<Outcome, InvokeError> {
        (self.invoker)(target, args)
    }

    /// Run the default body with `composite` as receiver, if there is one.
    pub fn invoke_default(
        &self,
        composite: &Composite,
        args: Args,
    ) -> Option<Result<Outcome, InvokeError>> {
        self.default_body.map(|body| body(composite, args))
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.owner.name(), self.signature)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("signature", &self.signature)
            .field("returns", &self.returns)
            .field("owner", &self.owner)
            .field("flags", &self.flags)
            .finish()
    }
}

/// Builder for a [`MethodDescriptor`].
pub struct MethodBuilder {
    name: &'static str,
    params: Vec<TypeKey>,
    returns: TypeKey,
    owner: Owner,
    flags: MethodFlags,
    invoker: Invoker,
    default_body: Option<DefaultBody>,
}

impl MethodBuilder {
    fn new(name: &'static str, owner: Owner, invoker: Invoker) -> Self {
        Self {
            name,
            params: Vec::new(),
            returns: TypeKey::of::<()>(),
            owner,
            flags: MethodFlags::empty(),
            invoker,
            default_body: None,
        }
    }

    /// Append a parameter of type `T`.
    pub fn param<T: ?Sized + 'static>(mut self) -> Self {
        self.params.push(TypeKey::of::<T>());
        self
    }

    /// Set the return type.
    pub fn returns<T: ?Sized + 'static>(mut self) -> Self {
        self.returns = TypeKey::of::<T>();
        self
    }

    /// Mark the return type as a `Result`.
    pub fn fallible(mut self) -> Self {
        self.flags |= MethodFlags::FALLIBLE;
        self
    }

    /// Attach the interface-supplied default body.
    pub fn default_body(mut self, body: DefaultBody) -> Self {
        self.default_body = Some(body);
        self.flags |= MethodFlags::PROVIDED;
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> MethodDescriptor {
        MethodDescriptor {
            signature: Signature::new(self.name, self.params),
            returns: self.returns,
            owner: self.owner,
            flags: self.flags,
            invoker: self.invoker,
            default_body: self.default_body,
        }
    }
}

/// A described interface: its super-interfaces and its own methods.
pub struct InterfaceDescriptor {
    key: TypeKey,
    name: &'static str,
    supers: Vec<&'static InterfaceDescriptor>,
    declared: Vec<MethodDescriptor>,
}

impl InterfaceDescriptor {
    /// Start describing interface `I`.
    pub fn builder<I: ?Sized + 'static>(name: &'static str) -> InterfaceBuilder {
        InterfaceBuilder {
            descriptor: InterfaceDescriptor {
                key: TypeKey::of::<I>(),
                name,
                supers: Vec::new(),
                declared: Vec::new(),
            },
        }
    }

    /// The interface name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Identity of `dyn Trait`.
    pub fn id(&self) -> TypeId {
        self.key.id()
    }

    /// Direct super-interfaces.
    pub fn supers(&self) -> &[&'static InterfaceDescriptor] {
        &self.supers
    }

    /// Methods declared directly on this interface.
    pub fn declared(&self) -> &[MethodDescriptor] {
        &self.declared
    }

    /// The `index`-th directly declared method.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range; generated code only uses indices it
    /// emitted itself.
    pub fn method(&self, index: usize) -> &MethodDescriptor {
        &self.declared[index]
    }

    /// A directly declared method by name.
    pub fn method_named(&self, name: &str) -> Option<&MethodDescriptor> {
        self.declared.iter().find(|m| m.name() == name)
    }

    /// This interface followed by every transitive super-interface, each once.
    pub fn lineage(&'static self) -> Vec<&'static InterfaceDescriptor> {
        let mut lineage: Vec<&'static InterfaceDescriptor> = Vec::new();
        let mut pending = vec![self];
        while let Some(next) = pending.pop() {
            if lineage.iter().any(|seen| seen.id() == next.id()) {
                continue;
            }
            lineage.push(next);
            pending.extend(next.supers.iter().rev().copied());
        }
        lineage
    }

    /// Every method of the interface, including inherited ones.
    pub fn methods(&'static self) -> impl Iterator<Item = &'static MethodDescriptor> {
        self.lineage()
            .into_iter()
            .flat_map(|interface| interface.declared.iter())
    }

    /// Check whether `other` is this interface or extends it.
    pub fn is_assignable_from(&self, other: &InterfaceDescriptor) -> bool {
        other.id() == self.id() || other.supers.iter().any(|s| self.is_assignable_from(s))
    }
}

impl fmt::Debug for InterfaceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceDescriptor")
            .field("name", &self.name)
            .field(
                "supers",
                &self.supers.iter().map(|s| s.name).collect::<Vec<_>>(),
            )
            .field("declared", &self.declared)
            .finish()
    }
}

/// Builder for an [`InterfaceDescriptor`].
pub struct InterfaceBuilder {
    descriptor: InterfaceDescriptor,
}

impl InterfaceBuilder {
    /// Add a direct super-interface.
    pub fn extends(mut self, parent: &'static InterfaceDescriptor) -> Self {
        self.descriptor.supers.push(parent);
        self
    }

    /// Add a directly declared method.
    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.descriptor.declared.push(method);
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> InterfaceDescriptor {
        self.descriptor
    }
}
