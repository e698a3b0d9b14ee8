//! Structural method identity.
//!
//! A [`Signature`] is a method name plus its ordered parameter types. The
//! return type and the declaring interface are deliberately left out: two
//! interfaces declaring `fn render(&self, width: u16) -> String` share one
//! signature, so a single routing rule answers both.

use std::{
    any::TypeId,
    fmt,
    hash::{Hash, Hasher},
};

/// A runtime type key: `TypeId` for identity, type name for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The type's identity.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The type's name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The structural key of a method: name and ordered parameter types.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    name: &'static str,
    params: Vec<TypeKey>,
}

impl Signature {
    /// Create a signature.
    pub fn new(name: &'static str, params: Vec<TypeKey>) -> Self {
        Self { name, params }
    }

    /// The method name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The parameter types, in order.
    pub fn params(&self) -> &[TypeKey] {
        &self.params
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(param.name())?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
