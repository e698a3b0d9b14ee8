//! Type-erased values flowing through a dispatch.
//!
//! Arguments travel as an [`Args`] list and results come back as an
//! [`Outcome`], both built from [`Value`]s. Invokers unpack them with the
//! static types of the bound method, so a mismatch is reported as an
//! [`ArgumentError`] instead of a bad cast.

use crate::error::ArgumentError;
use std::{any::Any, collections::VecDeque, fmt};

/// An owned, type-erased value that remembers its type name.
pub struct Value {
    inner: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Value {
    /// Erase `value`.
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The unit value, produced by methods without a return type.
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Name of the erased type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check whether the erased value is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the erased value as a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Recover the erased value.
    ///
    /// Returns `Err(self)` if the value is not a `T`.
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        self.inner
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|inner| Self { inner, type_name })
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&self.type_name).finish()
    }
}

/// An ordered argument list for a single call.
///
/// # Example
///
/// ```rust
/// use trellis_core::Args;
///
/// let mut args = Args::new().with(String::from("hi")).with(3_u32);
/// let text: String = args.take().unwrap();
/// let count: u32 = args.take().unwrap();
/// args.finish().unwrap();
/// assert_eq!((text.as_str(), count), ("hi", 3));
/// ```
#[derive(Debug, Default)]
pub struct Args {
    values: VecDeque<Value>,
    taken: usize,
}

impl Args {
    /// Create an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an argument.
    pub fn with<T: Send + 'static>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    /// Append an argument (mutable version).
    pub fn push<T: Send + 'static>(&mut self, value: T) {
        self.values.push_back(Value::new(value));
    }

    /// Append an already erased argument.
    pub fn push_value(&mut self, value: Value) {
        self.values.push_back(value);
    }

    /// Number of arguments not taken yet.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if every argument has been taken.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Take the next argument as a `T`.
    pub fn take<T: 'static>(&mut self) -> Result<T, ArgumentError> {
        let index = self.taken;
        let value = self
            .values
            .pop_front()
            .ok_or(ArgumentError::Missing { index })?;
        self.taken += 1;
        value.downcast::<T>().map_err(|value| ArgumentError::TypeMismatch {
            index,
            expected: std::any::type_name::<T>(),
            actual: value.type_name(),
        })
    }

    /// Ensure every argument was consumed.
    pub fn finish(self) -> Result<(), ArgumentError> {
        match self.values.len() {
            0 => Ok(()),
            count => Err(ArgumentError::Surplus { count }),
        }
    }
}

/// What an invoked method produced.
#[derive(Debug)]
pub enum Outcome {
    /// The method completed normally.
    Returned(Value),
    /// The method reported a failure (an `Err` from a `Result`-returning method).
    ///
    /// A raised value reaches the caller as-is, whatever the result policy.
    Raised(Value),
}

impl Outcome {
    /// A normal return of `value`.
    pub fn returned<T: Send + 'static>(value: T) -> Self {
        Outcome::Returned(Value::new(value))
    }

    /// Classify the result of a fallible method.
    ///
    /// The whole `Result` is kept, so the caller receives exactly what the
    /// method returned.
    pub fn from_result<T, E>(result: Result<T, E>) -> Self
    where
        T: Send + 'static,
        E: Send + 'static,
    {
        if result.is_err() {
            Outcome::Raised(Value::new(result))
        } else {
            Outcome::Returned(Value::new(result))
        }
    }

    /// Check whether the method reported a failure.
    pub fn is_raised(&self) -> bool {
        matches!(self, Outcome::Raised(_))
    }

    /// The produced value, whatever its classification.
    pub fn into_value(self) -> Value {
        match self {
            Outcome::Returned(value) | Outcome::Raised(value) => value,
        }
    }
}
