//! Result policies applied to routed calls.

use crate::value::Value;
use std::{fmt, sync::Arc};

/// What a routed call hands back to its caller.
#[derive(Clone, Default)]
pub enum ResultPolicy {
    /// The routed method's own result.
    #[default]
    Passthrough,
    /// The composite itself, enabling fluent chains across surrogates.
    ReturnSelf,
    /// A caller-supplied value.
    ReturnFixed(FixedValue),
}

impl ResultPolicy {
    /// Policy returning a clone of `value` on every call.
    pub fn fixed<T: Clone + Send + Sync + 'static>(value: T) -> Self {
        ResultPolicy::ReturnFixed(FixedValue::new(value))
    }
}

impl fmt::Debug for ResultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultPolicy::Passthrough => f.write_str("Passthrough"),
            ResultPolicy::ReturnSelf => f.write_str("ReturnSelf"),
            ResultPolicy::ReturnFixed(fixed) => f.debug_tuple("ReturnFixed").field(fixed).finish(),
        }
    }
}

/// A value produced afresh for every call.
#[derive(Clone)]
pub struct FixedValue {
    make: Arc<dyn Fn() -> Value + Send + Sync>,
    type_name: &'static str,
}

impl FixedValue {
    /// Wrap `value`.
    pub fn new<T: Clone + Send + Sync + 'static>(value: T) -> Self {
        Self {
            make: Arc::new(move || Value::new(value.clone())),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// A fresh copy of the value.
    pub fn get(&self) -> Value {
        (self.make)()
    }

    /// Name of the value's type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for FixedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
