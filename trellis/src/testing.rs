//! Testing utilities for Trellis.
//!
//! - [`CallLog`]: a shared, ordered record of calls reaching surrogates
//! - [`dispatch_panic`]: capture the panic of a typed call on a misconfigured
//!   composite

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Mutex, MutexGuard},
};

/// A shared, ordered record of calls.
///
/// Clone it into every surrogate of a composite, then inspect the order in
/// which calls were routed.
///
/// # Example
///
/// ```rust,ignore
/// let log = CallLog::new();
/// let composite = MethodDispatcher::new()
///     .redirect::<dyn Greeter>(Target::new(LoggingGreeter(log.clone())).implementing::<dyn Greeter>())
///     .build::<dyn Greeter>()?;
///
/// composite.greet("ada".into());
/// assert_eq!(log.entries(), vec!["greet(ada)"]);
/// ```
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.lock().push(entry.into());
    }

    /// A copy of the recorded entries.
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget all entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        // A surrogate panicking mid-record leaves the entries intact.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for CallLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.lock().iter()).finish()
    }
}

/// Run `call` and return the message it panicked with, if it panicked.
///
/// Typed calls on a composite panic with the `DispatchError` message when the
/// composite is misconfigured; this turns that into a value to assert on.
pub fn dispatch_panic<R>(call: impl FnOnce() -> R) -> Option<String> {
    let payload = panic::catch_unwind(AssertUnwindSafe(call)).err()?;
    match payload.downcast::<String>() {
        Ok(message) => Some(*message),
        Err(payload) => Some(
            payload
                .downcast_ref::<&'static str>()
                .map(|message| message.to_string())
                .unwrap_or_default(),
        ),
    }
}
