use core::cell::RefCell;

use critical_section::{CriticalSection, Mutex};

/// State shared between the main loop and an interrupt handler.
///
/// The value is placed once with [`Shared::init`] and from then on is only
/// reachable inside a critical section, so a multi-byte read can never be torn
/// by the interrupt that writes it. Before `init` every access yields `None`.
pub struct Shared<T> {
    inner: Mutex<RefCell<Option<T>>>,
}

impl<T> Shared<T> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn init(&self, value: T) {
        critical_section::with(|cs| {
            self.inner.borrow(cs).replace(Some(value));
        });
    }

    /// Runs `f` on the value inside its own critical section.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        critical_section::with(|cs| self.with_cs(cs, f))
    }

    /// Runs `f` on the value inside an already entered critical section.
    pub fn with_cs<R>(&self, cs: CriticalSection<'_>, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.inner.borrow(cs).borrow_mut().as_mut().map(f)
    }
}

impl<T> Default for Shared<T> {
    fn default() -> Self {
        Self::new()
    }
}
