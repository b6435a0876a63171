use crate::clock::{Clock, SystemClock};
use crate::error::*;
use crate::generator::Generator;
use crate::layout::{DecomposedId, Layout};
use std::sync::{Arc, Mutex};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// ConcurrentGenerator shares one [`Generator`] between threads.
///
/// Every `next_id` call runs the whole read-clock, advance-state, pack cycle
/// under a single mutex, so callers observe a total order with no duplicate
/// ids. `clone` it before moving to another thread.
pub struct ConcurrentGenerator<C = SystemClock> {
    layout: Layout,
    inner: Arc<Mutex<Generator<C>>>,
}

impl<C> ConcurrentGenerator<C> {
    pub fn new(generator: Generator<C>) -> Self {
        Self {
            layout: generator.layout(),
            inner: Arc::new(Mutex::new(generator)),
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Break an id produced by this generator up into its parts.
    pub fn decompose(&self, id: u64) -> DecomposedId {
        self.layout.decompose(id)
    }
}

impl<C: Clock> ConcurrentGenerator<C> {
    /// Generate the next unique id.
    ///
    /// Errors of the wrapped generator are passed through unchanged; a
    /// poisoned lock yields [`Error::MutexPoisoned`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<u64, Error> {
        let mut generator = self.inner.lock().map_err(|_| Error::MutexPoisoned)?;
        generator.next_id()
    }
}

/// Returns a new `ConcurrentGenerator` referencing the same state as `self`.
impl<C> Clone for ConcurrentGenerator<C> {
    fn clone(&self) -> Self {
        Self {
            layout: self.layout,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> From<Generator<C>> for ConcurrentGenerator<C> {
    fn from(generator: Generator<C>) -> Self {
        Self::new(generator)
    }
}
