use crossbeam::queue::ArrayQueue;
use tracing::trace;

/// Fixed-capacity FIFO that rejects new items once full.
///
/// Push and pop never block; any number of producers may push while one
/// consumer pops.
pub struct BoundedQueue<T> {
    name: &'static str,
    inner: ArrayQueue<T>,
}

impl<T> BoundedQueue<T> {
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(name: &'static str, capacity: usize) -> Self {
        if capacity == 0 {
            panic!("{} queue capacity must be greater than 0", name);
        }
        Self {
            name,
            inner: ArrayQueue::new(capacity),
        }
    }

    /// Push without blocking; hands the item back when the queue is full
    pub fn try_push(&self, item: T) -> Result<(), T> {
        self.inner.push(item)?;
        trace!("{} queue length {}/{}", self.name, self.len(), self.capacity());
        Ok(())
    }

    pub fn try_pop(&self) -> Option<T> {
        self.inner.pop()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}
