//! Bounded FIFO ring buffer with front reinsertion.
//!
//! The queue decouples a fast producer (the forwarding sink) from a slower
//! or batch consumer. It never grows: a full queue rejects the write and the
//! producer has to handle the overload explicitly.

use crate::error::QueueError;

/// A fixed-capacity circular queue.
///
/// Besides the usual [`enqueue`](Self::enqueue)/[`dequeue`](Self::dequeue)
/// pair it supports [`push`](Self::push), which reinserts an item at the
/// front so that it is the very next item dequeued. Consumers use this to
/// hand back an item they failed to process.
///
/// Not synchronized; wrap it in a lock for shared use.
///
/// # Examples
///
/// ```
/// use modelsrv::queue::CircularQueue;
///
/// let mut q = CircularQueue::new(3);
/// q.enqueue("a").unwrap();
/// q.enqueue("b").unwrap();
/// q.push("c").unwrap();
/// assert_eq!(q.dequeue().unwrap(), "c");
/// assert_eq!(q.dequeue().unwrap(), "a");
/// assert_eq!(q.dequeue().unwrap(), "b");
/// assert!(q.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct CircularQueue<T> {
    slots: Vec<Option<T>>,
    front: usize,
    rear: usize,
    size: usize,
}

impl<T> CircularQueue<T> {
    /// Creates an empty queue. A capacity of zero is clamped to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            front: 0,
            // one behind front, so the first enqueue lands on slot 0
            rear: capacity - 1,
            size: 0,
        }
    }

    /// Fixed capacity of the queue.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no further item can be added.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.size == self.capacity()
    }

    /// Returns true if the queue holds no item.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of queued items.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.size
    }

    /// Appends an item behind everything already queued.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Full` if the queue is at capacity.
    pub fn enqueue(&mut self, item: T) -> Result<(), QueueError> {
        if self.is_full() {
            return Err(self.full());
        }
        self.rear = (self.rear + 1) % self.capacity();
        self.slots[self.rear] = Some(item);
        self.size += 1;
        Ok(())
    }

    /// Removes and returns the item at the front.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Empty` if nothing is queued.
    pub fn dequeue(&mut self) -> Result<T, QueueError> {
        if self.is_empty() {
            return Err(QueueError::Empty);
        }
        let item = self.slots[self.front].take().ok_or(QueueError::Empty)?;
        self.front = (self.front + 1) % self.capacity();
        self.size -= 1;
        Ok(item)
    }

    /// Reinserts an item ahead of everything already queued.
    ///
    /// Moves `front` one slot backward and stores the item there, so the
    /// next [`dequeue`](Self::dequeue) returns it.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Full` if the queue is at capacity.
    pub fn push(&mut self, item: T) -> Result<(), QueueError> {
        if self.is_full() {
            return Err(self.full());
        }
        let capacity = self.capacity();
        self.front = (self.front + capacity - 1) % capacity;
        self.slots[self.front] = Some(item);
        self.size += 1;
        Ok(())
    }

    /// Returns the item at the front without removing it.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Empty` if nothing is queued.
    pub fn peek(&self) -> Result<&T, QueueError> {
        if self.is_empty() {
            return Err(QueueError::Empty);
        }
        self.slots[self.front].as_ref().ok_or(QueueError::Empty)
    }

    fn full(&self) -> QueueError {
        QueueError::Full {
            capacity: self.capacity(),
        }
    }
}
