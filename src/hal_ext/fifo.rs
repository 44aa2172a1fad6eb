use core::cell::RefCell;

use critical_section::Mutex;

/// Bounded byte FIFO
///
/// Circular buffer with explicit element count, so all `N` slots are usable.
/// Failed [`Self::put`]/[`Self::get`] never modify the queue.
pub struct ByteQueue<const N: usize> {
    buf: [u8; N],
    head: usize,
    tail: usize,
    count: usize,
}

impl<const N: usize> ByteQueue<N> {
    const NONZERO: () = assert!(N > 0, "ByteQueue capacity must be non-zero");

    pub const fn new() -> Self {
        let _ = Self::NONZERO;
        Self { buf: [0; N], head: 0, tail: 0, count: 0 }
    }

    /// Reset the queue to empty state, discarding any data
    pub fn init(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    /// Push a byte at the tail; returns `false` if the queue is full
    pub fn put(&mut self, byte: u8) -> bool {
        if self.count == N {
            return false;
        }
        self.buf[self.tail] = byte;
        self.tail = Self::advance(self.tail);
        self.count += 1;
        true
    }

    /// Pop the oldest byte
    pub fn get(&mut self) -> Option<u8> {
        if self.count == 0 {
            return None;
        }
        let byte = self.buf[self.head];
        self.head = Self::advance(self.head);
        self.count -= 1;
        Some(byte)
    }

    /// Push all bytes or none of them
    pub fn put_all(&mut self, data: &[u8]) -> bool {
        if data.len() > self.free() {
            return false;
        }
        for &byte in data {
            self.put(byte);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn is_full(&self) -> bool {
        self.count == N
    }

    /// Number of bytes that can still be pushed
    pub fn free(&self) -> usize {
        N - self.count
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    const fn advance(idx: usize) -> usize {
        if idx == N - 1 { 0 } else { idx + 1 }
    }
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// [`ByteQueue`] shared between interrupt and main-loop contexts
///
/// Each operation runs inside a single critical section, so the queue can be
/// placed in a `static` and used through `&self` by one producer and one consumer.
pub struct SharedQueue<const N: usize> {
    inner: Mutex<RefCell<ByteQueue<N>>>,
}

impl<const N: usize> SharedQueue<N> {
    pub const fn new() -> Self {
        Self { inner: Mutex::new(RefCell::new(ByteQueue::new())) }
    }

    fn with<R>(&self, f: impl FnOnce(&mut ByteQueue<N>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    pub fn init(&self) {
        self.with(|q| q.init())
    }

    pub fn put(&self, byte: u8) -> bool {
        self.with(|q| q.put(byte))
    }

    pub fn get(&self) -> Option<u8> {
        self.with(|q| q.get())
    }

    pub fn put_all(&self, data: &[u8]) -> bool {
        self.with(|q| q.put_all(data))
    }

    pub fn len(&self) -> usize {
        self.with(|q| q.len())
    }

    pub fn is_empty(&self) -> bool {
        self.with(|q| q.is_empty())
    }

    pub fn free(&self) -> usize {
        self.with(|q| q.free())
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for SharedQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
