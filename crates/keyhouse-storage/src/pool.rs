//! Scanner Recycling Pool
//!
//! Creating a scanner for a compressed keyfile allocates a decompression
//! buffer sized around one block. Under sustained query load, building a
//! fresh scanner per request would hammer the allocator for no benefit -
//! the buffers are all the same shape.
//!
//! The pool is a bounded, lock-free queue of parked scanner buffers, owned
//! by the reader. [`Scanner::release`](crate::Scanner::release) tears the
//! scanner down to that one reusable allocation and tries a non-blocking
//! enqueue; when the pool is full the buffer is simply dropped.
//! [`KeyFileReader::scanner`](crate::KeyFileReader::scanner) tries a
//! non-blocking dequeue and falls back to fresh construction when the pool
//! is empty. Neither direction ever waits.
//!
//! Capacity 0 disables recycling: every release drops, every acquire
//! constructs fresh.

use crossbeam_queue::ArrayQueue;

/// Bounded, non-blocking recycling queue of scanner buffers.
pub struct ScannerPool {
    parked: Option<ArrayQueue<Vec<u8>>>,
}

impl ScannerPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            parked: (capacity > 0).then(|| ArrayQueue::new(capacity)),
        }
    }

    /// Take a parked buffer, or `None` when the pool is empty or disabled.
    /// The caller falls back to fresh construction; nothing waits.
    pub fn acquire(&self) -> Option<Vec<u8>> {
        self.parked.as_ref()?.pop()
    }

    /// Park a buffer for reuse. On a full or disabled pool the buffer is
    /// dropped; the call never blocks.
    pub fn release(&self, buf: Vec<u8>) {
        if let Some(parked) = &self.parked {
            let _ = parked.push(buf);
        }
    }

    pub fn capacity(&self) -> usize {
        self.parked.as_ref().map_or(0, |q| q.capacity())
    }

    pub fn len(&self) -> usize {
        self.parked.as_ref().map_or(0, |q| q.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_on_empty_pool_is_none() {
        let pool = ScannerPool::new(4);
        assert!(pool.acquire().is_none());
    }

    #[test]
    fn release_then_acquire_returns_same_allocation() {
        let pool = ScannerPool::new(4);
        let mut buf = Vec::with_capacity(1024);
        buf.push(7u8);
        let ptr = buf.as_ptr();

        pool.release(buf);
        let reused = pool.acquire().expect("buffer should be parked");
        assert_eq!(reused.as_ptr(), ptr);
        assert_eq!(reused.capacity(), 1024);
    }

    #[test]
    fn full_pool_drops_instead_of_blocking() {
        let pool = ScannerPool::new(2);
        pool.release(vec![1]);
        pool.release(vec![2]);
        pool.release(vec![3]); // dropped, returns immediately
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn zero_capacity_disables_recycling() {
        let pool = ScannerPool::new(0);
        pool.release(vec![1]);
        assert_eq!(pool.len(), 0);
        assert_eq!(pool.capacity(), 0);
        assert!(pool.acquire().is_none());
    }
}
