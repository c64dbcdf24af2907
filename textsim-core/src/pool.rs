//! Bump-arena memory pool for kernel scratch space.
//!
//! The edit kernels allocate their DP rows and matrices here so a single
//! call never touches the global allocator more than a handful of times.
//! There is no per-object free: memory is reclaimed on [`MemoryPool::reset`]
//! or drop. The typical pattern is one pool per kernel invocation; a
//! per-thread pool is available as an opt-in for tight loops.

use std::cell::RefCell;

use bumpalo::Bump;

/// Initial arena block size. Covers the DP scratch of typical inputs
/// without growth.
const DEFAULT_POOL_CAPACITY: usize = 64 * 1024;

/// Reusable bump allocator.
pub struct MemoryPool {
    bump: Bump,
}

impl Default for MemoryPool {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPool {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bump: Bump::with_capacity(bytes),
        }
    }

    /// Allocate a zeroed `u32` row for DP scratch.
    #[inline]
    pub fn alloc_row(&self, len: usize) -> &mut [u32] {
        self.bump.alloc_slice_fill_copy(len, 0u32)
    }

    /// Borrow the raw arena for other allocation shapes.
    #[inline]
    pub fn arena(&self) -> &Bump {
        &self.bump
    }

    /// Bytes currently handed out. Individual deallocation is a no-op, so
    /// this only ever grows until [`reset`](Self::reset).
    #[inline]
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Reclaim everything at once, keeping the largest block for reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.bump.reset();
    }
}

thread_local! {
    static LOCAL_POOL: RefCell<MemoryPool> = RefCell::new(MemoryPool::new());
}

/// Run `f` against this thread's pool, reset to empty beforehand.
///
/// Opt-in alternative to a per-call pool for callers issuing many
/// computations on one thread.
pub fn with_thread_local_pool<R>(f: impl FnOnce(&MemoryPool) -> R) -> R {
    LOCAL_POOL.with(|cell| {
        cell.borrow_mut().reset();
        f(&cell.borrow())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_zeroed() {
        let pool = MemoryPool::new();
        let row = pool.alloc_row(16);
        assert_eq!(row.len(), 16);
        assert!(row.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_reset_reclaims() {
        let mut pool = MemoryPool::with_capacity(1024);
        let _ = pool.alloc_row(100);
        assert!(pool.allocated_bytes() >= 400);
        pool.reset();
        assert_eq!(pool.allocated_bytes(), 0);
    }

    #[test]
    fn test_thread_local_pool_resets_between_uses() {
        let first = with_thread_local_pool(|pool| {
            let _ = pool.alloc_row(8);
            pool.allocated_bytes()
        });
        let second = with_thread_local_pool(|pool| {
            let _ = pool.alloc_row(8);
            pool.allocated_bytes()
        });
        assert_eq!(first, second);
    }
}
