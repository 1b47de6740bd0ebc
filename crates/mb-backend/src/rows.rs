//! Shared handle over output rows for workers that claim rows dynamically.

use std::marker::PhantomData;

/// Lets several threads hold mutable access to different elements of one
/// slice at the same time.
///
/// Used for output rows: a worker may only call [`DisjointRows::claim`] for
/// an index nobody else has claimed, which the atomic row counter
/// guarantees.
pub(crate) struct DisjointRows<'a, R> {
    base: *mut R,
    len: usize,
    _marker: PhantomData<&'a mut [R]>,
}

// SAFETY: access goes through `claim`, whose contract forbids two live
// references to the same element. `R: Send` is enough because each element
// is only ever touched by one thread.
unsafe impl<R: Send> Send for DisjointRows<'_, R> {}
unsafe impl<R: Send> Sync for DisjointRows<'_, R> {}

impl<'a, R> DisjointRows<'a, R> {
    pub(crate) fn new(rows: &'a mut [R]) -> Self {
        DisjointRows {
            base: rows.as_mut_ptr(),
            len: rows.len(),
            _marker: PhantomData,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Mutable access to element `i`.
    ///
    /// # Safety
    /// Each index must be claimed at most once for the lifetime of `self`.
    ///
    /// # Panics
    /// Panics if `i >= len`.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn claim(&self, i: usize) -> &mut R {
        assert!(i < self.len, "row {} out of range for {} rows", i, self.len);
        // SAFETY: in bounds by the assert, unaliased by the caller contract.
        unsafe { &mut *self.base.add(i) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_each_row_written_once() {
        let mut rows = vec![0usize; 64];
        let next = AtomicUsize::new(0);
        {
            let sink = DisjointRows::new(&mut rows);
            std::thread::scope(|s| {
                for _ in 0..4 {
                    s.spawn(|| loop {
                        let i = next.fetch_add(1, Ordering::Relaxed);
                        if i >= sink.len() {
                            break;
                        }
                        // SAFETY: `i` came from the shared counter.
                        unsafe { *sink.claim(i) += i + 1 };
                    });
                }
            });
        }
        assert_eq!(rows, (1..=64).collect::<Vec<_>>());
    }
}
