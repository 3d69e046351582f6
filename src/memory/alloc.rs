//! Allocator plumbing
//!
//! - [`Allocator`]: the narrow interface containers allocate through
//! - [`Heap`]: general-purpose heap on top of any `GlobalAlloc`
//! - [`CountingAlloc`]: `GlobalAlloc` wrapper that tracks live and peak bytes
//!
//! Arenas obtain raw blocks from a `GlobalAlloc` "base" allocator. With the
//! `mimalloc` feature that base defaults to mimalloc, otherwise to the system
//! allocator. Allocation failure is fatal everywhere: we call
//! `handle_alloc_error` instead of returning an error.

use std::alloc::{handle_alloc_error, GlobalAlloc, Layout, System};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Base allocator used when none is given explicitly
#[cfg(feature = "mimalloc")]
pub type DefaultBase = mimalloc::MiMalloc;

/// Base allocator used when none is given explicitly
#[cfg(not(feature = "mimalloc"))]
pub type DefaultBase = System;

/// Construct the default base allocator
#[cfg(feature = "mimalloc")]
#[inline]
pub fn default_base() -> DefaultBase {
    mimalloc::MiMalloc
}

/// Construct the default base allocator
#[cfg(not(feature = "mimalloc"))]
#[inline]
pub fn default_base() -> DefaultBase {
    System
}

/// Memory source for containers such as [`GrowArray`](super::array::GrowArray).
///
/// Takes `&self` so one allocator can back several containers at once.
/// Implementations never return null; out-of-memory aborts.
pub trait Allocator {
    /// Allocate memory for `layout`. Zero-sized layouts get a dangling,
    /// well-aligned pointer.
    fn allocate(&self, layout: Layout) -> NonNull<u8>;

    /// Release memory obtained from [`allocate`](Self::allocate).
    ///
    /// # Safety
    /// `ptr` must come from this allocator with the same `layout`, and must not
    /// be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

impl<A: Allocator + ?Sized> Allocator for &A {
    #[inline]
    fn allocate(&self, layout: Layout) -> NonNull<u8> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded contract
        unsafe { (**self).deallocate(ptr, layout) }
    }
}

/// Dangling pointer with the alignment of `layout`
#[inline]
pub(crate) fn dangling_for(layout: Layout) -> NonNull<u8> {
    // SAFETY: alignments are never zero
    unsafe { NonNull::new_unchecked(std::ptr::without_provenance_mut(layout.align())) }
}

/// General-purpose heap allocation through a `GlobalAlloc`
#[derive(Debug, Clone, Copy)]
pub struct Heap<B: GlobalAlloc = DefaultBase> {
    base: B,
}

impl Heap<DefaultBase> {
    pub fn new() -> Self {
        Heap { base: default_base() }
    }
}

impl Default for Heap<DefaultBase> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: GlobalAlloc> Heap<B> {
    pub fn with_base(base: B) -> Self {
        Heap { base }
    }

    pub fn base(&self) -> &B {
        &self.base
    }
}

impl<B: GlobalAlloc> Allocator for Heap<B> {
    fn allocate(&self, layout: Layout) -> NonNull<u8> {
        if layout.size() == 0 {
            return dangling_for(layout);
        }
        // SAFETY: layout has non-zero size
        let ptr = unsafe { self.base.alloc(layout) };
        NonNull::new(ptr).unwrap_or_else(|| handle_alloc_error(layout))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        // SAFETY: caller guarantees ptr came from allocate with this layout
        unsafe { self.base.dealloc(ptr.as_ptr(), layout) }
    }
}

/// `GlobalAlloc` wrapper that tracks how many bytes are outstanding.
///
/// Used as an arena base allocator for capacity diagnostics and to verify
/// that blocks are returned.
#[derive(Debug, Default)]
pub struct CountingAlloc<B: GlobalAlloc = System> {
    inner: B,
    allocated: AtomicUsize,
    peak: AtomicUsize,
    live_allocations: AtomicUsize,
}

impl<B: GlobalAlloc> CountingAlloc<B> {
    pub const fn new(inner: B) -> Self {
        CountingAlloc {
            inner,
            allocated: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            live_allocations: AtomicUsize::new(0),
        }
    }

    /// Bytes currently outstanding
    pub fn allocated(&self) -> usize {
        self.allocated.load(Ordering::SeqCst)
    }

    /// Highest value `allocated` has reached
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Number of allocations not yet released
    pub fn live_allocations(&self) -> usize {
        self.live_allocations.load(Ordering::SeqCst)
    }

    fn record_alloc(&self, size: usize) {
        let current = self.allocated.fetch_add(size, Ordering::Relaxed) + size;
        self.live_allocations.fetch_add(1, Ordering::Relaxed);
        let mut peak = self.peak.load(Ordering::Relaxed);
        while current > peak {
            match self.peak.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(p) => peak = p,
            }
        }
    }
}

unsafe impl<B: GlobalAlloc> GlobalAlloc for CountingAlloc<B> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded contract
        let ptr = unsafe { self.inner.alloc(layout) };
        if !ptr.is_null() {
            self.record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded contract
        let ptr = unsafe { self.inner.alloc_zeroed(layout) };
        if !ptr.is_null() {
            self.record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        self.allocated.fetch_sub(layout.size(), Ordering::Relaxed);
        self.live_allocations.fetch_sub(1, Ordering::Relaxed);
        // SAFETY: forwarded contract
        unsafe { self.inner.dealloc(ptr, layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_roundtrip() {
        let heap = Heap::with_base(CountingAlloc::new(System));
        let layout = Layout::array::<u64>(4).unwrap();
        let ptr = heap.allocate(layout);
        assert_eq!(ptr.as_ptr() as usize % layout.align(), 0);
        assert_eq!(heap.base().allocated(), 32);
        unsafe { heap.deallocate(ptr, layout) };
        assert_eq!(heap.base().allocated(), 0);
        assert_eq!(heap.base().peak(), 32);
        assert_eq!(heap.base().live_allocations(), 0);
    }

    #[test]
    fn test_heap_zero_sized() {
        let heap = Heap::with_base(CountingAlloc::new(System));
        let layout = Layout::from_size_align(0, 16).unwrap();
        let ptr = heap.allocate(layout);
        assert_eq!(ptr.as_ptr() as usize % 16, 0);
        unsafe { heap.deallocate(ptr, layout) };
        assert_eq!(heap.base().live_allocations(), 0);
    }

    #[test]
    fn test_default_heap() {
        let heap = Heap::default();
        let layout = Layout::new::<u32>();
        let ptr = heap.allocate(layout);
        unsafe {
            ptr.cast::<u32>().as_ptr().write(7);
            assert_eq!(*ptr.cast::<u32>().as_ptr(), 7);
            heap.deallocate(ptr, layout);
        }
    }
}
