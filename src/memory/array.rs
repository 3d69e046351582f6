//! Growable array over an [`Allocator`]
//!
//! A minimal `Vec` for plain-old-data elements whose storage can live in an
//! arena. Capacity grows by half once it is past a small threshold.

use super::alloc::{dangling_for, Allocator, Heap};
use std::alloc::Layout;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

/// Capacity of the first real allocation
const INITIAL_CAPACITY: usize = 8;

/// Capacity after growing `capacity` to hold at least `count` elements
#[inline]
pub fn grown_capacity(capacity: usize, count: usize) -> usize {
    let grown = if capacity >= 6 {
        capacity + capacity / 2
    } else {
        INITIAL_CAPACITY
    };
    grown.max(count)
}

/// Growable array of `Copy` elements
pub struct GrowArray<T: Copy, A: Allocator = Heap> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
    alloc: A,
}

impl<T: Copy> GrowArray<T, Heap> {
    /// Empty array on the default heap
    pub fn new() -> Self {
        Self::new_in(Heap::new())
    }
}

impl<T: Copy> Default for GrowArray<T, Heap> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, A: Allocator> GrowArray<T, A> {
    /// Empty array; nothing is allocated until the first push
    pub fn new_in(alloc: A) -> Self {
        GrowArray { ptr: NonNull::dangling(), len: 0, cap: 0, alloc }
    }

    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        let mut array = Self::new_in(alloc);
        array.set_capacity(capacity);
        array
    }

    /// Rebind `existing` onto `alloc` if given, otherwise start empty on it.
    /// The old storage goes back to its own allocator.
    pub fn init<B: Allocator>(existing: Option<GrowArray<T, B>>, alloc: A) -> Self {
        match existing {
            Some(existing) => existing.rebind(alloc),
            None => Self::new_in(alloc),
        }
    }

    /// Copy the contents into storage from another allocator
    pub fn rebind<B: Allocator>(&self, alloc: B) -> GrowArray<T, B> {
        let mut out = GrowArray::with_capacity_in(self.len, alloc);
        out.extend_from_slice(self);
        out
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` elements are initialized
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: the first `len` elements are initialized
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    fn layout(cap: usize) -> Layout {
        match Layout::array::<T>(cap) {
            Ok(layout) => layout,
            Err(_) => panic!("array capacity overflow: {cap} elements"),
        }
    }

    /// Make room for at least `count` elements in total
    pub fn ensure_capacity(&mut self, count: usize) {
        if count > self.cap {
            self.set_capacity(grown_capacity(self.cap, count));
        }
    }

    /// Resize the storage to exactly `capacity` elements, truncating if needed
    pub fn set_capacity(&mut self, capacity: usize) {
        if capacity == self.cap {
            return;
        }
        let new_ptr = if capacity == 0 || std::mem::size_of::<T>() == 0 {
            dangling_for(Self::layout(capacity)).cast::<T>()
        } else {
            self.alloc.allocate(Self::layout(capacity)).cast::<T>()
        };
        let keep = self.len.min(capacity);
        // SAFETY: both regions hold at least `keep` elements and are distinct
        unsafe { ptr::copy_nonoverlapping(self.ptr.as_ptr(), new_ptr.as_ptr(), keep) };
        self.release();
        self.ptr = new_ptr;
        self.cap = capacity;
        self.len = keep;
    }

    /// Drop spare capacity
    pub fn shrink_to_fit(&mut self) {
        self.set_capacity(self.len);
    }

    pub fn push(&mut self, value: T) {
        self.ensure_capacity(self.len + 1);
        // SAFETY: len < cap after ensure_capacity
        unsafe { self.ptr.as_ptr().add(self.len).write(value) };
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: element at the old len - 1 is initialized
        Some(unsafe { self.ptr.as_ptr().add(self.len).read() })
    }

    pub fn extend_from_slice(&mut self, values: &[T]) {
        self.ensure_capacity(self.len + values.len());
        // SAFETY: capacity covers len + values.len(); `values` cannot alias our
        // spare capacity
        unsafe {
            ptr::copy_nonoverlapping(values.as_ptr(), self.ptr.as_ptr().add(self.len), values.len())
        };
        self.len += values.len();
    }

    /// Concatenate two optional arrays.
    ///
    /// If only one side is present it is returned unchanged; otherwise `b` is
    /// appended onto `a`.
    pub fn concat(a: Option<Self>, b: Option<Self>) -> Option<Self> {
        match (a, b) {
            (None, None) => None,
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (Some(mut a), Some(b)) => {
                a.extend_from_slice(&b);
                Some(a)
            }
        }
    }

    /// Remove the element at `index`, filling the hole with the last element
    pub fn swap_remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "swap_remove index {index} out of bounds ({})", self.len);
        let slice = self.as_mut_slice();
        let value = slice[index];
        slice[index] = slice[slice.len() - 1];
        self.len -= 1;
        value
    }

    /// Set the length, filling new slots with `fill`
    pub fn set_len(&mut self, len: usize, fill: T) {
        if len > self.len {
            self.ensure_capacity(len);
            for i in self.len..len {
                // SAFETY: i < cap
                unsafe { self.ptr.as_ptr().add(i).write(fill) };
            }
        }
        self.len = len;
    }

    /// Truncate to zero length, keeping the capacity
    #[doc(alias = "truncate_to_zero")]
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    fn release(&mut self) {
        if self.cap == 0 || std::mem::size_of::<T>() == 0 {
            return;
        }
        // SAFETY: ptr was allocated by `alloc` with this layout
        unsafe { self.alloc.deallocate(self.ptr.cast::<u8>(), Self::layout(self.cap)) };
    }
}

impl<A: Allocator> GrowArray<u8, A> {
    /// Copy `bytes` with a NUL written just past the last element
    pub fn from_bytes_nul(bytes: &[u8], alloc: A) -> Self {
        let mut array = Self::with_capacity_in(bytes.len() + 1, alloc);
        array.extend_from_slice(bytes);
        // SAFETY: capacity is len + 1
        unsafe { array.ptr.as_ptr().add(array.len).write(0) };
        array
    }
}

impl<T: Copy, A: Allocator> Drop for GrowArray<T, A> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: Copy, A: Allocator> Deref for GrowArray<T, A> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T: Copy, A: Allocator> DerefMut for GrowArray<T, A> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Copy + fmt::Debug, A: Allocator> fmt::Debug for GrowArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::alloc::CountingAlloc;
    use crate::memory::arena::Arena;
    use std::alloc::System;

    #[test]
    fn test_growth_policy() {
        assert_eq!(grown_capacity(0, 1), 8);
        assert_eq!(grown_capacity(4, 5), 8);
        assert_eq!(grown_capacity(8, 9), 12);
        assert_eq!(grown_capacity(12, 13), 18);
        assert_eq!(grown_capacity(8, 100), 100);
    }

    #[test]
    fn test_push_grows() {
        let mut array = GrowArray::new();
        for i in 0..7 {
            array.push(i);
        }
        assert_eq!(array.capacity(), 8);
        array.push(7);
        assert_eq!(array.capacity(), 8);
        array.push(8);
        assert_eq!(array.capacity(), 12);
        assert_eq!(&array[..], &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_set_len_and_shrink() {
        let mut array: GrowArray<u16> = GrowArray::new();
        array.set_len(5, 9);
        assert_eq!(&array[..], &[9; 5]);
        array.set_len(2, 0);
        assert_eq!(array.len(), 2);
        array.shrink_to_fit();
        assert_eq!(array.capacity(), 2);
        array.clear();
        assert!(array.is_empty());
        assert_eq!(array.capacity(), 2);
    }

    #[test]
    fn test_set_capacity_truncates() {
        let mut array = GrowArray::new();
        array.extend_from_slice(&[1u8, 2, 3, 4]);
        array.set_capacity(2);
        assert_eq!(&array[..], &[1, 2]);
    }

    #[test]
    fn test_swap_remove() {
        let mut array = GrowArray::new();
        array.extend_from_slice(&['a', 'b', 'c', 'd']);
        assert_eq!(array.swap_remove(1), 'b');
        assert_eq!(&array[..], &['a', 'd', 'c']);
        assert_eq!(array.pop(), Some('c'));
    }

    #[test]
    fn test_concat() {
        let mut a = GrowArray::new();
        a.extend_from_slice(&[1, 2]);
        let mut b = GrowArray::new();
        b.extend_from_slice(&[3]);
        let joined = GrowArray::concat(Some(a), Some(b)).unwrap();
        assert_eq!(&joined[..], &[1, 2, 3]);
        assert!(GrowArray::<i32>::concat(None, None).is_none());
    }

    #[test]
    fn test_init_rebinds_existing() {
        let first = Heap::with_base(CountingAlloc::new(System));
        let second = Heap::with_base(CountingAlloc::new(System));

        let mut existing = GrowArray::new_in(&first);
        existing.extend_from_slice(&[1u32, 2, 3]);
        let mut array = GrowArray::init(Some(existing), &second);
        assert_eq!(&array[..], &[1, 2, 3]);
        assert_eq!(first.base().allocated(), 0);

        for i in 0..20 {
            array.push(i);
        }
        assert_eq!(first.base().allocated(), 0);
        assert_eq!(second.base().allocated(), array.capacity() * 4);

        let empty: GrowArray<u32, _> = GrowArray::init(None::<GrowArray<u32>>, &second);
        assert_eq!(empty.capacity(), 0);
    }

    #[test]
    fn test_frees_on_drop() {
        let heap = Heap::with_base(CountingAlloc::new(System));
        {
            let mut array = GrowArray::new_in(&heap);
            array.extend_from_slice(&[0u64; 20]);
            assert!(heap.base().allocated() > 0);
        }
        assert_eq!(heap.base().allocated(), 0);
    }

    #[test]
    fn test_arena_backed_rebind() {
        let arena = Arena::with_allocator("array-test", System).min_block_size(1024);
        let mut array = GrowArray::new_in(&arena);
        for i in 0..20u32 {
            array.push(i);
        }
        assert_eq!(array.len(), 20);
        assert!(arena.stats().used >= 20 * 4);

        let heap_copy = array.rebind(Heap::new());
        assert_eq!(&heap_copy[..], &array[..]);
    }
}
