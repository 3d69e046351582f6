//! Region allocator with scoped rollback
//!
//! Bump-pointer allocation out of large blocks obtained from a base
//! `GlobalAlloc`. Retired blocks go to a free list so [`Arena::clear`] can
//! recycle memory without another round-trip to the base allocator, while
//! [`Arena::destroy`] (and `Drop`) hands everything back.
//!
//! # Temp sections
//!
//! [`Arena::temp_section`] marks the current bump position and returns a
//! guard. Dropping the guard releases every block acquired since the mark
//! straight to the base allocator and rewinds the marked block. The guard
//! borrows the arena mutably, so sections always close in LIFO order and
//! nothing allocated inside one can outlive it.
//!
//! ```
//! use tagstream::memory::arena::Arena;
//!
//! let mut arena = Arena::new("scratch");
//! let before = arena.stats().used;
//! {
//!     let section = arena.temp_section();
//!     let copy = section.dup(b"transient");
//!     assert_eq!(copy, "transient");
//! }
//! assert_eq!(arena.stats().used, before);
//! ```
//!
//! The arena is not synchronized. Use one per thread.

use super::alloc::{default_base, Allocator, DefaultBase};
use crate::core::slice::Slice;
use std::alloc::{handle_alloc_error, GlobalAlloc, Layout};
use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::ptr::{self, NonNull};

/// Default minimum block size (8 MiB)
pub const DEFAULT_MIN_BLOCK_SIZE: usize = 8 * 1024 * 1024;

/// Alignment of every block start
const BLOCK_ALIGN: usize = 16;

/// Stack buffer size for the formatting fast path
const FORMAT_STACK_SIZE: usize = 1024;

/// Arena capacity report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArenaStats {
    /// Bytes reserved across active blocks
    pub reserved: usize,
    /// Bytes handed out from active blocks
    pub used: usize,
    /// Number of active blocks
    pub blocks: usize,
    /// Number of blocks parked on the free list
    pub free_blocks: usize,
}

struct Block {
    data: NonNull<u8>,
    size: usize,
    used: usize,
    /// Open temp sections that must unwind through this block
    temp_count: u32,
}

impl Block {
    fn layout(&self) -> Layout {
        block_layout(self.size)
    }

    /// Bump-allocate from this block, or `None` if it lacks room
    fn bump(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        // SAFETY: used <= size, so the pointer stays within (or one past) the block
        let cursor = unsafe { self.data.as_ptr().add(self.used) };
        let padding = cursor.align_offset(layout.align());
        let start = self.used.checked_add(padding)?;
        let end = start.checked_add(layout.size())?;
        if end > self.size {
            return None;
        }
        self.used = end;
        // SAFETY: start < size (or == size for zero-sized requests)
        Some(unsafe { NonNull::new_unchecked(self.data.as_ptr().add(start)) })
    }
}

fn block_layout(size: usize) -> Layout {
    match Layout::from_size_align(size, BLOCK_ALIGN) {
        Ok(layout) => layout,
        Err(_) => panic!("arena block size overflow: {size} bytes"),
    }
}

#[derive(Default)]
struct ArenaState {
    /// Active blocks; the last entry is the head being bumped from
    blocks: Vec<Block>,
    /// Retired blocks available for reuse, searched first-fit
    free: Vec<Block>,
    #[cfg(feature = "memory_tracking")]
    requested: usize,
}

/// Bump allocator over blocks from a base `GlobalAlloc`
pub struct Arena<B: GlobalAlloc = DefaultBase> {
    name: String,
    base: B,
    min_block_size: usize,
    state: RefCell<ArenaState>,
}

impl Arena<DefaultBase> {
    /// Create an empty arena on the default base allocator
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_allocator(name, default_base())
    }

    /// Create an empty arena with a custom minimum block size
    pub fn with_min_block_size(name: impl Into<String>, min_block_size: usize) -> Self {
        Self::new(name).min_block_size(min_block_size)
    }
}

impl<B: GlobalAlloc> Arena<B> {
    /// Create an empty arena drawing blocks from `base`
    pub fn with_allocator(name: impl Into<String>, base: B) -> Self {
        let name = name.into();
        tracing::trace!(arena = %name, "arena init");
        Arena {
            name,
            base,
            min_block_size: DEFAULT_MIN_BLOCK_SIZE,
            state: RefCell::new(ArenaState::default()),
        }
    }

    /// Set the minimum size of freshly allocated blocks
    pub fn min_block_size(mut self, size: usize) -> Self {
        self.min_block_size = size.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_allocator(&self) -> &B {
        &self.base
    }

    /// Allocate `size` bytes with no alignment requirement
    #[inline]
    pub fn alloc(&self, size: usize) -> NonNull<u8> {
        match Layout::from_size_align(size, 1) {
            Ok(layout) => self.alloc_layout(layout),
            Err(_) => panic!("arena allocation size overflow: {size} bytes"),
        }
    }

    /// Allocate `size` zeroed bytes
    pub fn alloc_zeroed(&self, size: usize) -> NonNull<u8> {
        let ptr = self.alloc(size);
        // SAFETY: ptr is valid for `size` bytes
        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, size) };
        ptr
    }

    /// Allocate memory for `layout` from the head block, acquiring a new
    /// block when the head is full.
    ///
    /// The memory stays valid until the arena is cleared, destroyed, or the
    /// enclosing temp section ends. Contents are unspecified.
    pub fn alloc_layout(&self, layout: Layout) -> NonNull<u8> {
        let mut state = self.state.borrow_mut();

        #[cfg(feature = "memory_tracking")]
        {
            state.requested += layout.size();
        }

        if let Some(ptr) = state.blocks.last_mut().and_then(|b| b.bump(layout)) {
            return ptr;
        }

        let needed = if layout.align() > BLOCK_ALIGN {
            layout.size().saturating_add(layout.align())
        } else {
            layout.size()
        };
        self.acquire_block(&mut state, needed);

        match state.blocks.last_mut().and_then(|b| b.bump(layout)) {
            Some(ptr) => ptr,
            None => unreachable!("fresh arena block cannot satisfy {} bytes", layout.size()),
        }
    }

    /// Push a block with at least `size` bytes onto the head, reusing the
    /// first free block that is large enough.
    fn acquire_block(&self, state: &mut ArenaState, size: usize) {
        let temp_count = state.blocks.last().map_or(0, |b| b.temp_count);

        if let Some(index) = state.free.iter().position(|b| b.size >= size) {
            let mut block = state.free.remove(index);
            block.used = 0;
            block.temp_count = temp_count;
            tracing::trace!(arena = %self.name, size = block.size, "arena reused block");
            state.blocks.push(block);
            return;
        }

        let size = size.max(self.min_block_size);
        let layout = block_layout(size);
        // SAFETY: layout has non-zero size
        let data = unsafe { self.base.alloc_zeroed(layout) };
        let data = NonNull::new(data).unwrap_or_else(|| handle_alloc_error(layout));
        tracing::trace!(arena = %self.name, size, "arena allocated block");
        state.blocks.push(Block { data, size, used: 0, temp_count });
    }

    /// Copy `bytes` into the arena followed by a NUL byte.
    /// The returned slice excludes the NUL.
    pub fn dup(&self, bytes: &[u8]) -> Slice<'_> {
        let ptr = self.alloc(bytes.len() + 1);
        // SAFETY: ptr is valid for len + 1 bytes and cannot overlap `bytes`;
        // the memory lives as long as the shared borrow of the arena.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), bytes.len());
            ptr.as_ptr().add(bytes.len()).write(0);
            Slice::new(std::slice::from_raw_parts(ptr.as_ptr(), bytes.len()))
        }
    }

    /// Format into the arena, NUL-terminated.
    ///
    /// Short output is rendered into a stack buffer and copied; longer output
    /// is measured first and then written into an exactly sized allocation.
    /// See also [`arena_format!`](crate::arena_format).
    pub fn format(&self, args: fmt::Arguments<'_>) -> Result<Slice<'_>, fmt::Error> {
        let mut stack = StackWriter { buf: [0; FORMAT_STACK_SIZE], len: 0 };
        fmt::write(&mut stack, args)?;
        if stack.len <= FORMAT_STACK_SIZE {
            return Ok(self.dup(&stack.buf[..stack.len]));
        }

        let needed = stack.len;
        let ptr = self.alloc(needed + 1);
        // SAFETY: ptr is valid for needed + 1 bytes for the arena borrow
        let out = unsafe { std::slice::from_raw_parts_mut(ptr.as_ptr(), needed + 1) };
        let mut writer = SliceWriter { buf: &mut out[..needed], len: 0 };
        fmt::write(&mut writer, args)?;
        let written = writer.len;
        out[written] = 0;
        Ok(Slice::new(&out[..written]))
    }

    /// Capacity diagnostics over the active blocks
    pub fn stats(&self) -> ArenaStats {
        let state = self.state.borrow();
        ArenaStats {
            reserved: state.blocks.iter().map(|b| b.size).sum(),
            used: state.blocks.iter().map(|b| b.used).sum(),
            blocks: state.blocks.len(),
            free_blocks: state.free.len(),
        }
    }

    /// Total bytes requested since creation or the last clear
    #[cfg(feature = "memory_tracking")]
    pub fn requested_bytes(&self) -> usize {
        self.state.borrow().requested
    }

    /// Retire every active block to the free list.
    ///
    /// Nothing is returned to the base allocator; the next allocations reuse
    /// the retired blocks.
    pub fn clear(&mut self) {
        let state = self.state.get_mut();

        #[cfg(feature = "memory_tracking")]
        {
            state.requested = 0;
        }

        if state.blocks.is_empty() {
            return;
        }
        // Retired blocks go in front of the existing free list, head first
        let mut retired: Vec<Block> = state.blocks.drain(..).rev().collect();
        for block in &mut retired {
            block.used = 0;
            block.temp_count = 0;
        }
        retired.append(&mut state.free);
        state.free = retired;
    }

    /// Release every block, active and free, to the base allocator
    pub fn destroy(&mut self) {
        let state = self.state.get_mut();
        let count = state.blocks.len() + state.free.len();
        for block in state.blocks.drain(..).chain(state.free.drain(..)) {
            // SAFETY: every block was allocated by `base` with this layout
            unsafe { self.base.dealloc(block.data.as_ptr(), block.layout()) };
        }
        if count > 0 {
            tracing::trace!(arena = %self.name, blocks = count, "arena destroyed");
        }
    }

    /// Begin a temp section at the current bump position.
    ///
    /// Allocates an initial block if the arena has none.
    pub fn temp_section(&mut self) -> TempSection<'_, B> {
        if self.state.get_mut().blocks.is_empty() {
            self.acquire_block(&mut self.state.borrow_mut(), 0);
        }

        let state = self.state.get_mut();
        let block_index = state.blocks.len() - 1;
        let head = &mut state.blocks[block_index];
        head.temp_count += 1;
        let mark = head.used;

        TempSection { arena: self, block_index, mark }
    }

    /// Undo a temp section: see [`TempSection`]
    fn end_temp_section(&mut self, block_index: usize, mark: usize) {
        let state = self.state.get_mut();
        let depth = state.blocks.get(block_index).map_or(0, |b| b.temp_count);

        let mut released = 0usize;
        while state.blocks.len() > block_index + 1 {
            let Some(block) = state.blocks.pop() else { break };
            // Later blocks inherit the section depth; anything higher means a
            // nested section opened on them never ended
            assert_eq!(
                block.temp_count, depth,
                "temp section ended while a nested section is still open"
            );
            // Disposable blocks bypass the free list
            // SAFETY: block was allocated by `base` with this layout
            unsafe { self.base.dealloc(block.data.as_ptr(), block.layout()) };
            released += 1;
        }
        assert_eq!(
            state.blocks.len(),
            block_index + 1,
            "temp section ended out of order"
        );

        let block = &mut state.blocks[block_index];
        assert!(block.temp_count > 0, "temp section ended twice");
        block.used = mark;
        block.temp_count -= 1;

        if released > 0 {
            tracing::trace!(arena = %self.name, blocks = released, "temp section released blocks");
        }
    }
}

impl<B: GlobalAlloc> Allocator for Arena<B> {
    #[inline]
    fn allocate(&self, layout: Layout) -> NonNull<u8> {
        self.alloc_layout(layout)
    }

    /// Individual frees are no-ops; memory comes back in bulk.
    #[inline]
    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}

impl<B: GlobalAlloc> Drop for Arena<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<B: GlobalAlloc> fmt::Debug for Arena<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("name", &self.name)
            .field("min_block_size", &self.min_block_size)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Scoped rollback over an [`Arena`].
///
/// Derefs to the arena for allocation. Nested sections are opened through
/// [`TempSection::temp_section`]. On drop, blocks acquired since the section
/// began are released to the base allocator and the marked block is rewound.
pub struct TempSection<'a, B: GlobalAlloc = DefaultBase> {
    arena: &'a mut Arena<B>,
    block_index: usize,
    mark: usize,
}

impl<B: GlobalAlloc> TempSection<'_, B> {
    /// Open a nested section; it must end before this one can
    pub fn temp_section(&mut self) -> TempSection<'_, B> {
        self.arena.temp_section()
    }

    /// End the section now
    pub fn end(self) {}
}

impl<B: GlobalAlloc> Deref for TempSection<'_, B> {
    type Target = Arena<B>;

    fn deref(&self) -> &Arena<B> {
        &*self.arena
    }
}

impl<B: GlobalAlloc> Drop for TempSection<'_, B> {
    fn drop(&mut self) {
        self.arena.end_temp_section(self.block_index, self.mark);
    }
}

/// Format into an arena: `arena_format!(arena, "{}:{}", a, b)`
#[macro_export]
macro_rules! arena_format {
    ($arena:expr, $($arg:tt)*) => {
        $arena.format(format_args!($($arg)*))
    };
}

/// Fixed stack buffer that keeps counting once full
struct StackWriter {
    buf: [u8; FORMAT_STACK_SIZE],
    len: usize,
}

impl fmt::Write for StackWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let start = self.len;
        self.len += s.len();
        if self.len <= FORMAT_STACK_SIZE {
            self.buf[start..self.len].copy_from_slice(s.as_bytes());
        }
        Ok(())
    }
}

struct SliceWriter<'b> {
    buf: &'b mut [u8],
    len: usize,
}

impl fmt::Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let end = self.len + s.len();
        let Some(dest) = self.buf.get_mut(self.len..end) else {
            return Err(fmt::Error);
        };
        dest.copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}
