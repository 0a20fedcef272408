//! Bump arena for verification scratch memory
//!
//! One page-aligned region is reserved up front. Allocation bumps an offset,
//! `checkpoint`/`restore` rewind it in LIFO order, and nothing is freed
//! individually. Every verification thread gets its own scratch arena via
//! [`with_scratch`], so the hot path never touches the global allocator.

use core::cell::{Cell, RefCell};
use core::ptr::NonNull;
use std::alloc::{self, Layout};

use zeroize::Zeroize;

use crate::errors::ArenaError;

/// Region alignment and capacity granularity
pub const PAGE_SIZE: usize = 4096;

/// Default per-thread scratch capacity (256 KiB)
pub const DEFAULT_SCRATCH_CAPACITY: usize = 256 * 1024;

/// Saved arena offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Single-owner bump allocator over one contiguous region
pub struct Arena {
    base: NonNull<u8>,
    capacity: usize,
    offset: Cell<usize>,
    peak: Cell<usize>,
    zero_on_restore: bool,
}

// The region is owned exclusively; `Cell` keeps the arena !Sync.
unsafe impl Send for Arena {}

impl Arena {
    /// Reserve `capacity` bytes, rounded up to a whole number of pages.
    pub fn new(capacity: usize) -> Result<Self, ArenaError> {
        Self::with_options(capacity, false)
    }

    /// Reserve a region, choosing whether rewound bytes are scrubbed.
    pub fn with_options(capacity: usize, zero_on_restore: bool) -> Result<Self, ArenaError> {
        if capacity == 0 {
            return Err(ArenaError::InvalidCapacity(capacity));
        }
        let capacity = capacity
            .checked_next_multiple_of(PAGE_SIZE)
            .ok_or(ArenaError::InvalidCapacity(capacity))?;
        let layout = Layout::from_size_align(capacity, PAGE_SIZE)
            .map_err(|_| ArenaError::InvalidCapacity(capacity))?;

        // SAFETY: layout has a non-zero size.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let base = NonNull::new(ptr).ok_or(ArenaError::OutOfMemory { capacity })?;

        log::debug!("arena reserved {} bytes", capacity);
        Ok(Self {
            base,
            capacity,
            offset: Cell::new(0),
            peak: Cell::new(0),
            zero_on_restore,
        })
    }

    /// Total bytes in the region
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether `restore` scrubs the released bytes
    pub fn zero_on_restore(&self) -> bool {
        self.zero_on_restore
    }

    /// Bytes handed out since the last reset
    pub fn used(&self) -> usize {
        self.offset.get()
    }

    /// Bytes still available (ignoring alignment padding)
    pub fn remaining(&self) -> usize {
        self.capacity - self.offset.get()
    }

    /// High-water mark since creation
    pub fn peak(&self) -> usize {
        self.peak.get()
    }

    fn alloc_raw(&self, size: usize, align: usize) -> Result<NonNull<u8>, ArenaError> {
        // The base is only page aligned
        if !align.is_power_of_two() || align > PAGE_SIZE {
            return Err(ArenaError::InvalidAlignment(align));
        }
        let offset = self.offset.get();
        let exhausted = ArenaError::Exhausted {
            requested: size,
            available: self.capacity - offset,
        };

        // Base is page aligned, so aligning the offset aligns the address.
        let start = offset.checked_next_multiple_of(align).ok_or(exhausted)?;
        let end = start.checked_add(size).ok_or(exhausted)?;
        if end > self.capacity {
            return Err(exhausted);
        }

        self.offset.set(end);
        if end > self.peak.get() {
            self.peak.set(end);
        }
        // SAFETY: start <= capacity, so the pointer stays inside the region.
        Ok(unsafe { NonNull::new_unchecked(self.base.as_ptr().add(start)) })
    }

    /// Allocate `size` zero-initialised bytes aligned to `align`.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_bytes(&self, size: usize, align: usize) -> Result<&mut [u8], ArenaError> {
        let ptr = self.alloc_raw(size, align)?;
        // SAFETY: the range is in bounds and handed out once; it can only be
        // reused after `restore`/`reset`, which need `&mut self` and so end
        // every outstanding borrow.
        unsafe {
            core::ptr::write_bytes(ptr.as_ptr(), 0, size);
            Ok(core::slice::from_raw_parts_mut(ptr.as_ptr(), size))
        }
    }

    /// Allocate a slice of `len` copies of `value`.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice<T: Copy>(&self, len: usize, value: T) -> Result<&mut [T], ArenaError> {
        let size = core::mem::size_of::<T>()
            .checked_mul(len)
            .ok_or(ArenaError::Exhausted {
                requested: usize::MAX,
                available: self.remaining(),
            })?;
        let ptr = self.alloc_raw(size, core::mem::align_of::<T>())?;
        let ptr = ptr.as_ptr() as *mut T;
        // SAFETY: aligned for T, in bounds, exclusively owned (see alloc_bytes).
        unsafe {
            for i in 0..len {
                ptr.add(i).write(value);
            }
            Ok(core::slice::from_raw_parts_mut(ptr, len))
        }
    }

    /// Allocate a single value.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc<T: Copy>(&self, value: T) -> Result<&mut T, ArenaError> {
        Ok(&mut self.alloc_slice(1, value)?[0])
    }

    /// Current offset, to be passed to [`Arena::restore`].
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.offset.get())
    }

    /// Rewind to `mark`, releasing everything allocated after it.
    ///
    /// A mark newer than the current offset is ignored.
    pub fn restore(&mut self, mark: Checkpoint) {
        let offset = self.offset.get();
        if mark.0 > offset {
            return;
        }
        if self.zero_on_restore {
            self.region_mut()[mark.0..offset].zeroize();
        }
        self.offset.set(mark.0);
    }

    /// Rewind to empty.
    pub fn reset(&mut self) {
        self.restore(Checkpoint(0));
    }

    /// Scoped allocation: everything allocated through the guard is released
    /// when it drops.
    pub fn scope(&mut self) -> ArenaScope<'_> {
        let mark = self.checkpoint();
        ArenaScope { arena: self, mark }
    }

    fn region_mut(&mut self) -> &mut [u8] {
        // SAFETY: the region is `capacity` bytes, owned by self, and `&mut self`
        // guarantees no outstanding slices.
        unsafe { core::slice::from_raw_parts_mut(self.base.as_ptr(), self.capacity) }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        let used = self.peak.get();
        self.region_mut()[..used].zeroize();
        // SAFETY: same layout as the allocation in `with_options`.
        unsafe {
            let layout = Layout::from_size_align_unchecked(self.capacity, PAGE_SIZE);
            alloc::dealloc(self.base.as_ptr(), layout);
        }
    }
}

impl core::fmt::Debug for Arena {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity)
            .field("used", &self.offset.get())
            .field("peak", &self.peak.get())
            .finish()
    }
}

/// Guard returned by [`Arena::scope`]
pub struct ArenaScope<'a> {
    arena: &'a mut Arena,
    mark: Checkpoint,
}

impl core::ops::Deref for ArenaScope<'_> {
    type Target = Arena;

    fn deref(&self) -> &Arena {
        self.arena
    }
}

impl Drop for ArenaScope<'_> {
    fn drop(&mut self) {
        self.arena.restore(self.mark);
    }
}

thread_local! {
    static SCRATCH: RefCell<Option<Arena>> = const { RefCell::new(None) };
}

/// Run `f` with this thread's scratch arena, created on first use with at
/// least `min_capacity` bytes. Everything `f` allocates is released after.
///
/// An existing arena that is too small, or scrubs differently than asked,
/// is replaced.
pub fn with_scratch<R>(
    min_capacity: usize,
    zero_on_restore: bool,
    f: impl FnOnce(&mut Arena) -> R,
) -> Result<R, ArenaError> {
    SCRATCH.with(|cell| {
        let mut slot = cell.try_borrow_mut().map_err(|_| ArenaError::ScratchBusy)?;
        let stale = slot.as_ref().map_or(true, |a| {
            a.capacity() < min_capacity || a.zero_on_restore() != zero_on_restore
        });
        if stale {
            let capacity = min_capacity.max(DEFAULT_SCRATCH_CAPACITY);
            *slot = Some(Arena::with_options(capacity, zero_on_restore)?);
        }
        let arena = slot.as_mut().ok_or(ArenaError::InvalidCapacity(min_capacity))?;
        let mut scope = arena.scope();
        Ok(f(&mut *scope.arena))
    })
}

/// Peak usage of this thread's scratch arena, if it exists.
pub fn scratch_peak() -> Option<usize> {
    SCRATCH.with(|cell| cell.try_borrow().ok()?.as_ref().map(Arena::peak))
}

/// Drop this thread's scratch arena.
pub fn release_scratch() {
    SCRATCH.with(|cell| {
        if let Ok(mut slot) = cell.try_borrow_mut() {
            *slot = None;
        }
    });
}
