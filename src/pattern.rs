//! Measurable memory layouts.
//!
//! Three layouts are provided, one per probe family:
//! - [`StridedSweep`] - fixed-stride linear walk over a byte buffer
//! - [`PointerChase`] - randomised single-cycle chase over machine words
//! - [`PageChase`] - randomised single-cycle chase with one slot per page
//!
//! Both chases store the successor of every slot as a plain `usize` index
//! into an owned `Vec`, so ownership and bounds stay explicit. The traversal
//! order always forms exactly one cycle that covers every element once.
//!
//! Every buffer is reserved fallibly. A failed reservation, or one larger
//! than the caller's byte budget, yields [`ProbeError::AllocationFailed`]
//! instead of aborting the process.

use std::hint::black_box;
use std::mem::size_of;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::ProbeError;

/// Size of one chase slot in bytes.
pub const WORD_BYTES: usize = size_of::<usize>();

/// A layout the profiler can traverse.
///
/// Each call to [`Workload::access`] continues from the current cursor and
/// performs `count` accesses, each depending on the value the previous one
/// loaded, so the hardware cannot overlap or prefetch around them.
pub trait Workload {
    /// Move the cursor back to the pattern origin.
    fn reset(&mut self);

    /// Perform `count` dependent accesses and return a value derived from
    /// the last one.
    fn access(&mut self, count: usize) -> usize;

    /// Number of accesses in one full traversal.
    fn traversal_len(&self) -> usize;
}

/// Reserve a buffer of `len` elements, all set to `fill`.
///
/// Fails when the byte size overflows, exceeds `limit_bytes`, or the
/// allocator refuses the reservation.
pub fn allocate<T: Clone>(len: usize, fill: T, limit_bytes: Option<usize>) -> Result<Vec<T>, ProbeError> {
    let bytes = len
        .checked_mul(size_of::<T>())
        .ok_or(ProbeError::AllocationFailed { bytes: usize::MAX })?;

    if limit_bytes.is_some_and(|limit| bytes > limit) {
        return Err(ProbeError::AllocationFailed { bytes });
    }

    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| ProbeError::AllocationFailed { bytes })?;
    buffer.resize(len, fill);
    Ok(buffer)
}

/// Uniformly random visiting order of `0..n` (Fisher-Yates).
///
/// Reading the result as a ring, `order[i] -> order[i + 1]` and
/// `order[n - 1] -> order[0]`, gives a single cycle through every element.
pub fn visit_order<R: Rng + ?Sized>(
    n: usize,
    rng: &mut R,
    limit_bytes: Option<usize>,
) -> Result<Vec<usize>, ProbeError> {
    let mut order = allocate(n, 0usize, limit_bytes)?;
    for (position, slot) in order.iter_mut().enumerate() {
        *slot = position;
    }
    order.shuffle(rng);
    Ok(order)
}

/// Write the ring described by `order` into successor links.
///
/// `link(from, to)` is called once per element. Linking through the
/// shuffled positions, rather than shuffling the successor values in
/// place, guarantees no sub-cycles.
fn link_ring(order: &[usize], mut link: impl FnMut(usize, usize)) {
    let n = order.len();
    for i in 0..n {
        link(order[i], order[(i + 1) % n]);
    }
}

/// Fixed-stride walk `0, k, 2k, ...` over a byte buffer.
#[derive(Debug)]
pub struct StridedSweep {
    buffer: Vec<u8>,
    stride: usize,
    cursor: usize,
    // Opaque zero: folding the loaded byte through it makes every address
    // depend on the previous load without changing the walk.
    mask: usize,
}

impl StridedSweep {
    /// Allocate `bytes` of backing storage and touch every byte.
    pub fn new(bytes: usize, limit_bytes: Option<usize>) -> Result<Self, ProbeError> {
        let mut buffer = allocate(bytes.max(1), 0u8, limit_bytes)?;
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = i as u8;
        }
        Ok(Self {
            buffer,
            stride: 1,
            cursor: 0,
            mask: black_box(0),
        })
    }

    /// Change the stride and rewind to the origin.
    pub fn set_stride(&mut self, stride: usize) {
        self.stride = stride.clamp(1, self.buffer.len());
        self.cursor = 0;
    }

    /// Backing buffer size in bytes.
    pub fn len_bytes(&self) -> usize {
        self.buffer.len()
    }
}

impl Workload for StridedSweep {
    fn reset(&mut self) {
        self.cursor = 0;
    }

    #[inline]
    fn access(&mut self, count: usize) -> usize {
        let len = self.buffer.len();
        let mut idx = self.cursor;
        let mut sum = 0usize;
        for _ in 0..count {
            let value = self.buffer[idx] as usize;
            sum = sum.wrapping_add(value);
            idx += self.stride + (value & self.mask);
            if idx >= len {
                idx = 0;
            }
        }
        self.cursor = idx;
        sum
    }

    fn traversal_len(&self) -> usize {
        (self.buffer.len() / self.stride).max(1)
    }
}

/// Single-cycle chase over `N` machine words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointerChase {
    next: Vec<usize>,
    origin: usize,
    cursor: usize,
}

impl PointerChase {
    /// Build a chase covering a working set of `working_set_bytes`.
    ///
    /// The element count is `working_set_bytes / WORD_BYTES`, at least one.
    pub fn new<R: Rng + ?Sized>(
        working_set_bytes: usize,
        rng: &mut R,
        limit_bytes: Option<usize>,
    ) -> Result<Self, ProbeError> {
        let n = (working_set_bytes / WORD_BYTES).max(1);
        let order = visit_order(n, rng, limit_bytes)?;
        let mut next = allocate(n, 0usize, limit_bytes)?;
        link_ring(&order, |from, to| next[from] = to);

        let origin = order[0];
        Ok(Self {
            next,
            origin,
            cursor: origin,
        })
    }

    /// Successor index of every slot.
    pub fn links(&self) -> &[usize] {
        &self.next
    }

    /// Slot the traversal starts from.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.next.len()
    }

    /// Always false; a chase holds at least one slot.
    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }
}

impl Workload for PointerChase {
    fn reset(&mut self) {
        self.cursor = self.origin;
    }

    #[inline]
    fn access(&mut self, count: usize) -> usize {
        let mut idx = self.cursor;
        for _ in 0..count {
            idx = self.next[idx];
        }
        self.cursor = idx;
        idx
    }

    fn traversal_len(&self) -> usize {
        self.next.len()
    }
}

/// Single-cycle chase with one slot per page.
///
/// The buffer holds `capacity` pages of `page_bytes` each. The first word of
/// every linked page stores the word offset of the next page's slot. The
/// buffer is allocated once and may be relinked over any prefix of its pages.
#[derive(Debug)]
pub struct PageChase {
    slots: Vec<usize>,
    page_words: usize,
    capacity: usize,
    pages: usize,
    origin: usize,
    cursor: usize,
    limit_bytes: Option<usize>,
}

impl PageChase {
    /// Allocate room for `capacity` pages of `page_bytes`.
    pub fn new(capacity: usize, page_bytes: usize, limit_bytes: Option<usize>) -> Result<Self, ProbeError> {
        let page_words = (page_bytes / WORD_BYTES).max(1);
        let capacity = capacity.max(1);
        let total = capacity
            .checked_mul(page_words)
            .ok_or(ProbeError::AllocationFailed { bytes: usize::MAX })?;
        let slots = allocate(total, 0usize, limit_bytes)?;
        Ok(Self {
            slots,
            page_words,
            capacity,
            pages: 1,
            origin: 0,
            cursor: 0,
            limit_bytes,
        })
    }

    /// Relink a random single cycle over the first `pages` pages.
    ///
    /// `pages` is clamped to `1..=capacity`.
    pub fn link<R: Rng + ?Sized>(&mut self, pages: usize, rng: &mut R) -> Result<(), ProbeError> {
        let pages = pages.clamp(1, self.capacity);
        let order = visit_order(pages, rng, self.limit_bytes)?;
        let page_words = self.page_words;
        let slots = &mut self.slots;
        link_ring(&order, |from, to| slots[from * page_words] = to * page_words);

        self.pages = pages;
        self.origin = order[0] * page_words;
        self.cursor = self.origin;
        Ok(())
    }

    /// Successor page of every linked page.
    pub fn page_links(&self) -> Vec<usize> {
        (0..self.pages)
            .map(|page| self.slots[page * self.page_words] / self.page_words)
            .collect()
    }

    /// Page the traversal starts from.
    pub fn origin_page(&self) -> usize {
        self.origin / self.page_words
    }

    /// Pages currently linked.
    pub fn pages(&self) -> usize {
        self.pages
    }
}

impl Workload for PageChase {
    fn reset(&mut self) {
        self.cursor = self.origin;
    }

    #[inline]
    fn access(&mut self, count: usize) -> usize {
        let mut idx = self.cursor;
        for _ in 0..count {
            idx = self.slots[idx];
        }
        self.cursor = idx;
        idx
    }

    fn traversal_len(&self) -> usize {
        self.pages
    }
}
