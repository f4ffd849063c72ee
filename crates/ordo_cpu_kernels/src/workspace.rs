//! Scratch memory for a single kernel call.
//!
//! A [`ScratchPool`] grants element budgets as [`ScratchLease`] guards. The
//! lease is taken when a call enters and handed back on drop, so the budget is
//! returned on every exit path, including early errors.

use ordo_core::{
    element::Element,
    error::{OrdoError, OrdoResult},
    params::ReturnMode,
    resolve::{backward_workspace_len_for, forward_workspace_len_for, BatchLayout},
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Admission control for scratch memory, measured in elements.
///
/// A pool only counts. The buffers themselves are allocated by [`Workspace`]
/// and [`GradientWorkspace`] from the global allocator once the reservation
/// succeeds. A `(value, index)` sort pair is charged as two elements.
pub trait ScratchPool: Send + Sync {
    /// Reserves `len` elements or fails without reserving anything.
    fn try_reserve(&self, len: usize) -> OrdoResult<()>;

    /// Returns `len` previously reserved elements.
    fn release(&self, len: usize);
}

/// Unbounded pool backed by the global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapPool;

impl ScratchPool for HeapPool {
    fn try_reserve(&self, _len: usize) -> OrdoResult<()> {
        Ok(())
    }

    fn release(&self, _len: usize) {}
}

/// Pool with a fixed element budget shared by concurrent calls.
#[derive(Debug)]
pub struct BoundedPool {
    capacity: usize,
    in_use: AtomicUsize,
}

impl BoundedPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            in_use: AtomicUsize::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    pub fn available(&self) -> usize {
        self.capacity.saturating_sub(self.in_use())
    }
}

impl ScratchPool for BoundedPool {
    fn try_reserve(&self, len: usize) -> OrdoResult<()> {
        self.in_use
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |in_use| {
                in_use.checked_add(len).filter(|&total| total <= self.capacity)
            })
            .map(|_| ())
            .map_err(|in_use| {
                let available = self.capacity.saturating_sub(in_use);
                tracing::warn!(requested = len, available, "scratch pool exhausted");
                OrdoError::ScratchExhausted {
                    requested: len,
                    available,
                }
            })
    }

    fn release(&self, len: usize) {
        self.in_use.fetch_sub(len, Ordering::AcqRel);
    }
}

/// Budget held for the duration of one call.
pub struct ScratchLease<'p> {
    pool: &'p dyn ScratchPool,
    len: usize,
}

impl<'p> ScratchLease<'p> {
    pub fn acquire(pool: &'p dyn ScratchPool, len: usize) -> OrdoResult<Self> {
        pool.try_reserve(len)?;
        tracing::trace!(len, "scratch acquired");
        Ok(Self { pool, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for ScratchLease<'_> {
    fn drop(&mut self) {
        self.pool.release(self.len);
        tracing::trace!(len = self.len, "scratch released");
    }
}

/// Forward scratch.
///
/// `pairs` holds the canonical (value, flat index) pairs that get sorted per
/// batch and accounts for two elements each; `batch_id` holds the batch of
/// every sorted entry. Mask mode adds the selected positions and the values
/// filled into them.
pub(crate) struct Workspace<'p, T> {
    pub(crate) pairs: Vec<(T, usize)>,
    pub(crate) batch_id: Vec<usize>,
    pub(crate) selected: Vec<usize>,
    pub(crate) fill: Vec<T>,
    _lease: ScratchLease<'p>,
}

impl<'p, T: Element> Workspace<'p, T> {
    pub(crate) fn acquire(pool: &'p dyn ScratchPool, layout: &BatchLayout) -> OrdoResult<Self> {
        let lease = ScratchLease::acquire(pool, forward_workspace_len_for(layout))?;
        let size = layout.size();
        let selected_len = match layout.ret_typ {
            ReturnMode::Mask => layout.selected_len(),
            _ => 0,
        };
        Ok(Self {
            pairs: Vec::with_capacity(size),
            batch_id: vec![0; size],
            selected: vec![0; selected_len],
            fill: vec![T::one(); selected_len],
            _lease: lease,
        })
    }
}

/// Backward scratch: absolute destination of every selected element and the
/// flat shift of every batch.
pub(crate) struct GradientWorkspace<'p> {
    pub(crate) positions: Vec<usize>,
    pub(crate) batch_shift: Vec<usize>,
    _lease: ScratchLease<'p>,
}

impl<'p> GradientWorkspace<'p> {
    pub(crate) fn acquire(pool: &'p dyn ScratchPool, layout: &BatchLayout) -> OrdoResult<Self> {
        let lease = ScratchLease::acquire(pool, backward_workspace_len_for(layout))?;
        Ok(Self {
            positions: vec![0; layout.selected_len()],
            batch_shift: (0..layout.batch_size).map(|b| b * layout.element_num).collect(),
            _lease: lease,
        })
    }
}
