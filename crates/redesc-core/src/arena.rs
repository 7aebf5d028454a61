//! Allocation source for one conversion.
//!
//! Every value the converter produces is requested through an [`Arena`]:
//! destination messages, repeated slots sized to their exact child count,
//! copied strings and the scratch buffers of the options round trip. The arena
//! keeps a running ledger of those requests, enforces the limits of its
//! [`ArenaConfig`], and turns both a limit hit and a real allocator refusal
//! into [`Error::AllocationFailure`].
//!
//! The produced tree owns its memory; dropping the tree and the arena together
//! is the bulk release. An arena is `!Sync`, so it can only serve one
//! conversion at a time.

use crate::error::{Error, Result};
use std::cell::Cell;
use std::mem;
use tracing::trace;

/// Limits applied by an [`Arena`]
#[derive(Debug, Clone, Default)]
pub struct ArenaConfig {
    /// Maximum number of bytes handed out (None = unlimited)
    pub max_bytes: Option<usize>,
    /// Maximum number of allocation requests served (None = unlimited)
    pub max_allocations: Option<usize>,
}

impl ArenaConfig {
    /// Creates a new config without limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the total number of bytes the arena hands out
    pub fn max_bytes(mut self, max: usize) -> Self {
        self.max_bytes = Some(max);
        self
    }

    /// Caps the number of allocation requests; request `max` (zero-based)
    /// and every later one fail.
    pub fn max_allocations(mut self, max: usize) -> Self {
        self.max_allocations = Some(max);
        self
    }
}

/// Allocation ledger shared by every converter of one top-level call
#[derive(Debug, Default)]
pub struct Arena {
    config: ArenaConfig,
    allocated: Cell<usize>,
    allocations: Cell<usize>,
}

impl Arena {
    /// Creates an arena without limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arena with custom limits
    pub fn with_config(config: ArenaConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Returns the limits of this arena
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Total bytes handed out so far
    pub fn allocated_bytes(&self) -> usize {
        self.allocated.get()
    }

    /// Number of allocation requests served so far
    pub fn allocation_count(&self) -> usize {
        self.allocations.get()
    }

    /// Clears the ledger so the arena can back another conversion.
    ///
    /// Taking `&mut self` guarantees no conversion is still drawing from it.
    pub fn reset(&mut self) {
        self.allocated.set(0);
        self.allocations.set(0);
    }

    /// Allocates a default-initialized value
    pub fn alloc<T: Default>(&self) -> Result<T> {
        self.charge(mem::size_of::<T>(), || Some(T::default()))
    }

    /// Allocates an empty vector with room for exactly `len` elements
    pub fn alloc_vec<T>(&self, len: usize) -> Result<Vec<T>> {
        let size = mem::size_of::<T>()
            .checked_mul(len)
            .ok_or(Error::AllocationFailure)?;
        self.charge(size, || {
            let mut vec = Vec::new();
            vec.try_reserve_exact(len).ok()?;
            Some(vec)
        })
    }

    /// Allocates an empty string with room for exactly `capacity` bytes
    pub fn alloc_string(&self, capacity: usize) -> Result<String> {
        self.charge(capacity, || {
            let mut s = String::new();
            s.try_reserve_exact(capacity).ok()?;
            Some(s)
        })
    }

    /// Copies `s` into a freshly allocated string
    pub fn alloc_str(&self, s: &str) -> Result<String> {
        let mut out = self.alloc_string(s.len())?;
        out.push_str(s);
        Ok(out)
    }

    /// Admits a request against the limits, runs `allocate`, and records it
    /// only once it succeeded. A refused request leaves the ledger untouched.
    fn charge<R>(&self, size: usize, allocate: impl FnOnce() -> Option<R>) -> Result<R> {
        let count = self.allocations.get();
        if self.config.max_allocations.is_some_and(|max| count >= max) {
            trace!("allocation #{} refused: request limit reached", count);
            return Err(Error::AllocationFailure);
        }

        let total = self
            .allocated
            .get()
            .checked_add(size)
            .ok_or(Error::AllocationFailure)?;
        if self.config.max_bytes.is_some_and(|max| total > max) {
            trace!("allocation of {} bytes refused: byte limit reached", size);
            return Err(Error::AllocationFailure);
        }

        let value = allocate().ok_or(Error::AllocationFailure)?;
        self.allocations.set(count + 1);
        self.allocated.set(total);
        Ok(value)
    }
}
