//! Scoped arena for transient region-ID lists (spec §3 "Ownership", §9
//! design notes).
//!
//! The original draws region-list nodes from a per-subvolume memory pool
//! during a query and frees them on every exit path, including error. In
//! Rust the natural equivalent of "guaranteed release on all exit paths" is
//! an RAII guard: `acquire()` hands out a buffer, and returning it to the
//! pool happens in `Drop`, so it runs on early return, `?`, and panic-unwind
//! alike without a manual free call at each exit.
//!
//! The pool is bounded (`max_outstanding`) rather than growing without
//! limit, so a pathological query pattern produces the documented
//! `AllocFailure` rather than unbounded memory growth.

use std::cell::RefCell;

use crate::error::{CountError, Result};
use crate::ids::RegionId;

pub struct RegionListArena {
    free: RefCell<Vec<Vec<RegionId>>>,
    outstanding: RefCell<usize>,
    max_outstanding: usize,
}

impl RegionListArena {
    pub fn new(max_outstanding: usize) -> Self {
        RegionListArena {
            free: RefCell::new(Vec::new()),
            outstanding: RefCell::new(0),
            max_outstanding,
        }
    }

    pub fn acquire(&self) -> Result<PooledRegionList<'_>> {
        let mut outstanding = self.outstanding.borrow_mut();
        if *outstanding >= self.max_outstanding {
            return Err(CountError::AllocFailure);
        }
        *outstanding += 1;
        let buf = self.free.borrow_mut().pop().unwrap_or_default();
        Ok(PooledRegionList { arena: self, buf: Some(buf) })
    }

    fn release(&self, mut buf: Vec<RegionId>) {
        buf.clear();
        self.free.borrow_mut().push(buf);
        *self.outstanding.borrow_mut() -= 1;
    }
}

/// A `Vec<RegionId>` borrowed from a [`RegionListArena`]. Returned to the
/// arena automatically when dropped.
pub struct PooledRegionList<'a> {
    arena: &'a RegionListArena,
    buf: Option<Vec<RegionId>>,
}

impl<'a> std::ops::Deref for PooledRegionList<'a> {
    type Target = Vec<RegionId>;
    fn deref(&self) -> &Vec<RegionId> {
        self.buf.as_ref().expect("buffer taken before drop")
    }
}

impl<'a> std::ops::DerefMut for PooledRegionList<'a> {
    fn deref_mut(&mut self) -> &mut Vec<RegionId> {
        self.buf.as_mut().expect("buffer taken before drop")
    }
}

impl<'a> Drop for PooledRegionList<'a> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.arena.release(buf);
        }
    }
}
