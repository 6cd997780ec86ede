//! Preallocated output arenas.
//!
//! Run outputs are appended into buffers sized up front from the event
//! count. Exceeding the bound is a fatal, detectable condition; rows are
//! never silently dropped.

use mmsim_core::{Error, Result};

/// Fixed-capacity append-only buffer with an explicit live length.
#[derive(Debug)]
pub struct Arena<T> {
    buf: Vec<T>,
    capacity: usize,
}

impl<T> Arena<T> {
    /// Create an arena with a fixed capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a row; fails when the preallocated bound is exhausted.
    pub fn push(&mut self, row: T) -> Result<()> {
        if self.buf.len() >= self.capacity {
            return Err(Error::CapacityExceeded {
                needed: self.buf.len() + 1,
                capacity: self.capacity,
            });
        }
        self.buf.push(row);
        Ok(())
    }

    /// Number of live rows.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether no rows were appended.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Borrow the live rows.
    pub fn as_slice(&self) -> &[T] {
        &self.buf
    }

    /// Release the buffer, truncated to the live rows.
    pub fn into_vec(self) -> Vec<T> {
        self.buf
    }
}
