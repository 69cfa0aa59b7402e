use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

/// Recycles scratch `Vec<T>` buffers between recognizer frames.
///
/// `get` hands out a [`PoolBuffer`] guard; dropping the guard clears the
/// buffer and returns it to the pool, so release happens on every exit
/// path. Published data must be copied out of the buffer into the arena
/// before the guard drops.
#[derive(Debug)]
pub(crate) struct BufferPool<T> {
    free: RefCell<Vec<Vec<T>>>,
}

impl<T> BufferPool<T> {
    pub fn new() -> Self {
        Self { free: RefCell::new(Vec::new()) }
    }

    pub fn get(&self) -> PoolBuffer<'_, T> {
        let buffer = self.free.borrow_mut().pop().unwrap_or_default();
        PoolBuffer { buffer, pool: self }
    }
}

impl<T> Default for BufferPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub(crate) struct PoolBuffer<'p, T> {
    buffer: Vec<T>,
    pool: &'p BufferPool<T>,
}

impl<T> Deref for PoolBuffer<'_, T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl<T> DerefMut for PoolBuffer<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl<T> Drop for PoolBuffer<'_, T> {
    fn drop(&mut self) {
        let mut buffer = std::mem::take(&mut self.buffer);
        buffer.clear();
        self.pool.free.borrow_mut().push(buffer);
    }
}
