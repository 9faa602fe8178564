use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::ops::Deref;
use core::sync::atomic::{AtomicU8, Ordering};

use subtle::{Choice, ConstantTimeEq};

const STATUS_INIT: u8 = 0;
const STATUS_PENDING: u8 = 1;
const STATUS_DONE: u8 = 2;

/// A cell written at most once, readable from any thread afterwards.
///
/// Concurrent callers of `get_or_init` spin until the first writer is done,
/// so all of them observe the same value.
pub(crate) struct OnceCell<T> {
    status: AtomicU8,
    value: UnsafeCell<MaybeUninit<T>>,
}

unsafe impl<T: Send + Sync> Sync for OnceCell<T> {}
unsafe impl<T: Send> Send for OnceCell<T> {}

impl<T> OnceCell<T> {
    pub const fn new() -> Self {
        OnceCell {
            status: AtomicU8::new(STATUS_INIT),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    #[inline]
    pub fn get(&self) -> Option<&T> {
        match self.status.load(Ordering::Acquire) {
            // The value is written before STATUS_DONE is released.
            STATUS_DONE => Some(unsafe { (*self.value.get()).assume_init_ref() }),
            _ => None,
        }
    }

    pub fn get_or_init<F: FnOnce() -> T>(&self, f: F) -> &T {
        let mut f = Some(f);
        loop {
            match self.status.compare_exchange(STATUS_INIT, STATUS_PENDING, Ordering::Acquire, Ordering::Acquire) {
                Ok(_) => {
                    // reopens the cell if `f` unwinds.
                    let guard = ResetOnUnwind(&self.status);
                    if let Some(f) = f.take() {
                        let v = f();
                        unsafe { (*self.value.get()).write(v) };
                    }
                    core::mem::forget(guard);
                    self.status.store(STATUS_DONE, Ordering::Release);
                    break;
                }
                Err(STATUS_DONE) => break,
                Err(_) => core::hint::spin_loop(),
            }
        }
        unsafe { (*self.value.get()).assume_init_ref() }
    }

    /// Drops the cached value, if any. Needs exclusive access.
    pub fn take(&mut self) -> Option<T> {
        if *self.status.get_mut() != STATUS_DONE {
            return None;
        }
        *self.status.get_mut() = STATUS_INIT;
        Some(unsafe { self.value.get_mut().assume_init_read() })
    }
}

struct ResetOnUnwind<'a>(&'a AtomicU8);

impl Drop for ResetOnUnwind<'_> {
    fn drop(&mut self) {
        self.0.store(STATUS_INIT, Ordering::Release);
    }
}

impl<T> Default for OnceCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for OnceCell<T> {
    fn clone(&self) -> Self {
        let cell = OnceCell::new();
        if let Some(v) = self.get() {
            cell.get_or_init(|| v.clone());
        }
        cell
    }
}

impl<T> Drop for OnceCell<T> {
    fn drop(&mut self) {
        if *self.status.get_mut() == STATUS_DONE {
            unsafe { self.value.get_mut().assume_init_drop() };
        }
    }
}

/// A lazily-initialised immutable global, e.g. the precomputed base-point tables.
pub(crate) struct Lazy<T> {
    cell: OnceCell<T>,
    init: fn() -> T,
}

impl<T> Lazy<T> {
    pub const fn new(init: fn() -> T) -> Self {
        Lazy { cell: OnceCell::new(), init }
    }
}

impl<T> Deref for Lazy<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        self.cell.get_or_init(self.init)
    }
}

/// dst ^= src over the common prefix.
#[inline]
pub(crate) fn xor_bytes(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= *s;
    }
}

/// Returns 1 iff every byte of `b` is zero, without branching on the content.
#[inline]
pub(crate) fn ct_is_zero(b: &[u8]) -> Choice {
    let mut acc = 0u8;
    for x in b {
        acc |= *x;
    }
    acc.ct_eq(&0)
}
