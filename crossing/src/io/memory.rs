//! Heap accounting for peak-memory measurement.
//!
//! [`CountingAlloc`] wraps the system allocator and tracks live and peak heap
//! bytes. It only observes anything when installed as the process'
//! `#[global_allocator]` (the `crossing` binary does this); otherwise
//! [`measure_peak`] reports zero.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicUsize, Ordering};

static LIVE_BYTES: AtomicUsize = AtomicUsize::new(0);
static PEAK_BYTES: AtomicUsize = AtomicUsize::new(0);

/// Counting wrapper over [`System`].
pub struct CountingAlloc;

#[allow(unsafe_code)]
unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded unchanged to the system allocator.
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        // SAFETY: forwarded unchanged to the system allocator.
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            record_alloc(layout.size());
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: `ptr` was produced by this allocator with `layout`.
        unsafe { System.dealloc(ptr, layout) };
        LIVE_BYTES.fetch_sub(layout.size(), Ordering::Relaxed);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        // SAFETY: caller upholds the `GlobalAlloc::realloc` contract.
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            LIVE_BYTES.fetch_sub(layout.size(), Ordering::Relaxed);
            record_alloc(new_size);
        }
        new_ptr
    }
}

fn record_alloc(size: usize) {
    let live = LIVE_BYTES.fetch_add(size, Ordering::Relaxed) + size;
    PEAK_BYTES.fetch_max(live, Ordering::Relaxed);
}

/// Live heap bytes according to the counting allocator.
pub fn live_bytes() -> usize {
    LIVE_BYTES.load(Ordering::Relaxed)
}

/// Run `f` and report the peak heap growth above the starting level, in KiB
/// rounded to two decimals.
pub fn measure_peak<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let baseline = live_bytes();
    PEAK_BYTES.store(baseline, Ordering::Relaxed);
    let value = f();
    let peak = PEAK_BYTES.load(Ordering::Relaxed);
    (value, round_kib(peak.saturating_sub(baseline)))
}

fn round_kib(bytes: usize) -> f64 {
    (bytes as f64 / 1024.0 * 100.0).round() / 100.0
}
