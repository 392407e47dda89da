// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Byte-addressable circular storage over a flat region `[base, base+size_b)`.
//!
//! `reserve` is a CAS loop on a shared atomic cursor and does not serialize
//! with `get`/`put` — ordering between the payload writes and the
//! publication of the record counter (see `writer.rs`) provides the
//! coherence a concurrent reader observes.

use std::sync::atomic::{AtomicU32, Ordering};

/// Sentinel returned by [`reserve`] when a record cannot fit in its partition.
pub const TOO_LARGE: u32 = u32::MAX;

/// Read `out.len()` bytes starting at logical address `addr`, wrapping at
/// `size_b` as needed. Used by the reader against its private heap copy of
/// the file.
pub fn get(buf: &[u8], size_b: u32, addr: u32, out: &mut [u8]) {
    let mut remaining = out.len() as u32;
    let mut rbuf_off = addr % size_b;
    let mut out_off = 0usize;
    while remaining > 0 {
        let rrest = size_b - rbuf_off;
        let cpsize = remaining.min(rrest);
        let lo = rbuf_off as usize;
        let hi = lo + cpsize as usize;
        out[out_off..out_off + cpsize as usize].copy_from_slice(&buf[lo..hi]);
        out_off += cpsize as usize;
        remaining -= cpsize;
        rbuf_off = 0;
    }
}

/// Write `data` starting at logical address `addr` into the mapped payload
/// region based at `base`, wrapping at `size_b` as needed. Returns
/// `addr + data.len()`, the next logical address.
///
/// # Safety
/// `base` must point to a valid, writable region of at least `size_b`
/// bytes, and the byte range `[addr % size_b, ...)` (wrapped) that this
/// call touches must not overlap a range some other in-flight `put` is
/// concurrently writing — a guarantee `reserve`'s CAS provides to callers
/// that only ever write ranges they themselves reserved.
pub unsafe fn put(base: *mut u8, size_b: u32, addr: u32, data: &[u8]) -> u32 {
    let ret_addr = addr.wrapping_add(data.len() as u32);

    let mut remaining = data.len() as u32;
    let mut rbuf_off = addr % size_b;
    let mut in_off = 0usize;
    while remaining > 0 {
        let rrest = size_b - rbuf_off;
        let cpsize = remaining.min(rrest);
        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr().add(in_off),
                base.add(rbuf_off as usize),
                cpsize as usize,
            );
        }
        in_off += cpsize as usize;
        remaining -= cpsize;
        rbuf_off = 0;
    }

    ret_addr
}

/// Atomically advance `next_addr` by `n` modulo `size_b`, returning the
/// pre-advance value — the address the caller has exclusively reserved.
/// Returns [`TOO_LARGE`] if `n + 32 > size_b` (ensures a record's `size`
/// field can never equal or exceed the partition size).
pub fn reserve(next_addr: &AtomicU32, size_b: u32, n: u32) -> u32 {
    if n + 32 > size_b {
        return TOO_LARGE;
    }
    let mut addr = next_addr.load(Ordering::Relaxed);
    loop {
        let next = addr.wrapping_add(n) % size_b;
        match next_addr.compare_exchange_weak(addr, next, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(prev) => return prev,
            Err(actual) => addr = actual,
        }
    }
}
